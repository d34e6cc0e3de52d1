//! Base types for the structure of a NARC file.

use binrw::{BinRead, BinWrite};

use crate::error::{Error, Result};

/// Header magic, "NARC" on disk.
pub const NARC_ID: u32 = 0x4352_414E;
/// Allocation table magic, "BTAF" on disk.
pub const FATB_ID: u32 = 0x4641_5442;
/// Name table magic, "BTNF" on disk.
pub const FNTB_ID: u32 = 0x464E_5442;
/// Image blob magic, "GMIF" on disk.
pub const FIMG_ID: u32 = 0x4649_4D47;

/// Little-endian byte-order mark stored in the header.
pub const LE_BYTE_ORDER: u16 = 0xFFFE;
/// A NARC always carries exactly three chunks.
pub const CHUNK_COUNT: u16 = 0x03;
/// Base value for 16-bit directory ids; the root is never given one.
pub const DIR_ID_BASE: u16 = 0xF000;
/// Filler for 4-byte alignment padding.
pub const PADDING_BYTE: u8 = 0xFF;

/// Name table chunk size of an archive packed without a filename table.
pub const FALLBACK_FNT_CHUNK_SIZE: u32 = 0x10;

/// NARC format version stored in the header
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum Version {
    /// Wire value 0x0000
    V0,
    /// Wire value 0x0100
    #[default]
    V1,
}

impl Version {
    /// The raw 16-bit wire value
    pub const fn to_raw(self) -> u16 {
        match self {
            Version::V0 => 0x0000,
            Version::V1 => 0x0100,
        }
    }

    /// Decode a raw wire value, if it names a known version
    pub const fn from_raw(raw: u16) -> Option<Version> {
        match raw {
            0x0000 => Some(Version::V0),
            0x0100 => Some(Version::V1),
            _ => None,
        }
    }
}

/// NARC file header
///
/// All data is stored in little endian format.
#[derive(BinRead, BinWrite, Debug, Copy, Clone, PartialEq)]
#[brw(little)]
pub struct Header {
    /// Magic number, [`NARC_ID`]
    pub id: u32,

    /// Byte-order mark, always [`LE_BYTE_ORDER`]
    pub byte_order: u16,

    /// Format version, 0x0000 or 0x0100
    pub version: u16,

    /// Total size of the file, header included
    pub file_size: u32,

    /// Size of this header, always 16
    pub chunk_size: u16,

    /// Number of chunks following the header, always 3
    pub chunk_count: u16,
}

impl Header {
    /// On-disk size of the header in bytes
    pub const SIZE: u32 = 0x10;

    pub fn new(version: Version, file_size: u32) -> Self {
        Self {
            id: NARC_ID,
            byte_order: LE_BYTE_ORDER,
            version: version.to_raw(),
            file_size,
            chunk_size: Self::SIZE as u16,
            chunk_count: CHUNK_COUNT,
        }
    }
}

/// File allocation table (FAT) chunk header
#[derive(BinRead, BinWrite, Debug, Copy, Clone, PartialEq)]
#[brw(little)]
pub struct FileAllocationTable {
    /// Magic number, [`FATB_ID`]
    pub id: u32,

    /// Size of the chunk, header and entries included
    pub chunk_size: u32,

    /// Number of allocation entries that follow
    pub file_count: u16,

    /// Always zero
    pub reserved: u16,
}

impl FileAllocationTable {
    /// On-disk size of the chunk header in bytes
    pub const SIZE: u32 = 0x0C;

    pub fn new(file_count: u16) -> Self {
        Self {
            id: FATB_ID,
            chunk_size: Self::SIZE + u32::from(file_count) * FatEntry::SIZE,
            file_count,
            reserved: 0,
        }
    }
}

/// A single allocation entry: the byte range of one file inside the image
/// blob, relative to the start of the blob's data region.
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq)]
#[brw(little)]
pub struct FatEntry {
    /// Offset of the first byte of the file
    pub start: u32,

    /// Offset one past the last byte of the file
    pub end: u32,
}

impl FatEntry {
    /// On-disk size of an entry in bytes
    pub const SIZE: u32 = 0x08;

    /// Length of the file in bytes
    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// File name table (FNT) chunk header
#[derive(BinRead, BinWrite, Debug, Copy, Clone, PartialEq)]
#[brw(little)]
pub struct FileNameTable {
    /// Magic number, [`FNTB_ID`]
    pub id: u32,

    /// Size of the chunk, header, entries and sub-entry streams included,
    /// rounded up to a multiple of 4
    pub chunk_size: u32,
}

impl FileNameTable {
    /// On-disk size of the chunk header in bytes
    pub const SIZE: u32 = 0x08;

    pub fn new(chunk_size: u32) -> Self {
        Self {
            id: FNTB_ID,
            chunk_size,
        }
    }
}

/// A single name table entry; entry 0 describes the root directory.
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq)]
#[brw(little)]
pub struct FntEntry {
    /// Byte offset of this directory's sub-entry stream, relative to the
    /// first entry of the table
    pub offset: u32,

    /// Allocation table index of the first file belonging to this directory
    pub first_file_id: u16,

    /// Overloaded field, see [`FntUtil`]
    pub util: u16,
}

impl FntEntry {
    /// On-disk size of an entry in bytes
    pub const SIZE: u32 = 0x08;

    /// Resolve the overloaded `util` field for the entry at `index`.
    pub fn util(&self, index: usize) -> Result<FntUtil> {
        FntUtil::from_raw(index, self.util)
    }
}

/// Decoded form of the overloaded 16-bit `util` field of a name table entry.
///
/// Entry 0 holds the entry count of the table; every other entry holds a
/// back-pointer to its parent directory's entry index, biased by
/// [`DIR_ID_BASE`] on the wire. The raw encoding is resolved to and from
/// this variant exactly at the codec boundary.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FntUtil {
    /// Entry 0: number of entries in the table (directory count + 1)
    Root { table_len: u16 },

    /// Entry i > 0: index of the parent directory's entry
    Child { parent: u16 },
}

impl FntUtil {
    pub fn from_raw(index: usize, raw: u16) -> Result<FntUtil> {
        if index == 0 {
            Ok(FntUtil::Root { table_len: raw })
        } else if raw >= DIR_ID_BASE {
            Ok(FntUtil::Child {
                parent: raw - DIR_ID_BASE,
            })
        } else {
            Err(Error::InvalidFileNameTableEntryId)
        }
    }

    pub const fn to_raw(self) -> u16 {
        match self {
            FntUtil::Root { table_len } => table_len,
            FntUtil::Child { parent } => DIR_ID_BASE + parent,
        }
    }
}

/// File images (FIMG) chunk header; the raw file bytes follow it.
#[derive(BinRead, BinWrite, Debug, Copy, Clone, PartialEq)]
#[brw(little)]
pub struct FileImages {
    /// Magic number, [`FIMG_ID`]
    pub id: u32,

    /// Size of the chunk, header and padded file bytes included
    pub chunk_size: u32,
}

impl FileImages {
    /// On-disk size of the chunk header in bytes
    pub const SIZE: u32 = 0x08;

    pub fn new(chunk_size: u32) -> Self {
        Self {
            id: FIMG_ID,
            chunk_size,
        }
    }
}

/// Round `value` up to the next multiple of 4.
pub(crate) fn align4(value: u32) -> u32 {
    (value + 3) & !3
}
