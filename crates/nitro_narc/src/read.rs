//! Types for reading NARC archives
//!

use binrw::BinRead;
use std::fs;
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::{debug, instrument};

use crate::error::{Error, Result};
use crate::fnt;
use crate::types::{
    FatEntry, FileAllocationTable, FileImages, FileNameTable, FntEntry, Header, Version,
    CHUNK_COUNT, FALLBACK_FNT_CHUNK_SIZE, FATB_ID, FIMG_ID, FNTB_ID, LE_BYTE_ORDER, NARC_ID,
};

/// How the archive's files map back to paths, fixed once at open time.
///
/// An archive whose name table is the 16-byte fallback stub carries no
/// paths at all; its files get synthesized names from the archive's stem.
enum Layout {
    Flat,
    Tree {
        /// Directory paths relative to the extraction root, in entry order
        dirs: Vec<String>,

        /// One path per allocation table index
        files: Vec<String>,
    },
}

/// NARC archive reader
///
/// ```no_run
/// use std::io::prelude::*;
///
/// fn list_narc_contents(reader: impl Read + Seek) -> nitro_narc::error::Result<()> {
///     let narc = nitro_narc::NarcArchive::new(reader)?;
///
///     for (i, path) in narc.paths("archive").iter().enumerate() {
///         println!("{}: {}", i, path);
///     }
///
///     Ok(())
/// }
/// ```
pub struct NarcArchive<R> {
    reader: R,
    version: Version,
    fat: Vec<FatEntry>,
    layout: Layout,
    image_base: u64,
}

impl<R: Read + Seek> NarcArchive<R> {
    /// Read and validate an archive's metadata, leaving the file images
    /// unread until they are asked for.
    pub fn new(mut reader: R) -> Result<NarcArchive<R>> {
        let header = Header::read(&mut reader)?;
        if header.id != NARC_ID {
            return Err(Error::InvalidHeaderId);
        }
        if header.byte_order != LE_BYTE_ORDER {
            return Err(Error::InvalidByteOrderMark);
        }
        let version = Version::from_raw(header.version).ok_or(Error::InvalidVersion)?;
        if u32::from(header.chunk_size) != Header::SIZE {
            return Err(Error::InvalidHeaderSize);
        }
        if header.chunk_count != CHUNK_COUNT {
            return Err(Error::InvalidChunkCount);
        }

        let fat_header = FileAllocationTable::read(&mut reader)?;
        if fat_header.id != FATB_ID {
            return Err(Error::InvalidFileAllocationTableId);
        }
        if fat_header.reserved != 0 {
            return Err(Error::InvalidFileAllocationTableReserved);
        }

        let mut fat = Vec::with_capacity(usize::from(fat_header.file_count));
        for _ in 0..fat_header.file_count {
            let entry = FatEntry::read(&mut reader)?;
            if entry.end < entry.start {
                return Err(Error::Custom(
                    "allocation entry ends before it starts".into(),
                ));
            }
            fat.push(entry);
        }

        let fnt_header = FileNameTable::read(&mut reader)?;
        if fnt_header.id != FNTB_ID {
            return Err(Error::InvalidFileNameTableId);
        }

        let body_len = fnt_header
            .chunk_size
            .checked_sub(FileNameTable::SIZE)
            .ok_or(Error::InvalidFileNameTableEntryId)?;
        let mut body = vec![0u8; body_len as usize];
        reader.read_exact(&mut body).map_err(Error::InvalidInputFile)?;

        let layout = if fnt_header.chunk_size == FALLBACK_FNT_CHUNK_SIZE {
            Layout::Flat
        } else {
            decode_layout(&body, fat.len())?
        };

        let fimg = FileImages::read(&mut reader)?;
        if fimg.id != FIMG_ID {
            return Err(Error::InvalidFileImagesId);
        }

        let image_base = reader.stream_position().map_err(Error::InvalidInputFile)?;
        debug!("file image data starts at {:#X}", image_base);

        Ok(NarcArchive {
            reader,
            version,
            fat,
            layout,
            image_base,
        })
    }

    /// Number of files contained in this archive.
    pub fn len(&self) -> usize {
        self.fat.len()
    }

    /// Whether this archive contains no files
    pub fn is_empty(&self) -> bool {
        self.fat.is_empty()
    }

    /// The format version stamped into the header.
    pub fn version(&self) -> Version {
        self.version
    }

    /// Whether the archive carries a real filename table.
    pub fn has_filename_table(&self) -> bool {
        matches!(self.layout, Layout::Tree { .. })
    }

    /// The allocation table entries, in file order.
    pub fn fat_entries(&self) -> &[FatEntry] {
        &self.fat
    }

    /// Every file's extraction path in allocation order. Without a
    /// filename table the names are synthesized from `stem`.
    pub fn paths(&self, stem: &str) -> Vec<String> {
        match &self.layout {
            Layout::Flat => (0..self.fat.len()).map(|i| flat_name(stem, i)).collect(),
            Layout::Tree { files, .. } => files.clone(),
        }
    }

    /// Read the raw bytes of one file image.
    pub fn by_index(&mut self, index: usize) -> Result<Vec<u8>> {
        let entry = *self
            .fat
            .get(index)
            .ok_or_else(|| Error::Custom(format!("no file at index {index}")))?;

        self.reader
            .seek(SeekFrom::Start(self.image_base + u64::from(entry.start)))
            .map_err(Error::InvalidInputFile)?;

        let mut data = vec![0u8; entry.len() as usize];
        self.reader
            .read_exact(&mut data)
            .map_err(Error::InvalidInputFile)?;

        Ok(data)
    }

    /// Extract every file below `dst_dir`, recreating the directory tree
    /// when the archive has one.
    #[instrument(skip(self), err)]
    pub fn extract_to(&mut self, dst_dir: &Path, stem: &str) -> Result<()> {
        fs::create_dir_all(dst_dir).map_err(Error::InvalidOutputFile)?;

        if let Layout::Tree { dirs, .. } = &self.layout {
            for dir in dirs {
                fs::create_dir_all(dst_dir.join(dir)).map_err(Error::InvalidOutputFile)?;
            }
        }

        for (index, path) in self.paths(stem).into_iter().enumerate() {
            let data = self.by_index(index)?;
            fs::write(dst_dir.join(path), data).map_err(Error::InvalidOutputFile)?;
        }

        Ok(())
    }

    /// Unwrap and return the inner reader object
    ///
    /// The position of the reader is undefined.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

fn flat_name(stem: &str, index: usize) -> String {
    format!("{stem}_{index:08}.bin")
}

/// Parse a real name table body into the tree layout. `body` starts at
/// the table's first entry.
fn decode_layout(body: &[u8], file_count: usize) -> Result<Layout> {
    let mut cursor = Cursor::new(body);

    let first = FntEntry::read(&mut cursor)?;
    let table_end = first.offset;
    if table_end < FntEntry::SIZE
        || table_end % FntEntry::SIZE != 0
        || table_end as usize > body.len()
    {
        return Err(Error::InvalidFileNameTableEntryId);
    }

    let mut entries = vec![first];
    let mut read = FntEntry::SIZE;
    while read < table_end {
        entries.push(FntEntry::read(&mut cursor)?);
        read += FntEntry::SIZE;
    }

    let decoded = fnt::decode(body, &entries)?;

    let mut dirs = Vec::new();
    let mut files: Vec<Option<String>> = vec![None; file_count];
    for dir in decoded.dirs {
        for (name, index) in &dir.files {
            let path = if dir.rel_path.is_empty() {
                name.clone()
            } else {
                format!("{}/{}", dir.rel_path, name)
            };

            let slot = files
                .get_mut(*index)
                .ok_or(Error::InvalidFileNameTableEntryId)?;
            *slot = Some(path);
        }

        if !dir.rel_path.is_empty() {
            dirs.push(dir.rel_path);
        }
    }

    // Every allocated file must have been named by exactly one record.
    let files = files
        .into_iter()
        .collect::<Option<Vec<_>>>()
        .ok_or(Error::InvalidFileNameTableEntryId)?;

    Ok(Layout::Tree { dirs, files })
}

/// Extract an archive file into a destination directory.
#[instrument(err)]
pub fn unpack(src_file: &Path, dst_dir: &Path) -> Result<()> {
    let file = fs::File::open(src_file).map_err(Error::InvalidInputFile)?;
    let stem = src_file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut archive = NarcArchive::new(file)?;
    debug!(
        "extracting {} files to {}",
        archive.len(),
        dst_dir.display()
    );

    archive.extract_to(dst_dir, &stem)
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use pretty_assertions::assert_eq;

    use crate::error::{Error, Result};
    use crate::read::NarcArchive;
    use crate::types::Version;
    use crate::write::{NarcWriter, NarcWriterOptions};

    fn empty_narc() -> Vec<u8> {
        let writer = NarcWriter::new(
            Cursor::new(Vec::new()),
            NarcWriterOptions::builder().build(),
        );
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn read_invalid_magic() {
        #[rustfmt::skip]
        let input = [
            0x4E, 0x41, 0x52, 0x44,
            0xFE, 0xFF,
            0x00, 0x01,
            0x38, 0x00, 0x00, 0x00,
            0x10, 0x00,
            0x03, 0x00,
        ];

        let archive = NarcArchive::new(Cursor::new(input));
        assert!(matches!(archive, Err(Error::InvalidHeaderId)));
    }

    #[test]
    fn read_invalid_byte_order() {
        #[rustfmt::skip]
        let input = [
            0x4E, 0x41, 0x52, 0x43,
            0xFF, 0xFE,
            0x00, 0x01,
            0x38, 0x00, 0x00, 0x00,
            0x10, 0x00,
            0x03, 0x00,
        ];

        let archive = NarcArchive::new(Cursor::new(input));
        assert!(matches!(archive, Err(Error::InvalidByteOrderMark)));
    }

    #[test]
    fn read_invalid_version() {
        #[rustfmt::skip]
        let input = [
            0x4E, 0x41, 0x52, 0x43,
            0xFE, 0xFF,
            0x00, 0x02,
            0x38, 0x00, 0x00, 0x00,
            0x10, 0x00,
            0x03, 0x00,
        ];

        let archive = NarcArchive::new(Cursor::new(input));
        assert!(matches!(archive, Err(Error::InvalidVersion)));
    }

    #[test]
    fn read_invalid_header_size() {
        #[rustfmt::skip]
        let input = [
            0x4E, 0x41, 0x52, 0x43,
            0xFE, 0xFF,
            0x00, 0x01,
            0x38, 0x00, 0x00, 0x00,
            0x0C, 0x00,
            0x03, 0x00,
        ];

        let archive = NarcArchive::new(Cursor::new(input));
        assert!(matches!(archive, Err(Error::InvalidHeaderSize)));
    }

    #[test]
    fn read_invalid_chunk_count() {
        #[rustfmt::skip]
        let input = [
            0x4E, 0x41, 0x52, 0x43,
            0xFE, 0xFF,
            0x00, 0x01,
            0x38, 0x00, 0x00, 0x00,
            0x10, 0x00,
            0x04, 0x00,
        ];

        let archive = NarcArchive::new(Cursor::new(input));
        assert!(matches!(archive, Err(Error::InvalidChunkCount)));
    }

    #[test]
    fn read_invalid_fat_magic() {
        let mut input = empty_narc();
        input[16] = 0x40;

        let archive = NarcArchive::new(Cursor::new(input));
        assert!(matches!(archive, Err(Error::InvalidFileAllocationTableId)));
    }

    #[test]
    fn read_invalid_fat_reserved() {
        let mut input = empty_narc();
        input[26] = 0x01;

        let archive = NarcArchive::new(Cursor::new(input));
        assert!(matches!(
            archive,
            Err(Error::InvalidFileAllocationTableReserved)
        ));
    }

    #[test]
    fn read_invalid_fnt_magic() {
        let mut input = empty_narc();
        input[28] = 0x40;

        let archive = NarcArchive::new(Cursor::new(input));
        assert!(matches!(archive, Err(Error::InvalidFileNameTableId)));
    }

    #[test]
    fn read_invalid_fimg_magic() {
        let mut input = empty_narc();
        input[48] = 0x40;

        let archive = NarcArchive::new(Cursor::new(input));
        assert!(matches!(archive, Err(Error::InvalidFileImagesId)));
    }

    #[test]
    fn read_tree_archive() -> Result<()> {
        let mut writer = NarcWriter::new(
            Cursor::new(Vec::new()),
            NarcWriterOptions::builder().build(),
        );
        writer.add_file("a.bin", &[0x01])?;
        writer.add_file("b.bin", &[0x02, 0x03, 0x04, 0x05])?;
        writer.add_directory("sub")?;
        writer.add_file("sub/c.bin", &[0x06])?;
        let bytes = writer.finish()?.into_inner();

        let mut archive = NarcArchive::new(Cursor::new(bytes))?;
        assert_eq!(archive.len(), 3);
        assert!(archive.has_filename_table());
        assert_eq!(archive.version(), Version::V1);
        assert_eq!(
            archive.paths("unused"),
            vec!["a.bin", "b.bin", "sub/c.bin"]
        );

        assert_eq!(archive.by_index(0)?, vec![0x01]);
        assert_eq!(archive.by_index(1)?, vec![0x02, 0x03, 0x04, 0x05]);
        assert_eq!(archive.by_index(2)?, vec![0x06]);
        assert!(archive.by_index(3).is_err());

        Ok(())
    }

    #[test]
    fn read_fallback_archive() -> Result<()> {
        let mut writer = NarcWriter::new(
            Cursor::new(Vec::new()),
            NarcWriterOptions::builder()
                .filename_table(false)
                .version(Version::V0)
                .build(),
        );
        writer.add_file("first.bin", &[0xAA, 0xBB])?;
        writer.add_file("second.bin", &[0xCC])?;
        let bytes = writer.finish()?.into_inner();

        let mut archive = NarcArchive::new(Cursor::new(bytes))?;
        assert_eq!(archive.len(), 2);
        assert!(!archive.has_filename_table());
        assert_eq!(archive.version(), Version::V0);
        assert_eq!(
            archive.paths("archive"),
            vec!["archive_00000000.bin", "archive_00000001.bin"]
        );

        assert_eq!(archive.by_index(0)?, vec![0xAA, 0xBB]);
        assert_eq!(archive.by_index(1)?, vec![0xCC]);

        Ok(())
    }

    #[test]
    fn read_empty_archive() -> Result<()> {
        let archive = NarcArchive::new(Cursor::new(empty_narc()))?;
        assert!(archive.is_empty());
        assert!(archive.has_filename_table());

        Ok(())
    }
}
