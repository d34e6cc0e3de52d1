//! This library handles reading from and creating **NARC** files used by *Nintendo DS* games.
//!
//! # NARC Archive Format Documentation
//!
//! This crate provides utilities to pack a directory tree into the **NARC** (Nitro Archive)
//! container format and to extract existing archives back to disk. The NARC format is a custom
//! binary format that stores a flat array of file images together with an optional directory
//! tree. NARC files are typically identified with the `.narc` extension.
//!
//! ## File Structure
//!
//! A NARC file consists of a header, followed by exactly three chunks: the file allocation
//! table, the file name table, and the file image blob.
//!
//! | Offset (bytes) | Field                  | Description                                                |
//! |----------------|------------------------|------------------------------------------------------------|
//! | 0x0000         | Magic number           | 4 bytes: 0x4352414E ("NARC")                               |
//! | 0x0004         | Byte-order mark        | 2 bytes: Fixed value 0xFFFE (little endian)                |
//! | 0x0006         | Version                | 2 bytes: 0x0000 or 0x0100                                  |
//! | 0x0008         | File Size              | 4 bytes: Total size of the file, header included           |
//! | 0x000C         | Header Size            | 2 bytes: Fixed value 16                                    |
//! | 0x000E         | Chunk Count            | 2 bytes: Fixed value 3                                     |
//!
//! ### File Allocation Table ("BTAF")
//!
//! The allocation table chunk starts with a 12-byte header (magic `0x46415442`, chunk size,
//! 16-bit file count, 16-bit reserved field that must be zero), followed by one 8-byte entry
//! per file. Each entry holds the start and one-past-the-end offsets of the file's image,
//! relative to the start of the image blob's data region. Start offsets are 4-byte aligned;
//! the first file starts at offset 0.
//!
//! ### File Name Table ("BTNF")
//!
//! The name table chunk starts with an 8-byte header (magic `0x464E5442`, chunk size), followed
//! by one 8-byte entry per directory and one sub-entry stream per directory:
//!
//! | Offset (bytes) | Field                  | Description                                             |
//! |----------------|------------------------|---------------------------------------------------------|
//! | 0x0000         | Stream Offset          | 4 bytes: Offset of this directory's sub-entry stream, relative to the first entry |
//! | 0x0004         | First File Id          | 2 bytes: Allocation index of the directory's first file |
//! | 0x0006         | Util                   | 2 bytes: Entry count (entry 0) or parent entry index biased by 0xF000 (other entries) |
//!
//! Each sub-entry stream is a sequence of records terminated by a zero byte. A length byte of
//! `1..=0x7F` introduces a file record (the name follows); a length byte of `0x81..=0xFF`
//! introduces a directory record (the name follows, then the directory's 16-bit id,
//! `0xF000` plus its entry index). Entry 0 describes the root directory.
//!
//! An archive packed without a filename table carries a 16-byte stub instead: the chunk header
//! plus a single entry with stream offset 4, first file id 0 and an entry count of 1.
//!
//! ### File Images ("GMIF")
//!
//! The image chunk starts with an 8-byte header (magic `0x46494D47`, chunk size) followed by
//! the raw bytes of every file, each padded to a 4-byte boundary with `0xFF` filler.
//!
//! ## Additional Information
//!
//! - **File Extension**: `.narc`
//! - **Endianness**: Little-endian for all multi-byte integers
//!

pub mod error;
pub mod fnt;
pub mod order;
pub mod pattern;
pub mod read;
pub mod types;
pub mod write;

pub use read::{unpack, NarcArchive};
pub use types::Version;
pub use write::{pack, NarcWriter, PackOptions};
