//! Types for writing NARC archives
//!

use binrw::BinWrite;
use bon::Builder;
use byteorder::WriteBytesExt;
use std::fs;
use std::io::{Seek, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

use crate::error::{Error, Result};
use crate::fnt::{DirForest, FntData};
use crate::order::{order, Selection};
use crate::pattern::read_spec_file;
use crate::types::{
    FatEntry, FileAllocationTable, FileImages, FileNameTable, FntEntry, Header, Version,
    PADDING_BYTE,
};

/// Options for how the NARC file should be written
#[derive(Debug, Clone, Copy, Builder)]
pub struct NarcWriterOptions {
    /// Whether to emit a real filename table; without one the archive
    /// only addresses files by index
    #[builder(default = true)]
    pub filename_table: bool,

    /// The format version stamped into the header
    #[builder(default)]
    pub version: Version,
}

/// Options for packing a source directory into an archive
#[derive(Debug, Clone, Builder)]
pub struct PackOptions {
    /// Whether to emit a real filename table
    #[builder(default = true)]
    pub filename_table: bool,

    /// The format version stamped into the header
    #[builder(default)]
    pub version: Version,

    /// Order spec applied to the root directory, overriding its
    /// `.narcorder` file
    pub order: Option<PathBuf>,

    /// Ignore pattern spec file
    pub ignore: Option<PathBuf>,

    /// Keep pattern spec file; keep overrides ignore
    pub keep: Option<PathBuf>,
}

/// NARC archive generator
///
/// ```
/// # fn doit() -> nitro_narc::error::Result<()>
/// # {
/// use nitro_narc::write::{NarcWriter, NarcWriterOptions};
///
/// // We use a buffer here, though you'd normally use a `File`
/// let mut narc = NarcWriter::new(
///     std::io::Cursor::new(Vec::new()),
///     NarcWriterOptions::builder().build(),
/// );
///
/// narc.add_file("hello_world.txt", b"Hello, World!")?;
///
/// // Apply the changes you've made.
/// narc.finish()?;
///
/// # Ok(())
/// # }
/// # doit().unwrap();
/// ```
pub struct NarcWriter<W: Write + Seek> {
    inner: W,
    options: NarcWriterOptions,
    forest: DirForest,
    fat: Vec<FatEntry>,
    images: Vec<u8>,
}

impl<W: Write + Seek> NarcWriter<W> {
    /// Initializes the archive.
    ///
    /// Entries must be added in the flat sequence produced by
    /// [`crate::order::order`]: a directory before anything inside it,
    /// files in their final allocation order.
    pub fn new(inner: W, options: NarcWriterOptions) -> NarcWriter<W> {
        NarcWriter {
            inner,
            options,
            forest: DirForest::new(),
            fat: Vec::new(),
            images: Vec::new(),
        }
    }

    /// Number of files added so far.
    pub fn file_count(&self) -> usize {
        self.fat.len()
    }

    /// Register a directory. A no-op without a filename table.
    pub fn add_directory(&mut self, rel_path: &str) -> Result<()> {
        if self.options.filename_table {
            self.forest.add_directory(rel_path)?;
        }

        Ok(())
    }

    /// Append one file image; its allocation index is the current file
    /// count.
    #[instrument(skip(self, data), err)]
    pub fn add_file(&mut self, rel_path: &str, data: &[u8]) -> Result<()> {
        if self.fat.len() >= usize::from(u16::MAX) {
            return Err(Error::Custom("too many files".into()));
        }

        if self.options.filename_table {
            self.forest.add_file(rel_path)?;
        }

        // The image buffer is re-aligned after every file, so its current
        // length is always a valid start offset.
        let start = self.images.len() as u32;
        self.fat.push(FatEntry {
            start,
            end: start + data.len() as u32,
        });

        self.images.extend_from_slice(data);
        while self.images.len() % 4 != 0 {
            self.images.push(PADDING_BYTE);
        }

        Ok(())
    }

    /// Write out all four structures and return the inner writer.
    #[instrument(skip(self), err)]
    pub fn finish(mut self) -> Result<W> {
        let fat = FileAllocationTable::new(self.fat.len() as u16);

        let FntData {
            fnt,
            entries,
            streams,
        } = if self.options.filename_table {
            self.forest.encode()?
        } else {
            FntData::fallback()
        };

        let fimg = FileImages::new(FileImages::SIZE + self.images.len() as u32);
        let file_size = Header::SIZE + fat.chunk_size + fnt.chunk_size + fimg.chunk_size;
        let header = Header::new(self.options.version, file_size);

        header.write(&mut self.inner)?;

        fat.write(&mut self.inner)?;
        for entry in &self.fat {
            entry.write(&mut self.inner)?;
        }

        fnt.write(&mut self.inner)?;
        for entry in &entries {
            entry.write(&mut self.inner)?;
        }

        let mut written = FileNameTable::SIZE + entries.len() as u32 * FntEntry::SIZE;
        for stream in &streams {
            self.inner
                .write_all(stream)
                .map_err(Error::InvalidOutputFile)?;
            written += stream.len() as u32;
        }
        for _ in written..fnt.chunk_size {
            self.inner
                .write_u8(PADDING_BYTE)
                .map_err(Error::InvalidOutputFile)?;
        }

        fimg.write(&mut self.inner)?;
        self.inner
            .write_all(&self.images)
            .map_err(Error::InvalidOutputFile)?;

        Ok(self.inner)
    }
}

/// Pack a source directory into a NARC file.
///
/// Returns the packed files' source-relative paths in allocation order.
#[instrument(err)]
pub fn pack(src_dir: &Path, dst_file: &Path, options: PackOptions) -> Result<Vec<String>> {
    let mut selection = Selection::new();
    if let Some(path) = &options.ignore {
        selection.load_ignore(path)?;
    }
    if let Some(path) = &options.keep {
        selection.load_keep(path)?;
    }

    let root_order = options.order.as_deref().map(read_spec_file).transpose()?;
    let entries = order(src_dir, &selection, root_order)?;
    debug!("packing {} entries from {}", entries.len(), src_dir.display());

    let mut writer = NarcWriter::new(
        fs::File::create(dst_file).map_err(Error::InvalidOutputFile)?,
        NarcWriterOptions::builder()
            .filename_table(options.filename_table)
            .version(options.version)
            .build(),
    );

    let mut packed = Vec::new();
    for entry in entries {
        if entry.is_dir() {
            writer.add_directory(&entry.rel_path)?;
        } else {
            let data = fs::read(&entry.path).map_err(Error::InvalidInputFile)?;
            writer.add_file(&entry.rel_path, &data)?;
            packed.push(entry.rel_path);
        }
    }

    writer.finish()?;

    Ok(packed)
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_str_eq;
    use tracing_test::traced_test;

    use crate::error::Result;
    use crate::types::Version;
    use crate::write::{NarcWriter, NarcWriterOptions};
    use std::io::Cursor;

    #[traced_test]
    #[test]
    fn narc_empty_write() -> Result<()> {
        #[rustfmt::skip]
        let expected = vec![
            // Header
            0x4E, 0x41, 0x52, 0x43,
            0xFE, 0xFF,
            0x00, 0x01,
            0x38, 0x00, 0x00, 0x00,
            0x10, 0x00,
            0x03, 0x00,
            // Allocation table
            0x42, 0x54, 0x41, 0x46,
            0x0C, 0x00, 0x00, 0x00,
            0x00, 0x00,
            0x00, 0x00,
            // Name table: root entry, empty stream, padding
            0x42, 0x54, 0x4E, 0x46,
            0x14, 0x00, 0x00, 0x00,
            0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00,
            0x00,
            0xFF, 0xFF, 0xFF,
            // Images
            0x47, 0x4D, 0x49, 0x46,
            0x08, 0x00, 0x00, 0x00,
        ];

        let writer = NarcWriter::new(
            Cursor::new(Vec::new()),
            NarcWriterOptions::builder().build(),
        );
        let result = writer.finish()?;

        assert_eq!(result.get_ref().len(), expected.len());
        assert_str_eq!(
            format!("{:02X?}", *result.get_ref()),
            format!("{:02X?}", expected)
        );

        Ok(())
    }

    #[traced_test]
    #[test]
    fn narc_fallback_write() -> Result<()> {
        #[rustfmt::skip]
        let expected = vec![
            // Header
            0x4E, 0x41, 0x52, 0x43,
            0xFE, 0xFF,
            0x00, 0x01,
            0x4C, 0x00, 0x00, 0x00,
            0x10, 0x00,
            0x03, 0x00,
            // Allocation table
            0x42, 0x54, 0x41, 0x46,
            0x1C, 0x00, 0x00, 0x00,
            0x02, 0x00,
            0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00,
            0x04, 0x00, 0x00, 0x00, 0x05, 0x00, 0x00, 0x00,
            // Name table: single fallback entry
            0x42, 0x54, 0x4E, 0x46,
            0x10, 0x00, 0x00, 0x00,
            0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00,
            // Images
            0x47, 0x4D, 0x49, 0x46,
            0x10, 0x00, 0x00, 0x00,
            0xAA, 0xBB, 0xFF, 0xFF,
            0xCC, 0xFF, 0xFF, 0xFF,
        ];

        let mut writer = NarcWriter::new(
            Cursor::new(Vec::new()),
            NarcWriterOptions::builder().filename_table(false).build(),
        );
        writer.add_file("first.bin", &[0xAA, 0xBB])?;
        writer.add_file("second.bin", &[0xCC])?;

        let result = writer.finish()?;

        assert_eq!(result.get_ref().len(), expected.len());
        assert_str_eq!(
            format!("{:02X?}", *result.get_ref()),
            format!("{:02X?}", expected)
        );

        Ok(())
    }

    #[traced_test]
    #[test]
    fn narc_tree_write() -> Result<()> {
        #[rustfmt::skip]
        let expected = vec![
            // Header
            0x4E, 0x41, 0x52, 0x43,
            0xFE, 0xFF,
            0x00, 0x01,
            0x7C, 0x00, 0x00, 0x00,
            0x10, 0x00,
            0x03, 0x00,
            // Allocation table
            0x42, 0x54, 0x41, 0x46,
            0x24, 0x00, 0x00, 0x00,
            0x03, 0x00,
            0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00,
            0x04, 0x00, 0x00, 0x00, 0x08, 0x00, 0x00, 0x00,
            0x08, 0x00, 0x00, 0x00, 0x09, 0x00, 0x00, 0x00,
            // Name table
            0x42, 0x54, 0x4E, 0x46,
            0x34, 0x00, 0x00, 0x00,
            0x10, 0x00, 0x00, 0x00, 0x00, 0x00, 0x02, 0x00,
            0x23, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0xF0,
            // Root stream
            0x05, b'a', b'.', b'b', b'i', b'n',
            0x05, b'b', b'.', b'b', b'i', b'n',
            0x83, b's', b'u', b'b', 0x01, 0xF0,
            0x00,
            // "sub" stream
            0x05, b'c', b'.', b'b', b'i', b'n',
            0x00,
            0xFF, 0xFF,
            // Images
            0x47, 0x4D, 0x49, 0x46,
            0x14, 0x00, 0x00, 0x00,
            0x01, 0xFF, 0xFF, 0xFF,
            0x02, 0x03, 0x04, 0x05,
            0x06, 0xFF, 0xFF, 0xFF,
        ];

        let mut writer = NarcWriter::new(
            Cursor::new(Vec::new()),
            NarcWriterOptions::builder().version(Version::V1).build(),
        );
        writer.add_file("a.bin", &[0x01])?;
        writer.add_file("b.bin", &[0x02, 0x03, 0x04, 0x05])?;
        writer.add_directory("sub")?;
        writer.add_file("sub/c.bin", &[0x06])?;

        let result = writer.finish()?;

        assert_eq!(result.get_ref().len(), expected.len());
        assert_str_eq!(
            format!("{:02X?}", *result.get_ref()),
            format!("{:02X?}", expected)
        );

        Ok(())
    }

    #[test]
    fn narc_empty_file_entry() -> Result<()> {
        let mut writer = NarcWriter::new(
            Cursor::new(Vec::new()),
            NarcWriterOptions::builder().filename_table(false).build(),
        );
        writer.add_file("empty.bin", &[])?;
        writer.add_file("data.bin", &[0x01])?;

        let result = writer.finish()?;

        // FAT: [0, 0) then [0, 1); the empty file takes no image bytes.
        let bytes = result.get_ref();
        assert_eq!(&bytes[28..36], &[0, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(&bytes[36..44], &[0, 0, 0, 0, 1, 0, 0, 0]);

        Ok(())
    }
}
