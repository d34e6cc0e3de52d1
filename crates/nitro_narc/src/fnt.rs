//! File name table codec.
//!
//! The directory forest is kept as an arena of nodes addressed by index:
//! index 0 is the root, every other node records the index of its parent.
//! On the wire the same structure is a flat entry array whose i-th entry
//! carries a back-pointer to entry `parent` encoded as `0xF000 + parent`,
//! followed by one variable-length sub-entry stream per directory:
//!
//! - file record: length byte `1..=0x7F`, then that many name bytes
//! - directory record: length byte `0x80 + len`, then `len` name bytes,
//!   then the 16-bit directory id (`0xF000 + index`)
//! - a zero length byte terminates the stream
//!
//! Decoding must invert encoding exactly; both sides live here so the two
//! walks stay symmetric.

use indexmap::IndexMap;
use tracing::trace;

use crate::error::{Error, Result};
use crate::types::{align4, FileNameTable, FntEntry, FntUtil, DIR_ID_BASE};

/// Longest name a sub-entry record can carry.
const MAX_NAME_LEN: usize = 0x7F;

/// An encoded name table ready to be serialized: chunk header, entry array,
/// and one sub-entry stream per directory in entry order.
#[derive(Debug, Clone, PartialEq)]
pub struct FntData {
    pub fnt: FileNameTable,
    pub entries: Vec<FntEntry>,
    pub streams: Vec<Vec<u8>>,
}

impl FntData {
    /// The single-entry table of an archive packed without a filename
    /// table. No sub-entry stream, no hierarchy.
    pub fn fallback() -> Self {
        Self {
            fnt: FileNameTable::new(FileNameTable::SIZE + FntEntry::SIZE),
            entries: vec![FntEntry {
                offset: 0x4,
                first_file_id: 0,
                util: FntUtil::Root { table_len: 1 }.to_raw(),
            }],
            streams: Vec::new(),
        }
    }
}

#[derive(Debug)]
struct DirNode {
    parent: usize,
    stream: Vec<u8>,
    file_records: u16,
}

/// Incremental encoder for the directory forest.
///
/// Entries must be fed in the flat sequence produced by
/// [`crate::order::order`]: a directory is registered before any entry
/// inside it.
#[derive(Debug)]
pub struct DirForest {
    dirs: Vec<DirNode>,
    index: IndexMap<String, usize>,
}

impl Default for DirForest {
    fn default() -> Self {
        let mut index = IndexMap::new();
        index.insert(String::new(), 0);

        Self {
            dirs: vec![DirNode {
                parent: 0,
                stream: Vec::new(),
                file_records: 0,
            }],
            index,
        }
    }
}

impl DirForest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of directories below the root.
    pub fn dir_count(&self) -> usize {
        self.dirs.len() - 1
    }

    /// Register a directory and append its record to its parent's stream.
    pub fn add_directory(&mut self, rel_path: &str) -> Result<()> {
        let (parent, name) = self.resolve(rel_path)?;

        let id = self.dirs.len();
        if id > usize::from(u16::MAX - DIR_ID_BASE) {
            return Err(Error::Custom("too many directories".into()));
        }

        trace!("directory {} gets id {:#06X}", rel_path, DIR_ID_BASE + id as u16);

        let stream = &mut self.dirs[parent].stream;
        stream.push(0x80 + name.len() as u8);
        stream.extend_from_slice(name.as_bytes());
        stream.extend_from_slice(&(DIR_ID_BASE + id as u16).to_le_bytes());

        self.dirs.push(DirNode {
            parent,
            stream: Vec::new(),
            file_records: 0,
        });
        self.index.insert(rel_path.to_owned(), id);

        Ok(())
    }

    /// Append a file record to the containing directory's stream.
    pub fn add_file(&mut self, rel_path: &str) -> Result<()> {
        let (parent, name) = self.resolve(rel_path)?;

        let stream = &mut self.dirs[parent].stream;
        stream.push(name.len() as u8);
        stream.extend_from_slice(name.as_bytes());
        self.dirs[parent].file_records += 1;

        Ok(())
    }

    fn resolve<'a>(&self, rel_path: &'a str) -> Result<(usize, &'a str)> {
        let (parent, name) = match rel_path.rsplit_once('/') {
            Some((parent, name)) => (parent, name),
            None => ("", rel_path),
        };

        let parent = *self.index.get(parent).ok_or_else(|| {
            Error::Custom(format!("no registered directory contains {rel_path}"))
        })?;

        if name.is_empty() || name.len() > MAX_NAME_LEN {
            return Err(Error::Custom(format!(
                "name {name:?} does not fit a sub-entry record"
            )));
        }

        Ok((parent, name))
    }

    /// Terminate every stream and build the entry array.
    pub fn encode(mut self) -> Result<FntData> {
        for dir in &mut self.dirs {
            dir.stream.push(0x00);
        }

        let table_len = self.dirs.len();
        let mut entries = Vec::with_capacity(table_len);
        entries.push(FntEntry {
            offset: table_len as u32 * FntEntry::SIZE,
            first_file_id: 0,
            util: FntUtil::Root {
                table_len: table_len as u16,
            }
            .to_raw(),
        });

        for i in 1..table_len {
            let previous = entries[i - 1];
            entries.push(FntEntry {
                offset: previous.offset + self.dirs[i - 1].stream.len() as u32,
                first_file_id: previous.first_file_id + self.dirs[i - 1].file_records,
                util: FntUtil::Child {
                    parent: self.dirs[i].parent as u16,
                }
                .to_raw(),
            });
        }

        let stream_total: u32 = self.dirs.iter().map(|d| d.stream.len() as u32).sum();
        let chunk_size = align4(
            FileNameTable::SIZE + table_len as u32 * FntEntry::SIZE + stream_total,
        );

        Ok(FntData {
            fnt: FileNameTable::new(chunk_size),
            entries,
            streams: self.dirs.into_iter().map(|d| d.stream).collect(),
        })
    }
}

/// One directory recovered from a name table.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedDir {
    /// Path relative to the extraction root, `/`-separated; empty for the
    /// root entry.
    pub rel_path: String,

    /// Files directly inside this directory, paired with their allocation
    /// table indices.
    pub files: Vec<(String, usize)>,
}

/// The fully decoded name table: one directory per entry, in entry order.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFnt {
    pub dirs: Vec<DecodedDir>,
}

/// Decode a name table back into the directory forest.
///
/// `table` is the chunk body starting at the first entry, so every entry
/// offset indexes it directly.
pub fn decode(table: &[u8], entries: &[FntEntry]) -> Result<DecodedFnt> {
    // Pass 1: scan every stream, collecting directory names by id and the
    // per-directory file lists.
    let mut dir_names: Vec<Option<String>> = vec![None; entries.len()];
    let mut files: Vec<Vec<(String, usize)>> = vec![Vec::new(); entries.len()];

    for (i, entry) in entries.iter().enumerate() {
        let mut pos = entry.offset as usize;
        let mut file_counter = entry.first_file_id as usize;

        loop {
            let len = *table.get(pos).ok_or(Error::InvalidFileNameTableEntryId)?;
            pos += 1;

            match len {
                0x00 => break,
                0x01..=0x7F => {
                    let name = read_name(table, pos, len as usize)?;
                    pos += len as usize;

                    files[i].push((name, file_counter));
                    file_counter += 1;
                }
                // Reserved length byte, no payload.
                0x80 => {}
                0x81..=0xFF => {
                    let name_len = (len - 0x80) as usize;
                    let name = read_name(table, pos, name_len)?;
                    pos += name_len;

                    let raw_id = table
                        .get(pos..pos + 2)
                        .ok_or(Error::InvalidFileNameTableEntryId)?;
                    pos += 2;

                    let id = u16::from_le_bytes([raw_id[0], raw_id[1]]);
                    let index = id
                        .checked_sub(DIR_ID_BASE)
                        .filter(|&index| index != 0)
                        .map(usize::from)
                        .ok_or(Error::InvalidFileNameTableEntryId)?;
                    let slot = dir_names
                        .get_mut(index)
                        .ok_or(Error::InvalidFileNameTableEntryId)?;
                    *slot = Some(name);
                }
            }
        }
    }

    // Pass 2: resolve each entry's path through the parent back-pointers.
    // A parent entry always precedes its children.
    let mut dirs: Vec<DecodedDir> = Vec::with_capacity(entries.len());
    for (i, entry) in entries.iter().enumerate() {
        let rel_path = match entry.util(i)? {
            FntUtil::Root { .. } => String::new(),
            FntUtil::Child { parent } => {
                let parent = usize::from(parent);
                if parent >= i {
                    return Err(Error::InvalidFileNameTableEntryId);
                }

                let name = dir_names[i]
                    .as_deref()
                    .ok_or(Error::InvalidFileNameTableEntryId)?;
                let parent_path = &dirs[parent].rel_path;
                if parent_path.is_empty() {
                    name.to_owned()
                } else {
                    format!("{parent_path}/{name}")
                }
            }
        };

        dirs.push(DecodedDir {
            rel_path,
            files: std::mem::take(&mut files[i]),
        });
    }

    Ok(DecodedFnt { dirs })
}

fn read_name(table: &[u8], pos: usize, len: usize) -> Result<String> {
    let raw = table
        .get(pos..pos + len)
        .ok_or(Error::InvalidFileNameTableEntryId)?;

    Ok(String::from_utf8_lossy(raw).into_owned())
}
