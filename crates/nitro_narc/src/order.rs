//! Deterministic selection and ordering of filesystem entries for packing.
//!
//! The produced sequence is flat and total: it fixes both the file order
//! (allocation table indices) and the directory discovery order (name table
//! ids). Each directory's children are listed before any subdirectory's own
//! listing, so the i-th directory to appear is always the directory whose
//! name table entry has index i.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::pattern::{read_spec_file, PatternList};

/// Fixed name of the per-directory order override file.
pub const ORDER_FILE_NAME: &str = ".narcorder";

/// Archive-control files are never packed.
pub const DEFAULT_IGNORE_PATTERNS: &[&str] = &["*.narcignore", "*.narckeep", "*.narcorder"];

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// One filesystem entry selected for packing.
#[derive(Debug, Clone)]
pub struct Entry {
    /// File or directory name, without any path components
    pub name: String,

    /// Path relative to the source directory, `/`-separated
    pub rel_path: String,

    /// Absolute (or source-relative) path usable for I/O
    pub path: PathBuf,

    pub kind: EntryKind,
}

impl Entry {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// Ignore/keep pattern pair implementing the selection rule: an entry is
/// included iff it matches a keep pattern or matches no ignore pattern.
#[derive(Debug, Clone)]
pub struct Selection {
    ignore: PatternList,
    keep: PatternList,
}

impl Default for Selection {
    fn default() -> Self {
        let mut ignore = PatternList::new();
        for pattern in DEFAULT_IGNORE_PATTERNS {
            ignore.push(*pattern);
        }

        Self {
            ignore,
            keep: PatternList::new(),
        }
    }
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append ignore patterns from a spec file.
    pub fn load_ignore(&mut self, path: &Path) -> Result<()> {
        self.ignore.load(path)
    }

    /// Append keep patterns from a spec file; keep always overrides ignore.
    pub fn load_keep(&mut self, path: &Path) -> Result<()> {
        self.keep.load(path)
    }

    pub fn includes(&self, rel_path: &str) -> bool {
        self.keep.matches(rel_path) || !self.ignore.matches(rel_path)
    }
}

/// Produce the deterministic, filtered, flattened entry sequence for
/// `src_dir`.
///
/// `root_order` replaces the root directory's `.narcorder` file when given;
/// subdirectories always consult their own `.narcorder`, if present.
/// Order-spec names that do not exist, or that the selection rule excludes,
/// are silently dropped.
pub fn order(
    src_dir: &Path,
    selection: &Selection,
    root_order: Option<Vec<String>>,
) -> Result<Vec<Entry>> {
    let mut out = Vec::new();

    // Directories pending a listing; FIFO keeps discovery order equal to
    // the order their entries were emitted.
    let mut queue: VecDeque<(PathBuf, String, Option<Vec<String>>)> = VecDeque::new();
    queue.push_back((src_dir.to_path_buf(), String::new(), root_order));

    while let Some((dir, rel_dir, explicit)) = queue.pop_front() {
        let children = list_directory(&dir, &rel_dir, selection, explicit)?;

        for child in &children {
            if child.is_dir() {
                queue.push_back((child.path.clone(), child.rel_path.clone(), None));
            }
        }

        out.extend(children);
    }

    Ok(out)
}

/// One directory's children: order-spec entries first, then the remaining
/// direct children sorted case-insensitively ascending.
fn list_directory(
    dir: &Path,
    rel_dir: &str,
    selection: &Selection,
    explicit: Option<Vec<String>>,
) -> Result<Vec<Entry>> {
    let spec = match explicit {
        Some(spec) => spec,
        None => {
            let order_file = dir.join(ORDER_FILE_NAME);
            if order_file.is_file() {
                debug!("order file exists for {}", dir.display());
                read_spec_file(&order_file)?
            } else {
                Vec::new()
            }
        }
    };

    let mut children = Vec::new();
    for name in &spec {
        let path = dir.join(name);
        if !path.exists() {
            debug!("file from order spec does not exist: {}", path.display());
            continue;
        }

        let rel_path = join_rel(rel_dir, name);
        if !selection.includes(&rel_path) {
            debug!("file exists but will be ignored: {}", path.display());
            continue;
        }

        debug!("adding file from order spec: {}", path.display());
        children.push(Entry {
            name: name.clone(),
            rel_path,
            kind: if path.is_dir() {
                EntryKind::Directory
            } else {
                EntryKind::File
            },
            path,
        });
    }

    let mut remaining = Vec::new();
    for dir_entry in fs::read_dir(dir).map_err(Error::InvalidInputFile)? {
        let dir_entry = dir_entry.map_err(Error::InvalidInputFile)?;
        let name = dir_entry.file_name().into_string().map_err(|name| {
            Error::Custom(format!(
                "non-UTF-8 file name {:?} in {}",
                name,
                dir.display()
            ))
        })?;

        if name == ORDER_FILE_NAME || spec.contains(&name) {
            continue;
        }

        let rel_path = join_rel(rel_dir, &name);
        if !selection.includes(&rel_path) {
            debug!("file ignored: {}", rel_path);
            continue;
        }

        let file_type = dir_entry.file_type().map_err(Error::InvalidInputFile)?;
        debug!("adding unordered file: {}", rel_path);
        remaining.push(Entry {
            name,
            rel_path,
            path: dir_entry.path(),
            kind: if file_type.is_dir() {
                EntryKind::Directory
            } else {
                EntryKind::File
            },
        });
    }

    remaining.sort_by_key(|entry| entry.name.to_lowercase());
    children.extend(remaining);

    Ok(children)
}

fn join_rel(rel_dir: &str, name: &str) -> String {
    if rel_dir.is_empty() {
        name.to_owned()
    } else {
        format!("{rel_dir}/{name}")
    }
}
