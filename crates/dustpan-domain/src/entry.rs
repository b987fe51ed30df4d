//! Entry module - filesystem entries observed during a sweep

use std::path::{Path, PathBuf};

/// Kind of a filesystem entry, with the facts the rules need
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular file
    File {
        /// Size in bytes
        size: u64,
    },

    /// Directory, observed after all of its descendants were visited
    Directory {
        /// Number of entries currently inside the directory (any kind)
        child_count: usize,
        /// Sum of the sizes of direct child files (not recursive)
        direct_file_bytes: u64,
    },
}

/// A path plus what the walker saw at that path
///
/// Produced transiently by the walker and dropped after evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSystemEntry {
    path: PathBuf,
    kind: EntryKind,
}

impl FileSystemEntry {
    /// Create a file entry
    pub fn file(path: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::File { size },
        }
    }

    /// Create a directory entry
    pub fn directory(path: impl Into<PathBuf>, child_count: usize, direct_file_bytes: u64) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::Directory {
                child_count,
                direct_file_bytes,
            },
        }
    }

    /// Path of the entry
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Kind of the entry
    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    /// Whether this entry is a file
    pub fn is_file(&self) -> bool {
        matches!(self.kind, EntryKind::File { .. })
    }

    /// Whether this entry is a directory
    pub fn is_dir(&self) -> bool {
        matches!(self.kind, EntryKind::Directory { .. })
    }
}
