//! Tree traversal for sweep passes
//!
//! Two passes are offered over a monitored root. The file pass yields every
//! regular file below the root. The directory pass is post-order: a directory
//! is yielded only after everything below it, and its child count and direct
//! file total are read at that moment, so removals made earlier in the same
//! pass are already reflected. The root itself is never yielded.

use crate::SweepError;
use dustpan_domain::FileSystemEntry;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Non-fatal problem with a single entry during traversal
#[derive(Debug, Error)]
pub enum WalkIssue {
    /// Symlinks are never followed or deleted
    #[error("Skipping symlink: {}", .0.display())]
    Symlink(PathBuf),

    /// Entry could not be read (permission denied, vanished, ...)
    #[error("Cannot read {}: {source}", path.display())]
    Io {
        /// Path of the entry
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl WalkIssue {
    fn from_walkdir(err: walkdir::Error, root: &Path) -> Self {
        let path = err.path().unwrap_or(root).to_path_buf();
        let source = err
            .into_io_error()
            .unwrap_or_else(|| std::io::Error::other("filesystem loop detected"));
        WalkIssue::Io { path, source }
    }

    /// Path the issue refers to
    pub fn path(&self) -> &Path {
        match self {
            WalkIssue::Symlink(path) => path,
            WalkIssue::Io { path, .. } => path,
        }
    }
}

/// Walker over one monitored root
///
/// Each call to [`TreeWalker::files`] or [`TreeWalker::directories`] starts a
/// fresh traversal.
#[derive(Debug, Clone)]
pub struct TreeWalker {
    root: PathBuf,
}

impl TreeWalker {
    /// Open a root; fails with [`SweepError::RootNotFound`] unless it is an existing directory
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, SweepError> {
        let root = root.into();
        match fs::metadata(&root) {
            Ok(meta) if meta.is_dir() => Ok(Self { root }),
            _ => Err(SweepError::RootNotFound(root)),
        }
    }

    /// The monitored root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Every regular file below the root, in traversal order
    pub fn files(&self) -> FilePass {
        FilePass {
            inner: WalkDir::new(&self.root).min_depth(1).follow_links(false).into_iter(),
            root: self.root.clone(),
        }
    }

    /// Every directory below the root, children before parents
    pub fn directories(&self) -> DirectoryPass {
        DirectoryPass {
            inner: WalkDir::new(&self.root)
                .min_depth(1)
                .follow_links(false)
                .contents_first(true)
                .into_iter(),
            root: self.root.clone(),
            unreadable: HashSet::new(),
        }
    }
}

/// Lazy file pass; see [`TreeWalker::files`]
pub struct FilePass {
    inner: walkdir::IntoIter,
    root: PathBuf,
}

impl Iterator for FilePass {
    type Item = Result<FileSystemEntry, WalkIssue>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.inner.next()? {
                Ok(entry) => entry,
                Err(e) => return Some(Err(WalkIssue::from_walkdir(e, &self.root))),
            };

            let file_type = entry.file_type();
            if file_type.is_symlink() {
                return Some(Err(WalkIssue::Symlink(entry.into_path())));
            }
            if !file_type.is_file() {
                continue;
            }

            return Some(match entry.metadata() {
                Ok(meta) => Ok(FileSystemEntry::file(entry.into_path(), meta.len())),
                Err(e) => Err(WalkIssue::from_walkdir(e, &self.root)),
            });
        }
    }
}

/// Lazy post-order directory pass; see [`TreeWalker::directories`]
pub struct DirectoryPass {
    inner: walkdir::IntoIter,
    root: PathBuf,
    // Directories whose listing already failed; not yielded again afterwards
    unreadable: HashSet<PathBuf>,
}

impl Iterator for DirectoryPass {
    type Item = Result<FileSystemEntry, WalkIssue>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.inner.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    let issue = WalkIssue::from_walkdir(e, &self.root);
                    self.unreadable.insert(issue.path().to_path_buf());
                    return Some(Err(issue));
                }
            };

            let file_type = entry.file_type();
            if file_type.is_symlink() {
                return Some(Err(WalkIssue::Symlink(entry.into_path())));
            }
            if !file_type.is_dir() || self.unreadable.contains(entry.path()) {
                continue;
            }

            return Some(observe_directory(entry.into_path()));
        }
    }
}

/// Read a directory's current child count and direct file total
fn observe_directory(path: PathBuf) -> Result<FileSystemEntry, WalkIssue> {
    let reader = match fs::read_dir(&path) {
        Ok(reader) => reader,
        Err(source) => return Err(WalkIssue::Io { path, source }),
    };

    let mut child_count = 0usize;
    let mut direct_file_bytes = 0u64;
    for child in reader {
        let child = match child {
            Ok(child) => child,
            Err(source) => return Err(WalkIssue::Io { path, source }),
        };
        child_count += 1;

        let is_file = child.file_type().map(|t| t.is_file()).unwrap_or(false);
        if is_file {
            if let Ok(meta) = child.metadata() {
                direct_file_bytes = direct_file_bytes.saturating_add(meta.len());
            }
        }
    }

    Ok(FileSystemEntry::directory(path, child_count, direct_file_bytes))
}
