//! Lazy depth-first enumeration of the files under a local site root.
//!
//! Traversal only produces descriptors; reading content and uploading happen
//! in a separate stage so that the caller decides how many files are in
//! flight at once.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::content_type::content_type_for;
use crate::object_keys::{object_key_for, ObjectKeyError};

/// A regular file found under the root, ready to become an object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub path: PathBuf,
    pub key: String,
    pub content_type: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to walk {path}: {message}")]
pub struct TraversalError {
    pub path: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct LocalFileTree {
    root: PathBuf,
}

impl LocalFileTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Consumes the tree into a single-pass iterator over its regular files.
    ///
    /// Directories are descended into, symlinks are not followed, and any
    /// other non-regular entry is skipped.
    pub fn into_files(self) -> LocalFiles {
        let entries = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();
        LocalFiles {
            root: self.root,
            entries,
        }
    }
}

pub struct LocalFiles {
    root: PathBuf,
    entries: walkdir::IntoIter,
}

impl Iterator for LocalFiles {
    type Item = Result<LocalFile, TraversalError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.entries.next()? {
                Ok(entry) => entry,
                Err(error) => {
                    let path = error
                        .path()
                        .unwrap_or(&self.root)
                        .display()
                        .to_string();
                    return Some(Err(TraversalError {
                        path,
                        message: error.to_string(),
                    }));
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let key = match object_key_for(&self.root, entry.path()) {
                Ok(key) => key,
                Err(ObjectKeyError::OutsideRoot { .. }) => continue,
                Err(error) => {
                    return Some(Err(TraversalError {
                        path: entry.path().display().to_string(),
                        message: error.to_string(),
                    }));
                }
            };

            return Some(Ok(LocalFile {
                content_type: content_type_for(entry.path()),
                path: entry.into_path(),
                key,
            }));
        }
    }
}
