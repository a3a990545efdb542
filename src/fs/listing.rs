//! Directory enumeration primitives
//!
//! The walker never calls `std::fs` directly; it goes through [`Enumerator`]
//! so listings can be swapped out (tests inject failing or slow listers).

use crate::fs::mask::Mask;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Lists the immediate children of a directory
pub trait Enumerator: Send + Sync {
    /// Subdirectories of `path` whose names match `mask`, as absolute paths
    fn list_directories(&self, path: &Path, mask: &Mask) -> io::Result<Vec<PathBuf>>;

    /// Non-directory entries of `path` whose names match `mask`, as absolute paths
    fn list_files(&self, path: &Path, mask: &Mask) -> io::Result<Vec<PathBuf>>;
}

/// Enumerator backed by `std::fs::read_dir`
///
/// Symlinks are never descended into, so link cycles cannot trap the walk.
/// A link to a file (or a dangling link) is listed as a file; a link to a
/// directory is listed as neither.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsEnumerator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    Directory,
    File,
    LinkedDirectory,
}

fn classify(entry: &fs::DirEntry) -> io::Result<EntryKind> {
    let file_type = entry.file_type()?;
    if file_type.is_dir() {
        return Ok(EntryKind::Directory);
    }
    if !file_type.is_symlink() {
        return Ok(EntryKind::File);
    }

    match fs::metadata(entry.path()) {
        Ok(meta) if meta.is_dir() => Ok(EntryKind::LinkedDirectory),
        _ => Ok(EntryKind::File),
    }
}

impl OsEnumerator {
    fn list(&self, path: &Path, mask: &Mask, want: EntryKind) -> io::Result<Vec<PathBuf>> {
        let mut out = Vec::new();

        for entry in fs::read_dir(path)? {
            let entry = entry?;
            if classify(&entry)? != want {
                continue;
            }

            let name = entry.file_name();
            // Names that are not valid UTF-8 can only match the catch-all mask
            let matched = match name.to_str() {
                Some(name) => mask.is_match(name),
                None => mask.matches_all(),
            };
            if matched {
                out.push(entry.path());
            }
        }

        Ok(out)
    }
}

impl Enumerator for OsEnumerator {
    fn list_directories(&self, path: &Path, mask: &Mask) -> io::Result<Vec<PathBuf>> {
        self.list(path, mask, EntryKind::Directory)
    }

    fn list_files(&self, path: &Path, mask: &Mask) -> io::Result<Vec<PathBuf>> {
        self.list(path, mask, EntryKind::File)
    }
}
