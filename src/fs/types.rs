//! Path value objects handed out by the walker
//!
//! Every item is a `(base, relative)` pair with the normalized full path
//! computed once. Items are immutable and cheap to clone: the base directory
//! is shared behind an `Arc`.

use crate::error::PathError;
use crate::fs::paths;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A path under a base directory
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathItem {
    base: Arc<PathBuf>,
    relative: PathBuf,
    full: PathBuf,
}

impl PathItem {
    /// Build from a base directory and a path relative to it
    pub fn new(base: Arc<PathBuf>, relative: impl Into<PathBuf>) -> Self {
        let relative = relative.into();
        let full = paths::combine(&base, &[&relative]);
        Self {
            base,
            relative,
            full,
        }
    }

    /// Build from a full path, deriving the relative part
    pub fn from_full(base: Arc<PathBuf>, full: &Path) -> Result<Self, PathError> {
        let relative = paths::relative_to(full, &base)?;
        Ok(Self::new(base, relative))
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn relative(&self) -> &Path {
        &self.relative
    }

    pub fn full_path(&self) -> &Path {
        &self.full
    }

    /// Final component of the full path
    pub fn name(&self) -> Option<&str> {
        self.full.file_name().and_then(|n| n.to_str())
    }

    /// Parent of this item, which may lie above the base directory
    pub fn parent(&self) -> Option<PathItem> {
        let parent = self.full.parent()?;
        Some(Self {
            base: Arc::clone(&self.base),
            relative: paths::combine(&self.relative, &[".."]),
            full: parent.to_path_buf(),
        })
    }
}

impl fmt::Display for PathItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full.display())
    }
}

/// A directory discovered during the walk
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DirectoryItem(PathItem);

impl DirectoryItem {
    /// The walk root itself
    pub fn root(base: Arc<PathBuf>) -> Self {
        Self(PathItem::new(base, PathBuf::new()))
    }

    pub fn new(base: Arc<PathBuf>, relative: impl Into<PathBuf>) -> Self {
        Self(PathItem::new(base, relative))
    }

    pub fn from_full(base: Arc<PathBuf>, full: &Path) -> Result<Self, PathError> {
        PathItem::from_full(base, full).map(Self)
    }

    pub fn is_root(&self) -> bool {
        self.0.relative.as_os_str().is_empty()
    }

    pub fn item(&self) -> &PathItem {
        &self.0
    }

    pub fn full_path(&self) -> &Path {
        self.0.full_path()
    }

    pub fn relative(&self) -> &Path {
        self.0.relative()
    }

    pub fn name(&self) -> Option<&str> {
        self.0.name()
    }
}

impl fmt::Display for DirectoryItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A file discovered during the walk
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileItem(PathItem);

impl FileItem {
    pub fn new(base: Arc<PathBuf>, relative: impl Into<PathBuf>) -> Self {
        Self(PathItem::new(base, relative))
    }

    pub fn from_full(base: Arc<PathBuf>, full: &Path) -> Result<Self, PathError> {
        PathItem::from_full(base, full).map(Self)
    }

    pub fn item(&self) -> &PathItem {
        &self.0
    }

    pub fn full_path(&self) -> &Path {
        self.0.full_path()
    }

    pub fn relative(&self) -> &Path {
        self.0.relative()
    }

    /// File name including extension
    pub fn name(&self) -> Option<&str> {
        self.0.name()
    }

    /// Extension without the leading dot
    pub fn extension(&self) -> Option<&str> {
        self.0.full.extension().and_then(|e| e.to_str())
    }
}

impl fmt::Display for FileItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Anything the walker can deliver
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WalkItem {
    File(FileItem),
    Directory(DirectoryItem),
}

impl WalkItem {
    pub fn full_path(&self) -> &Path {
        match self {
            WalkItem::File(f) => f.full_path(),
            WalkItem::Directory(d) => d.full_path(),
        }
    }

    pub fn relative(&self) -> &Path {
        match self {
            WalkItem::File(f) => f.relative(),
            WalkItem::Directory(d) => d.relative(),
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, WalkItem::File(_))
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, WalkItem::Directory(_))
    }

    pub fn as_file(&self) -> Option<&FileItem> {
        match self {
            WalkItem::File(f) => Some(f),
            WalkItem::Directory(_) => None,
        }
    }
}

impl fmt::Display for WalkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalkItem::File(item) => fmt::Display::fmt(item, f),
            WalkItem::Directory(item) => fmt::Display::fmt(item, f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Arc<PathBuf> {
        Arc::new(PathBuf::from("/data"))
    }

    #[test]
    fn test_file_item_parts() {
        let file = FileItem::new(base(), "sub/report.final.txt");
        assert_eq!(file.full_path(), Path::new("/data/sub/report.final.txt"));
        assert_eq!(file.name(), Some("report.final.txt"));
        assert_eq!(file.extension(), Some("txt"));
        assert_eq!(file.to_string(), "/data/sub/report.final.txt");
    }

    #[test]
    fn test_from_full() {
        let dir = DirectoryItem::from_full(base(), Path::new("/data/a/./b")).unwrap();
        assert_eq!(dir.relative(), Path::new("a/b"));
        assert!(!dir.is_root());

        assert!(FileItem::from_full(base(), Path::new("/elsewhere/x")).is_err());
    }

    #[test]
    fn test_root_and_parent() {
        let root = DirectoryItem::root(base());
        assert!(root.is_root());
        assert_eq!(root.full_path(), Path::new("/data"));

        let parent = root.item().parent().unwrap();
        assert_eq!(parent.full_path(), Path::new("/"));
        assert_eq!(parent.relative(), Path::new(".."));
    }
}
