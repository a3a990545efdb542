//! Caller-supplied match predicates
//!
//! Predicates run in insertion order and the first rejection wins. Any
//! `Fn(&FileItem) -> bool` / `Fn(&DirectoryItem) -> bool` closure that is
//! `Send + Sync` can be used directly.

use crate::fs::{DirectoryItem, FileItem};
use std::fmt;
use std::sync::Arc;

/// Decides whether a discovered file is reported
pub trait FileMatcher: Send + Sync {
    fn file_matches(&self, item: &FileItem) -> bool;
}

/// Decides whether a discovered directory is reported and descended into
pub trait DirectoryMatcher: Send + Sync {
    fn directory_matches(&self, item: &DirectoryItem) -> bool;
}

impl<F> FileMatcher for F
where
    F: Fn(&FileItem) -> bool + Send + Sync,
{
    fn file_matches(&self, item: &FileItem) -> bool {
        self(item)
    }
}

impl<F> DirectoryMatcher for F
where
    F: Fn(&DirectoryItem) -> bool + Send + Sync,
{
    fn directory_matches(&self, item: &DirectoryItem) -> bool {
        self(item)
    }
}

/// Ordered predicate lists for files and directories
#[derive(Clone, Default)]
pub struct Predicates {
    files: Vec<Arc<dyn FileMatcher>>,
    directories: Vec<Arc<dyn DirectoryMatcher>>,
}

impl Predicates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_file(&mut self, matcher: Arc<dyn FileMatcher>) {
        self.files.push(matcher);
    }

    pub fn push_directory(&mut self, matcher: Arc<dyn DirectoryMatcher>) {
        self.directories.push(matcher);
    }

    /// True when every file predicate accepts the item
    pub fn accepts_file(&self, item: &FileItem) -> bool {
        self.files.iter().all(|m| m.file_matches(item))
    }

    /// True when every directory predicate accepts the item
    pub fn accepts_directory(&self, item: &DirectoryItem) -> bool {
        self.directories.iter().all(|m| m.directory_matches(item))
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.directories.is_empty()
    }
}

impl fmt::Debug for Predicates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicates")
            .field("files", &self.files.len())
            .field("directories", &self.directories.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_first_rejection_short_circuits() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let mut predicates = Predicates::new();
        predicates.push_file(Arc::new(|f: &FileItem| f.extension() == Some("rs")));
        predicates.push_file(Arc::new(move |_: &FileItem| {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        }));

        let base = Arc::new(PathBuf::from("/src"));
        assert!(!predicates.accepts_file(&FileItem::new(Arc::clone(&base), "notes.md")));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        assert!(predicates.accepts_file(&FileItem::new(base, "lib.rs")));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_empty_accepts_everything() {
        let predicates = Predicates::new();
        let base = Arc::new(PathBuf::from("/src"));
        assert!(predicates.is_empty());
        assert!(predicates.accepts_directory(&DirectoryItem::new(base, "any")));
    }
}
