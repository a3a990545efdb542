//! Filesystem collaborators used by the walker
//!
//! - [`paths`]: lexical join/normalize and relative-path arithmetic
//! - [`mask`]: wildcard masks for file and directory names
//! - [`listing`]: the [`Enumerator`] seam over directory listing
//! - [`types`]: the immutable items delivered to callers

pub mod listing;
pub mod mask;
pub mod paths;
pub mod types;

pub use listing::{Enumerator, OsEnumerator};
pub use mask::Mask;
pub use types::{DirectoryItem, FileItem, PathItem, WalkItem};
