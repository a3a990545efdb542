//! stream-walker - incremental, backpressured directory walker
//!
//! Walks a directory tree in the background and hands matching files and
//! directories to the caller as soon as they are found.
//!
//! # Features
//!
//! - **Pipelined discovery**: a producer thread discovers directories while a
//!   consumer thread scans them for files.
//!
//! - **Backpressure**: the result queue has a capacity ceiling; the walk
//!   blocks until the caller catches up, so memory stays bounded.
//!
//! - **Pull or push**: read results with `get_next`/`get_batch`/`get_all`,
//!   or receive them through a [`WalkEventHandler`].
//!
//! - **Traversal orders**: breadth-first, depth-first (pre- or post-order)
//!   and a bounded task window.
//!
//! # Example
//!
//! ```no_run
//! use stream_walker::{Traversal, WalkConfig, Walker};
//!
//! let config = WalkConfig::new(".")?
//!     .with_file_mask("*.rs")?
//!     .with_max_queued(64)
//!     .with_traversal(Traversal::DepthFirst { deepest_first: false });
//!
//! let walker = Walker::new(config)?;
//! for item in walker.iter() {
//!     println!("{}", item?.relative().display());
//! }
//! # Ok::<(), stream_walker::WalkerError>(())
//! ```

pub mod config;
pub mod error;
pub mod fs;
pub mod progress;
pub mod walker;

pub use config::{CliArgs, Report, Traversal, WalkConfig};
pub use error::{
    ConfigError, EnumerationError, InvariantViolation, PathError, Result, WalkerError,
    WorkerError,
};
pub use fs::{DirectoryItem, Enumerator, FileItem, Mask, OsEnumerator, PathItem, WalkItem};
pub use walker::{
    Delivery, ProgressWeights, StopHandle, WalkEventHandler, WalkProgress, WalkStatus,
    WalkSummary, Walker,
};
