//! Concurrent directory walker
//!
//! Directory discovery and file discovery run on separate threads joined by
//! a bounded queue, so matches reach the caller while the tree is still
//! being walked.
//!
//! # Architecture
//!
//! ```text
//!   ┌──────────────────┐   DirectoryItem   ┌──────────────────┐
//!   │  walk-producer   │ ────────────────▶ │  walk-consumer   │
//!   │  BFS / DFS       │   work queue      │  files + masks   │
//!   └──────────────────┘                   └────────┬─────────┘
//!                                                   │ WalkItem
//!                              ┌────────────────────┴───────────┐
//!                              ▼                                ▼
//!                   ┌────────────────────┐        ┌────────────────────┐
//!                   │  result queue      │        │  WalkEventHandler  │
//!                   │  (bounded, pull)   │        │  (push)            │
//!                   └─────────┬──────────┘        └────────────────────┘
//!                             ▼
//!                   Walker::get_next / get_batch / get_all
//! ```
//!
//! The task-window strategy replaces the producer/consumer pair with a
//! single `walk-driver` that runs one `walk-task-N` thread per directory.

mod consumer;
pub mod coordinator;
pub mod predicate;
mod producer;
pub mod queue;
mod shared;
pub mod sink;
pub mod state;
mod window;

pub use coordinator::{Items, StopHandle, Walker};
pub use predicate::{DirectoryMatcher, FileMatcher, Predicates};
pub use queue::{BoundedQueue, Dequeue, QueueStats};
pub use sink::{Delivery, WalkEventHandler};
pub use state::{ProgressWeights, WalkProgress, WalkStatus, WalkSummary};
