//! Error types for stream-walker
//!
//! This module defines the error hierarchy used by the walker:
//! - Configuration errors, raised synchronously before any thread starts
//! - Lifecycle errors (already running, already finished, locked traversal)
//! - Per-directory enumeration errors, reported through the error channel
//! - Worker thread errors and fatal invariant violations
//!
//! Library code uses thiserror; the binary wraps everything in anyhow.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for the walker
#[derive(Error, Debug)]
pub enum WalkerError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// `start` was called while the walk is still running
    #[error("Walk is already running")]
    AlreadyRunning,

    /// `start` was called on a walker that completed or was stopped
    #[error("Walk has already finished; a walker cannot be restarted")]
    Finished,

    /// Traversal order changes are rejected once the walk has started
    #[error("Traversal order cannot be changed after the walk has started")]
    TraversalLocked,

    /// Pull API used on a walker that delivers through events
    #[error("Results are delivered through events; the pull API is unavailable")]
    PushDelivery,

    /// Worker/concurrency errors
    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    /// Internal accounting went wrong; the walk was stopped
    #[error("Invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),
}

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Root path was empty
    #[error("Root directory must not be empty")]
    EmptyRoot,

    /// Root does not exist
    #[error("Directory not found: '{}'", .path.display())]
    RootNotFound { path: PathBuf },

    /// Root exists but is not a directory
    #[error("Not a directory: '{}'", .path.display())]
    NotADirectory { path: PathBuf },

    /// Wildcard mask failed to compile
    #[error("Invalid mask '{mask}': {reason}")]
    InvalidMask { mask: String, reason: String },

    /// Exclude regex failed to compile
    #[error("Invalid exclude pattern '{pattern}': {reason}")]
    InvalidExcludePattern { pattern: String, reason: String },

    /// Task window outside 1..=max
    #[error("Invalid task window {width}: must be between 1 and {max}")]
    InvalidWindow { width: usize, max: usize },

    /// Poll interval of zero would spin
    #[error("Poll interval must be greater than zero")]
    InvalidPollInterval,
}

/// Worker thread errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkerError {
    /// Thread could not be spawned
    #[error("Failed to spawn thread '{name}': {reason}")]
    SpawnFailed { name: String, reason: String },

    /// Thread panicked
    #[error("Thread '{name}' panicked")]
    Panicked { name: String },
}

/// Which listing call failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListOperation {
    Directories,
    Files,
}

impl std::fmt::Display for ListOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListOperation::Directories => f.write_str("list directories"),
            ListOperation::Files => f.write_str("list files"),
        }
    }
}

/// Failure to enumerate a single directory
///
/// These never abort the walk. They are counted, logged and reported through
/// the error channel (pull delivery) or `on_error` (push delivery).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to {operation} in '{}': {message}", .path.display())]
pub struct EnumerationError {
    /// Directory that failed
    pub path: PathBuf,

    /// Listing call that failed
    pub operation: ListOperation,

    /// Underlying I/O error kind
    pub kind: io::ErrorKind,

    /// Human readable reason
    pub message: String,
}

impl EnumerationError {
    pub fn new(path: impl Into<PathBuf>, operation: ListOperation, error: &io::Error) -> Self {
        Self {
            path: path.into(),
            operation,
            kind: error.kind(),
            message: error.to_string(),
        }
    }

    /// Check if this error is expected during a normal walk (skip and go on)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.kind,
            io::ErrorKind::PermissionDenied | io::ErrorKind::NotFound
        )
    }
}

/// Internal accounting invariant that did not hold
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct InvariantViolation {
    pub message: String,
}

impl InvariantViolation {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Path arithmetic errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// Full path is not below the base directory
    #[error("'{}' is not under '{}'", .path.display(), .base.display())]
    NotUnderBase { path: PathBuf, base: PathBuf },
}

/// Result type alias for WalkerError
pub type Result<T> = std::result::Result<T, WalkerError>;

/// Represents the outcome of scanning a single directory
#[derive(Debug)]
pub enum WalkOutcome {
    /// Directory scanned; `files` items were delivered
    Success { path: PathBuf, files: usize },

    /// Skipped without scanning
    Skipped { path: PathBuf, reason: String },

    /// Listing failed
    Failed {
        path: PathBuf,
        error: EnumerationError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enumeration_error_recoverable() {
        let denied = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let err = EnumerationError::new("/data", ListOperation::Files, &denied);
        assert!(err.is_recoverable());

        let broken = io::Error::new(io::ErrorKind::Other, "disk on fire");
        let err = EnumerationError::new("/data", ListOperation::Directories, &broken);
        assert!(!err.is_recoverable());
        assert!(err.to_string().contains("list directories"));
    }

    #[test]
    fn test_error_conversion() {
        let config_err = ConfigError::RootNotFound {
            path: PathBuf::from("/missing"),
        };
        let walker_err: WalkerError = config_err.into();
        assert!(matches!(walker_err, WalkerError::Config(_)));
        assert!(walker_err.to_string().contains("Directory not found"));
    }
}
