//! Configuration types for stream-walker
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Runtime configuration with validation
//! - Traversal and report selection

use crate::error::ConfigError;
use crate::fs::{paths, DirectoryItem, FileItem, Mask};
use crate::walker::predicate::{DirectoryMatcher, FileMatcher, Predicates};
use crate::walker::sink::{Delivery, WalkEventHandler};
use crate::walker::state::ProgressWeights;
use clap::{Parser, ValueEnum};
use regex::Regex;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Maximum reasonable task window
pub const MAX_WINDOW: usize = 512;

/// Default result queue capacity
pub const DEFAULT_MAX_QUEUED: usize = 1000;

/// Default wait slice for `get_next_with`
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Incremental directory walker
#[derive(Parser, Debug, Clone)]
#[command(
    name = "stream-walker",
    version,
    about = "Walk a directory tree and stream matches while the walk continues",
    long_about = "Walks a directory tree with a directory producer and a file consumer \
                  joined by a bounded queue. Matches are printed as soon as they are found.",
    after_help = "EXAMPLES:\n    \
        stream-walker ~/src -f '*.rs'\n    \
        stream-walker /data --order deepest --dirs\n    \
        stream-walker /data --order window -w 16 --exclude '\\.git/'\n    \
        stream-walker /data -f '*.log' --max-queued 1 --events"
)]
pub struct CliArgs {
    /// Directory to walk
    #[arg(value_name = "ROOT")]
    pub root: PathBuf,

    /// Wildcard mask for file names
    #[arg(short = 'f', long, default_value = "*", value_name = "MASK")]
    pub file_mask: String,

    /// Wildcard mask for directory names
    #[arg(long, default_value = "*", value_name = "MASK")]
    pub dir_mask: String,

    /// Result queue capacity (0 = unbounded)
    #[arg(long, default_value_t = DEFAULT_MAX_QUEUED, value_name = "NUM")]
    pub max_queued: usize,

    /// Directory work queue capacity (0 = unbounded)
    #[arg(long, default_value = "0", value_name = "NUM")]
    pub dir_queue: usize,

    /// Traversal order
    #[arg(long, value_enum, default_value_t = OrderArg::Bfs)]
    pub order: OrderArg,

    /// Tasks in flight for --order window
    #[arg(
        short = 'w',
        long,
        default_value_t = default_window(),
        value_name = "NUM"
    )]
    pub window: usize,

    /// Report directories instead of files
    #[arg(long, conflicts_with = "all")]
    pub dirs: bool,

    /// Report both files and directories
    #[arg(long)]
    pub all: bool,

    /// Exclude paths matching pattern (can be repeated)
    #[arg(long = "exclude", value_name = "PATTERN", action = clap::ArgAction::Append)]
    pub exclude_patterns: Vec<String>,

    /// Maximum directory depth (unlimited if not set)
    #[arg(short = 'd', long, value_name = "NUM")]
    pub max_depth: Option<usize>,

    /// Deliver results through event callbacks instead of the pull queue
    #[arg(long)]
    pub events: bool,

    /// Quiet mode - suppress progress output
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose output (show errors and warnings)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

/// `--order` values
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderArg {
    /// Breadth-first pipeline
    Bfs,
    /// Depth-first, parents before children
    Dfs,
    /// Depth-first, children before parents
    Deepest,
    /// One task per directory, bounded window
    Window,
}

fn default_window() -> usize {
    // Directory listing is I/O bound
    (num_cpus::get() * 2).min(MAX_WINDOW)
}

/// How the tree is scheduled and in which order directories are scanned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Traversal {
    /// A directory is queued for scanning before its children are listed
    #[default]
    BreadthFirst,

    /// Depth-first; `deepest_first` emits a directory after its subtree
    DepthFirst { deepest_first: bool },

    /// One short-lived thread per directory, at most `width` in flight
    TaskWindow { width: usize },
}

impl fmt::Display for Traversal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Traversal::BreadthFirst => f.write_str("breadth-first"),
            Traversal::DepthFirst {
                deepest_first: false,
            } => f.write_str("depth-first"),
            Traversal::DepthFirst {
                deepest_first: true,
            } => f.write_str("deepest-first"),
            Traversal::TaskWindow { width } => write!(f, "task-window({})", width),
        }
    }
}

/// Which kinds of items are delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Report {
    #[default]
    Files,
    Directories,
    All,
}

impl Report {
    pub fn includes_files(&self) -> bool {
        matches!(self, Report::Files | Report::All)
    }

    pub fn includes_directories(&self) -> bool {
        matches!(self, Report::Directories | Report::All)
    }
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct WalkConfig {
    /// Absolute, normalized walk root
    pub root: PathBuf,

    /// Mask for directory names (gates descent)
    pub directory_mask: Mask,

    /// Mask for file names
    pub file_mask: Mask,

    /// Ordered caller predicates
    pub predicates: Predicates,

    /// Result queue capacity (0 = unbounded)
    pub max_queued: usize,

    /// Directory work queue capacity (0 = unbounded)
    pub directory_queue_size: usize,

    pub traversal: Traversal,

    pub report: Report,

    /// Maximum traversal depth (root = 0)
    pub max_depth: Option<usize>,

    /// Compiled exclude patterns, matched against full paths
    pub exclude_patterns: Vec<Regex>,

    /// Wait slice used by `get_next_with`
    pub poll_interval: Duration,

    pub progress_weights: ProgressWeights,

    pub delivery: Delivery,
}

/// Resolve and check a walk root
fn resolve_root(root: &Path) -> Result<PathBuf, ConfigError> {
    if root.as_os_str().is_empty() {
        return Err(ConfigError::EmptyRoot);
    }

    let absolute = std::path::absolute(root).map_err(|_| ConfigError::RootNotFound {
        path: root.to_path_buf(),
    })?;
    let absolute = paths::normalize(&absolute);

    match std::fs::metadata(&absolute) {
        Ok(meta) if meta.is_dir() => Ok(absolute),
        Ok(_) => Err(ConfigError::NotADirectory { path: absolute }),
        Err(_) => Err(ConfigError::RootNotFound { path: absolute }),
    }
}

impl WalkConfig {
    /// Create a configuration with defaults, failing fast on a bad root
    pub fn new(root: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let root = resolve_root(root.as_ref())?;

        Ok(Self {
            root,
            directory_mask: Mask::all(),
            file_mask: Mask::all(),
            predicates: Predicates::new(),
            max_queued: DEFAULT_MAX_QUEUED,
            directory_queue_size: 0,
            traversal: Traversal::default(),
            report: Report::default(),
            max_depth: None,
            exclude_patterns: Vec::new(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            progress_weights: ProgressWeights::default(),
            delivery: Delivery::Pull,
        })
    }

    /// Create and validate configuration from CLI arguments
    ///
    /// `--events` is not applied here; the binary installs its own handler.
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        let traversal = match args.order {
            OrderArg::Bfs => Traversal::BreadthFirst,
            OrderArg::Dfs => Traversal::DepthFirst {
                deepest_first: false,
            },
            OrderArg::Deepest => Traversal::DepthFirst {
                deepest_first: true,
            },
            OrderArg::Window => Traversal::TaskWindow { width: args.window },
        };

        let report = if args.all {
            Report::All
        } else if args.dirs {
            Report::Directories
        } else {
            Report::Files
        };

        let mut config = Self::new(&args.root)?
            .with_file_mask(&args.file_mask)?
            .with_directory_mask(&args.dir_mask)?
            .with_max_queued(args.max_queued)
            .with_directory_queue_size(args.dir_queue)
            .with_traversal(traversal)
            .with_report(report);

        if let Some(depth) = args.max_depth {
            config = config.with_max_depth(depth);
        }

        for pattern in &args.exclude_patterns {
            config = config.with_exclude(pattern)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_file_mask(mut self, mask: &str) -> Result<Self, ConfigError> {
        self.file_mask = Mask::new(mask)?;
        Ok(self)
    }

    pub fn with_directory_mask(mut self, mask: &str) -> Result<Self, ConfigError> {
        self.directory_mask = Mask::new(mask)?;
        Ok(self)
    }

    /// Append a file predicate (evaluated after those already added)
    pub fn with_file_matcher<M: FileMatcher + 'static>(mut self, matcher: M) -> Self {
        self.predicates.push_file(Arc::new(matcher));
        self
    }

    /// Append a directory predicate (evaluated after those already added)
    pub fn with_directory_matcher<M: DirectoryMatcher + 'static>(mut self, matcher: M) -> Self {
        self.predicates.push_directory(Arc::new(matcher));
        self
    }

    pub fn with_max_queued(mut self, max_queued: usize) -> Self {
        self.max_queued = max_queued;
        self
    }

    pub fn with_directory_queue_size(mut self, size: usize) -> Self {
        self.directory_queue_size = size;
        self
    }

    pub fn with_traversal(mut self, traversal: Traversal) -> Self {
        self.traversal = traversal;
        self
    }

    pub fn with_report(mut self, report: Report) -> Self {
        self.report = report;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_exclude(mut self, pattern: &str) -> Result<Self, ConfigError> {
        let regex = Regex::new(pattern).map_err(|e| ConfigError::InvalidExcludePattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        self.exclude_patterns.push(regex);
        Ok(self)
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_progress_weights(mut self, weights: ProgressWeights) -> Self {
        self.progress_weights = weights;
        self
    }

    pub fn with_event_handler(mut self, handler: Arc<dyn WalkEventHandler>) -> Self {
        self.delivery = Delivery::Push(handler);
        self
    }

    /// Re-check everything that can go stale or be set out of range
    pub fn validate(&self) -> Result<(), ConfigError> {
        let resolved = resolve_root(&self.root)?;
        if resolved != self.root {
            return Err(ConfigError::RootNotFound {
                path: self.root.clone(),
            });
        }

        validate_traversal(self.traversal)?;

        if self.poll_interval.is_zero() {
            return Err(ConfigError::InvalidPollInterval);
        }

        Ok(())
    }

    /// Check if a path should be excluded
    pub fn is_excluded(&self, path: &Path) -> bool {
        if self.exclude_patterns.is_empty() {
            return false;
        }
        let path = path.to_string_lossy();
        self.exclude_patterns.iter().any(|re| re.is_match(&path))
    }

    /// True when `depth` may still have its children listed
    pub fn may_descend(&self, depth: usize) -> bool {
        self.max_depth.map_or(true, |max| depth < max)
    }

    /// Mask, exclusion and predicate checks for a discovered directory
    pub fn accepts_directory(&self, dir: &DirectoryItem) -> bool {
        !self.is_excluded(dir.full_path()) && self.predicates.accepts_directory(dir)
    }

    /// Exclusion and predicate checks for a discovered file
    pub fn accepts_file(&self, file: &FileItem) -> bool {
        !self.is_excluded(file.full_path()) && self.predicates.accepts_file(file)
    }
}

pub(crate) fn validate_traversal(traversal: Traversal) -> Result<(), ConfigError> {
    if let Traversal::TaskWindow { width } = traversal {
        if width == 0 || width > MAX_WINDOW {
            return Err(ConfigError::InvalidWindow {
                width,
                max: MAX_WINDOW,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_root() {
        let dir = tempdir().unwrap();
        let err = WalkConfig::new(dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, ConfigError::RootNotFound { .. }));
    }

    #[test]
    fn test_empty_root() {
        assert_eq!(WalkConfig::new("").unwrap_err(), ConfigError::EmptyRoot);
    }

    #[test]
    fn test_file_root() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("f.txt");
        std::fs::write(&file, b"x").unwrap();
        let err = WalkConfig::new(&file).unwrap_err();
        assert!(matches!(err, ConfigError::NotADirectory { .. }));
    }

    #[test]
    fn test_root_is_normalized() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let config = WalkConfig::new(dir.path().join("sub/./../sub")).unwrap();
        assert_eq!(config.root, dir.path().join("sub"));
    }

    #[test]
    fn test_exclude_pattern() {
        let dir = tempdir().unwrap();
        let config = WalkConfig::new(dir.path())
            .unwrap()
            .with_exclude(r"\.snapshot")
            .unwrap();

        assert!(config.is_excluded(Path::new("/data/.snapshot/hourly.0")));
        assert!(!config.is_excluded(Path::new("/data/myfile.txt")));

        let err = WalkConfig::new(dir.path())
            .unwrap()
            .with_exclude("(unclosed")
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidExcludePattern { .. }));
    }

    #[test]
    fn test_validate_window() {
        let dir = tempdir().unwrap();
        let config = WalkConfig::new(dir.path())
            .unwrap()
            .with_traversal(Traversal::TaskWindow { width: 0 });
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidWindow { width: 0, .. })
        ));
    }

    #[test]
    fn test_from_args() {
        let dir = tempdir().unwrap();
        let root = dir.path().to_string_lossy().to_string();
        let args = CliArgs::parse_from([
            "stream-walker",
            root.as_str(),
            "-f",
            "*.txt",
            "--order",
            "deepest",
            "--dirs",
            "--max-queued",
            "1",
            "-d",
            "3",
        ]);

        let config = WalkConfig::from_args(args).unwrap();
        assert_eq!(
            config.traversal,
            Traversal::DepthFirst {
                deepest_first: true
            }
        );
        assert_eq!(config.report, Report::Directories);
        assert_eq!(config.max_queued, 1);
        assert_eq!(config.max_depth, Some(3));
        assert!(config.file_mask.is_match("a.txt"));
        assert!(config.may_descend(2));
        assert!(!config.may_descend(3));
    }
}
