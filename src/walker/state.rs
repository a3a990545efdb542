//! Shared walk state: lifecycle flags, counters and progress
//!
//! Every field is an atomic so the producer, the consumer and any number of
//! caller threads can read it without taking a queue lock.

use crate::error::InvariantViolation;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// Lifecycle state of a walker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkStatus {
    /// Not started yet
    Idle,
    /// Directories are still being discovered
    Running,
    /// Discovery finished; files are still being scanned or read
    Draining,
    /// Everything was discovered, scanned and read
    Completed,
    /// Stopped by the caller (or by a fatal error); never resumes
    Stopped,
}

impl WalkStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, WalkStatus::Running | WalkStatus::Draining)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, WalkStatus::Completed | WalkStatus::Stopped)
    }
}

impl fmt::Display for WalkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WalkStatus::Idle => "idle",
            WalkStatus::Running => "running",
            WalkStatus::Draining => "draining",
            WalkStatus::Completed => "completed",
            WalkStatus::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// Weights of the three progress phases
///
/// The weights do not need to sum to 1; the result is normalized by their
/// total.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressWeights {
    /// Directory discovery finished
    pub discovery: f64,
    /// Share of discovered directories whose files were scanned
    pub scanning: f64,
    /// Share of matched files handed to the caller
    pub delivery: f64,
}

impl Default for ProgressWeights {
    fn default() -> Self {
        Self {
            discovery: 0.2,
            scanning: 0.4,
            delivery: 0.4,
        }
    }
}

/// `num / den` as a float in [0, 1]; 0 when nothing has been seen yet
fn ratio(num: u64, den: u64) -> f64 {
    if den == 0 {
        return 0.0;
    }
    (num as f64 / den as f64).clamp(0.0, 1.0)
}

/// Flags and counters for one walk
#[derive(Debug, Default)]
pub struct WalkState {
    started: AtomicBool,
    directory_search_running: AtomicBool,
    file_search_running: AtomicBool,
    stop_requested: AtomicBool,

    directories_seen: AtomicU64,
    directories_processed: AtomicU64,
    files_seen: AtomicU64,
    files_delivered: AtomicU64,
    errors: AtomicU64,

    /// Task-window threads currently scanning
    active_tasks: AtomicUsize,
}

impl WalkState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip into the running state. Returns false if already started.
    pub fn mark_started(&self) -> bool {
        if self.started.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.directory_search_running.store(true, Ordering::SeqCst);
        self.file_search_running.store(true, Ordering::SeqCst);
        true
    }

    /// Record a stop request. Returns true only for the first request.
    pub fn request_stop(&self) -> bool {
        let first = !self.stop_requested.swap(true, Ordering::SeqCst);
        self.directory_search_running.store(false, Ordering::SeqCst);
        self.file_search_running.store(false, Ordering::SeqCst);
        first
    }

    pub fn finish_directory_search(&self) {
        self.directory_search_running.store(false, Ordering::SeqCst);
    }

    pub fn finish_file_search(&self) {
        self.file_search_running.store(false, Ordering::SeqCst);
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::SeqCst)
    }

    pub fn directory_search_running(&self) -> bool {
        self.directory_search_running.load(Ordering::SeqCst)
    }

    pub fn file_search_running(&self) -> bool {
        self.file_search_running.load(Ordering::SeqCst)
    }

    pub fn record_directory_seen(&self) {
        self.directories_seen.fetch_add(1, Ordering::SeqCst);
    }

    /// Count a scanned directory; more scanned than seen is fatal
    pub fn record_directory_processed(&self) -> Result<(), InvariantViolation> {
        let processed = self.directories_processed.fetch_add(1, Ordering::SeqCst) + 1;
        let seen = self.directories_seen.load(Ordering::SeqCst);
        if processed > seen {
            return Err(InvariantViolation::new(format!(
                "{} directories processed but only {} seen",
                processed, seen
            )));
        }
        Ok(())
    }

    pub fn record_file_seen(&self) {
        self.files_seen.fetch_add(1, Ordering::SeqCst);
    }

    /// Count files handed to the caller; more delivered than seen is fatal
    pub fn record_files_delivered(&self, count: u64) -> Result<(), InvariantViolation> {
        if count == 0 {
            return Ok(());
        }
        let delivered = self.files_delivered.fetch_add(count, Ordering::SeqCst) + count;
        let seen = self.files_seen.load(Ordering::SeqCst);
        if delivered > seen {
            return Err(InvariantViolation::new(format!(
                "{} files delivered but only {} seen",
                delivered, seen
            )));
        }
        Ok(())
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn directories_seen(&self) -> u64 {
        self.directories_seen.load(Ordering::SeqCst)
    }

    pub fn directories_processed(&self) -> u64 {
        self.directories_processed.load(Ordering::SeqCst)
    }

    pub fn files_seen(&self) -> u64 {
        self.files_seen.load(Ordering::SeqCst)
    }

    pub fn files_delivered(&self) -> u64 {
        self.files_delivered.load(Ordering::SeqCst)
    }

    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    pub fn active_tasks(&self) -> usize {
        self.active_tasks.load(Ordering::SeqCst)
    }

    /// Derive the lifecycle status.
    ///
    /// `sink_drained` must be sampled after this call reads the running
    /// flags, which is why it is a closure: an item enqueued just before
    /// `file_search_running` drops is then always observed.
    pub fn status(&self, sink_drained: impl FnOnce() -> bool) -> WalkStatus {
        if self.is_stop_requested() {
            return WalkStatus::Stopped;
        }
        if !self.is_started() {
            return WalkStatus::Idle;
        }
        if self.directory_search_running() {
            return WalkStatus::Running;
        }
        if self.file_search_running() || !sink_drained() {
            return WalkStatus::Draining;
        }
        WalkStatus::Completed
    }

    /// Weighted progress estimate in [0, 1]
    pub fn progress(&self, weights: &ProgressWeights) -> f64 {
        let total = weights.discovery + weights.scanning + weights.delivery;
        if total <= 0.0 {
            return 0.0;
        }

        let discovery = if self.is_started()
            && !self.is_stop_requested()
            && !self.directory_search_running()
        {
            1.0
        } else {
            0.0
        };
        let scanning = ratio(self.directories_processed(), self.directories_seen());
        let delivery = ratio(self.files_delivered(), self.files_seen());

        let weighted = weights.discovery * discovery
            + weights.scanning * scanning
            + weights.delivery * delivery;
        (weighted / total).clamp(0.0, 1.0)
    }
}

/// RAII guard counting an in-flight task
pub struct TaskGuard<'a> {
    state: &'a WalkState,
}

impl<'a> TaskGuard<'a> {
    pub fn new(state: &'a WalkState) -> Self {
        state.active_tasks.fetch_add(1, Ordering::SeqCst);
        Self { state }
    }
}

impl<'a> Drop for TaskGuard<'a> {
    fn drop(&mut self) {
        self.state.active_tasks.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Point-in-time view of a walk, for display
#[derive(Debug, Clone)]
pub struct WalkProgress {
    pub status: WalkStatus,

    /// Directories discovered (root included)
    pub directories_seen: u64,

    /// Directories whose files were scanned
    pub directories_processed: u64,

    /// Files that passed masks and predicates
    pub files_seen: u64,

    /// Files handed to the caller
    pub files_delivered: u64,

    /// Enumeration errors
    pub errors: u64,

    /// Items waiting in the result queue
    pub queued: usize,

    /// Largest result queue length observed
    pub high_water: usize,

    /// Task-window threads in flight
    pub active_tasks: usize,

    pub elapsed: Duration,

    /// Weighted estimate in [0, 1]
    pub fraction: f64,
}

impl WalkProgress {
    /// Calculate matched files per second
    pub fn files_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.files_seen as f64 / secs
        } else {
            0.0
        }
    }
}

/// Totals of a finished (or stopped) walk
#[derive(Debug, Clone, PartialEq)]
pub struct WalkSummary {
    /// Directories scanned
    pub directories: u64,

    /// Files matched
    pub files: u64,

    /// Enumeration errors
    pub errors: u64,

    pub duration: Duration,

    /// False if the walk was stopped before it ran out of work
    pub completed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_guards_zero_counts() {
        let state = WalkState::new();
        assert_eq!(state.progress(&ProgressWeights::default()), 0.0);

        state.mark_started();
        assert_eq!(state.progress(&ProgressWeights::default()), 0.0);
    }

    #[test]
    fn test_progress_phases() {
        let state = WalkState::new();
        let weights = ProgressWeights::default();
        state.mark_started();

        state.record_directory_seen();
        state.record_directory_seen();
        state.record_directory_processed().unwrap();
        // scanning 1/2 * 0.4
        assert!((state.progress(&weights) - 0.2).abs() < 1e-9);

        state.finish_directory_search();
        state.record_file_seen();
        state.record_file_seen();
        state.record_files_delivered(1).unwrap();
        // 0.2 + 0.2 + 0.4 * 1/2
        assert!((state.progress(&weights) - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_progress_custom_weights_normalized() {
        let state = WalkState::new();
        state.mark_started();
        state.finish_directory_search();

        let weights = ProgressWeights {
            discovery: 1.0,
            scanning: 1.0,
            delivery: 0.0,
        };
        assert!((state.progress(&weights) - 0.5).abs() < 1e-9);

        let zero = ProgressWeights {
            discovery: 0.0,
            scanning: 0.0,
            delivery: 0.0,
        };
        assert_eq!(state.progress(&zero), 0.0);
    }

    #[test]
    fn test_invariants() {
        let state = WalkState::new();
        assert!(state.record_directory_processed().is_err());
        assert!(state.record_files_delivered(1).is_err());
        assert!(state.record_files_delivered(0).is_ok());
    }

    #[test]
    fn test_status_transitions() {
        let state = WalkState::new();
        assert_eq!(state.status(|| true), WalkStatus::Idle);

        assert!(state.mark_started());
        assert!(!state.mark_started());
        assert_eq!(state.status(|| true), WalkStatus::Running);

        state.finish_directory_search();
        assert_eq!(state.status(|| true), WalkStatus::Draining);

        state.finish_file_search();
        assert_eq!(state.status(|| false), WalkStatus::Draining);
        assert_eq!(state.status(|| true), WalkStatus::Completed);

        assert!(state.request_stop());
        assert!(!state.request_stop());
        assert_eq!(state.status(|| true), WalkStatus::Stopped);
    }

    #[test]
    fn test_task_guard() {
        let state = WalkState::new();
        {
            let _a = TaskGuard::new(&state);
            let _b = TaskGuard::new(&state);
            assert_eq!(state.active_tasks(), 2);
        }
        assert_eq!(state.active_tasks(), 0);
    }
}
