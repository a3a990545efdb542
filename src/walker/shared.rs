//! State shared between the controller and its worker threads

use crate::config::WalkConfig;
use crate::error::{EnumerationError, InvariantViolation, WalkerError, WorkerError};
use crate::fs::{DirectoryItem, Enumerator, WalkItem};
use crate::walker::queue::BoundedQueue;
use crate::walker::sink::Sink;
use crate::walker::state::{WalkProgress, WalkState, WalkStatus, WalkSummary};
use parking_lot::Mutex;
use std::cell::Cell;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

thread_local! {
    static WALKER_THREAD: Cell<bool> = const { Cell::new(false) };
}

/// Mark the current thread as owned by a walker
pub(crate) fn enter_walker_thread() {
    WALKER_THREAD.with(|flag| flag.set(true));
}

/// True on producer, consumer, driver and task threads
///
/// Joining is skipped there: a callback that closes the walker would
/// otherwise wait on itself.
pub(crate) fn on_walker_thread() -> bool {
    WALKER_THREAD.with(|flag| flag.get())
}

/// Error that ended the walk early; surfaced to pull callers
#[derive(Debug, Clone)]
pub(crate) enum Fatal {
    Invariant(InvariantViolation),
    Worker(WorkerError),
}

impl From<Fatal> for WalkerError {
    fn from(fatal: Fatal) -> Self {
        match fatal {
            Fatal::Invariant(violation) => WalkerError::Invariant(violation),
            Fatal::Worker(worker) => WalkerError::Worker(worker),
        }
    }
}

pub(crate) struct Shared {
    pub config: WalkConfig,

    /// Walk root, shared by every delivered item
    pub base: Arc<PathBuf>,

    pub state: WalkState,

    /// Producer → consumer hand-off
    pub directories: BoundedQueue<DirectoryItem>,

    /// Consumer → caller hand-off
    pub sink: Sink,

    pub enumerator: Arc<dyn Enumerator>,

    fatal: Mutex<Option<Fatal>>,

    /// Directories that already produced an enumeration error
    failed_dirs: Mutex<HashSet<PathBuf>>,

    started_at: OnceLock<Instant>,
    finished_in: OnceLock<Duration>,
}

impl Shared {
    pub fn new(config: WalkConfig, enumerator: Arc<dyn Enumerator>) -> Self {
        let base = Arc::new(config.root.clone());
        let directories = BoundedQueue::new(config.directory_queue_size);
        let sink = Sink::new(&config.delivery, config.max_queued);

        Self {
            config,
            base,
            state: WalkState::new(),
            directories,
            sink,
            enumerator,
            fatal: Mutex::new(None),
            failed_dirs: Mutex::new(HashSet::new()),
            started_at: OnceLock::new(),
            finished_in: OnceLock::new(),
        }
    }

    pub fn mark_started(&self) -> bool {
        let first = self.state.mark_started();
        if first {
            let _ = self.started_at.set(Instant::now());
        }
        first
    }

    pub fn is_stopped(&self) -> bool {
        self.state.is_stop_requested()
    }

    /// Stop the walk: clear the running flags, close both queues, wake waiters
    ///
    /// A completed walk stays completed; only its (empty) queues are closed.
    pub fn stop(&self, reason: &str) {
        if self.is_completed() {
            self.directories.close();
            self.sink.close();
            return;
        }
        if !self.state.request_stop() {
            return;
        }

        let pending_dirs = self.directories.close();
        let discarded = self.sink.close();
        let _ = self.finished_in.set(self.elapsed());

        info!(
            reason = reason,
            pending_dirs = pending_dirs,
            discarded = discarded,
            "Walk stopped"
        );
    }

    /// Record a fatal invariant violation and stop
    pub fn fail(&self, violation: InvariantViolation) {
        error!(error = %violation, "Invariant violated, stopping walk");
        self.record_fatal(Fatal::Invariant(violation));
        self.stop("invariant violation");
    }

    /// Record a worker failure (a panic) and stop
    pub fn fail_worker(&self, failure: WorkerError) {
        error!(error = %failure, "Worker failed, stopping walk");
        self.record_fatal(Fatal::Worker(failure));
        self.stop("worker failed");
    }

    fn record_fatal(&self, failure: Fatal) {
        let mut fatal = self.fatal.lock();
        if fatal.is_none() {
            *fatal = Some(failure);
        }
    }

    pub fn fatal(&self) -> Option<Fatal> {
        self.fatal.lock().clone()
    }

    /// Hand an item to the sink; false means the walk is over for this thread
    pub fn deliver(&self, item: WalkItem) -> bool {
        let is_file = item.is_file();
        if !self.sink.deliver(item) {
            return false;
        }

        // Pull delivery counts at dequeue time, push delivery here
        if is_file && self.sink.is_push() {
            if let Err(violation) = self.state.record_files_delivered(1) {
                self.fail(violation);
                return false;
            }
        }
        true
    }

    /// Report an enumeration error; only the first one per directory counts
    pub fn report_error(&self, error: EnumerationError) {
        if !self.failed_dirs.lock().insert(error.path.clone()) {
            debug!(
                path = %error.path.display(),
                operation = %error.operation,
                error = %error.message,
                "Directory already reported as failed"
            );
            return;
        }

        self.state.record_error();
        warn!(
            path = %error.path.display(),
            operation = %error.operation,
            error = %error.message,
            "Enumeration failed, continuing"
        );
        self.sink.report_error(error);
    }

    /// Consumer side is done: no more items will reach the sink
    pub fn finish_file_search(&self) {
        self.state.finish_file_search();
        let _ = self.finished_in.set(self.elapsed());
        self.sink.finish(&self.summary());
    }

    pub fn status(&self) -> WalkStatus {
        self.state.status(|| self.sink.is_drained())
    }

    pub fn is_completed(&self) -> bool {
        self.status() == WalkStatus::Completed
    }

    pub fn progress(&self) -> f64 {
        if self.is_completed() {
            return 1.0;
        }
        self.state.progress(&self.config.progress_weights)
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at
            .get()
            .map(|t| t.elapsed())
            .unwrap_or_default()
    }

    pub fn snapshot(&self) -> WalkProgress {
        WalkProgress {
            status: self.status(),
            directories_seen: self.state.directories_seen(),
            directories_processed: self.state.directories_processed(),
            files_seen: self.state.files_seen(),
            files_delivered: self.state.files_delivered(),
            errors: self.state.errors(),
            queued: self.sink.len(),
            high_water: self.sink.high_water_mark(),
            active_tasks: self.state.active_tasks(),
            elapsed: self.elapsed(),
            fraction: self.progress(),
        }
    }

    pub fn summary(&self) -> WalkSummary {
        WalkSummary {
            directories: self.state.directories_processed(),
            files: self.state.files_seen(),
            errors: self.state.errors(),
            duration: self
                .finished_in
                .get()
                .copied()
                .unwrap_or_else(|| self.elapsed()),
            completed: !self.is_stopped(),
        }
    }
}
