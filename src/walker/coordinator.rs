//! Walk controller - owns the lifecycle of one walk
//!
//! The controller is responsible for:
//! - Spawning the producer and consumer (or the task-window driver)
//! - Starting on demand for pull delivery
//! - Stopping, closing and joining worker threads
//! - The pull API and the live counters

use crate::config::{validate_traversal, Traversal, WalkConfig};
use crate::error::{EnumerationError, Result, WalkerError, WorkerError};
use crate::fs::{Enumerator, OsEnumerator, WalkItem};
use crate::walker::consumer::run_consumer;
use crate::walker::producer::run_producer;
use crate::walker::queue::{BoundedQueue, Dequeue};
use crate::walker::shared::{enter_walker_thread, on_walker_thread, Shared};
use crate::walker::state::{WalkProgress, WalkStatus, WalkSummary};
use crate::walker::window::run_task_window;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

struct Lifecycle {
    traversal: Traversal,
    handles: Vec<(String, JoinHandle<()>)>,
}

/// Fails the walk if a worker thread unwinds, so readers see the panic
/// instead of an early end of results
struct PanicGuard {
    shared: Arc<Shared>,
    name: String,
}

impl Drop for PanicGuard {
    fn drop(&mut self) {
        if thread::panicking() {
            self.shared.fail_worker(WorkerError::Panicked {
                name: self.name.clone(),
            });
        }
    }
}

/// Incremental directory walker
///
/// Results are available while the walk is still running. With pull
/// delivery the walk starts on the first `get_*` call; with push delivery
/// call [`start`](Walker::start) (or [`wait`](Walker::wait)).
///
/// ```no_run
/// use stream_walker::{Walker, WalkConfig};
///
/// let config = WalkConfig::new("/var/log")?.with_file_mask("*.log")?;
/// let walker = Walker::new(config)?;
/// while let Some(item) = walker.get_next()? {
///     println!("{}", item);
/// }
/// # Ok::<(), stream_walker::WalkerError>(())
/// ```
pub struct Walker {
    shared: Arc<Shared>,
    lifecycle: Mutex<Lifecycle>,
}

impl Walker {
    /// Create a walker over the real filesystem
    pub fn new(config: WalkConfig) -> Result<Self> {
        Self::with_enumerator(config, Arc::new(OsEnumerator))
    }

    /// Create a walker that lists directories through `enumerator`
    pub fn with_enumerator(config: WalkConfig, enumerator: Arc<dyn Enumerator>) -> Result<Self> {
        config.validate()?;

        let traversal = config.traversal;
        let shared = Arc::new(Shared::new(config, enumerator));

        Ok(Self {
            shared,
            lifecycle: Mutex::new(Lifecycle {
                traversal,
                handles: Vec::new(),
            }),
        })
    }

    pub fn root(&self) -> &Path {
        &self.shared.config.root
    }

    pub fn traversal(&self) -> Traversal {
        self.lifecycle.lock().traversal
    }

    /// Change the traversal; only allowed before the walk starts
    pub fn set_traversal(&self, traversal: Traversal) -> Result<()> {
        let mut lifecycle = self.lifecycle.lock();
        if self.shared.state.is_started() || self.shared.is_stopped() {
            return Err(WalkerError::TraversalLocked);
        }
        validate_traversal(traversal)?;
        lifecycle.traversal = traversal;
        Ok(())
    }

    /// Start the walk in the background
    pub fn start(&self) -> Result<()> {
        let mut lifecycle = self.lifecycle.lock();
        match self.shared.status() {
            WalkStatus::Idle => self.spawn_locked(&mut lifecycle),
            WalkStatus::Running | WalkStatus::Draining => Err(WalkerError::AlreadyRunning),
            WalkStatus::Completed | WalkStatus::Stopped => Err(WalkerError::Finished),
        }
    }

    /// Start if idle; no-op once started or stopped
    fn ensure_started(&self) -> Result<()> {
        if self.shared.state.is_started() || self.shared.is_stopped() {
            return Ok(());
        }

        let mut lifecycle = self.lifecycle.lock();
        // Re-check under the lock; another caller may have won the race
        if self.shared.state.is_started() || self.shared.is_stopped() {
            return Ok(());
        }
        self.spawn_locked(&mut lifecycle)
    }

    fn spawn_locked(&self, lifecycle: &mut Lifecycle) -> Result<()> {
        if !self.shared.mark_started() {
            return Err(WalkerError::AlreadyRunning);
        }

        let traversal = lifecycle.traversal;
        let config = &self.shared.config;
        info!(
            root = %config.root.display(),
            traversal = %traversal,
            file_mask = %config.file_mask,
            dir_mask = %config.directory_mask,
            max_queued = config.max_queued,
            push = config.delivery.is_push(),
            "Walk starting"
        );

        let spawned = match traversal {
            Traversal::TaskWindow { width } => {
                self.spawn_worker(lifecycle, "walk-driver", move |shared| {
                    run_task_window(&shared, width)
                })
            }
            Traversal::BreadthFirst | Traversal::DepthFirst { .. } => {
                match self.spawn_worker(lifecycle, "walk-producer", move |shared| {
                    run_producer(&shared, traversal)
                }) {
                    Ok(()) => self.spawn_worker(lifecycle, "walk-consumer", |shared| {
                        run_consumer(&shared)
                    }),
                    Err(e) => Err(e),
                }
            }
        };

        if let Err(e) = spawned {
            self.shared.stop("worker spawn failed");
            return Err(e);
        }
        Ok(())
    }

    fn spawn_worker<F>(&self, lifecycle: &mut Lifecycle, name: &str, body: F) -> Result<()>
    where
        F: FnOnce(Arc<Shared>) + Send + 'static,
    {
        let shared = Arc::clone(&self.shared);
        let guard_name = name.to_string();
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                enter_walker_thread();
                let _guard = PanicGuard {
                    shared: Arc::clone(&shared),
                    name: guard_name,
                };
                body(shared)
            })
            .map_err(|e| WorkerError::SpawnFailed {
                name: name.to_string(),
                reason: e.to_string(),
            })?;

        debug!(thread = name, "Worker thread spawned");
        lifecycle.handles.push((name.to_string(), handle));
        Ok(())
    }

    fn results(&self) -> Result<&BoundedQueue<WalkItem>> {
        let queue = self.shared.sink.queue().ok_or(WalkerError::PushDelivery)?;
        self.check_fatal()?;
        self.ensure_started()?;
        Ok(queue)
    }

    fn check_fatal(&self) -> Result<()> {
        match self.shared.fatal() {
            Some(fatal) => Err(fatal.into()),
            None => Ok(()),
        }
    }

    fn record_delivered(&self, items: &[WalkItem]) -> Result<()> {
        let files = items.iter().filter(|item| item.is_file()).count() as u64;
        if let Err(violation) = self.shared.state.record_files_delivered(files) {
            self.shared.fail(violation.clone());
            return Err(violation.into());
        }
        Ok(())
    }

    /// An item that was dequeued is handed out even if the walk failed
    /// meanwhile; the failure surfaces on the next call
    fn accept(&self, item: Option<WalkItem>) -> Result<Option<WalkItem>> {
        match item {
            Some(item) => {
                self.record_delivered(std::slice::from_ref(&item))?;
                Ok(Some(item))
            }
            None => {
                self.check_fatal()?;
                Ok(None)
            }
        }
    }

    /// Next result, blocking until one arrives
    ///
    /// Returns `Ok(None)` once the walk has completed and everything was
    /// read, or after a stop.
    pub fn get_next(&self) -> Result<Option<WalkItem>> {
        let item = self.results()?.dequeue();
        self.accept(item)
    }

    /// Like [`get_next`](Walker::get_next), calling `on_wait` with a progress
    /// snapshot every poll interval while nothing is available
    pub fn get_next_with<F>(&self, mut on_wait: F) -> Result<Option<WalkItem>>
    where
        F: FnMut(&WalkProgress),
    {
        let queue = self.results()?;
        let interval = self.shared.config.poll_interval;

        loop {
            match queue.dequeue_timeout(interval) {
                Dequeue::Item(item) => return self.accept(Some(item)),
                Dequeue::Exhausted => return self.accept(None),
                Dequeue::Pending => on_wait(&self.shared.snapshot()),
            }
        }
    }

    /// Up to `max` queued results, without blocking
    pub fn get_batch(&self, max: usize) -> Result<Vec<WalkItem>> {
        let items = self.results()?.dequeue_up_to(max);
        self.record_delivered(&items)?;
        Ok(items)
    }

    /// Every queued result, without blocking
    pub fn get_all(&self) -> Result<Vec<WalkItem>> {
        let items = self.results()?.dequeue_all();
        self.record_delivered(&items)?;
        Ok(items)
    }

    /// Blocking iterator over the remaining results
    pub fn iter(&self) -> Items<'_> {
        Items {
            walker: self,
            done: false,
        }
    }

    /// Request a stop; queued results are discarded and waiters wake up
    pub fn stop(&self) {
        self.shared.stop("stop requested");
    }

    /// Stop and join the worker threads
    pub fn close(&self) {
        self.stop();
        if let Err(e) = self.join_workers() {
            warn!(error = %e, "Worker failed to join cleanly");
        }
    }

    /// Run the walk to the end and return its totals
    ///
    /// Starts the walk if needed. With pull delivery another thread must be
    /// reading results, or a bounded queue will hold the walk back.
    pub fn wait(&self) -> Result<WalkSummary> {
        self.ensure_started()?;
        self.join_workers()?;
        self.check_fatal()?;

        let summary = self.shared.summary();
        info!(
            directories = summary.directories,
            files = summary.files,
            errors = summary.errors,
            duration_secs = summary.duration.as_secs_f64(),
            completed = summary.completed,
            "Walk finished"
        );
        Ok(summary)
    }

    fn join_workers(&self) -> Result<()> {
        if on_walker_thread() {
            return Ok(());
        }

        let handles = std::mem::take(&mut self.lifecycle.lock().handles);
        let mut result = Ok(());
        for (name, handle) in handles {
            if handle.join().is_err() {
                warn!(thread = %name, "Worker thread panicked");
                if result.is_ok() {
                    result = Err(WorkerError::Panicked { name }.into());
                }
            } else {
                debug!(thread = %name, "Worker thread joined");
            }
        }
        result
    }

    /// Drain the enumeration errors reported so far (pull delivery)
    pub fn take_errors(&self) -> Vec<EnumerationError> {
        self.shared.sink.take_errors()
    }

    pub fn status(&self) -> WalkStatus {
        self.shared.status()
    }

    /// True once everything was discovered, scanned and read
    pub fn is_completed(&self) -> bool {
        self.shared.is_completed()
    }

    /// Weighted progress estimate in [0, 1]
    pub fn progress(&self) -> f64 {
        self.shared.progress()
    }

    pub fn snapshot(&self) -> WalkProgress {
        self.shared.snapshot()
    }

    pub fn files_seen(&self) -> u64 {
        self.shared.state.files_seen()
    }

    pub fn directories_seen(&self) -> u64 {
        self.shared.state.directories_seen()
    }

    /// Largest result queue length observed
    pub fn high_water_mark(&self) -> usize {
        self.shared.sink.high_water_mark()
    }

    /// Results waiting to be read
    pub fn queued(&self) -> usize {
        self.shared.sink.len()
    }

    /// Get a handle that can stop the walk from another thread
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl Drop for Walker {
    fn drop(&mut self) {
        self.close();
    }
}

impl<'a> IntoIterator for &'a Walker {
    type Item = Result<WalkItem>;
    type IntoIter = Items<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator returned by [`Walker::iter`]
///
/// Ends when the walk completes or is stopped, or after yielding an error.
pub struct Items<'a> {
    walker: &'a Walker,
    done: bool,
}

impl Iterator for Items<'_> {
    type Item = Result<WalkItem>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.walker.get_next() {
            Ok(Some(item)) => Some(Ok(item)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Cloneable handle that stops a walk (e.g. from a Ctrl-C handler)
#[derive(Clone)]
pub struct StopHandle {
    shared: Arc<Shared>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.shared.stop("stop handle");
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.is_stopped()
    }
}
