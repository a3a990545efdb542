//! Result delivery: pull (bounded queue) or push (event callbacks)

use crate::error::EnumerationError;
use crate::fs::{DirectoryItem, FileItem, WalkItem};
use crate::walker::queue::BoundedQueue;
use crate::walker::state::WalkSummary;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Callbacks for push delivery
///
/// Callbacks run on the walker's own threads and block the walk while they
/// run, which is how push delivery applies backpressure. They may call
/// [`StopHandle::stop`](crate::walker::StopHandle::stop).
pub trait WalkEventHandler: Send + Sync {
    fn on_file(&self, _item: &FileItem) {}

    fn on_directory(&self, _item: &DirectoryItem) {}

    fn on_error(&self, _error: &EnumerationError) {}

    /// Called once, after the last item (also after a stop)
    fn on_completed(&self, _summary: &WalkSummary) {}
}

/// How results reach the caller
#[derive(Clone, Default)]
pub enum Delivery {
    /// Caller pulls from the bounded result queue
    #[default]
    Pull,
    /// Walker invokes the handler as results arrive
    Push(Arc<dyn WalkEventHandler>),
}

impl Delivery {
    pub fn is_push(&self) -> bool {
        matches!(self, Delivery::Push(_))
    }
}

impl fmt::Debug for Delivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delivery::Pull => f.write_str("Pull"),
            Delivery::Push(_) => f.write_str("Push(..)"),
        }
    }
}

pub(crate) enum Sink {
    Queue {
        results: BoundedQueue<WalkItem>,
        errors_tx: Sender<EnumerationError>,
        errors_rx: Receiver<EnumerationError>,
    },
    Events {
        handler: Arc<dyn WalkEventHandler>,
        closed: AtomicBool,
        completed: AtomicBool,
    },
}

impl Sink {
    pub fn new(delivery: &Delivery, capacity: usize) -> Self {
        match delivery {
            Delivery::Pull => {
                let (errors_tx, errors_rx) = unbounded();
                Sink::Queue {
                    results: BoundedQueue::new(capacity),
                    errors_tx,
                    errors_rx,
                }
            }
            Delivery::Push(handler) => Sink::Events {
                handler: Arc::clone(handler),
                closed: AtomicBool::new(false),
                completed: AtomicBool::new(false),
            },
        }
    }

    pub fn is_push(&self) -> bool {
        matches!(self, Sink::Events { .. })
    }

    pub fn queue(&self) -> Option<&BoundedQueue<WalkItem>> {
        match self {
            Sink::Queue { results, .. } => Some(results),
            Sink::Events { .. } => None,
        }
    }

    /// Hand an item over; false means the sink no longer accepts items
    pub fn deliver(&self, item: WalkItem) -> bool {
        match self {
            Sink::Queue { results, .. } => results.enqueue(item),
            Sink::Events {
                handler, closed, ..
            } => {
                if closed.load(Ordering::SeqCst) {
                    return false;
                }
                match &item {
                    WalkItem::File(file) => handler.on_file(file),
                    WalkItem::Directory(dir) => handler.on_directory(dir),
                }
                true
            }
        }
    }

    pub fn report_error(&self, error: EnumerationError) {
        match self {
            // Receiver lives as long as the sender, so this cannot fail
            Sink::Queue { errors_tx, .. } => {
                let _ = errors_tx.send(error);
            }
            Sink::Events { handler, .. } => handler.on_error(&error),
        }
    }

    /// Drain errors reported so far (pull delivery only)
    pub fn take_errors(&self) -> Vec<EnumerationError> {
        match self {
            Sink::Queue { errors_rx, .. } => errors_rx.try_iter().collect(),
            Sink::Events { .. } => Vec::new(),
        }
    }

    /// No more items will be delivered
    pub fn finish(&self, summary: &WalkSummary) {
        match self {
            Sink::Queue { results, .. } => results.finish(),
            Sink::Events {
                handler, completed, ..
            } => {
                if !completed.swap(true, Ordering::SeqCst) {
                    handler.on_completed(summary);
                }
            }
        }
    }

    /// Stop accepting items and discard anything queued
    pub fn close(&self) -> usize {
        match self {
            Sink::Queue { results, .. } => results.close(),
            Sink::Events { closed, .. } => {
                closed.store(true, Ordering::SeqCst);
                0
            }
        }
    }

    /// True when no delivered item is waiting to be read
    pub fn is_drained(&self) -> bool {
        match self {
            Sink::Queue { results, .. } => results.is_empty(),
            Sink::Events { .. } => true,
        }
    }

    pub fn len(&self) -> usize {
        self.queue().map_or(0, |q| q.len())
    }

    pub fn high_water_mark(&self) -> usize {
        self.queue().map_or(0, |q| q.stats().high_water_mark())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::path::PathBuf;
    use std::time::Duration;

    #[derive(Default)]
    struct Recorder {
        files: Mutex<Vec<String>>,
        completions: Mutex<usize>,
    }

    impl WalkEventHandler for Recorder {
        fn on_file(&self, item: &FileItem) {
            self.files.lock().push(item.to_string());
        }

        fn on_completed(&self, _summary: &WalkSummary) {
            *self.completions.lock() += 1;
        }
    }

    fn summary() -> WalkSummary {
        WalkSummary {
            directories: 0,
            files: 0,
            errors: 0,
            duration: Duration::ZERO,
            completed: true,
        }
    }

    #[test]
    fn test_event_sink_dispatch_and_close() {
        let recorder = Arc::new(Recorder::default());
        let sink = Sink::new(&Delivery::Push(recorder.clone()), 0);
        let base = Arc::new(PathBuf::from("/r"));

        assert!(sink.deliver(WalkItem::File(FileItem::new(Arc::clone(&base), "a.txt"))));
        sink.finish(&summary());
        sink.finish(&summary());
        assert_eq!(*recorder.completions.lock(), 1);

        sink.close();
        assert!(!sink.deliver(WalkItem::File(FileItem::new(base, "b.txt"))));
        assert_eq!(recorder.files.lock().as_slice(), ["/r/a.txt"]);
    }

    #[test]
    fn test_queue_sink_errors() {
        let sink = Sink::new(&Delivery::Pull, 4);
        let err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "no");
        sink.report_error(EnumerationError::new(
            "/r/locked",
            crate::error::ListOperation::Files,
            &err,
        ));

        let errors = sink.take_errors();
        assert_eq!(errors.len(), 1);
        assert!(sink.take_errors().is_empty());
        assert_eq!(sink.queue().unwrap().capacity(), 4);
    }
}
