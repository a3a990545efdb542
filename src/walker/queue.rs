//! Bounded FIFO with backpressure
//!
//! One type serves both hops of the pipeline: the directory work queue
//! (producer → consumer) and the result queue (consumer → caller). Each
//! instance owns its own lock, so the producer and the caller never contend.
//!
//! A queue has two terminal flags:
//! - `finished`: no more input will arrive; readers drain what is left
//! - `closed`: the walk was stopped; queued items are discarded
//!
//! The capacity check and the insert happen under the same lock, so the
//! length never exceeds a non-zero capacity.

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// Result of a non-blocking or timed dequeue
#[derive(Debug, PartialEq, Eq)]
pub enum Dequeue<T> {
    /// An item was removed
    Item(T),
    /// Queue is empty but more items may still arrive
    Pending,
    /// Queue is empty and will stay empty
    Exhausted,
}

/// Statistics for a queue
#[derive(Debug, Default)]
pub struct QueueStats {
    /// Total items enqueued
    pub enqueued: AtomicU64,

    /// Total items dequeued
    pub dequeued: AtomicU64,

    /// Number of times an enqueue found the queue full
    pub backpressure_events: AtomicU64,

    /// Largest length ever observed
    pub high_water: AtomicUsize,
}

impl QueueStats {
    /// Get queue throughput (dequeued items)
    pub fn throughput(&self) -> u64 {
        self.dequeued.load(Ordering::Relaxed)
    }

    /// Get backpressure event count
    pub fn backpressure_count(&self) -> u64 {
        self.backpressure_events.load(Ordering::Relaxed)
    }

    pub fn high_water_mark(&self) -> usize {
        self.high_water.load(Ordering::Relaxed)
    }
}

#[derive(Debug)]
struct Inner<T> {
    items: VecDeque<T>,
    finished: bool,
    closed: bool,
}

impl<T> Inner<T> {
    fn is_terminal(&self) -> bool {
        self.finished || self.closed
    }
}

/// Thread-safe FIFO with an optional capacity ceiling
#[derive(Debug)]
pub struct BoundedQueue<T> {
    inner: Mutex<Inner<T>>,
    not_empty: Condvar,
    not_full: Condvar,

    /// Capacity; 0 means unbounded
    capacity: usize,

    stats: QueueStats,
}

impl<T> BoundedQueue<T> {
    /// Create a queue. A capacity of 0 disables backpressure.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                items: VecDeque::new(),
                finished: false,
                closed: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity,
            stats: QueueStats::default(),
        }
    }

    /// Create a queue without a capacity ceiling
    pub fn unbounded() -> Self {
        Self::new(0)
    }

    fn is_full(&self, inner: &Inner<T>) -> bool {
        self.capacity > 0 && inner.items.len() >= self.capacity
    }

    /// Append an item, blocking while the queue is full.
    ///
    /// Returns `false` (and drops the item) if the queue is finished or is
    /// closed before space frees up.
    pub fn enqueue(&self, item: T) -> bool {
        let mut inner = self.inner.lock();

        if self.is_full(&inner) && !inner.is_terminal() {
            self.stats.backpressure_events.fetch_add(1, Ordering::Relaxed);
            while self.is_full(&inner) && !inner.is_terminal() {
                self.not_full.wait(&mut inner);
            }
        }

        if inner.is_terminal() {
            return false;
        }

        inner.items.push_back(item);
        let len = inner.items.len();
        drop(inner);

        self.stats.enqueued.fetch_add(1, Ordering::Relaxed);
        self.stats.high_water.fetch_max(len, Ordering::Relaxed);
        self.not_empty.notify_one();
        true
    }

    /// Remove the oldest item, blocking until one arrives.
    ///
    /// Returns `None` once the queue is finished and empty, or closed.
    pub fn dequeue(&self) -> Option<T> {
        let mut inner = self.inner.lock();
        loop {
            if let Some(item) = self.pop_locked(&mut inner) {
                return Some(item);
            }
            if inner.is_terminal() {
                return None;
            }
            self.not_empty.wait(&mut inner);
        }
    }

    /// Remove the oldest item without blocking
    pub fn try_dequeue(&self) -> Dequeue<T> {
        let mut inner = self.inner.lock();
        match self.pop_locked(&mut inner) {
            Some(item) => Dequeue::Item(item),
            None if inner.is_terminal() => Dequeue::Exhausted,
            None => Dequeue::Pending,
        }
    }

    /// Remove the oldest item, waiting at most `timeout` for one to arrive
    pub fn dequeue_timeout(&self, timeout: Duration) -> Dequeue<T> {
        let mut inner = self.inner.lock();

        if inner.items.is_empty() && !inner.is_terminal() {
            // A spurious or timed-out wake falls through to the re-check below
            let _ = self.not_empty.wait_for(&mut inner, timeout);
        }

        match self.pop_locked(&mut inner) {
            Some(item) => Dequeue::Item(item),
            None if inner.is_terminal() => Dequeue::Exhausted,
            None => Dequeue::Pending,
        }
    }

    /// Drain everything currently queued, oldest first
    pub fn dequeue_all(&self) -> Vec<T> {
        self.dequeue_up_to(usize::MAX)
    }

    /// Drain at most `max` items, oldest first
    pub fn dequeue_up_to(&self, max: usize) -> Vec<T> {
        let mut inner = self.inner.lock();
        let take = max.min(inner.items.len());
        let drained: Vec<T> = inner.items.drain(..take).collect();
        drop(inner);

        if !drained.is_empty() {
            self.stats
                .dequeued
                .fetch_add(drained.len() as u64, Ordering::Relaxed);
            self.not_full.notify_all();
        }
        drained
    }

    fn pop_locked(&self, inner: &mut Inner<T>) -> Option<T> {
        let item = inner.items.pop_front()?;
        self.stats.dequeued.fetch_add(1, Ordering::Relaxed);
        self.not_full.notify_one();
        Some(item)
    }

    /// Mark the end of input. Queued items stay readable.
    pub fn finish(&self) {
        let mut inner = self.inner.lock();
        inner.finished = true;
        drop(inner);

        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    /// Stop accepting items, discard what is queued and wake every waiter.
    ///
    /// Returns the number of discarded items.
    pub fn close(&self) -> usize {
        let mut inner = self.inner.lock();
        inner.closed = true;
        let discarded = inner.items.len();
        inner.items.clear();
        drop(inner);

        self.not_empty.notify_all();
        self.not_full.notify_all();
        discarded
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().items.len()
    }

    /// Get queue capacity (0 = unbounded)
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_finished(&self) -> bool {
        self.inner.lock().finished
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    /// True when nothing is queued and nothing more can arrive
    pub fn is_drained(&self) -> bool {
        let inner = self.inner.lock();
        inner.items.is_empty() && inner.is_terminal()
    }

    /// Get queue statistics
    pub fn stats(&self) -> &QueueStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_queue_basic() {
        let queue = BoundedQueue::new(10);

        assert!(queue.enqueue("/a"));
        assert!(queue.enqueue("/b"));
        assert!(!queue.is_empty());
        assert_eq!(queue.len(), 2);

        assert_eq!(queue.dequeue(), Some("/a"));
        assert_eq!(queue.try_dequeue(), Dequeue::Item("/b"));
        assert_eq!(queue.try_dequeue(), Dequeue::Pending);
    }

    #[test]
    fn test_queue_unbounded() {
        let queue = BoundedQueue::unbounded();
        for i in 0..1000 {
            assert!(queue.enqueue(i));
        }
        assert_eq!(queue.len(), 1000);
        assert_eq!(queue.stats().backpressure_count(), 0);
    }

    #[test]
    fn test_queue_backpressure() {
        let queue = Arc::new(BoundedQueue::new(2));
        assert!(queue.enqueue(1));
        assert!(queue.enqueue(2));

        // Third enqueue must block until a slot frees up
        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.enqueue(3))
        };

        while queue.stats().backpressure_count() == 0 {
            thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(queue.len(), 2);

        assert_eq!(queue.dequeue(), Some(1));
        assert!(producer.join().unwrap());

        assert_eq!(queue.dequeue_all(), vec![2, 3]);
        assert_eq!(queue.stats().high_water_mark(), 2);
    }

    #[test]
    fn test_close_wakes_blocked_enqueue() {
        let queue = Arc::new(BoundedQueue::new(1));
        assert!(queue.enqueue(1));

        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.enqueue(2))
        };

        while queue.stats().backpressure_count() == 0 {
            thread::sleep(Duration::from_millis(1));
        }

        assert_eq!(queue.close(), 1);
        assert!(!producer.join().unwrap());
        assert!(queue.is_empty());
        assert_eq!(queue.dequeue(), None);
    }

    #[test]
    fn test_finish_drains_then_ends() {
        let queue = Arc::new(BoundedQueue::new(0));

        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                let mut seen = Vec::new();
                while let Some(item) = queue.dequeue() {
                    seen.push(item);
                }
                seen
            })
        };

        for i in 0..5 {
            assert!(queue.enqueue(i));
        }
        queue.finish();

        assert_eq!(consumer.join().unwrap(), vec![0, 1, 2, 3, 4]);
        assert!(!queue.enqueue(99));
        assert!(queue.is_drained());
        assert_eq!(queue.try_dequeue(), Dequeue::Exhausted);
    }

    #[test]
    fn test_dequeue_up_to_oldest_first() {
        let queue = BoundedQueue::new(0);
        for i in 0..5 {
            queue.enqueue(i);
        }

        assert_eq!(queue.dequeue_up_to(2), vec![0, 1]);
        assert_eq!(queue.dequeue_up_to(10), vec![2, 3, 4]);
        assert!(queue.dequeue_up_to(10).is_empty());
        assert_eq!(queue.stats().throughput(), 5);
    }

    #[test]
    fn test_dequeue_timeout_pending() {
        let queue: BoundedQueue<u32> = BoundedQueue::new(1);
        assert_eq!(
            queue.dequeue_timeout(Duration::from_millis(5)),
            Dequeue::Pending
        );
        queue.finish();
        assert_eq!(
            queue.dequeue_timeout(Duration::from_millis(5)),
            Dequeue::Exhausted
        );
    }
}
