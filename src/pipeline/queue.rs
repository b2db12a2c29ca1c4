//! Bounded drop-oldest queue between the assembler and the consumer

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::Duration;

use crossbeam::utils::CachePadded;

use crate::capture::frame::Batch;

/// Bounded FIFO of pending batches.
///
/// A push at capacity evicts the oldest batch before appending, so the
/// producer never blocks and the consumer always works on the freshest
/// frames. Every operation is a single critical section.
pub struct BatchQueue {
    inner: Mutex<VecDeque<Batch>>,
    available: Condvar,
    capacity: usize,

    /// Statistics
    stats: CachePadded<Stats>,
}

#[derive(Default)]
struct Stats {
    batches_written: AtomicUsize,
    batches_read: AtomicUsize,
    batches_dropped: AtomicUsize,
}

impl BatchQueue {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "queue capacity must be non-zero");
        Self {
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            available: Condvar::new(),
            capacity,
            stats: CachePadded::new(Stats::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Batch>> {
        // A panic while holding the lock leaves the queue itself intact
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Producer: publish a batch, evicting the oldest one if full.
    /// Never blocks beyond the critical section, never fails.
    pub fn push(&self, batch: Batch) {
        let mut queue = self.lock();
        if queue.len() == self.capacity {
            queue.pop_front();
            self.stats.batches_dropped.fetch_add(1, Ordering::Relaxed);
        }
        queue.push_back(batch);
        self.stats.batches_written.fetch_add(1, Ordering::Relaxed);
        drop(queue);

        self.available.notify_one();
    }

    /// Consumer: take the oldest batch if one is ready, without blocking.
    pub fn try_pop(&self) -> Option<Batch> {
        let batch = self.lock().pop_front();
        if batch.is_some() {
            self.stats.batches_read.fetch_add(1, Ordering::Relaxed);
        }
        batch
    }

    /// Consumer: take the oldest batch, waiting up to `timeout` for one to
    /// arrive. A spurious wakeup falls out as `None`; callers loop anyway.
    pub fn pop_timeout(&self, timeout: Duration) -> Option<Batch> {
        let mut queue = self.lock();
        if queue.is_empty() {
            let (guard, _) = self
                .available
                .wait_timeout(queue, timeout)
                .unwrap_or_else(|e| e.into_inner());
            queue = guard;
        }
        let batch = queue.pop_front();
        if batch.is_some() {
            self.stats.batches_read.fetch_add(1, Ordering::Relaxed);
        }
        batch
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// (written, read, dropped) totals since startup.
    pub fn stats(&self) -> (usize, usize, usize) {
        (
            self.stats.batches_written.load(Ordering::Relaxed),
            self.stats.batches_read.load(Ordering::Relaxed),
            self.stats.batches_dropped.load(Ordering::Relaxed),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::frame::{Frame, FrameMetadata, PixelFormat};
    use bytes::Bytes;
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    fn frame(sequence: u64) -> Frame {
        Frame {
            data: Bytes::new(),
            meta: Arc::new(FrameMetadata {
                sequence,
                width: 8,
                height: 8,
                stride: 8,
                format: PixelFormat::Rgb24,
            }),
            timestamp: Instant::now(),
        }
    }

    fn batch(sequence: u64) -> Batch {
        Batch::new(vec![frame(sequence)])
    }

    fn first_sequence(batch: &Batch) -> u64 {
        batch.frames()[0].meta.sequence
    }

    #[test]
    fn length_never_exceeds_capacity() {
        let queue = BatchQueue::new(3);
        assert_eq!(queue.capacity(), 3);
        for i in 0..10 {
            queue.push(batch(i));
            assert!(queue.len() <= queue.capacity());
        }
        assert_eq!(queue.len(), 3);
    }

    #[test]
    fn fifo_within_capacity() {
        let queue = BatchQueue::new(4);
        for i in 0..3 {
            queue.push(batch(i));
        }
        for i in 0..3 {
            let popped = queue.try_pop().unwrap();
            assert_eq!(first_sequence(&popped), i);
        }
        assert!(queue.try_pop().is_none());
    }

    #[test]
    fn overflow_keeps_most_recent_in_order() {
        let queue = BatchQueue::new(2);
        for i in 0..5 {
            queue.push(batch(i));
        }
        assert_eq!(first_sequence(&queue.try_pop().unwrap()), 3);
        assert_eq!(first_sequence(&queue.try_pop().unwrap()), 4);
        assert!(queue.try_pop().is_none());
        assert_eq!(queue.stats(), (5, 2, 3));
    }

    #[test]
    fn try_pop_on_empty_returns_immediately() {
        let queue = BatchQueue::new(2);
        let started = Instant::now();
        assert!(queue.try_pop().is_none());
        assert!(started.elapsed() < Duration::from_millis(100));
    }

    #[test]
    fn pop_timeout_wakes_on_push() {
        let queue = Arc::new(BatchQueue::new(2));
        let producer = Arc::clone(&queue);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            producer.push(batch(7));
        });

        let started = Instant::now();
        let popped = queue.pop_timeout(Duration::from_secs(5));
        assert_eq!(first_sequence(&popped.unwrap()), 7);
        assert!(started.elapsed() < Duration::from_secs(1));
        handle.join().unwrap();
    }

    #[test]
    fn pop_timeout_gives_up_on_idle_queue() {
        let queue = BatchQueue::new(2);
        assert!(queue.pop_timeout(Duration::from_millis(10)).is_none());
    }
}
