use std::sync::atomic::{AtomicBool, Ordering};

use crate::pipeline::queue::BatchQueue;

/// Shared state for the two pipeline loops, built once at startup.
///
/// The batch size is written before either loop starts and never changes;
/// the queue is the only mutable resource shared between them. The stop
/// flag is checked at every iteration of both loops.
pub struct PipelineContext {
    queue: BatchQueue,
    batch_size: usize,
    stop: AtomicBool,
}

impl PipelineContext {
    pub fn new(batch_size: usize, queue_capacity: usize) -> Self {
        Self {
            queue: BatchQueue::new(queue_capacity),
            batch_size,
            stop: AtomicBool::new(false),
        }
    }

    pub fn queue(&self) -> &BatchQueue {
        &self.queue
    }

    /// Target batch size, fixed for the process lifetime.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Ask both loops to wind down at their next iteration.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }
}
