//! Running throughput accounting for the consumer

use std::time::Instant;

/// Cumulative processed-frame count with a fixed reference start time.
///
/// Owned by the consumer alone; never reset.
pub struct Throughput {
    processed: u64,
    start: Instant,
}

impl Throughput {
    /// Begin counting; the reference instant is fixed here.
    pub fn start() -> Self {
        Self {
            processed: 0,
            start: Instant::now(),
        }
    }

    /// Record `frames` more processed frames and return the running
    /// images-per-second average since start.
    pub fn record(&mut self, frames: u64) -> f64 {
        self.processed += frames;
        let elapsed = self.start.elapsed().as_secs_f64();
        self.processed as f64 / elapsed.max(f64::EPSILON)
    }

    pub fn total(&self) -> u64 {
        self.processed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_increases_by_exactly_the_recorded_amount() {
        let mut throughput = Throughput::start();
        assert_eq!(throughput.total(), 0);

        throughput.record(4);
        assert_eq!(throughput.total(), 4);
        throughput.record(4);
        assert_eq!(throughput.total(), 8);
        throughput.record(2);
        assert_eq!(throughput.total(), 10);
    }

    #[test]
    fn rate_is_finite_and_positive() {
        let mut throughput = Throughput::start();
        let rate = throughput.record(4);
        assert!(rate.is_finite());
        assert!(rate > 0.0);
    }
}
