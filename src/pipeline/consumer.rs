//! Consumer loop: drain batches, drive the classifier, account throughput

use std::time::Duration;

use metrics::counter;
use tracing::{debug, info};

use crate::capture::frame::Batch;
use crate::classify::engine::{Classification, ClassifyEngine, ClassifyError};
use crate::pipeline::context::PipelineContext;
use crate::pipeline::throughput::Throughput;

/// Longest a single queue wait may block before the stop flag is
/// re-checked.
const POP_WAIT: Duration = Duration::from_millis(50);

/// Drain the queue until stop is requested, classifying every batch and
/// reporting a running images-per-second figure after each one.
///
/// Any failure inside the engine's three phases is fatal to the whole
/// pipeline: the stop flag is raised so the producer winds down too, and
/// the error is returned to the spawner.
pub fn run_consumer(
    engine: &mut dyn ClassifyEngine,
    ctx: &PipelineContext,
) -> Result<(), ClassifyError> {
    let mut throughput = Throughput::start();

    while !ctx.is_stopped() {
        let Some(batch) = ctx.queue().pop_timeout(POP_WAIT) else {
            continue;
        };

        let frames = batch.len();
        let results = match classify(engine, &batch) {
            Ok(results) => results,
            Err(e) => {
                ctx.request_stop();
                return Err(e);
            }
        };
        if let Some(top) = results.first() {
            debug!("Top result: class {} score {:.3}", top.class_id, top.score);
        }

        counter!("frames_processed").increment(frames as u64);
        let rate = throughput.record(frames as u64);
        info!("Throughput is {:.2} image/s", rate);
    }

    debug!("Consumer stopped after {} frames", throughput.total());
    Ok(())
}

/// Run the engine's three synchronous phases over one batch.
fn classify(
    engine: &mut dyn ClassifyEngine,
    batch: &Batch,
) -> Result<Vec<Classification>, ClassifyError> {
    engine.pre_process(batch)?;
    engine.forward()?;
    engine.post_process()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::frame::{Frame, FrameMetadata, PixelFormat};
    use bytes::Bytes;
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    fn batch(len: usize) -> Batch {
        let frames = (0..len)
            .map(|i| Frame {
                data: Bytes::new(),
                meta: Arc::new(FrameMetadata {
                    sequence: i as u64,
                    width: 8,
                    height: 8,
                    stride: 8,
                    format: PixelFormat::Rgb24,
                }),
                timestamp: Instant::now(),
            })
            .collect();
        Batch::new(frames)
    }

    struct FakeEngine {
        batch_size: usize,
        pre_calls: usize,
        forward_calls: usize,
        post_calls: usize,
        fail_forward: bool,
    }

    impl FakeEngine {
        fn new(batch_size: usize) -> Self {
            Self {
                batch_size,
                pre_calls: 0,
                forward_calls: 0,
                post_calls: 0,
                fail_forward: false,
            }
        }
    }

    impl ClassifyEngine for FakeEngine {
        fn batch_size(&self) -> usize {
            self.batch_size
        }

        fn pre_process(&mut self, batch: &Batch) -> Result<(), ClassifyError> {
            if batch.len() != self.batch_size {
                return Err(ClassifyError::BatchSize {
                    got: batch.len(),
                    want: self.batch_size,
                });
            }
            self.pre_calls += 1;
            Ok(())
        }

        fn forward(&mut self) -> Result<(), ClassifyError> {
            if self.fail_forward {
                return Err(ClassifyError::NoStagedInput);
            }
            self.forward_calls += 1;
            Ok(())
        }

        fn post_process(&mut self) -> Result<Vec<Classification>, ClassifyError> {
            self.post_calls += 1;
            Ok(vec![
                Classification {
                    class_id: 1,
                    score: 0.9
                };
                self.batch_size
            ])
        }
    }

    #[test]
    fn processes_queued_batches_then_stops() {
        let ctx = Arc::new(PipelineContext::new(2, 10));
        for _ in 0..3 {
            ctx.queue().push(batch(2));
        }

        let mut engine = FakeEngine::new(2);
        let thread_ctx = Arc::clone(&ctx);
        let handle = thread::spawn(move || {
            let result = run_consumer(&mut engine, &thread_ctx);
            (result, engine)
        });

        // Wait for all three batches to be drained, then wind down
        let deadline = Instant::now() + Duration::from_secs(5);
        while ctx.queue().stats().1 < 3 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        ctx.request_stop();

        let (result, engine) = handle.join().unwrap();
        assert!(result.is_ok());
        assert_eq!(engine.pre_calls, 3);
        assert_eq!(engine.forward_calls, 3);
        assert_eq!(engine.post_calls, 3);
    }

    #[test]
    fn engine_failure_stops_the_pipeline() {
        let ctx = PipelineContext::new(2, 10);
        ctx.queue().push(batch(2));

        let mut engine = FakeEngine::new(2);
        engine.fail_forward = true;

        let result = run_consumer(&mut engine, &ctx);
        assert!(result.is_err());
        assert!(ctx.is_stopped());
    }

    #[test]
    fn returns_promptly_once_stopped() {
        let ctx = PipelineContext::new(2, 10);
        ctx.request_stop();

        let mut engine = FakeEngine::new(2);
        assert!(run_consumer(&mut engine, &ctx).is_ok());
        assert_eq!(engine.forward_calls, 0);
    }
}
