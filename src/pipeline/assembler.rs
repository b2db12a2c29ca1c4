//! Producer loop: frames in, fixed-size batches out

use tracing::{debug, info};

use crate::capture::frame::{Batch, Frame};
use crate::capture::source::VideoSource;
use crate::pipeline::context::PipelineContext;

/// Pull frames from `source` until the stream ends, publishing every
/// completed batch of `ctx.batch_size()` frames to the shared queue.
///
/// A frame whose geometry no longer matches the source's declared
/// dimensions marks the end of the stream; so does any pull error. Frames
/// left in a partial batch at that point are discarded unbatched.
pub fn run_assembler(source: &mut dyn VideoSource, ctx: &PipelineContext) {
    let target = ctx.batch_size();
    let width = source.width();
    let height = source.height();

    let mut pending: Vec<Frame> = Vec::with_capacity(target);
    let mut published = 0u64;

    while source.is_open() && !ctx.is_stopped() {
        let frame = match source.pull_frame() {
            Ok(frame) => frame,
            Err(e) => {
                debug!("Frame pull failed, ending capture: {}", e);
                break;
            }
        };

        if frame.meta.width != width || frame.meta.height != height {
            debug!(
                "Frame geometry changed ({}x{} -> {}x{}), stream ended",
                width, height, frame.meta.width, frame.meta.height
            );
            break;
        }

        pending.push(frame);
        if pending.len() < target {
            continue;
        }

        let batch = Batch::new(std::mem::replace(
            &mut pending,
            Vec::with_capacity(target),
        ));
        ctx.queue().push(batch);
        published += 1;
    }

    if !pending.is_empty() {
        debug!("Discarding {} unbatched frames at stream end", pending.len());
    }
    info!("Capture finished: {} batches published", published);
}
