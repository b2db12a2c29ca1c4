use std::path::PathBuf;

use thiserror::Error;

use crate::capture::decoder::DecodeError;
use crate::capture::frame::Batch;

/// Per-image classification result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub class_id: usize,
    pub score: f32,
}

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("cannot find valid model file: {}", .0.display())]
    ModelNotFound(PathBuf),
    #[error("batch has {got} frames, engine expects {want}")]
    BatchSize { got: usize, want: usize },
    #[error("frame payload is {got} bytes, expected {want}")]
    PayloadSize { got: usize, want: usize },
    #[error("no staged input; pre_process must run before forward")]
    NoStagedInput,
    #[error("no inference output; forward must run before post_process")]
    NoOutput,
    #[error("unexpected output shape {0:?}")]
    OutputShape(Vec<usize>),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("inference runtime error: {0}")]
    Runtime(#[from] ort::Error),
}

/// Batch classification engine driven in three synchronous phases.
///
/// The batch size is fixed when the engine is constructed; every submitted
/// batch must have exactly that many frames.
pub trait ClassifyEngine: Send {
    /// Frames per inference call.
    fn batch_size(&self) -> usize;

    /// Stage a batch: decode and pack frames into the engine's input layout.
    fn pre_process(&mut self, batch: &Batch) -> Result<(), ClassifyError>;

    /// Run the forward pass over the staged input.
    fn forward(&mut self) -> Result<(), ClassifyError>;

    /// Extract per-image results from the last forward pass.
    fn post_process(&mut self) -> Result<Vec<Classification>, ClassifyError>;
}
