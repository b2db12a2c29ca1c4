use thiserror::Error;

use crate::capture::frame::{Frame, PixelFormat};

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("device doesn't support video capture")]
    NotACaptureDevice,
    #[error("unsupported pixel format {0:?}")]
    UnsupportedFormat(PixelFormat),
    #[error("stream not started")]
    StreamNotStarted,
    #[error("capture i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Pull source of fixed-size decoded frames.
///
/// The declared width/height are fixed at open time; a pulled frame whose
/// geometry differs marks the end of the stream.
pub trait VideoSource: Send {
    /// Whether the device is open and streaming.
    fn is_open(&self) -> bool;

    /// Declared frame width.
    fn width(&self) -> u32;

    /// Declared frame height.
    fn height(&self) -> u32;

    /// Pull the next frame, blocking until one is available.
    fn pull_frame(&mut self) -> Result<Frame, CaptureError>;
}
