pub mod decoder;
pub mod frame;
pub mod source;
pub mod v4l2;

pub use frame::Batch;
pub use frame::Frame;
pub use frame::PixelFormat;
pub use source::CaptureError;
pub use source::VideoSource;
pub use v4l2::V4l2Source;
