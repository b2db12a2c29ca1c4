//! V4L2 capture source with memory-mapped buffers

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use tracing::info;
use v4l::buffer::Type;
use v4l::capability::Flags as CapFlags;
use v4l::io::traits::CaptureStream;
use v4l::prelude::MmapStream;
use v4l::video::Capture;
use v4l::{Device, FourCC};

use crate::capture::frame::{Frame, FrameMetadata, PixelFormat};
use crate::capture::source::{CaptureError, VideoSource};
use crate::CaptureConfig;

/// Live V4L2 capture, pulled one frame at a time
pub struct V4l2Source {
    device: Box<Device>,
    stream: Option<MmapStream<'static>>,
    width: u32,
    height: u32,
    format: PixelFormat,
    buffer_count: u32,
    sequence: u64,
}

impl V4l2Source {
    /// Open the device and negotiate the capture format.
    pub fn open(path: &str, config: &CaptureConfig) -> Result<Self, CaptureError> {
        info!("Opening V4L2 device: {}", path);

        let device = Device::with_path(path)?;

        // Query capabilities
        let caps = device.query_caps()?;
        info!("Device: {} ({})", caps.card, caps.driver);

        if !caps.capabilities.contains(CapFlags::VIDEO_CAPTURE) {
            return Err(CaptureError::NotACaptureDevice);
        }

        // Set format
        let mut fmt = device.format()?;
        fmt.width = config.width;
        fmt.height = config.height;
        fmt.fourcc = match config.format {
            PixelFormat::Mjpeg => FourCC::new(b"MJPG"),
            PixelFormat::Yuyv4 => FourCC::new(b"YUYV"),
            other => return Err(CaptureError::UnsupportedFormat(other)),
        };

        // The driver may adjust the requested geometry; what it reports
        // back is the declared size every pulled frame must match.
        let fmt = device.set_format(&fmt)?;

        Ok(Self {
            device: Box::new(device),
            stream: None,
            width: fmt.width,
            height: fmt.height,
            format: config.format,
            buffer_count: config.buffer_count,
            sequence: 0,
        })
    }

    /// Start streaming with memory-mapped buffers.
    pub fn start_stream(&mut self) -> Result<(), CaptureError> {
        let stream =
            MmapStream::with_buffers(&self.device, Type::VideoCapture, self.buffer_count)?;

        self.stream = Some(stream);
        info!("Capture stream started with {} buffers", self.buffer_count);
        Ok(())
    }
}

impl VideoSource for V4l2Source {
    fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn pull_frame(&mut self) -> Result<Frame, CaptureError> {
        let timestamp = Instant::now();

        let stream = self
            .stream
            .as_mut()
            .ok_or(CaptureError::StreamNotStarted)?;

        let (buf, _meta) = stream.next()?;

        // Copy out of the mmap'd buffer so it can be requeued immediately
        let data = Bytes::copy_from_slice(buf);

        self.sequence += 1;

        let meta = Arc::new(FrameMetadata {
            sequence: self.sequence,
            width: self.width,
            height: self.height,
            stride: self.width,
            format: self.format,
        });

        Ok(Frame {
            data,
            meta,
            timestamp,
        })
    }
}
