pub mod capture;
pub mod classify;
pub mod pipeline;

use capture::frame::PixelFormat;
use serde::{Deserialize, Serialize};

/// System configuration, built once in `main` and passed down to the
/// collaborators that need it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub capture: CaptureConfig,
    pub classify: ClassifyConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub format: PixelFormat,
    pub buffer_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyConfig {
    pub device_id: i32,
    /// Frames per inference call, fixed for the life of the engine.
    pub batch_size: usize,
    pub input_width: u32,
    pub input_height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Pending batches held between producer and consumer; the oldest is
    /// dropped when the consumer falls this far behind.
    pub queue_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capture: CaptureConfig {
                width: 800,
                height: 600,
                fps: 30,
                format: PixelFormat::Mjpeg,
                buffer_count: 4,
            },
            classify: ClassifyConfig {
                device_id: 0,
                batch_size: 4,
                input_width: 224,
                input_height: 224,
            },
            pipeline: PipelineConfig { queue_capacity: 10 },
        }
    }
}
