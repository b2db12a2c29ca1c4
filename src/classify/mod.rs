pub mod engine;
pub mod onnx;

pub use engine::Classification;
pub use engine::ClassifyEngine;
pub use engine::ClassifyError;
pub use onnx::OnnxClassifier;
