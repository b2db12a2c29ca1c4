pub mod assembler;
pub mod consumer;
pub mod context;
pub mod queue;
pub mod throughput;

pub use assembler::run_assembler;
pub use consumer::run_consumer;
pub use context::PipelineContext;
pub use queue::BatchQueue;
pub use throughput::Throughput;
