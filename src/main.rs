//! Argus: live video classification throughput demo

use std::env;
use std::path::Path;
use std::process;
use std::sync::Arc;
use std::thread;

use argus::capture::{V4l2Source, VideoSource};
use argus::classify::{ClassifyEngine, OnnxClassifier};
use argus::pipeline::{run_assembler, run_consumer, PipelineContext};
use argus::Config;
use color_eyre::{eyre::eyre, Result};
use tracing::info;

fn main() -> Result<()> {
    // Initialize error handling and logging
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter("argus=debug")
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        println!("USAGE:");
        println!("  {} <video device> <model file>", args[0]);
        process::exit(1);
    }
    let video_path = &args[1];
    let model_path = &args[2];
    if !Path::new(model_path).exists() {
        println!("Cannot find valid model file.");
        process::exit(1);
    }

    info!("Argus launching...");

    let config = Config::default();

    // The engine dictates the batch size; query it once before either
    // loop starts
    let mut engine = OnnxClassifier::new(model_path, config.classify.clone())?;
    let batch_size = engine.batch_size();

    let mut source = V4l2Source::open(video_path, &config.capture)?;
    source.start_stream()?;
    if source.width() == 0 || source.height() == 0 {
        return Err(eyre!("Video source reports zero dimensions"));
    }
    info!(
        "Capturing {}x{} frames, batch size {}",
        source.width(),
        source.height(),
        batch_size
    );

    let ctx = Arc::new(PipelineContext::new(
        batch_size,
        config.pipeline.queue_capacity,
    ));

    // Spawn the inference thread
    let consumer_ctx = Arc::clone(&ctx);
    let consumer = thread::Builder::new()
        .name("inference".into())
        .spawn(move || run_consumer(&mut engine, &consumer_ctx))?;

    // Batch assembly runs on the main thread until the stream ends
    run_assembler(&mut source, &ctx);

    // Wind the consumer down and surface any engine failure
    ctx.request_stop();
    match consumer.join() {
        Ok(result) => result?,
        Err(_) => return Err(eyre!("Inference thread panicked")),
    }

    let (written, read, dropped) = ctx.queue().stats();
    info!(
        "Queue totals: {} published, {} consumed, {} dropped",
        written, read, dropped
    );
    info!("Argus shutting down");
    Ok(())
}
