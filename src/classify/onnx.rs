//! ONNX Runtime classification backend

use std::path::Path;
use std::sync::OnceLock;

use ndarray::{Array4, ArrayD};
use ort::inputs;
use ort::session::Session;
use ort::value::TensorRef;
use tracing::info;

use crate::capture::decoder::decode_frame;
use crate::capture::frame::Batch;
use crate::classify::engine::{Classification, ClassifyEngine, ClassifyError};
use crate::ClassifyConfig;

static ORT_INIT: OnceLock<()> = OnceLock::new();

fn ensure_ort_init() {
    ORT_INIT.get_or_init(|| {
        let _ = ort::init().commit();
    });
}

/// Image classifier backed by an ONNX Runtime session.
///
/// `forward` consumes the staged input and stores the raw logits, so the
/// three phases stay independent of the session output's lifetime.
#[derive(Debug)]
pub struct OnnxClassifier {
    session: Session,
    input_name: String,
    output_name: String,
    config: ClassifyConfig,
    staged: Option<ArrayD<f32>>,
    logits: Option<(Vec<f32>, usize)>,
}

impl OnnxClassifier {
    /// Load a model artifact and build a session on the configured device.
    pub fn new(model_path: impl AsRef<Path>, config: ClassifyConfig) -> Result<Self, ClassifyError> {
        let path = model_path.as_ref();
        if !path.exists() {
            return Err(ClassifyError::ModelNotFound(path.to_path_buf()));
        }

        ensure_ort_init();

        let builder = Session::builder()?;
        #[cfg(feature = "cuda")]
        let builder = builder.with_execution_providers([
            ort::execution_providers::CUDAExecutionProvider::default()
                .with_device_id(config.device_id)
                .build(),
            ort::execution_providers::CPUExecutionProvider::default().build(),
        ])?;
        #[cfg(not(feature = "cuda"))]
        let builder = builder.with_execution_providers([
            ort::execution_providers::CPUExecutionProvider::default().build(),
        ])?;

        let session = builder.commit_from_file(path)?;

        let input_name = session.inputs[0].name.to_string();
        let output_name = session.outputs[0].name.to_string();
        info!(
            "Model loaded: input '{}', output '{}', batch size {}",
            input_name, output_name, config.batch_size
        );

        Ok(Self {
            session,
            input_name,
            output_name,
            config,
            staged: None,
            logits: None,
        })
    }
}

impl ClassifyEngine for OnnxClassifier {
    fn batch_size(&self) -> usize {
        self.config.batch_size
    }

    fn pre_process(&mut self, batch: &Batch) -> Result<(), ClassifyError> {
        if batch.len() != self.config.batch_size {
            return Err(ClassifyError::BatchSize {
                got: batch.len(),
                want: self.config.batch_size,
            });
        }

        let in_w = self.config.input_width as usize;
        let in_h = self.config.input_height as usize;
        let mut input = Array4::<f32>::zeros((batch.len(), 3, in_h, in_w));

        for (i, frame) in batch.frames().iter().enumerate() {
            let rgb = decode_frame(&frame.data, frame.meta.format)?;
            let fw = frame.meta.width as usize;
            let fh = frame.meta.height as usize;
            if rgb.len() < fw * fh * 3 {
                return Err(ClassifyError::PayloadSize {
                    got: rgb.len(),
                    want: fw * fh * 3,
                });
            }
            // Nearest-neighbour sample into the model's input plane
            for y in 0..in_h {
                let sy = y * fh / in_h;
                for x in 0..in_w {
                    let sx = x * fw / in_w;
                    let px = (sy * fw + sx) * 3;
                    for c in 0..3 {
                        input[[i, c, y, x]] = f32::from(rgb[px + c]) / 255.0;
                    }
                }
            }
        }

        self.staged = Some(input.into_dyn());
        self.logits = None;
        Ok(())
    }

    fn forward(&mut self) -> Result<(), ClassifyError> {
        let staged = self.staged.take().ok_or(ClassifyError::NoStagedInput)?;

        let input = TensorRef::from_array_view(staged.view())?;
        let outputs = self.session.run(inputs![self.input_name.as_str() => input])?;

        let logits = outputs[self.output_name.as_str()].try_extract_array::<f32>()?;
        let shape = logits.shape();
        if shape.len() != 2 || shape[0] != self.config.batch_size || shape[1] == 0 {
            return Err(ClassifyError::OutputShape(shape.to_vec()));
        }

        let classes = shape[1];
        self.logits = Some((logits.iter().copied().collect(), classes));
        Ok(())
    }

    fn post_process(&mut self) -> Result<Vec<Classification>, ClassifyError> {
        let (logits, classes) = self.logits.take().ok_or(ClassifyError::NoOutput)?;

        let mut results = Vec::with_capacity(logits.len() / classes);
        for row in logits.chunks_exact(classes) {
            let (class_id, best) = row
                .iter()
                .copied()
                .enumerate()
                .max_by(|(_, a), (_, b)| a.total_cmp(b))
                .ok_or_else(|| ClassifyError::OutputShape(vec![0]))?;
            // Softmax score, shifted by the max logit for stability
            let denom: f32 = row.iter().map(|v| (v - best).exp()).sum();
            results.push(Classification {
                class_id,
                score: 1.0 / denom,
            });
        }
        Ok(results)
    }
}
