//! ONNX Runtime classifier backend
//!
//! Expects a converted binary classifier taking one `[1, 8]` float input and
//! exposing a `[1, 2]` probability tensor (the output whose name contains
//! "prob", otherwise the last output).

use ndarray::Array2;
use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::Value;
use parking_lot::Mutex;

use super::scorer::{Scorer, ScoreError, POSITIVE_CLASS};
use crate::features::{FeatureVector, FEATURE_COUNT};

#[derive(Debug, thiserror::Error)]
#[error("failed to load ONNX model: {0}")]
pub struct OnnxLoadError(pub String);

pub struct OnnxScorer {
    // `Session::run` takes `&mut self`
    session: Mutex<Session>,
    probability_output: String,
}

impl OnnxScorer {
    pub fn from_bytes(model_bytes: &[u8]) -> Result<Self, OnnxLoadError> {
        let session = Session::builder()
            .map_err(|e| OnnxLoadError(format!("session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| OnnxLoadError(format!("optimization level: {}", e)))?
            .commit_from_memory(model_bytes)
            .map_err(|e| OnnxLoadError(e.to_string()))?;

        Self::from_session(session)
    }

    fn from_session(session: Session) -> Result<Self, OnnxLoadError> {
        let probability_output = session
            .outputs
            .iter()
            .find(|o| o.name.to_ascii_lowercase().contains("prob"))
            .or_else(|| session.outputs.last())
            .map(|o| o.name.clone())
            .ok_or_else(|| OnnxLoadError("model defines no outputs".to_string()))?;

        tracing::info!("ONNX model ready, reading probabilities from '{}'", probability_output);

        Ok(Self {
            session: Mutex::new(session),
            probability_output,
        })
    }
}

impl Scorer for OnnxScorer {
    fn score(&self, features: &FeatureVector) -> Result<f64, ScoreError> {
        let input_array = Array2::<f32>::from_shape_vec((1, FEATURE_COUNT), features.to_f32().to_vec())
            .map_err(|e| ScoreError::Inference(format!("array error: {}", e)))?;

        let input_tensor = Value::from_array(input_array)
            .map_err(|e| ScoreError::Inference(format!("tensor error: {}", e)))?;

        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs![input_tensor])
            .map_err(|e| ScoreError::Inference(e.to_string()))?;

        let output = outputs
            .get(&self.probability_output)
            .ok_or_else(|| ScoreError::Inference(format!("missing output '{}'", self.probability_output)))?;

        let output_tensor = output
            .try_extract_tensor::<f32>()
            .map_err(|e| ScoreError::Inference(format!("extract error: {}", e)))?;

        let data = output_tensor.1;
        data.get(POSITIVE_CLASS)
            .map(|p| *p as f64)
            .ok_or_else(|| ScoreError::Inference(format!("expected 2 probabilities, got {}", data.len())))
    }

    fn kind(&self) -> &'static str {
        "onnx"
    }
}
