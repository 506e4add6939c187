//! Prediction handler
//!
//! One linear pass per request: authorize, encode the two categories, derive
//! features, assemble the vector, score, tier, round. Nothing is retained
//! between calls.

use subtle::ConstantTimeEq;

use crate::error::PredictError;
use crate::features::{CategoryCodes, FeatureVector};
use crate::model::scorer::ScoreError;
use crate::model::threshold::{risk_level, round_probability};
use crate::model::ModelArtifacts;
use crate::models::{PredictionResult, ShipmentRecord};

/// Immutable per-process context: artifacts plus the expected API key
pub struct Predictor {
    artifacts: ModelArtifacts,
    api_key: Option<String>,
}

impl std::fmt::Debug for Predictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Predictor")
            .field("artifacts", &self.artifacts)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Predictor {
    /// `api_key = None` rejects every request
    pub fn new(artifacts: ModelArtifacts, api_key: Option<String>) -> Self {
        Self { artifacts, api_key }
    }

    pub fn artifacts(&self) -> &ModelArtifacts {
        &self.artifacts
    }

    /// Exact, constant-time comparison of the presented key with the secret
    pub fn authorize(&self, presented: Option<&str>) -> Result<(), PredictError> {
        match (self.api_key.as_deref(), presented) {
            (Some(expected), Some(given)) if bool::from(expected.as_bytes().ct_eq(given.as_bytes())) => Ok(()),
            _ => Err(PredictError::Unauthorized),
        }
    }

    /// Score one record
    pub fn predict(&self, record: &ShipmentRecord, presented_key: Option<&str>) -> Result<PredictionResult, PredictError> {
        self.authorize(presented_key)?;
        self.score_record(record)
    }

    /// Authorize, then decode a raw JSON body and score it. A body that cannot
    /// be decoded is a processing error, reported only to authorized callers.
    pub fn predict_json(&self, body: &[u8], presented_key: Option<&str>) -> Result<PredictionResult, PredictError> {
        self.authorize(presented_key)?;
        let record = ShipmentRecord::from_slice(body)?;
        self.score_record(&record)
    }

    /// Encode categories and assemble the classifier input
    pub fn feature_vector(&self, record: &ShipmentRecord) -> Result<FeatureVector, PredictError> {
        let codes = CategoryCodes {
            product_type: self.artifacts.product_encoder.encode(&record.product_type)?,
            packaging_type: self.artifacts.packaging_encoder.encode(&record.packaging_type)?,
        };
        Ok(FeatureVector::assemble(record, codes))
    }

    fn score_record(&self, record: &ShipmentRecord) -> Result<PredictionResult, PredictError> {
        let features = self.feature_vector(record)?;
        tracing::trace!(features = %features.to_log_entry(), "Feature vector assembled");

        // Every backend consumes single precision
        if let Some(name) = features.first_non_finite() {
            return Err(ScoreError::NonFiniteInput(name).into());
        }

        let probability = self.artifacts.scorer.score(&features)?;
        if !(0.0..=1.0).contains(&probability) {
            return Err(ScoreError::InvalidProbability(probability).into());
        }

        let level = risk_level(probability);
        tracing::debug!(probability, risk_level = %level, "Prediction complete");

        Ok(PredictionResult {
            spoilage_risk_probability: round_probability(probability),
            risk_level: level,
        })
    }
}
