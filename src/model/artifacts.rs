//! Start-up loading of the classifier and the two category encoders
//!
//! Everything here runs once before the server binds. Any failure is fatal:
//! the service cannot answer a single request without all three artifacts.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use thiserror::Error;

use super::encoder::{CategoryEncoder, EncoderLoadError, LabelEncoder};
use super::scorer::{ForestLoadError, ForestScorer, Scorer};
use crate::config::Config;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("checksum mismatch for {}: expected {expected}, found {actual}", .path.display())]
    Checksum {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("invalid encoder {}: {source}", .path.display())]
    Encoder {
        path: PathBuf,
        #[source]
        source: EncoderLoadError,
    },

    #[error("invalid model {}: {source}", .path.display())]
    Model {
        path: PathBuf,
        #[source]
        source: ForestLoadError,
    },

    #[cfg(feature = "onnx")]
    #[error("invalid model {}: {source}", .path.display())]
    Onnx {
        path: PathBuf,
        #[source]
        source: super::onnx::OnnxLoadError,
    },

    #[error("{}: ONNX models need the `onnx` feature", .0.display())]
    OnnxDisabled(PathBuf),

    #[error("{}: unsupported model format (expected .json or .onnx)", .0.display())]
    UnsupportedFormat(PathBuf),
}

/// Read-only artifacts shared by every request
pub struct ModelArtifacts {
    pub scorer: Box<dyn Scorer>,
    pub product_encoder: Box<dyn CategoryEncoder>,
    pub packaging_encoder: Box<dyn CategoryEncoder>,
}

impl std::fmt::Debug for ModelArtifacts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelArtifacts")
            .field("scorer", &self.scorer.kind())
            .field("product_vocabulary", &self.product_encoder.vocabulary_size())
            .field("packaging_vocabulary", &self.packaging_encoder.vocabulary_size())
            .finish()
    }
}

impl ModelArtifacts {
    pub fn new(
        scorer: Box<dyn Scorer>,
        product_encoder: Box<dyn CategoryEncoder>,
        packaging_encoder: Box<dyn CategoryEncoder>,
    ) -> Self {
        Self {
            scorer,
            product_encoder,
            packaging_encoder,
        }
    }

    /// Load the three artifacts named by the configuration
    pub fn load(config: &Config) -> Result<Self, ArtifactError> {
        let scorer = load_scorer(&config.model_path, config.model_sha256.as_deref())?;

        let product_bytes = read_pinned(&config.product_encoder_path, config.product_encoder_sha256.as_deref())?;
        let product_encoder = LabelEncoder::from_json("product_type", &product_bytes)
            .map_err(|source| ArtifactError::Encoder {
                path: config.product_encoder_path.clone(),
                source,
            })?;

        let packaging_bytes = read_pinned(&config.packaging_encoder_path, config.packaging_encoder_sha256.as_deref())?;
        let packaging_encoder = LabelEncoder::from_json("packaging_type", &packaging_bytes)
            .map_err(|source| ArtifactError::Encoder {
                path: config.packaging_encoder_path.clone(),
                source,
            })?;

        tracing::info!(
            scorer = scorer.kind(),
            product_types = product_encoder.vocabulary_size(),
            packaging_types = packaging_encoder.vocabulary_size(),
            "Model artifacts loaded"
        );

        Ok(Self::new(scorer, Box::new(product_encoder), Box::new(packaging_encoder)))
    }
}

/// Load a classifier, choosing the backend by file extension
pub fn load_scorer(path: &Path, expected_sha256: Option<&str>) -> Result<Box<dyn Scorer>, ArtifactError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("json") => {
            let bytes = read_pinned(path, expected_sha256)?;
            let forest = ForestScorer::from_json(&bytes).map_err(|source| ArtifactError::Model {
                path: path.to_path_buf(),
                source,
            })?;
            tracing::info!("Tree ensemble loaded ({} estimators)", forest.n_estimators());
            Ok(Box::new(forest))
        }
        #[cfg(feature = "onnx")]
        Some("onnx") => {
            let bytes = read_pinned(path, expected_sha256)?;
            let onnx = super::onnx::OnnxScorer::from_bytes(&bytes).map_err(|source| ArtifactError::Onnx {
                path: path.to_path_buf(),
                source,
            })?;
            Ok(Box::new(onnx))
        }
        #[cfg(not(feature = "onnx"))]
        Some("onnx") => Err(ArtifactError::OnnxDisabled(path.to_path_buf())),
        _ => Err(ArtifactError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Read an artifact file
pub fn read_artifact(path: &Path) -> Result<Vec<u8>, ArtifactError> {
    std::fs::read(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Read an artifact and check it against an optional SHA-256 pin
pub fn read_pinned(path: &Path, expected_sha256: Option<&str>) -> Result<Vec<u8>, ArtifactError> {
    let bytes = read_artifact(path)?;
    let actual = sha256_hex(&bytes);

    tracing::info!("Artifact {} ({} bytes, sha256 {})", path.display(), bytes.len(), actual);

    if let Some(expected) = expected_sha256 {
        if !expected.trim().eq_ignore_ascii_case(&actual) {
            return Err(ArtifactError::Checksum {
                path: path.to_path_buf(),
                expected: expected.trim().to_ascii_lowercase(),
                actual,
            });
        }
    }

    Ok(bytes)
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
