//! Model Module - classifier, category encoders and risk tiering
//!
//! The classifier and encoders are opaque capabilities loaded once at start-up;
//! the `Scorer` seam lets tests swap in deterministic stubs.

pub mod artifacts;
pub mod encoder;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod scorer;
pub mod threshold;

// Re-export common types
pub use artifacts::{ArtifactError, ModelArtifacts};
pub use encoder::{CategoryEncoder, LabelEncoder, UnknownCategory};
pub use scorer::{ForestScorer, ScoreError, Scorer};
pub use threshold::{risk_level, round_probability};
