//! Category encoders
//!
//! A fitted label encoder is a sorted, de-duplicated vocabulary; a label's code
//! is its position in that vocabulary. Labels outside the vocabulary are
//! rejected, never mapped to a default.

use serde::Deserialize;
use thiserror::Error;

/// Label not present in an encoder's fitted vocabulary
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {field} '{label}': not one of the {vocabulary_size} labels the encoder was fitted on")]
pub struct UnknownCategory {
    pub field: String,
    pub label: String,
    pub vocabulary_size: usize,
}

/// String → integer code lookup over a closed vocabulary
pub trait CategoryEncoder: Send + Sync {
    fn encode(&self, label: &str) -> Result<i64, UnknownCategory>;

    /// Number of labels in the fitted vocabulary
    fn vocabulary_size(&self) -> usize;
}

/// Rejected encoder artifact
#[derive(Debug, Error)]
pub enum EncoderLoadError {
    #[error("failed to parse encoder: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("encoder vocabulary is empty")]
    Empty,

    #[error("encoder vocabulary is not sorted and unique near '{0}'")]
    Unsorted(String),
}

/// On-disk shape: `{"classes": [...]}` or a bare array
#[derive(Deserialize)]
#[serde(untagged)]
enum EncoderArtifact {
    Object { classes: Vec<String> },
    List(Vec<String>),
}

/// Fixed label table (the `classes_` of a fitted label encoder)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelEncoder {
    field: String,
    classes: Vec<String>,
}

impl LabelEncoder {
    /// `classes` must be sorted ascending with no duplicates
    pub fn new(field: impl Into<String>, classes: Vec<String>) -> Result<Self, EncoderLoadError> {
        if classes.is_empty() {
            return Err(EncoderLoadError::Empty);
        }
        if let Some(pair) = classes.windows(2).find(|w| w[0] >= w[1]) {
            return Err(EncoderLoadError::Unsorted(pair[1].clone()));
        }

        Ok(Self {
            field: field.into(),
            classes,
        })
    }

    /// Parse a JSON encoder artifact
    pub fn from_json(field: impl Into<String>, bytes: &[u8]) -> Result<Self, EncoderLoadError> {
        let classes = match serde_json::from_slice::<EncoderArtifact>(bytes)? {
            EncoderArtifact::Object { classes } => classes,
            EncoderArtifact::List(classes) => classes,
        };
        Self::new(field, classes)
    }
}

impl CategoryEncoder for LabelEncoder {
    fn encode(&self, label: &str) -> Result<i64, UnknownCategory> {
        self.classes
            .binary_search_by(|class| class.as_str().cmp(label))
            .map(|index| index as i64)
            .map_err(|_| UnknownCategory {
                field: self.field.clone(),
                label: label.to_string(),
                vocabulary_size: self.classes.len(),
            })
    }

    fn vocabulary_size(&self) -> usize {
        self.classes.len()
    }
}
