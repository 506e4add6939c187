//! Classifier capability and the tree-ensemble backend
//!
//! The tree ensemble reads the arrays a fitted scikit-learn forest keeps in
//! each estimator's `tree_` (`children_left`, `children_right`, `feature`,
//! `threshold`, `value`) and reproduces `predict_proba`: every tree votes with
//! the class distribution of the leaf the sample lands in, and the votes are
//! averaged.

use serde::Deserialize;
use thiserror::Error;

use crate::features::layout::{validate_feature_names, LayoutMismatchError};
use crate::features::{FeatureVector, FEATURE_COUNT};

/// `children_left` marker for a leaf
const TREE_LEAF: i64 = -1;

/// Index of the "spoiled" class in the model's class order
pub const POSITIVE_CLASS: usize = 1;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoreError {
    #[error("input contains NaN, infinity or a value too large for f32 at feature '{0}'")]
    NonFiniteInput(&'static str),

    #[error("model invocation failed: {0}")]
    Inference(String),

    #[error("model returned an invalid probability: {0}")]
    InvalidProbability(f64),
}

/// Opaque binary classifier: positive-class probability for one feature vector
pub trait Scorer: Send + Sync {
    fn score(&self, features: &FeatureVector) -> Result<f64, ScoreError>;

    /// Short backend name for logs and the health endpoint
    fn kind(&self) -> &'static str {
        "custom"
    }
}

impl<F> Scorer for F
where
    F: Fn(&FeatureVector) -> Result<f64, ScoreError> + Send + Sync,
{
    fn score(&self, features: &FeatureVector) -> Result<f64, ScoreError> {
        self(features)
    }
}

/// Rejected tree-ensemble artifact
#[derive(Debug, Error)]
pub enum ForestLoadError {
    #[error("failed to parse model: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("model has no trees")]
    NoTrees,

    #[error("model expects {actual} features, service produces {expected}")]
    FeatureCount { actual: usize, expected: usize },

    #[error("model has {0} classes, a binary classifier has 2")]
    ClassCount(usize),

    #[error(transparent)]
    Layout(#[from] LayoutMismatchError),

    #[error("tree {tree}: {reason}")]
    MalformedTree { tree: usize, reason: String },
}

/// Leaf value as exported: `[n_classes]` or `[n_outputs][n_classes]`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NodeValue {
    Flat(Vec<f64>),
    Nested(Vec<Vec<f64>>),
}

impl NodeValue {
    fn into_flat(self) -> Vec<f64> {
        match self {
            NodeValue::Flat(v) => v,
            NodeValue::Nested(mut outputs) => {
                if outputs.is_empty() {
                    Vec::new()
                } else {
                    outputs.swap_remove(0)
                }
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct TreeArtifact {
    children_left: Vec<i64>,
    children_right: Vec<i64>,
    feature: Vec<i64>,
    threshold: Vec<f64>,
    value: Vec<NodeValue>,
}

#[derive(Debug, Deserialize)]
struct ForestArtifact {
    n_features: usize,
    #[serde(default)]
    classes: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    feature_names: Option<Vec<String>>,
    trees: Vec<TreeArtifact>,
}

#[derive(Debug, Clone)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        positive: f64,
    },
}

#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn from_artifact(index: usize, artifact: TreeArtifact) -> Result<Self, ForestLoadError> {
        let malformed = |reason: String| ForestLoadError::MalformedTree { tree: index, reason };

        let n = artifact.children_left.len();
        if n == 0 {
            return Err(malformed("no nodes".to_string()));
        }
        if artifact.children_right.len() != n
            || artifact.feature.len() != n
            || artifact.threshold.len() != n
            || artifact.value.len() != n
        {
            return Err(malformed("node arrays differ in length".to_string()));
        }

        let mut nodes = Vec::with_capacity(n);
        for (id, value) in artifact.value.into_iter().enumerate() {
            let left = artifact.children_left[id];
            let right = artifact.children_right[id];

            if left == TREE_LEAF {
                let distribution = value.into_flat();
                if distribution.len() != 2 {
                    return Err(malformed(format!(
                        "leaf {} has {} class weights",
                        id,
                        distribution.len()
                    )));
                }
                let total: f64 = distribution.iter().sum();
                if !(total > 0.0) || distribution.iter().any(|w| !w.is_finite() || *w < 0.0) {
                    return Err(malformed(format!("leaf {} has invalid class weights", id)));
                }
                nodes.push(Node::Leaf {
                    positive: distribution[POSITIVE_CLASS] / total,
                });
                continue;
            }

            // Children always follow their parent, so every walk terminates
            let child = |c: i64| -> Result<usize, ForestLoadError> {
                if c > id as i64 && (c as usize) < n {
                    Ok(c as usize)
                } else {
                    Err(malformed(format!("node {} has invalid child {}", id, c)))
                }
            };
            let feature = artifact.feature[id];
            if feature < 0 || feature as usize >= FEATURE_COUNT {
                return Err(malformed(format!("node {} splits on feature {}", id, feature)));
            }

            nodes.push(Node::Split {
                feature: feature as usize,
                threshold: artifact.threshold[id],
                left: child(left)?,
                right: child(right)?,
            });
        }

        Ok(Self { nodes })
    }

    fn predict(&self, sample: &[f64; FEATURE_COUNT]) -> f64 {
        let mut id = 0;
        loop {
            match &self.nodes[id] {
                Node::Leaf { positive } => return *positive,
                Node::Split { feature, threshold, left, right } => {
                    // scikit-learn compares in single precision
                    let x = sample[*feature] as f32 as f64;
                    id = if x <= *threshold { *left } else { *right };
                }
            }
        }
    }
}

/// Random-forest classifier loaded from a JSON export
#[derive(Debug, Clone)]
pub struct ForestScorer {
    trees: Vec<Tree>,
}

impl ForestScorer {
    pub fn from_json(bytes: &[u8]) -> Result<Self, ForestLoadError> {
        let artifact: ForestArtifact = serde_json::from_slice(bytes)?;

        if artifact.n_features != FEATURE_COUNT {
            return Err(ForestLoadError::FeatureCount {
                actual: artifact.n_features,
                expected: FEATURE_COUNT,
            });
        }
        if let Some(classes) = &artifact.classes {
            if classes.len() != 2 {
                return Err(ForestLoadError::ClassCount(classes.len()));
            }
        }
        if let Some(names) = &artifact.feature_names {
            validate_feature_names(names)?;
        }
        if artifact.trees.is_empty() {
            return Err(ForestLoadError::NoTrees);
        }

        let trees = artifact
            .trees
            .into_iter()
            .enumerate()
            .map(|(i, tree)| Tree::from_artifact(i, tree))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { trees })
    }

    pub fn n_estimators(&self) -> usize {
        self.trees.len()
    }
}

impl Scorer for ForestScorer {
    fn score(&self, features: &FeatureVector) -> Result<f64, ScoreError> {
        if let Some(name) = features.first_non_finite() {
            return Err(ScoreError::NonFiniteInput(name));
        }
        let sample = features.as_array();

        let sum: f64 = self.trees.iter().map(|tree| tree.predict(sample)).sum();
        Ok(sum / self.trees.len() as f64)
    }

    fn kind(&self) -> &'static str {
        "forest"
    }
}
