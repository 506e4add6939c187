//! Feature Layout - Centralized Feature Definition
//!
//! **CRITICAL: This file controls the classifier input schema**
//!
//! ## Rules (NEVER break these):
//! 1. The order must match the order the classifier was trained with
//! 2. Add, remove or reorder a feature → increment FEATURE_VERSION
//! 3. A reordered vector produces wrong probabilities with no runtime error

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

// ============================================================================
// FEATURE VERSION
// ============================================================================

/// Current feature layout version
/// MUST be incremented when layout changes
pub const FEATURE_VERSION: u8 = 1;

// ============================================================================
// FEATURE LAYOUT (Authoritative source)
// ============================================================================

/// Feature names in exact order they appear in the vector
pub const FEATURE_LAYOUT: &[&str] = &[
    "product_type",     // 0: encoded product category
    "initial_quality",  // 1
    "packaging_type",   // 2: encoded packaging category
    "temperature",      // 3
    "humidity",         // 4
    "storage_duration", // 5: travel_time + delay_time
    "transit_stress",   // 6: temperature * storage_duration
    "shelf_life",       // 7
];

/// Total number of features
/// IMPORTANT: Must match FEATURE_LAYOUT.len()!
pub const FEATURE_COUNT: usize = 8;

pub const PRODUCT_TYPE: usize = 0;
pub const INITIAL_QUALITY: usize = 1;
pub const PACKAGING_TYPE: usize = 2;
pub const TEMPERATURE: usize = 3;
pub const HUMIDITY: usize = 4;
pub const STORAGE_DURATION: usize = 5;
pub const TRANSIT_STRESS: usize = 6;
pub const SHELF_LIFE: usize = 7;

// ============================================================================
// LAYOUT HASH
// ============================================================================

/// CRC32 of the version and the ordered feature names
pub fn layout_hash() -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(&[FEATURE_VERSION]);

    for name in FEATURE_LAYOUT {
        hasher.update(name.as_bytes());
        hasher.update(&[0]);
    }

    hasher.finalize()
}

// ============================================================================
// LAYOUT INFO
// ============================================================================

/// Complete layout information for logging and the health endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutInfo {
    pub version: u8,
    pub hash: u32,
    pub feature_count: usize,
    pub feature_names: Vec<String>,
}

impl LayoutInfo {
    pub fn current() -> Self {
        Self {
            version: FEATURE_VERSION,
            hash: layout_hash(),
            feature_count: FEATURE_COUNT,
            feature_names: FEATURE_LAYOUT.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Default for LayoutInfo {
    fn default() -> Self {
        Self::current()
    }
}

// ============================================================================
// LAYOUT VALIDATION
// ============================================================================

/// A model artifact was trained on a different feature order
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("feature layout mismatch: model expects [{}], service produces [{}]", .actual.join(", "), FEATURE_LAYOUT.join(", "))]
pub struct LayoutMismatchError {
    pub actual: Vec<String>,
}

/// Check feature names recorded by a trained model against the layout
pub fn validate_feature_names<S: AsRef<str>>(names: &[S]) -> Result<(), LayoutMismatchError> {
    let matches = names.len() == FEATURE_COUNT
        && names
            .iter()
            .zip(FEATURE_LAYOUT.iter())
            .all(|(given, expected)| given.as_ref() == *expected);

    if matches {
        Ok(())
    } else {
        Err(LayoutMismatchError {
            actual: names.iter().map(|n| n.as_ref().to_string()).collect(),
        })
    }
}

// ============================================================================
// FEATURE INDEX LOOKUP
// ============================================================================

/// Get feature index by name
pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_LAYOUT.iter().position(|&n| n == name)
}
