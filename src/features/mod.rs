//! Features Module - classifier input construction

pub mod layout;
pub mod vector;

pub use layout::{FEATURE_COUNT, FEATURE_LAYOUT, FEATURE_VERSION, LayoutInfo, LayoutMismatchError};
pub use vector::{CategoryCodes, DerivedFeatures, FeatureVector};
