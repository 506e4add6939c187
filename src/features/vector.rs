//! Feature Vector - Classifier input
//!
//! Built only through [`FeatureVector::assemble`], which writes every slot
//! through the index constants of `layout.rs`.

use serde::{Deserialize, Serialize};

use super::layout::{
    FEATURE_COUNT, FEATURE_LAYOUT, FEATURE_VERSION,
    PRODUCT_TYPE, INITIAL_QUALITY, PACKAGING_TYPE, TEMPERATURE,
    HUMIDITY, STORAGE_DURATION, TRANSIT_STRESS, SHELF_LIFE,
    feature_index, layout_hash,
};
use crate::models::ShipmentRecord;

/// Engineered features derived from a record
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedFeatures {
    /// travel_time + delay_time
    pub storage_duration: f64,
    /// temperature * storage_duration
    pub transit_stress: f64,
}

impl DerivedFeatures {
    pub fn from_record(record: &ShipmentRecord) -> Self {
        let storage_duration = record.travel_time + record.delay_time;
        Self {
            storage_duration,
            transit_stress: record.temperature * storage_duration,
        }
    }
}

/// Integer codes produced by the two category encoders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryCodes {
    pub product_type: i64,
    pub packaging_type: i64,
}

/// Ordered classifier input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Feature layout version
    pub version: u8,
    /// CRC32 hash of the feature layout
    pub layout_hash: u32,
    /// Feature values in order defined by FEATURE_LAYOUT
    pub values: [f64; FEATURE_COUNT],
}

impl FeatureVector {
    /// Assemble the vector in training order
    pub fn assemble(record: &ShipmentRecord, codes: CategoryCodes) -> Self {
        let derived = DerivedFeatures::from_record(record);

        let mut values = [0.0f64; FEATURE_COUNT];
        values[PRODUCT_TYPE] = codes.product_type as f64;
        values[INITIAL_QUALITY] = record.initial_quality;
        values[PACKAGING_TYPE] = codes.packaging_type as f64;
        values[TEMPERATURE] = record.temperature;
        values[HUMIDITY] = record.humidity;
        values[STORAGE_DURATION] = derived.storage_duration;
        values[TRANSIT_STRESS] = derived.transit_stress;
        values[SHELF_LIFE] = record.shelf_life;

        Self::from_values(values)
    }

    /// Wrap raw values that are already in layout order
    pub fn from_values(values: [f64; FEATURE_COUNT]) -> Self {
        Self {
            version: FEATURE_VERSION,
            layout_hash: layout_hash(),
            values,
        }
    }

    pub fn as_array(&self) -> &[f64; FEATURE_COUNT] {
        &self.values
    }

    /// Single-precision copy for runtimes that take `f32` tensors
    pub fn to_f32(&self) -> [f32; FEATURE_COUNT] {
        self.values.map(|v| v as f32)
    }

    /// First feature that is NaN or infinite once narrowed to `f32`.
    /// Finite doubles beyond `f32::MAX` count as infinite.
    pub fn first_non_finite(&self) -> Option<&'static str> {
        self.to_f32()
            .iter()
            .position(|v| !v.is_finite())
            .map(|i| FEATURE_LAYOUT[i])
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    pub fn get_by_name(&self, name: &str) -> Option<f64> {
        feature_index(name).and_then(|i| self.get(i))
    }

    /// Named values for debug logging
    pub fn to_log_entry(&self) -> serde_json::Value {
        serde_json::json!({
            "feature_version": self.version,
            "layout_hash": self.layout_hash,
            "named_values": FEATURE_LAYOUT.iter()
                .zip(self.values.iter())
                .map(|(name, value)| (name.to_string(), serde_json::json!(value)))
                .collect::<serde_json::Map<String, serde_json::Value>>(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ShipmentRecord {
        ShipmentRecord {
            product_type: "Dairy".to_string(),
            initial_quality: 91.0,
            packaging_type: "Vacuum".to_string(),
            temperature: 10.0,
            humidity: 65.0,
            travel_time: 2.0,
            delay_time: 3.0,
            distance: 120.0,
            shelf_life: 7.0,
        }
    }

    #[test]
    fn test_derived_features() {
        let derived = DerivedFeatures::from_record(&record());
        assert_eq!(derived.storage_duration, 5.0);
        assert_eq!(derived.transit_stress, 50.0);
    }

    #[test]
    fn test_assemble_order() {
        let codes = CategoryCodes { product_type: 2, packaging_type: 1 };
        let vector = FeatureVector::assemble(&record(), codes);
        assert_eq!(
            vector.as_array(),
            &[2.0, 91.0, 1.0, 10.0, 65.0, 5.0, 50.0, 7.0]
        );
        assert_eq!(vector.get_by_name("transit_stress"), Some(50.0));
        assert_eq!(vector.get_by_name("distance"), None);
        assert_eq!(vector.version, FEATURE_VERSION);
        assert_eq!(vector.layout_hash, layout_hash());
    }

    #[test]
    fn test_distance_is_not_a_feature() {
        let codes = CategoryCodes { product_type: 0, packaging_type: 0 };
        let mut far = record();
        far.distance = 9_999.0;
        assert_eq!(
            FeatureVector::assemble(&record(), codes),
            FeatureVector::assemble(&far, codes)
        );
    }

    #[test]
    fn test_log_entry_names_values() {
        let codes = CategoryCodes { product_type: 0, packaging_type: 3 };
        let entry = FeatureVector::assemble(&record(), codes).to_log_entry();
        assert_eq!(entry["named_values"]["packaging_type"], 3.0);
        assert_eq!(entry["named_values"]["storage_duration"], 5.0);
    }

    #[test]
    fn test_first_non_finite_uses_single_precision() {
        let mut values = [1.0; FEATURE_COUNT];
        assert_eq!(FeatureVector::from_values(values).first_non_finite(), None);

        values[HUMIDITY] = f64::from(f32::MAX);
        assert_eq!(FeatureVector::from_values(values).first_non_finite(), None);

        values[HUMIDITY] = 1e39;
        assert_eq!(FeatureVector::from_values(values).first_non_finite(), Some("humidity"));

        values[TEMPERATURE] = f64::NAN;
        assert_eq!(FeatureVector::from_values(values).first_non_finite(), Some("temperature"));
    }
}
