//! Shipment telemetry and prediction wire types

use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};

/// One inbound shipment record (`POST /predict` body)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentRecord {
    pub product_type: String,
    #[serde(deserialize_with = "coerce_f64")]
    pub initial_quality: f64,
    pub packaging_type: String,
    #[serde(deserialize_with = "coerce_f64")]
    pub temperature: f64,
    #[serde(deserialize_with = "coerce_f64")]
    pub humidity: f64,
    #[serde(deserialize_with = "coerce_f64")]
    pub travel_time: f64,
    #[serde(deserialize_with = "coerce_f64")]
    pub delay_time: f64,
    /// Accepted but not fed to the classifier
    #[serde(deserialize_with = "coerce_f64")]
    pub distance: f64,
    #[serde(deserialize_with = "coerce_f64")]
    pub shelf_life: f64,
}

impl ShipmentRecord {
    /// Decode a request body
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }
}

/// Discretized spoilage risk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Successful prediction body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Positive-class probability, rounded to 3 decimals
    pub spoilage_risk_probability: f64,
    pub risk_level: RiskLevel,
}

/// Accept a JSON number or a string holding one.
fn coerce_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    struct CoerceF64;

    impl<'de> Visitor<'de> for CoerceF64 {
        type Value = f64;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a number or a numeric string")
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
            v.trim()
                .parse::<f64>()
                .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
        }
    }

    deserializer.deserialize_any(CoerceF64)
}
