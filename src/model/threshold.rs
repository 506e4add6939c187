//! Risk tiering and response rounding

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::RiskLevel;

/// Strictly above → HIGH
pub const HIGH_THRESHOLD: f64 = 0.7;

/// Strictly above → MEDIUM
pub const MEDIUM_THRESHOLD: f64 = 0.4;

/// Decimal places in `spoilage_risk_probability`
pub const PROBABILITY_DECIMALS: u32 = 3;

/// Map a probability to its tier. Both boundaries are exclusive:
/// exactly 0.7 is MEDIUM and exactly 0.4 is LOW.
pub fn risk_level(probability: f64) -> RiskLevel {
    if probability > HIGH_THRESHOLD {
        RiskLevel::High
    } else if probability > MEDIUM_THRESHOLD {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// Round to [`PROBABILITY_DECIMALS`] places, half-to-even on the exact binary
/// value: 0.0625 → 0.062, 0.1875 → 0.188, and 0.1235 → 0.123 because the
/// stored double sits just below the midpoint.
pub fn round_probability(probability: f64) -> f64 {
    Decimal::from_f64_retain(probability)
        .map(|d| d.round_dp_with_strategy(PROBABILITY_DECIMALS, RoundingStrategy::MidpointNearestEven))
        .and_then(|d| d.to_f64())
        .unwrap_or(probability)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(risk_level(0.7), RiskLevel::Medium);
        assert_eq!(risk_level(0.70001), RiskLevel::High);
        assert_eq!(risk_level(0.4), RiskLevel::Low);
        assert_eq!(risk_level(0.40001), RiskLevel::Medium);
    }

    #[test]
    fn test_tier_extremes() {
        assert_eq!(risk_level(0.0), RiskLevel::Low);
        assert_eq!(risk_level(1.0), RiskLevel::High);
        assert_eq!(risk_level(0.55), RiskLevel::Medium);
    }

    #[test]
    fn test_round_exact_ties_to_even() {
        assert_eq!(round_probability(0.0625), 0.062);
        assert_eq!(round_probability(0.1875), 0.188);
        assert_eq!(round_probability(0.6875), 0.688);
    }

    #[test]
    fn test_round_near_ties_follow_binary_value() {
        // 0.1235 is stored as 0.12349999...
        assert_eq!(round_probability(0.1235), 0.123);
        // 0.9995 is stored as 0.99950000...055
        assert_eq!(round_probability(0.9995), 1.0);
        assert_eq!(round_probability(0.0005), 0.001);
    }

    #[test]
    fn test_round_ordinary_values() {
        assert_eq!(round_probability(2.0 / 3.0), 0.667);
        assert_eq!(round_probability(0.12345), 0.123);
        assert_eq!(round_probability(0.0), 0.0);
        assert_eq!(round_probability(1.0), 1.0);
        assert_eq!(round_probability(0.7), 0.7);
    }

    #[test]
    fn test_rounded_has_at_most_three_decimals() {
        for i in 0..=1000 {
            let p = i as f64 / 997.0;
            let rounded = round_probability(p.min(1.0));
            let text = serde_json::to_string(&rounded).unwrap();
            let decimals = text.split('.').nth(1).map(str::len).unwrap_or(0);
            assert!(decimals <= 3, "{} -> {}", p, text);
        }
    }
}
