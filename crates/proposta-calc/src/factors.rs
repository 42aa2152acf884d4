//! Correction and waste factor tables
//!
//! Translates physical parameters (roof slope, complexity, substrate,
//! exposure) into dimensionless multipliers.

use serde::{Deserialize, Serialize};

/// Slope (% inclination) → area correction, as tabulated for roofing
pub const SLOPE_TABLE: [(u32, f64); 14] = [
    (17, 1.014),
    (20, 1.020),
    (25, 1.031),
    (30, 1.044),
    (35, 1.059),
    (40, 1.077),
    (45, 1.097),
    (50, 1.118),
    (55, 1.141),
    (60, 1.166),
    (65, 1.193),
    (70, 1.221),
    (75, 1.250),
    (80, 1.281),
];

/// Minimum inclination (%) for asphalt shingles
pub const MIN_SHINGLE_SLOPE: f64 = 17.0;

/// Geometric correction: `sqrt(1 + (slope/100)^2)`
pub fn slope_formula(slope: f64) -> f64 {
    (1.0 + (slope / 100.0).powi(2)).sqrt()
}

/// Exact table hit returns the tabulated constant, anything else the formula
pub fn calculate_slope_correction_factor(slope: f64) -> f64 {
    SLOPE_TABLE
        .iter()
        .find(|(key, _)| *key as f64 == slope)
        .map(|(_, factor)| *factor)
        .unwrap_or_else(|| slope_formula(slope))
}

/// Simplified lookup: nearest table key at or below `slope`.
///
/// Slopes above the last key use the last key; slopes below the first key
/// (already non-compliant for shingles) use the formula.
pub fn slope_factor_nearest_below(slope: f64) -> f64 {
    SLOPE_TABLE
        .iter()
        .rev()
        .find(|(key, _)| *key as f64 <= slope)
        .map(|(_, factor)| *factor)
        .unwrap_or_else(|| slope_formula(slope))
}

/// Roof complexity, mapped to a waste factor by direct lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ShingleComplexity {
    #[default]
    Simple,
    Complex,
    VeryComplex,
}

impl ShingleComplexity {
    pub fn waste_factor(&self) -> f64 {
        match self {
            ShingleComplexity::Simple => 1.10,
            ShingleComplexity::Complex => 1.15,
            ShingleComplexity::VeryComplex => 1.20,
        }
    }
}

/// One named multiplier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionFactor {
    pub name: String,
    pub value: f64,
}

/// Independent multiplicative corrections with an aggregate cap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionSet {
    pub factors: Vec<CorrectionFactor>,
    pub cap: f64,
}

impl CorrectionSet {
    pub fn new(cap: f64) -> Self {
        Self {
            factors: Vec::new(),
            cap,
        }
    }

    /// Add a factor; non-positive or non-finite values are ignored
    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        let name = name.into();
        if value.is_finite() && value > 0.0 {
            self.factors.push(CorrectionFactor { name, value });
        } else {
            tracing::warn!(factor = %name, value, "ignoring non-positive correction factor");
        }
        self
    }

    pub fn uncapped(&self) -> f64 {
        self.factors.iter().map(|f| f.value).product()
    }

    /// Product of all factors, limited to the cap
    pub fn product(&self) -> f64 {
        self.uncapped().min(self.cap)
    }

    pub fn is_capped(&self) -> bool {
        self.uncapped() > self.cap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_values_exact() {
        for (slope, factor) in SLOPE_TABLE {
            assert_eq!(calculate_slope_correction_factor(slope as f64), factor);
        }
    }

    #[test]
    fn test_off_table_uses_formula() {
        for slope in [0.0, 5.0, 18.0, 22.5, 33.0, 90.0, 120.0] {
            let expected = (1.0 + (slope / 100.0_f64).powi(2)).sqrt();
            assert!((calculate_slope_correction_factor(slope) - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_table_close_to_formula() {
        for (slope, factor) in SLOPE_TABLE {
            assert!((slope_formula(slope as f64) - factor).abs() < 0.001);
        }
    }

    #[test]
    fn test_nearest_below() {
        assert_eq!(slope_factor_nearest_below(25.0), 1.031);
        assert_eq!(slope_factor_nearest_below(27.9), 1.031);
        assert_eq!(slope_factor_nearest_below(30.0), 1.044);
        assert_eq!(slope_factor_nearest_below(95.0), 1.281);
        assert_eq!(slope_factor_nearest_below(10.0), slope_formula(10.0));
    }

    #[test]
    fn test_waste_factors() {
        assert_eq!(ShingleComplexity::Simple.waste_factor(), 1.10);
        assert_eq!(ShingleComplexity::Complex.waste_factor(), 1.15);
        assert_eq!(ShingleComplexity::VeryComplex.waste_factor(), 1.20);
    }

    #[test]
    fn test_correction_set_cap() {
        let set = CorrectionSet::new(1.3)
            .with("a", 1.2)
            .with("b", 1.2)
            .with("ignored", 0.0);
        assert_eq!(set.factors.len(), 2);
        assert!((set.uncapped() - 1.44).abs() < 1e-12);
        assert_eq!(set.product(), 1.3);
        assert!(set.is_capped());
    }

    #[test]
    fn test_empty_correction_set_is_neutral() {
        assert_eq!(CorrectionSet::new(1.5).product(), 1.0);
    }
}
