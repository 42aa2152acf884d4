//! Sales quota progress

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotaProgress {
    pub target: f64,
    pub achieved: f64,
    pub remaining: f64,
    /// Percent of the target reached; may exceed 100
    pub percentage: f64,
    pub met: bool,
}

impl QuotaProgress {
    /// A zero or negative target counts as met
    pub fn compute(target: f64, achieved: f64) -> Self {
        let target = target.max(0.0);
        let achieved = achieved.max(0.0);
        let percentage = if target > 0.0 {
            achieved / target * 100.0
        } else {
            100.0
        };
        Self {
            target,
            achieved,
            remaining: (target - achieved).max(0.0),
            percentage,
            met: achieved >= target,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_progress() {
        let progress = QuotaProgress::compute(50_000.0, 20_000.0);
        assert_eq!(progress.percentage, 40.0);
        assert_eq!(progress.remaining, 30_000.0);
        assert!(!progress.met);
    }

    #[test]
    fn test_exceeded() {
        let progress = QuotaProgress::compute(10_000.0, 12_500.0);
        assert_eq!(progress.percentage, 125.0);
        assert_eq!(progress.remaining, 0.0);
        assert!(progress.met);
    }

    #[test]
    fn test_zero_target() {
        let progress = QuotaProgress::compute(0.0, 0.0);
        assert!(progress.met);
        assert_eq!(progress.percentage, 100.0);
    }
}
