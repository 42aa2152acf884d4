//! Commission rules
//!
//! A rule pays `commission_rate` percent of the final (discounted) value
//! when the granted discount lies inside `[discount_min, discount_max]`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissionRule {
    pub id: String,

    #[serde(default)]
    pub name: String,

    /// Lower discount bound in percent (inclusive)
    pub discount_min: f64,

    /// Upper discount bound in percent (inclusive)
    pub discount_max: f64,

    /// Commission in percent of the final value
    pub commission_rate: f64,

    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl CommissionRule {
    pub fn new(
        id: impl Into<String>,
        discount_min: f64,
        discount_max: f64,
        commission_rate: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            discount_min,
            discount_max,
            commission_rate,
            is_active: true,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Inclusive at both ends
    pub fn contains(&self, discount_percentage: f64) -> bool {
        discount_percentage >= self.discount_min && discount_percentage <= self.discount_max
    }

    /// Closed ranges sharing any point overlap
    pub fn overlaps(&self, other: &CommissionRule) -> bool {
        self.discount_min <= other.discount_max && other.discount_min <= self.discount_max
    }
}

/// Active rules ordered by `discount_min`, the order selection scans them in
pub(crate) fn active_sorted(rules: &[CommissionRule]) -> Vec<&CommissionRule> {
    let mut active: Vec<&CommissionRule> = rules.iter().filter(|r| r.is_active).collect();
    active.sort_by(|a, b| a.discount_min.total_cmp(&b.discount_min));
    active
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_is_inclusive() {
        let rule = CommissionRule::new("r", 5.0, 10.0, 3.0);
        assert!(rule.contains(5.0));
        assert!(rule.contains(10.0));
        assert!(!rule.contains(4.99));
        assert!(!rule.contains(10.01));
    }

    #[test]
    fn test_touching_ranges_overlap() {
        let a = CommissionRule::new("a", 0.0, 5.0, 5.0);
        let b = CommissionRule::new("b", 5.0, 10.0, 3.0);
        let c = CommissionRule::new("c", 5.01, 10.0, 3.0);
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_active_sorted_skips_inactive() {
        let rules = vec![
            CommissionRule::new("high", 10.0, 20.0, 1.0),
            CommissionRule::new("off", 0.0, 20.0, 9.0).inactive(),
            CommissionRule::new("low", 0.0, 9.99, 5.0),
        ];
        let ids: Vec<&str> = active_sorted(&rules).iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["low", "high"]);
    }
}
