//! Validated commission rule sets
//!
//! [`calculate_commission`](crate::calculate_commission) accepts any rule
//! list. A [`CommissionRuleSet`] is built only from rules whose active
//! ranges are well-formed and disjoint, so selection is unambiguous.

use crate::calculation::{calculate_commission, CommissionCalculation};
use crate::error::CommissionError;
use crate::rule::{active_sorted, CommissionRule};
use serde::{Deserialize, Serialize};

/// Two active rules whose discount ranges share at least one point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleOverlap {
    pub first: String,
    pub second: String,
}

/// Every overlapping pair of active rules, without rejecting anything
pub fn find_overlaps(rules: &[CommissionRule]) -> Vec<RuleOverlap> {
    let active = active_sorted(rules);
    let mut overlaps = Vec::new();
    for (i, a) in active.iter().enumerate() {
        for b in &active[i + 1..] {
            if a.overlaps(b) {
                overlaps.push(RuleOverlap {
                    first: a.id.clone(),
                    second: b.id.clone(),
                });
            }
        }
    }
    overlaps
}

/// Highest discount any active rule still pays commission on
pub fn max_allowed_discount(rules: &[CommissionRule]) -> Option<f64> {
    rules
        .iter()
        .filter(|r| r.is_active)
        .map(|r| r.discount_max)
        .max_by(|a, b| a.total_cmp(b))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommissionRuleSet {
    rules: Vec<CommissionRule>,
}

impl CommissionRuleSet {
    pub fn new(rules: Vec<CommissionRule>) -> Result<Self, CommissionError> {
        for rule in rules.iter().filter(|r| r.is_active) {
            if rule.discount_min > rule.discount_max {
                return Err(CommissionError::InvalidRange {
                    rule_id: rule.id.clone(),
                    min: rule.discount_min,
                    max: rule.discount_max,
                });
            }
            if rule.commission_rate < 0.0 {
                return Err(CommissionError::NegativeRate {
                    rule_id: rule.id.clone(),
                    rate: rule.commission_rate,
                });
            }
        }
        if let Some(overlap) = find_overlaps(&rules).into_iter().next() {
            tracing::warn!(
                first = %overlap.first,
                second = %overlap.second,
                "rejecting overlapping commission rules"
            );
            return Err(CommissionError::Overlap {
                first: overlap.first,
                second: overlap.second,
            });
        }
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[CommissionRule] {
        &self.rules
    }

    pub fn calculate(
        &self,
        proposal_value: f64,
        discount_percentage: f64,
    ) -> Option<CommissionCalculation> {
        calculate_commission(&self.rules, proposal_value, discount_percentage)
    }

    pub fn max_allowed_discount(&self) -> Option<f64> {
        max_allowed_discount(&self.rules)
    }
}

impl<'de> Deserialize<'de> for CommissionRuleSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let rules = Vec::<CommissionRule>::deserialize(deserializer)?;
        CommissionRuleSet::new(rules).map_err(serde::de::Error::custom)
    }
}
