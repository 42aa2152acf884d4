//! Commission for a single proposal

use crate::rule::{active_sorted, CommissionRule};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissionCalculation {
    pub rule_id: String,
    pub rule_name: String,
    pub proposal_value: f64,
    pub discount_percentage: f64,
    pub discount_value: f64,
    pub final_value: f64,
    pub commission_rate: f64,
    pub commission_value: f64,
}

impl CommissionCalculation {
    fn apply(rule: &CommissionRule, proposal_value: f64, discount_percentage: f64) -> Self {
        let discount_value = proposal_value * discount_percentage / 100.0;
        let final_value = proposal_value - discount_value;
        Self {
            rule_id: rule.id.clone(),
            rule_name: rule.name.clone(),
            proposal_value,
            discount_percentage,
            discount_value,
            final_value,
            commission_rate: rule.commission_rate,
            commission_value: final_value * rule.commission_rate / 100.0,
        }
    }
}

/// First active rule (by ascending `discount_min`) whose range contains the
/// discount; `None` when no rule matches.
///
/// Overlapping ranges are not rejected here: the lower `discount_min` wins.
/// Use [`CommissionRuleSet`](crate::CommissionRuleSet) to refuse them.
pub fn calculate_commission(
    rules: &[CommissionRule],
    proposal_value: f64,
    discount_percentage: f64,
) -> Option<CommissionCalculation> {
    let rule = active_sorted(rules)
        .into_iter()
        .find(|r| r.contains(discount_percentage));
    match rule {
        Some(rule) => Some(CommissionCalculation::apply(rule, proposal_value, discount_percentage)),
        None => {
            tracing::debug!(discount_percentage, "no commission rule matches the discount");
            None
        }
    }
}
