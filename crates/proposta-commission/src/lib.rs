//! Proposta Commission: commission rules and sales quotas
//!
//! # Example
//!
//! ```
//! use proposta_commission::{calculate_commission, CommissionRule};
//!
//! let rules = vec![
//!     CommissionRule::new("base", 0.0, 5.0, 5.0),
//!     CommissionRule::new("reduced", 5.01, 10.0, 3.0),
//! ];
//!
//! let calc = calculate_commission(&rules, 10_000.0, 5.0).unwrap();
//! assert_eq!(calc.rule_id, "base");
//! assert_eq!(calc.commission_value, 475.0);
//! ```

pub mod calculation;
pub mod error;
pub mod quota;
pub mod rule;
pub mod rule_set;

pub use calculation::{calculate_commission, CommissionCalculation};
pub use error::CommissionError;
pub use quota::QuotaProgress;
pub use rule::CommissionRule;
pub use rule_set::{find_overlaps, max_allowed_discount, CommissionRuleSet, RuleOverlap};
