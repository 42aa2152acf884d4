use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommissionError {
    #[error("RULES/rule '{rule_id}' has discount_min {min} greater than discount_max {max}")]
    InvalidRange { rule_id: String, min: f64, max: f64 },

    #[error("RULES/rule '{rule_id}' has a negative commission rate {rate}")]
    NegativeRate { rule_id: String, rate: f64 },

    #[error("RULES/rules '{first}' and '{second}' have overlapping discount ranges")]
    Overlap { first: String, second: String },
}
