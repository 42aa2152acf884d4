//! Unified error model for calculators
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalcError {
    #[error(
        "CATALOG/no active product in category '{category}': register products in category {category}"
    )]
    MissingCategory { category: String },

    #[error("CATALOG/no product found for role '{role}' in category '{category}'")]
    MissingProduct { role: String, category: String },

    #[error("SPEC/product '{product}' is missing required specification '{spec}'")]
    MissingSpec { product: String, spec: String },

    #[error("PRICE/product '{product}' has no price configured (base_price = 0)")]
    ZeroPrice { product: String },

    #[error("INPUT/{0}")]
    InvalidInput(String),
}

impl CalcError {
    pub fn missing_category(category: impl Into<String>) -> Self {
        Self::MissingCategory { category: category.into() }
    }

    pub fn missing_product(role: impl Into<String>, category: impl Into<String>) -> Self {
        Self::MissingProduct {
            role: role.into(),
            category: category.into(),
        }
    }

    pub fn missing_spec(product: impl Into<String>, spec: impl Into<String>) -> Self {
        Self::MissingSpec {
            product: product.into(),
            spec: spec.into(),
        }
    }

    pub fn zero_price(product: impl Into<String>) -> Self {
        Self::ZeroPrice { product: product.into() }
    }

    /// Short machine-readable code (the prefix of the display string)
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingCategory { .. } | Self::MissingProduct { .. } => "CATALOG",
            Self::MissingSpec { .. } => "SPEC",
            Self::ZeroPrice { .. } => "PRICE",
            Self::InvalidInput(_) => "INPUT",
        }
    }
}

pub type CalcResult<T> = Result<T, CalcError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_category_names_category() {
        let err = CalcError::missing_category("battery_backup");
        let msg = err.to_string();
        assert!(msg.starts_with("CATALOG/"));
        assert!(msg.contains("battery_backup"));
        assert_eq!(err.code(), "CATALOG");
    }

    #[test]
    fn test_codes() {
        assert_eq!(CalcError::missing_spec("p", "power").code(), "SPEC");
        assert_eq!(CalcError::zero_price("p").code(), "PRICE");
        assert_eq!(CalcError::InvalidInput("x".into()).code(), "INPUT");
    }
}
