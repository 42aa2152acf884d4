//! Product catalog validation
//!
//! Classifies catalog gaps into errors and warnings under a
//! [`ValidationConfig`]. It never fails; whether to proceed is left to
//! `can_proceed` and the caller.

use crate::config::ValidationConfig;
use proposta_core::{Catalog, Product};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    MissingCategory,
    ZeroPrice,
    MissingSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationFinding {
    pub kind: FindingKind,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductValidationReport {
    pub is_valid: bool,
    pub errors: Vec<ValidationFinding>,
    pub warnings: Vec<ValidationFinding>,
    pub can_proceed: bool,
}

/// Validator bound to one configuration
pub struct ProductValidator {
    config: ValidationConfig,
}

impl ProductValidator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    pub fn strict() -> Self {
        Self::new(ValidationConfig::strict())
    }

    pub fn lenient() -> Self {
        Self::new(ValidationConfig::lenient())
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Check every required category of `products`
    pub fn validate(
        &self,
        products: &[Product],
        required_categories: &[&str],
    ) -> ProductValidationReport {
        self.validate_catalog(&Catalog::new(products), required_categories)
    }

    pub fn validate_catalog(
        &self,
        catalog: &Catalog,
        required_categories: &[&str],
    ) -> ProductValidationReport {
        let strict = self.config.strict_validation;
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        for category in required_categories {
            let entries = catalog.in_category(category);
            if entries.is_empty() {
                let finding = ValidationFinding {
                    kind: FindingKind::MissingCategory,
                    category: category.to_string(),
                    product_id: None,
                    spec: None,
                    message: format!(
                        "no active product in category '{}': register products in category {}",
                        category, category
                    ),
                };
                if strict {
                    errors.push(finding);
                } else {
                    warnings.push(finding);
                }
                continue;
            }

            for entry in entries {
                let product = &entry.product;
                if product.is_unpriced() {
                    let finding = ValidationFinding {
                        kind: FindingKind::ZeroPrice,
                        category: category.to_string(),
                        product_id: Some(product.id.clone()),
                        spec: None,
                        message: format!("product '{}' has no price configured", product.name),
                    };
                    if strict && self.config.block_zero_prices {
                        errors.push(finding);
                    } else {
                        warnings.push(finding);
                    }
                }

                if !self.config.require_specifications {
                    continue;
                }
                for key in self.config.required_specs.required_for(entry) {
                    if entry.specs.contains(key) {
                        continue;
                    }
                    let finding = ValidationFinding {
                        kind: FindingKind::MissingSpec,
                        category: category.to_string(),
                        product_id: Some(product.id.clone()),
                        spec: Some(key.clone()),
                        message: format!(
                            "product '{}' is missing specification '{}'",
                            product.name, key
                        ),
                    };
                    if strict {
                        errors.push(finding);
                    } else {
                        warnings.push(finding);
                    }
                }
            }
        }

        let can_proceed = if strict { errors.is_empty() } else { true };
        tracing::debug!(
            errors = errors.len(),
            warnings = warnings.len(),
            strict,
            can_proceed,
            "catalog validated"
        );

        ProductValidationReport {
            is_valid: errors.is_empty(),
            errors,
            warnings,
            can_proceed,
        }
    }
}

/// One-shot validation with the given config
pub fn validate_products(
    products: &[Product],
    required_categories: &[&str],
    config: &ValidationConfig,
) -> ProductValidationReport {
    ProductValidator::new(config.clone()).validate(products, required_categories)
}
