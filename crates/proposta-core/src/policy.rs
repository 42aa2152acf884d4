//! Fail-fast vs fallback policy
//!
//! Calculators take a [`Strictness`] argument instead of existing in two
//! near-duplicate variants. Strict calls fail on the first missing product,
//! spec or price; lenient calls substitute documented defaults and carry on.

use crate::catalog::CatalogEntry;
use crate::error::{CalcError, CalcResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Strictness {
    Strict,
    #[default]
    Lenient,
}

impl Strictness {
    pub fn is_strict(&self) -> bool {
        matches!(self, Strictness::Strict)
    }

    /// Resolve a product the calculation needs.
    ///
    /// Strict: absent → `MissingProduct`, unpriced → `ZeroPrice`.
    /// Lenient: passes the lookup through, logging what is missing.
    pub fn require<'a>(
        &self,
        found: Option<&'a CatalogEntry>,
        role: &str,
        category: &str,
    ) -> CalcResult<Option<&'a CatalogEntry>> {
        match (self, found) {
            (Strictness::Strict, None) => Err(CalcError::missing_product(role, category)),
            (Strictness::Strict, Some(entry)) if entry.product.is_unpriced() => {
                Err(CalcError::zero_price(entry.product.name.clone()))
            }
            (Strictness::Lenient, None) => {
                tracing::warn!(role, category, "product not found, using defaults");
                Ok(None)
            }
            (Strictness::Lenient, Some(entry)) => {
                if entry.product.is_unpriced() {
                    tracing::warn!(
                        product = %entry.product.id,
                        "product has no price, cost line will be zero"
                    );
                }
                Ok(Some(entry))
            }
            (Strictness::Strict, Some(entry)) => Ok(Some(entry)),
        }
    }

    /// Strict: fail if the category has no active product at all
    pub fn require_category(&self, available: usize, category: &str) -> CalcResult<()> {
        if available == 0 && self.is_strict() {
            return Err(CalcError::missing_category(category));
        }
        Ok(())
    }

    /// Resolve a numeric spec; lenient falls back to `default`
    pub fn spec(
        &self,
        value: Option<f64>,
        entry: Option<&CatalogEntry>,
        key: &str,
        default: f64,
    ) -> CalcResult<f64> {
        match value.filter(|v| v.is_finite() && *v > 0.0) {
            Some(v) => Ok(v),
            None if self.is_strict() => Err(CalcError::missing_spec(
                entry.map(|e| e.product.name.clone()).unwrap_or_else(|| "unknown".to_string()),
                key,
            )),
            None => {
                if let Some(entry) = entry {
                    tracing::warn!(
                        product = %entry.product.id,
                        spec = key,
                        default,
                        "spec missing, using default"
                    );
                }
                Ok(default)
            }
        }
    }
}

/// Unit price of an optional entry, or `default` when it is absent
pub fn price_or(entry: Option<&CatalogEntry>, default: f64) -> f64 {
    entry.map(|e| e.product.base_price.max(0.0)).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::Product;

    fn entry(price: f64) -> CatalogEntry {
        CatalogEntry::ingest(Product::new("p", "Painel 550W", "energia_solar", price))
    }

    #[test]
    fn test_strict_missing_product() {
        let err = Strictness::Strict.require(None, "solar-panel", "energia_solar").unwrap_err();
        assert!(err.to_string().contains("energia_solar"));
    }

    #[test]
    fn test_strict_zero_price() {
        let e = entry(0.0);
        let err = Strictness::Strict.require(Some(&e), "solar-panel", "energia_solar").unwrap_err();
        assert_eq!(err, CalcError::zero_price("Painel 550W"));
    }

    #[test]
    fn test_lenient_passes_through() {
        let e = entry(0.0);
        assert!(Strictness::Lenient.require(None, "osb", "c").unwrap().is_none());
        assert!(Strictness::Lenient.require(Some(&e), "osb", "c").unwrap().is_some());
    }

    #[test]
    fn test_spec_resolution() {
        let e = entry(10.0);
        assert_eq!(Strictness::Lenient.spec(None, Some(&e), "power", 550.0).unwrap(), 550.0);
        assert_eq!(Strictness::Strict.spec(Some(400.0), Some(&e), "power", 550.0).unwrap(), 400.0);
        let err = Strictness::Strict.spec(None, Some(&e), "power", 550.0).unwrap_err();
        assert_eq!(err, CalcError::missing_spec("Painel 550W", "power"));
    }

    #[test]
    fn test_require_category() {
        assert!(Strictness::Lenient.require_category(0, "x").is_ok());
        assert!(Strictness::Strict.require_category(0, "x").is_err());
        assert!(Strictness::Strict.require_category(2, "x").is_ok());
    }

    #[test]
    fn test_price_or() {
        let e = entry(12.5);
        assert_eq!(price_or(Some(&e), 40.0), 12.5);
        assert_eq!(price_or(None, 40.0), 40.0);
    }
}
