//! Product resolution shared by the calculators

use proposta_core::{
    CalcResult, CalculationValidations, Catalog, CatalogEntry, CostSheet, ProductQuery,
    QuantifiedItem, Strictness,
};

/// Name, unit and price used for a line whose product is not in the catalog
#[derive(Debug, Clone, Copy)]
pub(crate) struct Placeholder {
    pub name: &'static str,
    pub unit: &'static str,
    pub price: f64,
}

impl Placeholder {
    pub const fn new(name: &'static str, unit: &'static str, price: f64) -> Self {
        Self { name, unit, price }
    }
}

/// Looks products up under a strictness policy and records availability
pub(crate) struct Resolver<'c> {
    catalog: &'c Catalog,
    strictness: Strictness,
    pub validations: CalculationValidations,
}

impl<'c> Resolver<'c> {
    pub fn new(catalog: &'c Catalog, strictness: Strictness) -> Self {
        Self {
            catalog,
            strictness,
            validations: CalculationValidations::new(),
        }
    }

    /// Locate the product for a role, failing under strict policy
    pub fn find(&mut self, query: ProductQuery<'_>) -> CalcResult<Option<&'c CatalogEntry>> {
        let found = self.catalog.locate(&query);
        self.accept(found, &query)
    }

    /// Locate an accessory: absence never fails, a zero price still does
    /// under strict policy
    pub fn find_optional(
        &mut self,
        query: ProductQuery<'_>,
    ) -> CalcResult<Option<&'c CatalogEntry>> {
        match self.catalog.locate(&query) {
            Some(entry) => self.accept(Some(entry), &query),
            None => {
                tracing::warn!(
                    role = query.role.as_str(),
                    category = query.category,
                    "optional product not found"
                );
                self.validations.record(
                    "products_available",
                    false,
                    format!(
                        "no product registered for '{}' in category '{}', line priced at zero",
                        query.role.as_str(),
                        query.category
                    ),
                );
                Ok(None)
            }
        }
    }

    /// Apply the policy to an already-selected product
    pub fn accept(
        &mut self,
        found: Option<&'c CatalogEntry>,
        query: &ProductQuery<'_>,
    ) -> CalcResult<Option<&'c CatalogEntry>> {
        let role = query.role.as_str();
        let found = self.strictness.require(found, role, query.category)?;
        self.validations.record(
            "products_available",
            found.is_some(),
            format!(
                "no product registered for '{}' in category '{}', default values used",
                role, query.category
            ),
        );
        if let Some(entry) = found {
            self.validations.record(
                "prices_configured",
                !entry.product.is_unpriced(),
                format!("product '{}' has no price configured", entry.product.name),
            );
        }
        Ok(found)
    }

    pub fn spec(
        &self,
        value: Option<f64>,
        entry: Option<&CatalogEntry>,
        key: &str,
        default: f64,
    ) -> CalcResult<f64> {
        self.strictness.spec(value, entry, key, default)
    }
}

/// Push a line priced from the entry, or from the placeholder when absent
pub(crate) fn push_line(
    sheet: &mut CostSheet,
    bucket: &str,
    entry: Option<&CatalogEntry>,
    placeholder: Placeholder,
    category: &str,
    quantity: f64,
    description: impl Into<String>,
) {
    let item = match entry {
        Some(entry) => QuantifiedItem::from_entry(entry, quantity),
        None => QuantifiedItem::new(
            placeholder.name,
            quantity,
            placeholder.unit,
            placeholder.price,
            category,
        ),
    };
    sheet.push(bucket, item.with_description(description));
}

/// Reject negative or non-finite geometry
pub(crate) fn non_negative(name: &str, value: f64) -> CalcResult<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(proposta_core::CalcError::InvalidInput(format!(
            "{} must be a non-negative number, got {}",
            name, value
        )))
    }
}
