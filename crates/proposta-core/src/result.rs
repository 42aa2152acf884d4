//! Shared result building blocks
//!
//! Every calculator returns quantities, an itemized cost map, a list of
//! quantified line items ready for a proposal document, and a validation
//! summary. These types keep those four parts consistent.

use crate::catalog::CatalogEntry;
use crate::quantity::round_currency;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A line item for inclusion in a proposal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantifiedItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    pub name: String,
    pub description: String,
    pub quantity: f64,
    pub unit: String,
    pub unit_price: f64,
    pub total_price: f64,
    pub category: String,
    #[serde(default)]
    pub specifications: Value,
}

impl QuantifiedItem {
    pub fn new(
        name: impl Into<String>,
        quantity: f64,
        unit: impl Into<String>,
        unit_price: f64,
        category: impl Into<String>,
    ) -> Self {
        Self {
            product_id: None,
            name: name.into(),
            description: String::new(),
            quantity,
            unit: unit.into(),
            unit_price,
            total_price: round_currency(quantity * unit_price),
            category: category.into(),
            specifications: Value::Object(Default::default()),
        }
    }

    /// Item priced from a catalog entry
    pub fn from_entry(entry: &CatalogEntry, quantity: f64) -> Self {
        Self {
            product_id: Some(entry.product.id.clone()),
            specifications: entry.specs.to_value(),
            ..Self::new(
                entry.product.name.clone(),
                quantity,
                entry.product.unit.clone(),
                entry.product.base_price,
                entry.product.category.clone(),
            )
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Named cost buckets; the sum of all buckets is the total cost
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemizedCosts(BTreeMap<String, f64>);

impl ItemizedCosts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add to a bucket (buckets accumulate)
    pub fn add(&mut self, bucket: impl Into<String>, amount: f64) {
        *self.0.entry(bucket.into()).or_insert(0.0) += amount;
    }

    pub fn get(&self, bucket: &str) -> f64 {
        self.0.get(bucket).copied().unwrap_or(0.0)
    }

    pub fn total(&self) -> f64 {
        round_currency(self.0.values().sum())
    }

    pub fn buckets(&self) -> impl Iterator<Item = (&String, &f64)> {
        self.0.iter()
    }
}

/// Items and their cost buckets, accumulated together
#[derive(Debug, Clone, Default)]
pub struct CostSheet {
    pub items: Vec<QuantifiedItem>,
    pub costs: ItemizedCosts,
}

impl CostSheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an item under a cost bucket; zero-quantity items are skipped
    pub fn push(&mut self, bucket: &str, item: QuantifiedItem) {
        if item.quantity <= 0.0 {
            return;
        }
        self.costs.add(bucket, item.total_price);
        self.items.push(item);
    }

    pub fn total(&self) -> f64 {
        self.costs.total()
    }

    pub fn into_parts(self) -> (Vec<QuantifiedItem>, ItemizedCosts, f64) {
        let total = self.costs.total();
        (self.items, self.costs, total)
    }
}

/// A human-readable finding attached to a result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationMessage {
    pub code: String,
    pub message: String,
}

/// Named pass/fail checks plus messages for the failing ones
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalculationValidations {
    pub checks: BTreeMap<String, bool>,
    pub messages: Vec<ValidationMessage>,
}

impl CalculationValidations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a check; the message is kept only when it failed
    pub fn record(&mut self, code: &str, passed: bool, message: impl Into<String>) {
        let passed_so_far = self.passed(code);
        self.checks.insert(code.to_string(), passed && passed_so_far);
        if !passed {
            self.messages.push(ValidationMessage {
                code: code.to_string(),
                message: message.into(),
            });
        }
    }

    /// Check result; unrecorded checks count as passed
    pub fn passed(&self, code: &str) -> bool {
        self.checks.get(code).copied().unwrap_or(true)
    }

    pub fn all_passed(&self) -> bool {
        self.checks.values().all(|v| *v)
    }
}
