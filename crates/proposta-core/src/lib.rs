//! Proposta Core: catalog model and shared calculation types
//!
//! The calculators in `proposta-calc` consume a product catalog supplied by
//! the caller and produce quantities, itemized costs, proposal line items and
//! validations. This crate holds everything those calculators share.
//!
//! # Example
//!
//! ```
//! use proposta_core::{calculate_quantity_from_specs, Product};
//! use serde_json::json;
//!
//! let bundle = Product::new("s1", "Telha Oakridge", "telhas_shingle", 40.0)
//!     .with_specifications(json!({ "coverage_area": 3.0 }));
//!
//! assert_eq!(calculate_quantity_from_specs(100.0, &bundle, 1.0), 34);
//! ```

pub mod catalog;
pub mod error;
pub mod policy;
pub mod product;
pub mod quantity;
pub mod result;
pub mod specs;

pub use catalog::{
    normalize_name, smallest_adequate, Catalog, CatalogEntry, ProductQuery, SizedSelection,
};
pub use error::{CalcError, CalcResult};
pub use policy::{price_or, Strictness};
pub use product::{categories, FunctionalRole, Product};
pub use quantity::{
    calculate_quantity_from_specs, ceil_units, multiply_units, round_currency, rows_along,
};
pub use result::{
    CalculationValidations, CostSheet, ItemizedCosts, QuantifiedItem, ValidationMessage,
};
pub use specs::{
    get_product_specs, BatterySpecs, InverterSpecs, MaterialSpecs, PanelSpecs, ProductSpecs,
    SpecBag, SpecKind, SPEC_SCHEMA_VERSION,
};
