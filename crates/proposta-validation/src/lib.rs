//! Proposta Validation: catalog completeness checks
//!
//! Checks that each required category has active products, that those
//! products are priced, and optionally that they carry the specifications
//! the calculators read. A [`ValidationConfig`] decides whether findings
//! are errors or warnings.
//!
//! # Example
//!
//! ```
//! use proposta_validation::{validate_products, ValidationConfig};
//!
//! let report = validate_products(&[], &["battery_backup"], &ValidationConfig::lenient());
//! assert!(report.can_proceed);
//! assert_eq!(report.warnings.len(), 1);
//! ```

pub mod config;
pub mod error;
pub mod validator;

pub use config::{RequiredSpecs, ValidationConfig};
pub use error::ConfigError;
pub use validator::{
    validate_products, FindingKind, ProductValidationReport, ProductValidator, ValidationFinding,
};
