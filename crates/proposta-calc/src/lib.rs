//! Proposta Calc: per-domain material calculators
//!
//! Each calculator takes a domain input, a [`Catalog`](proposta_core::Catalog)
//! and a [`Strictness`](proposta_core::Strictness), and returns quantities,
//! itemized costs, proposal line items and validations. A `*_with_products`
//! wrapper builds the catalog from a product slice and applies the domain's
//! default policy.
//!
//! # Example
//!
//! ```
//! use proposta_calc::shingle::{calculate_shingle_with_products, ShingleCalculationInput};
//! use proposta_calc::factors::ShingleComplexity;
//!
//! let input = ShingleCalculationInput::new(100.0, 25.0, ShingleComplexity::Simple);
//! let result = calculate_shingle_with_products(&input, &[]).unwrap();
//!
//! assert_eq!(result.shingle_bundles, 38);
//! assert_eq!(result.shingle_price, 40.0);
//! ```

pub mod battery_backup;
pub mod drywall;
pub mod factors;
pub mod floor_leveling;
mod resolve;
pub mod shingle;
pub mod solar;
pub mod waterproofing;

pub use battery_backup::{
    calculate_battery_backup, calculate_battery_backup_with_products, BatteryBackupInput,
    BatteryBackupResult, CriticalLoad,
};
pub use drywall::{
    calculate_drywall_ceiling, calculate_drywall_ceiling_with_products, DrywallCeilingInput,
    DrywallCeilingResult,
};
pub use factors::{
    calculate_slope_correction_factor, slope_factor_nearest_below, CorrectionSet, ShingleComplexity,
    MIN_SHINGLE_SLOPE, SLOPE_TABLE,
};
pub use floor_leveling::{
    calculate_floor_leveling, calculate_floor_leveling_with_products, FloorLevelingInput,
    FloorLevelingResult,
};
pub use shingle::{
    calculate_shingle, calculate_shingle_roof, calculate_shingle_roof_with_products,
    calculate_shingle_with_products, RoofSection, ShingleCalculationInput, ShingleCalculationResult,
    ShingleRoofInput, ShingleRoofResult,
};
pub use solar::{
    calculate_solar, calculate_solar_advanced, calculate_solar_with_products,
    SolarCalculationInput, SolarCalculationResult,
};
pub use waterproofing::{
    calculate_waterproofing, calculate_waterproofing_mapei_with_products, WaterproofingInput,
    WaterproofingResult,
};
