//! Conversion of continuous demand into purchasable units

use crate::error::{CalcError, CalcResult};
use crate::product::Product;
use crate::specs::{get_product_specs, MaterialSpecs};

/// Relative float noise ignored before rounding up, so 2.88 * 10 / 2.88 =
/// 10.000000000000002 is 10 units while 10.0000000005 is still 11.
const CEIL_RELATIVE_TOLERANCE: f64 = 1e-12;

/// `ceil(demand / per_unit)`; non-positive or non-finite demand needs no units
pub fn ceil_units(demand: f64, per_unit: f64) -> u32 {
    if !demand.is_finite() || demand <= 0.0 || !per_unit.is_finite() || per_unit <= 0.0 {
        return 0;
    }
    let quotient = demand / per_unit;
    let units = (quotient - quotient * CEIL_RELATIVE_TOLERANCE).ceil();
    if units >= u32::MAX as f64 {
        u32::MAX
    } else {
        units.max(0.0) as u32
    }
}

/// `a * b` unit counts; a product beyond `u32` is rejected as input
pub fn multiply_units(a: u32, b: u32, what: &str) -> CalcResult<u32> {
    a.checked_mul(b).ok_or_else(|| {
        CalcError::InvalidInput(format!(
            "{} quantity ({} x {}) exceeds the supported range",
            what, a, b
        ))
    })
}

/// `ceil(span / spacing) + 1` rows or points along a span
pub fn rows_along(span: f64, spacing: f64, what: &str) -> CalcResult<u32> {
    let rows = (span / spacing).ceil() + 1.0;
    if rows.is_finite() && rows <= u32::MAX as f64 {
        Ok(rows.max(0.0) as u32)
    } else {
        Err(CalcError::InvalidInput(format!(
            "{} count for a {} m span exceeds the supported range",
            what, span
        )))
    }
}

/// Units of `product` needed for `total_area` m² after waste.
///
/// Coverage comes from `coverage_area`, then `yield_per_unit`. A product
/// with neither is counted at 1 m² per unit, which is almost always wrong
/// for real catalog data; the fallback is logged so it can be fixed at the
/// catalog instead of silently here.
pub fn calculate_quantity_from_specs(total_area: f64, product: &Product, waste_factor: f64) -> u32 {
    let specs = MaterialSpecs::from_bag(&get_product_specs(product));
    let coverage = specs.coverage().unwrap_or_else(|| {
        tracing::warn!(product = %product.id, "no coverage spec, assuming 1 m² per unit");
        1.0
    });
    ceil_units(total_area * waste_factor, coverage)
}

/// Round a currency amount to cents
pub fn round_currency(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
