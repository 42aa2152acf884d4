//! Asphalt shingle roofing
//!
//! Two calculators live here on purpose. [`calculate_shingle`] is the
//! product-based quick estimate (single roof area, nearest-below slope
//! table, complexity waste only). [`calculate_shingle_roof`] works per roof
//! section with the exact-or-formula slope correction and extra valley waste.
//! Their numbers differ for the same roof and they are kept apart.

use crate::factors::{
    calculate_slope_correction_factor, slope_factor_nearest_below, ShingleComplexity,
    MIN_SHINGLE_SLOPE,
};
use crate::resolve::{non_negative, push_line, Placeholder, Resolver};
use proposta_core::{
    categories, ceil_units, CalcError, CalcResult, CalculationValidations, Catalog, CatalogEntry,
    CostSheet, FunctionalRole, ItemizedCosts, Product, ProductQuery, QuantifiedItem, Strictness,
};
use serde::{Deserialize, Serialize};

/// Constants used when the catalog lacks a product or spec
pub mod defaults {
    /// m² per shingle bundle
    pub const SHINGLE_COVERAGE_M2: f64 = 3.0;
    /// Price per bundle when no Oakridge product is registered
    pub const SHINGLE_PRICE: f64 = 40.0;
    /// 1.22 m x 2.44 m sheet
    pub const OSB_COVERAGE_M2: f64 = 2.98;
    pub const OSB_SAFETY_MARGIN: f64 = 1.05;
    pub const UNDERLAYMENT_COVERAGE_M2: f64 = 86.0;
    pub const UNDERLAYMENT_OVERLAP: f64 = 1.10;
    /// Linear meters per ridge cap bundle
    pub const RIDGE_CAP_LENGTH_M: f64 = 7.5;
    pub const STARTER_STRIP_LENGTH_M: f64 = 30.0;
    pub const VALLEY_FLASHING_LENGTH_M: f64 = 10.0;
    pub const VALLEY_FLASHING_OVERLAP: f64 = 1.10;
    pub const DRIP_EDGE_LENGTH_M: f64 = 3.0;
    pub const DRIP_EDGE_OVERLAP: f64 = 1.05;
    /// m² of roof per box of nails
    pub const NAILS_COVERAGE_M2: f64 = 15.0;
    /// Linear meters of ridge, hip and valley per sealant tube
    pub const SEALANT_LENGTH_M: f64 = 10.0;
}

const OAKRIDGE: &[&str] = &["oakridge"];
const OSB: &[&str] = &["osb"];
const UNDERLAYMENT: &[&str] = &["subcobertura"];
const RIDGE_CAP: &[&str] = &["cumeeira"];
const STARTER: &[&str] = &["starter"];
const VALLEY: &[&str] = &["agua", "furtada"];
const DRIP_EDGE: &[&str] = &["pingadeira"];
const NAILS: &[&str] = &["prego"];
const SEALANT: &[&str] = &["selante"];

fn query(role: FunctionalRole, keywords: &'static [&'static str]) -> ProductQuery<'static> {
    ProductQuery::new(role, categories::SHINGLE).keywords(keywords)
}

fn coverage_of(entry: Option<&CatalogEntry>) -> Option<f64> {
    entry.and_then(|e| e.material().coverage())
}

fn length_of(entry: Option<&CatalogEntry>) -> Option<f64> {
    entry.and_then(|e| e.material().length)
}

fn check_slope(slope: f64) -> CalcResult<f64> {
    if slope.is_finite() {
        Ok(slope)
    } else {
        Err(CalcError::InvalidInput(format!("roof slope must be a number, got {}", slope)))
    }
}

// ---------------------------------------------------------------------------
// Product-based estimate
// ---------------------------------------------------------------------------

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShingleCalculationInput {
    /// Projected (plan) roof area in m²
    pub roof_area: f64,
    /// Inclination in percent
    pub roof_slope: f64,
    #[serde(default)]
    pub complexity: ShingleComplexity,
    /// Ridge length in m; no ridge cap when zero
    #[serde(default)]
    pub ridge_length: f64,
    #[serde(default = "default_true")]
    pub include_osb: bool,
    #[serde(default = "default_true")]
    pub include_underlayment: bool,
}

impl ShingleCalculationInput {
    pub fn new(roof_area: f64, roof_slope: f64, complexity: ShingleComplexity) -> Self {
        Self {
            roof_area,
            roof_slope,
            complexity,
            ridge_length: 0.0,
            include_osb: true,
            include_underlayment: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShingleCalculationResult {
    pub slope_factor: f64,
    pub waste_factor: f64,
    /// Roof area corrected for slope
    pub real_area: f64,
    /// Real area plus waste
    pub total_area: f64,
    pub shingle_bundles: u32,
    pub shingle_price: f64,
    pub osb_sheets: u32,
    pub underlayment_rolls: u32,
    pub ridge_cap_bundles: u32,
    pub nail_boxes: u32,
    #[serde(rename = "itemizedCosts")]
    pub itemized_costs: ItemizedCosts,
    #[serde(rename = "totalCost")]
    pub total_cost: f64,
    pub quantified_items: Vec<QuantifiedItem>,
    pub validations: CalculationValidations,
}

/// Quick estimate with lenient fallbacks
pub fn calculate_shingle_with_products(
    input: &ShingleCalculationInput,
    products: &[Product],
) -> CalcResult<ShingleCalculationResult> {
    calculate_shingle(input, &Catalog::new(products), Strictness::Lenient)
}

pub fn calculate_shingle(
    input: &ShingleCalculationInput,
    catalog: &Catalog,
    strictness: Strictness,
) -> CalcResult<ShingleCalculationResult> {
    use defaults::*;

    let roof_area = non_negative("roof_area", input.roof_area)?;
    let roof_slope = check_slope(input.roof_slope)?;
    let ridge_length = non_negative("ridge_length", input.ridge_length)?;

    let slope_factor = slope_factor_nearest_below(roof_slope);
    let waste_factor = input.complexity.waste_factor();
    let real_area = roof_area * slope_factor;
    let total_area = real_area * waste_factor;

    let mut resolver = Resolver::new(catalog, strictness);
    resolver.validations.record(
        "positive_area",
        roof_area > 0.0,
        "roof area is zero, no material was computed",
    );
    resolver.validations.record(
        "slope_compliant",
        roof_slope >= MIN_SHINGLE_SLOPE,
        format!(
            "roof slope {}% is below the {}% minimum for shingles",
            roof_slope, MIN_SHINGLE_SLOPE
        ),
    );

    let mut sheet = CostSheet::new();
    let category = categories::SHINGLE;

    let shingle = resolver.find(query(FunctionalRole::ShingleMain, OAKRIDGE))?;
    let coverage =
        resolver.spec(coverage_of(shingle), shingle, "coverage_area", SHINGLE_COVERAGE_M2)?;
    let shingle_price = proposta_core::price_or(shingle, SHINGLE_PRICE);
    let shingle_bundles = ceil_units(total_area, coverage);
    push_line(
        &mut sheet,
        "shingles",
        shingle,
        Placeholder::new("Telha Shingle Oakridge", "fardo", SHINGLE_PRICE),
        category,
        shingle_bundles as f64,
        format!("{:.2} m² with {:.0}% waste", total_area, (waste_factor - 1.0) * 100.0),
    );

    let mut osb_sheets = 0;
    if input.include_osb {
        let osb = resolver.find(query(FunctionalRole::Osb, OSB))?;
        let coverage = resolver.spec(coverage_of(osb), osb, "coverage_area", OSB_COVERAGE_M2)?;
        osb_sheets = ceil_units(real_area * OSB_SAFETY_MARGIN, coverage);
        push_line(
            &mut sheet,
            "osb",
            osb,
            Placeholder::new("Chapa OSB", "chapa", 0.0),
            category,
            osb_sheets as f64,
            "roof deck with 5% safety margin",
        );
    }

    let mut underlayment_rolls = 0;
    if input.include_underlayment {
        let underlayment = resolver.find(query(FunctionalRole::Underlayment, UNDERLAYMENT))?;
        let coverage = resolver.spec(
            coverage_of(underlayment),
            underlayment,
            "coverage_area",
            UNDERLAYMENT_COVERAGE_M2,
        )?;
        underlayment_rolls = ceil_units(total_area, coverage);
        push_line(
            &mut sheet,
            "underlayment",
            underlayment,
            Placeholder::new("Subcobertura", "rolo", 0.0),
            category,
            underlayment_rolls as f64,
            "underlayment over the full treated area",
        );
    }

    let mut ridge_cap_bundles = 0;
    if ridge_length > 0.0 {
        let ridge = resolver.find(query(FunctionalRole::RidgeCap, RIDGE_CAP))?;
        let length = resolver.spec(length_of(ridge), ridge, "length", RIDGE_CAP_LENGTH_M)?;
        ridge_cap_bundles = ceil_units(ridge_length, length);
        push_line(
            &mut sheet,
            "ridge_cap",
            ridge,
            Placeholder::new("Cumeeira Shingle", "fardo", 0.0),
            category,
            ridge_cap_bundles as f64,
            format!("{:.2} m of ridge", ridge_length),
        );
    }

    let nails = resolver.find(query(FunctionalRole::Nails, NAILS))?;
    let nail_coverage =
        resolver.spec(coverage_of(nails), nails, "coverage_area", NAILS_COVERAGE_M2)?;
    let nail_boxes = ceil_units(total_area, nail_coverage);
    push_line(
        &mut sheet,
        "nails",
        nails,
        Placeholder::new("Prego para Shingle", "caixa", 0.0),
        category,
        nail_boxes as f64,
        "fasteners",
    );

    let (quantified_items, itemized_costs, total_cost) = sheet.into_parts();
    tracing::debug!(
        real_area,
        total_area,
        shingle_bundles,
        total_cost,
        "shingle estimate computed"
    );

    Ok(ShingleCalculationResult {
        slope_factor,
        waste_factor,
        real_area,
        total_area,
        shingle_bundles,
        shingle_price,
        osb_sheets,
        underlayment_rolls,
        ridge_cap_bundles,
        nail_boxes,
        itemized_costs,
        total_cost,
        quantified_items,
        validations: resolver.validations,
    })
}

// ---------------------------------------------------------------------------
// Sectioned roof
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoofSection {
    pub name: String,
    /// Plan area in m²
    pub projected_area: f64,
    /// Inclination in percent
    pub slope: f64,
}

impl RoofSection {
    pub fn new(name: impl Into<String>, projected_area: f64, slope: f64) -> Self {
        Self {
            name: name.into(),
            projected_area,
            slope,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShingleRoofInput {
    pub sections: Vec<RoofSection>,
    #[serde(default)]
    pub complexity: ShingleComplexity,
    #[serde(default)]
    pub ridge_length: f64,
    #[serde(default)]
    pub hip_length: f64,
    #[serde(default)]
    pub valley_length: f64,
    #[serde(default)]
    pub eave_length: f64,
    #[serde(default)]
    pub rake_length: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionBreakdown {
    pub name: String,
    pub projected_area: f64,
    pub slope: f64,
    pub slope_factor: f64,
    pub real_area: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShingleRoofQuantities {
    pub shingle_bundles: u32,
    pub osb_sheets: u32,
    pub underlayment_rolls: u32,
    pub starter_strip_bundles: u32,
    pub ridge_cap_bundles: u32,
    pub valley_flashing_rolls: u32,
    pub drip_edge_bars: u32,
    pub nail_boxes: u32,
    pub sealant_tubes: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShingleRoofResult {
    pub sections: Vec<SectionBreakdown>,
    pub real_area: f64,
    pub waste_factor: f64,
    pub total_area: f64,
    pub quantities: ShingleRoofQuantities,
    /// Sections below the minimum slope (advisory)
    pub low_slope_sections: Vec<String>,
    #[serde(rename = "itemizedCosts")]
    pub itemized_costs: ItemizedCosts,
    #[serde(rename = "totalCost")]
    pub total_cost: f64,
    pub quantified_items: Vec<QuantifiedItem>,
    pub validations: CalculationValidations,
}

/// Waste for the sectioned roof: complexity plus 1% per full 10 m of valley,
/// never above the very-complex factor
pub fn sectioned_waste_factor(complexity: ShingleComplexity, valley_length: f64) -> f64 {
    let valley_extra = 0.01 * (valley_length.max(0.0) / 10.0).floor();
    (complexity.waste_factor() + valley_extra).min(ShingleComplexity::VeryComplex.waste_factor())
}

pub fn calculate_shingle_roof_with_products(
    input: &ShingleRoofInput,
    products: &[Product],
) -> CalcResult<ShingleRoofResult> {
    calculate_shingle_roof(input, &Catalog::new(products), Strictness::Lenient)
}

pub fn calculate_shingle_roof(
    input: &ShingleRoofInput,
    catalog: &Catalog,
    strictness: Strictness,
) -> CalcResult<ShingleRoofResult> {
    use defaults::*;

    let ridge = non_negative("ridge_length", input.ridge_length)?;
    let hip = non_negative("hip_length", input.hip_length)?;
    let valley = non_negative("valley_length", input.valley_length)?;
    let eave = non_negative("eave_length", input.eave_length)?;
    let rake = non_negative("rake_length", input.rake_length)?;

    let mut sections = Vec::with_capacity(input.sections.len());
    let mut low_slope_sections = Vec::new();
    for section in &input.sections {
        let projected_area =
            non_negative(&format!("{} area", section.name), section.projected_area)?;
        let slope = check_slope(section.slope)?;
        let slope_factor = calculate_slope_correction_factor(slope);
        if slope < MIN_SHINGLE_SLOPE {
            low_slope_sections.push(section.name.clone());
        }
        sections.push(SectionBreakdown {
            name: section.name.clone(),
            projected_area,
            slope,
            slope_factor,
            real_area: projected_area * slope_factor,
        });
    }

    let real_area: f64 = sections.iter().map(|s| s.real_area).sum();
    let waste_factor = sectioned_waste_factor(input.complexity, valley);
    let total_area = real_area * waste_factor;

    let mut resolver = Resolver::new(catalog, strictness);
    resolver.validations.record(
        "positive_area",
        real_area > 0.0,
        "roof has no area, no material was computed",
    );
    resolver.validations.record(
        "slope_compliant",
        low_slope_sections.is_empty(),
        format!(
            "sections below the {}% minimum slope: {}",
            MIN_SHINGLE_SLOPE,
            low_slope_sections.join(", ")
        ),
    );

    let category = categories::SHINGLE;
    let mut sheet = CostSheet::new();
    let mut quantities = ShingleRoofQuantities::default();

    let shingle = resolver.find(query(FunctionalRole::ShingleMain, OAKRIDGE))?;
    let coverage =
        resolver.spec(coverage_of(shingle), shingle, "coverage_area", SHINGLE_COVERAGE_M2)?;
    quantities.shingle_bundles = ceil_units(total_area, coverage);
    push_line(
        &mut sheet,
        "shingles",
        shingle,
        Placeholder::new("Telha Shingle", "fardo", 0.0),
        category,
        quantities.shingle_bundles as f64,
        format!("{:.2} m² over {} sections", total_area, sections.len()),
    );

    let osb = resolver.find(query(FunctionalRole::Osb, OSB))?;
    let coverage = resolver.spec(coverage_of(osb), osb, "coverage_area", OSB_COVERAGE_M2)?;
    quantities.osb_sheets = ceil_units(real_area * OSB_SAFETY_MARGIN, coverage);
    push_line(
        &mut sheet,
        "osb",
        osb,
        Placeholder::new("Chapa OSB", "chapa", 0.0),
        category,
        quantities.osb_sheets as f64,
        "roof deck with 5% safety margin",
    );

    let underlayment = resolver.find(query(FunctionalRole::Underlayment, UNDERLAYMENT))?;
    let coverage = resolver.spec(
        coverage_of(underlayment),
        underlayment,
        "coverage_area",
        UNDERLAYMENT_COVERAGE_M2,
    )?;
    quantities.underlayment_rolls = ceil_units(real_area * UNDERLAYMENT_OVERLAP, coverage);
    push_line(
        &mut sheet,
        "underlayment",
        underlayment,
        Placeholder::new("Subcobertura", "rolo", 0.0),
        category,
        quantities.underlayment_rolls as f64,
        "underlayment with 10% overlap",
    );

    let perimeter = eave + rake;
    if perimeter > 0.0 {
        let starter = resolver.find(query(FunctionalRole::StarterStrip, STARTER))?;
        let length = resolver.spec(length_of(starter), starter, "length", STARTER_STRIP_LENGTH_M)?;
        quantities.starter_strip_bundles = ceil_units(perimeter, length);
        push_line(
            &mut sheet,
            "starter_strip",
            starter,
            Placeholder::new("Starter Shingle", "fardo", 0.0),
            category,
            quantities.starter_strip_bundles as f64,
            format!("{:.2} m of eaves and rakes", perimeter),
        );

        let drip = resolver.find(query(FunctionalRole::DripEdge, DRIP_EDGE))?;
        let length = resolver.spec(length_of(drip), drip, "length", DRIP_EDGE_LENGTH_M)?;
        quantities.drip_edge_bars = ceil_units(perimeter * DRIP_EDGE_OVERLAP, length);
        push_line(
            &mut sheet,
            "drip_edge",
            drip,
            Placeholder::new("Pingadeira", "barra", 0.0),
            category,
            quantities.drip_edge_bars as f64,
            "drip edge with 5% overlap",
        );
    }

    let ridge_and_hip = ridge + hip;
    if ridge_and_hip > 0.0 {
        let cap = resolver.find(query(FunctionalRole::RidgeCap, RIDGE_CAP))?;
        let length = resolver.spec(length_of(cap), cap, "length", RIDGE_CAP_LENGTH_M)?;
        quantities.ridge_cap_bundles = ceil_units(ridge_and_hip, length);
        push_line(
            &mut sheet,
            "ridge_cap",
            cap,
            Placeholder::new("Cumeeira Shingle", "fardo", 0.0),
            category,
            quantities.ridge_cap_bundles as f64,
            format!("{:.2} m of ridges and hips", ridge_and_hip),
        );
    }

    if valley > 0.0 {
        let flashing = resolver.find(query(FunctionalRole::ValleyFlashing, VALLEY))?;
        let length =
            resolver.spec(length_of(flashing), flashing, "length", VALLEY_FLASHING_LENGTH_M)?;
        quantities.valley_flashing_rolls = ceil_units(valley * VALLEY_FLASHING_OVERLAP, length);
        push_line(
            &mut sheet,
            "valley_flashing",
            flashing,
            Placeholder::new("Fita para Agua Furtada", "rolo", 0.0),
            category,
            quantities.valley_flashing_rolls as f64,
            format!("{:.2} m of valleys", valley),
        );
    }

    let nails = resolver.find(query(FunctionalRole::Nails, NAILS))?;
    let nail_coverage =
        resolver.spec(coverage_of(nails), nails, "coverage_area", NAILS_COVERAGE_M2)?;
    quantities.nail_boxes = ceil_units(total_area, nail_coverage);
    push_line(
        &mut sheet,
        "nails",
        nails,
        Placeholder::new("Prego para Shingle", "caixa", 0.0),
        category,
        quantities.nail_boxes as f64,
        "fasteners",
    );

    let sealed_length = ridge + hip + valley;
    if real_area > 0.0 {
        let sealant = resolver.find(query(FunctionalRole::Sealant, SEALANT))?;
        let length = resolver.spec(length_of(sealant), sealant, "length", SEALANT_LENGTH_M)?;
        quantities.sealant_tubes = ceil_units(sealed_length, length).max(1);
        push_line(
            &mut sheet,
            "sealant",
            sealant,
            Placeholder::new("Selante Asfaltico", "tubo", 0.0),
            category,
            quantities.sealant_tubes as f64,
            "sealing of ridges, hips, valleys and flashings",
        );
    }

    let (quantified_items, itemized_costs, total_cost) = sheet.into_parts();
    tracing::debug!(
        sections = sections.len(),
        real_area,
        total_area,
        total_cost,
        "sectioned shingle roof computed"
    );

    Ok(ShingleRoofResult {
        sections,
        real_area,
        waste_factor,
        total_area,
        quantities,
        low_slope_sections,
        itemized_costs,
        total_cost,
        quantified_items,
        validations: resolver.validations,
    })
}
