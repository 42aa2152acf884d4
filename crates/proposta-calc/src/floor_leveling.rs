//! Self-leveling floor preparation

use crate::resolve::{non_negative, push_line, Placeholder, Resolver};
use proposta_core::{
    categories, ceil_units, CalcError, CalcResult, CalculationValidations, Catalog, CostSheet,
    FunctionalRole, ItemizedCosts, Product, ProductQuery, QuantifiedItem, Strictness,
};
use serde::{Deserialize, Serialize};

pub mod defaults {
    pub const CONSUMPTION_KG_M2_MM: f64 = 1.6;
    pub const WASTE: f64 = 1.05;
    pub const BAG_KG: f64 = 20.0;
    pub const PRIMER_MARGIN: f64 = 1.10;
    pub const PRIMER_COVERAGE_M2: f64 = 25.0;
    pub const STRIP_ROLL_M: f64 = 25.0;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubstrateCondition {
    #[default]
    Flat,
    Irregular,
    VeryIrregular,
}

impl SubstrateCondition {
    pub fn irregularity_factor(&self) -> f64 {
        match self {
            SubstrateCondition::Flat => 1.00,
            SubstrateCondition::Irregular => 1.10,
            SubstrateCondition::VeryIrregular => 1.20,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloorLevelingInput {
    pub area: f64,
    #[serde(default)]
    pub perimeter: Option<f64>,
    pub min_thickness_mm: f64,
    pub max_thickness_mm: f64,
    #[serde(default)]
    pub substrate_condition: SubstrateCondition,
    #[serde(default = "default_true")]
    pub include_primer: bool,
}

impl FloorLevelingInput {
    pub fn new(area: f64, min_thickness_mm: f64, max_thickness_mm: f64) -> Self {
        Self {
            area,
            perimeter: None,
            min_thickness_mm,
            max_thickness_mm,
            substrate_condition: SubstrateCondition::Flat,
            include_primer: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloorLevelingResult {
    pub average_thickness_mm: f64,
    pub consumption_kg_m2_mm: f64,
    pub irregularity_factor: f64,
    pub total_kg: f64,
    pub bags: u32,
    pub primer_units: u32,
    pub perimeter_strip_rolls: u32,
    #[serde(rename = "itemizedCosts")]
    pub itemized_costs: ItemizedCosts,
    #[serde(rename = "totalCost")]
    pub total_cost: f64,
    pub quantified_items: Vec<QuantifiedItem>,
    pub validations: CalculationValidations,
}

pub fn calculate_floor_leveling_with_products(
    input: &FloorLevelingInput,
    products: &[Product],
) -> CalcResult<FloorLevelingResult> {
    calculate_floor_leveling(input, &Catalog::new(products), Strictness::Lenient)
}

pub fn calculate_floor_leveling(
    input: &FloorLevelingInput,
    catalog: &Catalog,
    strictness: Strictness,
) -> CalcResult<FloorLevelingResult> {
    use defaults::*;

    let area = non_negative("area", input.area)?;
    let min_mm = non_negative("min_thickness_mm", input.min_thickness_mm)?;
    let max_mm = non_negative("max_thickness_mm", input.max_thickness_mm)?;
    if min_mm > max_mm {
        return Err(CalcError::InvalidInput(format!(
            "min_thickness_mm ({}) is greater than max_thickness_mm ({})",
            min_mm, max_mm
        )));
    }
    let perimeter = input
        .perimeter
        .map(|p| non_negative("perimeter", p))
        .transpose()?;

    let average_thickness_mm = (min_mm + max_mm) / 2.0;
    let irregularity_factor = input.substrate_condition.irregularity_factor();

    let mut resolver = Resolver::new(catalog, strictness);
    resolver
        .validations
        .record("positive_area", area > 0.0, "area is zero, no material was computed");

    let category = categories::FLOOR_PREP;
    let mut sheet = CostSheet::new();

    let compound = resolver.find(
        ProductQuery::new(FunctionalRole::LevelingCompound, category).keywords(&["autonivelante"]),
    )?;
    let specs = compound.map(|e| e.material()).unwrap_or_default();
    let consumption_kg_m2_mm = resolver.spec(
        specs.consumption_kg_m2_mm,
        compound,
        "consumption_kg_m2_mm",
        CONSUMPTION_KG_M2_MM,
    )?;
    let bag_kg = resolver.spec(specs.package_weight, compound, "package_weight", BAG_KG)?;

    if let (Some(lo), Some(hi)) = (specs.min_thickness_mm, specs.max_thickness_mm) {
        resolver.validations.record(
            "thickness_in_range",
            min_mm >= lo && max_mm <= hi,
            format!(
                "requested {}-{} mm is outside the product range {}-{} mm",
                min_mm, max_mm, lo, hi
            ),
        );
    }

    let total_kg = area * average_thickness_mm * consumption_kg_m2_mm * irregularity_factor * WASTE;
    let bags = ceil_units(total_kg, bag_kg);
    push_line(
        &mut sheet,
        "leveling_compound",
        compound,
        Placeholder::new("Autonivelante", "saco", 0.0),
        category,
        bags as f64,
        format!("{:.1} kg at {:.1} mm average", total_kg, average_thickness_mm),
    );

    let mut primer_units = 0;
    if input.include_primer {
        let primer_query =
            ProductQuery::new(FunctionalRole::Primer, category).keywords(&["primer"]);
        let primer = resolver.find_optional(primer_query)?;
        let coverage = primer
            .and_then(|e| e.material().coverage())
            .unwrap_or(PRIMER_COVERAGE_M2);
        primer_units = ceil_units(area * PRIMER_MARGIN, coverage);
        push_line(
            &mut sheet,
            "primer",
            primer,
            Placeholder::new("Primer para Autonivelante", "un", 0.0),
            category,
            primer_units as f64,
            "primer with 10% margin",
        );
    }

    let mut perimeter_strip_rolls = 0;
    if let Some(perimeter) = perimeter.filter(|p| *p > 0.0) {
        let strip = resolver.find_optional(
            ProductQuery::new(FunctionalRole::PerimeterStrip, category).keywords(&["perimetral"]),
        )?;
        let roll = strip.and_then(|e| e.material().length).unwrap_or(STRIP_ROLL_M);
        perimeter_strip_rolls = ceil_units(perimeter, roll);
        push_line(
            &mut sheet,
            "perimeter_strip",
            strip,
            Placeholder::new("Banda Perimetral", "rolo", 0.0),
            category,
            perimeter_strip_rolls as f64,
            format!("{:.2} m of perimeter", perimeter),
        );
    }

    let (quantified_items, itemized_costs, total_cost) = sheet.into_parts();
    tracing::debug!(area, total_kg, bags, total_cost, "floor leveling computed");

    Ok(FloorLevelingResult {
        average_thickness_mm,
        consumption_kg_m2_mm,
        irregularity_factor,
        total_kg,
        bags,
        primer_units,
        perimeter_strip_rolls,
        itemized_costs,
        total_cost,
        quantified_items,
        validations: resolver.validations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn compound() -> Product {
        Product::new("u", "Ultraplan Autonivelante 23kg", categories::FLOOR_PREP, 120.0)
            .with_specifications(json!({
                "consumption_kg_m2_mm": 1.6,
                "package_weight": 23,
                "min_thickness_mm": 1,
                "max_thickness_mm": 10
            }))
    }

    #[test]
    fn test_defaults() {
        let input = FloorLevelingInput::new(20.0, 3.0, 5.0);
        let result = calculate_floor_leveling_with_products(&input, &[]).unwrap();
        assert_eq!(result.average_thickness_mm, 4.0);
        // 20 * 4 * 1.6 * 1.05 = 134.4 kg
        assert!((result.total_kg - 134.4).abs() < 1e-9);
        assert_eq!(result.bags, 7);
        assert_eq!(result.primer_units, 1);
        assert_eq!(result.perimeter_strip_rolls, 0);
    }

    #[test]
    fn test_catalog_bag_weight_and_range() {
        let mut input = FloorLevelingInput::new(20.0, 3.0, 12.0);
        input.perimeter = Some(18.0);
        input.substrate_condition = SubstrateCondition::Irregular;
        let result = calculate_floor_leveling_with_products(&input, &[compound()]).unwrap();

        assert_eq!(result.irregularity_factor, 1.10);
        assert_eq!(result.bags, ceil_units(result.total_kg, 23.0));
        assert!(!result.validations.passed("thickness_in_range"));
        assert_eq!(result.perimeter_strip_rolls, 1);
        assert_eq!(result.itemized_costs.get("leveling_compound"), result.bags as f64 * 120.0);
    }

    #[test]
    fn test_inverted_range_rejected() {
        let input = FloorLevelingInput::new(20.0, 8.0, 3.0);
        let err = calculate_floor_leveling_with_products(&input, &[]).unwrap_err();
        assert_eq!(err.code(), "INPUT");
    }

    #[test]
    fn test_primer_optional() {
        let mut input = FloorLevelingInput::new(20.0, 3.0, 5.0);
        input.include_primer = false;
        let result = calculate_floor_leveling_with_products(&input, &[]).unwrap();
        assert_eq!(result.primer_units, 0);
        assert!(result.quantified_items.iter().all(|i| !i.name.contains("Primer")));
    }
}
