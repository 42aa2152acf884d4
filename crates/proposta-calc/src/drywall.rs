//! Drywall ceilings: boards, profiles, hangers and finishing

use crate::resolve::{non_negative, push_line, Placeholder, Resolver};
use proposta_core::{
    calculate_quantity_from_specs, categories, ceil_units, multiply_units, rows_along, CalcResult,
    CalculationValidations, Catalog, CatalogEntry, CostSheet, FunctionalRole, ItemizedCosts,
    Product, ProductQuery, QuantifiedItem, Strictness,
};
use serde::{Deserialize, Serialize};

pub mod defaults {
    /// 1.20 m x 2.40 m board
    pub const BOARD_AREA_M2: f64 = 2.88;
    pub const BOARD_WASTE: f64 = 1.10;
    pub const PROFILE_SPACING_M: f64 = 0.6;
    pub const HANGER_SPACING_M: f64 = 1.2;
    pub const BAR_LENGTH_M: f64 = 3.0;
    pub const LINEAR_WASTE: f64 = 1.05;
    pub const SCREWS_PER_M2: f64 = 25.0;
    pub const SCREWS_PER_BOX: f64 = 1000.0;
    pub const COMPOUND_KG_PER_M2: f64 = 0.5;
    pub const COMPOUND_PACKAGE_KG: f64 = 20.0;
    pub const TAPE_M_PER_M2: f64 = 1.5;
    pub const TAPE_ROLL_M: f64 = 150.0;
    pub const INSULATION_WASTE: f64 = 1.05;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoardType {
    #[default]
    Standard,
    MoistureResistant,
    FireResistant,
}

impl BoardType {
    /// Name keywords used when the catalog has no roles
    fn keywords(&self) -> &'static [&'static str] {
        match self {
            BoardType::Standard => &["placa", "st"],
            BoardType::MoistureResistant => &["placa", "ru"],
            BoardType::FireResistant => &["placa", "rf"],
        }
    }

    fn label(&self) -> &'static str {
        match self {
            BoardType::Standard => "Placa Drywall ST",
            BoardType::MoistureResistant => "Placa Drywall RU",
            BoardType::FireResistant => "Placa Drywall RF",
        }
    }
}

fn default_profile_spacing() -> f64 {
    defaults::PROFILE_SPACING_M
}

fn default_hanger_spacing() -> f64 {
    defaults::HANGER_SPACING_M
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrywallCeilingInput {
    pub length: f64,
    pub width: f64,
    #[serde(default)]
    pub board_type: BoardType,
    #[serde(default = "default_profile_spacing")]
    pub profile_spacing: f64,
    #[serde(default = "default_hanger_spacing")]
    pub hanger_spacing: f64,
    #[serde(default)]
    pub include_insulation: bool,
}

impl DrywallCeilingInput {
    pub fn new(length: f64, width: f64) -> Self {
        Self {
            length,
            width,
            board_type: BoardType::Standard,
            profile_spacing: defaults::PROFILE_SPACING_M,
            hanger_spacing: defaults::HANGER_SPACING_M,
            include_insulation: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrywallQuantities {
    pub boards: u32,
    pub profile_rows: u32,
    pub profile_bars: u32,
    pub perimeter_angle_bars: u32,
    pub hangers: u32,
    pub screw_boxes: u32,
    pub joint_compound_packages: u32,
    pub joint_tape_rolls: u32,
    pub insulation_units: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrywallCeilingResult {
    pub area: f64,
    pub perimeter: f64,
    pub quantities: DrywallQuantities,
    #[serde(rename = "itemizedCosts")]
    pub itemized_costs: ItemizedCosts,
    #[serde(rename = "totalCost")]
    pub total_cost: f64,
    pub quantified_items: Vec<QuantifiedItem>,
    pub validations: CalculationValidations,
}

fn query(role: FunctionalRole, keywords: &'static [&'static str]) -> ProductQuery<'static> {
    ProductQuery::new(role, categories::DRYWALL).keywords(keywords)
}

fn coverage_of(entry: Option<&CatalogEntry>) -> Option<f64> {
    entry.and_then(|e| e.material().coverage())
}

fn positive_spacing(name: &str, value: f64) -> CalcResult<f64> {
    let value = non_negative(name, value)?;
    if value > 0.0 {
        Ok(value)
    } else {
        Err(proposta_core::CalcError::InvalidInput(format!("{} must be greater than zero", name)))
    }
}

pub fn calculate_drywall_ceiling_with_products(
    input: &DrywallCeilingInput,
    products: &[Product],
) -> CalcResult<DrywallCeilingResult> {
    calculate_drywall_ceiling(input, &Catalog::new(products), Strictness::Lenient)
}

pub fn calculate_drywall_ceiling(
    input: &DrywallCeilingInput,
    catalog: &Catalog,
    strictness: Strictness,
) -> CalcResult<DrywallCeilingResult> {
    use defaults::*;

    let length = non_negative("length", input.length)?;
    let width = non_negative("width", input.width)?;
    let profile_spacing = positive_spacing("profile_spacing", input.profile_spacing)?;
    let hanger_spacing = positive_spacing("hanger_spacing", input.hanger_spacing)?;

    let area = length * width;
    let perimeter = 2.0 * (length + width);

    let mut resolver = Resolver::new(catalog, strictness);
    resolver
        .validations
        .record("positive_area", area > 0.0, "ceiling area is zero, no material was computed");

    let category = categories::DRYWALL;
    let mut sheet = CostSheet::new();
    let mut q = DrywallQuantities::default();

    let board = resolver.find(query(FunctionalRole::DrywallBoard, input.board_type.keywords()))?;
    let board_area = resolver.spec(coverage_of(board), board, "coverage_area", BOARD_AREA_M2)?;
    q.boards = ceil_units(area * BOARD_WASTE, board_area);
    push_line(
        &mut sheet,
        "boards",
        board,
        Placeholder::new(input.board_type.label(), "placa", 0.0),
        category,
        q.boards as f64,
        format!("{:.2} m² with 10% waste", area),
    );

    if area > 0.0 {
        q.profile_rows = rows_along(width, profile_spacing, "profile row")?;
        let hangers_per_row = rows_along(length, hanger_spacing, "hanger")?;
        q.hangers = multiply_units(q.profile_rows, hangers_per_row, "hanger")?;
    }

    let profile = resolver.find(query(FunctionalRole::DrywallProfile, &["perfil", "f530"]))?;
    let profile_length = profile.and_then(|e| e.material().length);
    let bar = resolver.spec(profile_length, profile, "length", BAR_LENGTH_M)?;
    let profile_meters = q.profile_rows as f64 * length * LINEAR_WASTE;
    q.profile_bars = ceil_units(profile_meters, bar);
    push_line(
        &mut sheet,
        "profiles",
        profile,
        Placeholder::new("Perfil F530", "barra", 0.0),
        category,
        q.profile_bars as f64,
        format!("{} rows, {:.2} linear m", q.profile_rows, profile_meters),
    );

    let angle = resolver.find(query(FunctionalRole::PerimeterAngle, &["cantoneira"]))?;
    let angle_length = angle.and_then(|e| e.material().length);
    let bar = resolver.spec(angle_length, angle, "length", BAR_LENGTH_M)?;
    q.perimeter_angle_bars = ceil_units(perimeter * LINEAR_WASTE, bar);
    push_line(
        &mut sheet,
        "perimeter_angle",
        angle,
        Placeholder::new("Cantoneira de Perimetro", "barra", 0.0),
        category,
        q.perimeter_angle_bars as f64,
        format!("{:.2} m of perimeter", perimeter),
    );

    let hanger = resolver.find(query(FunctionalRole::Hanger, &["regulador"]))?;
    push_line(
        &mut sheet,
        "hangers",
        hanger,
        Placeholder::new("Regulador de Suspensao", "un", 0.0),
        category,
        q.hangers as f64,
        format!("every {:.2} m along each row", hanger_spacing),
    );

    let screws = resolver.find(query(FunctionalRole::Screws, &["parafuso"]))?;
    let per_box = resolver.spec(
        screws.and_then(|e| e.material().units_per_package),
        screws,
        "units_per_package",
        SCREWS_PER_BOX,
    )?;
    q.screw_boxes = ceil_units(area * SCREWS_PER_M2, per_box);
    push_line(
        &mut sheet,
        "screws",
        screws,
        Placeholder::new("Parafuso Drywall", "caixa", 0.0),
        category,
        q.screw_boxes as f64,
        "25 screws per m²",
    );

    let compound = resolver.find(query(FunctionalRole::JointCompound, &["massa", "junta"]))?;
    let package = resolver.spec(
        compound.and_then(|e| e.material().package_weight),
        compound,
        "package_weight",
        COMPOUND_PACKAGE_KG,
    )?;
    q.joint_compound_packages = ceil_units(area * COMPOUND_KG_PER_M2, package);
    push_line(
        &mut sheet,
        "joint_compound",
        compound,
        Placeholder::new("Massa para Junta", "balde", 0.0),
        category,
        q.joint_compound_packages as f64,
        "0.5 kg per m²",
    );

    let tape = resolver.find(query(FunctionalRole::JointTape, &["fita"]))?;
    let roll = resolver.spec(tape.and_then(|e| e.material().length), tape, "length", TAPE_ROLL_M)?;
    q.joint_tape_rolls = ceil_units(area * TAPE_M_PER_M2, roll);
    push_line(
        &mut sheet,
        "joint_tape",
        tape,
        Placeholder::new("Fita para Junta", "rolo", 0.0),
        category,
        q.joint_tape_rolls as f64,
        "1.5 m per m²",
    );

    if input.include_insulation {
        let insulation = resolver.find(query(FunctionalRole::Insulation, &["la", "vidro"]))?;
        q.insulation_units = match insulation {
            Some(entry) => calculate_quantity_from_specs(area, &entry.product, INSULATION_WASTE),
            None => ceil_units(area * INSULATION_WASTE, 1.0),
        };
        push_line(
            &mut sheet,
            "insulation",
            insulation,
            Placeholder::new("La de Vidro", "m²", 0.0),
            category,
            q.insulation_units as f64,
            "thermal/acoustic insulation with 5% waste",
        );
    }

    let (quantified_items, itemized_costs, total_cost) = sheet.into_parts();
    tracing::debug!(area, boards = q.boards, total_cost, "drywall ceiling computed");

    Ok(DrywallCeilingResult {
        area,
        perimeter,
        quantities: q,
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

    #[test]
    fn test_defaults_for_five_by_four_room() {
        let input = DrywallCeilingInput::new(5.0, 4.0);
        let result = calculate_drywall_ceiling_with_products(&input, &[]).unwrap();
        let q = &result.quantities;

        assert_eq!(result.area, 20.0);
        assert_eq!(q.boards, 8); // 22 m² / 2.88
        assert_eq!(q.profile_rows, 8); // ceil(4 / 0.6) + 1
        assert_eq!(q.profile_bars, 14); // 8 * 5 * 1.05 = 42 m / 3
        assert_eq!(q.perimeter_angle_bars, 7); // 18.9 m / 3
        assert_eq!(q.hangers, 48); // 8 * (ceil(5 / 1.2) + 1)
        assert_eq!(q.screw_boxes, 1);
        assert_eq!(q.joint_compound_packages, 1);
        assert_eq!(q.joint_tape_rolls, 1);
        assert_eq!(q.insulation_units, 0);
    }

    #[test]
    fn test_catalog_prices_flow_into_costs() {
        let products = vec![
            Product::new("b", "Placa Drywall ST 12,5mm", categories::DRYWALL, 38.0)
                .with_specifications(json!({ "coverage_area": 2.88 })),
            Product::new("m", "Massa para Junta 20kg", categories::DRYWALL, 90.0)
                .with_specifications(json!({ "package_weight": 20 })),
        ];
        let input = DrywallCeilingInput::new(5.0, 4.0);
        let result = calculate_drywall_ceiling_with_products(&input, &products).unwrap();

        assert_eq!(result.itemized_costs.get("boards"), 8.0 * 38.0);
        assert_eq!(result.itemized_costs.get("joint_compound"), 90.0);
        assert_eq!(result.total_cost, 8.0 * 38.0 + 90.0);
    }

    #[test]
    fn test_insulation_uses_product_coverage() {
        let products = vec![Product::new("l", "La de Vidro 50mm", categories::DRYWALL, 120.0)
            .with_role(FunctionalRole::Insulation)
            .with_specifications(json!({ "coverage_area": 15.0 }))];
        let mut input = DrywallCeilingInput::new(5.0, 4.0);
        input.include_insulation = true;
        let result = calculate_drywall_ceiling_with_products(&input, &products).unwrap();
        assert_eq!(result.quantities.insulation_units, 2); // 21 m² / 15
    }

    #[test]
    fn test_zero_spacing_rejected() {
        let mut input = DrywallCeilingInput::new(5.0, 4.0);
        input.profile_spacing = 0.0;
        let err = calculate_drywall_ceiling_with_products(&input, &[]).unwrap_err();
        assert_eq!(err.code(), "INPUT");
    }

    #[test]
    fn test_strict_fails_without_board() {
        let input = DrywallCeilingInput::new(5.0, 4.0);
        let err =
            calculate_drywall_ceiling(&input, &Catalog::new(&[]), Strictness::Strict).unwrap_err();
        assert_eq!(err.code(), "CATALOG");
    }

    #[test]
    fn test_standard_board_ignores_words_containing_st() {
        let products = vec![
            Product::new("ru", "Placa Drywall RU Resistente a Umidade", categories::DRYWALL, 55.0),
            Product::new("st", "Placa Drywall ST 12,5mm", categories::DRYWALL, 38.0),
        ];
        let input = DrywallCeilingInput::new(5.0, 4.0);
        let result = calculate_drywall_ceiling_with_products(&input, &products).unwrap();
        assert_eq!(result.itemized_costs.get("boards"), 8.0 * 38.0);

        let mut input = DrywallCeilingInput::new(5.0, 4.0);
        input.board_type = BoardType::MoistureResistant;
        let result = calculate_drywall_ceiling_with_products(&input, &products).unwrap();
        assert_eq!(result.itemized_costs.get("boards"), 8.0 * 55.0);
    }

    #[test]
    fn test_huge_ceiling_is_an_input_error() {
        let input = DrywallCeilingInput::new(60_000.0, 60_000.0);
        let err = calculate_drywall_ceiling_with_products(&input, &[]).unwrap_err();
        assert_eq!(err.code(), "INPUT");
        assert!(err.to_string().contains("hanger"));
    }
}
