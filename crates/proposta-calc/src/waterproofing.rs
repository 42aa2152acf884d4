//! Waterproofing systems (Mapei line)
//!
//! Membrane demand is driven by the treated area including upturns, the
//! thickness the exposure class calls for, and the product's consumption
//! spec. Site factors multiply the consumption and are capped together.

use crate::factors::CorrectionSet;
use crate::resolve::{non_negative, push_line, Placeholder, Resolver};
use proposta_core::{
    categories, ceil_units, CalcResult, CalculationValidations, Catalog, CatalogEntry, CostSheet,
    FunctionalRole, ItemizedCosts, Product, ProductQuery, QuantifiedItem, Strictness,
};
use serde::{Deserialize, Serialize};

pub mod defaults {
    pub const UPTURN_HEIGHT_M: f64 = 0.30;
    pub const CORRECTION_CAP: f64 = 1.4;
    pub const PRIMER_MARGIN: f64 = 1.10;
    pub const PRIMER_COVERAGE_M2: f64 = 25.0;
    pub const MESH_OVERLAP: f64 = 1.10;
    pub const MESH_ROLL_M2: f64 = 50.0;
    pub const TAPE_MARGIN: f64 = 1.05;
    pub const TAPE_ROLL_M: f64 = 50.0;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaterproofingSystem {
    #[default]
    CementitiousFlexible,
    LiquidMembrane,
    Polyurethane,
}

impl WaterproofingSystem {
    /// kg per m² per mm of dry film
    pub fn default_consumption_kg_m2_mm(&self) -> f64 {
        match self {
            WaterproofingSystem::CementitiousFlexible => 1.7,
            WaterproofingSystem::LiquidMembrane => 1.4,
            WaterproofingSystem::Polyurethane => 1.3,
        }
    }

    pub fn default_package_kg(&self) -> f64 {
        match self {
            WaterproofingSystem::CementitiousFlexible => 32.0,
            WaterproofingSystem::LiquidMembrane => 20.0,
            WaterproofingSystem::Polyurethane => 15.0,
        }
    }

    fn keywords(&self) -> &'static [&'static str] {
        match self {
            WaterproofingSystem::CementitiousFlexible => &["mapelastic"],
            WaterproofingSystem::LiquidMembrane => &["aquadefense"],
            WaterproofingSystem::Polyurethane => &["purtop"],
        }
    }

    fn label(&self) -> &'static str {
        match self {
            WaterproofingSystem::CementitiousFlexible => "Mapelastic",
            WaterproofingSystem::LiquidMembrane => "Mapelastic Aquadefense",
            WaterproofingSystem::Polyurethane => "Purtop",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    #[default]
    InternalWet,
    External,
    Pool,
    Tank,
}

impl Environment {
    pub fn thickness_mm(&self) -> f64 {
        match self {
            Environment::InternalWet => 2.0,
            Environment::External => 3.0,
            Environment::Pool | Environment::Tank => 4.0,
        }
    }

    pub fn coats(&self) -> u32 {
        match self {
            Environment::InternalWet | Environment::External => 2,
            Environment::Pool | Environment::Tank => 3,
        }
    }

    pub fn exposure_factor(&self) -> f64 {
        match self {
            Environment::InternalWet => 1.00,
            Environment::External => 1.05,
            Environment::Pool | Environment::Tank => 1.10,
        }
    }

    /// Exposure classes that need reinforcement mesh
    pub fn requires_mesh(&self) -> bool {
        !matches!(self, Environment::InternalWet)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Substrate {
    #[default]
    Concrete,
    Screed,
    Ceramic,
    Masonry,
    Drywall,
}

impl Substrate {
    pub fn factor(&self) -> f64 {
        match self {
            Substrate::Concrete | Substrate::Drywall => 1.00,
            Substrate::Screed => 1.05,
            Substrate::Ceramic => 0.95,
            Substrate::Masonry => 1.10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationMethod {
    #[default]
    Trowel,
    Brush,
    Roller,
    Spray,
}

impl ApplicationMethod {
    pub fn factor(&self) -> f64 {
        match self {
            ApplicationMethod::Trowel => 1.00,
            ApplicationMethod::Brush => 1.05,
            ApplicationMethod::Roller => 1.10,
            ApplicationMethod::Spray => 1.15,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiteClimate {
    #[default]
    Temperate,
    HotDry,
    Humid,
}

impl SiteClimate {
    pub fn factor(&self) -> f64 {
        match self {
            SiteClimate::Temperate => 1.00,
            SiteClimate::HotDry => 1.05,
            SiteClimate::Humid => 1.03,
        }
    }
}

fn default_upturn() -> f64 {
    defaults::UPTURN_HEIGHT_M
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaterproofingInput {
    pub area: f64,
    #[serde(default)]
    pub perimeter: f64,
    #[serde(default = "default_upturn")]
    pub upturn_height: f64,
    #[serde(default)]
    pub system: WaterproofingSystem,
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub substrate: Substrate,
    #[serde(default)]
    pub application_method: ApplicationMethod,
    #[serde(default)]
    pub climate: SiteClimate,
}

impl WaterproofingInput {
    pub fn new(area: f64, perimeter: f64, environment: Environment) -> Self {
        Self {
            area,
            perimeter,
            upturn_height: defaults::UPTURN_HEIGHT_M,
            system: WaterproofingSystem::default(),
            environment,
            substrate: Substrate::default(),
            application_method: ApplicationMethod::default(),
            climate: SiteClimate::default(),
        }
    }

    pub fn corrections(&self) -> CorrectionSet {
        CorrectionSet::new(defaults::CORRECTION_CAP)
            .with("substrate", self.substrate.factor())
            .with("application_method", self.application_method.factor())
            .with("climate", self.climate.factor())
            .with("exposure", self.environment.exposure_factor())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaterproofingResult {
    /// Floor area plus perimeter upturns
    pub effective_area: f64,
    pub thickness_mm: f64,
    pub coats: u32,
    pub corrections: CorrectionSet,
    pub correction_factor: f64,
    pub consumption_kg_m2: f64,
    pub membrane_kg: f64,
    pub membrane_packages: u32,
    pub primer_units: u32,
    pub mesh_required: bool,
    pub mesh_rolls: u32,
    pub sealing_tape_rolls: u32,
    #[serde(rename = "itemizedCosts")]
    pub itemized_costs: ItemizedCosts,
    #[serde(rename = "totalCost")]
    pub total_cost: f64,
    pub quantified_items: Vec<QuantifiedItem>,
    pub validations: CalculationValidations,
}

pub fn calculate_waterproofing_mapei_with_products(
    input: &WaterproofingInput,
    products: &[Product],
) -> CalcResult<WaterproofingResult> {
    calculate_waterproofing(input, &Catalog::new(products), Strictness::Lenient)
}

fn query(role: FunctionalRole, keywords: &'static [&'static str]) -> ProductQuery<'static> {
    ProductQuery::new(role, categories::WATERPROOFING).keywords(keywords)
}

/// kg/m² for the requested film: per-mm spec times thickness, or the
/// per-coat spec times coats
fn membrane_consumption(
    resolver: &Resolver<'_>,
    entry: Option<&CatalogEntry>,
    system: WaterproofingSystem,
    environment: Environment,
) -> CalcResult<f64> {
    let specs = entry.map(|e| e.material()).unwrap_or_default();
    if let Some(per_mm) = specs.consumption_kg_m2_mm.filter(|v| *v > 0.0) {
        return Ok(per_mm * environment.thickness_mm());
    }
    if let Some(per_coat) = specs.consumption_kg_m2.filter(|v| *v > 0.0) {
        return Ok(per_coat * environment.coats() as f64);
    }
    let per_mm = resolver.spec(
        None,
        entry,
        "consumption_kg_m2_mm",
        system.default_consumption_kg_m2_mm(),
    )?;
    Ok(per_mm * environment.thickness_mm())
}

pub fn calculate_waterproofing(
    input: &WaterproofingInput,
    catalog: &Catalog,
    strictness: Strictness,
) -> CalcResult<WaterproofingResult> {
    use defaults::*;

    let area = non_negative("area", input.area)?;
    let perimeter = non_negative("perimeter", input.perimeter)?;
    let upturn = non_negative("upturn_height", input.upturn_height)?;
    let effective_area = area + perimeter * upturn;
    let environment = input.environment;

    let mut resolver = Resolver::new(catalog, strictness);
    resolver
        .validations
        .record("positive_area", area > 0.0, "area is zero, no material was computed");

    let category = categories::WATERPROOFING;
    let mut sheet = CostSheet::new();

    let corrections = input.corrections();
    let correction_factor = corrections.product();

    let membrane_query = query(FunctionalRole::WaterproofingMembrane, input.system.keywords());
    let membrane = resolver.find(membrane_query)?;
    let consumption_kg_m2 = membrane_consumption(&resolver, membrane, input.system, environment)?;
    let membrane_kg = effective_area * consumption_kg_m2 * correction_factor;
    let package = resolver.spec(
        membrane.and_then(|e| e.material().package_weight),
        membrane,
        "package_weight",
        input.system.default_package_kg(),
    )?;
    let membrane_packages = ceil_units(membrane_kg, package);
    push_line(
        &mut sheet,
        "membrane",
        membrane,
        Placeholder::new(input.system.label(), "kit", 0.0),
        category,
        membrane_packages as f64,
        format!(
            "{:.1} kg for {:.2} m² at {:.1} mm in {} coats",
            membrane_kg,
            effective_area,
            environment.thickness_mm(),
            environment.coats()
        ),
    );

    let primer = resolver.find_optional(query(FunctionalRole::Primer, &["primer"]))?;
    let coverage = primer
        .and_then(|e| e.material().coverage())
        .unwrap_or(PRIMER_COVERAGE_M2);
    let primer_units = ceil_units(effective_area * PRIMER_MARGIN, coverage);
    push_line(
        &mut sheet,
        "primer",
        primer,
        Placeholder::new("Primer G", "un", 0.0),
        category,
        primer_units as f64,
        "substrate preparation with 10% margin",
    );

    let mesh_required = environment.requires_mesh();
    let mut mesh_rolls = 0;
    if mesh_required {
        let mesh = resolver.find_optional(query(FunctionalRole::ReinforcementMesh, &["mapenet"]))?;
        resolver.validations.record(
            "mesh_available",
            mesh.is_some(),
            "reinforcement mesh is required for this exposure class but none is registered",
        );
        let coverage = mesh.and_then(|e| e.material().coverage()).unwrap_or(MESH_ROLL_M2);
        mesh_rolls = ceil_units(effective_area * MESH_OVERLAP, coverage);
        push_line(
            &mut sheet,
            "mesh",
            mesh,
            Placeholder::new("Mapenet 150", "rolo", 0.0),
            category,
            mesh_rolls as f64,
            "alkali-resistant mesh with 10% overlap",
        );
    }

    let tape = resolver.find_optional(query(FunctionalRole::SealingTape, &["mapeband"]))?;
    let roll = tape.and_then(|e| e.material().length).unwrap_or(TAPE_ROLL_M);
    let sealing_tape_rolls = ceil_units(perimeter * TAPE_MARGIN, roll);
    push_line(
        &mut sheet,
        "sealing_tape",
        tape,
        Placeholder::new("Mapeband", "rolo", 0.0),
        category,
        sealing_tape_rolls as f64,
        format!("{:.2} m of corners and joints", perimeter),
    );

    let (quantified_items, itemized_costs, total_cost) = sheet.into_parts();
    tracing::debug!(
        effective_area,
        membrane_kg,
        membrane_packages,
        total_cost,
        "waterproofing computed"
    );

    Ok(WaterproofingResult {
        effective_area,
        thickness_mm: environment.thickness_mm(),
        coats: environment.coats(),
        corrections,
        correction_factor,
        consumption_kg_m2,
        membrane_kg,
        membrane_packages,
        primer_units,
        mesh_required,
        mesh_rolls,
        sealing_tape_rolls,
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

    fn mapelastic() -> Product {
        Product::new("m", "Mapelastic Kit 32kg", categories::WATERPROOFING, 450.0)
            .with_specifications(json!({ "consumption_kg_m2_mm": 1.7, "package_weight": 32 }))
    }

    #[test]
    fn test_bathroom_with_catalog() {
        let input = WaterproofingInput::new(10.0, 14.0, Environment::InternalWet);
        let result = calculate_waterproofing_mapei_with_products(&input, &[mapelastic()]).unwrap();

        assert!((result.effective_area - 14.2).abs() < 1e-9);
        assert_eq!(result.thickness_mm, 2.0);
        assert_eq!(result.correction_factor, 1.0);
        assert!((result.membrane_kg - 14.2 * 3.4).abs() < 1e-9);
        assert_eq!(result.membrane_packages, 2); // 48.28 kg / 32
        assert!(!result.mesh_required);
        assert_eq!(result.mesh_rolls, 0);
        assert_eq!(result.sealing_tape_rolls, 1);
        assert_eq!(result.itemized_costs.get("membrane"), 900.0);
    }

    #[test]
    fn test_pool_requires_mesh() {
        let input = WaterproofingInput::new(32.0, 24.0, Environment::Pool);
        let result = calculate_waterproofing_mapei_with_products(&input, &[mapelastic()]).unwrap();
        assert!(result.mesh_required);
        assert!(result.mesh_rolls > 0);
        assert!(!result.validations.passed("mesh_available"));
        assert_eq!(result.coats, 3);
    }

    #[test]
    fn test_per_coat_consumption() {
        let name = "Mapelastic Aquadefense 15kg";
        let product = Product::new("a", name, categories::WATERPROOFING, 300.0)
            .with_specifications(json!({ "consumption_kg_m2": 0.75, "package_weight": 15 }));
        let mut input = WaterproofingInput::new(10.0, 0.0, Environment::InternalWet);
        input.system = WaterproofingSystem::LiquidMembrane;
        let result = calculate_waterproofing_mapei_with_products(&input, &[product]).unwrap();
        assert_eq!(result.consumption_kg_m2, 1.5);
        assert_eq!(result.membrane_packages, 1);
    }

    #[test]
    fn test_corrections_capped() {
        let mut input = WaterproofingInput::new(10.0, 0.0, Environment::Tank);
        input.substrate = Substrate::Masonry;
        input.application_method = ApplicationMethod::Spray;
        input.climate = SiteClimate::HotDry;
        let set = input.corrections();
        assert!(set.is_capped());
        assert_eq!(set.product(), defaults::CORRECTION_CAP);
    }

    #[test]
    fn test_strict_requires_membrane() {
        let input = WaterproofingInput::new(10.0, 14.0, Environment::InternalWet);
        let err =
            calculate_waterproofing(&input, &Catalog::new(&[]), Strictness::Strict).unwrap_err();
        assert_eq!(err.code(), "CATALOG");
    }
}
