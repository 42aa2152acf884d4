//! Grid-tied photovoltaic systems
//!
//! A single implementation serves both entry points: the product-based quick
//! sizing substitutes defaults for anything the catalog lacks, the advanced
//! sizing refuses to guess. Only panels and inverters are required products;
//! structure, cabling, connectors, string boxes and installation are priced
//! when registered and otherwise reported at zero.

use crate::factors::CorrectionSet;
use crate::resolve::{non_negative, push_line, Placeholder, Resolver};
use proposta_core::{
    categories, ceil_units, multiply_units, round_currency, smallest_adequate, CalcError,
    CalcResult, CalculationValidations, Catalog, CatalogEntry, CostSheet, FunctionalRole,
    ItemizedCosts, Product, ProductQuery, QuantifiedItem, SpecKind, Strictness,
};
use serde::{Deserialize, Serialize};

pub mod defaults {
    pub const PERFORMANCE_RATIO: f64 = 0.80;
    pub const PANEL_POWER_W: f64 = 550.0;
    pub const PANEL_VOC: f64 = 49.5;
    /// Cold-morning Voc rise applied when sizing strings
    pub const VOC_COLD_FACTOR: f64 = 1.15;
    pub const INVERTER_MAX_INPUT_V: f64 = 600.0;
    /// Inverter AC rating relative to the array: [0.8, 1.5]
    pub const INVERTER_MIN_RATIO: f64 = 0.8;
    pub const INVERTER_MAX_RATIO: f64 = 1.5;
    pub const PANELS_PER_STRUCTURE_KIT: f64 = 4.0;
    pub const CABLE_M_PER_PANEL: f64 = 10.0;
    pub const CABLE_M_PER_STRING: f64 = 20.0;
    pub const CONNECTOR_PAIRS_PER_STRING: u32 = 2;
    pub const STRINGS_PER_BOX: f64 = 2.0;
    pub const PANEL_AREA_M2: f64 = 2.6;
    pub const AREA_MARGIN: f64 = 1.10;
    pub const CORRECTION_CAP: f64 = 1.35;
    pub const DAYS_PER_MONTH: f64 = 30.0;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    North,
    EastWest,
    South,
}

impl Orientation {
    pub fn factor(&self) -> f64 {
        match self {
            Orientation::North => 1.00,
            Orientation::EastWest => 1.12,
            Orientation::South => 1.25,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shading {
    #[default]
    None,
    Partial,
    Heavy,
}

impl Shading {
    pub fn factor(&self) -> f64 {
        match self {
            Shading::None => 1.00,
            Shading::Partial => 1.10,
            Shading::Heavy => 1.25,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolarClimate {
    #[default]
    Temperate,
    Hot,
    Cold,
}

impl SolarClimate {
    pub fn factor(&self) -> f64 {
        match self {
            SolarClimate::Temperate => 1.00,
            SolarClimate::Hot => 1.05,
            SolarClimate::Cold => 0.98,
        }
    }
}

/// Mounting surface; picks the structure kit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallationType {
    #[default]
    CeramicRoof,
    MetalRoof,
    Slab,
    Ground,
}

impl InstallationType {
    fn keywords(&self) -> &'static [&'static str] {
        match self {
            InstallationType::CeramicRoof => &["estrutura", "ceramic"],
            InstallationType::MetalRoof => &["estrutura", "metal"],
            InstallationType::Slab => &["estrutura", "laje"],
            InstallationType::Ground => &["estrutura", "solo"],
        }
    }
}

/// Tilt deviation factor: +0.5% per degree beyond 10°
pub fn tilt_factor(deviation_degrees: f64) -> f64 {
    1.0 + 0.005 * (deviation_degrees.abs() - 10.0).max(0.0)
}

fn default_performance_ratio() -> f64 {
    defaults::PERFORMANCE_RATIO
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolarCalculationInput {
    #[serde(default)]
    pub monthly_consumption_kwh: Option<f64>,
    /// Twelve (or fewer) monthly readings; averaged when present
    #[serde(default)]
    pub monthly_consumption_history: Vec<f64>,
    /// Peak sun hours (kWh/m²/day)
    pub peak_sun_hours: f64,
    #[serde(default = "default_performance_ratio")]
    pub performance_ratio: f64,
    #[serde(default)]
    pub orientation: Orientation,
    #[serde(default)]
    pub shading: Shading,
    #[serde(default)]
    pub climate: SolarClimate,
    #[serde(default)]
    pub tilt_deviation_degrees: f64,
    #[serde(default)]
    pub tariff_per_kwh: Option<f64>,
    #[serde(default)]
    pub installation_type: InstallationType,
}

impl SolarCalculationInput {
    pub fn new(monthly_consumption_kwh: f64, peak_sun_hours: f64) -> Self {
        Self {
            monthly_consumption_kwh: Some(monthly_consumption_kwh),
            monthly_consumption_history: Vec::new(),
            peak_sun_hours,
            performance_ratio: defaults::PERFORMANCE_RATIO,
            orientation: Orientation::default(),
            shading: Shading::default(),
            climate: SolarClimate::default(),
            tilt_deviation_degrees: 0.0,
            tariff_per_kwh: None,
            installation_type: InstallationType::default(),
        }
    }

    /// Average of the history when present, else the single figure
    pub fn monthly_consumption(&self) -> CalcResult<f64> {
        let history: Vec<f64> = self
            .monthly_consumption_history
            .iter()
            .copied()
            .filter(|v| v.is_finite() && *v >= 0.0)
            .collect();
        let monthly = if history.is_empty() {
            self.monthly_consumption_kwh.ok_or_else(|| {
                CalcError::InvalidInput(
                    "monthly_consumption_kwh or monthly_consumption_history is required".into(),
                )
            })?
        } else {
            history.iter().sum::<f64>() / history.len() as f64
        };
        non_negative("monthly_consumption_kwh", monthly)
    }

    pub fn corrections(&self) -> CorrectionSet {
        CorrectionSet::new(defaults::CORRECTION_CAP)
            .with("orientation", self.orientation.factor())
            .with("shading", self.shading.factor())
            .with("climate", self.climate.factor())
            .with("tilt", tilt_factor(self.tilt_deviation_degrees))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InverterSelection {
    pub product_id: Option<String>,
    pub name: String,
    pub power_w: f64,
    /// False when no inverter fit the [0.8, 1.5] band
    pub within_band: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolarCalculationResult {
    pub monthly_consumption_kwh: f64,
    pub daily_consumption_kwh: f64,
    pub corrections: CorrectionSet,
    pub correction_factor: f64,
    pub required_kwp: f64,
    pub panel_power_w: f64,
    pub panel_count: u32,
    pub actual_kwp: f64,
    pub inverter: InverterSelection,
    pub modules_per_string: u32,
    pub string_count: u32,
    pub structure_kits: u32,
    pub cable_meters: f64,
    pub connector_pairs: u32,
    pub string_boxes: u32,
    pub monthly_generation_kwh: f64,
    pub coverage_percent: f64,
    pub area_required_m2: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_savings: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payback_years: Option<f64>,
    #[serde(rename = "itemizedCosts")]
    pub itemized_costs: ItemizedCosts,
    #[serde(rename = "totalCost")]
    pub total_cost: f64,
    pub quantified_items: Vec<QuantifiedItem>,
    pub validations: CalculationValidations,
}

/// Quick sizing with lenient fallbacks (550 W panel, placeholder inverter)
pub fn calculate_solar_with_products(
    input: &SolarCalculationInput,
    products: &[Product],
) -> CalcResult<SolarCalculationResult> {
    calculate_solar(input, &Catalog::new(products), Strictness::Lenient)
}

/// Full sizing; every required product, spec and price must be present
pub fn calculate_solar_advanced(
    input: &SolarCalculationInput,
    products: &[Product],
) -> CalcResult<SolarCalculationResult> {
    calculate_solar(input, &Catalog::new(products), Strictness::Strict)
}

/// Optional electrical specs fall back even under strict policy
fn spec_or(entry: Option<&CatalogEntry>, value: Option<f64>, key: &str, default: f64) -> f64 {
    match value.filter(|v| v.is_finite() && *v > 0.0) {
        Some(v) => v,
        None => {
            if let Some(entry) = entry {
                tracing::warn!(
                    product = %entry.product.id,
                    spec = key,
                    default,
                    "spec missing, using default"
                );
            }
            default
        }
    }
}

pub fn calculate_solar(
    input: &SolarCalculationInput,
    catalog: &Catalog,
    strictness: Strictness,
) -> CalcResult<SolarCalculationResult> {
    use defaults::*;

    let monthly = input.monthly_consumption()?;
    let peak_sun_hours = non_negative("peak_sun_hours", input.peak_sun_hours)?;
    if peak_sun_hours == 0.0 {
        return Err(CalcError::InvalidInput("peak_sun_hours must be greater than zero".into()));
    }
    let performance_ratio = input.performance_ratio;
    if !(performance_ratio > 0.0 && performance_ratio <= 1.0) {
        return Err(CalcError::InvalidInput(format!(
            "performance_ratio must be in (0, 1], got {}",
            performance_ratio
        )));
    }

    let mut resolver = Resolver::new(catalog, strictness);
    let category = categories::SOLAR;

    let daily = monthly / DAYS_PER_MONTH;
    let corrections = input.corrections();
    let correction_factor = corrections.product();
    let required_kwp = daily / (peak_sun_hours * performance_ratio) * correction_factor;

    resolver
        .validations
        .record("consumption_positive", monthly > 0.0, "monthly consumption is zero");
    resolver.validations.record(
        "corrections_within_cap",
        !corrections.is_capped(),
        format!("correction factors exceed the {:.2} cap and were limited", CORRECTION_CAP),
    );

    // panels
    let panel_query = ProductQuery::new(FunctionalRole::SolarPanel, category)
        .keywords(&["painel"])
        .kind(SpecKind::SolarPanel);
    let panel = resolver.find(panel_query)?;
    let panel_specs = panel.map(|e| e.panel()).unwrap_or_default();
    let panel_power_w = resolver.spec(panel_specs.power_w, panel, "power", PANEL_POWER_W)?;
    let panel_count = ceil_units(required_kwp * 1000.0, panel_power_w);
    let array_w = panel_count as f64 * panel_power_w;
    let actual_kwp = array_w / 1000.0;
    let mut sheet = CostSheet::new();
    push_line(
        &mut sheet,
        "panels",
        panel,
        Placeholder::new("Modulo Fotovoltaico 550W", "un", 0.0),
        category,
        panel_count as f64,
        format!("{} x {:.0} W = {:.2} kWp", panel_count, panel_power_w, actual_kwp),
    );

    // inverter
    let inverter_query = ProductQuery::new(FunctionalRole::Inverter, category)
        .keywords(&["inversor"])
        .kind(SpecKind::Inverter);
    let candidates = catalog.candidates(&inverter_query);
    let sized = smallest_adequate(
        &candidates,
        array_w * INVERTER_MIN_RATIO,
        INVERTER_MAX_RATIO / INVERTER_MIN_RATIO,
        |e| e.inverter().power_w,
    );
    // a candidate without a power rating is reported, not skipped
    let (picked, rating, within_band) = match sized {
        Some(sized) => (Some(sized.entry), sized.rating, sized.within_band),
        None => match candidates.iter().copied().find(|e| e.inverter().power_w.is_none()) {
            Some(unrated) => {
                let rating = resolver.spec(None, Some(unrated), "power", array_w)?;
                (Some(unrated), rating, false)
            }
            None => (None, array_w, true),
        },
    };
    let inverter_entry = resolver.accept(picked, &inverter_query)?;
    let inverter = match inverter_entry {
        Some(entry) => InverterSelection {
            product_id: Some(entry.product.id.clone()),
            name: entry.product.name.clone(),
            power_w: rating,
            within_band,
        },
        None => InverterSelection {
            product_id: None,
            name: format!("Inversor {:.1} kW", actual_kwp),
            power_w: array_w,
            within_band: true,
        },
    };
    resolver.validations.record(
        "inverter_sized",
        inverter.within_band,
        format!(
            "no inverter between {:.0} W and {:.0} W, closest is {:.0} W",
            array_w * INVERTER_MIN_RATIO,
            array_w * INVERTER_MAX_RATIO,
            inverter.power_w
        ),
    );
    if panel_count > 0 {
        push_line(
            &mut sheet,
            "inverter",
            inverter_entry,
            Placeholder::new("Inversor On-Grid", "un", 0.0),
            category,
            1.0,
            format!("{:.0} W AC for a {:.0} W array", inverter.power_w, array_w),
        );
    }

    // strings
    let max_input_v = spec_or(
        inverter_entry,
        inverter_entry.and_then(|e| e.inverter().max_input_voltage),
        "max_input_voltage",
        INVERTER_MAX_INPUT_V,
    );
    let voc = spec_or(panel, panel_specs.voc, "voc", PANEL_VOC);
    let modules_per_string = ((max_input_v / (voc * VOC_COLD_FACTOR)).floor() as u32).max(1);
    let string_count = ceil_units(panel_count as f64, modules_per_string as f64);

    // balance of system
    let structure = match catalog.locate(
        &ProductQuery::new(FunctionalRole::MountingStructure, category)
            .keywords(input.installation_type.keywords()),
    ) {
        Some(entry) => Some(entry),
        None => catalog.locate(
            &ProductQuery::new(FunctionalRole::MountingStructure, category)
                .keywords(&["estrutura"]),
        ),
    };
    let structure_query = ProductQuery::new(FunctionalRole::MountingStructure, category);
    let structure = match structure {
        Some(entry) => resolver.accept(Some(entry), &structure_query)?,
        None => resolver.find_optional(structure_query)?,
    };
    let per_kit = spec_or(
        structure,
        structure.and_then(|e| e.material().units_per_package),
        "units_per_package",
        PANELS_PER_STRUCTURE_KIT,
    );
    let structure_kits = ceil_units(panel_count as f64, per_kit);
    push_line(
        &mut sheet,
        "structure",
        structure,
        Placeholder::new("Estrutura de Fixacao", "kit", 0.0),
        category,
        structure_kits as f64,
        format!("{:.0} panels per kit", per_kit),
    );

    let cable_meters = if panel_count > 0 {
        CABLE_M_PER_PANEL * panel_count as f64 + CABLE_M_PER_STRING * string_count as f64
    } else {
        0.0
    };
    let cable = resolver.find_optional(
        ProductQuery::new(FunctionalRole::SolarCable, category).keywords(&["cabo", "solar"]),
    )?;
    let cable_quantity = match cable.and_then(|e| e.material().length) {
        Some(roll) if roll > 0.0 => ceil_units(cable_meters, roll) as f64,
        _ => cable_meters.ceil(),
    };
    push_line(
        &mut sheet,
        "cabling",
        cable,
        Placeholder::new("Cabo Solar 6mm", "m", 0.0),
        category,
        cable_quantity,
        format!("{:.0} m of DC cable", cable_meters),
    );

    let connector_pairs =
        multiply_units(string_count, CONNECTOR_PAIRS_PER_STRING, "connector pair")?;
    let connector_query =
        ProductQuery::new(FunctionalRole::Connector, category).keywords(&["mc4"]);
    let connector = resolver.find_optional(connector_query)?;
    push_line(
        &mut sheet,
        "connectors",
        connector,
        Placeholder::new("Conector MC4 (par)", "par", 0.0),
        category,
        connector_pairs as f64,
        format!("{} strings", string_count),
    );

    let string_boxes = ceil_units(string_count as f64, STRINGS_PER_BOX);
    let string_box = resolver.find_optional(
        ProductQuery::new(FunctionalRole::StringBox, category).keywords(&["string", "box"]),
    )?;
    push_line(
        &mut sheet,
        "string_box",
        string_box,
        Placeholder::new("String Box", "un", 0.0),
        category,
        string_boxes as f64,
        "DC protection",
    );

    let installation = resolver.find_optional(
        ProductQuery::new(FunctionalRole::Installation, category).keywords(&["instalacao"]),
    )?;
    push_line(
        &mut sheet,
        "installation",
        installation,
        Placeholder::new("Instalacao Fotovoltaica", "kWp", 0.0),
        category,
        actual_kwp,
        "priced per installed kWp",
    );

    // performance
    let monthly_generation_kwh =
        actual_kwp * peak_sun_hours * performance_ratio * DAYS_PER_MONTH / correction_factor;
    let coverage_percent = if monthly > 0.0 {
        monthly_generation_kwh / monthly * 100.0
    } else {
        0.0
    };
    let panel_area = spec_or(panel, panel_specs.area_m2, "area", PANEL_AREA_M2);
    let area_required_m2 = panel_count as f64 * panel_area * AREA_MARGIN;

    let (quantified_items, itemized_costs, total_cost) = sheet.into_parts();

    let monthly_savings = input
        .tariff_per_kwh
        .filter(|t| t.is_finite() && *t > 0.0)
        .map(|tariff| round_currency(monthly_generation_kwh.min(monthly) * tariff));
    let payback_years = monthly_savings
        .filter(|s| *s > 0.0 && total_cost > 0.0)
        .map(|s| (total_cost / (s * 12.0) * 10.0).round() / 10.0);

    tracing::debug!(
        required_kwp,
        actual_kwp,
        panel_count,
        string_count,
        total_cost,
        "solar system sized"
    );

    Ok(SolarCalculationResult {
        monthly_consumption_kwh: monthly,
        daily_consumption_kwh: daily,
        corrections,
        correction_factor,
        required_kwp,
        panel_power_w,
        panel_count,
        actual_kwp,
        inverter,
        modules_per_string,
        string_count,
        structure_kits,
        cable_meters,
        connector_pairs,
        string_boxes,
        monthly_generation_kwh,
        coverage_percent,
        area_required_m2,
        monthly_savings,
        payback_years,
        itemized_costs,
        total_cost,
        quantified_items,
        validations: resolver.validations,
    })
}
