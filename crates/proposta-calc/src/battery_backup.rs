//! Battery backup for critical loads
//!
//! Strict by default: a backup proposal without a real battery product is
//! worthless, so an empty `battery_backup` category is an error rather than
//! a placeholder.

use crate::factors::CorrectionSet;
use crate::resolve::{non_negative, push_line, Placeholder, Resolver};
use proposta_core::{
    categories, ceil_units, multiply_units, smallest_adequate, CalcError, CalcResult,
    CalculationValidations, Catalog, CatalogEntry, CostSheet, FunctionalRole, ItemizedCosts,
    Product, ProductQuery, QuantifiedItem, SpecKind, Strictness,
};
use serde::{Deserialize, Serialize};

pub mod defaults {
    pub const SYSTEM_VOLTAGE: f64 = 48.0;
    pub const SURGE_FACTOR: f64 = 1.25;
    pub const INVERTER_EFFICIENCY: f64 = 0.92;
    pub const AGING_RESERVE: f64 = 1.10;
    pub const CORRECTION_CAP: f64 = 1.5;
    /// Battery usable capacity band: [required, 2 x required]
    pub const BATTERY_MAX_RATIO: f64 = 2.0;
    pub const INVERTER_MAX_RATIO: f64 = 1.3;
    pub const BATTERY_CAPACITY_KWH: f64 = 5.0;
    pub const BATTERY_DOD: f64 = 0.9;
    pub const BATTERY_VOLTAGE: f64 = 48.0;
    pub const BATTERY_CYCLES: f64 = 6000.0;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatteryClimate {
    #[default]
    Temperate,
    Hot,
    Cold,
}

impl BatteryClimate {
    pub fn factor(&self) -> f64 {
        match self {
            BatteryClimate::Temperate => 1.00,
            BatteryClimate::Hot => 1.10,
            BatteryClimate::Cold => 1.05,
        }
    }
}

fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriticalLoad {
    pub name: String,
    pub power_w: f64,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    /// Hours of use during an outage; the autonomy when absent
    #[serde(default)]
    pub hours: Option<f64>,
}

impl CriticalLoad {
    pub fn new(name: impl Into<String>, power_w: f64, quantity: u32) -> Self {
        Self {
            name: name.into(),
            power_w,
            quantity,
            hours: None,
        }
    }

    pub fn with_hours(mut self, hours: f64) -> Self {
        self.hours = Some(hours);
        self
    }
}

fn default_system_voltage() -> f64 {
    defaults::SYSTEM_VOLTAGE
}

fn default_surge_factor() -> f64 {
    defaults::SURGE_FACTOR
}

fn default_cycles_per_day() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatteryBackupInput {
    pub loads: Vec<CriticalLoad>,
    pub autonomy_hours: f64,
    #[serde(default = "default_system_voltage")]
    pub system_voltage: f64,
    #[serde(default)]
    pub climate: BatteryClimate,
    #[serde(default = "default_surge_factor")]
    pub surge_factor: f64,
    #[serde(default = "default_cycles_per_day")]
    pub cycles_per_day: f64,
}

impl BatteryBackupInput {
    pub fn new(loads: Vec<CriticalLoad>, autonomy_hours: f64) -> Self {
        Self {
            loads,
            autonomy_hours,
            system_voltage: defaults::SYSTEM_VOLTAGE,
            climate: BatteryClimate::default(),
            surge_factor: defaults::SURGE_FACTOR,
            cycles_per_day: 1.0,
        }
    }

    pub fn corrections(&self) -> CorrectionSet {
        CorrectionSet::new(defaults::CORRECTION_CAP)
            .with("inverter_efficiency", 1.0 / defaults::INVERTER_EFFICIENCY)
            .with("climate", self.climate.factor())
            .with("aging", defaults::AGING_RESERVE)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatterySelection {
    pub product_id: Option<String>,
    pub name: String,
    pub capacity_kwh: f64,
    pub dod: f64,
    pub voltage: f64,
    pub usable_kwh: f64,
    pub within_band: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupInverterSelection {
    pub product_id: Option<String>,
    pub name: String,
    pub power_w: f64,
    pub required_w: f64,
    pub within_band: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatteryBackupResult {
    pub total_energy_kwh: f64,
    pub peak_power_w: f64,
    pub corrections: CorrectionSet,
    pub correction_factor: f64,
    pub required_kwh: f64,
    pub battery: BatterySelection,
    /// Batteries wired in series to reach the system voltage
    pub series_count: u32,
    pub battery_count: u32,
    pub installed_kwh: f64,
    pub usable_installed_kwh: f64,
    pub inverter: BackupInverterSelection,
    pub estimated_life_years: f64,
    #[serde(rename = "itemizedCosts")]
    pub itemized_costs: ItemizedCosts,
    #[serde(rename = "totalCost")]
    pub total_cost: f64,
    pub quantified_items: Vec<QuantifiedItem>,
    pub validations: CalculationValidations,
}

pub fn calculate_battery_backup_with_products(
    input: &BatteryBackupInput,
    products: &[Product],
) -> CalcResult<BatteryBackupResult> {
    calculate_battery_backup(input, &Catalog::new(products), Strictness::Strict)
}

/// `Σ power × quantity × hours / 1000`, hours defaulting to the autonomy
pub fn total_energy_kwh(loads: &[CriticalLoad], autonomy_hours: f64) -> CalcResult<f64> {
    loads.iter().try_fold(0.0, |acc, load| {
        let power = non_negative(&format!("{} power_w", load.name), load.power_w)?;
        let hours =
            non_negative(&format!("{} hours", load.name), load.hours.unwrap_or(autonomy_hours))?;
        Ok(acc + power * load.quantity as f64 * hours / 1000.0)
    })
}

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

pub fn calculate_battery_backup(
    input: &BatteryBackupInput,
    catalog: &Catalog,
    strictness: Strictness,
) -> CalcResult<BatteryBackupResult> {
    use defaults::*;

    let autonomy = non_negative("autonomy_hours", input.autonomy_hours)?;
    let system_voltage = non_negative("system_voltage", input.system_voltage)?;
    let surge_factor = non_negative("surge_factor", input.surge_factor)?.max(1.0);
    let cycles_per_day = non_negative("cycles_per_day", input.cycles_per_day)?;

    let total_energy = total_energy_kwh(&input.loads, autonomy)?;
    let peak_power_w: f64 = input
        .loads
        .iter()
        .map(|l| l.power_w * l.quantity as f64)
        .sum();
    let corrections = input.corrections();
    let correction_factor = corrections.product();
    let required_kwh = total_energy * correction_factor;

    let mut resolver = Resolver::new(catalog, strictness);
    resolver
        .validations
        .record("loads_present", total_energy > 0.0, "no critical load energy to back up");

    let category = categories::BATTERY_BACKUP;
    let battery_query = ProductQuery::new(FunctionalRole::Battery, category)
        .keywords(&["bateria"])
        .kind(SpecKind::Battery);
    let candidates = catalog.candidates(&battery_query);
    if candidates.is_empty() && strictness.is_strict() {
        return Err(CalcError::missing_category(category));
    }

    let sized = smallest_adequate(&candidates, required_kwh, BATTERY_MAX_RATIO, |e| {
        e.battery().usable_kwh()
    });
    let picked = sized.map(|s| s.entry).or_else(|| candidates.first().copied());
    let battery_entry = resolver.accept(picked, &battery_query)?;
    let specs = battery_entry.map(|e| e.battery()).unwrap_or_default();
    let capacity_kwh =
        resolver.spec(specs.capacity_kwh, battery_entry, "capacity", BATTERY_CAPACITY_KWH)?;
    let dod = resolver.spec(specs.dod, battery_entry, "dod", BATTERY_DOD)?;
    let voltage = resolver.spec(specs.voltage, battery_entry, "voltage", BATTERY_VOLTAGE)?;
    let cycles = spec_or(battery_entry, specs.cycles, "cycles", BATTERY_CYCLES);
    let usable_kwh = capacity_kwh * dod;

    let battery = BatterySelection {
        product_id: battery_entry.map(|e| e.product.id.clone()),
        name: battery_entry
            .map(|e| e.product.name.clone())
            .unwrap_or_else(|| format!("Bateria {:.1} kWh", capacity_kwh)),
        capacity_kwh,
        dod,
        voltage,
        usable_kwh,
        within_band: sized.map_or(battery_entry.is_none(), |s| s.within_band),
    };
    resolver.validations.record(
        "battery_sized",
        battery.within_band,
        format!(
            "no battery with usable capacity between {:.2} and {:.2} kWh",
            required_kwh,
            required_kwh * BATTERY_MAX_RATIO
        ),
    );

    let series_count = ceil_units(system_voltage, voltage).max(1);
    let parallel_units = ceil_units(required_kwh, usable_kwh);
    let battery_count = multiply_units(
        ceil_units(parallel_units as f64, series_count as f64),
        series_count,
        "battery",
    )?;
    let installed_kwh = battery_count as f64 * capacity_kwh;
    let usable_installed_kwh = battery_count as f64 * usable_kwh;

    let mut sheet = CostSheet::new();
    push_line(
        &mut sheet,
        "batteries",
        battery_entry,
        Placeholder::new("Bateria de Litio", "un", 0.0),
        category,
        battery_count as f64,
        format!(
            "{} x {:.2} kWh ({} in series at {:.0} V)",
            battery_count, capacity_kwh, series_count, voltage
        ),
    );

    // inverter
    let required_w = peak_power_w * surge_factor;
    let inverter_query = ProductQuery::new(FunctionalRole::Inverter, category)
        .keywords(&["inversor"])
        .kind(SpecKind::Inverter);
    let inverter_candidates = catalog.candidates(&inverter_query);
    let sized_inverter =
        smallest_adequate(&inverter_candidates, required_w, INVERTER_MAX_RATIO, |e| {
            e.inverter().power_w
        });
    let inverter_entry = resolver.accept(sized_inverter.map(|s| s.entry), &inverter_query)?;
    let inverter = match (sized_inverter, inverter_entry) {
        (Some(sized), Some(entry)) => BackupInverterSelection {
            product_id: Some(entry.product.id.clone()),
            name: entry.product.name.clone(),
            power_w: sized.rating,
            required_w,
            within_band: sized.within_band,
        },
        _ => BackupInverterSelection {
            product_id: None,
            name: format!("Inversor Hibrido {:.1} kW", required_w / 1000.0),
            power_w: required_w,
            required_w,
            within_band: true,
        },
    };
    resolver.validations.record(
        "inverter_sized",
        inverter.within_band,
        format!(
            "no inverter between {:.0} W and {:.0} W, closest is {:.0} W",
            required_w,
            required_w * INVERTER_MAX_RATIO,
            inverter.power_w
        ),
    );
    if battery_count > 0 {
        push_line(
            &mut sheet,
            "inverter",
            inverter_entry,
            Placeholder::new("Inversor Hibrido", "un", 0.0),
            category,
            1.0,
            format!("{:.0} W peak with {:.2} surge factor", peak_power_w, surge_factor),
        );
    }

    let estimated_life_years = if cycles_per_day > 0.0 {
        (cycles / (cycles_per_day * 365.0) * 10.0).round() / 10.0
    } else {
        0.0
    };

    let (quantified_items, itemized_costs, total_cost) = sheet.into_parts();
    tracing::debug!(
        required_kwh,
        battery_count,
        series_count,
        total_cost,
        "battery backup sized"
    );

    Ok(BatteryBackupResult {
        total_energy_kwh: total_energy,
        peak_power_w,
        corrections,
        correction_factor,
        required_kwh,
        battery,
        series_count,
        battery_count,
        installed_kwh,
        usable_installed_kwh,
        inverter,
        estimated_life_years,
        itemized_costs,
        total_cost,
        quantified_items,
        validations: resolver.validations,
    })
}
