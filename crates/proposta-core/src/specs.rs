//! Product specification extraction and normalization
//!
//! Catalog specifications arrive as free-form JSON, sometimes serialized as
//! a string and sometimes with historical field names. This module turns
//! them into a [`SpecBag`] with canonical keys, and from there into the
//! typed [`ProductSpecs`] schema the calculators read.

use crate::product::{FunctionalRole, Product};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Version of the typed specification schema produced at ingestion
pub const SPEC_SCHEMA_VERSION: u32 = 1;

/// Aliases applied to every product: (legacy, canonical)
const BIDIRECTIONAL_ALIASES: &[(&str, &str)] = &[("power_rating", "power")];

/// Aliases applied only to batteries: (legacy, canonical)
const BATTERY_ALIASES: &[(&str, &str)] = &[
    ("capacity_kwh", "capacity"),
    ("depth_of_discharge", "dod"),
    ("life_cycles", "cycles"),
];

/// Normalized specification key/value bag
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpecBag(Map<String, Value>);

impl SpecBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.get(key).is_some_and(|v| !v.is_null())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    /// Numeric value; accepts JSON numbers and numeric strings ("3,5" or "3.5")
    pub fn number(&self, key: &str) -> Option<f64> {
        match self.0.get(key)? {
            Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
            Value::String(s) => {
                s.trim().replace(',', ".").parse::<f64>().ok().filter(|v| v.is_finite())
            }
            _ => None,
        }
    }

    /// First numeric value found among `keys`, in order
    pub fn first_number(&self, keys: &[&str]) -> Option<f64> {
        keys.iter().find_map(|k| self.number(k))
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

/// Extract the normalized spec bag from a product.
///
/// Never fails: absent, malformed or non-object specifications yield an
/// empty bag.
pub fn get_product_specs(product: &Product) -> SpecBag {
    let map = match &product.specifications {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(map)) => map.clone(),
        Some(Value::String(raw)) => match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => map,
            Ok(_) => Map::new(),
            Err(e) => {
                tracing::debug!(
                    product = %product.id,
                    error = %e,
                    "unparseable specifications, using empty bag"
                );
                Map::new()
            }
        },
        Some(_) => Map::new(),
    };

    let mut bag = SpecBag(map);
    apply_aliases(&mut bag, product.is_battery());
    bag
}

fn apply_aliases(bag: &mut SpecBag, is_battery: bool) {
    for (legacy, canonical) in BIDIRECTIONAL_ALIASES {
        copy_if_absent(bag, legacy, canonical);
        copy_if_absent(bag, canonical, legacy);
    }
    if is_battery {
        for (legacy, canonical) in BATTERY_ALIASES {
            copy_if_absent(bag, legacy, canonical);
        }
    }
}

fn copy_if_absent(bag: &mut SpecBag, from: &str, to: &str) {
    if bag.contains(to) {
        return;
    }
    if let Some(value) = bag.get(from).filter(|v| !v.is_null()).cloned() {
        bag.insert(to, value);
    }
}

/// Which typed schema a product's specs are read into
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecKind {
    Material,
    SolarPanel,
    Inverter,
    Battery,
}

impl SpecKind {
    pub fn of(product: &Product) -> Self {
        match product.functional_role {
            Some(FunctionalRole::SolarPanel) => return Self::SolarPanel,
            Some(FunctionalRole::Inverter) => return Self::Inverter,
            Some(FunctionalRole::Battery) => return Self::Battery,
            Some(_) => return Self::Material,
            None => {}
        }
        if product.is_battery() {
            return Self::Battery;
        }
        let kinds = [&product.solar_category, &product.subcategory];
        let matches = |names: &[&str]| {
            kinds
                .iter()
                .filter_map(|k| k.as_deref())
                .any(|k| names.contains(&k.to_lowercase().as_str()))
        };
        if matches(&["panel", "painel", "paineis", "modulo", "módulo", "modulos"]) {
            Self::SolarPanel
        } else if matches(&["inverter", "inversor", "inversores"]) {
            Self::Inverter
        } else {
            Self::Material
        }
    }
}

/// Coverage/consumption specs of installable materials
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialSpecs {
    /// m² covered by one unit
    pub coverage_area: Option<f64>,
    /// Alternative coverage key used by liquid/powder products
    pub yield_per_unit: Option<f64>,
    /// Linear meters per unit (bars, rolls, tape)
    pub length: Option<f64>,
    /// kg per package
    pub package_weight: Option<f64>,
    pub consumption_kg_m2: Option<f64>,
    pub consumption_kg_m2_mm: Option<f64>,
    pub units_per_package: Option<f64>,
    pub min_thickness_mm: Option<f64>,
    pub max_thickness_mm: Option<f64>,
}

impl MaterialSpecs {
    pub fn from_bag(bag: &SpecBag) -> Self {
        Self {
            coverage_area: bag.number("coverage_area"),
            yield_per_unit: bag.number("yield_per_unit"),
            length: bag.first_number(&["length", "length_m"]),
            package_weight: bag.first_number(&["package_weight", "weight_kg", "weight"]),
            consumption_kg_m2: bag.number("consumption_kg_m2"),
            consumption_kg_m2_mm: bag.number("consumption_kg_m2_mm"),
            units_per_package: bag.first_number(&["units_per_package", "quantity_per_box"]),
            min_thickness_mm: bag.number("min_thickness_mm"),
            max_thickness_mm: bag.number("max_thickness_mm"),
        }
    }

    /// `coverage_area`, then `yield_per_unit`
    pub fn coverage(&self) -> Option<f64> {
        self.coverage_area.or(self.yield_per_unit).filter(|c| *c > 0.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PanelSpecs {
    /// Rated power in W
    pub power_w: Option<f64>,
    pub voc: Option<f64>,
    pub area_m2: Option<f64>,
    pub efficiency: Option<f64>,
}

impl PanelSpecs {
    pub fn from_bag(bag: &SpecBag) -> Self {
        let area_m2 = bag.first_number(&["area", "area_m2"]).or_else(|| {
            match (bag.number("width"), bag.number("height")) {
                // dimensions are catalogued in mm
                (Some(w), Some(h)) if w > 10.0 && h > 10.0 => Some(w * h / 1_000_000.0),
                (Some(w), Some(h)) => Some(w * h),
                _ => None,
            }
        });
        Self {
            power_w: bag.number("power"),
            voc: bag.first_number(&["voc", "open_circuit_voltage"]),
            area_m2,
            efficiency: bag.number("efficiency"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InverterSpecs {
    /// Rated AC power in W
    pub power_w: Option<f64>,
    pub max_input_voltage: Option<f64>,
    pub mppt_count: Option<f64>,
}

impl InverterSpecs {
    pub fn from_bag(bag: &SpecBag) -> Self {
        // inverters are often catalogued in kW
        let power_w = bag.number("power").map(|p| if p < 100.0 { p * 1000.0 } else { p });
        Self {
            power_w,
            max_input_voltage: bag.first_number(&["max_input_voltage", "max_dc_voltage"]),
            mppt_count: bag.first_number(&["mppt_count", "mppts"]),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatterySpecs {
    /// Nominal capacity in kWh
    pub capacity_kwh: Option<f64>,
    /// Depth of discharge as a fraction (0-1)
    pub dod: Option<f64>,
    pub voltage: Option<f64>,
    pub cycles: Option<f64>,
}

impl BatterySpecs {
    pub fn from_bag(bag: &SpecBag) -> Self {
        Self {
            capacity_kwh: bag.number("capacity"),
            // percent values (e.g. 90) become fractions
            dod: bag.number("dod").map(|d| if d > 1.0 { d / 100.0 } else { d }),
            voltage: bag.number("voltage"),
            cycles: bag.number("cycles"),
        }
    }

    /// Usable kWh per unit
    pub fn usable_kwh(&self) -> Option<f64> {
        Some(self.capacity_kwh? * self.dod?)
    }
}

/// Typed specifications, keyed by product kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProductSpecs {
    Material(MaterialSpecs),
    SolarPanel(PanelSpecs),
    Inverter(InverterSpecs),
    Battery(BatterySpecs),
}

impl ProductSpecs {
    pub fn from_bag(kind: SpecKind, bag: &SpecBag) -> Self {
        match kind {
            SpecKind::Material => Self::Material(MaterialSpecs::from_bag(bag)),
            SpecKind::SolarPanel => Self::SolarPanel(PanelSpecs::from_bag(bag)),
            SpecKind::Inverter => Self::Inverter(InverterSpecs::from_bag(bag)),
            SpecKind::Battery => Self::Battery(BatterySpecs::from_bag(bag)),
        }
    }

    pub fn kind(&self) -> SpecKind {
        match self {
            Self::Material(_) => SpecKind::Material,
            Self::SolarPanel(_) => SpecKind::SolarPanel,
            Self::Inverter(_) => SpecKind::Inverter,
            Self::Battery(_) => SpecKind::Battery,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::categories;
    use serde_json::json;

    fn battery(specs: Value) -> Product {
        Product::new("bat", "Bateria 5kWh", categories::BATTERY_BACKUP, 9000.0)
            .with_subcategory("bateria")
            .with_specifications(specs)
    }

    #[test]
    fn test_string_and_object_forms_match() {
        let object = json!({"coverage_area": 3.0, "power_rating": 550});
        let from_object = get_product_specs(
            &Product::new("a", "A", "c", 1.0).with_specifications(object.clone()),
        );
        let raw = Value::String(object.to_string());
        let from_string =
            get_product_specs(&Product::new("a", "A", "c", 1.0).with_specifications(raw));
        assert_eq!(from_object, from_string);
        assert_eq!(from_object.number("power"), Some(550.0));
    }

    #[test]
    fn test_malformed_json_gives_empty_bag() {
        let product = Product::new("a", "A", "c", 1.0)
            .with_specifications(Value::String("{not json".to_string()));
        assert!(get_product_specs(&product).is_empty());

        let array = Product::new("a", "A", "c", 1.0).with_specifications(json!([1, 2]));
        assert!(get_product_specs(&array).is_empty());
    }

    #[test]
    fn test_power_alias_both_directions() {
        let legacy = get_product_specs(
            &Product::new("a", "A", "c", 1.0).with_specifications(json!({"power_rating": 5000})),
        );
        assert_eq!(legacy.number("power"), Some(5000.0));

        let modern = get_product_specs(
            &Product::new("a", "A", "c", 1.0).with_specifications(json!({"power": 3000})),
        );
        assert_eq!(modern.number("power_rating"), Some(3000.0));
    }

    #[test]
    fn test_battery_aliases_only_for_batteries() {
        let specs = json!({"capacity_kwh": 5.12, "depth_of_discharge": 90, "life_cycles": 6000});
        let bag = get_product_specs(&battery(specs.clone()));
        assert_eq!(bag.number("capacity"), Some(5.12));
        assert_eq!(bag.number("dod"), Some(90.0));
        assert_eq!(bag.number("cycles"), Some(6000.0));

        let not_battery = get_product_specs(
            &Product::new("x", "Cabo", categories::SOLAR, 1.0).with_specifications(specs),
        );
        assert!(!not_battery.contains("capacity"));
    }

    #[test]
    fn test_canonical_key_wins() {
        let bag = get_product_specs(&battery(json!({"capacity": 10.0, "capacity_kwh": 5.0})));
        assert_eq!(bag.number("capacity"), Some(10.0));
    }

    #[test]
    fn test_numeric_strings() {
        let bag = get_product_specs(
            &Product::new("a", "A", "c", 1.0).with_specifications(json!({"coverage_area": "3,1"})),
        );
        assert_eq!(bag.number("coverage_area"), Some(3.1));
    }

    #[test]
    fn test_typed_battery_specs_normalize_dod() {
        let product =
            battery(json!({"capacity_kwh": 5.0, "depth_of_discharge": 90, "voltage": 51.2}));
        let bag = get_product_specs(&product);
        let specs = ProductSpecs::from_bag(SpecKind::of(&product), &bag);
        match specs {
            ProductSpecs::Battery(b) => {
                assert_eq!(b.dod, Some(0.9));
                assert!((b.usable_kwh().unwrap() - 4.5).abs() < 1e-9);
            }
            other => panic!("expected battery specs, got {:?}", other),
        }
    }

    #[test]
    fn test_inverter_kw_to_w() {
        let bag = get_product_specs(
            &Product::new("i", "Inversor", "c", 1.0).with_specifications(json!({"power": 5})),
        );
        assert_eq!(InverterSpecs::from_bag(&bag).power_w, Some(5000.0));
    }

    #[test]
    fn test_spec_kind_detection() {
        let panel =
            Product::new("p", "Painel", categories::SOLAR, 1.0).with_solar_category("panel");
        let inverter =
            Product::new("i", "Inversor", categories::SOLAR, 1.0).with_subcategory("Inversor");
        let osb = Product::new("o", "OSB", categories::SHINGLE, 1.0);
        assert_eq!(SpecKind::of(&panel), SpecKind::SolarPanel);
        assert_eq!(SpecKind::of(&inverter), SpecKind::Inverter);
        assert_eq!(SpecKind::of(&osb), SpecKind::Material);
    }
}
