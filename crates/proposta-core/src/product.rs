//! Catalog product records
//!
//! Products are owned by the surrounding application; the calculators only
//! read them. `specifications` is kept as raw JSON (string or object) and is
//! normalized by [`crate::specs::get_product_specs`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Well-known catalog category identifiers
pub mod categories {
    pub const SHINGLE: &str = "telhas_shingle";
    pub const DRYWALL: &str = "drywall";
    pub const SOLAR: &str = "energia_solar";
    pub const BATTERY_BACKUP: &str = "battery_backup";
    pub const WATERPROOFING: &str = "impermeabilizacao";
    pub const FLOOR_PREP: &str = "preparacao_piso";
}

/// A catalog entry as supplied by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solar_category: Option<String>,
    #[serde(default = "default_unit")]
    pub unit: String,
    #[serde(default)]
    pub base_price: f64,
    /// Free-form JSON: either an object or a string holding JSON
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specifications: Option<Value>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Explicit role tag set at catalog-entry time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub functional_role: Option<FunctionalRole>,
}

fn default_unit() -> String {
    "un".to_string()
}

fn default_true() -> bool {
    true
}

impl Product {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: impl Into<String>,
        base_price: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            code: None,
            category: category.into(),
            subcategory: None,
            solar_category: None,
            unit: default_unit(),
            base_price,
            specifications: None,
            is_active: true,
            functional_role: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_subcategory(mut self, subcategory: impl Into<String>) -> Self {
        self.subcategory = Some(subcategory.into());
        self
    }

    pub fn with_solar_category(mut self, solar_category: impl Into<String>) -> Self {
        self.solar_category = Some(solar_category.into());
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    pub fn with_specifications(mut self, specifications: Value) -> Self {
        self.specifications = Some(specifications);
        self
    }

    pub fn with_role(mut self, role: FunctionalRole) -> Self {
        self.functional_role = Some(role);
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Price of exactly zero means "not configured yet"
    pub fn is_unpriced(&self) -> bool {
        self.base_price <= 0.0 || !self.base_price.is_finite()
    }

    /// Battery detection used when aliasing specifications
    pub fn is_battery(&self) -> bool {
        if self.functional_role == Some(FunctionalRole::Battery) {
            return true;
        }
        const BATTERY_CATEGORIES: [&str; 3] =
            [categories::BATTERY_BACKUP, categories::SOLAR, "solar"];
        const BATTERY_KINDS: [&str; 4] = ["bateria", "baterias", "battery", "batteries"];

        if !BATTERY_CATEGORIES.contains(&self.category.to_lowercase().as_str()) {
            return false;
        }
        [&self.subcategory, &self.solar_category]
            .iter()
            .filter_map(|v| v.as_deref())
            .any(|kind| BATTERY_KINDS.contains(&kind.to_lowercase().as_str()))
    }
}

/// Declared purpose of a product inside a calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FunctionalRole {
    ShingleMain,
    Osb,
    Underlayment,
    RidgeCap,
    StarterStrip,
    Nails,
    DripEdge,
    ValleyFlashing,
    Sealant,
    DrywallBoard,
    DrywallProfile,
    PerimeterAngle,
    Hanger,
    Screws,
    JointCompound,
    JointTape,
    Insulation,
    SolarPanel,
    Inverter,
    Battery,
    MountingStructure,
    SolarCable,
    Connector,
    StringBox,
    Installation,
    Primer,
    WaterproofingMembrane,
    ReinforcementMesh,
    SealingTape,
    LevelingCompound,
    PerimeterStrip,
}

impl FunctionalRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ShingleMain => "shingle-main",
            Self::Osb => "osb",
            Self::Underlayment => "underlayment",
            Self::RidgeCap => "ridge-cap",
            Self::StarterStrip => "starter-strip",
            Self::Nails => "nails",
            Self::DripEdge => "drip-edge",
            Self::ValleyFlashing => "valley-flashing",
            Self::Sealant => "sealant",
            Self::DrywallBoard => "drywall-board",
            Self::DrywallProfile => "drywall-profile",
            Self::PerimeterAngle => "perimeter-angle",
            Self::Hanger => "hanger",
            Self::Screws => "screws",
            Self::JointCompound => "joint-compound",
            Self::JointTape => "joint-tape",
            Self::Insulation => "insulation",
            Self::SolarPanel => "solar-panel",
            Self::Inverter => "inverter",
            Self::Battery => "battery",
            Self::MountingStructure => "mounting-structure",
            Self::SolarCable => "solar-cable",
            Self::Connector => "connector",
            Self::StringBox => "string-box",
            Self::Installation => "installation",
            Self::Primer => "primer",
            Self::WaterproofingMembrane => "waterproofing-membrane",
            Self::ReinforcementMesh => "reinforcement-mesh",
            Self::SealingTape => "sealing-tape",
            Self::LevelingCompound => "leveling-compound",
            Self::PerimeterStrip => "perimeter-strip",
        }
    }
}

impl fmt::Display for FunctionalRole {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_with_defaults() {
        let product: Product = serde_json::from_value(json!({
            "id": "p1",
            "name": "Telha Oakridge",
            "category": "telhas_shingle",
            "base_price": 120.5,
            "functional_role": "shingle-main"
        }))
        .unwrap();

        assert!(product.is_active);
        assert_eq!(product.unit, "un");
        assert_eq!(product.functional_role, Some(FunctionalRole::ShingleMain));
        assert!(product.specifications.is_none());
    }

    #[test]
    fn test_battery_detection() {
        let by_subcategory = Product::new("b1", "Bateria LiFePO4", categories::BATTERY_BACKUP, 1.0)
            .with_subcategory("Bateria");
        let by_solar_category = Product::new("b2", "Battery", categories::SOLAR, 1.0)
            .with_solar_category("battery");
        let wrong_category = Product::new("b3", "Bateria", categories::DRYWALL, 1.0)
            .with_subcategory("bateria");
        let inverter = Product::new("i1", "Inversor", categories::SOLAR, 1.0)
            .with_solar_category("inverter");

        assert!(by_subcategory.is_battery());
        assert!(by_solar_category.is_battery());
        assert!(!wrong_category.is_battery());
        assert!(!inverter.is_battery());
    }

    #[test]
    fn test_unpriced() {
        assert!(Product::new("x", "x", "c", 0.0).is_unpriced());
        assert!(!Product::new("x", "x", "c", 10.0).is_unpriced());
    }

    #[test]
    fn test_role_wire_names() {
        let value = serde_json::to_value(FunctionalRole::WaterproofingMembrane).unwrap();
        assert_eq!(value, json!("waterproofing-membrane"));
        assert_eq!(FunctionalRole::ShingleMain.to_string(), "shingle-main");
    }
}
