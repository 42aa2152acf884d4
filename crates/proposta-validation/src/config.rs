//! Validation profiles
//!
//! `strict` is the production profile: incomplete catalog data blocks the
//! proposal. `lenient` is for initial catalog setup and never blocks.

use crate::error::ConfigError;
use proposta_core::{CatalogEntry, FunctionalRole, SpecKind, Strictness};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Spec keys a product must carry, by role, typed kind, then category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequiredSpecs {
    #[serde(default)]
    pub by_role: BTreeMap<FunctionalRole, Vec<String>>,
    #[serde(default)]
    pub by_kind: BTreeMap<SpecKind, Vec<String>>,
    #[serde(default)]
    pub by_category: BTreeMap<String, Vec<String>>,
}

fn keys(list: &[&str]) -> Vec<String> {
    list.iter().map(|k| k.to_string()).collect()
}

impl Default for RequiredSpecs {
    fn default() -> Self {
        let by_role = BTreeMap::from([
            (FunctionalRole::ShingleMain, keys(&["coverage_area"])),
            (FunctionalRole::Osb, keys(&["coverage_area"])),
            (FunctionalRole::Underlayment, keys(&["coverage_area"])),
            (FunctionalRole::RidgeCap, keys(&["length"])),
            (FunctionalRole::DrywallBoard, keys(&["coverage_area"])),
            (FunctionalRole::WaterproofingMembrane, keys(&["package_weight"])),
            (FunctionalRole::LevelingCompound, keys(&["package_weight"])),
        ]);
        let by_kind = BTreeMap::from([
            (SpecKind::SolarPanel, keys(&["power"])),
            (SpecKind::Inverter, keys(&["power"])),
            (SpecKind::Battery, keys(&["capacity", "dod", "voltage"])),
        ]);
        Self {
            by_role,
            by_kind,
            by_category: BTreeMap::new(),
        }
    }
}

impl RequiredSpecs {
    /// Most specific table entry that applies to the product
    pub fn required_for(&self, entry: &CatalogEntry) -> &[String] {
        if let Some(keys) = entry
            .product
            .functional_role
            .and_then(|role| self.by_role.get(&role))
        {
            return keys;
        }
        if let Some(keys) = self.by_kind.get(&entry.kind()) {
            return keys;
        }
        self.by_category
            .get(&entry.product.category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationConfig {
    /// Findings are errors and block the proposal
    #[serde(default)]
    pub strict_validation: bool,
    /// Check each product against [`RequiredSpecs`]
    #[serde(default)]
    pub require_specifications: bool,
    /// Zero prices are errors (only together with strict validation)
    #[serde(default)]
    pub block_zero_prices: bool,
    #[serde(default)]
    pub required_specs: RequiredSpecs,
}

impl ValidationConfig {
    pub fn strict() -> Self {
        Self {
            strict_validation: true,
            require_specifications: true,
            block_zero_prices: true,
            required_specs: RequiredSpecs::default(),
        }
    }

    pub fn lenient() -> Self {
        Self {
            strict_validation: false,
            require_specifications: false,
            block_zero_prices: false,
            required_specs: RequiredSpecs::default(),
        }
    }

    /// Calculator policy matching this profile
    pub fn strictness(&self) -> Strictness {
        if self.strict_validation {
            Strictness::Strict
        } else {
            Strictness::Lenient
        }
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load from a `.yaml`, `.yml` or `.json` file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        let config = match extension.as_str() {
            "yaml" | "yml" => Self::from_yaml(&raw)?,
            "json" => Self::from_json(&raw)?,
            other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
        };
        tracing::info!(
            path = %path.display(),
            strict = config.strict_validation,
            "validation config loaded"
        );
        Ok(config)
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self::lenient()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proposta_core::{categories, Product};

    #[test]
    fn test_presets() {
        let strict = ValidationConfig::strict();
        assert!(strict.strict_validation);
        assert!(strict.require_specifications && strict.block_zero_prices);
        assert_eq!(strict.strictness(), Strictness::Strict);

        let lenient = ValidationConfig::default();
        assert_eq!(lenient, ValidationConfig::lenient());
        assert_eq!(lenient.strictness(), Strictness::Lenient);
    }

    #[test]
    fn test_camel_case_wire_format() {
        let config = ValidationConfig::from_json(
            r#"{"strictValidation": true, "requireSpecifications": false,
                "blockZeroPrices": true}"#,
        )
        .unwrap();
        assert!(config.strict_validation);
        assert!(!config.require_specifications);
        assert!(config.block_zero_prices);
        assert_eq!(config.required_specs, RequiredSpecs::default());
    }

    #[test]
    fn test_yaml_overrides_required_specs() {
        let yaml = r#"
strictValidation: true
requireSpecifications: true
requiredSpecs:
  byCategory:
    impermeabilizacao: [consumption_kg_m2_mm]
  byKind:
    battery: [capacity, voltage]
"#;
        let config = ValidationConfig::from_yaml(yaml).unwrap();
        assert!(!config.block_zero_prices);
        assert_eq!(
            config.required_specs.by_category.get("impermeabilizacao"),
            Some(&vec!["consumption_kg_m2_mm".to_string()])
        );
        assert_eq!(config.required_specs.by_kind.get(&SpecKind::Battery).map(Vec::len), Some(2));
        assert!(config.required_specs.by_role.is_empty());
    }

    #[test]
    fn test_required_for_precedence() {
        let specs = RequiredSpecs::default();

        let board = CatalogEntry::ingest(
            Product::new("b", "Placa ST", categories::DRYWALL, 40.0)
                .with_role(FunctionalRole::DrywallBoard),
        );
        assert_eq!(specs.required_for(&board), ["coverage_area".to_string()]);

        let battery = CatalogEntry::ingest(
            Product::new("x", "Bateria", categories::BATTERY_BACKUP, 9000.0)
                .with_subcategory("bateria"),
        );
        assert_eq!(specs.required_for(&battery).len(), 3);

        let misc = CatalogEntry::ingest(Product::new("m", "Fita", categories::DRYWALL, 9.0));
        assert!(specs.required_for(&misc).is_empty());
    }

    #[test]
    fn test_invalid_yaml() {
        let err = ValidationConfig::from_yaml("strictValidation: [").unwrap_err();
        assert!(err.to_string().starts_with("CONFIG/"));
    }
}
