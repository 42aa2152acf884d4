//! Loading validation profiles from disk.

use proposta_core::{categories, Product};
use proposta_validation::{validate_products, ConfigError, ValidationConfig};
use std::io::Write;

fn write_config(suffix: &str, content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_yaml_profile() {
    let file = write_config(
        ".yaml",
        "strictValidation: true\nrequireSpecifications: false\nblockZeroPrices: true\n",
    );
    let config = ValidationConfig::load(file.path()).unwrap();
    assert!(config.strict_validation);
    assert!(config.block_zero_prices);
    assert!(!config.require_specifications);
}

#[test]
fn test_load_json_profile() {
    let file = write_config(".json", r#"{"strictValidation": false, "blockZeroPrices": true}"#);
    let config = ValidationConfig::load(file.path()).unwrap();
    assert!(!config.strict_validation);
    assert!(config.block_zero_prices);
}

#[test]
fn test_unknown_extension_rejected() {
    let file = write_config(".toml", "strictValidation = true");
    let err = ValidationConfig::load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::UnsupportedFormat(ref ext) if ext == "toml"));
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = ValidationConfig::load(dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
    assert!(err.to_string().contains("absent.yaml"));
}

#[test]
fn test_loaded_profile_drives_validation() {
    let file = write_config(
        ".yml",
        "strictValidation: true\n\
         requireSpecifications: true\n\
         blockZeroPrices: true\n\
         requiredSpecs:\n  byCategory:\n    drywall: [coverage_area]\n",
    );
    let config = ValidationConfig::load(file.path()).unwrap();
    let products = vec![Product::new("f", "Fita para Junta", categories::DRYWALL, 19.0)];

    let report = validate_products(&products, &[categories::DRYWALL], &config);
    assert!(!report.can_proceed);
    assert_eq!(report.errors[0].spec.as_deref(), Some("coverage_area"));
}

#[test]
fn test_lenient_never_blocks_on_an_empty_catalog() {
    let everything = [
        categories::SHINGLE,
        categories::DRYWALL,
        categories::SOLAR,
        categories::BATTERY_BACKUP,
        categories::WATERPROOFING,
        categories::FLOOR_PREP,
    ];
    let mut config = ValidationConfig::lenient();
    config.require_specifications = true;
    config.block_zero_prices = true;
    let report = validate_products(&[], &everything, &config);
    assert!(report.can_proceed);
    assert_eq!(report.warnings.len(), everything.len());
}
