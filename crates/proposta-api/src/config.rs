//! Server configuration from the environment
use proposta_validation::{ConfigError, ValidationConfig};
use std::path::PathBuf;

pub const DEFAULT_ADDR: &str = "0.0.0.0:8787";

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub addr: String,
    /// YAML or JSON validation profile applied to requests that omit `strictness`
    pub validation_config: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            validation_config: None,
        }
    }
}

impl ServerConfig {
    /// Reads `PROPOSTA_ADDR` and `PROPOSTA_VALIDATION_CONFIG`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            addr: lookup("PROPOSTA_ADDR")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_ADDR.to_string()),
            validation_config: lookup("PROPOSTA_VALIDATION_CONFIG")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
        }
    }

    pub fn load_validation(&self) -> Result<Option<ValidationConfig>, ConfigError> {
        self.validation_config
            .as_ref()
            .map(ValidationConfig::load)
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_unset() {
        let config = ServerConfig::from_lookup(|_| None);
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.load_validation().unwrap(), None);
    }

    #[test]
    fn test_reads_both_variables() {
        let config = ServerConfig::from_lookup(|key| match key {
            "PROPOSTA_ADDR" => Some("127.0.0.1:9000".into()),
            "PROPOSTA_VALIDATION_CONFIG" => Some("/etc/proposta/validation.yaml".into()),
            _ => None,
        });
        assert_eq!(config.addr, "127.0.0.1:9000");
        assert_eq!(
            config.validation_config,
            Some(PathBuf::from("/etc/proposta/validation.yaml"))
        );
    }

    #[test]
    fn test_blank_addr_falls_back() {
        let config = ServerConfig::from_lookup(|key| (key == "PROPOSTA_ADDR").then(|| "  ".into()));
        assert_eq!(config.addr, DEFAULT_ADDR);
    }
}
