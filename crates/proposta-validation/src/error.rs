use std::path::PathBuf;
use thiserror::Error;

/// Failure to read or parse a validation config document
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("CONFIG/cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CONFIG/invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("CONFIG/invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CONFIG/unsupported config format '{0}', expected .yaml, .yml or .json")]
    UnsupportedFormat(String),
}
