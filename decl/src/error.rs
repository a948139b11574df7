//! Error types for loading parser definitions.

use argkit_core::ConstructionError;
use thiserror::Error;

/// Errors raised while reading or building a parser definition.
#[derive(Debug, Error)]
pub enum DeclError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("unsupported definition format: {0}")]
    UnsupportedFormat(String),

    #[error("invalid parser definition: {0}")]
    Construction(#[from] ConstructionError),
}

pub type Result<T> = std::result::Result<T, DeclError>;
