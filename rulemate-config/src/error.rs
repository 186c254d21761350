// Error types for document loading

use rulemate_validation::EngineError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load document: {0}")]
    LoadError(String),

    #[error("Failed to parse document: {0}")]
    ParseError(String),

    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("Schema not found: {0}")]
    SchemaNotFound(String),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Invalid rule configuration: {0}")]
    Engine(#[from] EngineError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    EnvError(#[from] std::env::VarError),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
