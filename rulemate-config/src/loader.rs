// Rule, schema and error-message document loaders

use crate::{ConfigError, Result};
use rulemate_log::debug;
use rulemate_validation::{ErrorCatalog, RuleSet, Schema};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Supported document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Toml,
}

impl FileFormat {
    /// Format for an extension, ignoring case
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "json" => Some(FileFormat::Json),
            "toml" => Some(FileFormat::Toml),
            _ => None,
        }
    }

    /// Detect the format of a file from its extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .ok_or_else(|| ConfigError::UnsupportedFormat(path.display().to_string()))?;

        Self::from_extension(ext).ok_or_else(|| ConfigError::UnsupportedFormat(ext.to_string()))
    }
}

/// Parses rule documents into JSON values and typed models.
#[derive(Debug, Clone, Copy)]
pub struct DocumentLoader {
    format: FileFormat,
}

impl DocumentLoader {
    /// Create a new loader
    pub fn new(format: FileFormat) -> Self {
        Self { format }
    }

    /// Auto-detect format from file extension
    pub fn auto(path: impl AsRef<Path>) -> Result<Self> {
        FileFormat::from_path(path.as_ref()).map(Self::new)
    }

    /// Get the format
    pub fn format(&self) -> FileFormat {
        self.format
    }

    /// Load a document from file
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<Value> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::LoadError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        debug!(path = path.display(), format = format!("{:?}", self.format); "Loading document");
        self.parse(&content)
    }

    /// Parse a document from string
    pub fn parse(&self, content: &str) -> Result<Value> {
        match self.format {
            FileFormat::Json => serde_json::from_str(content)
                .map_err(|e| ConfigError::ParseError(format!("JSON parse error: {}", e))),
            FileFormat::Toml => {
                let document: toml::Value = toml::from_str(content)
                    .map_err(|e| ConfigError::ParseError(format!("TOML parse error: {}", e)))?;
                serde_json::to_value(document).map_err(|e| {
                    ConfigError::ParseError(format!("TOML to JSON conversion error: {}", e))
                })
            }
        }
    }

    /// Parse a document into a typed model
    pub fn parse_as<T: DeserializeOwned>(&self, content: &str) -> Result<T> {
        into_model(self.parse(content)?)
    }

    /// Load a document from file into a typed model
    pub fn load_as<T: DeserializeOwned>(&self, path: impl AsRef<Path>) -> Result<T> {
        into_model(self.load_file(path)?)
    }
}

fn into_model<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load a rule catalog, format detected from the extension
pub fn load_rules(path: impl AsRef<Path>) -> Result<RuleSet> {
    let path = path.as_ref();
    DocumentLoader::auto(path)?.load_as(path)
}

/// Load a schema, format detected from the extension
pub fn load_schema(path: impl AsRef<Path>) -> Result<Schema> {
    let path = path.as_ref();
    DocumentLoader::auto(path)?.load_as(path)
}

/// Load an error-message catalog, format detected from the extension
pub fn load_error_messages(path: impl AsRef<Path>) -> Result<ErrorCatalog> {
    let path = path.as_ref();
    DocumentLoader::auto(path)?.load_as(path)
}
