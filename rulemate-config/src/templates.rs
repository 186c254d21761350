// Template sets: rule, schema and error-message documents loaded together

use crate::loader::{load_error_messages, load_rules, load_schema};
use crate::{ConfigError, FileFormat, Result};
use rulemate_log::{debug, info};
use rulemate_validation::{ErrorCatalog, RuleSet, Schema, ValidatorConfig};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Rules, named schemas and error messages gathered from several files.
///
/// Rule files and error-message files are merged; a later file overrides
/// same-named rules and message codes from an earlier one. Each schema file
/// is registered under its file stem.
#[derive(Debug, Clone, Default)]
pub struct TemplateSet {
    rules: RuleSet,
    schemas: BTreeMap<String, Schema>,
    error_messages: ErrorCatalog,
}

impl TemplateSet {
    /// Create an empty template set
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every supported file from the rules, schemas and error-message
    /// directories, each in file-name order.
    pub fn from_dirs(
        rules_dir: impl AsRef<Path>,
        schemas_dir: impl AsRef<Path>,
        errors_dir: impl AsRef<Path>,
    ) -> Result<Self> {
        let mut set = Self::new();

        for path in document_files(rules_dir.as_ref())? {
            set.add_rules_file(path)?;
        }
        for path in document_files(schemas_dir.as_ref())? {
            set.add_schema_file(path)?;
        }
        for path in document_files(errors_dir.as_ref())? {
            set.add_error_messages_file(path)?;
        }

        info!(
            rules = set.rules.len(),
            schemas = set.schemas.len();
            "Template set loaded"
        );
        Ok(set)
    }

    /// Merge a rule catalog file
    pub fn add_rules_file(&mut self, path: impl AsRef<Path>) -> Result<&mut Self> {
        let rules = load_rules(path)?;
        self.rules.merge(rules);
        Ok(self)
    }

    /// Load a schema file, named after its file stem
    pub fn add_schema_file(&mut self, path: impl AsRef<Path>) -> Result<&mut Self> {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| {
                ConfigError::LoadError(format!("Invalid schema file name: {}", path.display()))
            })?
            .to_string();
        let schema = load_schema(path)?;
        Ok(self.add_schema(name, schema))
    }

    /// Merge an error-message file
    pub fn add_error_messages_file(&mut self, path: impl AsRef<Path>) -> Result<&mut Self> {
        let messages = load_error_messages(path)?;
        self.error_messages.merge(messages);
        Ok(self)
    }

    /// Register a schema; an existing schema with the same name is extended
    pub fn add_schema(&mut self, name: impl Into<String>, schema: Schema) -> &mut Self {
        self.schemas.entry(name.into()).or_default().merge(schema);
        self
    }

    /// Get the merged rule catalog
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Get a schema by name
    pub fn schema(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name)
    }

    pub fn schema_names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    /// Get the merged error catalog
    pub fn error_messages(&self) -> &ErrorCatalog {
        &self.error_messages
    }

    /// Validator configuration for the named schema. Helpers, hooks and
    /// options are left at their defaults.
    pub fn config(&self, schema: &str) -> Result<ValidatorConfig> {
        let fields = self
            .schemas
            .get(schema)
            .cloned()
            .ok_or_else(|| ConfigError::SchemaNotFound(schema.to_string()))?;

        let config = ValidatorConfig::new(self.rules.clone(), fields)
            .with_error_messages(self.error_messages.clone());
        config.check()?;
        Ok(config)
    }
}

fn document_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let supported = path
            .extension()
            .and_then(|s| s.to_str())
            .and_then(FileFormat::from_extension)
            .is_some();
        if path.is_file() && supported {
            files.push(path);
        } else {
            debug!(path = path.display(); "Skipping non-document entry");
        }
    }
    files.sort();
    Ok(files)
}
