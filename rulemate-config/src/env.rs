// Environment variable loading

use crate::{ConfigError, Result};
use rulemate_log::debug;
use rulemate_validation::ValidatorOptions;
use std::collections::HashMap;
use std::env;
use std::path::Path;

pub const DEFAULT_PREFIX: &str = "RULEMATE";

/// Reads prefixed environment variables, e.g. `RULEMATE_ABORT_EARLY`.
#[derive(Debug, Clone)]
pub struct EnvLoader {
    prefix: String,
}

impl EnvLoader {
    /// Create a new environment loader
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Get the prefix
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// All variables carrying the prefix, keyed by the lowercased remainder
    pub fn load(&self) -> HashMap<String, String> {
        self.collect(env::vars())
    }

    fn collect(&self, vars: impl IntoIterator<Item = (String, String)>) -> HashMap<String, String> {
        vars.into_iter()
            .filter_map(|(key, value)| {
                let rest = key.strip_prefix(&self.prefix)?.strip_prefix('_')?;
                Some((rest.to_lowercase(), value))
            })
            .collect()
    }

    /// Load a specific variable, `key` given without the prefix
    pub fn load_var(&self, key: &str) -> Result<String> {
        let full_key = format!("{}_{}", self.prefix, key.to_uppercase());
        env::var(&full_key).map_err(ConfigError::EnvError)
    }

    /// Load with default value
    pub fn load_var_or(&self, key: &str, default: &str) -> String {
        self.load_var(key).unwrap_or_else(|_| default.to_string())
    }

    /// Override `base` with `<PREFIX>_PROPERTIES_MUST_MATCH`,
    /// `<PREFIX>_ABORT_EARLY` and `<PREFIX>_CACHE`.
    pub fn options_from_env(&self, base: ValidatorOptions) -> Result<ValidatorOptions> {
        self.options_from(base, &self.load())
    }

    /// Override `base` from already collected variables (keys as returned
    /// by [`load`](Self::load)).
    pub fn options_from(
        &self,
        base: ValidatorOptions,
        vars: &HashMap<String, String>,
    ) -> Result<ValidatorOptions> {
        let mut options = base;
        if let Some(value) = self.flag(vars, "properties_must_match")? {
            options.properties_must_match = value;
        }
        if let Some(value) = self.flag(vars, "abort_early")? {
            options.abort_early = value;
        }
        if let Some(value) = self.flag(vars, "cache")? {
            options.cache = value;
        }
        debug!(
            properties_must_match = options.properties_must_match,
            abort_early = options.abort_early,
            cache = options.cache;
            "Validator options resolved from environment"
        );
        Ok(options)
    }

    fn flag(&self, vars: &HashMap<String, String>, name: &str) -> Result<Option<bool>> {
        let Some(raw) = vars.get(name) else {
            return Ok(None);
        };
        match raw.trim().to_lowercase().as_str() {
            "1" | "true" => Ok(Some(true)),
            "0" | "false" => Ok(Some(false)),
            _ => Err(ConfigError::InvalidValue {
                key: format!("{}_{}", self.prefix, name.to_uppercase()),
                value: raw.clone(),
            }),
        }
    }
}

impl Default for EnvLoader {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

/// Load a `.env` file into the process environment. Without a path the
/// nearest `.env` is used if one exists.
pub fn load_dotenv(path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            dotenvy::from_path(path).map_err(|e| ConfigError::LoadError(e.to_string()))?;
        }
        None => {
            dotenvy::dotenv().ok();
        }
    }
    Ok(())
}
