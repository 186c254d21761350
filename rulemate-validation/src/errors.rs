// Validation errors

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error raised by a predicate while it was being evaluated.
pub type PredicateError = Box<dyn std::error::Error + Send + Sync>;

/// Per-field error entry, keyed by field name in [`ErrorMap`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckError {
    /// Field name
    pub name: String,

    /// Field name (duplicated for consumers that read `field`)
    pub field: String,

    /// Error code of the failing predicate, conventionally `namespace.key`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Name of the failing predicate
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Human readable message resolved from the error catalog, empty if none
    #[serde(default)]
    pub message: String,

    /// Set on errors produced by the engine itself rather than a rule
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub internal: bool,
}

impl CheckError {
    /// Create an error for a field whose rule failed
    pub fn new(field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            name: field.clone(),
            field,
            code: None,
            kind: None,
            message: String::new(),
            internal: false,
        }
    }

    /// Engine-generated diagnostic, e.g. an unexpected property
    pub fn internal(name: impl Into<String>, message: impl Into<String>) -> Self {
        let mut error = Self::new(name);
        error.message = message.into();
        error.internal = true;
        error
    }

    /// Set the error code
    pub fn with_code(mut self, code: Option<String>) -> Self {
        self.code = code;
        self
    }

    /// Set the failing predicate name
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Set the message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

impl fmt::Display for CheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.code, &self.kind) {
            (Some(code), Some(kind)) => write!(f, "{}: {} ({})", self.field, code, kind),
            (None, Some(kind)) => write!(f, "{}: {}", self.field, kind),
            _ => write!(f, "{}: {}", self.field, self.message),
        }
    }
}

/// Accumulated per-field errors, in evaluation order.
pub type ErrorMap = IndexMap<String, CheckError>;

/// Failures that stop a validation call instead of being reported as a
/// [`ValidationResult`](crate::ValidationResult).
#[derive(Debug, Error)]
pub enum EngineError {
    /// Schema field references a rule missing from the rule set
    #[error("Field '{field}' references unknown rule '{rule}'")]
    UnknownRule { field: String, rule: String },

    /// Schema field references a modifier the rule does not declare
    #[error("Field '{field}' references unknown modifier '{modifier}' on rule '{rule}'")]
    UnknownModifier {
        field: String,
        rule: String,
        modifier: String,
    },

    /// Rule lists a predicate the helper factory did not provide
    #[error("Field '{field}' requires predicate '{predicate}' which no helper provides")]
    UnknownPredicate { field: String, predicate: String },

    /// Rule pattern cannot be compiled. Look-around and backreferences are
    /// not supported.
    #[error("Field '{field}' uses rule '{rule}' with an invalid pattern: {source}")]
    InvalidPattern {
        field: String,
        rule: String,
        #[source]
        source: regex::Error,
    },

    /// A caller-supplied predicate returned an error
    #[error("Predicate '{predicate}' failed on field '{field}': {source}")]
    Predicate {
        field: String,
        predicate: String,
        #[source]
        source: PredicateError,
    },
}

impl EngineError {
    /// Whether this is a configuration problem (rule, modifier or predicate
    /// missing, pattern invalid) rather than a runtime predicate failure
    pub fn is_configuration(&self) -> bool {
        !matches!(self, EngineError::Predicate { .. })
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
