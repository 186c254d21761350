//! Record validation engine.
//!
//! A [`Validator`] owns one record plus the rules, schema, helpers, hooks and
//! options it was built with. Each instance keeps its own error accumulator
//! and per-field cache; nothing is shared between instances.
//!
//! A full [`Validator::validate`] pass runs through:
//!
//! 1. structural checks (empty record, schema fields absent from the record)
//! 2. per-field evaluation, either all fields concurrently or one at a time
//!    stopping at the first invalid field (`abort_early`)
//! 3. aggregation of field errors
//! 4. a final required-field guard

use crate::{
    CheckError, EngineError, ErrorCatalog, ErrorMap, HelperContext, HelperFactory, HelperStack,
    NoopHooks, PatternCache, Record, Result, RuleSet, Schema, SchemaField, ValidationHooks,
    bind_predicates, compile_pattern, validate_attribute,
};
use futures::future::try_join_all;
use rulemate_log::{debug, trace, warn};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub const MISSING_FIELDS_MESSAGE: &str = "Missing fields for schema";
pub const MISSING_PROPERTIES_MESSAGE: &str = "Missing properties";
pub const INVALID_PROPERTY_MESSAGE: &str = "Invalid property";

const MISSING_FIELDS_DIAGNOSTIC: &str = "internal: schema - missing fields";
const MISSING_PROPERTIES_DIAGNOSTIC: &str = "internal: schema - missing properties";
const REQUIRED_DIAGNOSTIC: &str = "internal: fields - required";

/// Engine behaviour switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidatorOptions {
    /// Record keys absent from the schema are errors
    pub properties_must_match: bool,
    /// Stop at the first invalid field instead of evaluating all of them
    pub abort_early: bool,
    /// Default for fields without their own `cache` setting
    pub cache: bool,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        Self {
            properties_must_match: true,
            abort_early: false,
            cache: true,
        }
    }
}

impl ValidatorOptions {
    /// Set whether undeclared record keys are errors
    pub fn properties_must_match(mut self, enabled: bool) -> Self {
        self.properties_must_match = enabled;
        self
    }

    /// Set whether validation stops at the first invalid field
    pub fn abort_early(mut self, enabled: bool) -> Self {
        self.abort_early = enabled;
        self
    }

    /// Set the default cache behaviour
    pub fn cache(mut self, enabled: bool) -> Self {
        self.cache = enabled;
        self
    }
}

/// Everything needed to build a [`Validator`].
#[derive(Clone)]
pub struct ValidatorConfig {
    pub rules: RuleSet,
    pub schema: Schema,
    pub error_messages: ErrorCatalog,
    pub helpers: Arc<dyn HelperFactory>,
    pub hooks: Arc<dyn ValidationHooks>,
    pub options: ValidatorOptions,
}

impl ValidatorConfig {
    /// Config with no predicates, no messages, no hooks and default options
    pub fn new(rules: RuleSet, schema: Schema) -> Self {
        Self {
            rules,
            schema,
            error_messages: ErrorCatalog::new(),
            helpers: Arc::new(HelperStack::new()),
            hooks: Arc::new(NoopHooks),
            options: ValidatorOptions::default(),
        }
    }

    /// Use a helper factory
    pub fn with_helpers<H>(mut self, helpers: H) -> Self
    where
        H: HelperFactory + 'static,
    {
        self.helpers = Arc::new(helpers);
        self
    }

    /// Use a shared helper factory
    pub fn with_shared_helpers(mut self, helpers: Arc<dyn HelperFactory>) -> Self {
        self.helpers = helpers;
        self
    }

    /// Set the error message catalog
    pub fn with_error_messages(mut self, error_messages: ErrorCatalog) -> Self {
        self.error_messages = error_messages;
        self
    }

    /// Observe validation with hooks
    pub fn with_hooks<H>(mut self, hooks: H) -> Self
    where
        H: ValidationHooks + 'static,
    {
        self.hooks = Arc::new(hooks);
        self
    }

    /// Observe validation with shared hooks
    pub fn with_shared_hooks(mut self, hooks: Arc<dyn ValidationHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Set engine options
    pub fn with_options(mut self, options: ValidatorOptions) -> Self {
        self.options = options;
        self
    }

    /// Resolve every schema field's rule and modifier and compile their
    /// patterns.
    pub fn check(&self) -> Result<()> {
        self.compile_patterns().map(|_| ())
    }

    pub(crate) fn compile_patterns(&self) -> Result<PatternCache> {
        let mut patterns = PatternCache::new();
        for (name, field) in self.schema.iter() {
            let resolved = self.rules.resolve(name, &field.rule).inspect_err(|_| {
                warn!(field = name, rule = field.rule; "Schema references an unresolvable rule");
            })?;

            let Some(raw) = resolved.definition.regex.as_deref() else {
                continue;
            };
            if patterns.contains_key(raw) {
                continue;
            }
            let compiled = compile_pattern(raw).map_err(|source| {
                warn!(field = name, rule = field.rule; "Rule pattern does not compile");
                EngineError::InvalidPattern {
                    field: name.to_string(),
                    rule: field.rule.clone(),
                    source,
                }
            })?;
            patterns.insert(raw.to_string(), compiled);
        }
        Ok(patterns)
    }
}

impl fmt::Debug for ValidatorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorConfig")
            .field("rules", &self.rules.len())
            .field("schema", &self.schema.len())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Outcome of a validation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    /// Every field passed
    Valid,
    /// The record's shape is wrong; no field-level detail
    Structural { message: String },
    /// One or more fields failed their rules
    Invalid { errors: ErrorMap },
    /// A required schema field is absent from the record
    RequiredMissing,
}

impl ValidationResult {
    /// Check if every field passed
    pub fn is_ok(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    /// Check if validation failed
    pub fn is_error(&self) -> bool {
        !self.is_ok()
    }

    /// Get field errors, if any field failed
    pub fn errors(&self) -> Option<&ErrorMap> {
        match self {
            ValidationResult::Invalid { errors } => Some(errors),
            _ => None,
        }
    }

    /// Get the structural error message
    pub fn error_message(&self) -> Option<&str> {
        match self {
            ValidationResult::Structural { message } => Some(message),
            _ => None,
        }
    }

    /// Wire form: `{ok}`, `{error, errorMessage}`, `{error, errors}` or `{error}`
    pub fn to_json(&self) -> Value {
        match self {
            ValidationResult::Valid => json!({ "ok": true }),
            ValidationResult::Structural { message } => {
                json!({ "error": true, "errorMessage": message })
            }
            ValidationResult::Invalid { errors } => json!({ "error": true, "errors": errors }),
            ValidationResult::RequiredMissing => json!({ "error": true }),
        }
    }
}

impl Serialize for ValidationResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    is_valid: bool,
    error: Option<CheckError>,
}

#[derive(Debug)]
struct FieldOutcome {
    field: String,
    is_valid: bool,
    error: Option<CheckError>,
    cache: Option<CacheEntry>,
}

impl FieldOutcome {
    fn passed(field: &str) -> Self {
        Self {
            field: field.to_string(),
            is_valid: true,
            error: None,
            cache: None,
        }
    }
}

/// Validates one record against a schema.
pub struct Validator {
    record: Record,
    config: ValidatorConfig,
    errors: ErrorMap,
    cache: HashMap<String, CacheEntry>,
    patterns: PatternCache,
}

impl Validator {
    /// Build a validator, failing if any schema field names an unknown rule
    /// or modifier, or a rule pattern that does not compile.
    pub fn new(record: Record, config: ValidatorConfig) -> Result<Self> {
        let patterns = config.compile_patterns()?;
        debug!(
            fields = config.schema.len(),
            rules = config.rules.len();
            "Validator created"
        );
        Ok(Self {
            record,
            config,
            errors: ErrorMap::new(),
            cache: HashMap::new(),
            patterns,
        })
    }

    /// Get the record under validation
    pub fn record(&self) -> &Record {
        &self.record
    }

    /// Replace the record. Cached field outcomes are kept, so unchanged
    /// values are not re-evaluated.
    pub fn set_data(&mut self, record: Record) {
        self.record = record;
    }

    /// Errors accumulated by the latest calls
    pub fn errors(&self) -> &ErrorMap {
        &self.errors
    }

    /// Get engine options
    pub fn options(&self) -> &ValidatorOptions {
        &self.config.options
    }

    /// Get the configuration
    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Validate the whole record.
    pub async fn validate(&mut self) -> Result<ValidationResult> {
        let hooks = self.config.hooks.clone();
        hooks.on_validate_start(&self.record);
        self.errors.clear();

        if self.record.is_empty() {
            debug!("Validation rejected: record has no fields");
            let diagnostic = CheckError::internal(MISSING_FIELDS_DIAGNOSTIC, MISSING_FIELDS_MESSAGE);
            hooks.on_validate_end(&self.record, Some(std::slice::from_ref(&diagnostic)));
            return Ok(ValidationResult::Structural {
                message: MISSING_FIELDS_MESSAGE.to_string(),
            });
        }

        if let Some((missing, _)) = self
            .config
            .schema
            .iter()
            .find(|(name, _)| !self.record.contains_key(*name))
        {
            debug!(field = missing; "Validation rejected: schema field absent from record");
            let diagnostic =
                CheckError::internal(MISSING_PROPERTIES_DIAGNOSTIC, MISSING_PROPERTIES_MESSAGE);
            hooks.on_validate_end(&self.record, Some(std::slice::from_ref(&diagnostic)));
            return Ok(ValidationResult::Structural {
                message: MISSING_PROPERTIES_MESSAGE.to_string(),
            });
        }

        let all_valid = if self.config.options.abort_early {
            self.validate_until_failure().await?
        } else {
            self.validate_all_fields().await?
        };

        if !all_valid {
            let errors: Vec<CheckError> = self.errors.values().cloned().collect();
            debug!(invalid = errors.len(); "Validation finished with field errors");
            hooks.on_validate_end(&self.record, Some(errors.as_slice()));
            return Ok(ValidationResult::Invalid {
                errors: self.errors.clone(),
            });
        }

        let required_present = self
            .config
            .schema
            .required_fields()
            .all(|name| self.record.contains_key(name));
        if !required_present {
            let diagnostic = CheckError::internal(REQUIRED_DIAGNOSTIC, "");
            hooks.on_validate_end(&self.record, Some(std::slice::from_ref(&diagnostic)));
            return Ok(ValidationResult::RequiredMissing);
        }

        debug!("Validation finished: record valid");
        hooks.on_validate_end(&self.record, None);
        Ok(ValidationResult::Valid)
    }

    /// Validate a single field of the current record. A field missing from
    /// the record is evaluated as `null`.
    pub async fn validate_field(&mut self, name: &str) -> Result<ValidationResult> {
        let value = self.record.get(name).cloned().unwrap_or(Value::Null);
        let outcome = self.evaluate_field(name, &value).await?;
        let is_valid = outcome.is_valid;
        self.apply(outcome);

        if is_valid {
            return Ok(ValidationResult::Valid);
        }

        let errors = self
            .errors
            .get(name)
            .map(|error| ErrorMap::from([(name.to_string(), error.clone())]))
            .unwrap_or_default();
        Ok(ValidationResult::Invalid { errors })
    }

    async fn validate_all_fields(&mut self) -> Result<bool> {
        let outcomes = {
            let this = &*self;
            try_join_all(
                this.record
                    .iter()
                    .map(|(field, value)| this.evaluate_field(field, value)),
            )
            .await?
        };

        let mut all_valid = true;
        for outcome in outcomes {
            all_valid &= outcome.is_valid;
            self.apply(outcome);
        }
        Ok(all_valid)
    }

    async fn validate_until_failure(&mut self) -> Result<bool> {
        let entries: Vec<(String, Value)> = self
            .record
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        for (field, value) in entries {
            let outcome = self.evaluate_field(&field, &value).await?;
            let is_valid = outcome.is_valid;
            self.apply(outcome);
            if !is_valid {
                debug!(field = field; "Stopping at first invalid field");
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn apply(&mut self, outcome: FieldOutcome) {
        match outcome.error {
            Some(error) => {
                self.errors.insert(outcome.field.clone(), error);
            }
            None => {
                self.errors.shift_remove(&outcome.field);
            }
        }
        if let Some(entry) = outcome.cache {
            self.cache.insert(outcome.field, entry);
        }
    }

    async fn evaluate_field(&self, field: &str, value: &Value) -> Result<FieldOutcome> {
        let hooks = &self.config.hooks;
        let schema_field = self.config.schema.get(field);
        hooks.on_validate_field_start(field, value, schema_field);

        let Some(schema_field) = schema_field else {
            return Ok(self.undeclared_field(field, value));
        };

        let cache_enabled = schema_field.cache.unwrap_or(self.config.options.cache);
        if cache_enabled {
            if let Some(entry) = self.cache.get(field).filter(|e| e.value == *value) {
                trace!(field = field, valid = entry.is_valid; "Cache hit");
                return Ok(FieldOutcome {
                    field: field.to_string(),
                    is_valid: entry.is_valid,
                    error: entry.error.clone(),
                    cache: None,
                });
            }
        }

        let (is_valid, error) = if schema_field.skips(value) {
            trace!(field = field; "Optional field empty, skipping rule");
            (true, None)
        } else {
            self.run_rule(field, value, schema_field).await?
        };

        match &error {
            Some(error) => hooks.on_validate_field_error(field, value, Some(schema_field), error),
            None => hooks.on_validate_field_success(field, value, Some(schema_field)),
        }

        Ok(FieldOutcome {
            field: field.to_string(),
            is_valid,
            error: error.clone(),
            cache: Some(CacheEntry {
                value: value.clone(),
                is_valid,
                error,
            }),
        })
    }

    fn undeclared_field(&self, field: &str, value: &Value) -> FieldOutcome {
        if self.config.options.properties_must_match {
            trace!(field = field; "Field not declared in schema");
            let error = CheckError::internal(field, INVALID_PROPERTY_MESSAGE);
            self.config
                .hooks
                .on_validate_field_error(field, value, None, &error);
            return FieldOutcome {
                field: field.to_string(),
                is_valid: false,
                error: Some(error),
                cache: None,
            };
        }

        self.config.hooks.on_validate_field_success(field, value, None);
        FieldOutcome::passed(field)
    }

    async fn run_rule(
        &self,
        field: &str,
        value: &Value,
        schema_field: &SchemaField,
    ) -> Result<(bool, Option<CheckError>)> {
        let resolved = self.config.rules.resolve(field, &schema_field.rule)?;
        let ctx = HelperContext {
            field,
            value,
            rule: resolved.rule,
            definition: resolved.definition,
            modifier: resolved.modifier,
            record: &self.record,
            pattern: resolved
                .definition
                .regex
                .as_deref()
                .and_then(|raw| self.patterns.get(raw)),
        };
        let predicates = bind_predicates(self.config.helpers.as_ref(), &ctx);

        let outcome = validate_attribute(field, resolved.definition, &predicates)
            .await
            .inspect_err(|error| {
                if let EngineError::Predicate { .. } = error {
                    rulemate_log::error!(field = field; "{}", error);
                }
            })?;

        if outcome.is_valid {
            trace!(field = field; "Field valid");
            return Ok((true, None));
        }

        let code = outcome.error_code;
        let message = self.config.error_messages.message_for(code.as_deref());
        let mut error = CheckError::new(field).with_code(code).with_message(message);
        error.kind = outcome.error_type;
        trace!(field = field, kind = error.kind.as_deref().unwrap_or(""); "Field invalid");
        Ok((false, Some(error)))
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("record", &self.record)
            .field("config", &self.config)
            .field("errors", &self.errors)
            .field("cached_fields", &self.cache.len())
            .field("patterns", &self.patterns.len())
            .finish()
    }
}
