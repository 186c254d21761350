// Single-field rule execution

use crate::{EngineError, PredicateSet, Result, RuleDefinition};
use rulemate_log::trace;

/// Result of running one rule definition against one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeOutcome {
    pub is_valid: bool,
    /// Error code declared for the first failing predicate
    pub error_code: Option<String>,
    /// Name of the first failing predicate
    pub error_type: Option<String>,
}

impl AttributeOutcome {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            error_code: None,
            error_type: None,
        }
    }
}

/// Run every predicate of `definition` in declaration order.
///
/// Each predicate is awaited before the next one starts and all of them run;
/// only the first failure is reported.
pub async fn validate_attribute(
    field: &str,
    definition: &RuleDefinition,
    predicates: &PredicateSet,
) -> Result<AttributeOutcome> {
    let mut outcome = AttributeOutcome::valid();

    for name in &definition.validate {
        let predicate = predicates
            .get(name)
            .ok_or_else(|| EngineError::UnknownPredicate {
                field: field.to_string(),
                predicate: name.clone(),
            })?;

        let passed = predicate(definition.params_for(name))
            .await
            .map_err(|source| EngineError::Predicate {
                field: field.to_string(),
                predicate: name.clone(),
                source,
            })?;

        trace!(field = field, predicate = name, passed = passed; "Predicate evaluated");

        if !passed {
            if outcome.is_valid {
                outcome.error_code = definition.error_code(name).map(str::to_string);
                outcome.error_type = Some(name.clone());
            }
            outcome.is_valid = false;
        }
    }

    Ok(outcome)
}
