// rulemate - declarative, schema-driven record validation
//
// Records are validated against schemas whose fields point at reusable
// rules. Rules name predicates, arguments and error codes; predicates are
// supplied by helper factories and may complete asynchronously.

// Re-export the engine
pub use rulemate_validation::*;

// Re-export logging
pub use rulemate_log as log;

// Re-export optional crates
#[cfg(feature = "config")]
pub use rulemate_config;

// Prelude for common imports
pub mod prelude {
    pub use crate::{
        CheckError,
        CommonHelpers,
        EngineError,
        ErrorCatalog,
        HelperContext,
        HelperFactory,
        HelperStack,
        PredicateSet,
        Record,
        Rule,
        RuleDefinition,
        RuleSet,
        Schema,
        SchemaField,
        ValidationHooks,
        ValidationResult,
        Validator,
        ValidatorConfig,
        ValidatorOptions,
    };

    #[cfg(feature = "config")]
    pub use rulemate_config::{EnvLoader, TemplateSet};
}
