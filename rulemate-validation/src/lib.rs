//! Declarative record validation for rulemate.
//!
//! Records (field name to value) are checked against a schema that maps each
//! field to a reusable rule. Rules list named predicates, their arguments and
//! the error code reported when they fail. Predicates are supplied by the
//! caller through a [`HelperFactory`], optionally stacked on the built-in
//! [`CommonHelpers`].
//!
//! # Examples
//!
//! ```
//! use rulemate_validation::*;
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let rules: RuleSet = serde_json::from_value(json!({
//!     "common": {
//!         "validate": ["hasText"],
//!         "error": { "hasText": "common.hasText" },
//!         "modifier": {
//!             "email": {
//!                 "validate": ["regex"],
//!                 "regex": "/^[^@]+@[^@]+$/",
//!                 "error": { "regex": "common.badEmail" }
//!             }
//!         }
//!     }
//! })).unwrap();
//!
//! let schema = Schema::new()
//!     .with_field("name", SchemaField::new("common").required())
//!     .with_field("email", SchemaField::new("common--email").required());
//!
//! let config = ValidatorConfig::new(rules, schema).with_helpers(CommonHelpers);
//!
//! let record: Record = serde_json::from_value(json!({
//!     "name": "John",
//!     "email": "not-an-email"
//! })).unwrap();
//!
//! let mut validator = Validator::new(record, config).unwrap();
//! let result = validator.validate().await.unwrap();
//!
//! let error = &result.errors().unwrap()["email"];
//! assert_eq!(error.code.as_deref(), Some("common.badEmail"));
//! assert_eq!(error.kind.as_deref(), Some("regex"));
//! # });
//! ```
//!
//! ## Custom predicates
//!
//! ```
//! use rulemate_validation::*;
//!
//! fn app_helpers(ctx: &HelperContext<'_>) -> PredicateSet {
//!     let value = ctx.value_str();
//!     PredicateSet::new().with("cpf", move |_| value == "000.000.000-00")
//! }
//!
//! // Application predicates override built-ins with the same name
//! let helpers = HelperStack::new().push(CommonHelpers).push(app_helpers);
//! # let _ = helpers;
//! ```

mod attribute;
mod binder;
pub mod engine;
mod errors;
mod helpers;
pub mod messages;
mod rules;
mod schema;
mod traits;

pub use attribute::*;
pub use binder::*;
pub use engine::{
    INVALID_PROPERTY_MESSAGE, MISSING_FIELDS_MESSAGE, MISSING_PROPERTIES_MESSAGE,
    ValidationResult, Validator, ValidatorConfig, ValidatorOptions,
};
pub use errors::*;
pub use helpers::*;
pub use messages::ErrorCatalog;
pub use rules::*;
pub use schema::*;
pub use traits::*;
