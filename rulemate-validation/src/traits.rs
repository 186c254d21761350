// Predicate, helper factory and hook traits

use crate::{CheckError, Param, PredicateError, Record, Rule, RuleDefinition, SchemaField};
use futures::future::{BoxFuture, FutureExt};
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

pub type PredicateResult = std::result::Result<bool, PredicateError>;

/// A named check bound to one field's value. Receives the rule's tagged
/// arguments for this predicate.
pub type Predicate = Arc<dyn Fn(Vec<Param>) -> BoxFuture<'static, PredicateResult> + Send + Sync>;

/// Predicates available to one field evaluation, keyed by name.
#[derive(Clone, Default)]
pub struct PredicateSet {
    predicates: HashMap<String, Predicate>,
}

impl PredicateSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a synchronous predicate
    pub fn insert<F>(&mut self, name: impl Into<String>, predicate: F)
    where
        F: Fn(&[Param]) -> bool + Send + Sync + 'static,
    {
        let predicate: Predicate = Arc::new(move |params: Vec<Param>| {
            let outcome = predicate(&params);
            async move { Ok(outcome) }.boxed()
        });
        self.predicates.insert(name.into(), predicate);
    }

    /// Register a predicate that completes asynchronously
    pub fn insert_async<F, Fut>(&mut self, name: impl Into<String>, predicate: F)
    where
        F: Fn(Vec<Param>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        let predicate: Predicate = Arc::new(move |params: Vec<Param>| {
            let pending = predicate(params);
            async move { Ok(pending.await) }.boxed()
        });
        self.predicates.insert(name.into(), predicate);
    }

    /// Register an asynchronous predicate that may fail
    pub fn insert_fallible<F, Fut>(&mut self, name: impl Into<String>, predicate: F)
    where
        F: Fn(Vec<Param>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = PredicateResult> + Send + 'static,
    {
        let predicate: Predicate = Arc::new(move |params: Vec<Param>| predicate(params).boxed());
        self.predicates.insert(name.into(), predicate);
    }

    /// Builder form of [`insert`](Self::insert)
    pub fn with<F>(mut self, name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&[Param]) -> bool + Send + Sync + 'static,
    {
        self.insert(name, predicate);
        self
    }

    /// Merge another set; its predicates replace same-named ones
    pub fn merge(&mut self, other: PredicateSet) {
        self.predicates.extend(other.predicates);
    }

    /// Get a predicate by name
    pub fn get(&self, name: &str) -> Option<&Predicate> {
        self.predicates.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.predicates.contains_key(name)
    }

    /// Registered predicate names, unordered
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.predicates.keys().map(String::as_str)
    }

    /// Number of registered predicates
    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

impl fmt::Debug for PredicateSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("PredicateSet").field("predicates", &names).finish()
    }
}

/// Everything a helper factory may use to build predicates for one field.
#[derive(Debug, Clone, Copy)]
pub struct HelperContext<'a> {
    pub field: &'a str,
    pub value: &'a Value,
    /// The base rule named by the schema
    pub rule: &'a Rule,
    /// The definition being run (modifier override or base)
    pub definition: &'a RuleDefinition,
    pub modifier: Option<&'a str>,
    pub record: &'a Record,
    /// The definition's `regex`, compiled when the validator was built
    pub pattern: Option<&'a Regex>,
}

impl HelperContext<'_> {
    /// The field value as a string; non-string scalars are rendered
    pub fn value_str(&self) -> String {
        match self.value {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

/// Builds the predicate set for one field evaluation.
pub trait HelperFactory: Send + Sync {
    fn predicates(&self, ctx: &HelperContext<'_>) -> PredicateSet;
}

impl<F> HelperFactory for F
where
    F: Fn(&HelperContext<'_>) -> PredicateSet + Send + Sync,
{
    fn predicates(&self, ctx: &HelperContext<'_>) -> PredicateSet {
        self(ctx)
    }
}

/// Observer for validation lifecycle events. Every method defaults to a no-op.
///
/// Hooks run inline on the validating task; a panic in a hook propagates
/// out of the validation call.
pub trait ValidationHooks: Send + Sync {
    fn on_validate_start(&self, _record: &Record) {}

    fn on_validate_field_start(
        &self,
        _field: &str,
        _value: &Value,
        _schema_field: Option<&SchemaField>,
    ) {
    }

    fn on_validate_field_error(
        &self,
        _field: &str,
        _value: &Value,
        _schema_field: Option<&SchemaField>,
        _error: &CheckError,
    ) {
    }

    fn on_validate_field_success(
        &self,
        _field: &str,
        _value: &Value,
        _schema_field: Option<&SchemaField>,
    ) {
    }

    /// `errors` is `None` on success
    fn on_validate_end(&self, _record: &Record, _errors: Option<&[CheckError]>) {}
}

/// Hooks implementation that ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl ValidationHooks for NoopHooks {}
