// Predicate binding and helper composition

use crate::{HelperContext, HelperFactory, PredicateSet};
use std::sync::Arc;

/// Build the predicate set for one field evaluation from the configured
/// helper factory.
pub fn bind_predicates(factory: &dyn HelperFactory, ctx: &HelperContext<'_>) -> PredicateSet {
    factory.predicates(ctx)
}

/// Several helper factories combined into one.
///
/// Factories are applied in insertion order; a predicate produced by a later
/// factory replaces one with the same name from an earlier factory.
#[derive(Clone, Default)]
pub struct HelperStack {
    factories: Vec<Arc<dyn HelperFactory>>,
}

impl HelperStack {
    /// Create an empty stack
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a factory on top of the stack
    pub fn push<H>(mut self, factory: H) -> Self
    where
        H: HelperFactory + 'static,
    {
        self.factories.push(Arc::new(factory));
        self
    }

    /// Add an already shared factory on top of the stack
    pub fn push_shared(mut self, factory: Arc<dyn HelperFactory>) -> Self {
        self.factories.push(factory);
        self
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl HelperFactory for HelperStack {
    fn predicates(&self, ctx: &HelperContext<'_>) -> PredicateSet {
        let mut set = PredicateSet::new();
        for factory in &self.factories {
            set.merge(factory.predicates(ctx));
        }
        set
    }
}
