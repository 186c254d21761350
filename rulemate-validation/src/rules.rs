// Rule definitions and rule/modifier resolution

use crate::{EngineError, Record, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Separator between a rule name and a modifier in a schema `rule` string.
pub const MODIFIER_SEPARATOR: &str = "--";

/// The executable part of a rule, shared by base rules and modifiers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleDefinition {
    /// Predicate names, evaluated in this order
    #[serde(default)]
    pub validate: Vec<String>,

    /// Raw arguments per predicate; strings starting with `$` reference fields
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub params: HashMap<String, Vec<Value>>,

    /// Error code per predicate
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub error: HashMap<String, String>,

    /// Pattern consumed by the `regex` predicate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
}

impl RuleDefinition {
    /// Create an empty definition
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a predicate with its error code
    pub fn check(mut self, predicate: impl Into<String>, code: impl Into<String>) -> Self {
        let predicate = predicate.into();
        self.error.insert(predicate.clone(), code.into());
        self.validate.push(predicate);
        self
    }

    /// Set the arguments passed to a predicate
    pub fn with_params(mut self, predicate: impl Into<String>, params: Vec<Value>) -> Self {
        self.params.insert(predicate.into(), params);
        self
    }

    /// Set the pattern run by the `regex` predicate
    pub fn with_regex(mut self, pattern: impl Into<String>) -> Self {
        self.regex = Some(pattern.into());
        self
    }

    /// Tagged arguments for a predicate, empty when none are declared
    pub fn params_for(&self, predicate: &str) -> Vec<Param> {
        self.params
            .get(predicate)
            .map(|raw| raw.iter().map(Param::from_raw).collect())
            .unwrap_or_default()
    }

    /// Error code declared for a predicate
    pub fn error_code(&self, predicate: &str) -> Option<&str> {
        self.error.get(predicate).map(String::as_str)
    }
}

/// Informational documentation attached to a rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleDocs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A named, reusable validation procedure with optional modifiers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(flatten)]
    pub definition: RuleDefinition,

    /// Overrides selected with `rule--modifier`, replacing the base definition
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub modifier: HashMap<String, RuleDefinition>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs: Option<RuleDocs>,
}

impl Rule {
    /// Create a rule from its base definition
    pub fn new(definition: RuleDefinition) -> Self {
        Self {
            definition,
            ..Self::default()
        }
    }

    /// Add a modifier overriding the base definition
    pub fn with_modifier(mut self, name: impl Into<String>, definition: RuleDefinition) -> Self {
        self.modifier.insert(name.into(), definition);
        self
    }

    /// Attach documentation
    pub fn with_docs(mut self, docs: RuleDocs) -> Self {
        self.docs = Some(docs);
        self
    }
}

/// A schema `rule` string split into base rule and modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleRef<'a> {
    pub rule: &'a str,
    pub modifier: Option<&'a str>,
}

impl<'a> RuleRef<'a> {
    /// Split `base--modifier`. Only the second segment is used as modifier;
    /// an empty modifier selects the base rule.
    pub fn parse(raw: &'a str) -> Self {
        let mut parts = raw.split(MODIFIER_SEPARATOR);
        let rule = parts.next().unwrap_or_default();
        let modifier = parts.next().filter(|m| !m.is_empty());
        Self { rule, modifier }
    }
}

/// Outcome of resolving a schema field's rule string.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedRule<'a> {
    pub name: &'a str,
    pub rule: &'a Rule,
    pub modifier: Option<&'a str>,
    /// The definition to run: the modifier's when one is selected
    pub definition: &'a RuleDefinition,
}

/// Rule catalog keyed by rule name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet {
    rules: HashMap<String, Rule>,
}

impl RuleSet {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`insert`](Self::insert)
    pub fn with_rule(mut self, name: impl Into<String>, rule: Rule) -> Self {
        self.insert(name, rule);
        self
    }

    /// Add or replace a rule
    pub fn insert(&mut self, name: impl Into<String>, rule: Rule) {
        self.rules.insert(name.into(), rule);
    }

    /// Get a rule by name
    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.rules.get(name)
    }

    /// Merge another catalog; its rules replace same-named ones
    pub fn merge(&mut self, other: RuleSet) {
        self.rules.extend(other.rules);
    }

    /// Number of rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rule names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    /// Resolve `rule` or `rule--modifier` for `field`.
    pub fn resolve<'a>(&'a self, field: &str, raw: &'a str) -> Result<ResolvedRule<'a>> {
        let reference = RuleRef::parse(raw);
        let rule = self
            .rules
            .get(reference.rule)
            .ok_or_else(|| EngineError::UnknownRule {
                field: field.to_string(),
                rule: reference.rule.to_string(),
            })?;

        let definition = match reference.modifier {
            Some(modifier) => {
                rule.modifier
                    .get(modifier)
                    .ok_or_else(|| EngineError::UnknownModifier {
                        field: field.to_string(),
                        rule: reference.rule.to_string(),
                        modifier: modifier.to_string(),
                    })?
            }
            None => &rule.definition,
        };

        Ok(ResolvedRule {
            name: reference.rule,
            rule,
            modifier: reference.modifier,
            definition,
        })
    }
}

impl FromIterator<(String, Rule)> for RuleSet {
    fn from_iter<T: IntoIterator<Item = (String, Rule)>>(iter: T) -> Self {
        Self {
            rules: iter.into_iter().collect(),
        }
    }
}

/// A predicate argument.
///
/// `$name` strings become [`Param::Field`]. The engine does not look the
/// field up; predicates receive the record and call [`Param::resolve`].
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Literal(Value),
    Field(String),
}

impl Param {
    /// Tag a raw argument; strings starting with `$` reference a field
    pub fn from_raw(raw: &Value) -> Self {
        match raw {
            Value::String(s) if s.starts_with('$') => Param::Field(s[1..].to_string()),
            other => Param::Literal(other.clone()),
        }
    }

    /// Literal value, or the referenced field's current value
    pub fn resolve<'a>(&'a self, record: &'a Record) -> Option<&'a Value> {
        match self {
            Param::Literal(value) => Some(value),
            Param::Field(name) => record.get(name),
        }
    }

    /// String literal, or the referenced field name with the `$` stripped
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Param::Literal(Value::String(s)) => Some(s),
            Param::Literal(_) => None,
            Param::Field(name) => Some(name),
        }
    }

    /// Non-negative integer literal, accepting numeric strings
    pub fn as_usize(&self) -> Option<usize> {
        match self {
            Param::Literal(Value::Number(n)) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
            Param::Literal(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn catalog() -> RuleSet {
        serde_json::from_value(json!({
            "common": {
                "validate": ["hasText"],
                "error": { "hasText": "common.hasText" },
                "modifier": {
                    "email": {
                        "validate": ["regex"],
                        "regex": "/^[^@]+@[^@]+$/",
                        "error": { "regex": "common.badEmail" }
                    }
                },
                "docs": { "description": "Generic text" }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_rule_ref_parse() {
        assert_eq!(
            RuleRef::parse("common--email"),
            RuleRef { rule: "common", modifier: Some("email") }
        );
        assert_eq!(RuleRef::parse("common"), RuleRef { rule: "common", modifier: None });
        assert_eq!(RuleRef::parse("common--"), RuleRef { rule: "common", modifier: None });
        assert_eq!(RuleRef::parse("a--b--c").modifier, Some("b"));
    }

    #[test]
    fn test_resolve_base_rule() {
        let rules = catalog();
        let resolved = rules.resolve("name", "common").unwrap();
        assert_eq!(resolved.name, "common");
        assert_eq!(resolved.modifier, None);
        assert_eq!(resolved.definition.validate, vec!["hasText"]);
        let docs = resolved.rule.docs.as_ref().unwrap();
        assert_eq!(docs.description.as_deref(), Some("Generic text"));
    }

    #[test]
    fn test_resolve_modifier_replaces_definition() {
        let rules = catalog();
        let resolved = rules.resolve("email", "common--email").unwrap();
        assert_eq!(resolved.modifier, Some("email"));
        assert_eq!(resolved.definition.validate, vec!["regex"]);
        assert_eq!(resolved.definition.error_code("regex"), Some("common.badEmail"));
        assert_eq!(resolved.definition.error_code("hasText"), None);
    }

    #[test]
    fn test_resolve_unknown_rule_and_modifier() {
        let rules = catalog();
        assert!(matches!(
            rules.resolve("x", "missing"),
            Err(EngineError::UnknownRule { rule, .. }) if rule == "missing"
        ));
        assert!(matches!(
            rules.resolve("x", "common--phone"),
            Err(EngineError::UnknownModifier { modifier, .. }) if modifier == "phone"
        ));
    }

    #[test]
    fn test_merge_overrides() {
        let mut rules = catalog();
        rules.merge(RuleSet::new().with_rule(
            "common",
            Rule::new(RuleDefinition::new().check("isNumeric", "common.numeric")),
        ));
        assert_eq!(rules.len(), 1);
        assert_eq!(rules.get("common").unwrap().definition.validate, vec!["isNumeric"]);
    }

    #[test]
    fn test_params_are_tagged() {
        let definition = RuleDefinition::new()
            .check("equals", "common.equals")
            .with_params("equals", vec![json!("$email"), json!(3), json!("plain")]);

        assert_eq!(
            definition.params_for("equals"),
            vec![
                Param::Field("email".to_string()),
                Param::Literal(json!(3)),
                Param::Literal(json!("plain")),
            ]
        );
        assert!(definition.params_for("other").is_empty());
    }

    #[test]
    fn test_param_resolve() {
        let mut record = Record::new();
        record.insert("email".to_string(), json!("a@b"));

        assert_eq!(Param::Field("email".into()).resolve(&record), Some(&json!("a@b")));
        assert_eq!(Param::Field("nope".into()).resolve(&record), None);
        assert_eq!(Param::Literal(json!(5)).as_usize(), Some(5));
        assert_eq!(Param::Literal(json!("8")).as_usize(), Some(8));
        assert_eq!(Param::Field("email".into()).as_str(), Some("email"));
    }
}
