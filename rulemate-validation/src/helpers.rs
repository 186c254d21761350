// Built-in predicates

use crate::{HelperContext, HelperFactory, Param, PredicateError, PredicateSet, Record};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$").unwrap()
});

static ALPHA_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z]+$").unwrap());

static ALPHANUMERIC_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9]+$").unwrap());

static NUMERIC_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+$").unwrap());

/// Compiled rule patterns keyed by their source text. Each validator owns
/// one, filled when it is constructed.
pub type PatternCache = HashMap<String, Regex>;

// Flags accepted after the closing slash of a `/pattern/flags` literal
const LITERAL_FLAGS: &str = "dgimsuyv";

/// Compile a rule pattern.
///
/// Accepts either a bare pattern or the `/pattern/flags` literal form used in
/// rule documents. Flags must come from `dgimsuyv`; otherwise the whole text
/// is taken as a bare pattern, so `/usr/bin` matches that path literally.
/// `i`, `m` and `s` map to inline flags and `y` anchors the match at the
/// start; the others do not change a match test. Look-around and
/// backreferences are not supported and fail to compile.
pub fn compile_pattern(raw: &str) -> Result<Regex, regex::Error> {
    let literal = raw
        .strip_prefix('/')
        .and_then(|rest| rest.rfind('/').map(|end| (&rest[..end], &rest[end + 1..])))
        .filter(|(_, flags)| flags.chars().all(|c| LITERAL_FLAGS.contains(c)));

    let pattern = match literal {
        Some((body, flags)) => {
            let inline: String = flags
                .chars()
                .filter(|c| matches!(c, 'i' | 'm' | 's'))
                .collect();
            let body = if flags.contains('y') {
                format!("^(?:{})", body)
            } else {
                body.to_string()
            };
            if inline.is_empty() {
                body
            } else {
                format!("(?{}){}", inline, body)
            }
        }
        None => raw.to_string(),
    };

    Regex::new(&pattern)
}

fn first_usize(predicate: &str, params: &[Param]) -> Result<usize, PredicateError> {
    params
        .first()
        .and_then(Param::as_usize)
        .ok_or_else(|| format!("{} expects a non-negative integer argument", predicate).into())
}

fn render(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Predicates shared by most rule catalogs.
///
/// | name | arguments | passes when |
/// |---|---|---|
/// | `hasText` | | value has non-whitespace content |
/// | `regex` | | value matches the rule's `regex` |
/// | `isEmail` | | value is an email address |
/// | `isNumeric` | | value is digits only |
/// | `isAlpha` | | value is ASCII letters only |
/// | `isAlphanumeric` | | value is ASCII letters and digits only |
/// | `minLength` | `n` | value has at least `n` characters |
/// | `maxLength` | `n` | value has at most `n` characters |
/// | `equals` | `$field` or literal | value equals the other field or literal |
///
/// Combine with application predicates through
/// [`HelperStack`](crate::HelperStack).
#[derive(Debug, Clone, Copy, Default)]
pub struct CommonHelpers;

impl HelperFactory for CommonHelpers {
    fn predicates(&self, ctx: &HelperContext<'_>) -> PredicateSet {
        let value: Arc<str> = Arc::from(ctx.value_str());
        let mut set = PredicateSet::new();

        let v = value.clone();
        set.insert("hasText", move |_| !v.trim().is_empty());

        let v = value.clone();
        set.insert("isEmail", move |_| EMAIL_REGEX.is_match(&v));

        let v = value.clone();
        set.insert("isNumeric", move |_| NUMERIC_REGEX.is_match(&v));

        let v = value.clone();
        set.insert("isAlpha", move |_| ALPHA_REGEX.is_match(&v));

        let v = value.clone();
        set.insert("isAlphanumeric", move |_| ALPHANUMERIC_REGEX.is_match(&v));

        let v = value.clone();
        set.insert_fallible("minLength", move |params: Vec<Param>| {
            let outcome = first_usize("minLength", &params).map(|min| v.chars().count() >= min);
            async move { outcome }
        });

        let v = value.clone();
        set.insert_fallible("maxLength", move |params: Vec<Param>| {
            let outcome = first_usize("maxLength", &params).map(|max| v.chars().count() <= max);
            async move { outcome }
        });

        let v = value.clone();
        let compiled = ctx.pattern.cloned();
        let raw = ctx.definition.regex.clone();
        set.insert_fallible("regex", move |_| {
            let outcome = match (&compiled, &raw) {
                (Some(re), _) => Ok(re.is_match(&v)),
                (None, Some(raw)) => compile_pattern(raw)
                    .map(|re| re.is_match(&v))
                    .map_err(PredicateError::from),
                (None, None) => Err("rule declares the regex predicate without a pattern".into()),
            };
            async move { outcome }
        });

        if ctx.definition.validate.iter().any(|p| p == "equals") {
            let v = value;
            let record: Arc<Record> = Arc::new(ctx.record.clone());
            set.insert("equals", move |params: &[Param]| {
                params
                    .first()
                    .and_then(|p| p.resolve(&record))
                    .is_some_and(|other| render(other) == *v)
            });
        }

        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Rule, RuleDefinition};
    use serde_json::{Value, json};

    async fn run(definition: RuleDefinition, value: Value, record: Record, predicate: &str) -> bool {
        let rule = Rule::new(definition.clone());
        let ctx = HelperContext {
            field: "f",
            value: &value,
            rule: &rule,
            definition: &definition,
            modifier: None,
            record: &record,
            pattern: None,
        };
        let set = CommonHelpers.predicates(&ctx);
        let predicate_fn = set.get(predicate).unwrap();
        predicate_fn(definition.params_for(predicate)).await.unwrap()
    }

    #[test]
    fn test_compile_pattern_literal_forms() {
        assert!(compile_pattern("/^[^@]+@[^@]+$/").unwrap().is_match("a@b"));
        assert!(!compile_pattern("/^[^@]+@[^@]+$/").unwrap().is_match("ab"));
        assert!(compile_pattern("/^abc$/i").unwrap().is_match("ABC"));
        assert!(compile_pattern(r"^\d{4}-\d{4}$").unwrap().is_match("0000-0000"));
        assert!(compile_pattern("/a\\/b/").unwrap().is_match("a/b"));
        assert!(compile_pattern("/(/").is_err());
    }

    #[test]
    fn test_compile_pattern_rejects_unknown_flags() {
        let re = compile_pattern("/usr/bin").unwrap();
        assert_eq!(re.as_str(), "/usr/bin");
        assert!(re.is_match("/usr/bin"));
        assert!(!re.is_match("USR"));

        let re = compile_pattern("/a/x").unwrap();
        assert_eq!(re.as_str(), "/a/x");
        assert!(!re.is_match("a"));

        assert_eq!(compile_pattern("/a/gu").unwrap().as_str(), "a");
        assert!(!compile_pattern("/b/y").unwrap().is_match("ab"));
    }

    #[test]
    fn test_compile_pattern_lookaround_unsupported() {
        assert!(compile_pattern(r"/^(?=.*\d).{8,}$/").is_err());
    }

    #[tokio::test]
    async fn test_regex_prefers_compiled_pattern() {
        let definition = RuleDefinition::new()
            .check("regex", "x")
            .with_regex("/unused/");
        let rule = Rule::new(definition.clone());
        let record = Record::new();
        let value = json!("1234");
        let compiled = Regex::new(r"^\d+$").unwrap();
        let ctx = HelperContext {
            field: "f",
            value: &value,
            rule: &rule,
            definition: &definition,
            modifier: None,
            record: &record,
            pattern: Some(&compiled),
        };
        let set = CommonHelpers.predicates(&ctx);
        assert!((set.get("regex").unwrap())(vec![]).await.unwrap());
    }

    #[tokio::test]
    async fn test_has_text() {
        let def = RuleDefinition::new().check("hasText", "c.t");
        assert!(run(def.clone(), json!("John"), Record::new(), "hasText").await);
        assert!(!run(def, json!("   "), Record::new(), "hasText").await);
    }

    #[tokio::test]
    async fn test_regex_uses_definition_pattern() {
        let def = RuleDefinition::new()
            .check("regex", "phone.invalid")
            .with_regex(r"/^\d{4}-\d{4}$/");
        assert!(run(def.clone(), json!("0000-0000"), Record::new(), "regex").await);
        assert!(!run(def, json!("0-0000"), Record::new(), "regex").await);
    }

    #[tokio::test]
    async fn test_regex_without_pattern_errors() {
        let definition = RuleDefinition::new().check("regex", "x");
        let rule = Rule::new(definition.clone());
        let record = Record::new();
        let value = json!("x");
        let ctx = HelperContext {
            field: "f",
            value: &value,
            rule: &rule,
            definition: &definition,
            modifier: None,
            record: &record,
            pattern: None,
        };
        let set = CommonHelpers.predicates(&ctx);
        assert!((set.get("regex").unwrap())(vec![]).await.is_err());
    }

    #[tokio::test]
    async fn test_lengths() {
        let def = RuleDefinition::new()
            .check("minLength", "c.min")
            .with_params("minLength", vec![json!(3)])
            .check("maxLength", "c.max")
            .with_params("maxLength", vec![json!("5")]);
        assert!(run(def.clone(), json!("abc"), Record::new(), "minLength").await);
        assert!(!run(def.clone(), json!("ab"), Record::new(), "minLength").await);
        assert!(run(def.clone(), json!("abcde"), Record::new(), "maxLength").await);
        assert!(!run(def, json!("abcdef"), Record::new(), "maxLength").await);
    }

    #[tokio::test]
    async fn test_equals_field_reference() {
        let mut record = Record::new();
        record.insert("email".to_string(), json!("a@b.com"));
        let def = RuleDefinition::new()
            .check("equals", "common.notEqual")
            .with_params("equals", vec![json!("$email")]);

        assert!(run(def.clone(), json!("a@b.com"), record.clone(), "equals").await);
        assert!(!run(def.clone(), json!("a@c.com"), record, "equals").await);
        assert!(!run(def, json!("a@b.com"), Record::new(), "equals").await);
    }

    #[tokio::test]
    async fn test_character_classes() {
        let def = RuleDefinition::new();
        assert!(run(def.clone(), json!("12345"), Record::new(), "isNumeric").await);
        assert!(!run(def.clone(), json!("12a"), Record::new(), "isNumeric").await);
        assert!(run(def.clone(), json!("abcXYZ"), Record::new(), "isAlpha").await);
        assert!(run(def.clone(), json!("abc123"), Record::new(), "isAlphanumeric").await);
        assert!(run(def.clone(), json!("user@example.com"), Record::new(), "isEmail").await);
        assert!(!run(def, json!("emailcom"), Record::new(), "isEmail").await);
    }
}
