// Records and schemas

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field values under validation, in insertion order.
pub type Record = IndexMap<String, Value>;

/// Per-field schema entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaField {
    /// Rule name, optionally suffixed with `--modifier`
    pub rule: String,

    #[serde(default)]
    pub required: bool,

    /// Overrides the validator-wide cache option for this field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache: Option<bool>,

    /// Presentation metadata (input attributes etc.), ignored by the engine
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl SchemaField {
    /// Create an optional field using `rule`
    pub fn new(rule: impl Into<String>) -> Self {
        Self {
            rule: rule.into(),
            ..Self::default()
        }
    }

    /// Mark the field required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Override the validator-wide cache option for this field
    pub fn with_cache(mut self, cache: bool) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Empty optional values pass without running the rule
    pub(crate) fn skips(&self, value: &Value) -> bool {
        !self.required && value.as_str() == Some("")
    }
}

/// Field name to schema entry, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    fields: IndexMap<String, SchemaField>,
}

impl Schema {
    /// Create an empty schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`insert`](Self::insert)
    pub fn with_field(mut self, name: impl Into<String>, field: SchemaField) -> Self {
        self.insert(name, field);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, field: SchemaField) {
        self.fields.insert(name.into(), field);
    }

    /// Get a field by name
    pub fn get(&self, name: &str) -> Option<&SchemaField> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Merge another schema; its entries replace same-named fields
    pub fn merge(&mut self, other: Schema) {
        self.fields.extend(other.fields);
    }

    /// Fields in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SchemaField)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Names of fields marked required
    pub fn required_fields(&self) -> impl Iterator<Item = &str> {
        self.iter().filter(|(_, f)| f.required).map(|(k, _)| k)
    }

    /// Number of declared fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(String, SchemaField)> for Schema {
    fn from_iter<T: IntoIterator<Item = (String, SchemaField)>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schema_deserialize_keeps_order_and_metadata() {
        let schema: Schema = serde_json::from_value(json!({
            "name": { "rule": "name", "required": true, "attributes": { "maxlength": 40 } },
            "phone": { "rule": "phone", "required": false, "cache": false },
            "email": { "rule": "common--email", "required": true }
        }))
        .unwrap();

        let names: Vec<&str> = schema.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["name", "phone", "email"]);
        assert_eq!(schema.get("phone").unwrap().cache, Some(false));
        assert_eq!(schema.get("name").unwrap().metadata["attributes"]["maxlength"], 40);
        assert_eq!(schema.required_fields().collect::<Vec<_>>(), vec!["name", "email"]);
    }

    #[test]
    fn test_skip_only_optional_empty_strings() {
        let optional = SchemaField::new("phone");
        assert!(optional.skips(&json!("")));
        assert!(!optional.skips(&json!("0000")));
        assert!(!optional.skips(&json!(0)));
        assert!(!SchemaField::new("phone").required().skips(&json!("")));
    }
}
