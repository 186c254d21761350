//! Error message catalog.
//!
//! Catalogs are nested JSON documents, typically one per locale:
//!
//! ```json
//! { "common": { "hasText": "Please, fill the field" } }
//! ```
//!
//! Error codes such as `common.hasText` are resolved by walking the
//! dot-separated path.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorCatalog {
    root: Map<String, Value>,
}

impl ErrorCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a JSON value. Non-object values yield an empty catalog.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(root) => Self { root },
            _ => Self::default(),
        }
    }

    /// Resolve a dotted code to its message. Only string leaves resolve.
    pub fn lookup(&self, code: &str) -> Option<&str> {
        let mut segments = code.split('.');
        let first = segments.next()?;
        let mut current = self.root.get(first)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        current.as_str()
    }

    /// Message for an optional code, empty when unresolved
    pub fn message_for(&self, code: Option<&str>) -> String {
        code.and_then(|c| self.lookup(c))
            .map(str::to_string)
            .unwrap_or_default()
    }

    /// Insert a message at a dotted path, creating intermediate objects
    pub fn insert(&mut self, code: &str, message: impl Into<String>) {
        let mut segments: Vec<&str> = code.split('.').collect();
        let Some(last) = segments.pop() else {
            return;
        };

        let mut current = &mut self.root;
        for segment in segments {
            let entry = current
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            let Value::Object(map) = entry else {
                return;
            };
            current = map;
        }
        current.insert(last.to_string(), Value::String(message.into()));
    }

    /// Deep-merge another catalog; its leaves win
    pub fn merge(&mut self, other: ErrorCatalog) {
        merge_objects(&mut self.root, other.root);
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// All resolvable codes, depth first
    pub fn codes(&self) -> Vec<String> {
        let mut codes = Vec::new();
        collect_codes(&self.root, String::new(), &mut codes);
        codes
    }
}

fn merge_objects(target: &mut Map<String, Value>, source: Map<String, Value>) {
    for (key, value) in source {
        match (target.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                merge_objects(existing, incoming)
            }
            (_, value) => {
                target.insert(key, value);
            }
        }
    }
}

fn collect_codes(map: &Map<String, Value>, prefix: String, out: &mut Vec<String>) {
    for (key, value) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match value {
            Value::Object(inner) => collect_codes(inner, path, out),
            Value::String(_) => out.push(path),
            _ => {}
        }
    }
}
