//! Daily log entry produced by the summary stage.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Category used when the generator does not provide one
pub const DEFAULT_CATEGORY: &str = "uncategorized";

/// Structured daily summary.
///
/// `category` is the only field the pipeline relies on (it is part of the
/// storage key). Everything else the generator returns is carried through
/// untouched in `fields` and written back out in the same shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyLogEntry {
    #[serde(default = "default_category")]
    pub category: String,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

impl DailyLogEntry {
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            fields: Map::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// Free-text activity description, when the generator produced one
    pub fn activity(&self) -> Option<&str> {
        self.fields.get("activity").and_then(Value::as_str)
    }

    pub fn tags(&self) -> Vec<&str> {
        self.fields
            .get("tags")
            .and_then(Value::as_array)
            .map(|tags| tags.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Build an entry from an arbitrary generator value.
    ///
    /// Accepts either the entry object itself or an object wrapping it under
    /// a single key (some models answer `{"log": {...}}`).
    pub fn from_value(value: Value) -> std::result::Result<Self, serde_json::Error> {
        let value = match value {
            Value::Object(map) if map.len() == 1 && !map.contains_key("category") => {
                match map.into_iter().next() {
                    Some((_, inner @ Value::Object(_))) => inner,
                    Some((key, other)) => {
                        let mut map = Map::new();
                        map.insert(key, other);
                        Value::Object(map)
                    }
                    None => Value::Object(Map::new()),
                }
            }
            other => other,
        };
        let mut entry: Self = serde_json::from_value(value)?;
        if entry.category.trim().is_empty() {
            entry.category = default_category();
        }
        Ok(entry)
    }
}
