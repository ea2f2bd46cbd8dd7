//! Loosely-typed records as they appear on the change feed.
//!
//! Field names and value encodings vary between collections (and between
//! historical writers of the same collection), so records are kept as JSON
//! objects and read through alias-aware accessors instead of fixed structs.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Wrapper keys used by extended-JSON exports for numbers, ids and dates.
const SCALAR_WRAPPERS: [&str; 6] = [
    "$numberDecimal",
    "$numberLong",
    "$numberInt",
    "$numberDouble",
    "$oid",
    "$date",
];

/// A JSON object record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    /// Creates an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Wraps a JSON value. Anything other than an object becomes an empty
    /// document.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::new(),
        }
    }

    /// Returns the record identifier (`_id`, falling back to `id`).
    #[must_use]
    pub fn id(&self) -> Option<String> {
        self.text("_id").or_else(|| self.text("id"))
    }

    /// Returns the raw value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns `true` if `key` is present, whatever its value.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Returns the scalar under `key` as trimmed text, or `None` when the key
    /// is absent, null, blank or not a scalar.
    #[must_use]
    pub fn text(&self, key: &str) -> Option<String> {
        self.0.get(key).and_then(scalar_text)
    }

    /// Returns the first alias in `keys` holding a non-empty scalar.
    ///
    /// Aliases are tried in order; absent, null and blank values are skipped.
    #[must_use]
    pub fn pick_first_present(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|key| self.text(key))
    }

    /// Returns `true` if `key` holds the JSON boolean `true`.
    #[must_use]
    pub fn is_true(&self, key: &str) -> bool {
        matches!(self.0.get(key), Some(Value::Bool(true)))
    }

    /// Sets `key` to `value`, returning the document for chaining.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Sets `key` to `value`.
    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_owned(), value.into());
    }

    /// Iterates over field names.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Returns `true` if the document has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consumes the document, returning the JSON object.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Document {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Renders a scalar JSON value as trimmed text.
///
/// Extended-JSON wrappers such as `{"$numberDecimal": "12.50"}` are unwrapped.
/// Returns `None` for null, blank strings, arrays and other objects.
#[must_use]
pub fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null | Value::Array(_) => return None,
        Value::String(s) => s.trim().to_owned(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Object(map) => {
            return SCALAR_WRAPPERS
                .iter()
                .find_map(|wrapper| map.get(*wrapper))
                .and_then(scalar_text);
        }
    };
    if text.is_empty() { None } else { Some(text) }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{Document, scalar_text};

    #[test]
    fn test_pick_first_present_skips_absent_null_and_blank_aliases() {
        // Arrange
        let doc = Document::from_value(json!({
            "amount": null,
            "total": "   ",
            "value": 1500,
            "Amount": 99
        }));

        // Act
        let picked = doc.pick_first_present(&["missing", "amount", "total", "value", "Amount"]);

        // Assert
        assert_eq!(picked.as_deref(), Some("1500"));
    }

    #[test]
    fn test_pick_first_present_returns_none_when_no_alias_matches() {
        let doc = Document::from_value(json!({ "amount": "" }));
        assert_eq!(doc.pick_first_present(&["amount", "total"]), None);
    }

    #[test]
    fn test_scalar_text_unwraps_extended_json_numbers() {
        assert_eq!(
            scalar_text(&json!({ "$numberDecimal": "1234.50" })).as_deref(),
            Some("1234.50")
        );
        assert_eq!(
            scalar_text(&json!({ "$numberLong": "42" })).as_deref(),
            Some("42")
        );
        assert_eq!(scalar_text(&json!({ "nested": 1 })), None);
    }

    #[test]
    fn test_id_prefers_underscore_id_and_unwraps_object_ids() {
        let doc = Document::from_value(json!({
            "_id": { "$oid": "65f0c0ffee" },
            "id": "other"
        }));
        assert_eq!(doc.id().as_deref(), Some("65f0c0ffee"));
    }

    #[test]
    fn test_from_value_ignores_non_objects() {
        assert!(Document::from_value(json!([1, 2, 3])).is_empty());
        assert!(Document::from_value(json!(null)).is_empty());
    }

    #[test]
    fn test_is_true_only_matches_boolean_true() {
        let doc = Document::from_value(json!({ "a": true, "b": "true", "c": false }));
        assert!(doc.is_true("a"));
        assert!(!doc.is_true("b"));
        assert!(!doc.is_true("c"));
        assert!(!doc.is_true("d"));
    }
}
