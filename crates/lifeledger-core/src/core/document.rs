// crates/lifeledger-core/src/core/document.rs
// ============================================================================
// Module: Lifeledger Documents
// Description: Ordered, schema-less record payloads.
// Purpose: Wrap JSON objects with explicit optional-field helpers.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A [`Document`] is an ordered map from string keys to JSON values
//! (null, bool, number, string, array, or nested object). Documents are
//! permissive: keys that no field definition declares are preserved as-is.
//! Building a document from anything other than a JSON object is a
//! malformed-payload condition.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::core::identifiers::is_reserved_key;

// ============================================================================
// SECTION: Document
// ============================================================================

/// Ordered JSON object used as a record payload.
///
/// # Invariants
/// - Always a JSON object at the top level; key order is insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    /// Creates an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Builds a document from a JSON value.
    ///
    /// # Errors
    ///
    /// Returns a description of the offending JSON kind when `value` is not an object.
    pub fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(format!("record data must be a JSON object, got {}", json_kind(&other))),
        }
    }

    /// Parses a document from JSON text.
    ///
    /// # Errors
    ///
    /// Returns a description of the failure when the text is not a JSON object.
    pub fn parse_json(text: &str) -> Result<Self, String> {
        let value: Value = serde_json::from_str(text).map_err(|err| err.to_string())?;
        Self::from_value(value)
    }

    /// Serializes the document to compact JSON text.
    #[must_use]
    pub fn to_json_string(&self) -> String {
        Value::Object(self.0.clone()).to_string()
    }

    /// Returns the value stored under `key`, if any (including JSON null).
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns the value stored under `key` unless it is absent or JSON null.
    #[must_use]
    pub fn get_non_null(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|value| !value.is_null())
    }

    /// Returns the string stored under `key`, if the value is a string.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Returns true when the document has an entry for `key`.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Inserts a value, returning the previous value for the key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Removes a key, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    /// Iterates keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when the document has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Removes the record envelope's reserved metadata keys.
    pub fn strip_metadata(&mut self) {
        self.0.retain(|key, _| !is_reserved_key(key));
    }

    /// Returns the document as a JSON value.
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

impl TryFrom<Value> for Document {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

impl FromIterator<(String, Value)> for Document {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ============================================================================
// SECTION: Value Rendering
// ============================================================================

/// Renders a scalar-ish JSON value in its canonical comparison form.
///
/// Strings render unquoted, booleans as `true`/`false`, numbers in positional
/// notation (never with an exponent), and arrays/objects as compact JSON.
/// Returns `None` for JSON null.
#[must_use]
pub fn canonical_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Number(number) => Some(render_number(number)),
        Value::String(text) => Some(text.clone()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}

/// Renders a JSON number without exponent notation.
fn render_number(number: &serde_json::Number) -> String {
    if let Some(int) = number.as_i64() {
        return int.to_string();
    }
    if let Some(int) = number.as_u64() {
        return int.to_string();
    }
    // f64 Display is positional and drops a trailing `.0`.
    number.as_f64().map_or_else(|| number.to_string(), |float| float.to_string())
}

/// Returns a short label for the kind of a JSON value.
const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
