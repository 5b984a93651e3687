// crates/lifeledger-core/src/core/identifiers.rs
// ============================================================================
// Module: Lifeledger Identifiers
// Description: Validated identifiers for datasets, records, and field keys.
// Purpose: Provide strongly typed, serializable identifiers with stable wire forms.
// Dependencies: serde, thiserror, uuid
// ============================================================================

//! ## Overview
//! Identifiers are validated at construction boundaries so that every value
//! reaching the store is known to be well-formed. Dataset identifiers and
//! field keys are caller-chosen slugs; record identifiers are UUID v4 strings
//! when generated but may be supplied by callers as long as they satisfy the
//! record identifier format.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum length of a dataset identifier.
pub const MAX_DATASET_ID_LENGTH: usize = 64;
/// Minimum length of a record identifier.
pub const MIN_RECORD_ID_LENGTH: usize = 9;
/// Maximum length of a record identifier.
pub const MAX_RECORD_ID_LENGTH: usize = 128;
/// Maximum length of a field key.
pub const MAX_FIELD_KEY_LENGTH: usize = 64;
/// Metadata keys reserved by the record envelope.
pub const RESERVED_METADATA_KEYS: [&str; 4] = ["id", "datasetId", "createdAt", "lastModified"];

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Identifier validation errors.
///
/// # Invariants
/// - Messages never echo more than the rejected identifier itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    /// Dataset identifier is malformed.
    #[error("invalid dataset id `{0}`: expected 1-64 characters from [A-Za-z0-9_-]")]
    Dataset(String),
    /// Record identifier is malformed.
    #[error("invalid record id `{0}`: expected 9-128 characters from [A-Za-z0-9_.:-]")]
    Record(String),
    /// Field key is malformed or reserved.
    #[error("invalid field key `{0}`: expected 1-64 characters from [A-Za-z0-9_-], not reserved")]
    FieldKey(String),
}

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

/// Dataset identifier (a stable, caller-chosen slug such as `todos`).
///
/// # Invariants
/// - 1 to [`MAX_DATASET_ID_LENGTH`] ASCII characters from `[A-Za-z0-9_-]`.
/// - Safe to embed in SQL literals and index names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DatasetId(String);

impl DatasetId {
    /// Parses and validates a dataset identifier.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError::Dataset`] when the value is malformed.
    pub fn parse(value: impl Into<String>) -> Result<Self, IdentifierError> {
        let value = value.into();
        if value.is_empty() || value.len() > MAX_DATASET_ID_LENGTH || !is_slug(&value) {
            return Err(IdentifierError::Dataset(value));
        }
        Ok(Self(value))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl TryFrom<String> for DatasetId {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl TryFrom<&str> for DatasetId {
    type Error = IdentifierError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<DatasetId> for String {
    fn from(value: DatasetId) -> Self {
        value.0
    }
}

/// Record identifier.
///
/// # Invariants
/// - [`MIN_RECORD_ID_LENGTH`] to [`MAX_RECORD_ID_LENGTH`] ASCII characters from
///   `[A-Za-z0-9_.:-]`; path separators and whitespace never appear.
/// - Generated identifiers are hyphenated UUID v4 strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordId(String);

impl RecordId {
    /// Generates a fresh, globally unique record identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Parses and validates a record identifier.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError::Record`] when the value is malformed.
    pub fn parse(value: impl Into<String>) -> Result<Self, IdentifierError> {
        let value = value.into();
        let length_ok = (MIN_RECORD_ID_LENGTH ..= MAX_RECORD_ID_LENGTH).contains(&value.len());
        let chars_ok = value
            .bytes()
            .all(|byte| byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'-' | b'.' | b':'));
        if !length_ok || !chars_ok {
            return Err(IdentifierError::Record(value));
        }
        Ok(Self(value))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl TryFrom<String> for RecordId {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl TryFrom<&str> for RecordId {
    type Error = IdentifierError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<RecordId> for String {
    fn from(value: RecordId) -> Self {
        value.0
    }
}

/// Key of a field within a dataset's payloads.
///
/// # Invariants
/// - 1 to [`MAX_FIELD_KEY_LENGTH`] ASCII characters from `[A-Za-z0-9_-]`.
/// - Never one of [`RESERVED_METADATA_KEYS`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldKey(String);

impl FieldKey {
    /// Parses and validates a field key.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError::FieldKey`] when the value is malformed or reserved.
    pub fn parse(value: impl Into<String>) -> Result<Self, IdentifierError> {
        let value = value.into();
        if value.is_empty()
            || value.len() > MAX_FIELD_KEY_LENGTH
            || !is_slug(&value)
            || is_reserved_key(&value)
        {
            return Err(IdentifierError::FieldKey(value));
        }
        Ok(Self(value))
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the payload key under which resolved relation data is embedded.
    #[must_use]
    pub fn embedded_key(&self) -> String {
        format!("{}_data", self.0)
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl TryFrom<String> for FieldKey {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl TryFrom<&str> for FieldKey {
    type Error = IdentifierError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<FieldKey> for String {
    fn from(value: FieldKey) -> Self {
        value.0
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns true when the key is one of the record envelope's metadata keys.
#[must_use]
pub fn is_reserved_key(key: &str) -> bool {
    RESERVED_METADATA_KEYS.contains(&key)
}

/// Returns true when every byte is an ASCII alphanumeric, `_`, or `-`.
fn is_slug(value: &str) -> bool {
    value.bytes().all(|byte| byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'-'))
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions are permitted."
    )]

    use super::*;

    #[test]
    fn dataset_id_accepts_slugs_and_rejects_sql_metacharacters() {
        assert!(DatasetId::parse("people_crm").is_ok());
        assert!(DatasetId::parse("time-entries").is_ok());
        assert!(DatasetId::parse("").is_err());
        assert!(DatasetId::parse("a'b").is_err());
        assert!(DatasetId::parse("a b").is_err());
        assert!(DatasetId::parse("x".repeat(MAX_DATASET_ID_LENGTH + 1)).is_err());
    }

    #[test]
    fn record_id_generation_produces_parseable_ids() {
        let id = RecordId::generate();
        assert_eq!(RecordId::parse(id.as_str()).unwrap(), id);
        assert_eq!(id.as_str().len(), 36);
    }

    #[test]
    fn record_id_rejects_short_and_path_like_values() {
        assert!(RecordId::parse("short").is_err());
        assert!(RecordId::parse("12345678").is_err());
        assert!(RecordId::parse("123456789").is_ok());
        assert!(RecordId::parse("images/2024/photo.png").is_err());
        assert!(RecordId::parse("C:\\files\\photo").is_err());
    }

    #[test]
    fn field_key_rejects_reserved_metadata_keys() {
        for key in RESERVED_METADATA_KEYS {
            assert!(FieldKey::parse(key).is_err(), "{key} must be rejected");
        }
        assert_eq!(FieldKey::parse("person_id").unwrap().embedded_key(), "person_id_data");
    }

    #[test]
    fn identifiers_round_trip_through_serde_with_validation() {
        let id: DatasetId = serde_json::from_str("\"todos\"").unwrap();
        assert_eq!(id.as_str(), "todos");
        assert!(serde_json::from_str::<DatasetId>("\"bad id\"").is_err());
        assert!(serde_json::from_str::<RecordId>("\"tiny\"").is_err());
    }
}
