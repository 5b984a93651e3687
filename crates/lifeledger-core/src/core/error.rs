// crates/lifeledger-core/src/core/error.rs
// ============================================================================
// Module: Lifeledger Errors
// Description: Engine error taxonomy.
// Purpose: Surface not-found, validation, constraint, payload, and storage
//          failures as distinct, inspectable values.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Every engine operation returns [`LedgerError`] on failure. Not-found is a
//! structural outcome derived from typed "zero rows" results, never from
//! matching message text.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::identifiers::DatasetId;
use crate::core::identifiers::IdentifierError;
use crate::core::identifiers::RecordId;
use crate::core::schema::SchemaError;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Entity that could not be found.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotFound {
    /// No dataset with the given id.
    #[error("dataset {0} not found")]
    Dataset(DatasetId),
    /// No record with the given id.
    #[error("record {0} not found")]
    Record(RecordId),
}

/// Application-level constraint violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstraintViolation {
    /// A unique field already holds the value in another record.
    #[error("{field} must be unique in dataset {dataset}: value {value:?} is already used")]
    UniqueValue {
        /// Dataset identifier.
        dataset: DatasetId,
        /// Display name of the unique field.
        field: String,
        /// Normalized offending value.
        value: String,
    },
    /// A prevent-delete relation still references the record.
    #[error(
        "record {record} is referenced by {count} record(s) in {referencing_dataset} via {field} \
         and cannot be deleted"
    )]
    Referenced {
        /// Record that was to be deleted.
        record: RecordId,
        /// Dataset holding the referencing records.
        referencing_dataset: DatasetId,
        /// Display name of the relation field.
        field: String,
        /// Number of blocking references.
        count: usize,
    },
    /// A dataset with the given id already exists.
    #[error("dataset {0} already exists")]
    DatasetExists(DatasetId),
    /// A record with the given id already exists.
    #[error("record {0} already exists")]
    RecordExists(RecordId),
}

/// Engine errors.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Requested entity is missing.
    #[error(transparent)]
    NotFound(#[from] NotFound),
    /// Malformed definition or input.
    #[error("validation error: {0}")]
    Validation(String),
    /// Constraint rejected the operation.
    #[error("constraint violation: {0}")]
    Constraint(#[from] ConstraintViolation),
    /// Record data is not a structured JSON object.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
    /// Storage backend failure.
    #[error("storage failure: {0}")]
    Storage(StoreError),
}

impl LedgerError {
    /// Returns true when the error is a not-found outcome.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Returns true when the error is a constraint violation.
    #[must_use]
    pub const fn is_constraint(&self) -> bool {
        matches!(self, Self::Constraint(_))
    }
}

impl From<StoreError> for LedgerError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Corrupt(message) => Self::MalformedPayload(message),
            other => Self::Storage(other),
        }
    }
}

impl From<SchemaError> for LedgerError {
    fn from(error: SchemaError) -> Self {
        Self::Validation(error.to_string())
    }
}

impl From<IdentifierError> for LedgerError {
    fn from(error: IdentifierError) -> Self {
        Self::Validation(error.to_string())
    }
}
