// crates/lifeledger-core/src/interfaces/mod.rs
// ============================================================================
// Module: Lifeledger Interfaces
// Description: Backend-agnostic storage, blob, and clock interfaces.
// Purpose: Define the contract surfaces used by the Lifeledger runtime.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! Interfaces define how the engine reaches persistence without embedding
//! backend-specific details. A [`TransactionalStore`] hands out
//! [`StoreSession`]s scoped to one transaction; every multi-step mutation the
//! engine performs runs inside a single `write` session and is rolled back as
//! a whole when any step fails.
//!
//! "Zero rows" outcomes are always typed (`Option::None` or `false`) so callers
//! never need to inspect error text to detect a missing row.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::identifiers::DatasetId;
use crate::core::identifiers::FieldKey;
use crate::core::identifiers::RecordId;
use crate::core::record::DataRecord;
use crate::core::schema::Dataset;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Store Errors
// ============================================================================

/// Storage backend errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Store I/O error.
    #[error("store io error: {0}")]
    Io(String),
    /// Storage engine error.
    #[error("store db error: {0}")]
    Db(String),
    /// Stored data cannot be decoded.
    #[error("store corruption: {0}")]
    Corrupt(String),
    /// Store schema version is incompatible.
    #[error("store version mismatch: {0}")]
    VersionMismatch(String),
    /// Request or configuration is invalid for the store.
    #[error("store invalid data: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Catalog and Records
// ============================================================================

/// Persisted dataset descriptors.
pub trait DatasetCatalog {
    /// Loads a dataset by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn get_dataset(&self, id: &DatasetId) -> Result<Option<Dataset>, StoreError>;

    /// Lists every dataset ordered by name.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when listing fails.
    fn list_datasets(&self) -> Result<Vec<Dataset>, StoreError>;

    /// Inserts a new dataset row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails, including a duplicate id.
    fn insert_dataset(&self, dataset: &Dataset) -> Result<(), StoreError>;

    /// Overwrites name, description, type, fields, and `lastModified`.
    ///
    /// Returns `false` when no row matched.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the update fails.
    fn update_dataset(&self, dataset: &Dataset) -> Result<bool, StoreError>;

    /// Removes a dataset row (records are not touched).
    ///
    /// Returns `false` when no row matched.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the delete fails.
    fn remove_dataset(&self, id: &DatasetId) -> Result<bool, StoreError>;
}

/// Raw record persistence.
pub trait RecordStore {
    /// Loads a record by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails or the payload is corrupt.
    fn get_record(&self, id: &RecordId) -> Result<Option<DataRecord>, StoreError>;

    /// Lists a dataset's records, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when listing fails.
    fn list_records(&self, dataset: &DatasetId) -> Result<Vec<DataRecord>, StoreError>;

    /// Returns ids of records in `dataset` whose `field` holds `target`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn referencing_record_ids(
        &self,
        dataset: &DatasetId,
        field: &FieldKey,
        target: &RecordId,
    ) -> Result<Vec<RecordId>, StoreError>;

    /// Inserts a new record row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails, including a duplicate id.
    fn insert_record(&self, record: &DataRecord) -> Result<(), StoreError>;

    /// Replaces a record's payload and `lastModified`.
    ///
    /// Returns `false` when no row matched.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the update fails.
    fn replace_record(&self, record: &DataRecord) -> Result<bool, StoreError>;

    /// Removes a record row.
    ///
    /// Returns `false` when no row matched.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the delete fails.
    fn remove_record(&self, id: &RecordId) -> Result<bool, StoreError>;

    /// Removes records whose dataset row no longer exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the delete fails.
    fn remove_orphaned_records(&self) -> Result<usize, StoreError>;
}

/// One transaction's view of the catalog and record tables.
pub trait StoreSession: DatasetCatalog + RecordStore {}

impl<T: DatasetCatalog + RecordStore + ?Sized> StoreSession for T {}

/// Store that scopes sessions to transactions.
pub trait TransactionalStore {
    /// Runs `op` against a read session.
    ///
    /// # Errors
    ///
    /// Returns the error produced by `op`, or a [`StoreError`] converted into
    /// `E` when the session cannot be opened.
    fn read<T, E, F>(&self, op: F) -> Result<T, E>
    where
        F: FnOnce(&dyn StoreSession) -> Result<T, E>,
        E: From<StoreError>;

    /// Runs `op` inside one write transaction.
    ///
    /// The transaction commits only when `op` returns `Ok`; any error rolls
    /// back every write `op` performed.
    ///
    /// # Errors
    ///
    /// Returns the error produced by `op`, or a [`StoreError`] converted into
    /// `E` when the transaction cannot be opened or committed.
    fn write<T, E, F>(&self, op: F) -> Result<T, E>
    where
        F: FnOnce(&dyn StoreSession) -> Result<T, E>,
        E: From<StoreError>;
}

// ============================================================================
// SECTION: Blob Store
// ============================================================================

/// Blob store errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlobError {
    /// No blob exists at the path.
    #[error("blob not found: {0}")]
    Missing(String),
    /// Blob store reported an error.
    #[error("blob store error: {0}")]
    Io(String),
}

/// Binary blob storage addressed by logical path.
pub trait BlobStore {
    /// Reads the bytes stored at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`BlobError`] when the blob is missing or unreadable.
    fn read(&self, path: &str) -> Result<Vec<u8>, BlobError>;

    /// Writes bytes to `path`, replacing any existing blob.
    ///
    /// # Errors
    ///
    /// Returns [`BlobError`] when writing fails.
    fn write(&self, path: &str, bytes: &[u8]) -> Result<(), BlobError>;

    /// Deletes the blob at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`BlobError`] when the blob is missing or deletion fails.
    fn delete(&self, path: &str) -> Result<(), BlobError>;
}

// ============================================================================
// SECTION: Clock
// ============================================================================

/// Source of managed timestamps.
pub trait Clock {
    /// Returns the current time.
    fn now(&self) -> Timestamp;
}

/// Wall-clock time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}
