// crates/lifeledger-core/src/runtime/store.rs
// ============================================================================
// Module: Lifeledger In-Memory Store
// Description: In-memory catalog, record, and blob stores for tests.
// Purpose: Provide isolated store implementations without external deps.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! [`InMemoryLedgerStore`] implements [`TransactionalStore`] over plain maps.
//! A write session works on a private copy of the state and swaps it in only
//! when the operation succeeds, so failed operations leave no trace. The
//! store mutex is held for the whole session, serializing writers. It is not
//! intended for production use.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use serde_json::Value;

use crate::core::DataRecord;
use crate::core::Dataset;
use crate::core::DatasetId;
use crate::core::FieldKey;
use crate::core::RecordId;
use crate::interfaces::BlobError;
use crate::interfaces::BlobStore;
use crate::interfaces::DatasetCatalog;
use crate::interfaces::RecordStore;
use crate::interfaces::StoreError;
use crate::interfaces::StoreSession;
use crate::interfaces::TransactionalStore;

// ============================================================================
// SECTION: State
// ============================================================================

/// Stored record with its insertion sequence.
#[derive(Debug, Clone)]
struct StoredRecord {
    /// Record contents.
    record: DataRecord,
    /// Monotonic insertion counter (tie-breaker for ordering).
    sequence: u64,
}

/// Tables of the in-memory store.
#[derive(Debug, Clone, Default)]
struct MemoryState {
    /// Dataset rows keyed by id.
    datasets: BTreeMap<DatasetId, Dataset>,
    /// Record rows keyed by id.
    records: BTreeMap<RecordId, StoredRecord>,
    /// Next insertion sequence.
    next_sequence: u64,
}

/// Session over a private copy of the state.
struct MemorySession {
    /// Working copy.
    state: RefCell<MemoryState>,
}

// ============================================================================
// SECTION: Ledger Store
// ============================================================================

/// In-memory ledger store for tests and examples.
#[derive(Debug, Default, Clone)]
pub struct InMemoryLedgerStore {
    /// Committed state protected by a mutex.
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryLedgerStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TransactionalStore for InMemoryLedgerStore {
    fn read<T, E, F>(&self, op: F) -> Result<T, E>
    where
        F: FnOnce(&dyn StoreSession) -> Result<T, E>,
        E: From<StoreError>,
    {
        let snapshot = {
            let guard = self.state.lock().map_err(|_| poisoned())?;
            guard.clone()
        };
        let session = MemorySession {
            state: RefCell::new(snapshot),
        };
        op(&session)
    }

    fn write<T, E, F>(&self, op: F) -> Result<T, E>
    where
        F: FnOnce(&dyn StoreSession) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut guard = self.state.lock().map_err(|_| poisoned())?;
        let session = MemorySession {
            state: RefCell::new(guard.clone()),
        };
        let output = op(&session)?;
        *guard = session.state.into_inner();
        drop(guard);
        Ok(output)
    }
}

impl DatasetCatalog for MemorySession {
    fn get_dataset(&self, id: &DatasetId) -> Result<Option<Dataset>, StoreError> {
        Ok(self.state.borrow().datasets.get(id).cloned())
    }

    fn list_datasets(&self) -> Result<Vec<Dataset>, StoreError> {
        let mut datasets: Vec<Dataset> = self.state.borrow().datasets.values().cloned().collect();
        datasets.sort_by(|left, right| {
            left.definition.name.cmp(&right.definition.name).then_with(|| left.id().cmp(right.id()))
        });
        Ok(datasets)
    }

    fn insert_dataset(&self, dataset: &Dataset) -> Result<(), StoreError> {
        let mut state = self.state.borrow_mut();
        if state.datasets.contains_key(dataset.id()) {
            return Err(StoreError::Invalid(format!("dataset {} already exists", dataset.id())));
        }
        state.datasets.insert(dataset.id().clone(), dataset.clone());
        Ok(())
    }

    fn update_dataset(&self, dataset: &Dataset) -> Result<bool, StoreError> {
        let mut state = self.state.borrow_mut();
        let Some(stored) = state.datasets.get_mut(dataset.id()) else {
            return Ok(false);
        };
        stored.definition = dataset.definition.clone();
        stored.last_modified = dataset.last_modified;
        Ok(true)
    }

    fn remove_dataset(&self, id: &DatasetId) -> Result<bool, StoreError> {
        Ok(self.state.borrow_mut().datasets.remove(id).is_some())
    }
}

impl RecordStore for MemorySession {
    fn get_record(&self, id: &RecordId) -> Result<Option<DataRecord>, StoreError> {
        Ok(self.state.borrow().records.get(id).map(|stored| stored.record.clone()))
    }

    fn list_records(&self, dataset: &DatasetId) -> Result<Vec<DataRecord>, StoreError> {
        let state = self.state.borrow();
        let mut rows: Vec<&StoredRecord> =
            state.records.values().filter(|stored| &stored.record.dataset_id == dataset).collect();
        rows.sort_by(|left, right| {
            right
                .record
                .created_at
                .cmp(&left.record.created_at)
                .then_with(|| right.sequence.cmp(&left.sequence))
        });
        Ok(rows.into_iter().map(|stored| stored.record.clone()).collect())
    }

    fn referencing_record_ids(
        &self,
        dataset: &DatasetId,
        field: &FieldKey,
        target: &RecordId,
    ) -> Result<Vec<RecordId>, StoreError> {
        let state = self.state.borrow();
        let mut rows: Vec<&StoredRecord> = state
            .records
            .values()
            .filter(|stored| &stored.record.dataset_id == dataset)
            .filter(|stored| {
                matches!(
                    stored.record.data.get(field.as_str()),
                    Some(Value::String(value)) if value == target.as_str()
                )
            })
            .collect();
        rows.sort_by_key(|stored| stored.sequence);
        Ok(rows.into_iter().map(|stored| stored.record.id.clone()).collect())
    }

    fn insert_record(&self, record: &DataRecord) -> Result<(), StoreError> {
        let mut state = self.state.borrow_mut();
        if state.records.contains_key(&record.id) {
            return Err(StoreError::Invalid(format!("record {} already exists", record.id)));
        }
        let sequence = state.next_sequence;
        state.next_sequence = sequence.saturating_add(1);
        state.records.insert(
            record.id.clone(),
            StoredRecord {
                record: record.clone(),
                sequence,
            },
        );
        Ok(())
    }

    fn replace_record(&self, record: &DataRecord) -> Result<bool, StoreError> {
        let mut state = self.state.borrow_mut();
        let Some(stored) = state.records.get_mut(&record.id) else {
            return Ok(false);
        };
        stored.record.data = record.data.clone();
        stored.record.last_modified = record.last_modified;
        Ok(true)
    }

    fn remove_record(&self, id: &RecordId) -> Result<bool, StoreError> {
        Ok(self.state.borrow_mut().records.remove(id).is_some())
    }

    fn remove_orphaned_records(&self) -> Result<usize, StoreError> {
        let mut state = self.state.borrow_mut();
        let MemoryState {
            datasets,
            records,
            ..
        } = &mut *state;
        let before = records.len();
        records.retain(|_, stored| datasets.contains_key(&stored.record.dataset_id));
        Ok(before - records.len())
    }
}

/// Returns the error reported when the store mutex is poisoned.
fn poisoned() -> StoreError {
    StoreError::Db("in-memory ledger store mutex poisoned".to_string())
}

// ============================================================================
// SECTION: Blob Store
// ============================================================================

/// In-memory blob store for tests and examples.
#[derive(Debug, Default, Clone)]
pub struct InMemoryBlobStore {
    /// Blob bytes keyed by logical path.
    blobs: Arc<Mutex<BTreeMap<String, Vec<u8>>>>,
}

impl InMemoryBlobStore {
    /// Creates an empty blob store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every stored path in order.
    ///
    /// # Errors
    ///
    /// Returns [`BlobError::Io`] when the mutex is poisoned.
    pub fn paths(&self) -> Result<Vec<String>, BlobError> {
        let guard = self.blobs.lock().map_err(|_| blob_poisoned())?;
        Ok(guard.keys().cloned().collect())
    }
}

impl BlobStore for InMemoryBlobStore {
    fn read(&self, path: &str) -> Result<Vec<u8>, BlobError> {
        let guard = self.blobs.lock().map_err(|_| blob_poisoned())?;
        guard.get(path).cloned().ok_or_else(|| BlobError::Missing(path.to_string()))
    }

    fn write(&self, path: &str, bytes: &[u8]) -> Result<(), BlobError> {
        let mut guard = self.blobs.lock().map_err(|_| blob_poisoned())?;
        guard.insert(path.to_string(), bytes.to_vec());
        Ok(())
    }

    fn delete(&self, path: &str) -> Result<(), BlobError> {
        let mut guard = self.blobs.lock().map_err(|_| blob_poisoned())?;
        guard.remove(path).map(|_| ()).ok_or_else(|| BlobError::Missing(path.to_string()))
    }
}

/// Returns the error reported when the blob mutex is poisoned.
fn blob_poisoned() -> BlobError {
    BlobError::Io("in-memory blob store mutex poisoned".to_string())
}
