// crates/lifeledger-core/src/runtime/engine.rs
// ============================================================================
// Module: Lifeledger Data Engine
// Description: Dataset and record operations with relational guarantees.
// Purpose: Single canonical execution path for every ledger operation.
// Dependencies: crate::{core, interfaces, runtime}, tracing
// ============================================================================

//! ## Overview
//! [`DataEngine`] is the operation surface a host bridge calls into. Every
//! mutation runs inside one write transaction of the injected
//! [`TransactionalStore`]: uniqueness checks, referential-integrity checks,
//! cascades, and the guarded writes commit together or not at all. Reads run
//! inside a read session so relation expansion sees one consistent snapshot.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use tracing::debug;
use tracing::info;

use crate::core::ConstraintViolation;
use crate::core::DataRecord;
use crate::core::Dataset;
use crate::core::DatasetDefinition;
use crate::core::DatasetId;
use crate::core::Document;
use crate::core::LedgerError;
use crate::core::NotFound;
use crate::core::RecordId;
use crate::core::Timestamp;
use crate::interfaces::BlobStore;
use crate::interfaces::Clock;
use crate::interfaces::StoreSession;
use crate::interfaces::SystemClock;
use crate::interfaces::TransactionalStore;
use crate::runtime::duplicates;
use crate::runtime::duplicates::DuplicateResult;
use crate::runtime::files;
use crate::runtime::files::FileCleanup;
use crate::runtime::integrity::RecordDeleter;
use crate::runtime::resolver::RelationResolver;
use crate::runtime::resolver::RelationSelection;
use crate::runtime::sync;
use crate::runtime::sync::PruneReport;
use crate::runtime::sync::SyncPolicy;
use crate::runtime::sync::SyncReport;
use crate::runtime::uniqueness::check_unique_fields;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for the data engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineConfig {
    /// Policy applied by [`DataEngine::sync_datasets`].
    pub sync_policy: SyncPolicy,
}

// ============================================================================
// SECTION: Results
// ============================================================================

/// Records removed by a record delete.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDeletion {
    /// The record that was asked to be deleted.
    pub record: DataRecord,
    /// Records removed by cascade, in deletion order.
    pub cascaded: Vec<DataRecord>,
    /// Blob cleanup outcome (empty unless files were requested).
    pub files: FileCleanup,
}

/// Dataset and records removed by a dataset delete.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetDeletion {
    /// The removed dataset descriptor.
    pub dataset: Dataset,
    /// Every removed record, including cascades into other datasets.
    pub records: Vec<DataRecord>,
}

// ============================================================================
// SECTION: Engine
// ============================================================================

/// Dataset/record engine over a transactional store.
pub struct DataEngine<S, C = SystemClock> {
    /// Backing store.
    store: S,
    /// Source of managed timestamps.
    clock: C,
    /// Engine configuration.
    config: EngineConfig,
}

impl<S: TransactionalStore> DataEngine<S> {
    /// Creates an engine using the system clock and default configuration.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self::with_clock(store, SystemClock, EngineConfig::default())
    }
}

impl<S, C> DataEngine<S, C>
where
    S: TransactionalStore,
    C: Clock,
{
    /// Creates an engine with an explicit clock and configuration.
    #[must_use]
    pub const fn with_clock(store: S, clock: C, config: EngineConfig) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    /// Returns the backing store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Returns the engine configuration.
    #[must_use]
    pub const fn config(&self) -> EngineConfig {
        self.config
    }

    // ------------------------------------------------------------------------
    // Datasets
    // ------------------------------------------------------------------------

    /// Creates a dataset from its definition.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Validation`] for invalid definitions and
    /// [`ConstraintViolation::DatasetExists`] when the id is taken.
    pub fn create_dataset(&self, definition: DatasetDefinition) -> Result<Dataset, LedgerError> {
        definition.validate()?;
        let now = self.clock.now();
        let dataset = self.store.write(|session| {
            if session.get_dataset(&definition.id)?.is_some() {
                return Err(ConstraintViolation::DatasetExists(definition.id.clone()).into());
            }
            let dataset = Dataset {
                definition,
                created_at: now,
                last_modified: now,
            };
            session.insert_dataset(&dataset)?;
            Ok::<_, LedgerError>(dataset)
        })?;
        info!(dataset = %dataset.id(), "dataset created");
        Ok(dataset)
    }

    /// Loads a dataset.
    ///
    /// # Errors
    ///
    /// Returns [`NotFound::Dataset`] when no such dataset exists.
    pub fn get_dataset(&self, id: &DatasetId) -> Result<Dataset, LedgerError> {
        self.store.read(|session| require_dataset(session, id))
    }

    /// Replaces a dataset's name, description, type, and fields.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Validation`] for invalid definitions and
    /// [`NotFound::Dataset`] when no such dataset exists.
    pub fn update_dataset(&self, definition: DatasetDefinition) -> Result<Dataset, LedgerError> {
        definition.validate()?;
        let now = self.clock.now();
        let dataset = self.store.write(|session| {
            let mut dataset = require_dataset(session, &definition.id)?;
            dataset.definition = definition;
            dataset.last_modified = now;
            if !session.update_dataset(&dataset)? {
                return Err(NotFound::Dataset(dataset.id().clone()).into());
            }
            Ok::<_, LedgerError>(dataset)
        })?;
        info!(dataset = %dataset.id(), "dataset updated");
        Ok(dataset)
    }

    /// Deletes a dataset and all of its records in one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`NotFound::Dataset`] when no such dataset exists and
    /// [`ConstraintViolation::Referenced`] when a prevent-delete relation
    /// blocks any of the deletions.
    pub fn delete_dataset(&self, id: &DatasetId) -> Result<DatasetDeletion, LedgerError> {
        let deletion = self.store.write(|session| {
            let mut deleter = RecordDeleter::new(session)?;
            let dataset = deleter.delete_dataset(id)?;
            Ok::<_, LedgerError>(DatasetDeletion {
                dataset,
                records: deleter.into_deleted(),
            })
        })?;
        info!(dataset = %id, records = deletion.records.len(), "dataset deleted");
        Ok(deletion)
    }

    /// Lists every dataset ordered by name.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Storage`] on backend failures.
    pub fn list_datasets(&self) -> Result<Vec<Dataset>, LedgerError> {
        self.store.read(|session| Ok(session.list_datasets()?))
    }

    // ------------------------------------------------------------------------
    // Records
    // ------------------------------------------------------------------------

    /// Adds a record with a generated id.
    ///
    /// # Errors
    ///
    /// Returns [`NotFound::Dataset`] for unknown datasets and
    /// [`ConstraintViolation::UniqueValue`] on uniqueness conflicts.
    pub fn add_record(
        &self,
        dataset_id: &DatasetId,
        data: Document,
    ) -> Result<DataRecord, LedgerError> {
        self.add_record_with_id(dataset_id, RecordId::generate(), data)
    }

    /// Adds a record under a caller-supplied id.
    ///
    /// # Errors
    ///
    /// Returns [`NotFound::Dataset`] for unknown datasets,
    /// [`ConstraintViolation::RecordExists`] when the id is taken, and
    /// [`ConstraintViolation::UniqueValue`] on uniqueness conflicts.
    pub fn add_record_with_id(
        &self,
        dataset_id: &DatasetId,
        id: RecordId,
        data: Document,
    ) -> Result<DataRecord, LedgerError> {
        let now = self.clock.now();
        let record = self.store.write(|session| {
            let dataset = require_dataset(session, dataset_id)?;
            insert_new_record(session, &dataset, id, data, now)
        })?;
        debug!(record = %record.id, dataset = %record.dataset_id, "record added");
        Ok(record)
    }

    /// Loads a record.
    ///
    /// # Errors
    ///
    /// Returns [`NotFound::Record`] when no such record exists.
    pub fn get_record(&self, id: &RecordId) -> Result<DataRecord, LedgerError> {
        self.store.read(|session| require_record(session, id))
    }

    /// Loads a record as a flat document with its relations resolved.
    ///
    /// # Errors
    ///
    /// Returns [`NotFound::Record`] when no such record exists.
    pub fn get_record_with_relations(
        &self,
        id: &RecordId,
        selection: &RelationSelection,
    ) -> Result<Document, LedgerError> {
        self.store.read(|session| {
            let record = require_record(session, id)?;
            RelationResolver::new(session).resolve(&record, selection)
        })
    }

    /// Replaces a record's payload and refreshes `lastModified`.
    ///
    /// # Errors
    ///
    /// Returns [`NotFound::Record`] when no such record exists and
    /// [`ConstraintViolation::UniqueValue`] on uniqueness conflicts.
    pub fn update_record(&self, id: &RecordId, data: Document) -> Result<DataRecord, LedgerError> {
        let now = self.clock.now();
        let record = self.store.write(|session| {
            let mut record = require_record(session, id)?;
            let dataset = require_dataset(session, &record.dataset_id)?;
            let data = prepare_payload(&dataset, data);
            check_unique_fields(session, &dataset, &record.id, &data)?;
            record.data = data;
            record.last_modified = now;
            if !session.replace_record(&record)? {
                return Err(NotFound::Record(record.id.clone()).into());
            }
            Ok::<_, LedgerError>(record)
        })?;
        debug!(record = %record.id, dataset = %record.dataset_id, "record updated");
        Ok(record)
    }

    /// Deletes a record, applying cascade and prevent policies.
    ///
    /// # Errors
    ///
    /// Returns [`NotFound::Record`] when no such record exists and
    /// [`ConstraintViolation::Referenced`] when the delete is blocked.
    pub fn delete_record(&self, id: &RecordId) -> Result<RecordDeletion, LedgerError> {
        let (deletion, _) = self.delete_record_collecting(id, false)?;
        Ok(deletion)
    }

    /// Deletes a record and then removes blobs referenced by file fields of
    /// every deleted record.
    ///
    /// Blob cleanup happens after the transaction commits; failures are
    /// reported in [`RecordDeletion::files`] and never undo the delete.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`DataEngine::delete_record`].
    pub fn delete_record_and_files(
        &self,
        id: &RecordId,
        blobs: &dyn BlobStore,
    ) -> Result<RecordDeletion, LedgerError> {
        let (mut deletion, paths) = self.delete_record_collecting(id, true)?;
        deletion.files = files::remove_files(blobs, paths);
        Ok(deletion)
    }

    /// Lists a dataset's records, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`NotFound::Dataset`] for unknown datasets.
    pub fn list_records(&self, dataset_id: &DatasetId) -> Result<Vec<DataRecord>, LedgerError> {
        self.store.read(|session| {
            require_dataset(session, dataset_id)?;
            Ok(session.list_records(dataset_id)?)
        })
    }

    /// Imports a batch of payloads into one dataset atomically.
    ///
    /// A payload may carry an `id`; otherwise one is generated. Uniqueness is
    /// enforced against existing records and earlier rows of the batch.
    ///
    /// # Errors
    ///
    /// Returns [`NotFound::Dataset`] for unknown datasets,
    /// [`LedgerError::Validation`] for malformed ids, and any constraint
    /// violation raised by a row. Nothing is written on error.
    pub fn import_records(
        &self,
        dataset_id: &DatasetId,
        batch: Vec<Document>,
    ) -> Result<Vec<DataRecord>, LedgerError> {
        let now = self.clock.now();
        let records = self.store.write(|session| {
            let dataset = require_dataset(session, dataset_id)?;
            let mut imported = Vec::with_capacity(batch.len());
            for row in batch {
                let id = import_id(&row)?;
                imported.push(insert_new_record(session, &dataset, id, row, now)?);
            }
            Ok::<_, LedgerError>(imported)
        })?;
        info!(dataset = %dataset_id, records = records.len(), "records imported");
        Ok(records)
    }

    // ------------------------------------------------------------------------
    // Relations and duplicates
    // ------------------------------------------------------------------------

    /// Lists a dataset's records as flat documents with relations resolved.
    ///
    /// # Errors
    ///
    /// Returns [`NotFound::Dataset`] for unknown datasets.
    pub fn get_records_with_relations(
        &self,
        dataset_id: &DatasetId,
        selection: &RelationSelection,
    ) -> Result<Vec<Document>, LedgerError> {
        self.store.read(|session| {
            require_dataset(session, dataset_id)?;
            let records = session.list_records(dataset_id)?;
            let mut resolver = RelationResolver::new(session);
            records.iter().map(|record| resolver.resolve(record, selection)).collect()
        })
    }

    /// Finds existing records fully matching import candidates.
    ///
    /// # Errors
    ///
    /// Returns [`NotFound::Dataset`] for unknown datasets.
    pub fn find_duplicates(
        &self,
        dataset_id: &DatasetId,
        candidates: &[Document],
        fields: &[String],
    ) -> Result<Vec<DuplicateResult>, LedgerError> {
        self.store.read(|session| {
            require_dataset(session, dataset_id)?;
            let existing = session.list_records(dataset_id)?;
            let fields = duplicates::effective_fields(candidates, fields);
            Ok(duplicates::find_duplicates(&existing, candidates, &fields))
        })
    }

    // ------------------------------------------------------------------------
    // Catalog synchronization
    // ------------------------------------------------------------------------

    /// Reconciles the declared catalog with the stored one in one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Validation`] for invalid or repeated definitions.
    pub fn sync_datasets(
        &self,
        definitions: &[DatasetDefinition],
    ) -> Result<SyncReport, LedgerError> {
        let now = self.clock.now();
        let policy = self.config.sync_policy;
        let report =
            self.store.write(|session| sync::synchronize(session, definitions, policy, now))?;
        info!(
            created = report.created.len(),
            updated = report.updated.len(),
            unchanged = report.unchanged.len(),
            "dataset catalog synchronized"
        );
        Ok(report)
    }

    /// Deletes datasets missing from `declared` and any orphaned records.
    ///
    /// # Errors
    ///
    /// Returns [`ConstraintViolation::Referenced`] when a deletion is blocked.
    pub fn prune_undeclared(
        &self,
        declared: &[DatasetDefinition],
    ) -> Result<PruneReport, LedgerError> {
        let report = self.store.write(|session| sync::prune_undeclared(session, declared))?;
        info!(
            datasets = report.removed_datasets.len(),
            records = report.removed_records,
            orphaned = report.orphaned_records,
            "undeclared datasets pruned"
        );
        Ok(report)
    }

    /// Deletes a record, optionally collecting blob paths of deleted records.
    fn delete_record_collecting(
        &self,
        id: &RecordId,
        collect_files: bool,
    ) -> Result<(RecordDeletion, Vec<String>), LedgerError> {
        let (deletion, paths) = self.store.write(|session| {
            let record = require_record(session, id)?;
            let mut deleter = RecordDeleter::new(session)?;
            deleter.delete_record(record)?;
            let mut deleted = deleter.into_deleted();
            let Some(record) = deleted.pop() else {
                return Err(NotFound::Record(id.clone()).into());
            };
            let paths = if collect_files {
                collect_file_paths(session, &deleted, &record)?
            } else {
                Vec::new()
            };
            let deletion = RecordDeletion {
                record,
                cascaded: deleted,
                files: FileCleanup::default(),
            };
            Ok::<_, LedgerError>((deletion, paths))
        })?;
        debug!(record = %id, cascaded = deletion.cascaded.len(), "record deleted");
        Ok((deletion, paths))
    }
}

// ============================================================================
// SECTION: Payload Helpers
// ============================================================================

/// Parses JSON text into a payload document.
///
/// # Errors
///
/// Returns [`LedgerError::MalformedPayload`] when the text is not a JSON object.
pub fn payload_from_json(text: &str) -> Result<Document, LedgerError> {
    Document::parse_json(text).map_err(LedgerError::MalformedPayload)
}

/// Converts a JSON value into a payload document.
///
/// # Errors
///
/// Returns [`LedgerError::MalformedPayload`] when the value is not an object.
pub fn payload_from_value(value: Value) -> Result<Document, LedgerError> {
    Document::from_value(value).map_err(LedgerError::MalformedPayload)
}

/// Removes envelope metadata and embedded relation keys from a payload.
fn prepare_payload(dataset: &Dataset, mut data: Document) -> Document {
    data.strip_metadata();
    for (field, _) in dataset.definition.relation_fields() {
        data.remove(&field.key.embedded_key());
    }
    data
}

/// Validates and inserts a brand-new record.
fn insert_new_record(
    session: &dyn StoreSession,
    dataset: &Dataset,
    id: RecordId,
    data: Document,
    now: Timestamp,
) -> Result<DataRecord, LedgerError> {
    if session.get_record(&id)?.is_some() {
        return Err(ConstraintViolation::RecordExists(id).into());
    }
    let data = prepare_payload(dataset, data);
    check_unique_fields(session, dataset, &id, &data)?;
    let record = DataRecord {
        id,
        dataset_id: dataset.id().clone(),
        data,
        created_at: now,
        last_modified: now,
    };
    session.insert_record(&record)?;
    Ok(record)
}

/// Returns the id an imported row is stored under.
fn import_id(row: &Document) -> Result<RecordId, LedgerError> {
    match row.get("id") {
        None | Some(Value::Null) => Ok(RecordId::generate()),
        Some(Value::String(raw)) if raw.is_empty() => Ok(RecordId::generate()),
        Some(Value::String(raw)) => Ok(RecordId::parse(raw.as_str())?),
        Some(_) => Err(LedgerError::Validation("imported record id must be a string".to_string())),
    }
}

/// Loads a dataset or fails with not-found.
fn require_dataset(session: &dyn StoreSession, id: &DatasetId) -> Result<Dataset, LedgerError> {
    session.get_dataset(id)?.ok_or_else(|| NotFound::Dataset(id.clone()).into())
}

/// Loads a record or fails with not-found.
fn require_record(session: &dyn StoreSession, id: &RecordId) -> Result<DataRecord, LedgerError> {
    session.get_record(id)?.ok_or_else(|| NotFound::Record(id.clone()).into())
}

/// Collects blob paths referenced by the deleted records.
fn collect_file_paths(
    session: &dyn StoreSession,
    cascaded: &[DataRecord],
    record: &DataRecord,
) -> Result<Vec<String>, LedgerError> {
    let datasets = session.list_datasets()?;
    let mut paths = Vec::new();
    for deleted in cascaded.iter().chain(std::iter::once(record)) {
        if let Some(dataset) = datasets.iter().find(|dataset| dataset.id() == &deleted.dataset_id) {
            paths.extend(files::file_paths(&dataset.definition, &deleted.data));
        }
    }
    Ok(paths)
}
