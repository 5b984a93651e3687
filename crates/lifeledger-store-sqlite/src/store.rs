// crates/lifeledger-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Ledger Store
// Description: Durable dataset catalog and record store backed by SQLite.
// Purpose: Persist datasets and opaque JSON records with transactional sessions.
// Dependencies: lifeledger-core, rusqlite, serde, serde_json, thiserror, tracing
// ============================================================================

//! ## Overview
//! This module implements [`TransactionalStore`] over a single `SQLite`
//! connection. The layout has two tables: `datasets` holds descriptors with the
//! field list serialized as JSON, and `data_records` holds opaque JSON
//! payloads. The engine does not rely on any foreign key between them.
//!
//! Every relation field gets a partial expression index over
//! `json_extract(data, '$."<key>"')` scoped to its dataset. Indexes are
//! reconciled whenever a dataset row is written and dropped with the dataset.
//! Dataset ids and field keys are slugs, so they are embedded as SQL literals
//! and identifiers directly; reference lookups use the exact indexed
//! expression so the planner can pick the index.
//!
//! Stored payloads are untrusted: unparseable JSON or identifiers surface as
//! [`SqliteStoreError::Corrupt`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use lifeledger_core::DataRecord;
use lifeledger_core::Dataset;
use lifeledger_core::DatasetCatalog;
use lifeledger_core::DatasetDefinition;
use lifeledger_core::DatasetId;
use lifeledger_core::DatasetType;
use lifeledger_core::Document;
use lifeledger_core::FieldDefinition;
use lifeledger_core::FieldKey;
use lifeledger_core::RecordId;
use lifeledger_core::RecordStore;
use lifeledger_core::StoreError;
use lifeledger_core::StoreSession;
use lifeledger_core::Timestamp;
use lifeledger_core::TransactionalStore;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::TransactionBehavior;
use rusqlite::params;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
pub const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Name prefix shared by relation indexes.
const RELATION_INDEX_PREFIX: &str = "idx_rel_";

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` ledger store.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `busy_timeout_ms` is interpreted as milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteStoreConfig {
    /// Creates a configuration with default pragmas for `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }

    /// Validates the configured path against safety limits.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::Invalid`] when the path is unusable.
    pub fn validate(&self) -> Result<(), SqliteStoreError> {
        validate_store_path(&self.path)
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
///
/// # Invariants
/// - Error messages avoid embedding raw record payloads.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Stored row cannot be decoded.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid store configuration or request.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) => Self::Db(message),
            SqliteStoreError::Corrupt(message) => Self::Corrupt(message),
            SqliteStoreError::VersionMismatch(message) => Self::VersionMismatch(message),
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
        }
    }
}

/// Maps a `rusqlite` error into [`SqliteStoreError::Db`].
#[allow(clippy::needless_pass_by_value, reason = "Signature matches `map_err`.")]
fn db_error(err: rusqlite::Error) -> SqliteStoreError {
    SqliteStoreError::Db(err.to_string())
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed ledger store.
///
/// # Invariants
/// - Connection access is serialized through a mutex; a session holds the
///   lock for its whole transaction.
/// - Write sessions begin with `BEGIN IMMEDIATE` and commit only on success.
#[derive(Clone)]
pub struct SqliteLedgerStore {
    /// Shared connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
}

impl SqliteLedgerStore {
    /// Opens an `SQLite`-backed ledger store.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// initialized.
    pub fn new(config: &SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        config.validate()?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(config)?;
        initialize_schema(&mut connection)?;
        debug!(path = %config.path.display(), "sqlite ledger store opened");
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Opens a private in-memory database with the same schema.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be initialized.
    pub fn open_in_memory() -> Result<Self, SqliteStoreError> {
        let mut connection = Connection::open_in_memory().map_err(db_error)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Verifies the store can execute a simple SQL statement.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] if the mutex is poisoned or the query fails.
    pub fn readiness(&self) -> Result<(), SqliteStoreError> {
        let guard = self.lock()?;
        guard.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)).map_err(db_error)?;
        Ok(())
    }

    /// Acquires the connection mutex.
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, SqliteStoreError> {
        self.connection
            .lock()
            .map_err(|_| SqliteStoreError::Io("sqlite connection mutex poisoned".to_string()))
    }
}

impl TransactionalStore for SqliteLedgerStore {
    fn read<T, E, F>(&self, op: F) -> Result<T, E>
    where
        F: FnOnce(&dyn StoreSession) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut guard = self.lock().map_err(into_caller_error::<E>)?;
        let tx = guard
            .transaction_with_behavior(TransactionBehavior::Deferred)
            .map_err(|err| into_caller_error::<E>(db_error(err)))?;
        let session = SqliteSession {
            connection: &tx,
        };
        op(&session)
    }

    fn write<T, E, F>(&self, op: F) -> Result<T, E>
    where
        F: FnOnce(&dyn StoreSession) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut guard = self.lock().map_err(into_caller_error::<E>)?;
        let tx = guard
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|err| into_caller_error::<E>(db_error(err)))?;
        let session = SqliteSession {
            connection: &tx,
        };
        let output = op(&session)?;
        tx.commit().map_err(|err| into_caller_error::<E>(db_error(err)))?;
        Ok(output)
    }
}

/// Converts a store error into the caller's error type.
fn into_caller_error<E: From<StoreError>>(error: SqliteStoreError) -> E {
    E::from(StoreError::from(error))
}

// ============================================================================
// SECTION: Session
// ============================================================================

/// One transaction's view of the ledger tables.
struct SqliteSession<'conn> {
    /// Connection running the open transaction.
    connection: &'conn Connection,
}

/// Raw dataset row before decoding.
struct DatasetRow {
    /// Dataset id text.
    id: String,
    /// Display name.
    name: String,
    /// Description.
    description: String,
    /// Dataset type label.
    dataset_type: String,
    /// Field list JSON.
    fields: String,
    /// Creation time (unix ms).
    created_at: i64,
    /// Last write time (unix ms).
    last_modified: i64,
}

/// Raw record row before decoding.
struct RecordRow {
    /// Record id text.
    id: String,
    /// Owning dataset id text.
    dataset_id: String,
    /// Payload JSON.
    data: String,
    /// Creation time (unix ms).
    created_at: i64,
    /// Last write time (unix ms).
    last_modified: i64,
}

impl DatasetCatalog for SqliteSession<'_> {
    fn get_dataset(&self, id: &DatasetId) -> Result<Option<Dataset>, StoreError> {
        let row = self
            .connection
            .prepare_cached(
                "SELECT id, name, description, type, fields, created_at, last_modified FROM \
                 datasets WHERE id = ?1",
            )
            .map_err(db_error)?
            .query_row(params![id.as_str()], map_dataset_row)
            .optional()
            .map_err(db_error)?;
        Ok(row.map(decode_dataset).transpose()?)
    }

    fn list_datasets(&self) -> Result<Vec<Dataset>, StoreError> {
        let mut stmt = self
            .connection
            .prepare_cached(
                "SELECT id, name, description, type, fields, created_at, last_modified FROM \
                 datasets ORDER BY name, id",
            )
            .map_err(db_error)?;
        let rows = stmt
            .query_map([], map_dataset_row)
            .map_err(db_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_error)?;
        Ok(rows.into_iter().map(decode_dataset).collect::<Result<Vec<_>, _>>()?)
    }

    fn insert_dataset(&self, dataset: &Dataset) -> Result<(), StoreError> {
        let fields = encode_fields(&dataset.definition.fields)?;
        self.connection
            .prepare_cached(
                "INSERT INTO datasets (id, name, description, type, fields, created_at, \
                 last_modified) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )
            .map_err(db_error)?
            .execute(params![
                dataset.id().as_str(),
                dataset.definition.name,
                dataset.definition.description,
                String::from(dataset.definition.dataset_type.clone()),
                fields,
                dataset.created_at.as_unix_millis(),
                dataset.last_modified.as_unix_millis()
            ])
            .map_err(db_error)?;
        sync_relation_indexes(self.connection, &dataset.definition)?;
        Ok(())
    }

    fn update_dataset(&self, dataset: &Dataset) -> Result<bool, StoreError> {
        let fields = encode_fields(&dataset.definition.fields)?;
        let changed = self
            .connection
            .prepare_cached(
                "UPDATE datasets SET name = ?2, description = ?3, type = ?4, fields = ?5, \
                 last_modified = ?6 WHERE id = ?1",
            )
            .map_err(db_error)?
            .execute(params![
                dataset.id().as_str(),
                dataset.definition.name,
                dataset.definition.description,
                String::from(dataset.definition.dataset_type.clone()),
                fields,
                dataset.last_modified.as_unix_millis()
            ])
            .map_err(db_error)?;
        if changed == 0 {
            return Ok(false);
        }
        sync_relation_indexes(self.connection, &dataset.definition)?;
        Ok(true)
    }

    fn remove_dataset(&self, id: &DatasetId) -> Result<bool, StoreError> {
        let changed = self
            .connection
            .prepare_cached("DELETE FROM datasets WHERE id = ?1")
            .map_err(db_error)?
            .execute(params![id.as_str()])
            .map_err(db_error)?;
        for name in relation_index_names(self.connection, id)? {
            drop_relation_index(self.connection, &name)?;
        }
        Ok(changed > 0)
    }
}

impl RecordStore for SqliteSession<'_> {
    fn get_record(&self, id: &RecordId) -> Result<Option<DataRecord>, StoreError> {
        let row = self
            .connection
            .prepare_cached(
                "SELECT id, dataset_id, data, created_at, last_modified FROM data_records WHERE \
                 id = ?1",
            )
            .map_err(db_error)?
            .query_row(params![id.as_str()], map_record_row)
            .optional()
            .map_err(db_error)?;
        Ok(row.map(decode_record).transpose()?)
    }

    fn list_records(&self, dataset: &DatasetId) -> Result<Vec<DataRecord>, StoreError> {
        let mut stmt = self
            .connection
            .prepare_cached(
                "SELECT id, dataset_id, data, created_at, last_modified FROM data_records WHERE \
                 dataset_id = ?1 ORDER BY created_at DESC, rowid DESC",
            )
            .map_err(db_error)?;
        let rows = stmt
            .query_map(params![dataset.as_str()], map_record_row)
            .map_err(db_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_error)?;
        Ok(rows.into_iter().map(decode_record).collect::<Result<Vec<_>, _>>()?)
    }

    fn referencing_record_ids(
        &self,
        dataset: &DatasetId,
        field: &FieldKey,
        target: &RecordId,
    ) -> Result<Vec<RecordId>, StoreError> {
        let sql = format!(
            "SELECT id FROM data_records WHERE dataset_id = '{dataset}' AND {} = ?1 ORDER BY \
             rowid",
            relation_expression(field)
        );
        let mut stmt = self.connection.prepare_cached(&sql).map_err(db_error)?;
        let ids = stmt
            .query_map(params![target.as_str()], |row| row.get::<_, String>(0))
            .map_err(db_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_error)?;
        Ok(ids.into_iter().map(decode_record_id).collect::<Result<Vec<_>, _>>()?)
    }

    fn insert_record(&self, record: &DataRecord) -> Result<(), StoreError> {
        self.connection
            .prepare_cached(
                "INSERT INTO data_records (id, dataset_id, data, created_at, last_modified) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .map_err(db_error)?
            .execute(params![
                record.id.as_str(),
                record.dataset_id.as_str(),
                record.data.to_json_string(),
                record.created_at.as_unix_millis(),
                record.last_modified.as_unix_millis()
            ])
            .map_err(db_error)?;
        Ok(())
    }

    fn replace_record(&self, record: &DataRecord) -> Result<bool, StoreError> {
        let changed = self
            .connection
            .prepare_cached("UPDATE data_records SET data = ?2, last_modified = ?3 WHERE id = ?1")
            .map_err(db_error)?
            .execute(params![
                record.id.as_str(),
                record.data.to_json_string(),
                record.last_modified.as_unix_millis()
            ])
            .map_err(db_error)?;
        Ok(changed > 0)
    }

    fn remove_record(&self, id: &RecordId) -> Result<bool, StoreError> {
        let changed = self
            .connection
            .prepare_cached("DELETE FROM data_records WHERE id = ?1")
            .map_err(db_error)?
            .execute(params![id.as_str()])
            .map_err(db_error)?;
        Ok(changed > 0)
    }

    fn remove_orphaned_records(&self) -> Result<usize, StoreError> {
        let removed = self
            .connection
            .execute(
                "DELETE FROM data_records WHERE dataset_id NOT IN (SELECT id FROM datasets)",
                [],
            )
            .map_err(db_error)?;
        Ok(removed)
    }
}

// ============================================================================
// SECTION: Row Decoding
// ============================================================================

/// Reads a dataset row.
fn map_dataset_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DatasetRow> {
    Ok(DatasetRow {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        dataset_type: row.get(3)?,
        fields: row.get(4)?,
        created_at: row.get(5)?,
        last_modified: row.get(6)?,
    })
}

/// Reads a record row.
fn map_record_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RecordRow> {
    Ok(RecordRow {
        id: row.get(0)?,
        dataset_id: row.get(1)?,
        data: row.get(2)?,
        created_at: row.get(3)?,
        last_modified: row.get(4)?,
    })
}

/// Decodes a dataset row into a [`Dataset`].
fn decode_dataset(row: DatasetRow) -> Result<Dataset, SqliteStoreError> {
    let id = DatasetId::parse(row.id)
        .map_err(|err| SqliteStoreError::Corrupt(format!("dataset row: {err}")))?;
    let fields: Vec<FieldDefinition> = serde_json::from_str(&row.fields)
        .map_err(|err| SqliteStoreError::Corrupt(format!("fields of dataset {id}: {err}")))?;
    Ok(Dataset {
        definition: DatasetDefinition {
            id,
            name: row.name,
            description: row.description,
            dataset_type: DatasetType::from(row.dataset_type),
            fields,
        },
        created_at: Timestamp::from_unix_millis(row.created_at),
        last_modified: Timestamp::from_unix_millis(row.last_modified),
    })
}

/// Decodes a record row into a [`DataRecord`].
fn decode_record(row: RecordRow) -> Result<DataRecord, SqliteStoreError> {
    let id = decode_record_id(row.id)?;
    let dataset_id = DatasetId::parse(row.dataset_id)
        .map_err(|err| SqliteStoreError::Corrupt(format!("record {id}: {err}")))?;
    let data = Document::parse_json(&row.data)
        .map_err(|err| SqliteStoreError::Corrupt(format!("payload of record {id}: {err}")))?;
    Ok(DataRecord {
        id,
        dataset_id,
        data,
        created_at: Timestamp::from_unix_millis(row.created_at),
        last_modified: Timestamp::from_unix_millis(row.last_modified),
    })
}

/// Parses a stored record id.
fn decode_record_id(value: String) -> Result<RecordId, SqliteStoreError> {
    RecordId::parse(value).map_err(|err| SqliteStoreError::Corrupt(format!("record row: {err}")))
}

/// Serializes a field list for the `fields` column.
fn encode_fields(fields: &[FieldDefinition]) -> Result<String, SqliteStoreError> {
    serde_json::to_string(fields).map_err(|err| SqliteStoreError::Invalid(err.to_string()))
}

// ============================================================================
// SECTION: Relation Indexes
// ============================================================================

/// Returns the indexed expression for a relation field.
fn relation_expression(field: &FieldKey) -> String {
    format!("json_extract(data, '$.\"{field}\"')")
}

/// Returns the index name for a relation field.
///
/// The dataset id length prefix keeps names unambiguous when ids and keys
/// contain underscores.
fn relation_index_name(dataset: &DatasetId, field: &FieldKey) -> String {
    format!("{RELATION_INDEX_PREFIX}{}_{dataset}_{field}", dataset.as_str().len())
}

/// Lists relation indexes currently present for a dataset.
fn relation_index_names(
    connection: &Connection,
    dataset: &DatasetId,
) -> Result<BTreeSet<String>, SqliteStoreError> {
    let prefix = format!("{RELATION_INDEX_PREFIX}{}_{dataset}_", dataset.as_str().len());
    let mut stmt = connection
        .prepare_cached(
            "SELECT name FROM sqlite_master WHERE type = 'index' AND tbl_name = 'data_records' \
             AND substr(name, 1, ?2) = ?1",
        )
        .map_err(db_error)?;
    let prefix_len = i64::try_from(prefix.len())
        .map_err(|_| SqliteStoreError::Invalid("index prefix too long".to_string()))?;
    let names = stmt
        .query_map(params![prefix, prefix_len], |row| row.get::<_, String>(0))
        .map_err(db_error)?
        .collect::<Result<BTreeSet<_>, _>>()
        .map_err(db_error)?;
    Ok(names)
}

/// Creates and drops relation indexes so they match the definition.
fn sync_relation_indexes(
    connection: &Connection,
    definition: &DatasetDefinition,
) -> Result<(), SqliteStoreError> {
    let wanted: BTreeMap<String, &FieldKey> = definition
        .relation_fields()
        .map(|(field, _)| (relation_index_name(&definition.id, &field.key), &field.key))
        .collect();
    let existing = relation_index_names(connection, &definition.id)?;
    for name in existing.iter().filter(|name| !wanted.contains_key(*name)) {
        drop_relation_index(connection, name)?;
    }
    for (name, field) in wanted.iter().filter(|(name, _)| !existing.contains(*name)) {
        let sql = format!(
            "CREATE INDEX IF NOT EXISTS \"{name}\" ON data_records ({}) WHERE dataset_id = \
             '{}'",
            relation_expression(field),
            definition.id
        );
        connection.execute_batch(&sql).map_err(db_error)?;
        debug!(dataset = %definition.id, field = %field, index = %name, "relation index created");
    }
    Ok(())
}

/// Drops one relation index.
fn drop_relation_index(connection: &Connection, name: &str) -> Result<(), SqliteStoreError> {
    connection.execute_batch(&format!("DROP INDEX IF EXISTS \"{name}\"")).map_err(db_error)?;
    debug!(index = %name, "relation index dropped");
    Ok(())
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    if path.as_os_str().is_empty() {
        return Err(SqliteStoreError::Invalid("store path must not be empty".to_string()));
    }
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with the configured pragmas.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags).map_err(db_error)?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies `SQLite` pragmas required for durability.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(db_error)?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(db_error)?;
    connection
        .busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))
        .map_err(db_error)?;
    Ok(())
}

/// Initializes the `SQLite` schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction().map_err(db_error)?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(db_error)?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(db_error)?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(db_error)?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS datasets (
                    id TEXT PRIMARY KEY NOT NULL,
                    name TEXT NOT NULL,
                    description TEXT NOT NULL,
                    type TEXT NOT NULL,
                    fields TEXT NOT NULL,
                    created_at INTEGER NOT NULL,
                    last_modified INTEGER NOT NULL
                );
                CREATE TABLE IF NOT EXISTS data_records (
                    id TEXT PRIMARY KEY NOT NULL,
                    dataset_id TEXT NOT NULL,
                    data TEXT NOT NULL,
                    created_at INTEGER NOT NULL,
                    last_modified INTEGER NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_data_records_dataset_id
                    ON data_records (dataset_id);",
            )
            .map_err(db_error)?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.commit().map_err(db_error)?;
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
