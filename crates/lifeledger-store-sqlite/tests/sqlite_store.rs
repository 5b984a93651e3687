// crates/lifeledger-store-sqlite/tests/sqlite_store.rs
// ============================================================================
// Module: SQLite Ledger Store Tests
// Description: On-disk behavior of the SQLite ledger store.
// Purpose: Validate path safety, schema versioning, relation indexes,
//          transactional rollback, and engine behavior over SQLite.
// ============================================================================

//! ## Overview
//! Integration tests for the `SQLite` store:
//! - Path safety checks and schema version validation
//! - Persistence across reopen and corrupt payload detection
//! - Relation index lifecycle in `sqlite_master`
//! - Integrity, uniqueness, and relation semantics through the engine
//! - Rollback of failed multi-step writes

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only assertions and helpers are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::cell::Cell;
use std::path::Path;
use std::path::PathBuf;

use lifeledger_core::Clock;
use lifeledger_core::ConstraintViolation;
use lifeledger_core::DataEngine;
use lifeledger_core::DatasetDefinition;
use lifeledger_core::DatasetId;
use lifeledger_core::DatasetType;
use lifeledger_core::DeletePolicy;
use lifeledger_core::Document;
use lifeledger_core::EngineConfig;
use lifeledger_core::FieldDefinition;
use lifeledger_core::FieldKey;
use lifeledger_core::FieldType;
use lifeledger_core::LedgerError;
use lifeledger_core::RecordId;
use lifeledger_core::RelationSelection;
use lifeledger_core::Timestamp;
use lifeledger_store_sqlite::SqliteLedgerStore;
use lifeledger_store_sqlite::SqliteStoreConfig;
use lifeledger_store_sqlite::SqliteStoreError;
use lifeledger_store_sqlite::SqliteStoreMode;
use lifeledger_store_sqlite::SqliteSyncMode;
use proptest::prelude::*;
use rusqlite::Connection;
use rusqlite::params;
use serde_json::Value;
use serde_json::json;
use tempfile::TempDir;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Temporary on-disk store.
struct SqliteFixture {
    /// Keeps the directory alive for the test.
    _dir: TempDir,
    /// Database file path.
    path: PathBuf,
    /// Open store.
    store: SqliteLedgerStore,
}

impl SqliteFixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("ledger.sqlite");
        let store = SqliteLedgerStore::new(&config_for_path(path.clone())).unwrap();
        Self {
            _dir: dir,
            path,
            store,
        }
    }

    fn engine(&self) -> DataEngine<SqliteLedgerStore> {
        DataEngine::new(self.store.clone())
    }

    fn raw(&self) -> Connection {
        Connection::open(&self.path).unwrap()
    }
}

/// Clock that only moves when told to.
struct ManualClock(Cell<i64>);

impl Clock for &ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_unix_millis(self.0.get())
    }
}

const fn config_for_path(path: PathBuf) -> SqliteStoreConfig {
    SqliteStoreConfig {
        path,
        busy_timeout_ms: 1_000,
        journal_mode: SqliteStoreMode::Wal,
        sync_mode: SqliteSyncMode::Full,
    }
}

fn ds(id: &str) -> DatasetId {
    DatasetId::parse(id).unwrap()
}

fn key(value: &str) -> FieldKey {
    FieldKey::parse(value).unwrap()
}

fn doc(value: Value) -> Document {
    Document::from_value(value).unwrap()
}

fn definition(id: &str, fields: Vec<FieldDefinition>) -> DatasetDefinition {
    DatasetDefinition {
        id: ds(id),
        name: id.to_string(),
        description: String::new(),
        dataset_type: DatasetType::PeopleCrm,
        fields,
    }
}

fn people() -> DatasetDefinition {
    definition("people", vec![FieldDefinition::new(key("name"), FieldType::Text, "Name").unique()])
}

fn meetings(policy: DeletePolicy) -> DatasetDefinition {
    definition(
        "meetings",
        vec![
            FieldDefinition::new(key("title"), FieldType::Text, "Title"),
            FieldDefinition::new(key("person_id"), FieldType::Text, "Person")
                .relation_to(&ds("people"), "name")
                .with_delete_policy(policy),
        ],
    )
}

fn relation_indexes(connection: &Connection) -> Vec<String> {
    let mut stmt = connection
        .prepare(
            "SELECT name FROM sqlite_master WHERE type = 'index' AND name LIKE 'idx_rel_%' \
             ORDER BY name",
        )
        .unwrap();
    stmt.query_map([], |row| row.get::<_, String>(0))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

fn open_err(path: &Path) -> SqliteStoreError {
    let Err(err) = SqliteLedgerStore::new(&config_for_path(path.to_path_buf())) else {
        panic!("expected store open to fail for {}", path.display());
    };
    err
}

// ============================================================================
// SECTION: Path Validation
// ============================================================================

#[test]
fn sqlite_store_rejects_directory_path() {
    let temp = TempDir::new().unwrap();
    assert!(matches!(open_err(temp.path()), SqliteStoreError::Invalid(_)));
}

#[test]
fn sqlite_store_rejects_empty_path() {
    assert!(matches!(open_err(Path::new("")), SqliteStoreError::Invalid(_)));
}

#[test]
fn sqlite_store_rejects_overlong_component() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("a".repeat(300));
    assert!(matches!(open_err(&path), SqliteStoreError::Invalid(_)));
}

// ============================================================================
// SECTION: Schema Versioning
// ============================================================================

#[test]
fn sqlite_store_rejects_unknown_schema_version() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("ledger.sqlite");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("CREATE TABLE store_meta (version INTEGER NOT NULL);").unwrap();
    conn.execute("INSERT INTO store_meta (version) VALUES (?1)", params![999_i64]).unwrap();
    drop(conn);

    assert!(matches!(open_err(&path), SqliteStoreError::VersionMismatch(_)));
}

#[test]
fn sqlite_store_reopens_existing_database() {
    let fixture = SqliteFixture::new();
    let engine = fixture.engine();
    engine.create_dataset(people()).unwrap();
    let ada = engine
        .add_record(&ds("people"), doc(json!({"name": "Ada", "tags": ["math", "engines"]})))
        .unwrap();
    fixture.store.readiness().unwrap();
    drop(engine);

    let reopened = SqliteLedgerStore::new(&config_for_path(fixture.path.clone())).unwrap();
    let engine = DataEngine::new(reopened);
    assert_eq!(engine.get_dataset(&ds("people")).unwrap().definition, people());
    let loaded = engine.get_record(&ada.id).unwrap();
    assert_eq!(loaded, ada);
    let keys: Vec<&String> = loaded.data.keys().collect();
    assert_eq!(keys, ["name", "tags"]);
}

#[test]
fn corrupt_payload_surfaces_as_malformed() {
    let fixture = SqliteFixture::new();
    let engine = fixture.engine();
    engine.create_dataset(people()).unwrap();
    let ada = engine.add_record(&ds("people"), doc(json!({"name": "Ada"}))).unwrap();
    fixture
        .raw()
        .execute("UPDATE data_records SET data = 'not json' WHERE id = ?1", params![ada.id.as_str()])
        .unwrap();

    let err = engine.get_record(&ada.id).unwrap_err();
    assert!(matches!(err, LedgerError::MalformedPayload(_)), "got {err:?}");
}

// ============================================================================
// SECTION: Relation Indexes
// ============================================================================

#[test]
fn relation_indexes_follow_dataset_definitions() {
    let fixture = SqliteFixture::new();
    let engine = fixture.engine();
    engine.create_dataset(people()).unwrap();
    assert!(relation_indexes(&fixture.raw()).is_empty());

    engine.create_dataset(meetings(DeletePolicy::Prevent)).unwrap();
    assert_eq!(relation_indexes(&fixture.raw()), ["idx_rel_8_meetings_person_id"]);

    let mut host = meetings(DeletePolicy::None);
    host.fields.push(
        FieldDefinition::new(key("host-id"), FieldType::Text, "Host")
            .relation_to(&ds("people"), "name"),
    );
    engine.update_dataset(host).unwrap();
    assert_eq!(
        relation_indexes(&fixture.raw()),
        ["idx_rel_8_meetings_host-id", "idx_rel_8_meetings_person_id"]
    );

    let plain = definition(
        "meetings",
        vec![
            FieldDefinition::new(key("title"), FieldType::Text, "Title"),
            FieldDefinition::new(key("person_id"), FieldType::Text, "Person"),
        ],
    );
    engine.update_dataset(plain).unwrap();
    assert!(relation_indexes(&fixture.raw()).is_empty());

    engine.update_dataset(meetings(DeletePolicy::Cascade)).unwrap();
    engine.delete_dataset(&ds("meetings")).unwrap();
    assert!(relation_indexes(&fixture.raw()).is_empty());
}

// ============================================================================
// SECTION: Engine Semantics
// ============================================================================

#[test]
fn prevent_and_cascade_policies_hold_over_sqlite() {
    let fixture = SqliteFixture::new();
    let engine = fixture.engine();
    engine.create_dataset(people()).unwrap();
    engine.create_dataset(meetings(DeletePolicy::Prevent)).unwrap();
    let p1 = engine.add_record(&ds("people"), doc(json!({"name": "P1"}))).unwrap().id;
    let m1 = engine
        .add_record(&ds("meetings"), doc(json!({"title": "M1", "person_id": p1.as_str()})))
        .unwrap()
        .id;

    let err = engine.delete_record(&p1).unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Constraint(ConstraintViolation::Referenced { count: 1, .. })
    ));

    engine.update_dataset(meetings(DeletePolicy::Cascade)).unwrap();
    let deletion = engine.delete_record(&p1).unwrap();
    assert_eq!(deletion.cascaded.len(), 1);
    assert_eq!(deletion.cascaded[0].id, m1);
    assert!(engine.get_record(&m1).unwrap_err().is_not_found());
}

#[test]
fn unique_fields_and_relations_resolve_over_sqlite() {
    let fixture = SqliteFixture::new();
    let engine = fixture.engine();
    engine.create_dataset(people()).unwrap();
    engine.create_dataset(meetings(DeletePolicy::None)).unwrap();
    let ada = engine.add_record(&ds("people"), doc(json!({"name": "Ada"}))).unwrap();
    let err = engine.add_record(&ds("people"), doc(json!({"name": "Ada"}))).unwrap_err();
    assert!(err.is_constraint());

    let meeting = engine
        .add_record(&ds("meetings"), doc(json!({"person_id": ada.id.as_str()})))
        .unwrap();
    let resolved =
        engine.get_record_with_relations(&meeting.id, &RelationSelection::All).unwrap();
    assert_eq!(resolved.get("person_id_data").unwrap()["name"], "Ada");
}

#[test]
fn records_list_newest_first_with_insertion_tie_break() {
    let fixture = SqliteFixture::new();
    let clock = ManualClock(Cell::new(5_000));
    let engine = DataEngine::with_clock(fixture.store.clone(), &clock, EngineConfig::default());
    engine.create_dataset(people()).unwrap();
    let first = engine.add_record(&ds("people"), doc(json!({"name": "A"}))).unwrap().id;
    let second = engine.add_record(&ds("people"), doc(json!({"name": "B"}))).unwrap().id;
    clock.0.set(4_000);
    let older = engine.add_record(&ds("people"), doc(json!({"name": "C"}))).unwrap().id;

    let ids: Vec<RecordId> =
        engine.list_records(&ds("people")).unwrap().into_iter().map(|r| r.id).collect();
    assert_eq!(ids, [second, first, older]);
}

#[test]
fn failed_import_rolls_back_every_row() {
    let fixture = SqliteFixture::new();
    let engine = fixture.engine();
    engine.create_dataset(people()).unwrap();
    let err = engine
        .import_records(
            &ds("people"),
            vec![doc(json!({"name": "A"})), doc(json!({"name": "B"})), doc(json!({"name": "A"}))],
        )
        .unwrap_err();
    assert!(err.is_constraint());
    assert!(engine.list_records(&ds("people")).unwrap().is_empty());
    let count: i64 = fixture
        .raw()
        .query_row("SELECT COUNT(1) FROM data_records", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn in_memory_database_supports_the_engine() {
    let engine = DataEngine::new(SqliteLedgerStore::open_in_memory().unwrap());
    engine.create_dataset(people()).unwrap();
    engine.add_record(&ds("people"), doc(json!({"name": "Ada"}))).unwrap();
    assert_eq!(engine.list_records(&ds("people")).unwrap().len(), 1);
}

#[test]
fn dataset_delete_removes_every_record_row() {
    let fixture = SqliteFixture::new();
    let engine = fixture.engine();
    engine.create_dataset(people()).unwrap();
    engine.add_record(&ds("people"), doc(json!({"name": "Ada"}))).unwrap();
    engine.add_record(&ds("people"), doc(json!({"name": "Grace"}))).unwrap();

    let deletion = engine.delete_dataset(&ds("people")).unwrap();
    assert_eq!(deletion.records.len(), 2);
    let count: i64 = fixture
        .raw()
        .query_row("SELECT COUNT(1) FROM data_records", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn orphaned_rows_are_accepted_and_pruned() {
    let fixture = SqliteFixture::new();
    let engine = fixture.engine();
    engine.create_dataset(people()).unwrap();
    let ada = engine.add_record(&ds("people"), doc(json!({"name": "Ada"}))).unwrap();
    fixture
        .raw()
        .execute(
            "INSERT INTO data_records (id, dataset_id, data, created_at, last_modified) \
             VALUES ('orphan-record-0001', 'ghosts', '{}', 0, 0)",
            [],
        )
        .unwrap();

    let report = engine.prune_undeclared(&[people()]).unwrap();
    assert!(report.removed_datasets.is_empty());
    assert_eq!(report.orphaned_records, 1);
    let remaining: Vec<RecordId> =
        engine.list_records(&ds("people")).unwrap().into_iter().map(|record| record.id).collect();
    assert_eq!(remaining, [ada.id]);
}

// ============================================================================
// SECTION: Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn reference_lookups_work_for_any_slug(
        dataset in "[A-Za-z0-9_-]{1,24}",
        field in "[A-Za-z0-9_-]{1,24}",
    ) {
        let Ok(field) = FieldKey::parse(field) else {
            return Ok(());
        };
        let dataset = ds(&dataset);
        let engine = DataEngine::new(SqliteLedgerStore::open_in_memory().unwrap());
        engine
            .create_dataset(DatasetDefinition {
                id: dataset.clone(),
                name: "graph".to_string(),
                description: String::new(),
                dataset_type: DatasetType::Custom("graph".to_string()),
                fields: vec![
                    FieldDefinition::new(field.clone(), FieldType::Text, "Parent")
                        .relation_to(&dataset, "name")
                        .with_delete_policy(DeletePolicy::Prevent),
                ],
            })
            .unwrap();
        let root = engine.add_record(&dataset, Document::new()).unwrap().id;
        let mut child = Document::new();
        child.insert(field.as_str(), root.as_str());
        engine.add_record(&dataset, child).unwrap();

        prop_assert!(engine.delete_record(&root).unwrap_err().is_constraint());
    }
}
