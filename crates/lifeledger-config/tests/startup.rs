//! Engine startup tests for lifeledger-config.
// crates/lifeledger-config/tests/startup.rs
// =============================================================================
// Module: Engine Startup Tests
// Description: Open configured backends and reconcile the declared catalog.
// Purpose: Ensure startup reports catalog changes and honors pruning.
// =============================================================================

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions are permitted."
)]

use std::path::Path;

use lifeledger_config::LedgerConfig;
use lifeledger_config::LedgerStore;
use lifeledger_config::LoggingConfig;
use lifeledger_config::install_logging;
use lifeledger_config::open_engine;
use lifeledger_core::DatasetId;
use lifeledger_core::Document;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

const PEOPLE: &str = r#"
[[datasets]]
id = "people"
name = "People"
type = "people_crm"

[[datasets.fields]]
key = "name"
type = "text"
displayName = "Name"
isUnique = true
"#;

const MEETINGS: &str = r#"
[[datasets]]
id = "meetings"
name = "Meetings"
type = "people_crm"

[[datasets.fields]]
key = "person_id"
type = "text"
displayName = "Person"
isRelation = true
relatedDataset = "people"
relatedField = "name"
"#;

fn sqlite_config(path: &Path, prune: bool, datasets: &[&str]) -> LedgerConfig {
    let mut text = format!(
        "[store]\ntype = \"sqlite\"\npath = '{}'\n\n[sync]\nprune_undeclared = {prune}\n",
        path.display()
    );
    for dataset in datasets {
        text.push_str(dataset);
    }
    LedgerConfig::from_toml(&text).expect("config")
}

fn id(value: &str) -> DatasetId {
    DatasetId::parse(value).expect("dataset id")
}

// ============================================================================
// SECTION: Startup
// ============================================================================

#[test]
fn sqlite_startup_creates_then_reports_unchanged_catalog() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("data").join("ledger.sqlite");
    let config = sqlite_config(&path, false, &[PEOPLE, MEETINGS]);

    let first = open_engine(&config).expect("first startup");
    assert!(matches!(first.engine.store(), LedgerStore::Sqlite(_)));
    assert_eq!(first.sync.created, vec![id("people"), id("meetings")]);
    assert!(first.prune.is_none());
    drop(first);

    let second = open_engine(&config).expect("second startup");
    assert!(second.sync.created.is_empty());
    assert_eq!(second.engine.list_datasets().expect("datasets").len(), 2);
}

#[test]
fn prune_removes_dataset_dropped_from_config() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("ledger.sqlite");

    let initial = open_engine(&sqlite_config(&path, false, &[PEOPLE, MEETINGS])).expect("startup");
    let person = initial
        .engine
        .add_record(&id("people"), Document::parse_json(r#"{"name":"Ada"}"#).expect("doc"))
        .expect("person");
    let meeting = format!(r#"{{"person_id":"{}"}}"#, person.id);
    initial
        .engine
        .add_record(&id("meetings"), Document::parse_json(&meeting).expect("doc"))
        .expect("meeting");
    drop(initial);

    let pruned = open_engine(&sqlite_config(&path, true, &[PEOPLE])).expect("pruned startup");
    let report = pruned.prune.expect("prune report");
    assert_eq!(report.removed_datasets, vec![id("meetings")]);
    assert_eq!(report.removed_records, 1);
    assert_eq!(report.orphaned_records, 0);
    assert_eq!(pruned.engine.list_records(&id("people")).expect("people").len(), 1);
    assert!(pruned.engine.get_dataset(&id("meetings")).is_err());
}

#[test]
fn memory_startup_needs_no_files() {
    let config = LedgerConfig::from_toml(&format!("[store]\ntype = \"memory\"\n{PEOPLE}"))
        .expect("config");
    let startup = open_engine(&config).expect("startup");
    assert!(matches!(startup.engine.store(), LedgerStore::Memory(_)));
    assert_eq!(startup.sync.created, vec![id("people")]);
}

#[test]
fn default_config_is_rejected_at_startup() {
    assert!(open_engine(&LedgerConfig::default()).is_err());
}

// ============================================================================
// SECTION: Logging
// ============================================================================

#[test]
fn second_logging_install_keeps_existing_subscriber() {
    let config = LoggingConfig::default();
    install_logging(&config).expect("first install");
    assert!(!install_logging(&config).expect("second install"));
}
