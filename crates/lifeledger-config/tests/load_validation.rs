//! Config load validation tests for lifeledger-config.
// crates/lifeledger-config/tests/load_validation.rs
// =============================================================================
// Module: Config Load Validation Tests
// Description: Validate file limits, parsing, and cross-field rules.
// Purpose: Ensure configuration loading fails closed on bad input.
// =============================================================================

#![allow(clippy::use_debug, reason = "Failure messages include debug output.")]

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use lifeledger_config::ConfigError;
use lifeledger_config::LedgerConfig;
use lifeledger_config::LogFormat;
use lifeledger_config::MAX_CONFIG_FILE_SIZE;
use lifeledger_config::StoreType;
use lifeledger_core::DeletePolicy;
use lifeledger_core::FieldType;
use lifeledger_core::SyncPolicy;
use tempfile::TempDir;

type TestResult = Result<(), String>;

// ============================================================================
// SECTION: Helpers
// ============================================================================

const FULL_CONFIG: &str = r#"
[store]
type = "sqlite"
path = "data/lifeledger.db"
journal_mode = "delete"
sync_mode = "normal"

[sync]
policy = "diff_before_write"
prune_undeclared = true

[logging]
level = "lifeledger_core=debug,info"
format = "json"

[[datasets]]
id = "people"
name = "People"
type = "people_crm"

[[datasets.fields]]
key = "name"
type = "text"
displayName = "Name"
isUnique = true

[[datasets]]
id = "meetings"
name = "Meetings"
description = "Meetings with people"
type = "people_crm"

[[datasets.fields]]
key = "person_id"
type = "text"
displayName = "Person"
isRelation = true
relatedDataset = "people"
relatedField = "name"
cascadeDeleteIfReferenced = true
"#;

fn write_config(dir: &TempDir, content: &[u8]) -> Result<PathBuf, String> {
    let path = dir.path().join("lifeledger.toml");
    fs::write(&path, content).map_err(|err| err.to_string())?;
    Ok(path)
}

fn assert_invalid(result: Result<LedgerConfig, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config".to_string()),
    }
}

fn with_store(body: &str) -> String {
    format!("[store]\npath = \"ledger.db\"\n{body}")
}

// ============================================================================
// SECTION: Loading
// ============================================================================

#[test]
fn full_config_loads_from_explicit_path() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let path = write_config(&dir, FULL_CONFIG.as_bytes())?;
    let config = LedgerConfig::load(Some(&path)).map_err(|err| err.to_string())?;

    if config.store.store_type != StoreType::Sqlite {
        return Err("expected sqlite store".to_string());
    }
    let sqlite = config.store.sqlite().ok_or("missing sqlite settings")?;
    if sqlite.path != Path::new("data/lifeledger.db") || sqlite.busy_timeout_ms != 5_000 {
        return Err(format!("unexpected sqlite settings: {sqlite:?}"));
    }
    if config.sync.policy != SyncPolicy::DiffBeforeWrite || !config.sync.prune_undeclared {
        return Err(format!("unexpected sync settings: {:?}", config.sync));
    }
    if config.logging.format != LogFormat::Json {
        return Err("expected json logging".to_string());
    }
    let meetings = config.datasets.get(1).ok_or("missing meetings dataset")?;
    let person = meetings.fields.first().ok_or("missing person field")?;
    if person.field_type != FieldType::Text || person.delete_policy() != DeletePolicy::Cascade {
        return Err(format!("unexpected relation field: {person:?}"));
    }
    if person.relation().map(|target| target.dataset.to_string()) != Some("people".to_string()) {
        return Err("relation target not parsed".to_string());
    }
    Ok(())
}

#[test]
fn missing_file_is_io_error() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let path = dir.path().join("absent.toml");
    match LedgerConfig::load(Some(&path)) {
        Err(ConfigError::Io(_)) => Ok(()),
        other => Err(format!("expected io error, got {other:?}")),
    }
}

#[test]
fn oversized_file_is_rejected() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let mut content = with_store("").into_bytes();
    content.resize(MAX_CONFIG_FILE_SIZE + 1, b'\n');
    let path = write_config(&dir, &content)?;
    assert_invalid(LedgerConfig::load(Some(&path)), "exceeds size limit")
}

#[test]
fn non_utf8_file_is_rejected() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let path = write_config(&dir, &[0xff, 0xfe, 0x00])?;
    assert_invalid(LedgerConfig::load(Some(&path)), "utf-8")
}

#[test]
fn malformed_toml_is_parse_error() -> TestResult {
    match LedgerConfig::from_toml("[store\npath = ") {
        Err(ConfigError::Parse(_)) => Ok(()),
        other => Err(format!("expected parse error, got {other:?}")),
    }
}

#[test]
fn unknown_sections_are_rejected() -> TestResult {
    match LedgerConfig::from_toml(&with_store("[server]\nport = 1\n")) {
        Err(ConfigError::Parse(_)) => Ok(()),
        other => Err(format!("expected parse error, got {other:?}")),
    }
}

// ============================================================================
// SECTION: Store Rules
// ============================================================================

#[test]
fn sqlite_store_requires_path() -> TestResult {
    assert_invalid(LedgerConfig::from_toml(""), "sqlite store requires path")
}

#[test]
fn memory_store_rejects_path() -> TestResult {
    assert_invalid(
        LedgerConfig::from_toml("[store]\ntype = \"memory\"\npath = \"ledger.db\"\n"),
        "memory store must not set path",
    )
}

#[test]
fn memory_store_needs_no_path() -> TestResult {
    let config = LedgerConfig::from_toml("[store]\ntype = \"memory\"\n")
        .map_err(|err| err.to_string())?;
    if config.store.sqlite().is_some() {
        return Err("memory store must not produce sqlite settings".to_string());
    }
    Ok(())
}

// ============================================================================
// SECTION: Catalog and Logging Rules
// ============================================================================

#[test]
fn repeated_dataset_ids_are_rejected() -> TestResult {
    let body = "[[datasets]]\nid = \"todos\"\nname = \"Todos\"\ntype = \"todo\"\n\n\
                [[datasets]]\nid = \"todos\"\nname = \"Again\"\ntype = \"todo\"\n";
    assert_invalid(LedgerConfig::from_toml(&with_store(body)), "declared more than once")
}

#[test]
fn conflicting_delete_policies_are_rejected() -> TestResult {
    let body = "[[datasets]]\nid = \"notes\"\nname = \"Notes\"\ntype = \"journaling\"\n\n\
                [[datasets.fields]]\nkey = \"parent\"\ntype = \"text\"\nisRelation = true\n\
                relatedDataset = \"notes\"\nrelatedField = \"title\"\n\
                preventDeleteIfReferenced = true\ncascadeDeleteIfReferenced = true\n";
    assert_invalid(LedgerConfig::from_toml(&with_store(body)), "datasets.notes")
}

#[test]
fn invalid_dataset_id_is_rejected() -> TestResult {
    let body = "[[datasets]]\nid = \"bad id\"\nname = \"Bad\"\ntype = \"todo\"\n";
    match LedgerConfig::from_toml(&with_store(body)) {
        Err(ConfigError::Parse(_)) => Ok(()),
        other => Err(format!("expected parse error, got {other:?}")),
    }
}

#[test]
fn invalid_log_level_is_rejected() -> TestResult {
    assert_invalid(
        LedgerConfig::from_toml(&with_store("[logging]\nlevel = \"lifeledger=loud\"\n")),
        "logging.level",
    )
}
