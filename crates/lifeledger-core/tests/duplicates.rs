// crates/lifeledger-core/tests/duplicates.rs
// ============================================================================
// Module: Duplicate Import Detector Tests
// Description: Full-field-match detection for import candidates.
// Purpose: Ensure matches require every compared field and never score partially.
// Dependencies: lifeledger-core, serde_json
// ============================================================================

//! ## Overview
//! Exercises explicit and inferred comparison fields against a small todo
//! dataset.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::float_cmp,
    reason = "Test-only assertions and helpers are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use lifeledger_core::DataEngine;
use lifeledger_core::DatasetDefinition;
use lifeledger_core::DatasetId;
use lifeledger_core::DatasetType;
use lifeledger_core::Document;
use lifeledger_core::FieldDefinition;
use lifeledger_core::FieldKey;
use lifeledger_core::FieldType;
use lifeledger_core::InMemoryLedgerStore;
use lifeledger_core::runtime::EXACT_MATCH_CONFIDENCE;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

fn todos() -> DatasetId {
    DatasetId::parse("todos").unwrap()
}

fn doc(value: Value) -> Document {
    Document::from_value(value).unwrap()
}

fn fields(keys: &[&str]) -> Vec<String> {
    keys.iter().map(ToString::to_string).collect()
}

fn engine_with_milk() -> DataEngine<InMemoryLedgerStore> {
    let engine = DataEngine::new(InMemoryLedgerStore::new());
    let field = |key: &str, field_type| {
        FieldDefinition::new(FieldKey::parse(key).unwrap(), field_type, key)
    };
    engine
        .create_dataset(DatasetDefinition {
            id: todos(),
            name: "Todos".to_string(),
            description: String::new(),
            dataset_type: DatasetType::Todo,
            fields: vec![
                field("title", FieldType::Text),
                field("deadline", FieldType::Date),
                field("done", FieldType::Boolean),
            ],
        })
        .unwrap();
    engine
        .add_record(
            &todos(),
            doc(json!({"title": "Buy milk", "deadline": "2024-01-01", "done": false})),
        )
        .unwrap();
    engine
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn full_match_on_requested_fields_is_reported_once() {
    let engine = engine_with_milk();
    let candidate = doc(json!({"title": "Buy milk", "deadline": "2024-01-01", "done": true}));
    let requested = fields(&["title", "deadline"]);
    let results =
        engine.find_duplicates(&todos(), std::slice::from_ref(&candidate), &requested).unwrap();
    assert_eq!(results.len(), 1);
    let result = &results[0];
    assert_eq!(result.confidence, EXACT_MATCH_CONFIDENCE);
    assert_eq!(result.confidence, 1.0);
    assert_eq!(result.duplicate_fields, ["title", "deadline"]);
    assert_eq!(result.import_record, candidate);
    assert_eq!(result.existing_records.len(), 1);
}

#[test]
fn changing_any_compared_field_yields_no_results() {
    let engine = engine_with_milk();
    let requested = fields(&["title", "deadline"]);
    for candidate in [
        json!({"title": "Buy bread", "deadline": "2024-01-01"}),
        json!({"title": "Buy milk", "deadline": "2024-01-02"}),
        json!({"title": "Buy milk"}),
        json!({"title": "Buy milk", "deadline": null}),
    ] {
        let results = engine.find_duplicates(&todos(), &[doc(candidate)], &requested).unwrap();
        assert!(results.is_empty());
    }
}

#[test]
fn inferred_fields_come_from_the_first_candidate() {
    let engine = engine_with_milk();
    let first = doc(json!({
        "id": "ignored-metadata",
        "createdAt": "2024-01-01T00:00:00Z",
        "title": "Buy milk",
        "done": false
    }));
    let second = doc(json!({"title": "Buy milk", "done": true}));
    let results = engine.find_duplicates(&todos(), &[first, second], &[]).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].duplicate_fields, ["title", "done"]);
    assert_eq!(results[0].import_record.get("done"), Some(&json!(false)));
}

#[test]
fn metadata_only_candidates_never_match() {
    let engine = engine_with_milk();
    let results = engine
        .find_duplicates(&todos(), &[doc(json!({"id": "only-metadata"}))], &[])
        .unwrap();
    assert!(results.is_empty());
    assert!(engine.find_duplicates(&todos(), &[], &[]).unwrap().is_empty());
}

#[test]
fn unknown_dataset_is_not_found() {
    let engine = engine_with_milk();
    let err = engine
        .find_duplicates(&DatasetId::parse("missing").unwrap(), &[], &[])
        .unwrap_err();
    assert!(err.is_not_found());
}
