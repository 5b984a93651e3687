// crates/lifeledger-core/src/runtime/duplicates.rs
// ============================================================================
// Module: Lifeledger Duplicate Import Detector
// Description: Full-field-match deduplication for bulk imports.
// Purpose: Report existing records that an import candidate would duplicate.
// Dependencies: crate::{core, interfaces}, serde
// ============================================================================

//! ## Overview
//! A candidate duplicates an existing record when every compared field is
//! present, non-null, and string-equal on both sides. Partial overlap never
//! matches and there is no fuzzy scoring: every reported result carries a
//! confidence of exactly `1.0`.
//!
//! When no fields are given, the compared set is inferred from the first
//! candidate's keys minus the reserved metadata keys. An empty compared set
//! yields no results.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;

use crate::core::DataRecord;
use crate::core::Document;
use crate::core::canonical_string;
use crate::core::is_reserved_key;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Confidence reported for every full-field match.
pub const EXACT_MATCH_CONFIDENCE: f64 = 1.0;

// ============================================================================
// SECTION: Results
// ============================================================================

/// Existing records matched by one import candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateResult {
    /// Candidate payload as supplied.
    pub import_record: Document,
    /// Existing records matching on every compared field.
    pub existing_records: Vec<DataRecord>,
    /// Fields that were compared.
    pub duplicate_fields: Vec<String>,
    /// Always [`EXACT_MATCH_CONFIDENCE`].
    pub confidence: f64,
}

// ============================================================================
// SECTION: Detection
// ============================================================================

/// Returns the compared field list, inferring it when `requested` is empty.
#[must_use]
pub fn effective_fields(candidates: &[Document], requested: &[String]) -> Vec<String> {
    if !requested.is_empty() {
        return requested.to_vec();
    }
    candidates
        .first()
        .map(|first| first.keys().filter(|key| !is_reserved_key(key)).cloned().collect())
        .unwrap_or_default()
}

/// Matches each candidate against `existing` on every field in `fields`.
#[must_use]
pub fn find_duplicates(
    existing: &[DataRecord],
    candidates: &[Document],
    fields: &[String],
) -> Vec<DuplicateResult> {
    if fields.is_empty() {
        return Vec::new();
    }
    candidates
        .iter()
        .filter_map(|candidate| {
            let matches: Vec<DataRecord> = existing
                .iter()
                .filter(|record| fields_match(candidate, &record.data, fields))
                .cloned()
                .collect();
            (!matches.is_empty()).then(|| DuplicateResult {
                import_record: candidate.clone(),
                existing_records: matches,
                duplicate_fields: fields.to_vec(),
                confidence: EXACT_MATCH_CONFIDENCE,
            })
        })
        .collect()
}

/// Returns true when every field is present and equal on both documents.
fn fields_match(candidate: &Document, existing: &Document, fields: &[String]) -> bool {
    fields.iter().all(|field| {
        let left = candidate.get_non_null(field).and_then(canonical_string);
        let right = existing.get_non_null(field).and_then(canonical_string);
        matches!((left, right), (Some(left), Some(right)) if left == right)
    })
}
