// crates/lifeledger-core/src/runtime/uniqueness.rs
// ============================================================================
// Module: Lifeledger Uniqueness Validator
// Description: Per-field value uniqueness within a dataset.
// Purpose: Reject writes whose unique field values are already in use.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Before a record is inserted or replaced, every field flagged `isUnique` on
//! the owning dataset is checked. The record's value is normalized with
//! [`canonical_string`]; absent and null values are skipped. Any other record
//! in the dataset holding the same normalized value rejects the write with
//! [`ConstraintViolation::UniqueValue`].
//!
//! The scan is linear in the dataset's size. It runs inside the caller's write
//! session, so the check and the guarded write observe the same snapshot.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::ConstraintViolation;
use crate::core::DataRecord;
use crate::core::Dataset;
use crate::core::Document;
use crate::core::LedgerError;
use crate::core::RecordId;
use crate::core::canonical_string;
use crate::interfaces::StoreSession;

// ============================================================================
// SECTION: Validation
// ============================================================================

/// Checks every unique field of `dataset` against the existing records.
///
/// `record_id` is the id the payload is written under; that record is ignored
/// so an update never conflicts with its own previous value.
///
/// # Errors
///
/// Returns [`LedgerError::Constraint`] on the first conflicting field and
/// [`LedgerError::Storage`] when existing records cannot be listed.
pub fn check_unique_fields(
    session: &dyn StoreSession,
    dataset: &Dataset,
    record_id: &RecordId,
    data: &Document,
) -> Result<(), LedgerError> {
    let candidates: Vec<(&str, &str, String)> = dataset
        .definition
        .unique_fields()
        .filter_map(|field| {
            let value = data.get_non_null(field.key.as_str()).and_then(canonical_string)?;
            Some((field.key.as_str(), field.label(), value))
        })
        .collect();
    if candidates.is_empty() {
        return Ok(());
    }
    let existing = session.list_records(dataset.id())?;
    for (key, label, value) in candidates {
        let conflict = existing
            .iter()
            .filter(|record| &record.id != record_id)
            .any(|record| holds_value(record, key, &value));
        if conflict {
            return Err(ConstraintViolation::UniqueValue {
                dataset: dataset.id().clone(),
                field: label.to_string(),
                value,
            }
            .into());
        }
    }
    Ok(())
}

/// Returns true when the record's normalized value for `key` equals `value`.
fn holds_value(record: &DataRecord, key: &str, value: &str) -> bool {
    record.data.get_non_null(key).and_then(canonical_string).is_some_and(|existing| existing == value)
}
