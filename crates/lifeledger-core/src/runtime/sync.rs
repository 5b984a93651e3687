// crates/lifeledger-core/src/runtime/sync.rs
// ============================================================================
// Module: Lifeledger Schema Synchronizer
// Description: Reconciles declared dataset definitions with the catalog.
// Purpose: Idempotent startup upsert of the declared dataset catalog.
// Dependencies: crate::{core, interfaces}, serde, tracing
// ============================================================================

//! ## Overview
//! The synchronizer walks a caller-supplied list of [`DatasetDefinition`]s.
//! Missing datasets are created with fresh timestamps. Existing datasets have
//! their stored field list replaced according to the [`SyncPolicy`]:
//! `overwrite` always rewrites and bumps `lastModified`, `diff_before_write`
//! only writes when the stored fields differ. Name, description, and type of
//! an existing dataset are left as stored.
//!
//! Re-running with unchanged input yields the same persisted catalog.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::core::Dataset;
use crate::core::DatasetDefinition;
use crate::core::DatasetId;
use crate::core::LedgerError;
use crate::core::Timestamp;
use crate::interfaces::StoreSession;
use crate::runtime::integrity::RecordDeleter;

// ============================================================================
// SECTION: Policy and Reports
// ============================================================================

/// How the synchronizer treats datasets that already exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPolicy {
    /// Always overwrite the stored field list.
    #[default]
    Overwrite,
    /// Overwrite only when the stored field list differs.
    DiffBeforeWrite,
}

/// Result of one upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// The dataset did not exist and was created.
    Created,
    /// The stored field list was rewritten.
    Updated,
    /// Nothing was written.
    Unchanged,
}

/// Summary of a synchronizer run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Datasets created.
    pub created: Vec<DatasetId>,
    /// Datasets whose fields were rewritten.
    pub updated: Vec<DatasetId>,
    /// Datasets left untouched.
    pub unchanged: Vec<DatasetId>,
}

/// Summary of an undeclared-dataset cleanup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PruneReport {
    /// Datasets removed because they were not declared.
    pub removed_datasets: Vec<DatasetId>,
    /// Records removed together with those datasets.
    pub removed_records: usize,
    /// Records removed because their dataset row no longer existed.
    pub orphaned_records: usize,
}

// ============================================================================
// SECTION: Synchronization
// ============================================================================

/// Creates or updates one dataset from its declared definition.
///
/// # Errors
///
/// Returns [`LedgerError::Validation`] for invalid definitions and
/// [`LedgerError::Storage`] on backend failures.
pub fn upsert_dataset_definition(
    session: &dyn StoreSession,
    definition: &DatasetDefinition,
    policy: SyncPolicy,
    now: Timestamp,
) -> Result<UpsertOutcome, LedgerError> {
    definition.validate()?;
    let Some(mut stored) = session.get_dataset(&definition.id)? else {
        session.insert_dataset(&Dataset {
            definition: definition.clone(),
            created_at: now,
            last_modified: now,
        })?;
        return Ok(UpsertOutcome::Created);
    };
    if policy == SyncPolicy::DiffBeforeWrite && stored.definition.fields == definition.fields {
        return Ok(UpsertOutcome::Unchanged);
    }
    stored.definition.fields.clone_from(&definition.fields);
    stored.last_modified = now;
    session.update_dataset(&stored)?;
    Ok(UpsertOutcome::Updated)
}

/// Applies [`upsert_dataset_definition`] to every declared definition.
///
/// Every definition is validated before anything is written.
///
/// # Errors
///
/// Returns the first validation or storage error encountered.
pub fn synchronize(
    session: &dyn StoreSession,
    definitions: &[DatasetDefinition],
    policy: SyncPolicy,
    now: Timestamp,
) -> Result<SyncReport, LedgerError> {
    let mut seen = BTreeSet::new();
    for definition in definitions {
        definition.validate()?;
        if !seen.insert(&definition.id) {
            return Err(LedgerError::Validation(format!(
                "dataset {} is declared more than once",
                definition.id
            )));
        }
    }
    let mut report = SyncReport::default();
    for definition in definitions {
        let outcome = upsert_dataset_definition(session, definition, policy, now)?;
        debug!(dataset = %definition.id, outcome = ?outcome, "dataset synchronized");
        let bucket = match outcome {
            UpsertOutcome::Created => &mut report.created,
            UpsertOutcome::Updated => &mut report.updated,
            UpsertOutcome::Unchanged => &mut report.unchanged,
        };
        bucket.push(definition.id.clone());
    }
    Ok(report)
}

/// Deletes datasets that are not declared, then orphaned records.
///
/// Each dataset goes through the integrity-checked dataset delete, so a
/// prevent-delete relation from a declared dataset aborts the whole cleanup.
///
/// # Errors
///
/// Returns [`LedgerError::Constraint`] when a deletion is blocked and
/// [`LedgerError::Storage`] on backend failures.
pub fn prune_undeclared(
    session: &dyn StoreSession,
    declared: &[DatasetDefinition],
) -> Result<PruneReport, LedgerError> {
    let declared: BTreeSet<&DatasetId> = declared.iter().map(|definition| &definition.id).collect();
    let undeclared: Vec<DatasetId> = session
        .list_datasets()?
        .into_iter()
        .map(|dataset| dataset.definition.id)
        .filter(|id| !declared.contains(id))
        .collect();
    let mut deleter = RecordDeleter::new(session)?;
    for id in &undeclared {
        deleter.delete_dataset(id)?;
    }
    let removed_records = deleter.into_deleted().len();
    let orphaned_records = session.remove_orphaned_records()?;
    Ok(PruneReport {
        removed_datasets: undeclared,
        removed_records,
        orphaned_records,
    })
}
