// crates/lifeledger-core/src/runtime/integrity.rs
// ============================================================================
// Module: Lifeledger Referential Integrity
// Description: Prevent-delete and cascade-delete enforcement.
// Purpose: Delete records and datasets without leaving forbidden orphans.
// Dependencies: crate::{core, interfaces}, tracing
// ============================================================================

//! ## Overview
//! Relation fields pointing at a dataset may carry one of two delete
//! policies. Deleting a record `R` runs in three steps:
//!
//! 1. Every record referencing `R` through a cascade field is deleted first,
//!    each through this same algorithm.
//! 2. Prevent fields are checked; any remaining reference aborts the delete.
//! 3. `R`'s row is removed.
//!
//! A [`RecordDeleter`] tracks the records already being deleted by the current
//! operation. Those records are neither revisited by a cascade nor counted as
//! blocking references, which keeps cyclic relation graphs finite. All steps
//! run inside the caller's write session; an error rolls back everything.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use tracing::debug;

use crate::core::ConstraintViolation;
use crate::core::DataRecord;
use crate::core::Dataset;
use crate::core::DatasetId;
use crate::core::DeletePolicy;
use crate::core::FieldDefinition;
use crate::core::LedgerError;
use crate::core::NotFound;
use crate::core::RecordId;
use crate::interfaces::StoreSession;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Relation field of some dataset that points at the dataset being deleted from.
struct InboundRelation<'a> {
    /// Dataset declaring the field.
    dataset: &'a DatasetId,
    /// Field definition.
    field: &'a FieldDefinition,
    /// Effective delete policy.
    policy: DeletePolicy,
}

/// Integrity-checked deleter bound to one write session.
pub struct RecordDeleter<'a> {
    /// Write session.
    session: &'a dyn StoreSession,
    /// Catalog snapshot used to find inbound relations.
    datasets: Vec<Dataset>,
    /// Records already being deleted by this operation.
    visiting: BTreeSet<RecordId>,
    /// Records removed so far, in deletion order.
    deleted: Vec<DataRecord>,
}

impl<'a> RecordDeleter<'a> {
    /// Creates a deleter over the session's current catalog.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Storage`] when the catalog cannot be listed.
    pub fn new(session: &'a dyn StoreSession) -> Result<Self, LedgerError> {
        let datasets = session.list_datasets()?;
        Ok(Self {
            session,
            datasets,
            visiting: BTreeSet::new(),
            deleted: Vec::new(),
        })
    }

    /// Deletes a record after applying cascade and prevent policies.
    ///
    /// # Errors
    ///
    /// Returns [`ConstraintViolation::Referenced`] when a prevent-delete
    /// relation still references the record (or any cascaded record), and
    /// [`LedgerError::Storage`] on backend failures.
    pub fn delete_record(&mut self, record: DataRecord) -> Result<(), LedgerError> {
        self.visiting.insert(record.id.clone());
        let cascades = self.inbound(&record.dataset_id, DeletePolicy::Cascade);
        for (dataset, field) in cascades {
            let referencing =
                self.session.referencing_record_ids(&dataset, &field.key, &record.id)?;
            for id in referencing {
                if self.visiting.contains(&id) {
                    continue;
                }
                let Some(referrer) = self.session.get_record(&id)? else {
                    continue;
                };
                debug!(
                    record = %record.id,
                    referrer = %referrer.id,
                    dataset = %dataset,
                    field = %field.key,
                    "cascading delete"
                );
                self.delete_record(referrer)?;
            }
        }
        self.ensure_unreferenced(&record)?;
        self.session.remove_record(&record.id)?;
        debug!(record = %record.id, dataset = %record.dataset_id, "record deleted");
        self.deleted.push(record);
        Ok(())
    }

    /// Deletes a dataset, all of its records, and its catalog row.
    ///
    /// Records of the dataset do not block one another, and cascades back into
    /// the dataset are absorbed by the dataset-wide delete.
    ///
    /// # Errors
    ///
    /// Returns [`NotFound::Dataset`] when no such dataset exists, plus every
    /// error [`RecordDeleter::delete_record`] can return.
    pub fn delete_dataset(&mut self, id: &DatasetId) -> Result<Dataset, LedgerError> {
        let dataset = self
            .datasets
            .iter()
            .find(|dataset| dataset.id() == id)
            .cloned()
            .ok_or_else(|| NotFound::Dataset(id.clone()))?;
        let records = self.session.list_records(id)?;
        self.visiting.extend(records.iter().map(|record| record.id.clone()));
        for record in records {
            // A cascade from another dataset may already have removed it.
            let Some(current) = self.session.get_record(&record.id)? else {
                continue;
            };
            self.delete_record(current)?;
        }
        self.session.remove_dataset(id)?;
        Ok(dataset)
    }

    /// Returns the records removed so far, in deletion order.
    #[must_use]
    pub fn into_deleted(self) -> Vec<DataRecord> {
        self.deleted
    }

    /// Fails when a prevent-delete relation still references `record`.
    fn ensure_unreferenced(&self, record: &DataRecord) -> Result<(), LedgerError> {
        for (dataset, field) in self.inbound(&record.dataset_id, DeletePolicy::Prevent) {
            let count = self
                .session
                .referencing_record_ids(&dataset, &field.key, &record.id)?
                .into_iter()
                .filter(|id| !self.visiting.contains(id))
                .count();
            if count > 0 {
                return Err(ConstraintViolation::Referenced {
                    record: record.id.clone(),
                    referencing_dataset: dataset,
                    field: field.label().to_string(),
                    count,
                }
                .into());
            }
        }
        Ok(())
    }

    /// Lists relation fields targeting `target` with the given policy.
    fn inbound(
        &self,
        target: &DatasetId,
        policy: DeletePolicy,
    ) -> Vec<(DatasetId, FieldDefinition)> {
        inbound_relations(&self.datasets, target)
            .filter(|relation| relation.policy == policy)
            .map(|relation| (relation.dataset.clone(), relation.field.clone()))
            .collect()
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Iterates every relation field in `datasets` that points at `target`.
fn inbound_relations<'d>(
    datasets: &'d [Dataset],
    target: &'d DatasetId,
) -> impl Iterator<Item = InboundRelation<'d>> {
    datasets.iter().flat_map(move |dataset| {
        dataset.definition.fields.iter().filter(move |field| field.relates_to(target)).map(
            move |field| InboundRelation {
                dataset: dataset.id(),
                field,
                policy: field.delete_policy(),
            },
        )
    })
}
