// crates/lifeledger-core/src/runtime/resolver.rs
// ============================================================================
// Module: Lifeledger Relation Resolver
// Description: Embeds related records into read results.
// Purpose: Expand relation fields with a hard two-hop bound.
// Dependencies: crate::{core, interfaces}, tracing
// ============================================================================

//! ## Overview
//! For each selected relation field of a record, the field's value is read as
//! a [`Reference`] and the target record is embedded under `<key>_data`. The
//! raw id stays in place next to it. Values that are not well-formed record
//! ids, and references whose target is missing, are skipped with a warning.
//!
//! Expansion is bounded: the top-level record requests nested resolution, the
//! embedded target has its own relations resolved without nested resolution,
//! and nothing deeper is fetched. Cyclic relation graphs therefore terminate
//! after exactly two dataset hops.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use tracing::warn;

use crate::core::DataRecord;
use crate::core::Dataset;
use crate::core::DatasetId;
use crate::core::Document;
use crate::core::FieldKey;
use crate::core::LedgerError;
use crate::core::Reference;
use crate::interfaces::StoreSession;

// ============================================================================
// SECTION: Selection
// ============================================================================

/// Relation fields to resolve for top-level records.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RelationSelection {
    /// Every relation field of the dataset.
    #[default]
    All,
    /// Only the listed relation fields; other keys are ignored.
    Only(BTreeSet<FieldKey>),
}

impl RelationSelection {
    /// Builds an explicit selection from field keys.
    #[must_use]
    pub fn only(keys: impl IntoIterator<Item = FieldKey>) -> Self {
        Self::Only(keys.into_iter().collect())
    }

    /// Returns true when `key` is selected.
    #[must_use]
    pub fn includes(&self, key: &FieldKey) -> bool {
        match self {
            Self::All => true,
            Self::Only(keys) => keys.contains(key),
        }
    }
}

// ============================================================================
// SECTION: Resolver
// ============================================================================

/// Relation resolver bound to one read session.
pub struct RelationResolver<'a> {
    /// Read session.
    session: &'a dyn StoreSession,
    /// Datasets loaded so far.
    datasets: BTreeMap<DatasetId, Option<Dataset>>,
}

impl<'a> RelationResolver<'a> {
    /// Creates a resolver over `session`.
    #[must_use]
    pub fn new(session: &'a dyn StoreSession) -> Self {
        Self {
            session,
            datasets: BTreeMap::new(),
        }
    }

    /// Resolves the selected relation fields of `record` two hops deep.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] when the store fails or a payload is corrupt.
    pub fn resolve(
        &mut self,
        record: &DataRecord,
        selection: &RelationSelection,
    ) -> Result<Document, LedgerError> {
        self.resolve_with_depth(record, selection, true)
    }

    /// Resolves relations, requesting nested expansion when `expand_nested`.
    fn resolve_with_depth(
        &mut self,
        record: &DataRecord,
        selection: &RelationSelection,
        expand_nested: bool,
    ) -> Result<Document, LedgerError> {
        let mut flat = record.to_flat_document();
        let Some(dataset) = self.dataset(&record.dataset_id)? else {
            return Ok(flat);
        };
        for (field, target) in dataset.definition.relation_fields() {
            if !selection.includes(&field.key) {
                continue;
            }
            let raw = record.data.get(field.key.as_str());
            let reference = match Reference::from_value(&target.dataset, raw) {
                Ok(Some(reference)) => reference,
                Ok(None) => continue,
                Err(err) => {
                    warn!(
                        record = %record.id,
                        field = %field.key,
                        error = %err,
                        "skipping malformed relation id"
                    );
                    continue;
                }
            };
            let Some(related) = self.fetch(&reference)? else {
                warn!(
                    record = %record.id,
                    field = %field.key,
                    target = %reference.record_id,
                    "related record not found"
                );
                continue;
            };
            let embedded = if expand_nested {
                self.resolve_with_depth(&related, &RelationSelection::All, false)?.into_value()
            } else {
                related.to_flat_value()
            };
            flat.insert(field.key.embedded_key(), embedded);
        }
        Ok(flat)
    }

    /// Loads the referenced record when it lives in the expected dataset.
    fn fetch(&self, reference: &Reference) -> Result<Option<DataRecord>, LedgerError> {
        let record = self.session.get_record(&reference.record_id)?;
        Ok(record.filter(|record| record.dataset_id == reference.dataset_id))
    }

    /// Loads a dataset once per resolver.
    fn dataset(&mut self, id: &DatasetId) -> Result<Option<Dataset>, LedgerError> {
        if let Some(cached) = self.datasets.get(id) {
            return Ok(cached.clone());
        }
        let loaded = self.session.get_dataset(id)?;
        self.datasets.insert(id.clone(), loaded.clone());
        Ok(loaded)
    }
}
