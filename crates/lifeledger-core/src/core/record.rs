// crates/lifeledger-core/src/core/record.rs
// ============================================================================
// Module: Lifeledger Records
// Description: Record envelopes around opaque payload documents.
// Purpose: Pair payloads with identity and managed timestamps.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`DataRecord`] is one instance of data owned by exactly one dataset. The
//! payload is an opaque [`Document`]; identity and timestamps live in the
//! envelope and are merged into the payload only when producing the flat
//! bridge-facing shape.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::document::Document;
use crate::core::identifiers::DatasetId;
use crate::core::identifiers::RecordId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Records
// ============================================================================

/// Stored record.
///
/// # Invariants
/// - `data` never contains the reserved metadata keys once persisted.
/// - `last_modified >= created_at` for records written through the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataRecord {
    /// Record identifier.
    pub id: RecordId,
    /// Owning dataset.
    pub dataset_id: DatasetId,
    /// Opaque payload.
    pub data: Document,
    /// Creation time.
    pub created_at: Timestamp,
    /// Last write time.
    pub last_modified: Timestamp,
}

impl DataRecord {
    /// Returns the payload merged with the envelope metadata keys.
    #[must_use]
    pub fn to_flat_document(&self) -> Document {
        let mut flat = self.data.clone();
        flat.insert("id", self.id.as_str());
        flat.insert("datasetId", self.dataset_id.as_str());
        flat.insert("createdAt", self.created_at.to_rfc3339());
        flat.insert("lastModified", self.last_modified.to_rfc3339());
        flat
    }

    /// Returns the flat document as a JSON value.
    #[must_use]
    pub fn to_flat_value(&self) -> Value {
        self.to_flat_document().into_value()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
