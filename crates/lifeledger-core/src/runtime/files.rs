// crates/lifeledger-core/src/runtime/files.rs
// ============================================================================
// Module: Lifeledger File References
// Description: Blob paths embedded in record payloads.
// Purpose: Find and remove blobs owned by deleted records.
// Dependencies: crate::{core, interfaces}, tracing
// ============================================================================

//! ## Overview
//! Fields typed `file`, `file-multiple`, `image`, or `image-multiple` hold
//! logical blob store paths, either as one string or as an array of strings.
//! Cleanup runs after the deleting transaction commits; a blob that is
//! already gone is not a failure.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use tracing::debug;
use tracing::warn;

use crate::core::DatasetDefinition;
use crate::core::Document;
use crate::interfaces::BlobError;
use crate::interfaces::BlobStore;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Outcome of deleting blobs referenced by deleted records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileCleanup {
    /// Paths deleted from the blob store.
    pub removed: Vec<String>,
    /// Paths that could not be deleted.
    pub failed: Vec<String>,
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the blob paths referenced by file-typed fields of `data`.
#[must_use]
pub fn file_paths(definition: &DatasetDefinition, data: &Document) -> Vec<String> {
    let mut paths = Vec::new();
    for field in definition.fields.iter().filter(|field| field.field_type.holds_files()) {
        match data.get(field.key.as_str()) {
            Some(Value::String(path)) if !path.is_empty() => paths.push(path.clone()),
            Some(Value::Array(items)) => paths.extend(
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .filter(|path| !path.is_empty())
                    .map(str::to_string),
            ),
            _ => {}
        }
    }
    paths
}

/// Deletes every path from the blob store, collecting the outcome.
pub fn remove_files(blobs: &dyn BlobStore, paths: Vec<String>) -> FileCleanup {
    let mut cleanup = FileCleanup::default();
    for path in paths {
        match blobs.delete(&path) {
            Ok(()) => cleanup.removed.push(path),
            Err(BlobError::Missing(_)) => debug!(path = %path, "blob already absent"),
            Err(err) => {
                warn!(path = %path, error = %err, "failed to delete blob");
                cleanup.failed.push(path);
            }
        }
    }
    cleanup
}
