// crates/lifeledger-core/src/runtime/mod.rs
// ============================================================================
// Module: Lifeledger Runtime
// Description: Relational semantics layered over schema-less records.
// Purpose: Enforce uniqueness and integrity, resolve relations, detect
//          duplicates, and synchronize the dataset catalog.
// Dependencies: crate::{core, interfaces}, tracing
// ============================================================================

//! ## Overview
//! Runtime modules implement every guarantee the storage engine does not
//! give natively. They operate on [`crate::interfaces::StoreSession`]s, so the
//! same logic runs against any backend. [`DataEngine`] is the canonical entry
//! point and owns transaction scoping.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod duplicates;
pub mod engine;
pub mod files;
pub mod integrity;
pub mod resolver;
pub mod store;
pub mod sync;
pub mod uniqueness;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use duplicates::DuplicateResult;
pub use duplicates::EXACT_MATCH_CONFIDENCE;
pub use engine::DataEngine;
pub use engine::DatasetDeletion;
pub use engine::EngineConfig;
pub use engine::RecordDeletion;
pub use engine::payload_from_json;
pub use engine::payload_from_value;
pub use files::FileCleanup;
pub use integrity::RecordDeleter;
pub use resolver::RelationResolver;
pub use resolver::RelationSelection;
pub use store::InMemoryBlobStore;
pub use store::InMemoryLedgerStore;
pub use sync::PruneReport;
pub use sync::SyncPolicy;
pub use sync::SyncReport;
pub use sync::UpsertOutcome;
