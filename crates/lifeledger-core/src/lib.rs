// crates/lifeledger-core/src/lib.rs
// ============================================================================
// Module: Lifeledger Core Library
// Description: Public API surface for the Lifeledger data engine.
// Purpose: Expose core types, storage interfaces, and runtime components.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Lifeledger stores heterogeneous personal records as opaque JSON payloads
//! grouped into declared datasets, and layers relational semantics on top:
//! relation fields, prevent/cascade delete policies, unique fields, relation
//! expansion, and duplicate detection for imports. The core is
//! backend-agnostic and reaches persistence only through the interfaces in
//! [`interfaces`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::*;

pub use interfaces::BlobError;
pub use interfaces::BlobStore;
pub use interfaces::Clock;
pub use interfaces::DatasetCatalog;
pub use interfaces::RecordStore;
pub use interfaces::StoreError;
pub use interfaces::StoreSession;
pub use interfaces::SystemClock;
pub use interfaces::TransactionalStore;
pub use runtime::DataEngine;
pub use runtime::DatasetDeletion;
pub use runtime::DuplicateResult;
pub use runtime::EngineConfig;
pub use runtime::FileCleanup;
pub use runtime::InMemoryBlobStore;
pub use runtime::InMemoryLedgerStore;
pub use runtime::PruneReport;
pub use runtime::RecordDeletion;
pub use runtime::RelationSelection;
pub use runtime::SyncPolicy;
pub use runtime::SyncReport;
