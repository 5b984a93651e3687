// crates/lifeledger-core/src/core/mod.rs
// ============================================================================
// Module: Lifeledger Core Types
// Description: Canonical dataset, record, and document structures.
// Purpose: Provide stable, serializable types shared by every storage backend.
// Dependencies: serde, serde_json, thiserror, time, uuid
// ============================================================================

//! ## Overview
//! Core types describe datasets, their field definitions, and the records
//! they own. They are the canonical wire shapes for any bridge that exposes
//! the engine across a process boundary.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod document;
pub mod error;
pub mod identifiers;
pub mod record;
pub mod schema;
pub mod time;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use document::Document;
pub use document::canonical_string;
pub use error::ConstraintViolation;
pub use error::LedgerError;
pub use error::NotFound;
pub use identifiers::DatasetId;
pub use identifiers::FieldKey;
pub use identifiers::IdentifierError;
pub use identifiers::RESERVED_METADATA_KEYS;
pub use identifiers::RecordId;
pub use identifiers::is_reserved_key;
pub use record::DataRecord;
pub use schema::Dataset;
pub use schema::DatasetDefinition;
pub use schema::DatasetType;
pub use schema::DeletePolicy;
pub use schema::FieldDefinition;
pub use schema::FieldType;
pub use schema::Reference;
pub use schema::RelationTarget;
pub use schema::SchemaError;
pub use schema::SelectOption;
pub use time::Timestamp;
