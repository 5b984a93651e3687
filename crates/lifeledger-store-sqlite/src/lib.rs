// crates/lifeledger-store-sqlite/src/lib.rs
// ============================================================================
// Module: Lifeledger SQLite Store
// Description: SQLite-backed implementation of the Lifeledger store interfaces.
// Purpose: Provide durable dataset and record persistence.
// Dependencies: lifeledger-core, rusqlite
// ============================================================================

//! ## Overview
//! Durable [`lifeledger_core::TransactionalStore`] backed by `SQLite`. See
//! [`store`] for the table layout and relation index management.

pub mod store;

pub use store::SCHEMA_VERSION;
pub use store::SqliteLedgerStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
