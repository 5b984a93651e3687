// crates/lifeledger-config/src/startup.rs
// ============================================================================
// Module: Lifeledger Startup
// Description: Opens the configured store and reconciles the dataset catalog.
// Purpose: Turn a validated configuration into a ready data engine.
// Dependencies: lifeledger-core, lifeledger-store-sqlite, thiserror, tracing
// ============================================================================

//! ## Overview
//! [`open_engine`] opens the configured backend, runs the schema
//! synchronizer over the declared catalog, and optionally prunes datasets that
//! are no longer declared. [`LedgerStore`] lets callers hold either backend
//! behind one engine type.

// ============================================================================
// SECTION: Imports
// ============================================================================

use lifeledger_core::DataEngine;
use lifeledger_core::EngineConfig;
use lifeledger_core::InMemoryLedgerStore;
use lifeledger_core::LedgerError;
use lifeledger_core::PruneReport;
use lifeledger_core::StoreError;
use lifeledger_core::StoreSession;
use lifeledger_core::SyncReport;
use lifeledger_core::SystemClock;
use lifeledger_core::TransactionalStore;
use lifeledger_store_sqlite::SqliteLedgerStore;
use lifeledger_store_sqlite::SqliteStoreError;
use thiserror::Error;
use tracing::info;

use crate::config::ConfigError;
use crate::config::LedgerConfig;

// ============================================================================
// SECTION: Store Selection
// ============================================================================

/// Store backend selected by configuration.
#[derive(Clone)]
pub enum LedgerStore {
    /// Volatile in-memory store.
    Memory(InMemoryLedgerStore),
    /// Durable `SQLite` store.
    Sqlite(SqliteLedgerStore),
}

impl TransactionalStore for LedgerStore {
    fn read<T, E, F>(&self, op: F) -> Result<T, E>
    where
        F: FnOnce(&dyn StoreSession) -> Result<T, E>,
        E: From<StoreError>,
    {
        match self {
            Self::Memory(store) => store.read(op),
            Self::Sqlite(store) => store.read(op),
        }
    }

    fn write<T, E, F>(&self, op: F) -> Result<T, E>
    where
        F: FnOnce(&dyn StoreSession) -> Result<T, E>,
        E: From<StoreError>,
    {
        match self {
            Self::Memory(store) => store.write(op),
            Self::Sqlite(store) => store.write(op),
        }
    }
}

// ============================================================================
// SECTION: Startup
// ============================================================================

/// Errors raised while bringing the engine up.
#[derive(Debug, Error)]
pub enum StartupError {
    /// Configuration is unusable.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Store could not be opened.
    #[error(transparent)]
    Store(#[from] SqliteStoreError),
    /// Synchronization or pruning failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Engine plus the reports produced while starting it.
pub struct Startup {
    /// Ready engine.
    pub engine: DataEngine<LedgerStore, SystemClock>,
    /// Synchronizer outcome.
    pub sync: SyncReport,
    /// Cleanup outcome when pruning is enabled.
    pub prune: Option<PruneReport>,
}

/// Opens the configured store and reconciles the declared catalog.
///
/// # Errors
///
/// Returns [`StartupError`] when validation, store initialization,
/// synchronization, or pruning fails. Synchronization and pruning each run
/// in their own transaction.
pub fn open_engine(config: &LedgerConfig) -> Result<Startup, StartupError> {
    config.validate()?;
    let store = match config.store.sqlite() {
        Some(sqlite) => LedgerStore::Sqlite(SqliteLedgerStore::new(&sqlite)?),
        None => LedgerStore::Memory(InMemoryLedgerStore::new()),
    };
    let engine = DataEngine::with_clock(store, SystemClock, EngineConfig {
        sync_policy: config.sync.policy,
    });
    let sync = engine.sync_datasets(&config.datasets)?;
    let prune = if config.sync.prune_undeclared {
        Some(engine.prune_undeclared(&config.datasets)?)
    } else {
        None
    };
    info!(
        declared = config.datasets.len(),
        created = sync.created.len(),
        pruned = prune.as_ref().map_or(0, |report| report.removed_datasets.len()),
        "lifeledger engine ready"
    );
    Ok(Startup {
        engine,
        sync,
        prune,
    })
}
