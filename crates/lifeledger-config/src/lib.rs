// crates/lifeledger-config/src/lib.rs
// ============================================================================
// Module: Lifeledger Config Library
// Description: Configuration model, logging setup, and engine startup.
// Purpose: Single source of truth for lifeledger.toml semantics.
// Dependencies: lifeledger-core, lifeledger-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `lifeledger-config` loads `lifeledger.toml` with strict, fail-closed
//! validation, installs the tracing subscriber it describes, and opens a data
//! engine whose dataset catalog matches the declared one.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod logging;
pub mod startup;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use logging::install_logging;
pub use logging::log_filter;
pub use startup::LedgerStore;
pub use startup::Startup;
pub use startup::StartupError;
pub use startup::open_engine;
