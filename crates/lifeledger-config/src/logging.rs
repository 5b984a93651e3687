// crates/lifeledger-config/src/logging.rs
// ============================================================================
// Module: Lifeledger Logging
// Description: Installs the process-wide tracing subscriber.
// Purpose: Route engine diagnostics to stderr as text or JSON.
// Dependencies: tracing-subscriber
// ============================================================================

//! ## Overview
//! `RUST_LOG`, when set and valid, overrides the configured filter. A
//! subscriber that is already installed is left in place.

// ============================================================================
// SECTION: Imports
// ============================================================================

use tracing_subscriber::EnvFilter;

use crate::config::ConfigError;
use crate::config::LogFormat;
use crate::config::LoggingConfig;

// ============================================================================
// SECTION: Installation
// ============================================================================

/// Builds the effective filter for `config`.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] when the configured level cannot be parsed
/// and `RUST_LOG` does not supply a usable filter.
pub fn log_filter(config: &LoggingConfig) -> Result<EnvFilter, ConfigError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level)
        .map_err(|err| ConfigError::Invalid(format!("logging.level is not a valid filter: {err}")))
}

/// Installs the global subscriber.
///
/// Returns `false` when a global subscriber was already installed.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] when the filter cannot be built.
pub fn install_logging(config: &LoggingConfig) -> Result<bool, ConfigError> {
    let filter = log_filter(config)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    let installed = match config.format {
        LogFormat::Text => builder.try_init().is_ok(),
        LogFormat::Json => builder.json().try_init().is_ok(),
    };
    Ok(installed)
}
