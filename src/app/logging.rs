//! Process-wide logger setup.
//!
//! Logs go to stderr through `env_logger`. `RUST_LOG` wins over the
//! configured level so a single run can be made verbose without editing the
//! config file.

use anyhow::{Context, Result};
use env_logger::{Builder, Env};

/// Initialize logging at `level` (already validated by `Config::validate`).
///
/// Fails when a logger is already installed.
pub fn init_logging(level: &str) -> Result<()> {
    Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp_millis()
        .format_target(false)
        .try_init()
        .context("Failed to initialize logging")?;

    log::debug!(
        "voice-notes {} on {} (log level {})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        level
    );
    Ok(())
}
