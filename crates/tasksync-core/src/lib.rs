//! Task synchronization core.
//!
//! Reconciles an authoritative remote task API with a device-local durable
//! cache: [`sync::Synchronizer`] owns the canonical in-memory collection,
//! serializes create/update/delete against both sides, and exposes a
//! filterable view plus an operation status for the presentation layer to
//! consume. The presentation layer itself lives elsewhere; this crate is its
//! embedded state engine.

pub mod cache;
pub mod config;
pub mod error;
pub mod filter;
pub mod gateway;
pub mod sync;
pub mod task;

use std::io::IsTerminal;

use anyhow::anyhow;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Installs a fmt subscriber for embedders that do not bring their own.
/// `RUST_LOG` wins over the verbosity counters; double initialization is
/// tolerated.
pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 2 {
        "trace"
    } else if verbose == 1 {
        "debug"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}
