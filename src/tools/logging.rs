//! Logging bootstrap for hosts embedding the wallet.

use anyhow::Result;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Installs a global `tracing` subscriber filtered by `RUST_LOG` (default `info`).
pub fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
