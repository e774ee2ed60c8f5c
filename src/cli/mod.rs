//! CLI support for the `zk-settings` binary
//!
//! Command handlers are generic over the session factory and write to any
//! `io::Write`, so they run the same against a live ensemble or an in-memory
//! one.
//!
//! ```bash
//! # Print the settings stored at a path
//! zk-settings get zk://10.20.30.10:2181,10.20.30.11:2181/testdemo
//!
//! # Store a JSON file (or `-` for stdin)
//! zk-settings put settings.json zk://10.20.30.10:2181/testdemo
//!
//! # Show how a locator is split
//! zk-settings parse zk://a:2181,b:2181/apps/demo
//! ```

pub mod commands;

use anyhow::Result;

/// Initialize logging: RUST_LOG wins over the given level
pub fn init_logging(level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
