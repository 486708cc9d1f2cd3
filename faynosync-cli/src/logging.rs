use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::error::{FaynoError, Result};

/// Parse a `--log-level` value.
pub fn parse_level(name: &str) -> Result<Level> {
    Level::from_str(&name.trim().to_ascii_lowercase())
        .map_err(|_| FaynoError::InvalidLogLevel(name.to_string()))
}

/// Install the global subscriber. `RUST_LOG` takes precedence over `level`.
pub fn init_tracing(level: &str) -> Result<()> {
    let level = parse_level(level)?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_ascii_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
    Ok(())
}
