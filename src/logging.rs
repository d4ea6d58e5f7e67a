//! Logging setup for the `sf` binary.
//!
//! Log output goes to stderr so rendered answers on stdout stay clean for
//! piping. `RUST_LOG` overrides both `--verbose` and `[logging].filter`.

use anyhow::{anyhow, Context, Result};
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

pub fn init(cfg: &LoggingConfig, verbose: bool) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => {
            let directive = if verbose { "debug" } else { cfg.filter.as_str() };
            EnvFilter::try_new(directive)
                .with_context(|| format!("Invalid logging.filter: '{}'", directive))?
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialise logging: {}", e))
}
