//! Logger initialization
//!
//! Call sites use the `log` macros; records are bridged into
//! `tracing-subscriber` so they share one formatter with the spans the
//! orchestrator opens per run. Output goes to the console and, when
//! configured, to a log file.

use std::path::Path;
use std::sync::Mutex;

use anyhow::Result;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "info";

/// Initialize logger for console and optional file output
///
/// # Arguments
/// * `log_file_path` - Path to the log file, `None` for console only
///
/// # Returns
/// * `Ok(())` - Logger initialized successfully
/// * `Err(anyhow::Error)` - Log file could not be created or a global logger is already set
pub fn init_logger(log_file_path: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let file_layer = match log_file_path {
        Some(path) => {
            let file = fs_err::File::create(path).map_err(|e| anyhow::anyhow!("Failed to create log file: {}", e))?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file.into_parts().0)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}
