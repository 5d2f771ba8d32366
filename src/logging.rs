//! Tracing setup for the `fitplan` binary.
//!
//! Human-readable compact lines go to stderr so stdout stays free for CSV
//! output. An optional JSON log file receives every event regardless of the
//! stderr filter.

use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Once;

use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const DEFAULT_LOG_LEVEL: &str = "info";

/// Env var holding a filter directive; beats the configured `log_level`.
pub const ENV_VAR_NAME: &str = "FITPLAN_LOG";

static INIT: Once = Once::new();

/// Install the global subscriber. Calls after the first are no-ops.
///
/// Filter precedence: `FITPLAN_LOG` > `log_level` > `info`.
pub fn init(log_level: Option<&str>, log_file: Option<&Path>) -> anyhow::Result<()> {
    let mut outcome = Ok(());
    INIT.call_once(|| outcome = try_init(log_level, log_file));
    outcome
}

fn try_init(log_level: Option<&str>, log_file: Option<&Path>) -> anyhow::Result<()> {
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(true)
        .compact()
        .with_filter(build_filter(log_level));

    let file_layer = match log_file {
        Some(path) => {
            let file = open_log_file(path)?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(file.with_max_level(Level::TRACE))
                    .with_target(false)
                    .with_ansi(false)
                    .json(),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))
}

fn build_filter(log_level: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_env(ENV_VAR_NAME)
        .unwrap_or_else(|_| EnvFilter::new(log_level.unwrap_or(DEFAULT_LOG_LEVEL)))
}

fn open_log_file(path: &Path) -> anyhow::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            anyhow::anyhow!("failed to create log directory {}: {e}", parent.display())
        })?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| anyhow::anyhow!("failed to open log file {}: {e}", path.display()))
}
