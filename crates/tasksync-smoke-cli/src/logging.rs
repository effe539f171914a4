//! Tracing subscriber setup

use crate::config::{LogFormat, Verbosity};
use crate::error::{CliError, CliResult};
use tracing_subscriber::EnvFilter;

/// Filter from `RUST_LOG`, falling back to the verbosity's default level
#[must_use]
pub fn env_filter(verbosity: Verbosity) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(verbosity.log_filter()))
}

/// Install the global subscriber. Logs go to stderr so stdout only carries
/// the summary.
pub fn init(verbosity: Verbosity, format: LogFormat) -> CliResult<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbosity))
        .with_writer(std::io::stderr)
        .with_target(false);

    let installed = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|e| CliError::config(format!("logging: {e}")))
}
