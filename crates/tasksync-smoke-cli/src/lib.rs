//! Tasksync Smoke CLI Library
//!
//! Command-line interface for the cross-browser smoke tests.

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)] // Error types are self-documenting

mod commands;
mod config;
mod error;
pub mod logging;
mod output;
mod runner;

pub use commands::{Cli, ColorArg, Commands, LogFormatArg, MatrixArgs, MatrixFormat, RunArgs};
pub use config::{CliConfig, ColorChoice, LogFormat, Verbosity};
pub use error::{CliError, CliResult};
pub use output::{overall_line, result_line, ProgressReporter};
pub use runner::{load_matrix, settings_from_args, SmokeRunner};
