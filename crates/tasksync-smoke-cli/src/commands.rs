//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tasksync_smoke::scenario::DEFAULT_APP_URL;
use tasksync_smoke::webdriver::{ACCESS_KEY_VAR, DEFAULT_HUB, USERNAME_VAR};

/// Cross-browser smoke tests for the Ditto Tasks web app
#[derive(Parser, Debug)]
#[command(name = "tasksync-smoke")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Log line format
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormatArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the smoke scenario on every browser in the matrix
    Run(RunArgs),

    /// Show the browser matrix that would be run
    Matrix(MatrixArgs),
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Application URL opened in each session
    #[arg(long, default_value = DEFAULT_APP_URL)]
    pub app_url: String,

    /// WebDriver hub (host/path, optionally with scheme)
    #[arg(long, default_value = DEFAULT_HUB)]
    pub hub: String,

    /// Grid user name
    #[arg(long, env = USERNAME_VAR, hide_env_values = true)]
    pub username: Option<String>,

    /// Grid access key
    #[arg(long, env = ACCESS_KEY_VAR, hide_env_values = true)]
    pub access_key: Option<String>,

    /// CI run identifier, used in task labels
    #[arg(long, env = "GITHUB_RUN_ID", default_value = "local")]
    pub run_id: String,

    /// CI run number, used in task labels and the build name
    #[arg(long, env = "GITHUB_RUN_NUMBER", default_value = "0")]
    pub run_number: String,

    /// Seeded document to wait for (sync check is skipped when unset)
    #[arg(long, env = "GITHUB_TEST_DOC_ID")]
    pub doc_id: Option<String>,

    /// Seconds to wait for the seeded document
    #[arg(long, default_value = "30")]
    pub sync_timeout: u64,

    /// YAML browser matrix (defaults to Chrome and Firefox on Windows 11)
    #[arg(short, long)]
    pub matrix: Option<PathBuf>,

    /// Directory screenshots are written to
    #[arg(long, default_value = ".")]
    pub artifacts_dir: PathBuf,

    /// Write a JSON report to this path
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Stop after the first failing browser
    #[arg(long)]
    pub fail_fast: bool,
}

/// Arguments for the matrix command
#[derive(Parser, Debug)]
pub struct MatrixArgs {
    /// YAML browser matrix (defaults to Chrome and Firefox on Windows 11)
    #[arg(short, long)]
    pub matrix: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: MatrixFormat,
}

/// Output format for the matrix command
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MatrixFormat {
    /// One configuration per line
    #[default]
    Text,
    /// YAML, loadable with `--matrix`
    Yaml,
    /// JSON
    Json,
}

/// Color argument for CLI
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

/// Log format argument for CLI
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormatArg {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

impl From<LogFormatArg> for crate::config::LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Text => Self::Text,
            LogFormatArg::Json => Self::Json,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    fn run_args(args: &[&str]) -> RunArgs {
        let mut argv = vec!["tasksync-smoke", "run"];
        argv.extend_from_slice(args);
        match Cli::parse_from(argv).command {
            Commands::Run(args) => args,
            Commands::Matrix(_) => panic!("expected Run command"),
        }
    }

    mod cli_tests {
        use super::*;

        #[test]
        fn test_parse_run_command() {
            let cli = Cli::parse_from(["tasksync-smoke", "run"]);
            assert!(matches!(cli.command, Commands::Run(_)));
        }

        #[test]
        fn test_subcommand_required() {
            assert!(Cli::try_parse_from(["tasksync-smoke"]).is_err());
        }

        #[test]
        fn test_run_defaults() {
            let args = run_args(&[]);
            assert_eq!(args.app_url, "http://localhost:3000");
            assert_eq!(args.hub, "hub.browserstack.com/wd/hub");
            assert_eq!(args.sync_timeout, 30);
            assert_eq!(args.artifacts_dir, PathBuf::from("."));
            assert!(args.report.is_none());
            assert!(!args.fail_fast);
        }

        #[test]
        fn test_run_flags() {
            let args = run_args(&[
                "--app-url",
                "http://127.0.0.1:8080",
                "--run-id",
                "42",
                "--run-number",
                "7",
                "--doc-id",
                "github_42_7",
                "--matrix",
                "browsers.yaml",
                "--report",
                "out.json",
                "--fail-fast",
            ]);
            assert_eq!(args.app_url, "http://127.0.0.1:8080");
            assert_eq!(args.run_id, "42");
            assert_eq!(args.run_number, "7");
            assert_eq!(args.doc_id.as_deref(), Some("github_42_7"));
            assert_eq!(args.matrix, Some(PathBuf::from("browsers.yaml")));
            assert_eq!(args.report, Some(PathBuf::from("out.json")));
            assert!(args.fail_fast);
        }

        #[test]
        fn test_parse_matrix_with_format() {
            let cli = Cli::parse_from(["tasksync-smoke", "matrix", "--format", "yaml"]);
            if let Commands::Matrix(args) = cli.command {
                assert_eq!(args.format, MatrixFormat::Yaml);
            } else {
                panic!("expected Matrix command");
            }
        }

        #[test]
        fn test_global_verbose_flag() {
            let cli = Cli::parse_from(["tasksync-smoke", "-vv", "run"]);
            assert_eq!(cli.verbose, 2);
        }

        #[test]
        fn test_global_quiet_flag() {
            let cli = Cli::parse_from(["tasksync-smoke", "run", "-q"]);
            assert!(cli.quiet);
        }

        #[test]
        fn test_global_log_format_flag() {
            let cli = Cli::parse_from(["tasksync-smoke", "--log-format", "json", "matrix"]);
            assert!(matches!(cli.log_format, LogFormatArg::Json));
        }
    }

    mod conversion_tests {
        use super::*;
        use crate::config::{ColorChoice, LogFormat};

        #[test]
        fn test_color_arg_conversion() {
            let auto: ColorChoice = ColorArg::Auto.into();
            assert!(matches!(auto, ColorChoice::Auto));

            let never: ColorChoice = ColorArg::Never.into();
            assert!(matches!(never, ColorChoice::Never));
        }

        #[test]
        fn test_log_format_conversion() {
            let json: LogFormat = LogFormatArg::Json.into();
            assert_eq!(json, LogFormat::Json);
        }
    }
}
