//! Tasksync Smoke CLI: cross-browser smoke tests for the Ditto Tasks web app
//!
//! ## Usage
//!
//! ```bash
//! tasksync-smoke run                                # Chrome + Firefox on Windows 11
//! tasksync-smoke run --matrix browsers.yaml         # Custom browser matrix
//! tasksync-smoke run --report target/smoke.json     # Also write a JSON report
//! tasksync-smoke matrix --format yaml               # Print the default matrix
//! ```
//!
//! Exit status: 0 when every browser passed, 1 when any failed, 2 when the
//! run could not start.

use clap::Parser;
use std::process::ExitCode;
use tasksync_smoke::{RemoteGrid, ScenarioRunner};
use tasksync_smoke_cli::{
    load_matrix, logging, settings_from_args, Cli, CliConfig, CliError, CliResult, ColorChoice,
    Commands, LogFormat, MatrixArgs, MatrixFormat, RunArgs, SmokeRunner, Verbosity,
};

const USAGE_ERROR: u8 = 2;

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(USAGE_ERROR)
        }
    }
}

fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let config = build_config(&cli);
    logging::init(config.verbosity, config.log_format)?;

    match cli.command {
        Commands::Run(args) => run_matrix(config, &args),
        Commands::Matrix(args) => {
            show_matrix(&args)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let verbosity = Verbosity::from_flags(cli.quiet, cli.verbose);
    let color: ColorChoice = cli.color.clone().into();
    let log_format: LogFormat = cli.log_format.clone().into();

    CliConfig::new()
        .with_verbosity(verbosity)
        .with_color(color)
        .with_log_format(log_format)
}

fn run_matrix(config: CliConfig, args: &RunArgs) -> CliResult<ExitCode> {
    if args.sync_timeout == 0 {
        return Err(CliError::invalid_argument(
            "--sync-timeout must be at least 1 second",
        ));
    }
    let matrix = load_matrix(args.matrix.as_deref())?;
    let grid = RemoteGrid::new(args.username.clone(), args.access_key.clone())?
        .with_hub(args.hub.clone());
    let scenarios = ScenarioRunner::new(grid, settings_from_args(args));

    let config = config
        .with_fail_fast(args.fail_fast)
        .with_report_path(args.report.clone());
    let report = SmokeRunner::new(config).run(&scenarios, &matrix)?;

    Ok(ExitCode::from(u8::try_from(report.exit_code()).unwrap_or(1)))
}

fn show_matrix(args: &MatrixArgs) -> CliResult<()> {
    let matrix = load_matrix(args.matrix.as_deref())?;
    match args.format {
        MatrixFormat::Text => {
            for browser in &matrix.browsers {
                println!("{browser}");
            }
        }
        MatrixFormat::Yaml => print!("{}", serde_yaml_ng::to_string(&matrix)?),
        MatrixFormat::Json => println!("{}", serde_json::to_string_pretty(&matrix)?),
    }
    Ok(())
}
