//! Matrix runner: wires CLI arguments to the scenario runner

use crate::commands::RunArgs;
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;
use std::path::Path;
use std::time::Duration;
use tasksync_smoke::{
    run_suite_with, BrowserMatrix, Clock, RunSettings, ScenarioRunner, SessionFactory, SuiteReport,
    Timeouts,
};
use tracing::{info, warn};

/// Load the matrix file, or the default matrix when no path is given
pub fn load_matrix(path: Option<&Path>) -> CliResult<BrowserMatrix> {
    match path {
        Some(path) => BrowserMatrix::load(path).map_err(|e| {
            CliError::config(format!("cannot load matrix {}: {e}", path.display()))
        }),
        None => Ok(BrowserMatrix::default()),
    }
}

/// Run settings from the run command's arguments
#[must_use]
pub fn settings_from_args(args: &RunArgs) -> RunSettings {
    let timeouts = Timeouts {
        sync: Duration::from_secs(args.sync_timeout),
        ..Timeouts::default()
    };
    RunSettings::new()
        .with_app_url(args.app_url.clone())
        .with_run(args.run_id.clone(), args.run_number.clone())
        .with_sync_doc_id(args.doc_id.clone())
        .with_artifacts_dir(args.artifacts_dir.clone())
        .with_timeouts(timeouts)
}

/// Runs the matrix with console progress and optional JSON report
#[derive(Debug)]
pub struct SmokeRunner {
    config: CliConfig,
    reporter: ProgressReporter,
}

impl SmokeRunner {
    /// Create a new runner
    #[must_use]
    pub fn new(config: CliConfig) -> Self {
        let reporter =
            ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet());
        Self { config, reporter }
    }

    /// Run every configuration and print the summary.
    ///
    /// Scenario failures are reported in the returned [`SuiteReport`]. The
    /// only error is an artifacts directory that cannot be created, which
    /// happens before any scenario starts.
    pub fn run<F, C>(
        &mut self,
        scenarios: &ScenarioRunner<F, C>,
        matrix: &BrowserMatrix,
    ) -> CliResult<SuiteReport>
    where
        F: SessionFactory,
        C: Clock,
    {
        std::fs::create_dir_all(&scenarios.settings().artifacts_dir)?;

        info!(
            browsers = matrix.len(),
            app_url = %scenarios.settings().app_url,
            run_id = %scenarios.settings().run_id,
            "starting smoke run"
        );
        self.reporter.start_progress(matrix.len() as u64);
        if let Some(first) = matrix.browsers.first() {
            self.reporter.scenario_started(first);
        }

        let reporter = &self.reporter;
        let report = run_suite_with(scenarios, matrix, self.config.fail_fast, |index, result| {
            reporter.scenario_finished(result);
            if let Some(next) = matrix.browsers.get(index + 1) {
                reporter.scenario_started(next);
            }
        });
        self.reporter.finish();

        if report.total() < matrix.len() {
            self.reporter.warning(&format!(
                "{} configuration(s) skipped after failure",
                matrix.len() - report.total()
            ));
        }
        self.reporter.summary(&report);

        // The exit code belongs to the scenarios; a lost report only warns.
        if let Some(path) = &self.config.report_path {
            match report.write_json(path) {
                Ok(()) => info!(path = %path.display(), "report written"),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "report not written");
                    self.reporter
                        .warning(&format!("report not written to {}: {e}", path.display()));
                }
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::unreachable)]
mod tests {
    use super::*;
    use crate::config::ColorChoice;
    use tasksync_smoke::mock::{MockGrid, MockPage};
    use tasksync_smoke::FakeClock;

    fn quiet_config() -> CliConfig {
        CliConfig::new()
            .with_verbosity(crate::config::Verbosity::Quiet)
            .with_color(ColorChoice::Never)
    }

    mod matrix_tests {
        use super::*;

        #[test]
        fn test_default_matrix_when_no_path() {
            assert_eq!(load_matrix(None).unwrap().len(), 2);
        }

        #[test]
        fn test_missing_matrix_file_is_config_error() {
            let err = load_matrix(Some(Path::new("/nonexistent/matrix.yaml"))).unwrap_err();
            assert!(matches!(err, CliError::Config { .. }));
        }
    }

    mod settings_tests {
        use super::*;
        use crate::commands::{Cli, Commands};
        use clap::Parser;

        #[test]
        fn test_settings_from_args() {
            let cli = Cli::parse_from([
                "tasksync-smoke",
                "run",
                "--run-id",
                "42",
                "--run-number",
                "7",
                "--doc-id",
                "github_42_7",
                "--sync-timeout",
                "5",
            ]);
            let Commands::Run(args) = cli.command else {
                unreachable!()
            };
            let settings = settings_from_args(&args);
            assert_eq!(settings.run_id, "42");
            assert_eq!(settings.run_number, "7");
            assert_eq!(settings.sync_doc_id.as_deref(), Some("github_42_7"));
            assert_eq!(settings.timeouts.sync, Duration::from_secs(5));
            assert_eq!(settings.timeouts.document_ready, Duration::from_secs(30));
        }
    }

    mod run_tests {
        use super::*;

        #[test]
        fn test_run_writes_report() {
            let dir = tempfile::tempdir().unwrap();
            let report_path = dir.path().join("report.json");
            let settings = RunSettings::new().with_artifacts_dir(dir.path().join("shots"));
            let scenarios = ScenarioRunner::with_clock(
                MockGrid::new(MockPage::new()),
                FakeClock::new(),
                settings,
            );
            let mut runner =
                SmokeRunner::new(quiet_config().with_report_path(Some(report_path.clone())));

            let report = runner.run(&scenarios, &BrowserMatrix::default()).unwrap();

            assert_eq!(report.exit_code(), 0);
            assert!(report_path.exists());
            assert!(dir.path().join("shots").join("test_screenshot_Chrome.png").exists());
        }

        #[test]
        fn test_unwritable_report_keeps_suite_outcome() {
            let dir = tempfile::tempdir().unwrap();
            let report_path = dir.path().join("missing").join("report.json");
            let scenarios = ScenarioRunner::with_clock(
                MockGrid::new(MockPage::new()),
                FakeClock::new(),
                RunSettings::new().with_artifacts_dir(dir.path()),
            );
            let mut runner =
                SmokeRunner::new(quiet_config().with_report_path(Some(report_path.clone())));

            let report = runner.run(&scenarios, &BrowserMatrix::default()).unwrap();

            assert_eq!(report.total(), 2);
            assert_eq!(report.exit_code(), 0);
            assert!(!report_path.exists());
        }

        #[test]
        fn test_fail_fast_skips_remaining() {
            let dir = tempfile::tempdir().unwrap();
            let scenarios = ScenarioRunner::with_clock(
                MockGrid::refusing(),
                FakeClock::new(),
                RunSettings::new().with_artifacts_dir(dir.path()),
            );
            let mut runner = SmokeRunner::new(quiet_config().with_fail_fast(true));
            let report = runner.run(&scenarios, &BrowserMatrix::default()).unwrap();
            assert_eq!(report.total(), 1);
            assert_eq!(report.exit_code(), 1);
        }
    }
}
