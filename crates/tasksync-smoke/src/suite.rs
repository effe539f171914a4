//! Aggregation of scenario results across the browser matrix.

use crate::capabilities::BrowserMatrix;
use crate::clock::Clock;
use crate::driver::SessionFactory;
use crate::scenario::{ScenarioResult, ScenarioRunner};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Results of a full run, in configuration order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteReport {
    /// One result per executed configuration
    pub results: Vec<ScenarioResult>,
    /// Total wall time
    pub duration: Duration,
}

impl SuiteReport {
    /// Create an empty report
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a result
    pub fn add(&mut self, result: ScenarioResult) {
        self.results.push(result);
    }

    /// Number of passing scenarios
    #[must_use]
    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }

    /// Number of failing scenarios
    #[must_use]
    pub fn failed(&self) -> usize {
        self.results.iter().filter(|r| !r.passed).count()
    }

    /// Number of scenarios run
    #[must_use]
    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// Whether every scenario passed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(|r| r.passed)
    }

    /// Process exit status: 0 when every scenario passed, 1 otherwise
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        i32::from(!self.all_passed())
    }

    /// Write the report as pretty-printed JSON
    pub fn write_json(&self, path: &Path) -> crate::result::SmokeResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Run every configuration of `matrix` in order.
///
/// With `fail_fast` the run stops after the first failing scenario and the
/// report only covers configurations that were executed.
pub fn run_suite<F, C>(runner: &ScenarioRunner<F, C>, matrix: &BrowserMatrix, fail_fast: bool) -> SuiteReport
where
    F: SessionFactory,
    C: Clock,
{
    run_suite_with(runner, matrix, fail_fast, |_, _| {})
}

/// [`run_suite`] with a callback invoked after each scenario with its index
/// and result.
pub fn run_suite_with<F, C, O>(
    runner: &ScenarioRunner<F, C>,
    matrix: &BrowserMatrix,
    fail_fast: bool,
    mut on_result: O,
) -> SuiteReport
where
    F: SessionFactory,
    C: Clock,
    O: FnMut(usize, &ScenarioResult),
{
    let started = runner.clock().now();
    let mut report = SuiteReport::new();

    for (index, browser) in matrix.browsers.iter().enumerate() {
        let result = runner.run(browser);
        on_result(index, &result);
        let failed = !result.passed;
        report.add(result);
        if failed && fail_fast {
            warn!(
                skipped = matrix.len() - index - 1,
                "stopping after first failure"
            );
            break;
        }
    }

    report.duration = runner.clock().now() - started;
    info!(
        passed = report.passed(),
        total = report.total(),
        "suite finished"
    );
    report
}
