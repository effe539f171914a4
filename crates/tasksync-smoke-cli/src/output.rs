//! Output formatting and progress reporting

use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tasksync_smoke::{BrowserConfig, ScenarioResult, SuiteReport};

/// `Chrome 120.0 on Windows 11: PASSED`
#[must_use]
pub fn result_line(result: &ScenarioResult) -> String {
    let status = if result.passed { "PASSED" } else { "FAILED" };
    format!("{}: {status}", result.browser)
}

/// `Overall: 1/2 tests passed`
#[must_use]
pub fn overall_line(report: &SuiteReport) -> String {
    format!(
        "Overall: {}/{} tests passed",
        report.passed(),
        report.total()
    )
}

/// Progress reporter for a matrix run
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    out: Term,
    progress_bar: Option<ProgressBar>,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            out: Term::stdout(),
            progress_bar: None,
            use_color,
            quiet,
        }
    }

    /// Start a progress bar over the matrix
    pub fn start_progress(&mut self, total: u64) {
        if self.quiet {
            return;
        }

        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb.enable_steady_tick(Duration::from_millis(120));
        self.progress_bar = Some(pb);
    }

    /// Show which configuration is running
    pub fn scenario_started(&self, browser: &BrowserConfig) {
        if let Some(ref pb) = self.progress_bar {
            pb.set_message(browser.to_string());
        }
    }

    /// Record a finished scenario
    pub fn scenario_finished(&self, result: &ScenarioResult) {
        if let Some(ref pb) = self.progress_bar {
            pb.inc(1);
        }
        if result.passed {
            self.success(&format!("{}", result.browser));
        } else {
            self.failure(&format!(
                "{}: {}",
                result.browser,
                result.error.as_deref().unwrap_or("unknown error")
            ));
        }
    }

    /// Finish progress bar
    pub fn finish(&self) {
        if let Some(ref pb) = self.progress_bar {
            pb.finish_and_clear();
        }
    }

    fn write(&self, line: &str) {
        match self.progress_bar {
            Some(ref pb) => pb.suspend(|| {
                let _ = self.term.write_line(line);
            }),
            None => {
                let _ = self.term.write_line(line);
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }

        let prefix = if self.use_color {
            style("✓").green().bold().to_string()
        } else {
            "PASS".to_string()
        };

        self.write(&format!("{prefix} {message}"));
    }

    /// Print a failure message
    pub fn failure(&self, message: &str) {
        // Always print failures, even in quiet mode
        let prefix = if self.use_color {
            style("✗").red().bold().to_string()
        } else {
            "FAIL".to_string()
        };

        self.write(&format!("{prefix} {message}"));
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.quiet {
            return;
        }

        let prefix = if self.use_color {
            style("⚠").yellow().bold().to_string()
        } else {
            "WARN".to_string()
        };

        self.write(&format!("{prefix} {message}"));
    }

    /// Print the per-browser summary and overall count to stdout.
    ///
    /// Printed in quiet mode too; it is the run's primary output.
    pub fn summary(&self, report: &SuiteReport) {
        let _ = self.out.write_line("");
        let header = if self.use_color {
            style("=== Test Summary ===").bold().to_string()
        } else {
            "=== Test Summary ===".to_string()
        };
        let _ = self.out.write_line(&header);

        for result in &report.results {
            let line = result_line(result);
            let line = match (self.use_color, result.passed) {
                (false, _) => line,
                (true, true) => style(line).green().to_string(),
                (true, false) => style(line).red().to_string(),
            };
            let _ = self.out.write_line(&line);
        }

        let _ = self.out.write_line("");
        let _ = self.out.write_line(&overall_line(report));
        let _ = self.out.write_line(&format!(
            "Finished in {:.2}s",
            report.duration.as_secs_f64()
        ));
    }
}
