//! Scenario Runner
//!
//! Drives one browser configuration through the full smoke scenario:
//!
//! ```text
//! connect ─► name session ─► load app ─► sync check ─► UI checks ─► add task
//!                                                                      │
//!         release ◄─ report status ◄─ screenshot ◄─────────────────────┘
//! ```
//!
//! Fatal steps return a [`SmokeError`]; the runner turns it into a failed
//! [`ScenarioResult`]. Screenshots, status reports and the optional UI checks
//! never change the outcome.

use crate::capabilities::{BrowserConfig, Capabilities, SessionMetadata, SESSION_DISPLAY_NAME};
use crate::clock::{Clock, SystemClock};
use crate::driver::{BrowserSession, Locator, ScopedSession, SessionFactory};
use crate::result::{SmokeError, SmokeResult};
use crate::selectors;
use crate::status::GridCommand;
use crate::sync::{wait_for_sync_with, SyncTarget, DEFAULT_SYNC_TIMEOUT_MS, SYNC_POLL_INTERVAL_MS};
use crate::wait::{best_effort, poll_until, wait_for, WaitOptions, DEFAULT_POLL_INTERVAL_MS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn};

/// Default application under test
pub const DEFAULT_APP_URL: &str = "http://localhost:3000";

// =============================================================================
// SETTINGS
// =============================================================================

/// Bounds for every wait in a scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Page load (`document.readyState == "complete"`)
    pub document_ready: Duration,
    /// Task input becoming enabled
    pub input_enabled: Duration,
    /// Pause after the page is interactive
    pub settle: Duration,
    /// Seeded document showing up in the task list
    pub sync: Duration,
    /// Interval between task-list scans while waiting for sync
    pub sync_interval: Duration,
    /// Mandatory elements and the created task appearing
    pub presence: Duration,
    /// Pause after submitting a task
    pub submit_settle: Duration,
    /// Poll interval for explicit waits
    pub poll_interval: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            document_ready: Duration::from_secs(30),
            input_enabled: Duration::from_secs(20),
            settle: Duration::from_secs(3),
            sync: Duration::from_millis(DEFAULT_SYNC_TIMEOUT_MS),
            sync_interval: Duration::from_millis(SYNC_POLL_INTERVAL_MS),
            presence: Duration::from_secs(10),
            submit_settle: Duration::from_secs(2),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

impl Timeouts {
    fn options(&self, timeout: Duration) -> WaitOptions {
        WaitOptions::new()
            .with_timeout(timeout.as_millis() as u64)
            .with_poll_interval(self.poll_interval.as_millis() as u64)
    }
}

/// Per-run settings shared by every scenario
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    /// Application URL opened in each session
    pub app_url: String,
    /// CI run identifier, used in task labels
    pub run_id: String,
    /// CI run number, used in task labels and the build name
    pub run_number: String,
    /// Seeded document to wait for; the sync check is skipped when absent
    pub sync_doc_id: Option<String>,
    /// Directory screenshots are written to
    pub artifacts_dir: PathBuf,
    /// Wait bounds
    pub timeouts: Timeouts,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            app_url: DEFAULT_APP_URL.to_string(),
            run_id: "local".to_string(),
            run_number: "0".to_string(),
            sync_doc_id: None,
            artifacts_dir: PathBuf::from("."),
            timeouts: Timeouts::default(),
        }
    }
}

impl RunSettings {
    /// Settings with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the application URL
    #[must_use]
    pub fn with_app_url(mut self, url: impl Into<String>) -> Self {
        self.app_url = url.into();
        self
    }

    /// Set the run identifier and number
    #[must_use]
    pub fn with_run(mut self, run_id: impl Into<String>, run_number: impl Into<String>) -> Self {
        self.run_id = run_id.into();
        self.run_number = run_number.into();
        self
    }

    /// Set the seeded document to wait for
    #[must_use]
    pub fn with_sync_doc_id(mut self, doc_id: Option<String>) -> Self {
        self.sync_doc_id = doc_id.filter(|id| !id.is_empty());
        self
    }

    /// Set the screenshot directory
    #[must_use]
    pub fn with_artifacts_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifacts_dir = dir.into();
        self
    }

    /// Set the wait bounds
    #[must_use]
    pub const fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }
}

/// Label typed into the task input; unique per run and second
#[must_use]
pub fn task_label(run_id: &str, run_number: &str, timestamp: i64) -> String {
    format!("BrowserStack Test - Run {run_id}#{run_number} - {timestamp}")
}

// =============================================================================
// RESULT
// =============================================================================

/// Outcome of one browser configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioResult {
    /// Configuration the scenario ran against
    pub browser: BrowserConfig,
    /// Whether every fatal step succeeded
    pub passed: bool,
    /// Error that failed the scenario
    pub error: Option<String>,
    /// Wall time spent on the scenario
    pub duration: Duration,
}

impl ScenarioResult {
    /// Create a passing result
    #[must_use]
    pub const fn pass(browser: BrowserConfig, duration: Duration) -> Self {
        Self {
            browser,
            passed: true,
            error: None,
            duration,
        }
    }

    /// Create a failing result
    #[must_use]
    pub fn fail(browser: BrowserConfig, error: impl Into<String>, duration: Duration) -> Self {
        Self {
            browser,
            passed: false,
            error: Some(error.into()),
            duration,
        }
    }
}

// =============================================================================
// RUNNER
// =============================================================================

/// Runs the smoke scenario on sessions from a factory
#[derive(Debug)]
pub struct ScenarioRunner<F, C = SystemClock> {
    factory: F,
    clock: C,
    settings: RunSettings,
}

impl<F: SessionFactory> ScenarioRunner<F> {
    /// Runner using wall-clock time
    #[must_use]
    pub fn new(factory: F, settings: RunSettings) -> Self {
        Self::with_clock(factory, SystemClock::new(), settings)
    }
}

impl<F: SessionFactory, C: Clock> ScenarioRunner<F, C> {
    /// Runner using an explicit clock
    #[must_use]
    pub const fn with_clock(factory: F, clock: C, settings: RunSettings) -> Self {
        Self {
            factory,
            clock,
            settings,
        }
    }

    /// Run settings
    #[must_use]
    pub const fn settings(&self) -> &RunSettings {
        &self.settings
    }

    /// Time source
    #[must_use]
    pub const fn clock(&self) -> &C {
        &self.clock
    }

    /// Session factory
    #[must_use]
    pub const fn factory(&self) -> &F {
        &self.factory
    }

    /// Run the scenario against one configuration.
    ///
    /// Always returns a result; the session, if one was opened, has been
    /// released by the time this returns.
    pub fn run(&self, browser: &BrowserConfig) -> ScenarioResult {
        let started = self.clock.now();
        let capabilities = Capabilities::new(
            browser.clone(),
            SessionMetadata::new(self.settings.run_number.clone()),
        );
        info!(browser = %browser, "starting scenario");

        let session = match self.factory.connect(&capabilities) {
            Ok(session) => session,
            Err(e) => {
                error!(browser = %browser, error = %e, "could not start session");
                return ScenarioResult::fail(browser.clone(), e.to_string(), self.clock.now() - started);
            }
        };
        let mut session = ScopedSession::new(session);

        best_effort(
            "set session name",
            GridCommand::SetSessionName {
                name: SESSION_DISPLAY_NAME.to_string(),
            }
            .send(&mut *session),
        );

        let outcome = self.drive(&mut *session);

        let result = match outcome {
            Ok(()) => {
                info!(browser = %browser, "scenario passed");
                self.capture(&mut *session, "test_screenshot", browser);
                best_effort("report status", GridCommand::passed().send(&mut *session));
                ScenarioResult::pass(browser.clone(), self.clock.now() - started)
            }
            Err(e) => {
                let message = e.to_string();
                error!(browser = %browser, error = %message, "scenario failed");
                self.capture(&mut *session, "error_screenshot", browser);
                best_effort(
                    "report status",
                    GridCommand::failed(&message).send(&mut *session),
                );
                ScenarioResult::fail(browser.clone(), message, self.clock.now() - started)
            }
        };

        best_effort("release session", session.release());
        result
    }

    fn drive<S: BrowserSession + ?Sized>(&self, session: &mut S) -> SmokeResult<()> {
        let timeouts = &self.settings.timeouts;
        let url = &self.settings.app_url;

        info!(url = %url, "loading application");
        session.navigate(url)?;
        wait_for(
            &self.clock,
            &timeouts.options(timeouts.document_ready),
            "document ready",
            || session.ready_state().is_ok_and(|state| state == "complete"),
        )?;

        let input_locator = Locator::css(selectors::TASK_INPUT);
        let enabled = poll_until(
            &self.clock,
            &timeouts.options(timeouts.input_enabled),
            "task input enabled",
            || input_enabled(session, &input_locator),
        );
        if !enabled.success {
            warn!(
                timeout_ms = timeouts.input_enabled.as_millis() as u64,
                "task input not enabled; continuing"
            );
        }
        self.clock.sleep(timeouts.settle);

        if let Some(doc_id) = &self.settings.sync_doc_id {
            let target = SyncTarget::new(doc_id.clone());
            let options = WaitOptions::new()
                .with_timeout(timeouts.sync.as_millis() as u64)
                .with_poll_interval(timeouts.sync_interval.as_millis() as u64);
            if !wait_for_sync_with(session, &self.clock, &target, &options).success {
                return Err(SmokeError::SyncTimeout {
                    doc_id: doc_id.clone(),
                });
            }
        } else {
            info!("no seeded document configured; skipping sync check");
        }

        poll_until(
            &self.clock,
            &timeouts.options(timeouts.presence),
            "task input present",
            || present(session, &input_locator),
        );
        let input = session.find(&input_locator)?;
        let add_button = session.find(&Locator::xpath(selectors::ADD_TASK_BUTTON))?;
        if best_effort(
            "items counter",
            session.find(&Locator::xpath(selectors::ITEMS_COUNTER)),
        )
        .is_some()
        {
            info!("items counter present");
        }

        let label = task_label(
            &self.settings.run_id,
            &self.settings.run_number,
            chrono::Utc::now().timestamp(),
        );
        info!(label = %label, "creating task");
        session.clear(&input)?;
        session.send_keys(&input, &label)?;
        session.click(&add_button)?;
        self.clock.sleep(timeouts.submit_settle);

        let created = Locator::xpath(selectors::contains_text(&label));
        let appeared = poll_until(
            &self.clock,
            &timeouts.options(timeouts.presence),
            "created task",
            || present(session, &created),
        );
        if !appeared.success {
            return Err(SmokeError::TaskNotCreated { label });
        }
        info!(label = %label, "task created");
        Ok(())
    }

    fn capture<S: BrowserSession + ?Sized>(&self, session: &mut S, prefix: &str, browser: &BrowserConfig) {
        let Some(png) = best_effort("screenshot", session.screenshot()) else {
            return;
        };
        let path = screenshot_path(&self.settings.artifacts_dir, prefix, browser);
        if best_effort("write screenshot", std::fs::write(&path, png)).is_some() {
            info!(path = %path.display(), "screenshot saved");
        }
    }
}

/// `<dir>/<prefix>_<browser>.png`
#[must_use]
pub fn screenshot_path(dir: &Path, prefix: &str, browser: &BrowserConfig) -> PathBuf {
    dir.join(format!("{prefix}_{}.png", browser.browser))
}

fn present<S: BrowserSession + ?Sized>(session: &mut S, locator: &Locator) -> bool {
    session
        .find_all(locator)
        .is_ok_and(|found| !found.is_empty())
}

fn input_enabled<S: BrowserSession + ?Sized>(session: &mut S, locator: &Locator) -> bool {
    match session.find(locator) {
        Ok(input) => session.is_enabled(&input).unwrap_or(false),
        Err(_) => false,
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::clock::FakeClock;
    use crate::mock::{MockGrid, MockPage, MockRow};

    fn chrome() -> BrowserConfig {
        BrowserConfig::new("Chrome", "120.0", "Windows", "11")
    }

    fn runner(
        page: MockPage,
        settings: RunSettings,
    ) -> ScenarioRunner<MockGrid, FakeClock> {
        ScenarioRunner::with_clock(MockGrid::new(page), FakeClock::new(), settings)
    }

    mod settings_tests {
        use super::*;

        #[test]
        fn test_default_settings() {
            let settings = RunSettings::default();
            assert_eq!(settings.app_url, "http://localhost:3000");
            assert_eq!(settings.run_id, "local");
            assert_eq!(settings.run_number, "0");
            assert!(settings.sync_doc_id.is_none());
        }

        #[test]
        fn test_default_timeouts() {
            let t = Timeouts::default();
            assert_eq!(t.document_ready, Duration::from_secs(30));
            assert_eq!(t.input_enabled, Duration::from_secs(20));
            assert_eq!(t.settle, Duration::from_secs(3));
            assert_eq!(t.sync, Duration::from_secs(30));
            assert_eq!(t.sync_interval, Duration::from_secs(1));
            assert_eq!(t.presence, Duration::from_secs(10));
        }

        #[test]
        fn test_empty_doc_id_disables_sync() {
            let settings = RunSettings::new().with_sync_doc_id(Some(String::new()));
            assert!(settings.sync_doc_id.is_none());
        }

        #[test]
        fn test_task_label_format() {
            assert_eq!(
                task_label("123", "45", 1_700_000_000),
                "BrowserStack Test - Run 123#45 - 1700000000"
            );
        }

        #[test]
        fn test_screenshot_path() {
            let path = screenshot_path(Path::new("out"), "error_screenshot", &chrome());
            assert_eq!(path, Path::new("out").join("error_screenshot_Chrome.png"));
        }
    }

    mod run_tests {
        use super::*;

        #[test]
        fn test_end_to_end_success_reports_passed_once() {
            let dir = tempfile::tempdir().unwrap();
            let settings = RunSettings::new()
                .with_sync_doc_id(Some("github_987_3".to_string()))
                .with_artifacts_dir(dir.path());
            let page = MockPage::new().with_rows(vec![MockRow::new("GitHub Test Task 987")]);
            let runner = runner(page, settings);

            let result = runner.run(&chrome());

            assert!(result.passed, "unexpected failure: {:?}", result.error);
            let log = runner.factory().log();
            assert_eq!(log.count_containing(&["setSessionStatus", "\"passed\""]), 1);
            assert_eq!(log.count_containing(&["setSessionStatus", "\"failed\""]), 0);
            assert_eq!(log.count_containing(&["setSessionName", SESSION_DISPLAY_NAME]), 1);
            assert_eq!(log.count("navigate:http://localhost:3000"), 1);
            assert_eq!(log.count("quit"), 1);
            assert!(dir.path().join("test_screenshot_Chrome.png").exists());
        }

        #[test]
        fn test_sync_failure_reports_failed_with_one_screenshot() {
            let dir = tempfile::tempdir().unwrap();
            let settings = RunSettings::new()
                .with_sync_doc_id(Some("github_987_3".to_string()))
                .with_artifacts_dir(dir.path());
            let page = MockPage::new().with_rows(vec![MockRow::new("Buy milk")]);
            let runner = runner(page, settings);

            let result = runner.run(&chrome());

            assert!(!result.passed);
            let error = result.error.unwrap();
            assert!(error.contains("github_987_3"));
            let log = runner.factory().log();
            assert_eq!(log.count_containing(&["setSessionStatus", "\"failed\""]), 1);
            assert_eq!(log.count_containing(&["setSessionStatus", "\"passed\""]), 0);
            assert_eq!(log.count("screenshot"), 1);
            assert_eq!(log.count("quit"), 1);
            assert!(dir.path().join("error_screenshot_Chrome.png").exists());
            // Write path is never reached
            assert_eq!(log.count("click"), 0);
        }

        #[test]
        fn test_sync_skipped_without_doc_id() {
            let dir = tempfile::tempdir().unwrap();
            let settings = RunSettings::new().with_artifacts_dir(dir.path());
            let runner = runner(MockPage::new(), settings);

            let result = runner.run(&chrome());

            assert!(result.passed, "unexpected failure: {:?}", result.error);
            let log = runner.factory().log();
            assert_eq!(log.count_containing(&["setSessionStatus", "\"passed\""]), 1);
            assert_eq!(log.count_containing(&["setSessionStatus", "\"failed\""]), 0);
            assert_eq!(log.count("quit"), 1);
            assert!(dir.path().join("test_screenshot_Chrome.png").exists());
        }

        #[test]
        fn test_connect_failure_has_no_screenshot_or_report() {
            let runner =
                ScenarioRunner::with_clock(MockGrid::refusing(), FakeClock::new(), RunSettings::new());
            let result = runner.run(&chrome());
            assert!(!result.passed);
            assert!(result.error.unwrap().contains("401"));
            let log = runner.factory().log();
            assert_eq!(log.count("screenshot"), 0);
            assert_eq!(log.count("execute:"), 0);
            assert_eq!(log.count("quit"), 0);
        }

        #[test]
        fn test_missing_input_is_fatal() {
            let dir = tempfile::tempdir().unwrap();
            let settings = RunSettings::new().with_artifacts_dir(dir.path());
            let runner = runner(MockPage::new().without_input(), settings);

            let result = runner.run(&chrome());

            assert!(!result.passed);
            assert!(result.error.unwrap().contains("What needs to be done"));
            let log = runner.factory().log();
            assert_eq!(log.count_containing(&["setSessionStatus", "\"failed\""]), 1);
            assert_eq!(log.count_containing(&["setSessionStatus", "\"passed\""]), 0);
            assert_eq!(log.count("quit"), 1);
            assert_eq!(log.count("click"), 0);
        }

        #[test]
        fn test_missing_add_button_is_fatal() {
            let dir = tempfile::tempdir().unwrap();
            let settings = RunSettings::new().with_artifacts_dir(dir.path());
            let runner = runner(MockPage::new().without_add_button(), settings);
            let result = runner.run(&chrome());
            assert!(!result.passed);
            assert!(result.error.unwrap().contains("Add Task"));
            assert_eq!(runner.factory().log().count("quit"), 1);
        }

        #[test]
        fn test_missing_counter_is_not_fatal() {
            let dir = tempfile::tempdir().unwrap();
            let settings = RunSettings::new().with_artifacts_dir(dir.path());
            let runner = runner(MockPage::new().without_counter(), settings);
            assert!(runner.run(&chrome()).passed);
        }

        #[test]
        fn test_disabled_input_is_not_fatal() {
            let dir = tempfile::tempdir().unwrap();
            let settings = RunSettings::new().with_artifacts_dir(dir.path());
            let runner = runner(MockPage::new().with_disabled_input(), settings);
            assert!(runner.run(&chrome()).passed);
        }

        #[test]
        fn test_page_never_loading_is_fatal() {
            let dir = tempfile::tempdir().unwrap();
            let settings = RunSettings::new().with_artifacts_dir(dir.path());
            let runner = runner(MockPage::new().with_ready_state("loading"), settings);
            let result = runner.run(&chrome());
            assert!(!result.passed);
            assert!(result.error.unwrap().contains("document ready"));
            assert_eq!(runner.factory().log().count("quit"), 1);
        }

        #[test]
        fn test_task_not_created_is_fatal() {
            let dir = tempfile::tempdir().unwrap();
            let settings = RunSettings::new().with_artifacts_dir(dir.path());
            let runner = runner(MockPage::new().ignoring_submissions(), settings);
            let result = runner.run(&chrome());
            assert!(!result.passed);
            assert!(result.error.unwrap().contains("BrowserStack Test - Run local#0"));
        }

        #[test]
        fn test_screenshot_failure_does_not_change_outcome() {
            let dir = tempfile::tempdir().unwrap();
            let settings = RunSettings::new().with_artifacts_dir(dir.path());
            let runner = runner(MockPage::new().with_failing_screenshot(), settings);
            assert!(runner.run(&chrome()).passed);
            assert!(!dir.path().join("test_screenshot_Chrome.png").exists());
        }

        #[test]
        fn test_quit_failure_does_not_change_outcome() {
            let dir = tempfile::tempdir().unwrap();
            let settings = RunSettings::new().with_artifacts_dir(dir.path());
            let runner = runner(MockPage::new().with_failing_quit(), settings);
            assert!(runner.run(&chrome()).passed);
            assert_eq!(runner.factory().log().count("quit"), 1);
        }

        #[test]
        fn test_capabilities_carry_run_number() {
            let dir = tempfile::tempdir().unwrap();
            let settings = RunSettings::new()
                .with_run("999", "57")
                .with_artifacts_dir(dir.path());
            let runner = runner(MockPage::new(), settings);
            runner.run(&chrome());
            let caps = runner.factory().connections();
            assert_eq!(caps.len(), 1);
            assert_eq!(caps[0].metadata.build_name(), "Ditto JavaScript Web Build #57");
        }
    }
}
