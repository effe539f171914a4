//! Tasksync Smoke: cross-browser smoke tests for the Ditto Tasks web app
//!
//! Opens one remote browser session per configuration on a WebDriver grid,
//! checks that the app renders, waits for a document seeded in the cloud to
//! sync into the task list, adds a task through the UI and reports the
//! outcome back to the grid.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                   TASKSYNC-SMOKE Architecture                    │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Browser    │    │ Scenario   │    │ Remote     │            │
//! │   │ Matrix     │───►│ Runner     │───►│ Grid       │            │
//! │   │ (suite)    │    │ (+ sync)   │    │ (webdriver)│            │
//! │   └────────────┘    └────────────┘    └────────────┘            │
//! │                           │                                     │
//! │                     ┌─────┴──────┐                              │
//! │                     │ Wait/Clock │                              │
//! │                     └────────────┘                              │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

/// Browser configurations and grid capabilities
pub mod capabilities;

/// Time sources for bounded waits
pub mod clock;

/// Browser session trait and scoped release
pub mod driver;

/// Scripted sessions for tests without a grid
pub mod mock;

mod result;

/// Scenario runner and run settings
pub mod scenario;

/// DOM selectors for the Tasks app
pub mod selectors;

/// Grid status side channel
pub mod status;

/// Aggregation across the browser matrix
pub mod suite;

/// Sync-wait poller
pub mod sync;

/// Bounded polling primitive
pub mod wait;

/// Remote WebDriver grid
#[cfg(feature = "webdriver")]
pub mod webdriver;

pub use capabilities::{BrowserConfig, BrowserMatrix, Capabilities, SessionMetadata};
pub use clock::{Clock, FakeClock, SystemClock};
pub use driver::{BrowserSession, ElementHandle, Locator, ScopedSession, SessionFactory};
pub use result::{SmokeError, SmokeResult};
pub use scenario::{RunSettings, ScenarioResult, ScenarioRunner, Timeouts};
pub use suite::{run_suite, run_suite_with, SuiteReport};
pub use sync::{match_key, wait_for_sync, SyncTarget};
pub use wait::{poll_until, wait_for, WaitOptions, WaitResult};
#[cfg(feature = "webdriver")]
pub use webdriver::{RemoteGrid, WebDriverSession};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::capabilities::*;
    pub use super::clock::*;
    pub use super::driver::*;
    pub use super::result::*;
    pub use super::scenario::*;
    pub use super::status::*;
    pub use super::suite::*;
    pub use super::sync::*;
    pub use super::wait::*;
    #[cfg(feature = "webdriver")]
    pub use super::webdriver::*;
}
