//! Wait Mechanisms
//!
//! Bounded, fixed-interval polling used for every wait in a scenario: the
//! document-ready wait, the input-enabled wait, the sync poller and the
//! post-submit appearance check.
//!
//! The loop knows nothing about browsers. It evaluates a predicate, returns as
//! soon as it holds, and otherwise sleeps one interval on the supplied
//! [`Clock`] until the deadline has elapsed.

use crate::clock::Clock;
use crate::result::{SmokeError, SmokeResult};
use std::time::Duration;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default timeout for wait operations (30 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 30_000;

/// Default polling interval for explicit waits (500ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

// =============================================================================
// WAIT OPTIONS
// =============================================================================

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

// =============================================================================
// WAIT RESULT
// =============================================================================

/// Result of a wait operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitResult {
    /// Whether the wait was successful
    pub success: bool,
    /// Time spent waiting
    pub elapsed: Duration,
    /// Number of times the predicate was evaluated
    pub attempts: u32,
    /// Description of what was waited for
    pub waited_for: String,
}

impl WaitResult {
    /// Create a successful wait result
    #[must_use]
    pub fn success(elapsed: Duration, attempts: u32, waited_for: impl Into<String>) -> Self {
        Self {
            success: true,
            elapsed,
            attempts,
            waited_for: waited_for.into(),
        }
    }

    /// Create a timeout wait result
    #[must_use]
    pub fn timeout(elapsed: Duration, attempts: u32, waited_for: impl Into<String>) -> Self {
        Self {
            success: false,
            elapsed,
            attempts,
            waited_for: waited_for.into(),
        }
    }

    /// Convert a timed-out result into [`SmokeError::Timeout`]
    pub fn into_result(self, options: &WaitOptions) -> SmokeResult<Self> {
        if self.success {
            Ok(self)
        } else {
            Err(SmokeError::timeout(options.timeout_ms, self.waited_for))
        }
    }
}

// =============================================================================
// POLLING
// =============================================================================

/// Evaluate `predicate` until it returns true or the timeout elapses.
///
/// The predicate is always evaluated at least once. After a miss the loop
/// sleeps one poll interval, so a negative result is returned no later than
/// `timeout + poll_interval` after the call.
pub fn poll_until<C, F>(
    clock: &C,
    options: &WaitOptions,
    waited_for: impl Into<String>,
    mut predicate: F,
) -> WaitResult
where
    C: Clock + ?Sized,
    F: FnMut() -> bool,
{
    let start = clock.now();
    let timeout = options.timeout();
    let poll_interval = options.poll_interval();
    let mut attempts = 0_u32;

    loop {
        attempts += 1;
        if predicate() {
            return WaitResult::success(clock.now() - start, attempts, waited_for);
        }
        clock.sleep(poll_interval);
        if clock.now() - start >= timeout {
            return WaitResult::timeout(clock.now() - start, attempts, waited_for);
        }
    }
}

/// Like [`poll_until`], but a timeout is an error.
pub fn wait_for<C, F>(
    clock: &C,
    options: &WaitOptions,
    waited_for: impl Into<String>,
    predicate: F,
) -> SmokeResult<WaitResult>
where
    C: Clock + ?Sized,
    F: FnMut() -> bool,
{
    poll_until(clock, options, waited_for, predicate).into_result(options)
}

/// Convert a failed best-effort step into a logged no-op.
///
/// Returns the value on success. On error the failure is logged at `warn`
/// with `step` as context and `None` is returned.
pub fn best_effort<T, E: std::fmt::Display>(step: &str, result: Result<T, E>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(step, error = %e, "best-effort step failed");
            None
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
