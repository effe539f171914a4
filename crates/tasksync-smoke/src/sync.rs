//! Sync-Wait Poller
//!
//! Waits for a document seeded in the cloud to show up in the rendered task
//! list. Sync latency is unpredictable, so the list is rescanned once a second
//! until a matching row appears or the deadline passes.
//!
//! A row matches when its label contains both the run id taken from the
//! document identifier and the [`CLASS_MARKER`] carried by every seeded
//! document.

use crate::clock::Clock;
use crate::driver::{BrowserSession, Locator};
use crate::selectors;
use crate::wait::{poll_until, WaitOptions, WaitResult};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Literal text present in every seeded test document's title
pub const CLASS_MARKER: &str = "GitHub Test Task";

/// Interval between task-list scans (1 second)
pub const SYNC_POLL_INTERVAL_MS: u64 = 1_000;

/// Default deadline for the sync wait (30 seconds)
pub const DEFAULT_SYNC_TIMEOUT_MS: u64 = 30_000;

/// Derive the match key from a document identifier.
///
/// Identifiers look like `<prefix>_<run-id>_<run-sequence>`; the key is the
/// second underscore-delimited field. Identifiers with fewer than three fields
/// are used whole.
#[must_use]
pub fn match_key(identifier: &str) -> &str {
    let mut fields = identifier.split('_');
    match (fields.next(), fields.next(), fields.next()) {
        (Some(_), Some(key), Some(_)) => key,
        _ => identifier,
    }
}

/// A seeded document to wait for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncTarget {
    doc_id: String,
    key: String,
}

impl SyncTarget {
    /// Target for a document identifier
    #[must_use]
    pub fn new(doc_id: impl Into<String>) -> Self {
        let doc_id = doc_id.into();
        let key = match_key(&doc_id).to_string();
        Self { doc_id, key }
    }

    /// The full document identifier
    #[must_use]
    pub fn doc_id(&self) -> &str {
        &self.doc_id
    }

    /// The substring searched for in row labels
    #[must_use]
    pub fn match_key(&self) -> &str {
        &self.key
    }

    /// Whether a row label belongs to this document
    #[must_use]
    pub fn matches(&self, label: &str) -> bool {
        let label = label.trim();
        label.contains(self.key.as_str()) && label.contains(CLASS_MARKER)
    }
}

/// Scan the task list once and return the first matching label.
///
/// A failed query counts as an empty list and a failed text read skips that
/// row; neither is reported to the caller.
pub fn scan_rows<S: BrowserSession + ?Sized>(session: &mut S, target: &SyncTarget) -> Option<String> {
    let rows = match session.find_all(&Locator::css(selectors::TASK_ROW_LABEL)) {
        Ok(rows) => rows,
        Err(e) => {
            debug!(error = %e, "task list query failed");
            return None;
        }
    };

    for row in &rows {
        match session.text(row) {
            Ok(label) if target.matches(&label) => return Some(label.trim().to_string()),
            Ok(_) => {}
            Err(e) => debug!(row = row.id, error = %e, "skipping unreadable row"),
        }
    }
    None
}

/// Poll the task list for `target` with explicit wait options.
pub fn wait_for_sync_with<S, C>(
    session: &mut S,
    clock: &C,
    target: &SyncTarget,
    options: &WaitOptions,
) -> WaitResult
where
    S: BrowserSession + ?Sized,
    C: Clock + ?Sized,
{
    info!(
        doc_id = target.doc_id(),
        key = target.match_key(),
        "waiting for document to sync"
    );

    let mut found = None;
    let result = poll_until(clock, options, format!("synced document {}", target.doc_id()), || {
        found = scan_rows(session, target);
        found.is_some()
    });

    if let Some(label) = found {
        info!(
            label = %label,
            elapsed_ms = result.elapsed.as_millis() as u64,
            "found synced document"
        );
    } else {
        warn!(
            doc_id = target.doc_id(),
            timeout_ms = options.timeout_ms,
            "document not found before deadline"
        );
    }
    result
}

/// Poll the task list once a second until `target` shows up.
///
/// Returns true on the first matching row and false once `max_wait` has
/// elapsed without one.
pub fn wait_for_sync<S, C>(session: &mut S, clock: &C, target: &SyncTarget, max_wait: Duration) -> bool
where
    S: BrowserSession + ?Sized,
    C: Clock + ?Sized,
{
    let options = WaitOptions::new()
        .with_timeout(max_wait.as_millis() as u64)
        .with_poll_interval(SYNC_POLL_INTERVAL_MS);
    wait_for_sync_with(session, clock, target, &options).success
}
