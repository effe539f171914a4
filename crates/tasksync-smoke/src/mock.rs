//! Scripted in-memory sessions for testing scenarios without a grid.
//!
//! [`MockPage`] describes what the Tasks app looks like; [`MockSession`]
//! answers queries against it and records every command in a shared
//! [`CallLog`] that outlives the session.

use crate::capabilities::Capabilities;
use crate::driver::{BrowserSession, ElementHandle, Locator, SessionFactory};
use crate::result::{SmokeError, SmokeResult};
use crate::selectors;
use std::sync::{Arc, Mutex, PoisonError};

/// Shared record of commands issued to mock sessions
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    /// Create an empty log
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, entry: impl Into<String>) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry.into());
    }

    /// Copy of all entries in call order
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Number of entries starting with `prefix`
    #[must_use]
    pub fn count(&self, prefix: &str) -> usize {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| e.starts_with(prefix))
            .count()
    }

    /// Number of entries containing every one of `needles`
    #[must_use]
    pub fn count_containing(&self, needles: &[&str]) -> usize {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| needles.iter().all(|n| e.contains(n)))
            .count()
    }
}

/// One row in the rendered task list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockRow {
    /// Label text; `None` makes text reads fail
    pub text: Option<String>,
    /// Number of list queries that miss the row before it is rendered
    pub visible_after: u32,
}

impl MockRow {
    /// A readable row that is rendered from the start
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            visible_after: 0,
        }
    }

    /// A row whose text cannot be read
    #[must_use]
    pub const fn unreadable() -> Self {
        Self {
            text: None,
            visible_after: 0,
        }
    }

    /// Only render the row after `queries` list queries
    #[must_use]
    pub const fn visible_after(mut self, queries: u32) -> Self {
        self.visible_after = queries;
        self
    }
}

/// Scripted state of the Tasks app
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockPage {
    /// Value returned for `document.readyState`
    pub ready_state: String,
    /// Whether the task input is present
    pub has_input: bool,
    /// Whether the task input is enabled
    pub input_enabled: bool,
    /// Whether the Add Task button is present
    pub has_add_button: bool,
    /// Whether the items counter is present
    pub has_counter: bool,
    /// Rows in the task list
    pub rows: Vec<MockRow>,
    /// Whether clicking Add Task renders the typed label
    pub reflect_submissions: bool,
    /// Number of leading task-list queries that fail
    pub failing_row_queries: u32,
    /// Whether screenshots fail
    pub screenshot_fails: bool,
    /// Whether quit fails
    pub quit_fails: bool,
}

impl Default for MockPage {
    fn default() -> Self {
        Self {
            ready_state: "complete".to_string(),
            has_input: true,
            input_enabled: true,
            has_add_button: true,
            has_counter: true,
            rows: Vec::new(),
            reflect_submissions: true,
            failing_row_queries: 0,
            screenshot_fails: false,
            quit_fails: false,
        }
    }
}

impl MockPage {
    /// A loaded, healthy page with an empty task list
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `document.readyState`
    #[must_use]
    pub fn with_ready_state(mut self, state: impl Into<String>) -> Self {
        self.ready_state = state.into();
        self
    }

    /// Replace the task list
    #[must_use]
    pub fn with_rows(mut self, rows: Vec<MockRow>) -> Self {
        self.rows = rows;
        self
    }

    /// Keep the task input disabled
    #[must_use]
    pub const fn with_disabled_input(mut self) -> Self {
        self.input_enabled = false;
        self
    }

    /// Remove the task input
    #[must_use]
    pub const fn without_input(mut self) -> Self {
        self.has_input = false;
        self
    }

    /// Remove the Add Task button
    #[must_use]
    pub const fn without_add_button(mut self) -> Self {
        self.has_add_button = false;
        self
    }

    /// Remove the items counter
    #[must_use]
    pub const fn without_counter(mut self) -> Self {
        self.has_counter = false;
        self
    }

    /// Ignore Add Task clicks
    #[must_use]
    pub const fn ignoring_submissions(mut self) -> Self {
        self.reflect_submissions = false;
        self
    }

    /// Fail the first `count` task-list queries
    #[must_use]
    pub const fn with_failing_row_queries(mut self, count: u32) -> Self {
        self.failing_row_queries = count;
        self
    }

    /// Make screenshots fail
    #[must_use]
    pub const fn with_failing_screenshot(mut self) -> Self {
        self.screenshot_fails = true;
        self
    }

    /// Make quit fail
    #[must_use]
    pub const fn with_failing_quit(mut self) -> Self {
        self.quit_fails = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    Row(usize),
    Input,
    AddButton,
    Counter,
}

/// Session answering from a [`MockPage`]
#[derive(Debug)]
pub struct MockSession {
    page: MockPage,
    typed: String,
    row_queries: u32,
    handles: Vec<Target>,
    log: CallLog,
}

impl MockSession {
    /// Session with its own call log
    #[must_use]
    pub fn new(page: MockPage) -> Self {
        Self::with_log(page, CallLog::new())
    }

    /// Session recording into an existing log
    #[must_use]
    pub fn with_log(page: MockPage, log: CallLog) -> Self {
        Self {
            page,
            typed: String::new(),
            row_queries: 0,
            handles: Vec::new(),
            log,
        }
    }

    /// Handle to this session's call log
    #[must_use]
    pub fn log(&self) -> CallLog {
        self.log.clone()
    }

    fn handle(&mut self, target: Target, locator: &Locator) -> ElementHandle {
        self.handles.push(target);
        ElementHandle::new(self.handles.len() - 1, locator.clone())
    }

    fn target(&self, element: &ElementHandle) -> SmokeResult<Target> {
        self.handles
            .get(element.id)
            .cloned()
            .ok_or_else(|| SmokeError::command(format!("stale element {}", element.id)))
    }

    fn visible_rows(&self) -> Vec<usize> {
        self.page
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| self.row_queries > row.visible_after)
            .map(|(i, _)| i)
            .collect()
    }
}

impl BrowserSession for MockSession {
    fn navigate(&mut self, url: &str) -> SmokeResult<()> {
        self.log.push(format!("navigate:{url}"));
        Ok(())
    }

    fn execute_script(&mut self, script: &str) -> SmokeResult<serde_json::Value> {
        self.log.push(format!("execute:{script}"));
        if script == "return document.readyState" {
            return Ok(serde_json::Value::from(self.page.ready_state.clone()));
        }
        Ok(serde_json::Value::Null)
    }

    fn find_all(&mut self, locator: &Locator) -> SmokeResult<Vec<ElementHandle>> {
        let targets = match locator {
            Locator::Css(s) if s == selectors::TASK_ROW_LABEL => {
                self.row_queries += 1;
                if self.row_queries <= self.page.failing_row_queries {
                    return Err(SmokeError::command("stale element reference"));
                }
                self.visible_rows().into_iter().map(Target::Row).collect()
            }
            Locator::Css(s) if s == selectors::TASK_INPUT && self.page.has_input => {
                vec![Target::Input]
            }
            Locator::XPath(s) if s == selectors::ADD_TASK_BUTTON && self.page.has_add_button => {
                vec![Target::AddButton]
            }
            Locator::XPath(s) if s == selectors::ITEMS_COUNTER => {
                if self.page.has_counter {
                    vec![Target::Counter]
                } else {
                    Vec::new()
                }
            }
            Locator::XPath(s) => match selectors::contained_text(s) {
                Some(text) => self
                    .page
                    .rows
                    .iter()
                    .enumerate()
                    .filter(|(_, row)| row.text.as_deref().is_some_and(|t| t.contains(text)))
                    .map(|(i, _)| Target::Row(i))
                    .collect(),
                None => Vec::new(),
            },
            Locator::Css(_) => Vec::new(),
        };
        Ok(targets
            .into_iter()
            .map(|t| self.handle(t, locator))
            .collect())
    }

    fn text(&mut self, element: &ElementHandle) -> SmokeResult<String> {
        match self.target(element)? {
            Target::Row(i) => self
                .page
                .rows
                .get(i)
                .and_then(|row| row.text.clone())
                .ok_or_else(|| SmokeError::command("stale element reference")),
            Target::Input => Ok(String::new()),
            Target::AddButton => Ok("Add Task".to_string()),
            Target::Counter => Ok(format!("{} items left", self.page.rows.len())),
        }
    }

    fn is_enabled(&mut self, element: &ElementHandle) -> SmokeResult<bool> {
        match self.target(element)? {
            Target::Input => Ok(self.page.input_enabled),
            _ => Ok(true),
        }
    }

    fn clear(&mut self, element: &ElementHandle) -> SmokeResult<()> {
        self.target(element)?;
        self.log.push("clear");
        self.typed.clear();
        Ok(())
    }

    fn send_keys(&mut self, element: &ElementHandle, text: &str) -> SmokeResult<()> {
        self.target(element)?;
        self.log.push(format!("send_keys:{text}"));
        self.typed.push_str(text);
        Ok(())
    }

    fn click(&mut self, element: &ElementHandle) -> SmokeResult<()> {
        let target = self.target(element)?;
        self.log.push("click");
        if target == Target::AddButton && self.page.reflect_submissions && !self.typed.is_empty() {
            let label = std::mem::take(&mut self.typed);
            self.page.rows.push(MockRow::new(label));
        }
        Ok(())
    }

    fn screenshot(&mut self) -> SmokeResult<Vec<u8>> {
        self.log.push("screenshot");
        if self.page.screenshot_fails {
            return Err(SmokeError::command("screenshot unavailable"));
        }
        Ok(b"\x89PNG\r\n\x1a\n".to_vec())
    }

    fn quit(&mut self) -> SmokeResult<()> {
        self.log.push("quit");
        if self.page.quit_fails {
            return Err(SmokeError::command("session already gone"));
        }
        Ok(())
    }
}

/// Factory handing out [`MockSession`]s over one shared log
#[derive(Debug)]
pub struct MockGrid {
    page: MockPage,
    log: CallLog,
    refuse: bool,
    connected: Mutex<Vec<Capabilities>>,
}

impl MockGrid {
    /// Grid whose sessions all start from `page`
    #[must_use]
    pub fn new(page: MockPage) -> Self {
        Self {
            page,
            log: CallLog::new(),
            refuse: false,
            connected: Mutex::new(Vec::new()),
        }
    }

    /// Grid that rejects every session request
    #[must_use]
    pub fn refusing() -> Self {
        let mut grid = Self::new(MockPage::new());
        grid.refuse = true;
        grid
    }

    /// Shared call log of all sessions
    #[must_use]
    pub fn log(&self) -> CallLog {
        self.log.clone()
    }

    /// Capabilities of every connection attempt, in order
    #[must_use]
    pub fn connections(&self) -> Vec<Capabilities> {
        self.connected
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SessionFactory for MockGrid {
    type Session = MockSession;

    fn connect(&self, capabilities: &Capabilities) -> SmokeResult<MockSession> {
        self.connected
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(capabilities.clone());
        self.log.push("connect");
        if self.refuse {
            return Err(SmokeError::SessionStart {
                message: "401 Unauthorized".to_string(),
            });
        }
        Ok(MockSession::with_log(self.page.clone(), self.log.clone()))
    }
}
