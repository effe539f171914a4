//! Remote WebDriver grid sessions.
//!
//! The W3C client is async; every command here is driven to completion on a
//! current-thread tokio runtime shared by all sessions of one grid, so the
//! scenario code above stays blocking. Each command is bounded by a timeout
//! so a hung grid cannot stall a polling loop past its deadline.

use crate::capabilities::Capabilities;
use crate::driver::{BrowserSession, ElementHandle, Locator, SessionFactory};
use crate::result::{SmokeError, SmokeResult};
use fantoccini::elements::Element;
use fantoccini::{Client, ClientBuilder};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, info};

/// BrowserStack hub host and path
pub const DEFAULT_HUB: &str = "hub.browserstack.com/wd/hub";

/// Environment variable holding the grid user name
pub const USERNAME_VAR: &str = "BROWSERSTACK_USERNAME";

/// Environment variable holding the grid access key
pub const ACCESS_KEY_VAR: &str = "BROWSERSTACK_ACCESS_KEY";

/// Upper bound for a single WebDriver command
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound for session creation, which includes grid queueing
pub const SESSION_START_TIMEOUT: Duration = Duration::from_secs(120);

/// Drive `future` on `runtime`, giving up after `limit`.
///
/// The outer error is the timeout; the inner result is the command's own.
fn bounded<T, E, F>(
    runtime: &Runtime,
    limit: Duration,
    command: &str,
    future: F,
) -> SmokeResult<Result<T, E>>
where
    F: Future<Output = Result<T, E>>,
{
    // The timer must be created inside the runtime.
    runtime
        .block_on(async move { tokio::time::timeout(limit, future).await })
        .map_err(|_| SmokeError::timeout(limit.as_millis() as u64, command))
}

/// Elements found in one session.
///
/// A new query with the same locator replaces the previous results, so
/// repeated polling does not accumulate stale handles.
#[derive(Debug)]
struct ElementTable<E> {
    next_id: usize,
    entries: HashMap<usize, (Locator, E)>,
}

impl<E> ElementTable<E> {
    fn new() -> Self {
        Self {
            next_id: 0,
            entries: HashMap::new(),
        }
    }

    fn replace(&mut self, locator: &Locator, found: Vec<E>) -> Vec<ElementHandle> {
        self.entries.retain(|_, (known, _)| known != locator);
        found
            .into_iter()
            .map(|element| {
                let id = self.next_id;
                self.next_id += 1;
                self.entries.insert(id, (locator.clone(), element));
                ElementHandle::new(id, locator.clone())
            })
            .collect()
    }

    fn get(&self, handle: &ElementHandle) -> Option<&E> {
        self.entries.get(&handle.id).map(|(_, element)| element)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Session factory for an authenticated remote grid
pub struct RemoteGrid {
    hub: String,
    username: Option<String>,
    access_key: Option<String>,
    command_timeout: Duration,
    runtime: Arc<Runtime>,
}

impl RemoteGrid {
    /// Grid at [`DEFAULT_HUB`] with the given credentials.
    ///
    /// Missing credentials are accepted here and reported when a session is
    /// requested.
    pub fn new(username: Option<String>, access_key: Option<String>) -> SmokeResult<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(Self {
            hub: DEFAULT_HUB.to_string(),
            username: username.filter(|s| !s.is_empty()),
            access_key: access_key.filter(|s| !s.is_empty()),
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            runtime: Arc::new(runtime),
        })
    }

    /// Grid configured from `BROWSERSTACK_USERNAME` / `BROWSERSTACK_ACCESS_KEY`
    pub fn from_env() -> SmokeResult<Self> {
        Self::new(
            std::env::var(USERNAME_VAR).ok(),
            std::env::var(ACCESS_KEY_VAR).ok(),
        )
    }

    /// Use a different hub (`host/path`, optionally with a scheme)
    #[must_use]
    pub fn with_hub(mut self, hub: impl Into<String>) -> Self {
        self.hub = hub.into();
        self
    }

    /// Bound every WebDriver command of this grid's sessions by `timeout`
    #[must_use]
    pub const fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Hub address without credentials, safe to log
    #[must_use]
    pub fn hub(&self) -> &str {
        &self.hub
    }

    /// Authenticated WebDriver endpoint
    pub fn endpoint(&self) -> SmokeResult<String> {
        let username = self
            .username
            .as_deref()
            .ok_or(SmokeError::MissingCredentials {
                variable: USERNAME_VAR,
            })?;
        let access_key = self
            .access_key
            .as_deref()
            .ok_or(SmokeError::MissingCredentials {
                variable: ACCESS_KEY_VAR,
            })?;
        let (scheme, rest) = self.hub.split_once("://").unwrap_or(("https", &self.hub));
        Ok(format!("{scheme}://{username}:{access_key}@{rest}"))
    }
}

impl fmt::Debug for RemoteGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteGrid")
            .field("hub", &self.hub)
            .field("username", &self.username)
            .field("access_key", &self.access_key.as_ref().map(|_| "***"))
            .field("command_timeout", &self.command_timeout)
            .finish_non_exhaustive()
    }
}

impl SessionFactory for RemoteGrid {
    type Session = WebDriverSession;

    fn connect(&self, capabilities: &Capabilities) -> SmokeResult<WebDriverSession> {
        let endpoint = self.endpoint()?;
        debug!(hub = %self.hub, session = %capabilities.session_name(), "requesting session");

        let mut builder = ClientBuilder::rustls();
        builder.capabilities(capabilities.to_map());
        let client = bounded(
            &self.runtime,
            SESSION_START_TIMEOUT,
            "session start",
            builder.connect(&endpoint),
        )
        .map_err(|e| SmokeError::SessionStart {
            message: e.to_string(),
        })?
        .map_err(|e| SmokeError::SessionStart {
            message: e.to_string(),
        })?;

        info!(browser = %capabilities.browser, "remote session started");
        Ok(WebDriverSession {
            client,
            runtime: Arc::clone(&self.runtime),
            command_timeout: self.command_timeout,
            elements: ElementTable::new(),
            closed: false,
        })
    }
}

/// A live session on the remote grid
pub struct WebDriverSession {
    client: Client,
    runtime: Arc<Runtime>,
    command_timeout: Duration,
    elements: ElementTable<Element>,
    closed: bool,
}

impl WebDriverSession {
    fn client(&self) -> SmokeResult<&Client> {
        if self.closed {
            return Err(SmokeError::SessionReleased);
        }
        Ok(&self.client)
    }

    fn element(&self, handle: &ElementHandle) -> SmokeResult<&Element> {
        if self.closed {
            return Err(SmokeError::SessionReleased);
        }
        self.elements
            .get(handle)
            .ok_or_else(|| SmokeError::command(format!("unknown element {}", handle.id)))
    }

    fn run<T, E, F>(&self, command: &str, future: F) -> SmokeResult<T>
    where
        E: fmt::Display,
        F: Future<Output = Result<T, E>>,
    {
        bounded(&self.runtime, self.command_timeout, command, future)?
            .map_err(|e| SmokeError::command(format!("{command}: {e}")))
    }
}

impl fmt::Debug for WebDriverSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebDriverSession")
            .field("elements", &self.elements.len())
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl BrowserSession for WebDriverSession {
    fn navigate(&mut self, url: &str) -> SmokeResult<()> {
        let client = self.client()?;
        bounded(&self.runtime, self.command_timeout, "navigate", client.goto(url))?.map_err(
            |e| SmokeError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            },
        )
    }

    fn execute_script(&mut self, script: &str) -> SmokeResult<serde_json::Value> {
        let client = self.client()?;
        self.run("execute", client.execute(script, Vec::new()))
    }

    fn find_all(&mut self, locator: &Locator) -> SmokeResult<Vec<ElementHandle>> {
        let query = match locator {
            Locator::Css(s) => fantoccini::Locator::Css(s),
            Locator::XPath(s) => fantoccini::Locator::XPath(s),
        };
        let client = self.client()?;
        let found = self.run("find elements", client.find_all(query))?;
        Ok(self.elements.replace(locator, found))
    }

    fn text(&mut self, element: &ElementHandle) -> SmokeResult<String> {
        let element = self.element(element)?;
        self.run("element text", element.text())
    }

    fn is_enabled(&mut self, element: &ElementHandle) -> SmokeResult<bool> {
        let element = self.element(element)?;
        self.run("element enabled", element.is_enabled())
    }

    fn clear(&mut self, element: &ElementHandle) -> SmokeResult<()> {
        let element = self.element(element)?;
        self.run("clear", element.clear())
    }

    fn send_keys(&mut self, element: &ElementHandle, text: &str) -> SmokeResult<()> {
        let element = self.element(element)?;
        self.run("send keys", element.send_keys(text))
    }

    fn click(&mut self, element: &ElementHandle) -> SmokeResult<()> {
        let element = self.element(element)?;
        self.run("click", element.click())
    }

    fn screenshot(&mut self) -> SmokeResult<Vec<u8>> {
        let client = self.client()?;
        self.run("screenshot", client.screenshot())
    }

    fn quit(&mut self) -> SmokeResult<()> {
        if self.closed {
            return Err(SmokeError::SessionReleased);
        }
        self.closed = true;
        self.elements.clear();
        self.run("quit", self.client.clone().close())
    }
}
