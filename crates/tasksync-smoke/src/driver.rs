//! Browser session abstraction.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │  BrowserSession (trait)                                        │
//! ├───────────────────────────────────────────────────────────────┤
//! │  ┌──────────────────────┐        ┌──────────────────────┐     │
//! │  │  WebDriverSession    │        │  MockSession         │     │
//! │  │  remote grid via     │        │  scripted DOM for    │     │
//! │  │  fantoccini          │        │  unit tests          │     │
//! │  └──────────────────────┘        └──────────────────────┘     │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! Sessions are blocking: each call returns once the remote command has
//! completed. A [`ScopedSession`] owns a session for the duration of one
//! scenario and quits it exactly once, on whichever path the scenario leaves.

use crate::capabilities::Capabilities;
use crate::result::{SmokeError, SmokeResult};
use std::fmt;
use std::ops::{Deref, DerefMut};

/// How to find elements in the live DOM
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    /// CSS selector (e.g. `div.group span`)
    Css(String),
    /// XPath expression
    XPath(String),
}

impl Locator {
    /// Create a CSS locator
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create an XPath locator
    #[must_use]
    pub fn xpath(expr: impl Into<String>) -> Self {
        Self::XPath(expr.into())
    }

    /// The raw selector or expression
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Css(s) | Self::XPath(s) => s,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(s) => write!(f, "css `{s}`"),
            Self::XPath(s) => write!(f, "xpath `{s}`"),
        }
    }
}

/// Handle to an element returned by a query.
///
/// Handles are only meaningful to the session that produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle {
    /// Session-local identifier
    pub id: usize,
    /// Locator the element was found with
    pub locator: Locator,
}

impl ElementHandle {
    /// Create a new element handle
    #[must_use]
    pub const fn new(id: usize, locator: Locator) -> Self {
        Self { id, locator }
    }
}

/// A live remote browser
pub trait BrowserSession {
    /// Navigate to URL
    fn navigate(&mut self, url: &str) -> SmokeResult<()>;

    /// Execute a script in the page and return its value
    fn execute_script(&mut self, script: &str) -> SmokeResult<serde_json::Value>;

    /// Query all elements matching `locator` (possibly none)
    fn find_all(&mut self, locator: &Locator) -> SmokeResult<Vec<ElementHandle>>;

    /// Visible text of an element
    fn text(&mut self, element: &ElementHandle) -> SmokeResult<String>;

    /// Whether the element is enabled
    fn is_enabled(&mut self, element: &ElementHandle) -> SmokeResult<bool>;

    /// Clear an input element
    fn clear(&mut self, element: &ElementHandle) -> SmokeResult<()>;

    /// Type text into an element
    fn send_keys(&mut self, element: &ElementHandle, text: &str) -> SmokeResult<()>;

    /// Click an element
    fn click(&mut self, element: &ElementHandle) -> SmokeResult<()>;

    /// Capture the viewport as PNG bytes
    fn screenshot(&mut self) -> SmokeResult<Vec<u8>>;

    /// End the remote session
    fn quit(&mut self) -> SmokeResult<()>;

    /// First element matching `locator`
    fn find(&mut self, locator: &Locator) -> SmokeResult<ElementHandle> {
        self.find_all(locator)?
            .into_iter()
            .next()
            .ok_or_else(|| SmokeError::element_not_found(locator))
    }

    /// Current `document.readyState`
    fn ready_state(&mut self) -> SmokeResult<String> {
        let value = self.execute_script("return document.readyState")?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }
}

/// Creates sessions from capability descriptors
pub trait SessionFactory {
    /// Session type produced by this factory
    type Session: BrowserSession;

    /// Open a new remote session
    fn connect(&self, capabilities: &Capabilities) -> SmokeResult<Self::Session>;
}

/// Owns a session and releases it exactly once.
///
/// Either call [`ScopedSession::release`] to observe the quit result, or let
/// the guard drop; drop quits the session if it has not been released.
pub struct ScopedSession<S: BrowserSession> {
    session: S,
    released: bool,
}

impl<S: BrowserSession> ScopedSession<S> {
    /// Take ownership of an open session
    #[must_use]
    pub const fn new(session: S) -> Self {
        Self {
            session,
            released: false,
        }
    }

    /// Quit the session now and report the outcome
    pub fn release(mut self) -> SmokeResult<()> {
        self.released = true;
        self.session.quit()
    }
}

impl<S: BrowserSession> Deref for ScopedSession<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.session
    }
}

impl<S: BrowserSession> DerefMut for ScopedSession<S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut self.session
    }
}

impl<S: BrowserSession> Drop for ScopedSession<S> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(e) = self.session.quit() {
            tracing::warn!(error = %e, "failed to quit session");
        }
    }
}

impl<S: BrowserSession> fmt::Debug for ScopedSession<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedSession")
            .field("released", &self.released)
            .finish_non_exhaustive()
    }
}
