//! Browser configurations and the capability descriptors sent to the grid.

use crate::result::{SmokeError, SmokeResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use std::path::Path;

/// Project name shown on the grid dashboard
pub const PROJECT_NAME: &str = "Ditto JavaScript Web";

/// Name set on each session once it is open
pub const SESSION_DISPLAY_NAME: &str = "Ditto Tasks Web Test";

/// One browser/platform target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Browser name, e.g. `Chrome`
    pub browser: String,
    /// Browser version, e.g. `120.0`
    pub browser_version: String,
    /// Operating system family, e.g. `Windows`
    pub os: String,
    /// Operating system version, e.g. `11`
    pub os_version: String,
}

impl BrowserConfig {
    /// Create a browser configuration
    #[must_use]
    pub fn new(
        browser: impl Into<String>,
        browser_version: impl Into<String>,
        os: impl Into<String>,
        os_version: impl Into<String>,
    ) -> Self {
        Self {
            browser: browser.into(),
            browser_version: browser_version.into(),
            os: os.into(),
            os_version: os_version.into(),
        }
    }

    /// `Chrome 120.0`
    #[must_use]
    pub fn browser_label(&self) -> String {
        format!("{} {}", self.browser, self.browser_version)
    }

    /// `Windows 11`
    #[must_use]
    pub fn os_label(&self) -> String {
        format!("{} {}", self.os, self.os_version)
    }

    /// W3C `browserName`; browsers the grid does not know fall back to chrome
    #[must_use]
    pub fn webdriver_browser_name(&self) -> &'static str {
        match self.browser.to_lowercase().as_str() {
            "firefox" => "firefox",
            _ => "chrome",
        }
    }
}

impl fmt::Display for BrowserConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on {}", self.browser_label(), self.os_label())
    }
}

/// Ordered list of browser configurations to run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserMatrix {
    /// Configurations in run order
    pub browsers: Vec<BrowserConfig>,
}

impl Default for BrowserMatrix {
    fn default() -> Self {
        Self {
            browsers: vec![
                BrowserConfig::new("Chrome", "120.0", "Windows", "11"),
                BrowserConfig::new("Firefox", "121.0", "Windows", "11"),
            ],
        }
    }
}

impl BrowserMatrix {
    /// Parse a matrix from YAML
    ///
    /// ```yaml
    /// browsers:
    ///   - browser: Chrome
    ///     browser_version: "120.0"
    ///     os: Windows
    ///     os_version: "11"
    /// ```
    pub fn from_yaml(yaml: &str) -> SmokeResult<Self> {
        let matrix: Self = serde_yaml_ng::from_str(yaml).map_err(|e| SmokeError::Matrix {
            message: e.to_string(),
        })?;
        if matrix.browsers.is_empty() {
            return Err(SmokeError::Matrix {
                message: "no browsers listed".to_string(),
            });
        }
        Ok(matrix)
    }

    /// Load a matrix from a YAML file
    pub fn load(path: &Path) -> SmokeResult<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    /// Number of configurations
    #[must_use]
    pub fn len(&self) -> usize {
        self.browsers.len()
    }

    /// Whether the matrix is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.browsers.is_empty()
    }
}

/// Per-run metadata attached to every session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMetadata {
    /// CI build number used in the build name
    pub run_number: String,
    /// Route traffic through the local tunnel
    pub local: bool,
}

impl SessionMetadata {
    /// Metadata for a run number, with the local tunnel enabled
    #[must_use]
    pub fn new(run_number: impl Into<String>) -> Self {
        Self {
            run_number: run_number.into(),
            local: true,
        }
    }

    /// Build name shown on the grid dashboard
    #[must_use]
    pub fn build_name(&self) -> String {
        format!("{PROJECT_NAME} Build #{}", self.run_number)
    }
}

/// Capability descriptor for a new session
#[derive(Debug, Clone, PartialEq)]
pub struct Capabilities {
    /// Target browser
    pub browser: BrowserConfig,
    /// Run metadata
    pub metadata: SessionMetadata,
}

impl Capabilities {
    /// Combine a browser configuration with run metadata
    #[must_use]
    pub fn new(browser: BrowserConfig, metadata: SessionMetadata) -> Self {
        Self { browser, metadata }
    }

    /// Human-readable session name
    #[must_use]
    pub fn session_name(&self) -> String {
        format!("Ditto Tasks Test - {}", self.browser.browser_label())
    }

    /// Vendor options object (`bstack:options`)
    #[must_use]
    pub fn grid_options(&self) -> Value {
        json!({
            "browserVersion": self.browser.browser_version,
            "os": self.browser.os,
            "osVersion": self.browser.os_version,
            "sessionName": self.session_name(),
            "buildName": self.metadata.build_name(),
            "projectName": PROJECT_NAME,
            "local": self.metadata.local.to_string(),
            "debug": "true",
            "video": "true",
            "networkLogs": "true",
            "consoleLogs": "info",
        })
    }

    /// Full W3C capability map
    #[must_use]
    pub fn to_map(&self) -> Map<String, Value> {
        let mut caps = Map::new();
        caps.insert(
            "browserName".to_string(),
            Value::from(self.browser.webdriver_browser_name()),
        );
        caps.insert("bstack:options".to_string(), self.grid_options());
        caps
    }
}
