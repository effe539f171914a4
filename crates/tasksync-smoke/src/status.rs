//! Grid side-channel commands.
//!
//! BrowserStack reads `browserstack_executor:` scripts sent through the
//! normal execute-script command and applies them to the session record.

use crate::driver::BrowserSession;
use crate::result::SmokeResult;
use serde_json::json;

/// Prefix the grid recognises on executor scripts
pub const EXECUTOR_PREFIX: &str = "browserstack_executor: ";

/// Maximum characters of error text carried in a failure reason
pub const REASON_MAX_CHARS: usize = 100;

/// Final status of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Scenario passed
    Passed,
    /// Scenario failed
    Failed,
}

impl SessionStatus {
    /// Wire value
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
        }
    }
}

/// A command for the grid's executor channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridCommand {
    /// Rename the session
    SetSessionName {
        /// New name
        name: String,
    },
    /// Mark the session passed or failed
    SetSessionStatus {
        /// Outcome
        status: SessionStatus,
        /// Reason shown on the dashboard
        reason: String,
    },
}

impl GridCommand {
    /// Status command for a passing scenario
    #[must_use]
    pub fn passed() -> Self {
        Self::SetSessionStatus {
            status: SessionStatus::Passed,
            reason: "All tests passed successfully".to_string(),
        }
    }

    /// Status command for a failing scenario; the error text is truncated
    #[must_use]
    pub fn failed(error: &str) -> Self {
        let truncated: String = error.chars().take(REASON_MAX_CHARS).collect();
        Self::SetSessionStatus {
            status: SessionStatus::Failed,
            reason: format!("Test failed: {truncated}"),
        }
    }

    /// Action name
    #[must_use]
    pub const fn action(&self) -> &'static str {
        match self {
            Self::SetSessionName { .. } => "setSessionName",
            Self::SetSessionStatus { .. } => "setSessionStatus",
        }
    }

    /// Script text sent through execute-script
    #[must_use]
    pub fn to_script(&self) -> String {
        let arguments = match self {
            Self::SetSessionName { name } => json!({ "name": name }),
            Self::SetSessionStatus { status, reason } => {
                json!({ "status": status.as_str(), "reason": reason })
            }
        };
        let payload = json!({ "action": self.action(), "arguments": arguments });
        format!("{EXECUTOR_PREFIX}{payload}")
    }

    /// Send the command on `session`
    pub fn send<S: BrowserSession + ?Sized>(&self, session: &mut S) -> SmokeResult<()> {
        session.execute_script(&self.to_script())?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::unreachable)]
mod tests {
    use super::*;

    fn payload(command: &GridCommand) -> serde_json::Value {
        let script = command.to_script();
        let body = script.strip_prefix(EXECUTOR_PREFIX).unwrap();
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn test_passed_script() {
        let value = payload(&GridCommand::passed());
        assert_eq!(value["action"], "setSessionStatus");
        assert_eq!(value["arguments"]["status"], "passed");
        assert_eq!(value["arguments"]["reason"], "All tests passed successfully");
    }

    #[test]
    fn test_failed_reason_is_truncated() {
        let long = "x".repeat(250);
        let value = payload(&GridCommand::failed(&long));
        let reason = value["arguments"]["reason"].as_str().unwrap();
        assert_eq!(reason, format!("Test failed: {}", "x".repeat(100)));
    }

    #[test]
    fn test_failed_reason_truncates_on_char_boundary() {
        let long = "é".repeat(150);
        let command = GridCommand::failed(&long);
        let GridCommand::SetSessionStatus { reason, .. } = command else {
            unreachable!()
        };
        assert_eq!(reason.chars().count(), "Test failed: ".len() + 100);
    }

    #[test]
    fn test_quotes_in_reason_are_escaped() {
        let value = payload(&GridCommand::failed(r#"element "Add Task" missing"#));
        assert_eq!(
            value["arguments"]["reason"],
            r#"Test failed: element "Add Task" missing"#
        );
    }

    #[test]
    fn test_set_session_name_script() {
        let command = GridCommand::SetSessionName {
            name: "Ditto Tasks Web Test".to_string(),
        };
        let value = payload(&command);
        assert_eq!(value["action"], "setSessionName");
        assert_eq!(value["arguments"]["name"], "Ditto Tasks Web Test");
    }
}
