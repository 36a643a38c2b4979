//! Result status for report nodes.

use serde::{Deserialize, Serialize};

/// Final status of a test, hook or suite result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// The node completed without any failure
    Passed,
    /// A check failed, an error was logged or the body aborted
    Failed,
    /// The node was never executed (setup failure or cancelled run)
    Skipped,
    /// The node was declared disabled and not executed
    Disabled,
}

impl Status {
    /// Whether this status counts as successful.
    ///
    /// Disabled nodes were deliberately not run and do not fail a run.
    #[must_use]
    pub const fn is_successful(self) -> bool {
        matches!(self, Self::Passed | Self::Disabled)
    }

    /// Whether the node actually executed
    #[must_use]
    pub const fn is_executed(self) -> bool {
        matches!(self, Self::Passed | Self::Failed)
    }

    /// String form used by sinks
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
            Self::Disabled => "disabled",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_successful() {
        assert!(Status::Passed.is_successful());
        assert!(Status::Disabled.is_successful());
        assert!(!Status::Failed.is_successful());
        assert!(!Status::Skipped.is_successful());
    }

    #[test]
    fn test_status_executed() {
        assert!(Status::Passed.is_executed());
        assert!(Status::Failed.is_executed());
        assert!(!Status::Skipped.is_executed());
        assert!(!Status::Disabled.is_executed());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(Status::Passed.to_string(), "passed");
        assert_eq!(Status::Disabled.to_string(), "disabled");
    }
}
