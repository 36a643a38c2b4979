//! Run events.

use serde::{Deserialize, Serialize};
use verdict_core::{Location, LogLevel, Metadata, NodePath, Timestamp};

/// Snapshot of a suite's identity carried by suite events.
///
/// Enough for a listener to rebuild the node without access to the
/// descriptor forest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteInfo {
    /// Dotted path of the suite
    pub path: NodePath,
    /// Suite name
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// Tags, properties and links
    pub metadata: Metadata,
}

/// Snapshot of a test's identity carried by test events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestInfo {
    /// Dotted path of the test
    pub path: NodePath,
    /// Test name
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// Tags, properties and links
    pub metadata: Metadata,
}

/// What happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// The session started; first event of every run
    SessionStart,
    /// The session ended; last event of every run
    SessionEnd,
    /// Session-scoped fixture setup began
    SessionSetupStart,
    /// Session-scoped fixture setup finished
    SessionSetupEnd,
    /// Session-scoped fixture teardown began
    SessionTeardownStart,
    /// Session-scoped fixture teardown finished
    SessionTeardownEnd,
    /// A suite began
    SuiteStart {
        /// Suite identity
        suite: SuiteInfo,
    },
    /// A suite ended
    SuiteEnd {
        /// Suite path
        path: NodePath,
    },
    /// Suite setup (hook plus suite-scoped fixtures) began
    SuiteSetupStart {
        /// Suite path
        path: NodePath,
    },
    /// Suite setup finished
    SuiteSetupEnd {
        /// Suite path
        path: NodePath,
    },
    /// Suite teardown began
    SuiteTeardownStart {
        /// Suite path
        path: NodePath,
    },
    /// Suite teardown finished
    SuiteTeardownEnd {
        /// Suite path
        path: NodePath,
    },
    /// A test body began
    TestStart {
        /// Test identity
        test: TestInfo,
    },
    /// A test body ended
    TestEnd {
        /// Test path
        path: NodePath,
    },
    /// A test was bypassed with a reason
    TestSkipped {
        /// Test identity
        test: TestInfo,
        /// Why it was skipped
        reason: String,
    },
    /// A disabled test was bypassed
    TestDisabled {
        /// Test identity
        test: TestInfo,
    },
    /// A new step opened inside a node; closes the previous step
    StepStart {
        /// Where the step belongs
        location: Location,
        /// Step description
        description: String,
    },
    /// A log entry inside the current step
    Log {
        /// Where the entry belongs
        location: Location,
        /// Severity
        level: LogLevel,
        /// Message text
        message: String,
    },
    /// A check outcome inside the current step
    Check {
        /// Where the entry belongs
        location: Location,
        /// What was checked
        description: String,
        /// Whether the check passed
        is_successful: bool,
        /// Optional detail (actual value, diff)
        details: Option<String>,
    },
    /// An attachment inside the current step
    Attachment {
        /// Where the entry belongs
        location: Location,
        /// Attachment description
        description: String,
        /// File name relative to the report directory
        filename: String,
        /// Whether the file is an image
        as_image: bool,
    },
    /// A URL entry inside the current step
    Url {
        /// Where the entry belongs
        location: Location,
        /// The URL
        url: String,
        /// Optional label
        description: Option<String>,
    },
}

impl EventKind {
    /// Location carried by stepped events (`StepStart`, `Log`, `Check`,
    /// `Attachment`, `Url`); `None` for lifecycle events
    #[must_use]
    pub fn location(&self) -> Option<&Location> {
        match self {
            EventKind::StepStart { location, .. }
            | EventKind::Log { location, .. }
            | EventKind::Check { location, .. }
            | EventKind::Attachment { location, .. }
            | EventKind::Url { location, .. } => Some(location),
            _ => None,
        }
    }

    /// Whether this event settles the outcome of one test
    #[must_use]
    pub fn is_test_result(&self) -> bool {
        matches!(
            self,
            EventKind::TestEnd { .. }
                | EventKind::TestSkipped { .. }
                | EventKind::TestDisabled { .. }
        )
    }
}

/// A timestamped run event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// When the event was fired
    pub time: Timestamp,
    /// What happened
    pub kind: EventKind,
}

impl Event {
    /// Create an event with an explicit timestamp
    #[must_use]
    pub fn new(time: Timestamp, kind: EventKind) -> Self {
        Self { time, kind }
    }

    /// Create an event timestamped now
    #[must_use]
    pub fn now(kind: EventKind) -> Self {
        Self {
            time: Timestamp::now(),
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_only_on_stepped_events() {
        let stepped = EventKind::Log {
            location: Location::Test(NodePath::parse("auth.login")),
            level: LogLevel::Info,
            message: "hello".to_string(),
        };
        assert!(stepped.location().is_some());
        assert!(EventKind::SessionStart.location().is_none());
    }

    #[test]
    fn test_is_test_result() {
        let info = TestInfo {
            path: NodePath::parse("auth.login"),
            name: "login".to_string(),
            description: "Login".to_string(),
            metadata: Metadata::new(),
        };
        assert!(EventKind::TestDisabled { test: info }.is_test_result());
        assert!(
            EventKind::TestEnd {
                path: NodePath::parse("auth.login")
            }
            .is_test_result()
        );
        assert!(!EventKind::SessionEnd.is_test_result());
    }

    #[test]
    fn test_event_serde_round_trip() {
        let event = Event::new(
            Timestamp::new(1_700_000_000, 0),
            EventKind::Check {
                location: Location::Test(NodePath::parse("auth.login")),
                description: "status is 200".to_string(),
                is_successful: true,
                details: None,
            },
        );
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"check\""));
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
