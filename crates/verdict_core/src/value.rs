//! Fixture values and log levels.

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::sync::Arc;

/// An opaque fixture value, shared between dependents.
///
/// Bodies downcast it back to the concrete type produced by the factory.
pub type FixtureValue = Arc<dyn Any + Send + Sync>;

/// Downcast a fixture value to its concrete type
#[must_use]
pub fn downcast_fixture<T: Any + Send + Sync>(value: &FixtureValue) -> Option<Arc<T>> {
    Arc::clone(value).downcast::<T>().ok()
}

/// Severity of a log entry.
///
/// An `Error` entry marks the owning node as failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    /// Diagnostic detail
    Debug,
    /// Normal progress information
    Info,
    /// Something suspicious that does not fail the node
    Warn,
    /// A failure; the owning node ends up failed
    Error,
}

impl LogLevel {
    /// String form used by sinks
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
