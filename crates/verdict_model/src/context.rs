//! Execution context seen by test bodies and hooks.
//!
//! The scheduler threads a concrete context value into every body; there is
//! no process-wide "current test" state. The context is the only channel a
//! body has for steps, logs, checks and fixture access.

use std::any::Any;
use std::sync::Arc;

use verdict_core::{FixtureValue, LogLevel, downcast_fixture};

/// Explicit abort signal raised by a body.
///
/// Aborting stops the body immediately and fails the owning node; it is
/// caught at the body boundary and never propagates further.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Abort {
    /// Why the body aborted
    pub reason: String,
}

impl Abort {
    /// Create an abort signal
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for Abort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "aborted: {}", self.reason)
    }
}

impl std::error::Error for Abort {}

/// What a body evaluates to: normal completion or an abort signal
pub type BodyOutcome = Result<(), Abort>;

/// A test body or hook closure
pub type BodyFn = Arc<dyn Fn(&mut dyn BodyContext) -> BodyOutcome + Send + Sync>;

/// Operations a running body may perform.
///
/// Implemented by the runtime; bodies receive `&mut dyn BodyContext`.
pub trait BodyContext {
    /// Resolved value of a fixture the node declared as a parameter
    fn fixture(&self, name: &str) -> Option<FixtureValue>;

    /// Open a new step; the previous step (if any) is closed
    fn set_step(&mut self, description: &str);

    /// Emit a log entry; `LogLevel::Error` fails the owning node
    fn log(&mut self, level: LogLevel, message: &str);

    /// Record a check outcome; a failing check fails the node but
    /// execution continues
    fn check(&mut self, description: &str, is_successful: bool, details: Option<&str>);

    /// Record an attachment entry
    fn attach(&mut self, description: &str, filename: &str, as_image: bool);

    /// Record a URL entry
    fn link(&mut self, url: &str, description: Option<&str>);
}

/// Fetch a fixture value downcast to its concrete type
#[must_use]
pub fn fixture_of<T: Any + Send + Sync>(ctx: &dyn BodyContext, name: &str) -> Option<Arc<T>> {
    ctx.fixture(name).and_then(|value| downcast_fixture::<T>(&value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingContext {
        fixtures: Vec<(String, FixtureValue)>,
        entries: Vec<String>,
    }

    impl BodyContext for RecordingContext {
        fn fixture(&self, name: &str) -> Option<FixtureValue> {
            self.fixtures
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| Arc::clone(v))
        }

        fn set_step(&mut self, description: &str) {
            self.entries.push(format!("step:{description}"));
        }

        fn log(&mut self, level: LogLevel, message: &str) {
            self.entries.push(format!("log:{level}:{message}"));
        }

        fn check(&mut self, description: &str, is_successful: bool, _details: Option<&str>) {
            self.entries
                .push(format!("check:{description}:{is_successful}"));
        }

        fn attach(&mut self, description: &str, _filename: &str, _as_image: bool) {
            self.entries.push(format!("attach:{description}"));
        }

        fn link(&mut self, url: &str, _description: Option<&str>) {
            self.entries.push(format!("url:{url}"));
        }
    }

    #[test]
    fn test_fixture_of_downcasts() {
        let mut ctx = RecordingContext::default();
        ctx.fixtures
            .push(("answer".to_string(), Arc::new(42u32) as FixtureValue));

        assert_eq!(*fixture_of::<u32>(&ctx, "answer").unwrap(), 42);
        assert!(fixture_of::<String>(&ctx, "answer").is_none());
        assert!(fixture_of::<u32>(&ctx, "missing").is_none());
    }

    #[test]
    fn test_body_closure_runs_against_context() {
        let body: BodyFn = Arc::new(|ctx| {
            ctx.set_step("compute");
            ctx.check("result is even", true, None);
            Ok(())
        });

        let mut ctx = RecordingContext::default();
        assert!(body(&mut ctx).is_ok());
        assert_eq!(ctx.entries, vec!["step:compute", "check:result is even:true"]);
    }

    #[test]
    fn test_abort_display() {
        let abort = Abort::new("backend unreachable");
        assert_eq!(abort.to_string(), "aborted: backend unreachable");
    }
}
