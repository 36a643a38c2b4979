//! Per-body execution context.

use indexmap::IndexMap;
use verdict_core::{FixtureValue, Location, LogLevel};
use verdict_events::{Event, EventBus, EventKind};
use verdict_model::BodyContext;

/// Context threaded into one running body (test or hook).
///
/// One context exists per running body and is dropped when the body
/// returns, so parallel subtrees never share state. Everything the body
/// reports becomes an event at the context's location.
pub struct TestContext<'a> {
    location: Location,
    bus: &'a EventBus,
    fixtures: IndexMap<String, FixtureValue>,
    failed: bool,
}

impl<'a> TestContext<'a> {
    /// Create a context with its fixtures already resolved
    #[must_use]
    pub fn new(
        location: Location,
        bus: &'a EventBus,
        fixtures: IndexMap<String, FixtureValue>,
    ) -> Self {
        Self {
            location,
            bus,
            fixtures,
            failed: false,
        }
    }

    /// Whether the body reported a failure (error log or failing check)
    #[must_use]
    pub fn has_failed(&self) -> bool {
        self.failed
    }

    /// Where this context reports to
    #[must_use]
    pub fn location(&self) -> &Location {
        &self.location
    }
}

impl BodyContext for TestContext<'_> {
    fn fixture(&self, name: &str) -> Option<FixtureValue> {
        self.fixtures.get(name).cloned()
    }

    fn set_step(&mut self, description: &str) {
        self.bus.fire(Event::now(EventKind::StepStart {
            location: self.location.clone(),
            description: description.to_string(),
        }));
    }

    fn log(&mut self, level: LogLevel, message: &str) {
        if level == LogLevel::Error {
            self.failed = true;
        }
        self.bus.fire(Event::now(EventKind::Log {
            location: self.location.clone(),
            level,
            message: message.to_string(),
        }));
    }

    fn check(&mut self, description: &str, is_successful: bool, details: Option<&str>) {
        if !is_successful {
            self.failed = true;
        }
        self.bus.fire(Event::now(EventKind::Check {
            location: self.location.clone(),
            description: description.to_string(),
            is_successful,
            details: details.map(str::to_string),
        }));
    }

    fn attach(&mut self, description: &str, filename: &str, as_image: bool) {
        self.bus.fire(Event::now(EventKind::Attachment {
            location: self.location.clone(),
            description: description.to_string(),
            filename: filename.to_string(),
            as_image,
        }));
    }

    fn link(&mut self, url: &str, description: Option<&str>) {
        self.bus.fire(Event::now(EventKind::Url {
            location: self.location.clone(),
            url: url.to_string(),
            description: description.map(str::to_string),
        }));
    }
}
