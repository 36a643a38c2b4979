//! Event listeners and dispatch.

use verdict_core::{Location, LogLevel, NodePath, Timestamp};

use crate::event::{Event, EventKind, SuiteInfo, TestInfo};

/// Observer of the run event stream.
///
/// Every handler defaults to a no-op so a listener implements only what it
/// cares about. [`Listener::on_event`] sees every event before its typed
/// handler and suits recorders that treat the stream uniformly.
#[allow(unused_variables)]
pub trait Listener: Send {
    /// Every event, before its typed handler runs
    fn on_event(&mut self, event: &Event) {}

    /// The session started
    fn on_session_start(&mut self, time: Timestamp) {}
    /// The session ended
    fn on_session_end(&mut self, time: Timestamp) {}
    /// Session-scoped fixture setup began
    fn on_session_setup_start(&mut self, time: Timestamp) {}
    /// Session-scoped fixture setup finished
    fn on_session_setup_end(&mut self, time: Timestamp) {}
    /// Session-scoped fixture teardown began
    fn on_session_teardown_start(&mut self, time: Timestamp) {}
    /// Session-scoped fixture teardown finished
    fn on_session_teardown_end(&mut self, time: Timestamp) {}

    /// A suite began
    fn on_suite_start(&mut self, suite: &SuiteInfo, time: Timestamp) {}
    /// A suite ended
    fn on_suite_end(&mut self, path: &NodePath, time: Timestamp) {}
    /// Suite setup began
    fn on_suite_setup_start(&mut self, path: &NodePath, time: Timestamp) {}
    /// Suite setup finished
    fn on_suite_setup_end(&mut self, path: &NodePath, time: Timestamp) {}
    /// Suite teardown began
    fn on_suite_teardown_start(&mut self, path: &NodePath, time: Timestamp) {}
    /// Suite teardown finished
    fn on_suite_teardown_end(&mut self, path: &NodePath, time: Timestamp) {}

    /// A test body began
    fn on_test_start(&mut self, test: &TestInfo, time: Timestamp) {}
    /// A test body ended
    fn on_test_end(&mut self, path: &NodePath, time: Timestamp) {}
    /// A test was bypassed with a reason
    fn on_test_skipped(&mut self, test: &TestInfo, reason: &str, time: Timestamp) {}
    /// A disabled test was bypassed
    fn on_test_disabled(&mut self, test: &TestInfo, time: Timestamp) {}

    /// A new step opened
    fn on_step_start(&mut self, location: &Location, description: &str, time: Timestamp) {}
    /// A log entry
    fn on_log(&mut self, location: &Location, level: LogLevel, message: &str, time: Timestamp) {}
    /// A check outcome
    fn on_check(
        &mut self,
        location: &Location,
        description: &str,
        is_successful: bool,
        details: Option<&str>,
        time: Timestamp,
    ) {
    }
    /// An attachment entry
    fn on_attachment(
        &mut self,
        location: &Location,
        description: &str,
        filename: &str,
        as_image: bool,
        time: Timestamp,
    ) {
    }
    /// A URL entry
    fn on_url(
        &mut self,
        location: &Location,
        url: &str,
        description: Option<&str>,
        time: Timestamp,
    ) {
    }
}

/// Route an event to its typed handler, after the catch-all
pub fn dispatch(listener: &mut dyn Listener, event: &Event) {
    listener.on_event(event);
    let time = event.time;
    match &event.kind {
        EventKind::SessionStart => listener.on_session_start(time),
        EventKind::SessionEnd => listener.on_session_end(time),
        EventKind::SessionSetupStart => listener.on_session_setup_start(time),
        EventKind::SessionSetupEnd => listener.on_session_setup_end(time),
        EventKind::SessionTeardownStart => listener.on_session_teardown_start(time),
        EventKind::SessionTeardownEnd => listener.on_session_teardown_end(time),
        EventKind::SuiteStart { suite } => listener.on_suite_start(suite, time),
        EventKind::SuiteEnd { path } => listener.on_suite_end(path, time),
        EventKind::SuiteSetupStart { path } => listener.on_suite_setup_start(path, time),
        EventKind::SuiteSetupEnd { path } => listener.on_suite_setup_end(path, time),
        EventKind::SuiteTeardownStart { path } => listener.on_suite_teardown_start(path, time),
        EventKind::SuiteTeardownEnd { path } => listener.on_suite_teardown_end(path, time),
        EventKind::TestStart { test } => listener.on_test_start(test, time),
        EventKind::TestEnd { path } => listener.on_test_end(path, time),
        EventKind::TestSkipped { test, reason } => listener.on_test_skipped(test, reason, time),
        EventKind::TestDisabled { test } => listener.on_test_disabled(test, time),
        EventKind::StepStart {
            location,
            description,
        } => listener.on_step_start(location, description, time),
        EventKind::Log {
            location,
            level,
            message,
        } => listener.on_log(location, *level, message, time),
        EventKind::Check {
            location,
            description,
            is_successful,
            details,
        } => listener.on_check(location, description, *is_successful, details.as_deref(), time),
        EventKind::Attachment {
            location,
            description,
            filename,
            as_image,
        } => listener.on_attachment(location, description, filename, *as_image, time),
        EventKind::Url {
            location,
            url,
            description,
        } => listener.on_url(location, url, description.as_deref(), time),
    }
}
