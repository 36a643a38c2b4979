//! Event-stream folding into the report tree.

use std::sync::{Arc, Mutex, PoisonError};

use verdict_core::{Location, LogLevel, NodePath, Status, Timestamp};
use verdict_events::{Listener, SuiteInfo, TestInfo};

use crate::report::{Entry, HookResult, Report, Step, SuiteResult, TestResult};

/// Listener folding the run event stream into a [`Report`].
///
/// Nodes are created on start events and sealed on end events. Entries are
/// appended to the open step at their location; locations are disjoint
/// across parallel subtrees, so no append is ever ambiguous.
#[derive(Clone)]
pub struct ReportBuilder {
    report: Arc<Mutex<Report>>,
}

impl ReportBuilder {
    /// Builder over a fresh report
    #[must_use]
    pub fn new() -> Self {
        Self {
            report: Arc::new(Mutex::new(Report::new())),
        }
    }

    /// Shared handle to the report under construction
    #[must_use]
    pub fn report(&self) -> Arc<Mutex<Report>> {
        Arc::clone(&self.report)
    }

    fn mutate(&self, f: impl FnOnce(&mut Report)) {
        let mut report = self
            .report
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if report.is_sealed() {
            tracing::warn!("event fired after the report was sealed, dropping it");
            return;
        }
        f(&mut report);
    }
}

impl Default for ReportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// Close the open step (if any) and drop steps that collected no entry.
fn finalize_steps(steps: &mut Vec<Step>, time: Timestamp) {
    if let Some(last) = steps.last_mut() {
        if last.end_time.is_none() {
            last.end_time = Some(time);
        }
    }
    steps.retain(|step| !step.entries.is_empty());
}

fn close_hook(slot: &mut Option<HookResult>, time: Timestamp) {
    if let Some(hook) = slot {
        finalize_steps(&mut hook.steps, time);
        hook.end_time = Some(time);
        if hook.steps.is_empty() {
            *slot = None;
        }
    }
}

fn hook_slot_mut<'a>(
    report: &'a mut Report,
    location: &Location,
) -> Option<&'a mut Option<HookResult>> {
    match location {
        Location::SessionSetup => Some(&mut report.session_setup),
        Location::SessionTeardown => Some(&mut report.session_teardown),
        Location::SuiteSetup(path) => report.suite_mut(path).map(|s| &mut s.setup),
        Location::SuiteTeardown(path) => report.suite_mut(path).map(|s| &mut s.teardown),
        Location::Test(_) => None,
    }
}

fn implicit_description(report: &Report, location: &Location) -> String {
    match location {
        Location::SessionSetup => "Setup session".to_string(),
        Location::SessionTeardown => "Teardown session".to_string(),
        Location::SuiteSetup(path) => format!("Setup suite '{path}'"),
        Location::SuiteTeardown(path) => format!("Teardown suite '{path}'"),
        Location::Test(path) => report
            .test(path)
            .map_or_else(|| path.name().to_string(), |t| t.description.clone()),
    }
}

fn append_entry(report: &mut Report, location: &Location, entry: Entry, time: Timestamp) {
    let implicit = implicit_description(report, location);
    let Some(steps) = report.steps_at_mut(location) else {
        tracing::warn!(%location, "entry for an unknown node, dropping it");
        return;
    };
    let needs_step = steps.last().is_none_or(|step| step.end_time.is_some());
    if needs_step {
        steps.push(Step::new(implicit, time));
    }
    if let Some(step) = steps.last_mut() {
        step.entries.push(entry);
    }
}

impl Listener for ReportBuilder {
    fn on_session_start(&mut self, time: Timestamp) {
        self.mutate(|report| report.start_time = Some(time));
    }

    fn on_session_end(&mut self, time: Timestamp) {
        self.mutate(|report| {
            report.end_time = Some(time);
            report.seal();
        });
    }

    fn on_session_setup_start(&mut self, time: Timestamp) {
        self.mutate(|report| report.session_setup = Some(HookResult::started(time)));
    }

    fn on_session_setup_end(&mut self, time: Timestamp) {
        self.mutate(|report| close_hook(&mut report.session_setup, time));
    }

    fn on_session_teardown_start(&mut self, time: Timestamp) {
        self.mutate(|report| report.session_teardown = Some(HookResult::started(time)));
    }

    fn on_session_teardown_end(&mut self, time: Timestamp) {
        self.mutate(|report| close_hook(&mut report.session_teardown, time));
    }

    fn on_suite_start(&mut self, suite: &SuiteInfo, time: Timestamp) {
        self.mutate(|report| {
            let result =
                SuiteResult::started(&suite.name, &suite.description, suite.metadata.clone(), time);
            match suite.path.parent() {
                Some(parent) => match report.suite_mut(&parent) {
                    Some(owner) => owner.suites.push(result),
                    None => {
                        tracing::warn!(path = %suite.path, "suite start under an unknown parent");
                    }
                },
                None => report.suites.push(result),
            }
        });
    }

    fn on_suite_end(&mut self, path: &NodePath, time: Timestamp) {
        self.mutate(|report| {
            if let Some(suite) = report.suite_mut(path) {
                suite.end_time = Some(time);
            }
        });
    }

    fn on_suite_setup_start(&mut self, path: &NodePath, time: Timestamp) {
        self.mutate(|report| {
            if let Some(suite) = report.suite_mut(path) {
                suite.setup = Some(HookResult::started(time));
            }
        });
    }

    fn on_suite_setup_end(&mut self, path: &NodePath, time: Timestamp) {
        self.mutate(|report| {
            if let Some(slot) = hook_slot_mut(report, &Location::SuiteSetup(path.clone())) {
                close_hook(slot, time);
            }
        });
    }

    fn on_suite_teardown_start(&mut self, path: &NodePath, time: Timestamp) {
        self.mutate(|report| {
            if let Some(suite) = report.suite_mut(path) {
                suite.teardown = Some(HookResult::started(time));
            }
        });
    }

    fn on_suite_teardown_end(&mut self, path: &NodePath, time: Timestamp) {
        self.mutate(|report| {
            if let Some(slot) = hook_slot_mut(report, &Location::SuiteTeardown(path.clone())) {
                close_hook(slot, time);
            }
        });
    }

    fn on_test_start(&mut self, test: &TestInfo, time: Timestamp) {
        self.mutate(|report| {
            let result =
                TestResult::started(&test.name, &test.description, test.metadata.clone(), time);
            match test
                .path
                .parent()
                .and_then(|parent| report.suite_mut(&parent))
            {
                Some(suite) => suite.tests.push(result),
                None => tracing::warn!(path = %test.path, "test start under an unknown suite"),
            }
        });
    }

    fn on_test_end(&mut self, path: &NodePath, time: Timestamp) {
        self.mutate(|report| {
            let Some(test) = report.test_mut(path) else {
                return;
            };
            finalize_steps(&mut test.steps, time);
            test.status = Some(if test.steps.iter().all(Step::is_successful) {
                Status::Passed
            } else {
                Status::Failed
            });
            test.end_time = Some(time);
        });
    }

    fn on_test_skipped(&mut self, test: &TestInfo, reason: &str, time: Timestamp) {
        let result = TestResult::bypassed(
            &test.name,
            &test.description,
            test.metadata.clone(),
            Status::Skipped,
            Some(reason.to_string()),
            time,
        );
        let path = test.path.clone();
        self.mutate(|report| {
            match path.parent().and_then(|parent| report.suite_mut(&parent)) {
                Some(suite) => suite.tests.push(result),
                None => tracing::warn!(%path, "skipped test under an unknown suite"),
            }
        });
    }

    fn on_test_disabled(&mut self, test: &TestInfo, time: Timestamp) {
        let result = TestResult::bypassed(
            &test.name,
            &test.description,
            test.metadata.clone(),
            Status::Disabled,
            None,
            time,
        );
        let path = test.path.clone();
        self.mutate(|report| {
            match path.parent().and_then(|parent| report.suite_mut(&parent)) {
                Some(suite) => suite.tests.push(result),
                None => tracing::warn!(%path, "disabled test under an unknown suite"),
            }
        });
    }

    fn on_step_start(&mut self, location: &Location, description: &str, time: Timestamp) {
        self.mutate(|report| {
            let Some(steps) = report.steps_at_mut(location) else {
                tracing::warn!(%location, "step for an unknown node, dropping it");
                return;
            };
            finalize_steps(steps, time);
            steps.push(Step::new(description, time));
        });
    }

    fn on_log(&mut self, location: &Location, level: LogLevel, message: &str, time: Timestamp) {
        let entry = Entry::Log {
            level,
            message: message.to_string(),
            time,
        };
        self.mutate(|report| append_entry(report, location, entry, time));
    }

    fn on_check(
        &mut self,
        location: &Location,
        description: &str,
        is_successful: bool,
        details: Option<&str>,
        time: Timestamp,
    ) {
        let entry = Entry::Check {
            description: description.to_string(),
            is_successful,
            details: details.map(str::to_string),
            time,
        };
        self.mutate(|report| append_entry(report, location, entry, time));
    }

    fn on_attachment(
        &mut self,
        location: &Location,
        description: &str,
        filename: &str,
        as_image: bool,
        time: Timestamp,
    ) {
        let entry = Entry::Attachment {
            description: description.to_string(),
            filename: filename.to_string(),
            as_image,
            time,
        };
        self.mutate(|report| append_entry(report, location, entry, time));
    }

    fn on_url(
        &mut self,
        location: &Location,
        url: &str,
        description: Option<&str>,
        time: Timestamp,
    ) {
        let entry = Entry::Url {
            url: url.to_string(),
            description: description.map(str::to_string),
            time,
        };
        self.mutate(|report| append_entry(report, location, entry, time));
    }
}
