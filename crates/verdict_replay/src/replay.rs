//! Canonical replay of a finished report.
//!
//! The regenerated sequence is structure-derived: depth-first over the
//! report tree in declaration order, whatever interleaving the live run
//! had. Timestamps come from the stored tree; fixtures and bodies are
//! never re-run.

use verdict_core::{Location, NodePath, Status, Timestamp};
use verdict_events::{Event, EventKind, Listener, SuiteInfo, TestInfo, dispatch};
use verdict_report::{Entry, HookResult, Report, Step, SuiteResult, TestResult};

/// Feed a listener the canonical event sequence of a finished report.
pub fn replay_report(report: &Report, listener: &mut dyn Listener) {
    let mut fire = |time: Timestamp, kind: EventKind| {
        dispatch(listener, &Event::new(time, kind));
    };

    if let Some(start) = report.start_time {
        fire(start, EventKind::SessionStart);
    }
    if let Some(setup) = &report.session_setup {
        replay_hook(
            setup,
            Location::SessionSetup,
            EventKind::SessionSetupStart,
            EventKind::SessionSetupEnd,
            &mut fire,
        );
    }
    for suite in &report.suites {
        replay_suite(suite, None, &mut fire);
    }
    if let Some(teardown) = &report.session_teardown {
        replay_hook(
            teardown,
            Location::SessionTeardown,
            EventKind::SessionTeardownStart,
            EventKind::SessionTeardownEnd,
            &mut fire,
        );
    }
    if let Some(end) = report.end_time {
        fire(end, EventKind::SessionEnd);
    }
}

fn replay_suite(
    suite: &SuiteResult,
    parent: Option<&NodePath>,
    fire: &mut impl FnMut(Timestamp, EventKind),
) {
    let path = match parent {
        Some(parent) => parent.child(&suite.name),
        None => NodePath::root(&suite.name),
    };
    let info = SuiteInfo {
        path: path.clone(),
        name: suite.name.clone(),
        description: suite.description.clone(),
        metadata: suite.metadata.clone(),
    };

    let Some(start) = suite.start_time else {
        return;
    };
    fire(start, EventKind::SuiteStart { suite: info });

    if let Some(setup) = &suite.setup {
        replay_hook(
            setup,
            Location::SuiteSetup(path.clone()),
            EventKind::SuiteSetupStart { path: path.clone() },
            EventKind::SuiteSetupEnd { path: path.clone() },
            fire,
        );
    }
    for test in &suite.tests {
        replay_test(test, &path, fire);
    }
    for sub_suite in &suite.suites {
        replay_suite(sub_suite, Some(&path), fire);
    }
    if let Some(teardown) = &suite.teardown {
        replay_hook(
            teardown,
            Location::SuiteTeardown(path.clone()),
            EventKind::SuiteTeardownStart { path: path.clone() },
            EventKind::SuiteTeardownEnd { path: path.clone() },
            fire,
        );
    }
    if let Some(end) = suite.end_time {
        fire(end, EventKind::SuiteEnd { path });
    }
}

fn replay_test(test: &TestResult, parent: &NodePath, fire: &mut impl FnMut(Timestamp, EventKind)) {
    let path = parent.child(&test.name);
    let info = TestInfo {
        path: path.clone(),
        name: test.name.clone(),
        description: test.description.clone(),
        metadata: test.metadata.clone(),
    };
    let Some(start) = test.start_time else {
        return;
    };

    match test.status {
        Some(Status::Skipped) => {
            fire(
                start,
                EventKind::TestSkipped {
                    test: info,
                    reason: test.status_details.clone().unwrap_or_default(),
                },
            );
        }
        Some(Status::Disabled) => {
            fire(start, EventKind::TestDisabled { test: info });
        }
        _ => {
            fire(start, EventKind::TestStart { test: info });
            replay_steps(&test.steps, &Location::Test(path.clone()), fire);
            if let Some(end) = test.end_time {
                fire(end, EventKind::TestEnd { path });
            }
        }
    }
}

fn replay_hook(
    hook: &HookResult,
    location: Location,
    start_kind: EventKind,
    end_kind: EventKind,
    fire: &mut impl FnMut(Timestamp, EventKind),
) {
    fire(hook.start_time, start_kind);
    replay_steps(&hook.steps, &location, fire);
    if let Some(end) = hook.end_time {
        fire(end, end_kind);
    }
}

fn replay_steps(
    steps: &[Step],
    location: &Location,
    fire: &mut impl FnMut(Timestamp, EventKind),
) {
    for step in steps {
        fire(
            step.start_time,
            EventKind::StepStart {
                location: location.clone(),
                description: step.description.clone(),
            },
        );
        for entry in &step.entries {
            let (time, kind) = entry_event(entry, location);
            fire(time, kind);
        }
    }
}

fn entry_event(entry: &Entry, location: &Location) -> (Timestamp, EventKind) {
    match entry {
        Entry::Log {
            level,
            message,
            time,
        } => (
            *time,
            EventKind::Log {
                location: location.clone(),
                level: *level,
                message: message.clone(),
            },
        ),
        Entry::Check {
            description,
            is_successful,
            details,
            time,
        } => (
            *time,
            EventKind::Check {
                location: location.clone(),
                description: description.clone(),
                is_successful: *is_successful,
                details: details.clone(),
            },
        ),
        Entry::Attachment {
            description,
            filename,
            as_image,
            time,
        } => (
            *time,
            EventKind::Attachment {
                location: location.clone(),
                description: description.clone(),
                filename: filename.clone(),
                as_image: *as_image,
            },
        ),
        Entry::Url {
            url,
            description,
            time,
        } => (
            *time,
            EventKind::Url {
                location: location.clone(),
                url: url.clone(),
                description: description.clone(),
            },
        ),
    }
}

#[cfg(test)]
mod tests {
    use verdict_core::{LogLevel, Metadata};
    use verdict_report::ReportBuilder;

    use super::*;
    use crate::log::EventLog;

    fn suite_info(path: &str) -> SuiteInfo {
        let path = NodePath::parse(path);
        SuiteInfo {
            name: path.name().to_string(),
            description: format!("Suite {}", path.name()),
            metadata: Metadata::new(),
            path,
        }
    }

    fn test_info(path: &str) -> TestInfo {
        let path = NodePath::parse(path);
        TestInfo {
            name: path.name().to_string(),
            description: format!("Test {}", path.name()),
            metadata: Metadata::new(),
            path,
        }
    }

    // Live stream -> report -> replay must rebuild an identical report.
    #[test]
    fn test_replay_round_trips_through_the_tree() {
        let mut builder = ReportBuilder::new();
        let events = vec![
            Event::new(Timestamp::new(1, 0), EventKind::SessionStart),
            Event::new(
                Timestamp::new(2, 0),
                EventKind::SuiteStart {
                    suite: suite_info("auth"),
                },
            ),
            Event::new(
                Timestamp::new(3, 0),
                EventKind::TestStart {
                    test: test_info("auth.login"),
                },
            ),
            Event::new(
                Timestamp::new(4, 0),
                EventKind::StepStart {
                    location: Location::Test(NodePath::parse("auth.login")),
                    description: "Send credentials".to_string(),
                },
            ),
            Event::new(
                Timestamp::new(5, 0),
                EventKind::Log {
                    location: Location::Test(NodePath::parse("auth.login")),
                    level: LogLevel::Info,
                    message: "posting".to_string(),
                },
            ),
            Event::new(
                Timestamp::new(6, 0),
                EventKind::TestEnd {
                    path: NodePath::parse("auth.login"),
                },
            ),
            Event::new(
                Timestamp::new(7, 0),
                EventKind::TestSkipped {
                    test: test_info("auth.logout"),
                    reason: "stopped after failure".to_string(),
                },
            ),
            Event::new(
                Timestamp::new(8, 0),
                EventKind::SuiteEnd {
                    path: NodePath::parse("auth"),
                },
            ),
            Event::new(Timestamp::new(9, 0), EventKind::SessionEnd),
        ];
        for event in &events {
            dispatch(&mut builder, event);
        }
        let report = builder.report();
        let report = report.lock().unwrap();

        let mut rebuilt = ReportBuilder::new();
        replay_report(&report, &mut rebuilt);
        let rebuilt = rebuilt.report();
        let rebuilt = rebuilt.lock().unwrap();

        assert_eq!(rebuilt.suites, report.suites);
        assert_eq!(rebuilt.start_time, report.start_time);
        assert_eq!(rebuilt.end_time, report.end_time);
    }

    #[test]
    fn test_replay_emits_declaration_order() {
        let mut builder = ReportBuilder::new();
        // suite "b" finishes before suite "a" even though "a" started first
        for event in [
            Event::new(Timestamp::new(1, 0), EventKind::SessionStart),
            Event::new(
                Timestamp::new(2, 0),
                EventKind::SuiteStart {
                    suite: suite_info("a"),
                },
            ),
            Event::new(
                Timestamp::new(2, 1),
                EventKind::SuiteStart {
                    suite: suite_info("b"),
                },
            ),
            Event::new(
                Timestamp::new(3, 0),
                EventKind::SuiteEnd {
                    path: NodePath::parse("b"),
                },
            ),
            Event::new(
                Timestamp::new(4, 0),
                EventKind::SuiteEnd {
                    path: NodePath::parse("a"),
                },
            ),
            Event::new(Timestamp::new(5, 0), EventKind::SessionEnd),
        ] {
            dispatch(&mut builder, &event);
        }
        let report = builder.report();
        let report = report.lock().unwrap();

        let mut log = EventLog::new();
        replay_report(&report, &mut log);
        let kinds: Vec<_> = log
            .events()
            .into_iter()
            .filter_map(|e| match e.kind {
                EventKind::SuiteStart { suite } => Some(format!("start:{}", suite.path)),
                EventKind::SuiteEnd { path } => Some(format!("end:{path}")),
                _ => None,
            })
            .collect();
        // each suite replays as a contiguous block, in declaration order
        assert_eq!(kinds, vec!["start:a", "end:a", "start:b", "end:b"]);
    }

    #[test]
    fn test_bypassed_tests_replay_as_bypass_events() {
        let mut builder = ReportBuilder::new();
        for event in [
            Event::new(Timestamp::new(1, 0), EventKind::SessionStart),
            Event::new(
                Timestamp::new(2, 0),
                EventKind::SuiteStart {
                    suite: suite_info("auth"),
                },
            ),
            Event::new(
                Timestamp::new(3, 0),
                EventKind::TestSkipped {
                    test: test_info("auth.login"),
                    reason: "setup failed".to_string(),
                },
            ),
            Event::new(
                Timestamp::new(4, 0),
                EventKind::TestDisabled {
                    test: test_info("auth.legacy"),
                },
            ),
            Event::new(
                Timestamp::new(5, 0),
                EventKind::SuiteEnd {
                    path: NodePath::parse("auth"),
                },
            ),
            Event::new(Timestamp::new(6, 0), EventKind::SessionEnd),
        ] {
            dispatch(&mut builder, &event);
        }
        let report = builder.report();
        let report = report.lock().unwrap();

        let mut log = EventLog::new();
        replay_report(&report, &mut log);
        let replayed = log.events();
        assert!(replayed.iter().any(|e| matches!(
            &e.kind,
            EventKind::TestSkipped { reason, .. } if reason == "setup failed"
        )));
        assert!(
            replayed
                .iter()
                .any(|e| matches!(&e.kind, EventKind::TestDisabled { .. }))
        );
        assert!(
            !replayed
                .iter()
                .any(|e| matches!(&e.kind, EventKind::TestStart { .. }))
        );
    }
}
