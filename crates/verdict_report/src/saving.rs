//! Saving strategies: when to flush the report mid-run.

use std::sync::{Arc, Mutex, PoisonError};

use verdict_core::Status;
use verdict_events::{Event, EventKind, Listener};

use crate::report::Report;

type Predicate = Arc<dyn Fn(&Event, &Report) -> bool + Send + Sync>;

/// Decides, per event, whether the report should be written out now.
///
/// The end of the run always saves; a strategy only adds intermediate
/// flush points so a crash mid-run leaves a usable report behind.
#[derive(Clone)]
pub struct SavingStrategy {
    predicate: Predicate,
}

impl SavingStrategy {
    /// Save only at the end of the run
    #[must_use]
    pub fn never() -> Self {
        Self {
            predicate: Arc::new(|_, _| false),
        }
    }

    /// Save each time a suite finishes
    #[must_use]
    pub fn at_each_suite() -> Self {
        Self {
            predicate: Arc::new(|event, _| matches!(event.kind, EventKind::SuiteEnd { .. })),
        }
    }

    /// Save each time a test settles (finished, skipped or disabled)
    #[must_use]
    pub fn at_each_test() -> Self {
        Self {
            predicate: Arc::new(|event, _| event.kind.is_test_result()),
        }
    }

    /// Save each time a test settles as failed
    #[must_use]
    pub fn at_each_failed_test() -> Self {
        Self {
            predicate: Arc::new(|event, report| match &event.kind {
                EventKind::TestEnd { path } => report
                    .test(path)
                    .is_some_and(|test| test.status == Some(Status::Failed)),
                _ => false,
            }),
        }
    }

    /// Save on every event
    #[must_use]
    pub fn at_each_event() -> Self {
        Self {
            predicate: Arc::new(|_, _| true),
        }
    }

    /// Map a keyword spelling to a strategy.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownSavingStrategy`] for anything but
    /// `at_end_of_tests`, `at_each_suite`, `at_each_test`,
    /// `at_each_failed_test` or `at_each_event`.
    pub fn parse(expr: &str) -> Result<Self, UnknownSavingStrategy> {
        match expr {
            "at_end_of_tests" => Ok(Self::never()),
            "at_each_suite" => Ok(Self::at_each_suite()),
            "at_each_test" => Ok(Self::at_each_test()),
            "at_each_failed_test" => Ok(Self::at_each_failed_test()),
            "at_each_event" => Ok(Self::at_each_event()),
            other => Err(UnknownSavingStrategy {
                expr: other.to_string(),
            }),
        }
    }

    /// Whether this event is a flush point
    #[must_use]
    pub fn should_save(&self, event: &Event, report: &Report) -> bool {
        (self.predicate)(event, report)
    }
}

impl std::fmt::Debug for SavingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SavingStrategy").finish_non_exhaustive()
    }
}

/// Unrecognized saving strategy keyword
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown saving strategy '{expr}'")]
pub struct UnknownSavingStrategy {
    /// The rejected spelling
    pub expr: String,
}

/// Writes a report to its durable form.
///
/// Concrete formats live outside the engine; the saver only decides when
/// to call this.
pub trait ReportSerializer: Send {
    /// Persist the current state of the report
    ///
    /// # Errors
    ///
    /// Propagates whatever the underlying sink reports.
    fn save(&mut self, report: &Report) -> anyhow::Result<()>;
}

impl<F> ReportSerializer for F
where
    F: FnMut(&Report) -> anyhow::Result<()> + Send,
{
    fn save(&mut self, report: &Report) -> anyhow::Result<()> {
        self(report)
    }
}

/// Listener applying a [`SavingStrategy`] around a [`ReportSerializer`].
///
/// Always saves once at session end, whatever the strategy says.
pub struct ReportSaver {
    report: Arc<Mutex<Report>>,
    strategy: SavingStrategy,
    serializer: Box<dyn ReportSerializer>,
}

impl ReportSaver {
    /// Create a saver over the shared report
    #[must_use]
    pub fn new(
        report: Arc<Mutex<Report>>,
        strategy: SavingStrategy,
        serializer: Box<dyn ReportSerializer>,
    ) -> Self {
        Self {
            report,
            strategy,
            serializer,
        }
    }

    fn save_now(&mut self) {
        let report = self
            .report
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Err(err) = self.serializer.save(&report) {
            tracing::error!(error = %err, "failed to save the report");
        }
    }
}

impl Listener for ReportSaver {
    fn on_event(&mut self, event: &Event) {
        if matches!(event.kind, EventKind::SessionEnd) {
            self.save_now();
            return;
        }
        let should_save = {
            let report = self
                .report
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            self.strategy.should_save(event, &report)
        };
        if should_save {
            self.save_now();
        }
    }
}

#[cfg(test)]
mod tests {
    use verdict_core::{Metadata, NodePath, Timestamp};
    use verdict_events::{TestInfo, dispatch};

    use super::*;
    use crate::report::{SuiteResult, TestResult};

    fn test_end(path: &str) -> Event {
        Event::new(
            Timestamp::new(1, 0),
            EventKind::TestEnd {
                path: NodePath::parse(path),
            },
        )
    }

    fn report_with_test(status: Status) -> Report {
        let mut report = Report::new();
        let mut suite = SuiteResult::started("s", "S", Metadata::new(), Timestamp::new(1, 0));
        suite.tests.push(TestResult::bypassed(
            "t",
            "T",
            Metadata::new(),
            status,
            None,
            Timestamp::new(1, 0),
        ));
        report.suites.push(suite);
        report
    }

    #[test]
    fn test_parse_keywords() {
        assert!(SavingStrategy::parse("at_end_of_tests").is_ok());
        assert!(SavingStrategy::parse("at_each_suite").is_ok());
        assert!(SavingStrategy::parse("at_each_test").is_ok());
        assert!(SavingStrategy::parse("at_each_failed_test").is_ok());
        assert!(SavingStrategy::parse("at_each_event").is_ok());
        assert!(SavingStrategy::parse("whenever").is_err());
    }

    #[test]
    fn test_at_each_failed_test_checks_report_status() {
        let strategy = SavingStrategy::at_each_failed_test();
        let failed = report_with_test(Status::Failed);
        let passed = report_with_test(Status::Passed);

        assert!(strategy.should_save(&test_end("s.t"), &failed));
        assert!(!strategy.should_save(&test_end("s.t"), &passed));
    }

    #[test]
    fn test_at_each_test_triggers_on_any_result() {
        let strategy = SavingStrategy::at_each_test();
        let report = Report::new();
        let info = TestInfo {
            path: NodePath::parse("s.t"),
            name: "t".to_string(),
            description: "T".to_string(),
            metadata: Metadata::new(),
        };
        let skipped = Event::new(
            Timestamp::new(1, 0),
            EventKind::TestSkipped {
                test: info,
                reason: "setup failed".to_string(),
            },
        );
        assert!(strategy.should_save(&test_end("s.t"), &report));
        assert!(strategy.should_save(&skipped, &report));
        assert!(!strategy.should_save(&Event::new(Timestamp::new(1, 0), EventKind::SessionStart), &report));
    }

    #[test]
    fn test_saver_always_saves_at_session_end() {
        let saves = Arc::new(Mutex::new(0usize));
        let counter = Arc::clone(&saves);
        let report = Arc::new(Mutex::new(Report::new()));
        let mut saver = ReportSaver::new(
            Arc::clone(&report),
            SavingStrategy::never(),
            Box::new(move |_: &Report| {
                *counter.lock().unwrap() += 1;
                Ok(())
            }),
        );

        dispatch(&mut saver, &Event::new(Timestamp::new(1, 0), EventKind::SessionStart));
        dispatch(&mut saver, &test_end("s.t"));
        dispatch(&mut saver, &Event::new(Timestamp::new(2, 0), EventKind::SessionEnd));

        assert_eq!(*saves.lock().unwrap(), 1);
    }
}
