//! Aggregate counts over a report.

use verdict_core::{Duration, Status};

use crate::report::Report;

/// Test counts and timing derived from a (possibly in-progress) report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportStats {
    /// Tests that passed
    pub passed: usize,
    /// Tests that failed
    pub failed: usize,
    /// Tests bypassed with a reason
    pub skipped: usize,
    /// Tests bypassed because they are disabled
    pub disabled: usize,
    /// Tests still running (no status yet)
    pub in_progress: usize,
    /// Wall-clock duration, once the session has both bounds
    pub duration: Option<Duration>,
}

impl ReportStats {
    /// Compute stats from a report
    #[must_use]
    pub fn of(report: &Report) -> Self {
        let mut stats = Self::default();
        report.walk_tests(&mut |test| match test.status {
            Some(Status::Passed) => stats.passed += 1,
            Some(Status::Failed) => stats.failed += 1,
            Some(Status::Skipped) => stats.skipped += 1,
            Some(Status::Disabled) => stats.disabled += 1,
            None => stats.in_progress += 1,
        });
        if let (Some(start), Some(end)) = (report.start_time, report.end_time) {
            stats.duration = Some(end.duration_since(&start));
        }
        stats
    }

    /// Every test, bypassed ones included
    #[must_use]
    pub fn total(&self) -> usize {
        self.passed + self.failed + self.skipped + self.disabled + self.in_progress
    }

    /// Tests that were eligible to run
    #[must_use]
    pub fn enabled(&self) -> usize {
        self.total() - self.disabled
    }
}

#[cfg(test)]
mod tests {
    use verdict_core::{Metadata, Timestamp};

    use super::*;
    use crate::report::{SuiteResult, TestResult};

    fn test_with_status(name: &str, status: Status) -> TestResult {
        TestResult::bypassed(name, name, Metadata::new(), status, None, Timestamp::new(1, 0))
    }

    #[test]
    fn test_counts_by_status() {
        let mut report = Report::new();
        report.start_time = Some(Timestamp::new(10, 0));
        report.end_time = Some(Timestamp::new(12, 500_000_000));
        let mut suite = SuiteResult::started("s", "S", Metadata::new(), Timestamp::new(1, 0));
        suite.tests.push(test_with_status("a", Status::Passed));
        suite.tests.push(test_with_status("b", Status::Failed));
        suite.tests.push(test_with_status("c", Status::Skipped));
        suite.tests.push(test_with_status("d", Status::Disabled));
        let mut nested = SuiteResult::started("n", "N", Metadata::new(), Timestamp::new(1, 0));
        nested.tests.push(test_with_status("e", Status::Passed));
        suite.suites.push(nested);
        report.suites.push(suite);

        let stats = ReportStats::of(&report);
        assert_eq!(stats.passed, 2);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.disabled, 1);
        assert_eq!(stats.total(), 5);
        assert_eq!(stats.enabled(), 4);
        assert_eq!(stats.duration, Some(Duration::from_millis(2500)));
    }
}
