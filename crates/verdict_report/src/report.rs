//! Report tree types.
//!
//! The tree mirrors the declared suite structure. Nodes are created and
//! mutated while the run is live and sealed at the session end event; a
//! sealed report is the durable record of the run.

use serde::{Deserialize, Serialize};
use verdict_core::{Location, LogLevel, Metadata, NodePath, RunId, Status, Timestamp};

/// One recorded entry inside a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Entry {
    /// A log line
    Log {
        /// Severity
        level: LogLevel,
        /// Message text
        message: String,
        /// When it was recorded
        time: Timestamp,
    },
    /// A check outcome
    Check {
        /// What was checked
        description: String,
        /// Whether the check passed
        is_successful: bool,
        /// Optional detail (actual value, diff)
        details: Option<String>,
        /// When it was recorded
        time: Timestamp,
    },
    /// A file attached to the report
    Attachment {
        /// Attachment description
        description: String,
        /// File name relative to the report directory
        filename: String,
        /// Whether the file is an image
        as_image: bool,
        /// When it was recorded
        time: Timestamp,
    },
    /// A URL
    Url {
        /// The URL
        url: String,
        /// Optional label
        description: Option<String>,
        /// When it was recorded
        time: Timestamp,
    },
}

impl Entry {
    /// Whether the entry contributes a failure (failing check or
    /// error-level log)
    #[must_use]
    pub fn is_failure(&self) -> bool {
        match self {
            Entry::Log { level, .. } => *level == LogLevel::Error,
            Entry::Check { is_successful, .. } => !is_successful,
            Entry::Attachment { .. } | Entry::Url { .. } => false,
        }
    }
}

/// A named phase inside a test or hook, grouping entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Step description
    pub description: String,
    /// When the step opened
    pub start_time: Timestamp,
    /// When the step closed; `None` while still open
    pub end_time: Option<Timestamp>,
    /// Recorded entries, in order
    pub entries: Vec<Entry>,
}

impl Step {
    /// Open a step
    #[must_use]
    pub fn new(description: impl Into<String>, start_time: Timestamp) -> Self {
        Self {
            description: description.into(),
            start_time,
            end_time: None,
            entries: Vec::new(),
        }
    }

    /// Whether no entry in the step failed
    #[must_use]
    pub fn is_successful(&self) -> bool {
        !self.entries.iter().any(Entry::is_failure)
    }
}

/// Outcome of a setup or teardown phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookResult {
    /// When the phase began
    pub start_time: Timestamp,
    /// When the phase finished; `None` while still running
    pub end_time: Option<Timestamp>,
    /// Recorded steps, in order
    pub steps: Vec<Step>,
}

impl HookResult {
    /// Record a phase that just began
    #[must_use]
    pub fn started(start_time: Timestamp) -> Self {
        Self {
            start_time,
            end_time: None,
            steps: Vec::new(),
        }
    }

    /// Whether every step succeeded (an empty phase is successful)
    #[must_use]
    pub fn is_successful(&self) -> bool {
        self.steps.iter().all(Step::is_successful)
    }
}

/// Outcome of one test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    /// Test name
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// Tags, properties and links
    pub metadata: Metadata,
    /// When the body began; `None` for bypassed tests
    pub start_time: Option<Timestamp>,
    /// When the body finished
    pub end_time: Option<Timestamp>,
    /// Final status; `None` while the test is running
    pub status: Option<Status>,
    /// Free-form detail (skip reason, abort message)
    pub status_details: Option<String>,
    /// Recorded steps, in order
    pub steps: Vec<Step>,
}

impl TestResult {
    /// Record a test whose body just began
    #[must_use]
    pub fn started(name: &str, description: &str, metadata: Metadata, time: Timestamp) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            metadata,
            start_time: Some(time),
            end_time: None,
            status: None,
            status_details: None,
            steps: Vec::new(),
        }
    }

    /// Record a bypassed test (skipped or disabled), never started
    #[must_use]
    pub fn bypassed(
        name: &str,
        description: &str,
        metadata: Metadata,
        status: Status,
        details: Option<String>,
        time: Timestamp,
    ) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            metadata,
            start_time: Some(time),
            end_time: Some(time),
            status: Some(status),
            status_details: details,
            steps: Vec::new(),
        }
    }

    /// Whether the outcome counts as success (passed or disabled)
    #[must_use]
    pub fn is_successful(&self) -> bool {
        self.status.is_some_and(Status::is_successful)
    }
}

/// Outcome of one suite and its subtree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteResult {
    /// Suite name
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// Tags, properties and links
    pub metadata: Metadata,
    /// When the suite began
    pub start_time: Option<Timestamp>,
    /// When the suite finished
    pub end_time: Option<Timestamp>,
    /// Setup phase outcome, absent when nothing was recorded
    pub setup: Option<HookResult>,
    /// Teardown phase outcome, absent when nothing was recorded
    pub teardown: Option<HookResult>,
    /// Test outcomes, in execution order
    pub tests: Vec<TestResult>,
    /// Nested suite outcomes, in execution order
    pub suites: Vec<SuiteResult>,
}

impl SuiteResult {
    /// Record a suite that just began
    #[must_use]
    pub fn started(name: &str, description: &str, metadata: Metadata, time: Timestamp) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            metadata,
            start_time: Some(time),
            end_time: None,
            setup: None,
            teardown: None,
            tests: Vec::new(),
            suites: Vec::new(),
        }
    }

    /// Derived suite status.
    ///
    /// Failed if setup, teardown or any descendant failed; otherwise
    /// skipped if every descendant test (at least one) was skipped;
    /// otherwise passed.
    #[must_use]
    pub fn status(&self) -> Status {
        let hooks_failed = self.setup.as_ref().is_some_and(|h| !h.is_successful())
            || self.teardown.as_ref().is_some_and(|h| !h.is_successful());
        if hooks_failed
            || self
                .tests
                .iter()
                .any(|t| t.status == Some(Status::Failed))
            || self.suites.iter().any(|s| s.status() == Status::Failed)
        {
            return Status::Failed;
        }
        let mut tests = 0usize;
        let mut skipped = 0usize;
        self.walk_tests(&mut |test| {
            tests += 1;
            if test.status == Some(Status::Skipped) {
                skipped += 1;
            }
        });
        if tests > 0 && tests == skipped {
            Status::Skipped
        } else {
            Status::Passed
        }
    }

    /// Whether the whole subtree counts as success
    #[must_use]
    pub fn is_successful(&self) -> bool {
        self.status() != Status::Failed
            && self.tests.iter().all(TestResult::is_successful)
            && self.suites.iter().all(SuiteResult::is_successful)
    }

    /// Visit every test outcome in the subtree, declaration order
    pub fn walk_tests(&self, visit: &mut impl FnMut(&TestResult)) {
        for test in &self.tests {
            visit(test);
        }
        for suite in &self.suites {
            suite.walk_tests(visit);
        }
    }

    fn suite_at(&self, segments: &[String]) -> Option<&SuiteResult> {
        match segments {
            [] => Some(self),
            [head, rest @ ..] => self
                .suites
                .iter()
                .find(|s| s.name == *head)
                .and_then(|s| s.suite_at(rest)),
        }
    }

    fn suite_at_mut(&mut self, segments: &[String]) -> Option<&mut SuiteResult> {
        match segments {
            [] => Some(self),
            [head, rest @ ..] => self
                .suites
                .iter_mut()
                .find(|s| s.name == *head)
                .and_then(|s| s.suite_at_mut(rest)),
        }
    }
}

/// The full record of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Unique run identifier
    pub run_id: RunId,
    /// Free-form key/value info pairs shown by report renderers
    pub info: Vec<(String, String)>,
    /// When the session began
    pub start_time: Option<Timestamp>,
    /// When the session ended
    pub end_time: Option<Timestamp>,
    /// Session setup outcome, absent when nothing was recorded
    pub session_setup: Option<HookResult>,
    /// Session teardown outcome, absent when nothing was recorded
    pub session_teardown: Option<HookResult>,
    /// Top-level suite outcomes, in execution order
    pub suites: Vec<SuiteResult>,
    #[serde(skip)]
    sealed: bool,
}

impl Report {
    /// Create an empty report for a fresh run
    #[must_use]
    pub fn new() -> Self {
        Self {
            run_id: RunId::new(),
            info: Vec::new(),
            start_time: None,
            end_time: None,
            session_setup: None,
            session_teardown: None,
            suites: Vec::new(),
            sealed: false,
        }
    }

    /// Attach an info pair
    pub fn add_info(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.info.push((key.into(), value.into()));
    }

    /// Look up a suite by path
    #[must_use]
    pub fn suite(&self, path: &NodePath) -> Option<&SuiteResult> {
        let [head, rest @ ..] = path.segments() else {
            return None;
        };
        self.suites
            .iter()
            .find(|s| s.name == *head)
            .and_then(|s| s.suite_at(rest))
    }

    /// Look up a suite by path, mutably
    pub fn suite_mut(&mut self, path: &NodePath) -> Option<&mut SuiteResult> {
        let [head, rest @ ..] = path.segments() else {
            return None;
        };
        self.suites
            .iter_mut()
            .find(|s| s.name == *head)
            .and_then(|s| s.suite_at_mut(rest))
    }

    /// Look up a test by path
    #[must_use]
    pub fn test(&self, path: &NodePath) -> Option<&TestResult> {
        let parent = path.parent()?;
        self.suite(&parent)?
            .tests
            .iter()
            .find(|t| t.name == path.name())
    }

    /// Look up a test by path, mutably
    pub fn test_mut(&mut self, path: &NodePath) -> Option<&mut TestResult> {
        let parent = path.parent()?;
        let name = path.name().to_string();
        self.suite_mut(&parent)?
            .tests
            .iter_mut()
            .find(|t| t.name == name)
    }

    /// Steps recorded at a location, mutably; `None` when the node
    /// does not exist (yet)
    pub fn steps_at_mut(&mut self, location: &Location) -> Option<&mut Vec<Step>> {
        match location {
            Location::SessionSetup => self.session_setup.as_mut().map(|h| &mut h.steps),
            Location::SessionTeardown => self.session_teardown.as_mut().map(|h| &mut h.steps),
            Location::SuiteSetup(path) => self
                .suite_mut(path)
                .and_then(|s| s.setup.as_mut())
                .map(|h| &mut h.steps),
            Location::SuiteTeardown(path) => self
                .suite_mut(path)
                .and_then(|s| s.teardown.as_mut())
                .map(|h| &mut h.steps),
            Location::Test(path) => self.test_mut(path).map(|t| &mut t.steps),
        }
    }

    /// Whether every test and hook in the run succeeded
    #[must_use]
    pub fn is_successful(&self) -> bool {
        self.session_setup
            .as_ref()
            .is_none_or(HookResult::is_successful)
            && self
                .session_teardown
                .as_ref()
                .is_none_or(HookResult::is_successful)
            && self.suites.iter().all(SuiteResult::is_successful)
    }

    /// Visit every test outcome in the run, declaration order
    pub fn walk_tests(&self, visit: &mut impl FnMut(&TestResult)) {
        for suite in &self.suites {
            suite.walk_tests(visit);
        }
    }

    /// Mark the report immutable; later mutation attempts are builder bugs
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    /// Whether the report has been sealed
    #[must_use]
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }
}

impl Default for Report {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passed_test(name: &str) -> TestResult {
        let mut test =
            TestResult::started(name, name, Metadata::new(), Timestamp::new(10, 0));
        test.status = Some(Status::Passed);
        test.end_time = Some(Timestamp::new(11, 0));
        test
    }

    fn skipped_test(name: &str) -> TestResult {
        TestResult::bypassed(
            name,
            name,
            Metadata::new(),
            Status::Skipped,
            None,
            Timestamp::new(10, 0),
        )
    }

    #[test]
    fn test_path_lookup() {
        let mut report = Report::new();
        let mut root =
            SuiteResult::started("auth", "Authentication", Metadata::new(), Timestamp::new(1, 0));
        let mut nested =
            SuiteResult::started("tokens", "Tokens", Metadata::new(), Timestamp::new(2, 0));
        nested.tests.push(passed_test("refresh"));
        root.suites.push(nested);
        report.suites.push(root);

        assert!(report.suite(&NodePath::parse("auth")).is_some());
        assert!(report.suite(&NodePath::parse("auth.tokens")).is_some());
        assert!(report.suite(&NodePath::parse("auth.ghost")).is_none());
        assert_eq!(
            report
                .test(&NodePath::parse("auth.tokens.refresh"))
                .unwrap()
                .name,
            "refresh"
        );
        assert!(report.test(&NodePath::parse("auth.tokens.ghost")).is_none());
    }

    #[test]
    fn test_suite_status_failed_on_failing_descendant() {
        let mut suite =
            SuiteResult::started("auth", "Auth", Metadata::new(), Timestamp::new(1, 0));
        let mut failing = passed_test("login");
        failing.status = Some(Status::Failed);
        suite.tests.push(failing);
        suite.tests.push(passed_test("logout"));

        assert_eq!(suite.status(), Status::Failed);
        assert!(!suite.is_successful());
    }

    #[test]
    fn test_suite_status_skipped_when_all_tests_skipped() {
        let mut suite =
            SuiteResult::started("auth", "Auth", Metadata::new(), Timestamp::new(1, 0));
        suite.tests.push(skipped_test("login"));
        let mut nested =
            SuiteResult::started("tokens", "Tokens", Metadata::new(), Timestamp::new(1, 0));
        nested.tests.push(skipped_test("refresh"));
        suite.suites.push(nested);

        assert_eq!(suite.status(), Status::Skipped);
    }

    #[test]
    fn test_suite_status_failed_on_hook_failure() {
        let mut suite =
            SuiteResult::started("auth", "Auth", Metadata::new(), Timestamp::new(1, 0));
        let mut hook = HookResult::started(Timestamp::new(1, 0));
        let mut step = Step::new("Setup", Timestamp::new(1, 0));
        step.entries.push(Entry::Log {
            level: LogLevel::Error,
            message: "db unreachable".to_string(),
            time: Timestamp::new(1, 0),
        });
        hook.steps.push(step);
        suite.setup = Some(hook);
        suite.tests.push(skipped_test("login"));

        assert_eq!(suite.status(), Status::Failed);
    }

    #[test]
    fn test_disabled_counts_as_successful() {
        let test = TestResult::bypassed(
            "login",
            "Login",
            Metadata::new(),
            Status::Disabled,
            None,
            Timestamp::new(1, 0),
        );
        assert!(test.is_successful());
    }

    #[test]
    fn test_serde_round_trip() {
        let mut report = Report::new();
        report.add_info("command", "verdict run");
        let mut suite =
            SuiteResult::started("auth", "Auth", Metadata::new(), Timestamp::new(1, 0));
        suite.tests.push(passed_test("login"));
        report.suites.push(suite);

        let json = serde_json::to_string(&report).unwrap();
        let back: Report = serde_json::from_str(&json).unwrap();
        assert_eq!(back.suites, report.suites);
        assert!(!back.is_sealed());
    }
}
