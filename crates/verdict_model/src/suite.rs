//! Suite descriptor.

use std::sync::Arc;

use indexmap::IndexSet;
use verdict_core::Metadata;

use crate::context::{BodyContext, BodyFn, BodyOutcome};
use crate::error::{ModelError, ModelResult};
use crate::test::TestDescriptor;

/// A setup or teardown hook attached to a suite
#[derive(Clone)]
pub struct Hook {
    /// Ordered fixture parameter names the hook consumes
    pub fixtures: Vec<String>,
    body: BodyFn,
}

impl Hook {
    /// Create a hook
    #[must_use]
    pub fn new(body: impl Fn(&mut dyn BodyContext) -> BodyOutcome + Send + Sync + 'static) -> Self {
        Self {
            fixtures: Vec::new(),
            body: Arc::new(body),
        }
    }

    /// Declare fixture parameters consumed by the hook
    #[must_use]
    pub fn with_fixtures(mut self, names: &[&str]) -> Self {
        self.fixtures = names.iter().map(|n| (*n).to_string()).collect();
        self
    }

    /// The hook closure
    #[must_use]
    pub fn body(&self) -> &BodyFn {
        &self.body
    }
}

impl std::fmt::Debug for Hook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hook")
            .field("fixtures", &self.fixtures)
            .finish_non_exhaustive()
    }
}

/// A declared suite: tests, optional hooks and nested sub-suites.
///
/// Suites form a forest; children are owned by their parent node.
#[derive(Debug, Clone)]
pub struct SuiteDescriptor {
    /// Suite name, unique among its siblings
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// Tags, properties and links
    pub metadata: Metadata,
    /// Whether the whole suite (and every descendant) is disabled
    pub disabled: bool,
    /// Ordered tests
    pub tests: Vec<TestDescriptor>,
    /// Ordered nested sub-suites
    pub suites: Vec<SuiteDescriptor>,
    /// Optional setup hook, run before any child
    pub setup: Option<Hook>,
    /// Optional teardown hook, always attempted after the children
    pub teardown: Option<Hook>,
}

impl SuiteDescriptor {
    /// Create an empty suite
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            metadata: Metadata::new(),
            disabled: false,
            tests: Vec::new(),
            suites: Vec::new(),
            setup: None,
            teardown: None,
        }
    }

    /// Add a test
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DuplicateTest`] if a test with the same name
    /// is already registered.
    pub fn add_test(&mut self, test: TestDescriptor) -> ModelResult<()> {
        if self.tests.iter().any(|t| t.name == test.name) {
            return Err(ModelError::DuplicateTest {
                name: test.name,
                suite: self.name.clone(),
            });
        }
        self.tests.push(test);
        Ok(())
    }

    /// Add a nested sub-suite
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DuplicateSuite`] if a sub-suite with the same
    /// name is already registered.
    pub fn add_suite(&mut self, suite: SuiteDescriptor) -> ModelResult<()> {
        if self.suites.iter().any(|s| s.name == suite.name) {
            return Err(ModelError::DuplicateSuite {
                name: suite.name,
                suite: self.name.clone(),
            });
        }
        self.suites.push(suite);
        Ok(())
    }

    /// Fixture names consumed directly by this suite's hooks
    #[must_use]
    pub fn hook_fixtures(&self) -> IndexSet<String> {
        let mut fixtures = IndexSet::new();
        if let Some(setup) = &self.setup {
            fixtures.extend(setup.fixtures.iter().cloned());
        }
        if let Some(teardown) = &self.teardown {
            fixtures.extend(teardown.fixtures.iter().cloned());
        }
        fixtures
    }

    /// Fixture names used by this suite's hooks and its own tests
    /// (sub-suites excluded)
    #[must_use]
    pub fn local_fixtures(&self) -> IndexSet<String> {
        let mut fixtures = self.hook_fixtures();
        for test in &self.tests {
            fixtures.extend(test.fixtures.iter().cloned());
        }
        fixtures
    }

    /// Fixture names used anywhere in this subtree
    #[must_use]
    pub fn all_fixtures(&self) -> IndexSet<String> {
        let mut fixtures = self.local_fixtures();
        for sub_suite in &self.suites {
            fixtures.extend(sub_suite.all_fixtures());
        }
        fixtures
    }

    /// Number of tests in this subtree
    #[must_use]
    pub fn test_count(&self) -> usize {
        self.tests.len() + self.suites.iter().map(SuiteDescriptor::test_count).sum::<usize>()
    }
}

/// Fixture names used anywhere in a suite forest
#[must_use]
pub fn forest_fixtures(suites: &[SuiteDescriptor]) -> IndexSet<String> {
    let mut fixtures = IndexSet::new();
    for suite in suites {
        fixtures.extend(suite.all_fixtures());
    }
    fixtures
}
