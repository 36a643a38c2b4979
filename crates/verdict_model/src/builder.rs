//! Explicit suite construction API.

use verdict_core::Metadata;

use crate::context::{BodyContext, BodyOutcome};
use crate::error::{ModelError, ModelResult};
use crate::suite::{Hook, SuiteDescriptor};
use crate::test::TestDescriptor;

/// Check that a node name is usable as a path segment
///
/// # Errors
///
/// Returns [`ModelError::InvalidName`] for empty names and names containing
/// the `.` path separator or whitespace.
pub fn validate_name(name: &str) -> ModelResult<()> {
    if name.is_empty() {
        return Err(ModelError::InvalidName {
            name: name.to_string(),
            reason: "name is empty".to_string(),
        });
    }
    if name.contains('.') {
        return Err(ModelError::InvalidName {
            name: name.to_string(),
            reason: "name contains the '.' path separator".to_string(),
        });
    }
    if name.chars().any(char::is_whitespace) {
        return Err(ModelError::InvalidName {
            name: name.to_string(),
            reason: "name contains whitespace".to_string(),
        });
    }
    Ok(())
}

/// Builder assembling a single suite, its tests and its sub-suites.
///
/// Validates names on entry so a finished descriptor never carries an
/// unusable path segment.
#[derive(Debug)]
pub struct SuiteBuilder {
    suite: SuiteDescriptor,
}

impl SuiteBuilder {
    /// Start a suite
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidName`] if the name is not a valid
    /// path segment.
    pub fn new(name: &str, description: &str) -> ModelResult<Self> {
        validate_name(name)?;
        Ok(Self {
            suite: SuiteDescriptor::new(name, description),
        })
    }

    /// Mark the suite disabled; every descendant reports as disabled
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.suite.disabled = true;
        self
    }

    /// Replace the suite metadata
    #[must_use]
    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.suite.metadata = metadata;
        self
    }

    /// Attach the setup hook, run before any child
    #[must_use]
    pub fn setup(mut self, hook: Hook) -> Self {
        self.suite.setup = Some(hook);
        self
    }

    /// Attach the teardown hook, always attempted after the children
    #[must_use]
    pub fn teardown(mut self, hook: Hook) -> Self {
        self.suite.teardown = Some(hook);
        self
    }

    /// Add a test
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidName`] for an unusable test name and
    /// [`ModelError::DuplicateTest`] for a name already taken in this suite.
    pub fn test(mut self, test: TestDescriptor) -> ModelResult<Self> {
        validate_name(&test.name)?;
        self.suite.add_test(test)?;
        Ok(self)
    }

    /// Shorthand for a fixture-less test
    ///
    /// # Errors
    ///
    /// Same as [`SuiteBuilder::test`].
    pub fn simple_test(
        self,
        name: &str,
        description: &str,
        body: impl Fn(&mut dyn BodyContext) -> BodyOutcome + Send + Sync + 'static,
    ) -> ModelResult<Self> {
        self.test(TestDescriptor::new(name, description, body))
    }

    /// Add a nested sub-suite
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DuplicateSuite`] for a name already taken in
    /// this suite.
    pub fn sub_suite(mut self, suite: SuiteDescriptor) -> ModelResult<Self> {
        self.suite.add_suite(suite)?;
        Ok(self)
    }

    /// Finish the suite
    #[must_use]
    pub fn build(self) -> SuiteDescriptor {
        self.suite
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("auth").is_ok());
        assert!(validate_name("auth_v2").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("auth.tokens").is_err());
        assert!(validate_name("auth tokens").is_err());
    }

    #[test]
    fn test_builder_assembles_suite() {
        let nested = SuiteBuilder::new("tokens", "Token handling")
            .unwrap()
            .simple_test("refresh", "Refresh works", |_| Ok(()))
            .unwrap()
            .build();

        let suite = SuiteBuilder::new("auth", "Authentication")
            .unwrap()
            .setup(Hook::new(|_| Ok(())).with_fixtures(&["db"]))
            .simple_test("login", "Login works", |_| Ok(()))
            .unwrap()
            .sub_suite(nested)
            .unwrap()
            .build();

        assert_eq!(suite.name, "auth");
        assert_eq!(suite.tests.len(), 1);
        assert_eq!(suite.suites.len(), 1);
        assert!(suite.setup.is_some());
        assert_eq!(suite.test_count(), 2);
    }

    #[test]
    fn test_builder_rejects_bad_test_name() {
        let result = SuiteBuilder::new("auth", "Authentication")
            .unwrap()
            .simple_test("log in", "Login works", |_| Ok(()));
        assert!(matches!(result, Err(ModelError::InvalidName { .. })));
    }

    #[test]
    fn test_builder_rejects_duplicate() {
        let result = SuiteBuilder::new("auth", "Authentication")
            .unwrap()
            .simple_test("login", "Login works", |_| Ok(()))
            .unwrap()
            .simple_test("login", "Login again", |_| Ok(()));
        assert!(matches!(result, Err(ModelError::DuplicateTest { .. })));
    }
}
