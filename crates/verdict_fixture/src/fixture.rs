//! Fixture declarations and scopes.

use std::sync::Arc;

use indexmap::IndexMap;
use verdict_core::FixtureValue;

use crate::error::{FixtureError, FixtureResult};

/// Names the engine reserves; user fixtures cannot take them
pub const RESERVED_NAMES: &[&str] = &["fixture_name"];

/// Lifetime a fixture value is cached for.
///
/// Wider scopes carry a higher level; a fixture may only depend on fixtures
/// whose scope is at least as wide as its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Scope {
    /// Built per test, torn down when the test ends
    Test,
    /// Built per suite, torn down when the suite ends
    Suite,
    /// Built once per session
    Session,
    /// Built before the session starts, outside any reported node
    PreRun,
}

impl Scope {
    /// Numeric width, narrowest first
    #[must_use]
    pub fn level(self) -> u8 {
        match self {
            Scope::Test => 1,
            Scope::Suite => 2,
            Scope::Session => 3,
            Scope::PreRun => 4,
        }
    }

    /// Scope name as used in declarations
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Scope::Test => "test",
            Scope::Suite => "suite",
            Scope::Session => "session",
            Scope::PreRun => "pre_run",
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved dependency values handed to a fixture factory
#[derive(Default)]
pub struct FixtureArgs {
    values: IndexMap<String, FixtureValue>,
}

impl FixtureArgs {
    /// Build an argument set from resolved values
    #[must_use]
    pub fn new(values: IndexMap<String, FixtureValue>) -> Self {
        Self { values }
    }

    /// Value of a declared dependency
    #[must_use]
    pub fn get(&self, name: &str) -> Option<FixtureValue> {
        self.values.get(name).map(Arc::clone)
    }

    /// Value of a declared dependency, downcast to its concrete type
    #[must_use]
    pub fn get_as<T: std::any::Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.get(name)
            .and_then(|value| verdict_core::downcast_fixture::<T>(&value))
    }
}

/// Factory closure building a fixture value from its dependencies
pub type FactoryFn = Arc<dyn Fn(&FixtureArgs) -> anyhow::Result<FixtureValue> + Send + Sync>;

/// Teardown closure releasing a built fixture value
pub type TeardownFn = Arc<dyn Fn(&FixtureValue) -> anyhow::Result<()> + Send + Sync>;

/// A declared fixture: name, scope, dependencies and factory.
#[derive(Clone)]
pub struct Fixture {
    /// Unique fixture name, also the parameter name consumers declare
    pub name: String,
    /// Cache lifetime
    pub scope: Scope,
    /// Ordered dependency fixture names
    pub dependencies: Vec<String>,
    factory: FactoryFn,
    teardown: Option<TeardownFn>,
}

impl Fixture {
    /// Declare a fixture
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::ReservedName`] if the name is reserved.
    pub fn new(
        name: impl Into<String>,
        scope: Scope,
        factory: impl Fn(&FixtureArgs) -> anyhow::Result<FixtureValue> + Send + Sync + 'static,
    ) -> FixtureResult<Self> {
        let name = name.into();
        if RESERVED_NAMES.contains(&name.as_str()) {
            return Err(FixtureError::ReservedName { name });
        }
        Ok(Self {
            name,
            scope,
            dependencies: Vec::new(),
            factory: Arc::new(factory),
            teardown: None,
        })
    }

    /// Declare dependencies resolved before the factory runs
    #[must_use]
    pub fn with_dependencies(mut self, names: &[&str]) -> Self {
        self.dependencies = names.iter().map(|n| (*n).to_string()).collect();
        self
    }

    /// Attach a teardown closure, run when the owning scope ends
    #[must_use]
    pub fn with_teardown(
        mut self,
        teardown: impl Fn(&FixtureValue) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.teardown = Some(Arc::new(teardown));
        self
    }

    /// The factory closure
    #[must_use]
    pub fn factory(&self) -> &FactoryFn {
        &self.factory
    }

    /// The teardown closure, if any
    #[must_use]
    pub fn teardown(&self) -> Option<&TeardownFn> {
        self.teardown.as_ref()
    }
}

impl std::fmt::Debug for Fixture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fixture")
            .field("name", &self.name)
            .field("scope", &self.scope)
            .field("dependencies", &self.dependencies)
            .field("has_teardown", &self.teardown.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_levels_widen() {
        assert!(Scope::Test.level() < Scope::Suite.level());
        assert!(Scope::Suite.level() < Scope::Session.level());
        assert!(Scope::Session.level() < Scope::PreRun.level());
    }

    #[test]
    fn test_reserved_name_rejected() {
        let result = Fixture::new("fixture_name", Scope::Test, |_| {
            Ok(Arc::new(0u32) as FixtureValue)
        });
        assert!(matches!(result, Err(FixtureError::ReservedName { .. })));
    }

    #[test]
    fn test_args_downcast() {
        let mut values = IndexMap::new();
        values.insert("port".to_string(), Arc::new(8080u16) as FixtureValue);
        let args = FixtureArgs::new(values);

        assert_eq!(*args.get_as::<u16>("port").unwrap(), 8080);
        assert!(args.get_as::<String>("port").is_none());
        assert!(args.get("missing").is_none());
    }

    #[test]
    fn test_factory_receives_dependencies() {
        let fixture = Fixture::new("url", Scope::Session, |args| {
            let port = args.get_as::<u16>("port").unwrap();
            Ok(Arc::new(format!("http://localhost:{port}")) as FixtureValue)
        })
        .unwrap()
        .with_dependencies(&["port"]);

        let mut values = IndexMap::new();
        values.insert("port".to_string(), Arc::new(8080u16) as FixtureValue);
        let value = (fixture.factory())(&FixtureArgs::new(values)).unwrap();
        let url = verdict_core::downcast_fixture::<String>(&value).unwrap();
        assert_eq!(*url, "http://localhost:8080");
    }
}
