//! Fixture registry and dependency-graph validation.

use indexmap::{IndexMap, IndexSet};
use verdict_core::NodePath;
use verdict_model::{SuiteDescriptor, forest_fixtures};

use crate::error::{FixtureError, FixtureResult};
use crate::fixture::{Fixture, Scope};

/// All declared fixtures, validated as a whole before a run starts.
///
/// Registration order is preserved; it is the tie-breaker wherever the
/// engine needs a deterministic fixture ordering.
#[derive(Debug, Default)]
pub struct FixtureRegistry {
    fixtures: IndexMap<String, Fixture>,
}

impl FixtureRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fixture
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::Duplicate`] if the name is taken.
    pub fn register(&mut self, fixture: Fixture) -> FixtureResult<()> {
        if self.fixtures.contains_key(&fixture.name) {
            return Err(FixtureError::Duplicate { name: fixture.name });
        }
        self.fixtures.insert(fixture.name.clone(), fixture);
        Ok(())
    }

    /// Look up a fixture by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Fixture> {
        self.fixtures.get(name)
    }

    /// Whether a fixture is registered
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.fixtures.contains_key(name)
    }

    /// Number of registered fixtures
    #[must_use]
    pub fn len(&self) -> usize {
        self.fixtures.len()
    }

    /// Whether the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fixtures.is_empty()
    }

    /// Validate the dependency graph: every dependency exists, scopes are
    /// compatible and there is no cycle.
    ///
    /// # Errors
    ///
    /// Returns the first [`FixtureError::Unknown`],
    /// [`FixtureError::IncompatibleScope`] or [`FixtureError::Cycle`] found.
    pub fn validate(&self) -> FixtureResult<()> {
        for fixture in self.fixtures.values() {
            for dependency in &fixture.dependencies {
                let Some(dep) = self.fixtures.get(dependency) else {
                    return Err(FixtureError::Unknown {
                        name: dependency.clone(),
                        required_by: fixture.name.clone(),
                    });
                };
                if dep.scope.level() < fixture.scope.level() {
                    return Err(FixtureError::IncompatibleScope {
                        name: fixture.name.clone(),
                        scope: fixture.scope,
                        dependency: dependency.clone(),
                        dependency_scope: dep.scope,
                    });
                }
            }
        }

        let mut done: IndexSet<String> = IndexSet::new();
        for name in self.fixtures.keys() {
            let mut trail: Vec<String> = Vec::new();
            self.walk_for_cycles(name, &mut trail, &mut done)?;
        }
        Ok(())
    }

    fn walk_for_cycles(
        &self,
        name: &str,
        trail: &mut Vec<String>,
        done: &mut IndexSet<String>,
    ) -> FixtureResult<()> {
        if done.contains(name) {
            return Ok(());
        }
        if let Some(start) = trail.iter().position(|n| n == name) {
            let mut path: Vec<String> = trail[start..].to_vec();
            path.push(name.to_string());
            return Err(FixtureError::Cycle { path });
        }
        trail.push(name.to_string());
        if let Some(fixture) = self.fixtures.get(name) {
            for dependency in &fixture.dependencies {
                self.walk_for_cycles(dependency, trail, done)?;
            }
        }
        trail.pop();
        done.insert(name.to_string());
        Ok(())
    }

    /// Check that every fixture referenced by the suite forest is
    /// registered, reporting all unresolved names at once, and that suite
    /// hooks only declare fixtures of suite scope or wider.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::MissingInSuites`] listing every unresolved
    /// name in first-use order, or [`FixtureError::HookScope`] for the
    /// first hook fixture narrower than suite scope.
    pub fn check_against_suites(&self, suites: &[SuiteDescriptor]) -> FixtureResult<()> {
        let missing: Vec<String> = forest_fixtures(suites)
            .into_iter()
            .filter(|name| !self.fixtures.contains_key(name))
            .collect();
        if !missing.is_empty() {
            return Err(FixtureError::MissingInSuites { names: missing });
        }
        for suite in suites {
            self.check_hook_scopes(&NodePath::root(&suite.name), suite)?;
        }
        Ok(())
    }

    fn check_hook_scopes(&self, path: &NodePath, suite: &SuiteDescriptor) -> FixtureResult<()> {
        for name in suite.hook_fixtures() {
            let Some(fixture) = self.fixtures.get(&name) else {
                continue;
            };
            if fixture.scope.level() < Scope::Suite.level() {
                return Err(FixtureError::HookScope {
                    suite: path.to_string(),
                    name,
                    scope: fixture.scope,
                });
            }
        }
        for sub_suite in &suite.suites {
            self.check_hook_scopes(&path.child(&sub_suite.name), sub_suite)?;
        }
        Ok(())
    }

    /// Transitive dependency closure of the given names, dependencies
    /// before dependents.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::Unknown`] for a name absent from the
    /// registry. Call [`FixtureRegistry::validate`] first to rule out
    /// cycles.
    pub fn dependency_closure<'a>(
        &self,
        names: impl IntoIterator<Item = &'a str>,
        required_by: &str,
    ) -> FixtureResult<IndexSet<String>> {
        let mut closure = IndexSet::new();
        for name in names {
            self.close_over(name, required_by, &mut closure)?;
        }
        Ok(closure)
    }

    fn close_over(
        &self,
        name: &str,
        required_by: &str,
        closure: &mut IndexSet<String>,
    ) -> FixtureResult<()> {
        if closure.contains(name) {
            return Ok(());
        }
        let Some(fixture) = self.fixtures.get(name) else {
            return Err(FixtureError::Unknown {
                name: name.to_string(),
                required_by: required_by.to_string(),
            });
        };
        for dependency in &fixture.dependencies {
            self.close_over(dependency, &fixture.name, closure)?;
        }
        closure.insert(name.to_string());
        Ok(())
    }

    /// Restrict a closure to the fixtures declared at exactly `scope`
    #[must_use]
    pub fn scheduled_for(&self, closure: &IndexSet<String>, scope: Scope) -> IndexSet<String> {
        closure
            .iter()
            .filter(|name| {
                self.fixtures
                    .get(name.as_str())
                    .is_some_and(|f| f.scope == scope)
            })
            .cloned()
            .collect()
    }
}
