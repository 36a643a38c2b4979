//! Fixture registration, validation and resolution errors.

use crate::fixture::Scope;

/// Fixture result type
pub type FixtureResult<T> = Result<T, FixtureError>;

/// Errors raised by the fixture registry and store
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FixtureError {
    /// A fixture with the same name is already registered
    #[error("a fixture named '{name}' is already registered")]
    Duplicate {
        /// Duplicate fixture name
        name: String,
    },

    /// The name is reserved for engine use
    #[error("fixture name '{name}' is reserved")]
    ReservedName {
        /// Offending name
        name: String,
    },

    /// A declared dependency does not exist in the registry
    #[error("fixture '{required_by}' depends on unknown fixture '{name}'")]
    Unknown {
        /// Missing fixture name
        name: String,
        /// The fixture (or node) that requires it
        required_by: String,
    },

    /// The dependency graph contains a cycle
    #[error("circular fixture dependency: {}", path.join(" -> "))]
    Cycle {
        /// Cycle path, first name repeated last
        path: Vec<String>,
    },

    /// A fixture depends on another with a narrower scope
    #[error(
        "fixture '{name}' with scope '{scope}' cannot depend on '{dependency}' with narrower scope '{dependency_scope}'"
    )]
    IncompatibleScope {
        /// Depending fixture
        name: String,
        /// Its scope
        scope: Scope,
        /// The dependency
        dependency: String,
        /// The dependency's scope
        dependency_scope: Scope,
    },

    /// A suite hook uses a fixture narrower than suite scope
    #[error("suite '{suite}' uses fixture '{name}' whose scope '{scope}' is narrower than 'suite'")]
    HookScope {
        /// Path of the offending suite
        suite: String,
        /// Fixture name declared by a hook
        name: String,
        /// The fixture's scope
        scope: Scope,
    },

    /// Suites reference fixtures absent from the registry
    #[error("fixtures used in suites but never registered: {}", names.join(", "))]
    MissingInSuites {
        /// Every unresolved name, in first-use order
        names: Vec<String>,
    },

    /// A fixture factory failed or panicked
    #[error("setup of fixture '{name}' failed: {message}")]
    Setup {
        /// Fixture name
        name: String,
        /// Failure detail
        message: String,
    },

    /// A fixture teardown failed or panicked
    #[error("teardown of fixture '{name}' failed: {message}")]
    Teardown {
        /// Fixture name
        name: String,
        /// Failure detail
        message: String,
    },

    /// A fixture was requested from a store chain that does not own it
    #[error("fixture '{name}' is not scheduled in any reachable scope")]
    NotScheduled {
        /// Fixture name
        name: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_display() {
        let err = FixtureError::Cycle {
            path: vec!["a".to_string(), "b".to_string(), "a".to_string()],
        };
        assert_eq!(err.to_string(), "circular fixture dependency: a -> b -> a");
    }

    #[test]
    fn test_missing_in_suites_display() {
        let err = FixtureError::MissingInSuites {
            names: vec!["db".to_string(), "clock".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "fixtures used in suites but never registered: db, clock"
        );
    }
}
