//! Fixture dependency injection for the Verdict test-execution engine.
//!
//! Fixtures are named, scope-bound values built on first request and cached
//! for the lifetime of their scope. The [`registry::FixtureRegistry`] holds
//! the declarations and validates the dependency graph up front; the
//! [`store::FixtureStore`] chain resolves values at run time.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod fixture;
pub mod registry;
pub mod store;

mod error;

// Re-exports
pub use error::{FixtureError, FixtureResult};
pub use fixture::{Fixture, FixtureArgs, Scope};
pub use registry::FixtureRegistry;
pub use store::FixtureStore;
