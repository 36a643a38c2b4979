//! Execution engine for the Verdict test-execution framework.
//!
//! [`session::run`] takes a validated suite forest, a fixture registry and a
//! set of listeners, and drives the whole session: fixture resolution, test
//! and hook state machines, sequential or pooled suite execution, and the
//! ordered event stream every listener observes.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod context;
pub mod pool;
pub mod session;

// Re-exports
pub use config::{RunConfig, RunError};
pub use context::TestContext;
pub use session::run;
