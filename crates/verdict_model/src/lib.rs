//! Verdict suite/test descriptor model.
//!
//! Suites and tests are declared through an explicit builder API producing a
//! descriptor forest; nothing is discovered by reflection. Bodies and hooks
//! are plain closures receiving an execution context.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod builder;
pub mod context;
pub mod suite;

mod error;

// Re-exports
pub use builder::{SuiteBuilder, validate_name};
pub use context::{Abort, BodyContext, BodyFn, BodyOutcome, fixture_of};
pub use error::{ModelError, ModelResult};
pub use suite::{Hook, SuiteDescriptor, forest_fixtures};
pub use test::TestDescriptor;
