//! Verdict Core Types
//!
//! This crate contains pure types shared across the engine with no I/O:
//! timestamps, result statuses, node paths and report locations, metadata,
//! run capabilities and identifiers.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod capability;
pub mod id;
pub mod location;
pub mod metadata;
pub mod status;
pub mod time;
pub mod value;

// Re-exports
pub use capability::{RunCapabilities, RunCapability};
pub use id::RunId;
pub use location::{Location, NodePath};
pub use metadata::{Link, Metadata};
pub use status::Status;
pub use time::{Duration, Timestamp};
pub use value::{FixtureValue, LogLevel, downcast_fixture};
