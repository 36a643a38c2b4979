//! Run event vocabulary and dispatch for the Verdict test-execution engine.
//!
//! Every observable fact about a run is an [`event::Event`]. Producers fire
//! them at an [`bus::EventBus`]; the bus serializes delivery so listeners
//! always observe one globally ordered stream, whether the run itself is
//! sequential or parallel.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bus;
pub mod event;
pub mod listener;

// Re-exports
pub use bus::EventBus;
pub use event::{Event, EventKind, SuiteInfo, TestInfo};
pub use listener::{Listener, dispatch};
