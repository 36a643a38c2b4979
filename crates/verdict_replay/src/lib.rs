//! Replayable event streams for the Verdict test-execution engine.
//!
//! Two ways to feed a listener after the fact: [`log::EventLog`] re-plays
//! the stream exactly as it arrived, and [`replay::replay_report`] walks a
//! finished report tree and regenerates the canonical declaration-order
//! sequence, independent of how the run was scheduled.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod log;
pub mod replay;

// Re-exports
pub use log::EventLog;
pub use replay::replay_report;
