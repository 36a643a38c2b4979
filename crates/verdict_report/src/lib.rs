//! Report tree for the Verdict test-execution engine.
//!
//! The [`builder::ReportBuilder`] listener folds the run event stream into a
//! [`report::Report`] tree mirroring the suite structure. Saving strategies
//! decide when a serializer flushes the tree to disk during the run.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod builder;
pub mod report;
pub mod saving;
pub mod stats;

// Re-exports
pub use builder::ReportBuilder;
pub use report::{Entry, HookResult, Report, Step, SuiteResult, TestResult};
pub use saving::{ReportSaver, ReportSerializer, SavingStrategy, UnknownSavingStrategy};
pub use stats::ReportStats;
