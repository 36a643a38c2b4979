//! Run configuration and configuration-grade errors.

use std::path::PathBuf;

use verdict_core::{RunCapabilities, RunCapability};
use verdict_fixture::FixtureError;
use verdict_model::ModelError;

/// Settings for one session.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Directory attachments and saved reports are written under
    pub report_dir: PathBuf,
    /// Run disabled tests as if they were enabled
    pub force_disabled: bool,
    /// After any failure, bypass the top-level suites not yet started
    pub stop_on_failure: bool,
    /// Worker threads; 1 means fully sequential execution
    pub nb_threads: usize,
    /// Capabilities granted to this run
    pub capabilities: RunCapabilities,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            report_dir: PathBuf::from("report"),
            force_disabled: false,
            stop_on_failure: false,
            nb_threads: 1,
            capabilities: RunCapabilities::default(),
        }
    }
}

/// Errors that prevent a session from starting.
///
/// Anything that happens after the session is underway (failing checks,
/// aborts, panics, teardown errors) degrades to report data instead.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// The fixture registry or the suites' fixture references are invalid
    #[error(transparent)]
    Fixture(#[from] FixtureError),

    /// The descriptor forest is invalid
    #[error(transparent)]
    Model(#[from] ModelError),

    /// `nb_threads` must be at least 1
    #[error("invalid thread count {nb_threads}, at least 1 worker is required")]
    InvalidThreadCount {
        /// Rejected value
        nb_threads: usize,
    },

    /// The configuration asks for something the run was not granted
    #[error("configuration requires the '{capability}' capability")]
    MissingCapability {
        /// The missing capability
        capability: RunCapability,
    },

    /// A pre-run fixture failed to build; nothing was reported yet, so
    /// this is configuration-grade
    #[error("pre-run fixture '{name}' failed")]
    PreRunFixture {
        /// Fixture name
        name: String,
        /// Underlying failure
        #[source]
        error: FixtureError,
    },

    /// The report directory could not be created
    #[error("cannot create report directory '{}'", path.display())]
    ReportDir {
        /// The rejected path
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_sequential() {
        let config = RunConfig::default();
        assert_eq!(config.nb_threads, 1);
        assert!(!config.stop_on_failure);
        assert!(!config.force_disabled);
    }

    #[test]
    fn test_missing_capability_display() {
        let err = RunError::MissingCapability {
            capability: RunCapability::Parallelism,
        };
        assert_eq!(
            err.to_string(),
            "configuration requires the 'parallelism' capability"
        );
    }
}
