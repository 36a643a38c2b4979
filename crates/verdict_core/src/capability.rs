//! Run capabilities.
//!
//! A capability is an explicit declaration a caller makes about a run.
//! Parallel execution is opt-in: the scheduler refuses more than one worker
//! thread unless [`RunCapability::Parallelism`] has been granted, since it
//! implies the declared suites tolerate concurrent top-level execution.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A capability declared for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RunCapability {
    /// Top-level suites may execute on concurrent worker threads
    Parallelism,
}

impl RunCapability {
    /// Get a string representation of the capability
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Parallelism => "parallelism",
        }
    }
}

impl std::fmt::Display for RunCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The set of capabilities granted to a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCapabilities {
    capabilities: BTreeSet<RunCapability>,
}

impl RunCapabilities {
    /// Create a new empty capability set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant a capability
    pub fn grant(&mut self, capability: RunCapability) {
        self.capabilities.insert(capability);
    }

    /// Builder-style grant
    #[must_use]
    pub fn with(mut self, capability: RunCapability) -> Self {
        self.grant(capability);
        self
    }

    /// Check whether a capability has been granted
    #[must_use]
    pub fn allows(&self, capability: RunCapability) -> bool {
        self.capabilities.contains(&capability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities_empty_by_default() {
        let caps = RunCapabilities::new();
        assert!(!caps.allows(RunCapability::Parallelism));
    }

    #[test]
    fn test_capabilities_grant() {
        let caps = RunCapabilities::new().with(RunCapability::Parallelism);
        assert!(caps.allows(RunCapability::Parallelism));
    }

    #[test]
    fn test_capability_display() {
        assert_eq!(RunCapability::Parallelism.to_string(), "parallelism");
    }
}
