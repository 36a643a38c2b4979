//! Node paths and report locations.
//!
//! A [`NodePath`] identifies a suite or test node within the suite forest.
//! A [`Location`] is the minimal addressing context carried by step-level
//! events: it says which node (and which phase of it) an entry belongs to.

use serde::{Deserialize, Serialize};

/// Path of a suite or test node, as ordered name segments
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodePath(Vec<String>);

impl NodePath {
    /// Create a path from name segments
    #[must_use]
    pub fn new(segments: Vec<String>) -> Self {
        Self(segments)
    }

    /// Create a single-segment path (a top-level suite)
    #[must_use]
    pub fn root(name: impl Into<String>) -> Self {
        Self(vec![name.into()])
    }

    /// Parse a dotted path such as `suite.sub_suite.test`
    #[must_use]
    pub fn parse(path: &str) -> Self {
        Self(path.split('.').map(str::to_string).collect())
    }

    /// Append a child segment
    #[must_use]
    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(name.into());
        Self(segments)
    }

    /// Path of the parent node, or `None` for a top-level node
    #[must_use]
    pub fn parent(&self) -> Option<NodePath> {
        if self.0.len() > 1 {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        } else {
            None
        }
    }

    /// Name of the node itself (last segment)
    #[must_use]
    pub fn name(&self) -> &str {
        self.0.last().map_or("", String::as_str)
    }

    /// Path segments
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Number of segments
    #[must_use]
    pub fn depth(&self) -> usize {
        self.0.len()
    }
}

impl std::fmt::Display for NodePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

/// Where a step-level event happened
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "in", content = "path")]
pub enum Location {
    /// Session-wide setup phase
    SessionSetup,
    /// Session-wide teardown phase
    SessionTeardown,
    /// Setup phase of the suite at the given path
    SuiteSetup(NodePath),
    /// Teardown phase of the suite at the given path
    SuiteTeardown(NodePath),
    /// Body of the test at the given path
    Test(NodePath),
}

impl Location {
    /// Path of the owning node, if the location addresses one
    #[must_use]
    pub fn path(&self) -> Option<&NodePath> {
        match self {
            Self::SessionSetup | Self::SessionTeardown => None,
            Self::SuiteSetup(path) | Self::SuiteTeardown(path) | Self::Test(path) => Some(path),
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SessionSetup => write!(f, "session setup"),
            Self::SessionTeardown => write!(f, "session teardown"),
            Self::SuiteSetup(path) => write!(f, "'{path}' suite setup"),
            Self::SuiteTeardown(path) => write!(f, "'{path}' suite teardown"),
            Self::Test(path) => write!(f, "'{path}' test"),
        }
    }
}
