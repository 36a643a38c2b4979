//! Suite and test metadata.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A link attached to a suite or test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Target URL
    pub url: String,
    /// Optional human-readable label
    pub label: Option<String>,
}

impl Link {
    /// Create a link without a label
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            label: None,
        }
    }

    /// Create a link with a label
    #[must_use]
    pub fn with_label(url: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            label: Some(label.into()),
        }
    }
}

/// Metadata attached to a suite or test node
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Ordered tag set
    pub tags: Vec<String>,
    /// Property map
    pub properties: IndexMap<String, String>,
    /// Ordered link list
    pub links: Vec<Link>,
}

impl Metadata {
    /// Create empty metadata
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tag, ignoring duplicates
    pub fn add_tag(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
    }

    /// Set a property
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(key.into(), value.into());
    }

    /// Add a link
    pub fn add_link(&mut self, link: Link) {
        self.links.push(link);
    }

    /// Whether any metadata is present
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.properties.is_empty() && self.links.is_empty()
    }
}
