//! Content tree types shared by the engine, the selector, and the CLI.

use crate::error::StorageError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Opaque reference to the rendered element a node came from.
///
/// Owned by whoever produced the snapshot; the engine only passes it through
/// to the effect sink.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeHandle(String);

impl NodeHandle {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Viewport rectangle in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub top: f64,
    pub left: f64,
    pub right: f64,
    pub bottom: f64,
}

impl BoundingBox {
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        !(self.left > other.right
            || self.right < other.left
            || self.top > other.bottom
            || self.bottom < other.top)
    }
}

/// One node of an accessibility-style content tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentNode {
    /// Tag or ARIA role
    pub role: String,
    /// Flattened accessible text
    #[serde(default)]
    pub content: String,
    /// Children in document order
    #[serde(default)]
    pub children: Vec<ContentNode>,
    pub handle: NodeHandle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,
}

impl ContentNode {
    pub fn new(role: impl Into<String>, content: impl Into<String>, handle: NodeHandle) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
            children: Vec::new(),
            handle,
            bounding_box: None,
        }
    }

    pub fn with_children(mut self, children: Vec<ContentNode>) -> Self {
        self.children = children;
        self
    }

    pub fn with_bounding_box(mut self, bounding_box: BoundingBox) -> Self {
        self.bounding_box = Some(bounding_box);
        self
    }

    /// Content length in Unicode scalar values.
    pub fn content_len(&self) -> usize {
        self.content.chars().count()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Total number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(ContentNode::node_count).sum::<usize>()
    }

    /// Parse a snapshot document produced by the tree snapshotter.
    pub fn from_json(json: &str) -> Result<Self, StorageError> {
        serde_json::from_str(json).map_err(|e| StorageError::InvalidSnapshot(e.to_string()))
    }

    /// Read a snapshot document from disk.
    pub fn load(path: &Path) -> Result<Self, StorageError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw).map_err(|e| match e {
            StorageError::InvalidSnapshot(msg) => {
                StorageError::InvalidSnapshot(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }
}
