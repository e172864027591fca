//! Tree node model for the citation source catalog
//!
//! The catalog shown on the left of the picker is a forest of [`TreeNode`]s,
//! one root per panel. Every node is identified by a [`NodeKey`], a
//! slash-separated path whose prefix is the key of its parent.
//!
//! ```text
//! bib                    (My Bibliography)
//! ├── bib/references     (references.json)
//! └── bib/thesis         (thesis.json)
//! doi                    (From DOI)
//! ```
//!
//! Containment is decided on key paths alone: a node contains itself and
//! every key that extends its own by one or more segments.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Segment separator inside a [`NodeKey`]
pub const KEY_SEPARATOR: char = '/';

/// Path-like identifier of a tree node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeKey(String);

impl NodeKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Key of a direct child: `self/segment`
    pub fn join(&self, segment: &str) -> Self {
        Self(format!("{}{}{}", self.0, KEY_SEPARATOR, segment))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterate over the path segments
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(KEY_SEPARATOR)
    }

    /// Whether `other` is this key or lies below it
    ///
    /// Matching is segment-wise, so `bib` contains `bib/refs` but not `bibx`.
    pub fn contains(&self, other: &NodeKey) -> bool {
        let mut mine = self.segments();
        let mut theirs = other.segments();
        loop {
            match (mine.next(), theirs.next()) {
                (None, _) => return true,
                (Some(_), None) => return false,
                (Some(a), Some(b)) if a != b => return false,
                _ => {}
            }
        }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

/// A node in the citation catalog
///
/// Nodes are built once per session and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub key: NodeKey,
    pub label: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn new(key: impl Into<NodeKey>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            children: Vec::new(),
        }
    }

    /// Append a child whose key is `self.key/segment`
    pub fn child(mut self, segment: &str, label: impl Into<String>) -> Self {
        let node = TreeNode::new(self.key.join(segment), label);
        self.children.push(node);
        self
    }

    /// Whether this node's subtree contains `key`
    pub fn contains(&self, key: &NodeKey) -> bool {
        self.key.contains(key)
    }

    /// Find a node by key anywhere in this subtree
    pub fn find(&self, key: &NodeKey) -> Option<&TreeNode> {
        if &self.key == key {
            return Some(self);
        }
        if !self.contains(key) {
            return None;
        }
        self.children.iter().find_map(|child| child.find(key))
    }

    /// Depth-first, pre-order walk of the subtree
    pub fn walk(&self) -> Vec<&TreeNode> {
        let mut out = vec![self];
        for child in &self.children {
            out.extend(child.walk());
        }
        out
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Find a node by key across a forest of roots
pub fn find_in<'a>(roots: &'a [TreeNode], key: &NodeKey) -> Option<&'a TreeNode> {
    roots.iter().find_map(|root| root.find(key))
}
