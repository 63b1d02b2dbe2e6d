//! Tree Node Data Structures
//!
//! `TreeNode` is one position in a replica's tree. Nodes live in an arena owned by
//! [`crate::tree::MediaTree`] and are addressed internally by `NodeId`, which is
//! local to one replica and never leaves the process. Peers address nodes by
//! `NodePath`, a branch plus a sequence of display names.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::node_kind::{Branch, NodeKind};
use super::record::RecordRef;

/// Arena handle for a node inside one replica's tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// A node in the replicated tree
///
/// # Fields
///
/// - `kind`: node class, drives resolution, placement and icons
/// - `display_name`: mutable, primary matching key for paths
/// - `record_id`: backing entity id (0 for synthetic nodes)
/// - `parent_record_id`: backing id of the parent entity
/// - `sort_order`: cached position, Clip/Snapshot siblings only
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub id: NodeId,
    pub kind: NodeKind,
    pub display_name: String,
    pub record_id: i64,
    pub parent_record_id: i64,
    pub sort_order: Option<i64>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl TreeNode {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Backing record this node refers to, if the kind has one and the id is set
    pub fn record(&self) -> Option<RecordRef> {
        match self.kind.record_type() {
            Some(record_type) if self.record_id != 0 => {
                Some(RecordRef::new(record_type, self.record_id))
            }
            _ => None,
        }
    }
}

/// Attributes for a node about to be inserted
#[derive(Debug, Clone, PartialEq)]
pub struct NewNode {
    pub kind: NodeKind,
    pub display_name: String,
    pub record_id: i64,
    pub parent_record_id: i64,
    pub sort_order: Option<i64>,
}

impl NewNode {
    pub fn new(kind: NodeKind, display_name: impl Into<String>, record_id: i64) -> Self {
        Self {
            kind,
            display_name: display_name.into(),
            record_id,
            parent_record_id: 0,
            sort_order: None,
        }
    }

    pub fn with_parent_record(mut self, parent_record_id: i64) -> Self {
        self.parent_record_id = parent_record_id;
        self
    }

    pub fn with_sort_order(mut self, sort_order: Option<i64>) -> Self {
        self.sort_order = sort_order;
        self
    }
}

/// Path of display names from a branch root to a node.
///
/// The root itself is identified by `branch`, never by its (possibly translated)
/// label, so `names` starts at the first child of the root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodePath {
    branch: Branch,
    names: Vec<String>,
}

impl NodePath {
    pub fn new<I, S>(branch: Branch, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            branch,
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Path of the branch root itself
    pub fn root(branch: Branch) -> Self {
        Self {
            branch,
            names: Vec::new(),
        }
    }

    pub fn branch(&self) -> Branch {
        self.branch
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn is_root(&self) -> bool {
        self.names.is_empty()
    }

    pub fn leaf_name(&self) -> Option<&str> {
        self.names.last().map(String::as_str)
    }

    /// Path one level up; `None` for the root
    pub fn parent(&self) -> Option<NodePath> {
        if self.names.is_empty() {
            return None;
        }
        let mut names = self.names.clone();
        names.pop();
        Some(Self {
            branch: self.branch,
            names,
        })
    }

    pub fn child(&self, name: impl Into<String>) -> NodePath {
        let mut names = self.names.clone();
        names.push(name.into());
        Self {
            branch: self.branch,
            names,
        }
    }

    /// Same parent, different leaf name
    pub fn with_leaf_name(&self, name: impl Into<String>) -> NodePath {
        match self.parent() {
            Some(parent) => parent.child(name),
            None => self.clone(),
        }
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.branch.marker())?;
        for name in &self.names {
            write!(f, " > {}", name)?;
        }
        Ok(())
    }
}
