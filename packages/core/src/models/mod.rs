//! Data Models
//!
//! Core data structures of the replicated media tree:
//!
//! - [`NodeKind`] / [`Branch`] - the closed set of node classes and the four
//!   top-level branches they live in
//! - [`TreeNode`] / [`NodePath`] - arena nodes and the display-name paths peers
//!   use to address them
//! - [`RecordRef`] / [`RecordInfo`] - weak references to backing records

mod node_kind;
mod record;
mod tree_node;

pub use node_kind::{Branch, NodeKind, SiblingOrdering};
pub use record::{RecordInfo, RecordRef, RecordType};
pub use tree_node::{NewNode, NodeId, NodePath, TreeNode};
