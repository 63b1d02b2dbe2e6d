//! Tree Events
//!
//! Events emitted by `TreeService` after a structural change has been fully
//! applied to the local tree. Views subscribe through
//! `TreeService::subscribe_to_events()` and react without the core knowing
//! anything about them.
//!
//! # Event Flow
//!
//! 1. A local action or a remote message calls the Structural Mutation API
//! 2. The tree is updated
//! 3. A `TreeEvent` is sent on the broadcast channel
//! 4. Subscribers (views, the active editing surface, diagnostics) react
//!
//! `ViewInvalidated` is the hook for the active editing surface: it fires when
//! the record on display has been removed from the tree, and the surface decides
//! how to clear itself.

use serde::{Deserialize, Serialize};

use crate::models::{NodeKind, NodePath, RecordRef};

/// Events emitted by `TreeService`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum TreeEvent {
    /// A node was inserted, or an existing node overwritten by a replayed Add
    NodeAdded {
        path: NodePath,
        kind: NodeKind,
        record_id: i64,
    },

    /// A node's display name changed; `path` is the path before the rename
    NodeRenamed {
        path: NodePath,
        kind: NodeKind,
        new_name: String,
    },

    /// A node and its subtree were removed
    NodeRemoved {
        path: NodePath,
        kind: NodeKind,
        removed: usize,
    },

    /// Children of the node at `path` were re-sorted
    ChildrenReordered { path: NodePath },

    /// The record shown in the active view is gone from the tree
    ViewInvalidated { record: RecordRef },

    /// A peer's messages could not be reconciled with the local tree
    DesyncDetected { sender: String, detail: String },
}

impl TreeEvent {
    /// Get a string representation of the event type
    pub fn event_type(&self) -> &str {
        match self {
            TreeEvent::NodeAdded { .. } => "node:added",
            TreeEvent::NodeRenamed { .. } => "node:renamed",
            TreeEvent::NodeRemoved { .. } => "node:removed",
            TreeEvent::ChildrenReordered { .. } => "children:reordered",
            TreeEvent::ViewInvalidated { .. } => "view:invalidated",
            TreeEvent::DesyncDetected { .. } => "sync:desync",
        }
    }
}
