//! Structural Mutation Error Types
//!
//! `TreeError` separates recoverable outcomes (a path that no longer resolves,
//! a remote message that has diverged) from errors that must reach the caller
//! unchanged (a record locked by another replica, a delete the store refuses).

use thiserror::Error;

use crate::db::StoreError;
use crate::locks::LockError;
use crate::models::{Branch, NodeKind, NodePath, RecordRef};
use crate::tree::NotFound;

/// Structural mutation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TreeError {
    /// Path did not resolve to a node of the requested kind
    #[error("Not found: {0}")]
    NotFound(#[from] NotFound),

    /// A sibling of the same class already carries the name
    #[error("Name conflict: '{name}' already exists under '{parent}'")]
    NameConflict { parent: NodePath, name: String },

    /// Display names must carry at least one visible character
    #[error("Invalid name: '{0}'")]
    InvalidName(String),

    /// The kind cannot be placed at the requested position
    #[error("Invalid placement: {kind} cannot be placed at '{path}'")]
    InvalidPlacement { path: NodePath, kind: NodeKind },

    /// Move or copy request that the tree cannot honor
    #[error("Invalid move: {0}")]
    InvalidMove(String),

    /// Branch roots are never renamed, moved or deleted
    #[error("Root of the {branch} branch cannot be modified")]
    RootImmutable { branch: Branch },

    /// Another holder has the backing record locked
    #[error("Record {record} is locked by {holder}")]
    RecordLocked { record: RecordRef, holder: String },

    /// The backing store refused the delete
    #[error("Delete of {record} blocked: {reason}")]
    DeleteBlocked { record: RecordRef, reason: String },

    /// A remote message could not be reconciled with the local tree
    #[error("Protocol desync from {sender}: {detail}")]
    ProtocolDesync { sender: String, detail: String },

    /// Any other backing store failure
    #[error("Backing store operation failed: {0}")]
    Store(StoreError),

    /// Invalid replica configuration
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl TreeError {
    /// Create a name conflict error
    pub fn name_conflict(parent: NodePath, name: impl Into<String>) -> Self {
        Self::NameConflict {
            parent,
            name: name.into(),
        }
    }

    /// Create an invalid name error
    pub fn invalid_name(name: impl Into<String>) -> Self {
        Self::InvalidName(name.into())
    }

    /// Create an invalid placement error
    pub fn invalid_placement(path: NodePath, kind: NodeKind) -> Self {
        Self::InvalidPlacement { path, kind }
    }

    /// Create an invalid move error
    pub fn invalid_move(msg: impl Into<String>) -> Self {
        Self::InvalidMove(msg.into())
    }

    /// Create a protocol desync error
    pub fn protocol_desync(sender: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::ProtocolDesync {
            sender: sender.into(),
            detail: detail.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Whether the path simply did not resolve; the tree is unchanged
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Whether the error can be logged and skipped without surfacing it
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::ProtocolDesync { .. })
    }
}

impl From<StoreError> for TreeError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::RecordLocked { record, holder } => Self::RecordLocked { record, holder },
            StoreError::DeleteBlocked { record, reason } => Self::DeleteBlocked { record, reason },
            other => Self::Store(other),
        }
    }
}

impl From<LockError> for TreeError {
    fn from(err: LockError) -> Self {
        match err {
            LockError::RecordLocked { record, holder } => Self::RecordLocked { record, holder },
            LockError::DeleteBlocked { record, reason } => Self::DeleteBlocked { record, reason },
            LockError::Store(store) => store.into(),
        }
    }
}
