//! Structural Change Requests
//!
//! One request type per Structural Mutation API operation. Each carries
//! everything a replica needs to re-execute the change from scratch, so the
//! same value is used for a local call and for a change replayed from a peer's
//! message.

use serde::{Deserialize, Serialize};

use crate::models::{NodeId, NodeKind, NodePath};

/// Add (or overwrite) the node at `path`, creating missing ancestors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddRequest {
    pub path: NodePath,
    pub kind: NodeKind,
    pub record_id: i64,
    /// Record id of the parent entity (0 when unknown)
    pub parent_record_id: i64,
    pub sort_order: Option<i64>,
}

impl AddRequest {
    pub fn new(path: NodePath, kind: NodeKind, record_id: i64) -> Self {
        Self {
            path,
            kind,
            record_id,
            parent_record_id: 0,
            sort_order: None,
        }
    }

    pub fn with_parent_record(mut self, parent_record_id: i64) -> Self {
        self.parent_record_id = parent_record_id;
        self
    }

    pub fn with_sort_order(mut self, sort_order: i64) -> Self {
        self.sort_order = Some(sort_order);
        self
    }

    /// Record id that must match at the leaf, for kinds whose names are not unique
    pub fn disambiguator(&self) -> Option<i64> {
        (self.kind == NodeKind::KeywordExample).then_some(self.record_id)
    }
}

/// Remove the node at `path` together with its subtree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRequest {
    pub path: NodePath,
    pub kind: NodeKind,
    pub disambiguator: Option<i64>,
}

impl DeleteRequest {
    pub fn new(path: NodePath, kind: NodeKind) -> Self {
        Self {
            path,
            kind,
            disambiguator: None,
        }
    }

    pub fn with_disambiguator(mut self, record_id: i64) -> Self {
        self.disambiguator = Some(record_id);
        self
    }
}

/// Change the display name of the node at `path`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameRequest {
    pub path: NodePath,
    pub kind: NodeKind,
    pub new_name: String,
    pub disambiguator: Option<i64>,
}

impl RenameRequest {
    pub fn new(path: NodePath, kind: NodeKind, new_name: impl Into<String>) -> Self {
        Self {
            path,
            kind,
            new_name: new_name.into(),
            disambiguator: None,
        }
    }

    pub fn with_disambiguator(mut self, record_id: i64) -> Self {
        self.disambiguator = Some(record_id);
        self
    }
}

/// Copy the node at `source` (with its subtree) below `destination`, removing
/// the original when `delete_source` is set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    pub source: NodePath,
    pub kind: NodeKind,
    pub disambiguator: Option<i64>,
    /// Path of the new parent
    pub destination: NodePath,
    pub destination_kind: NodeKind,
    pub delete_source: bool,
    /// Record id of the duplicate created by a copy
    pub new_record_id: Option<i64>,
    /// Position of the moved or copied node under its new parent
    pub sort_order: Option<i64>,
}

impl MoveRequest {
    /// Move `source` below `destination`
    pub fn relocate(
        source: NodePath,
        kind: NodeKind,
        destination: NodePath,
        destination_kind: NodeKind,
    ) -> Self {
        Self {
            source,
            kind,
            disambiguator: None,
            destination,
            destination_kind,
            delete_source: true,
            new_record_id: None,
            sort_order: None,
        }
    }

    /// Copy `source` below `destination` as the record `new_record_id`
    pub fn duplicate(
        source: NodePath,
        kind: NodeKind,
        destination: NodePath,
        destination_kind: NodeKind,
        new_record_id: i64,
    ) -> Self {
        Self {
            delete_source: false,
            new_record_id: Some(new_record_id),
            ..Self::relocate(source, kind, destination, destination_kind)
        }
    }

    pub fn with_sort_order(mut self, sort_order: i64) -> Self {
        self.sort_order = Some(sort_order);
        self
    }

    pub fn with_disambiguator(mut self, record_id: i64) -> Self {
        self.disambiguator = Some(record_id);
        self
    }
}

/// Reload the sort orders of the Clips and Snapshots below `path` and re-sort
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderRequest {
    pub path: NodePath,
    pub kind: NodeKind,
}

impl ReorderRequest {
    pub fn new(path: NodePath, kind: NodeKind) -> Self {
        Self { path, kind }
    }
}

/// Any structural change, as applied locally or replayed from a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum StructuralChange {
    Add(AddRequest),
    Delete(DeleteRequest),
    Rename(RenameRequest),
    Move(MoveRequest),
    Reorder(ReorderRequest),
}

impl StructuralChange {
    /// Kind of the node the change addresses
    pub fn kind(&self) -> NodeKind {
        match self {
            StructuralChange::Add(req) => req.kind,
            StructuralChange::Delete(req) => req.kind,
            StructuralChange::Rename(req) => req.kind,
            StructuralChange::Move(req) => req.kind,
            StructuralChange::Reorder(req) => req.kind,
        }
    }

    /// Path of the node the change addresses (the source, for a move)
    pub fn path(&self) -> &NodePath {
        match self {
            StructuralChange::Add(req) => &req.path,
            StructuralChange::Delete(req) => &req.path,
            StructuralChange::Rename(req) => &req.path,
            StructuralChange::Move(req) => &req.source,
            StructuralChange::Reorder(req) => &req.path,
        }
    }
}

impl From<AddRequest> for StructuralChange {
    fn from(req: AddRequest) -> Self {
        StructuralChange::Add(req)
    }
}

impl From<DeleteRequest> for StructuralChange {
    fn from(req: DeleteRequest) -> Self {
        StructuralChange::Delete(req)
    }
}

impl From<RenameRequest> for StructuralChange {
    fn from(req: RenameRequest) -> Self {
        StructuralChange::Rename(req)
    }
}

impl From<MoveRequest> for StructuralChange {
    fn from(req: MoveRequest) -> Self {
        StructuralChange::Move(req)
    }
}

impl From<ReorderRequest> for StructuralChange {
    fn from(req: ReorderRequest) -> Self {
        StructuralChange::Reorder(req)
    }
}

/// What a structural change did to the local tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOutcome {
    /// A new node was inserted
    Inserted(NodeId),
    /// An Add matched an existing node, which was overwritten in place
    Replaced(NodeId),
    /// This many nodes were removed
    Removed(usize),
    Renamed(NodeId),
    /// The node now at the destination
    Moved(NodeId),
    /// Whether the child order changed
    Reordered(bool),
}

impl ChangeOutcome {
    /// Node the change produced or touched, if it still exists
    pub fn node(&self) -> Option<NodeId> {
        match self {
            ChangeOutcome::Inserted(id)
            | ChangeOutcome::Replaced(id)
            | ChangeOutcome::Renamed(id)
            | ChangeOutcome::Moved(id) => Some(*id),
            ChangeOutcome::Removed(_) | ChangeOutcome::Reordered(_) => None,
        }
    }
}
