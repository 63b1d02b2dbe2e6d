//! Tree Service - Structural Mutation API
//!
//! This module owns one replica's tree and is the only code that mutates it:
//!
//! - Add (with implicit creation of missing ancestors)
//! - Delete (with active-view invalidation)
//! - Rename (re-sorting only alphabetically ordered kinds)
//! - Move / Copy (recursive subtree clone, then source removal)
//! - Reorder (reload authoritative sort orders, then re-sort)
//!
//! Every operation addresses nodes by `NodePath` and is idempotent when replayed
//! from a peer's message: a second Add overwrites instead of duplicating, a
//! second Delete reports `NotFound` and leaves the tree as it was.
//!
//! # Single Writer
//!
//! The tree lives behind a `tokio::sync::RwLock`. Mutations hold the write lock
//! for their whole duration, including the backing-store reads they need, so a
//! local action and a remote message can never interleave on one replica.
//!
//! # Events
//!
//! A `TreeEvent` is emitted only after a mutation has fully succeeded.

use std::sync::{Arc, PoisonError, RwLock as StdRwLock};
use tokio::sync::{broadcast, RwLock};

use crate::config::TreeSyncConfig;
use crate::db::RecordStore;
use crate::models::{
    Branch, NewNode, NodeId, NodeKind, NodePath, RecordRef, SiblingOrdering, TreeNode,
};
use crate::services::changes::{
    AddRequest, ChangeOutcome, DeleteRequest, MoveRequest, RenameRequest, ReorderRequest,
    StructuralChange,
};
use crate::services::error::TreeError;
use crate::services::events::TreeEvent;
use crate::tree::placement::{is_ordered, ordered_children};
use crate::tree::resolver::{find_child, Step};
use crate::tree::{self, placement, transitions, MediaTree, NotFound, Placement, PlacementOptions};

/// Outcome of [`TreeService::refresh_branch`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshReport {
    /// Nodes whose display name drifted from their record
    pub renamed: usize,
    /// Nodes removed because their record no longer exists
    pub removed: usize,
    /// Parents whose children had to be re-sorted
    pub reordered: usize,
}

/// Whether a node of `kind` is the primary representation of its record, as
/// opposed to a keyword example or a search hit pointing at it
fn represents_record(kind: NodeKind) -> bool {
    kind != NodeKind::KeywordExample && kind.branch() != Branch::Search
}

/// One replica's tree plus the Structural Mutation API over it
pub struct TreeService {
    tree: RwLock<MediaTree>,

    /// Backing records consulted for ancestor ids and sort orders
    store: Arc<dyn RecordStore>,

    config: TreeSyncConfig,

    /// Record currently shown in the active editing surface
    active_view: StdRwLock<Option<RecordRef>>,

    /// Broadcast channel for tree events
    event_tx: broadcast::Sender<TreeEvent>,
}

impl TreeService {
    /// Create a replica with an empty tree (one root per branch)
    pub fn new(store: Arc<dyn RecordStore>, config: TreeSyncConfig) -> Result<Self, TreeError> {
        config.validate().map_err(TreeError::configuration)?;

        let (event_tx, _) = broadcast::channel(config.event_channel_capacity);

        Ok(Self {
            tree: RwLock::new(MediaTree::new(&config.root_labels)),
            store,
            config,
            active_view: StdRwLock::new(None),
            event_tx,
        })
    }

    pub fn config(&self) -> &TreeSyncConfig {
        &self.config
    }

    /// Identity of this replica (lock holder and message sender)
    pub fn replica_id(&self) -> &str {
        &self.config.replica_id
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Subscribe to tree events
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use mediatree_core::{InMemoryRecordStore, TreeService, TreeSyncConfig};
    /// # use std::sync::Arc;
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let service = TreeService::new(Arc::new(InMemoryRecordStore::new()), TreeSyncConfig::default())?;
    /// let mut rx = service.subscribe_to_events();
    /// tokio::spawn(async move {
    ///     while let Ok(event) = rx.recv().await {
    ///         println!("Event: {}", event.event_type());
    ///     }
    /// });
    /// # Ok(())
    /// # }
    /// ```
    pub fn subscribe_to_events(&self) -> broadcast::Receiver<TreeEvent> {
        self.event_tx.subscribe()
    }

    /// Ignores errors if no subscribers (expected in some tests).
    pub(crate) fn emit_event(&self, event: TreeEvent) {
        let _ = self.event_tx.send(event);
    }

    /// Declare which record the active editing surface shows
    pub fn set_active_view(&self, record: Option<RecordRef>) {
        *self
            .active_view
            .write()
            .unwrap_or_else(PoisonError::into_inner) = record;
    }

    pub fn active_view(&self) -> Option<RecordRef> {
        *self
            .active_view
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` against a consistent view of the tree
    pub async fn with_tree<R>(&self, f: impl FnOnce(&MediaTree) -> R) -> R {
        let tree = self.tree.read().await;
        f(&tree)
    }

    pub async fn resolve(
        &self,
        path: &NodePath,
        kind: NodeKind,
        disambiguator: Option<i64>,
    ) -> Result<NodeId, TreeError> {
        let tree = self.tree.read().await;
        Ok(tree::resolve(&tree, path, kind, disambiguator)?)
    }

    /// Copy of the node at `path`
    pub async fn node(
        &self,
        path: &NodePath,
        kind: NodeKind,
        disambiguator: Option<i64>,
    ) -> Result<TreeNode, TreeError> {
        let tree = self.tree.read().await;
        let id = tree::resolve(&tree, path, kind, disambiguator)?;
        tree.node(id).cloned().ok_or_else(|| not_found(path, kind))
    }

    /// Display names of the children of the node at `path`, in tree order
    pub async fn child_names(
        &self,
        path: &NodePath,
        kind: NodeKind,
    ) -> Result<Vec<String>, TreeError> {
        let tree = self.tree.read().await;
        let id = tree::resolve(&tree, path, kind, None)?;
        Ok(tree.child_names(id))
    }

    /// Apply any structural change
    pub async fn apply(&self, change: &StructuralChange) -> Result<ChangeOutcome, TreeError> {
        match change {
            StructuralChange::Add(req) => self.add(req).await,
            StructuralChange::Delete(req) => self.delete(req).await.map(ChangeOutcome::Removed),
            StructuralChange::Rename(req) => self.rename(req).await.map(ChangeOutcome::Renamed),
            StructuralChange::Move(req) => self.move_node(req).await.map(ChangeOutcome::Moved),
            StructuralChange::Reorder(req) => {
                self.reorder(req).await.map(ChangeOutcome::Reordered)
            }
        }
    }

    /// Add the node at `req.path`, creating missing ancestors on the way.
    ///
    /// A missing ancestor gets the first kind the transition table allows on the
    /// way to the leaf. Its record id is the request's `parent_record_id` when it
    /// is the leaf's direct parent, otherwise it is looked up in the backing
    /// store by name under the previous ancestor.
    ///
    /// If the leaf already exists (same class, same name, and for keyword
    /// examples the same record) it is overwritten and repositioned instead.
    pub async fn add(&self, req: &AddRequest) -> Result<ChangeOutcome, TreeError> {
        let branch = req.path.branch();
        if req.kind.branch() != branch || req.kind.is_root() {
            return Err(TreeError::invalid_placement(req.path.clone(), req.kind));
        }
        let Some((leaf_name, ancestors)) = req.path.names().split_last() else {
            return Err(TreeError::invalid_placement(req.path.clone(), req.kind));
        };
        if let Some(blank) = req.path.names().iter().find(|name| is_blank(name)) {
            return Err(TreeError::invalid_name(blank.as_str()));
        }

        let mut tree = self.tree.write().await;
        let mut parent = tree.root(branch);
        let mut parent_record = 0;

        for (depth, name) in ancestors.iter().enumerate() {
            if let Some(existing) =
                find_child(&tree, parent, name, Step::Intermediate { leaf: req.kind })
            {
                parent = existing;
                parent_record = tree.node(existing).map_or(0, |node| node.record_id);
                continue;
            }

            let parent_kind = kind_of(&tree, parent, branch);
            let immediate = depth + 1 == ancestors.len();
            let kind = transitions::container_for(parent_kind, req.kind, immediate)
                .ok_or_else(|| TreeError::invalid_placement(req.path.clone(), req.kind))?;
            let record_id = if immediate && req.parent_record_id != 0 {
                req.parent_record_id
            } else {
                self.infer_record_id(kind, parent_record, name).await?
            };

            let new = NewNode::new(kind, name.as_str(), record_id).with_parent_record(parent_record);
            let at = placement(&tree, parent, &new, self.placement_options(false));
            parent = tree.insert(parent, new, at);
            parent_record = record_id;
            tracing::debug!(%kind, %name, record_id, "created implicit ancestor");
        }

        if !transitions::accepts_child(kind_of(&tree, parent, branch), req.kind) {
            return Err(TreeError::invalid_placement(req.path.clone(), req.kind));
        }

        let parent_record_id = if req.parent_record_id != 0 {
            req.parent_record_id
        } else {
            parent_record
        };

        let leaf_step = Step::Leaf {
            leaf: req.kind,
            disambiguator: req.disambiguator(),
        };
        if let Some(existing) = find_child(&tree, parent, leaf_name, leaf_step) {
            // Only the same kind replays; a Clip never takes over a Snapshot's node
            if tree.node(existing).map(|node| node.kind) != Some(req.kind) {
                let parent_path = req
                    .path
                    .parent()
                    .unwrap_or_else(|| NodePath::root(branch));
                return Err(TreeError::name_conflict(parent_path, leaf_name.as_str()));
            }
            tree.set_record(existing, req.record_id, parent_record_id);
            if let Some(node) = tree.node_mut(existing) {
                if req.sort_order.is_some() {
                    node.sort_order = req.sort_order;
                }
            }
            reposition(&mut tree, existing);
            tracing::debug!(path = %req.path, kind = %req.kind, "add replayed onto existing node");
            self.emit_event(TreeEvent::NodeAdded {
                path: req.path.clone(),
                kind: req.kind,
                record_id: req.record_id,
            });
            return Ok(ChangeOutcome::Replaced(existing));
        }

        if let Some(from) = req.sort_order {
            if self.config.refresh_sort_orders_on_insert
                && req.kind.ordering() == SiblingOrdering::Numeric
            {
                self.reload_sort_orders(&mut tree, parent, Some(from)).await?;
            }
        }

        let new = NewNode::new(req.kind, leaf_name.as_str(), req.record_id)
            .with_parent_record(parent_record_id)
            .with_sort_order(req.sort_order);
        let at = placement(&tree, parent, &new, self.placement_options(true));
        let id = tree.insert(parent, new, at);

        tracing::info!(path = %req.path, kind = %req.kind, record_id = req.record_id, "node added");
        self.emit_event(TreeEvent::NodeAdded {
            path: req.path.clone(),
            kind: req.kind,
            record_id: req.record_id,
        });
        Ok(ChangeOutcome::Inserted(id))
    }

    /// Remove the node at `req.path` and its subtree; returns the number of
    /// removed nodes
    pub async fn delete(&self, req: &DeleteRequest) -> Result<usize, TreeError> {
        let mut tree = self.tree.write().await;
        let id = tree::resolve(&tree, &req.path, req.kind, req.disambiguator)?;
        let removed = self.remove_node(&mut tree, id)?;
        tracing::info!(path = %req.path, kind = %req.kind, removed, "node deleted");
        Ok(removed)
    }

    /// Rename the node at `req.path` in place
    pub async fn rename(&self, req: &RenameRequest) -> Result<NodeId, TreeError> {
        if is_blank(&req.new_name) {
            return Err(TreeError::invalid_name(req.new_name.as_str()));
        }
        let mut tree = self.tree.write().await;
        let id = tree::resolve(&tree, &req.path, req.kind, req.disambiguator)?;
        let Some((kind, record_id, parent)) = tree
            .node(id)
            .map(|node| (node.kind, node.record_id, node.parent()))
        else {
            return Err(not_found(&req.path, req.kind));
        };
        let Some(parent) = parent.filter(|_| !kind.is_root()) else {
            return Err(TreeError::RootImmutable {
                branch: req.path.branch(),
            });
        };

        let conflict = tree
            .children_named(parent, &req.new_name)
            .into_iter()
            .filter(|other| *other != id)
            .filter_map(|other| tree.node(other))
            .any(|other| {
                other.kind.same_class(kind)
                    && (kind != NodeKind::KeywordExample || other.record_id == record_id)
            });
        if conflict {
            let parent_path = req
                .path
                .parent()
                .unwrap_or_else(|| NodePath::root(req.path.branch()));
            return Err(TreeError::name_conflict(parent_path, req.new_name.as_str()));
        }

        tree.rename(id, req.new_name.as_str());
        if kind.ordering() == SiblingOrdering::Alphabetic {
            reposition(&mut tree, id);
        }

        tracing::info!(path = %req.path, %kind, new_name = %req.new_name, "node renamed");
        self.emit_event(TreeEvent::NodeRenamed {
            path: req.path.clone(),
            kind,
            new_name: req.new_name.clone(),
        });
        Ok(id)
    }

    /// Copy the source subtree below the destination, then remove the source
    /// when `delete_source` is set. Returns the node now at the destination.
    ///
    /// Descendants keep their kinds and record ids; each one's
    /// `parent_record_id` is re-pointed at its new parent. A copy takes
    /// `new_record_id` and drops the source's sort order.
    pub async fn move_node(&self, req: &MoveRequest) -> Result<NodeId, TreeError> {
        if req.source.branch() != req.destination.branch() {
            return Err(TreeError::invalid_move(format!(
                "cannot move from the {} branch to the {} branch",
                req.source.branch(),
                req.destination.branch()
            )));
        }

        let mut tree = self.tree.write().await;
        let source = tree::resolve(&tree, &req.source, req.kind, req.disambiguator)?;
        let destination = tree::resolve(&tree, &req.destination, req.destination_kind, None)?;

        let Some(src) = tree.node(source).cloned() else {
            return Err(not_found(&req.source, req.kind));
        };
        if src.kind.is_root() {
            return Err(TreeError::RootImmutable {
                branch: req.source.branch(),
            });
        }
        let Some((dest_kind, dest_record)) = tree
            .node(destination)
            .map(|node| (node.kind, node.record_id))
        else {
            return Err(not_found(&req.destination, req.destination_kind));
        };

        if !transitions::accepts_child(dest_kind, src.kind) {
            return Err(TreeError::invalid_move(format!(
                "{} cannot be placed under {}",
                src.kind, dest_kind
            )));
        }
        if tree.is_ancestor_or_self(source, destination) {
            return Err(TreeError::invalid_move(format!(
                "'{}' cannot be moved into its own subtree",
                req.source
            )));
        }

        // Moving within the same parent only changes the position
        if req.delete_source && src.parent() == Some(destination) {
            if let Some(node) = tree.node_mut(source) {
                if req.sort_order.is_some() {
                    node.sort_order = req.sort_order;
                }
            }
            reposition(&mut tree, source);
            self.emit_event(TreeEvent::ChildrenReordered {
                path: req.destination.clone(),
            });
            return Ok(source);
        }

        let (record_id, sort_order) = if req.delete_source {
            (src.record_id, req.sort_order.or(src.sort_order))
        } else {
            (req.new_record_id.unwrap_or(src.record_id), req.sort_order)
        };

        // A replayed copy finds its own earlier result and changes nothing
        if !req.delete_source {
            let replayed = tree
                .children_named(destination, &src.display_name)
                .into_iter()
                .find(|other| {
                    *other != source
                        && tree
                            .node(*other)
                            .is_some_and(|node| node.kind == src.kind && node.record_id == record_id)
                });
            if let Some(existing) = replayed {
                tracing::debug!(
                    source = %req.source,
                    destination = %req.destination,
                    record_id,
                    "copy replayed onto existing node"
                );
                return Ok(existing);
            }
        }

        let conflict = tree
            .children_named(destination, &src.display_name)
            .into_iter()
            .filter_map(|other| tree.node(other))
            .any(|other| {
                other.kind.same_class(src.kind)
                    && (src.kind != NodeKind::KeywordExample || other.record_id == record_id)
            });
        if conflict {
            return Err(TreeError::name_conflict(
                req.destination.clone(),
                src.display_name.as_str(),
            ));
        }

        let root = NewNode::new(src.kind, src.display_name.as_str(), record_id)
            .with_parent_record(dest_record)
            .with_sort_order(sort_order);
        let at = placement(&tree, destination, &root, self.placement_options(true));
        let copy = tree.insert(destination, root, at);
        let cloned = clone_descendants(&mut tree, source, copy);

        if req.delete_source {
            self.remove_node(&mut tree, source)?;
        }

        tracing::info!(
            source = %req.source,
            destination = %req.destination,
            kind = %src.kind,
            descendants = cloned,
            copy = !req.delete_source,
            "node moved"
        );
        self.emit_event(TreeEvent::NodeAdded {
            path: req.destination.child(src.display_name.as_str()),
            kind: src.kind,
            record_id,
        });
        Ok(copy)
    }

    /// Reload every Clip/Snapshot sort order below `req.path` and re-sort.
    /// Returns whether the child order changed.
    pub async fn reorder(&self, req: &ReorderRequest) -> Result<bool, TreeError> {
        let mut tree = self.tree.write().await;
        let id = tree::resolve(&tree, &req.path, req.kind, None)?;
        let changed = self.reload_sort_orders(&mut tree, id, None).await?;

        tracing::info!(path = %req.path, changed, "children reordered");
        self.emit_event(TreeEvent::ChildrenReordered {
            path: req.path.clone(),
        });
        Ok(changed)
    }

    /// Remove every keyword example that refers to `clip_id`.
    ///
    /// Returns one Delete per removed example, each carrying the disambiguating
    /// record id, so the caller can broadcast them.
    pub async fn remove_keyword_examples(&self, clip_id: i64) -> Vec<DeleteRequest> {
        let mut tree = self.tree.write().await;
        let examples: Vec<NodeId> = tree
            .nodes_for_record(RecordRef::clip(clip_id))
            .iter()
            .copied()
            .filter(|id| {
                tree.node(*id)
                    .is_some_and(|node| node.kind == NodeKind::KeywordExample)
            })
            .collect();

        let mut deletes = Vec::with_capacity(examples.len());
        for id in examples {
            let Some(path) = tree.path_of(id) else {
                continue;
            };
            if self.remove_node(&mut tree, id).is_ok() {
                deletes.push(
                    DeleteRequest::new(path, NodeKind::KeywordExample).with_disambiguator(clip_id),
                );
            }
        }
        tracing::debug!(clip_id, removed = deletes.len(), "keyword examples removed");
        deletes
    }

    /// Reconcile a branch with the backing store.
    ///
    /// Every record-backed node is reloaded: names that drifted are updated,
    /// nodes whose record is gone are removed, cached sort orders are replaced,
    /// and every sibling list is re-sorted.
    pub async fn refresh_branch(&self, branch: Branch) -> Result<RefreshReport, TreeError> {
        let mut tree = self.tree.write().await;
        let mut report = RefreshReport::default();
        let root = tree.root(branch);

        let backed: Vec<(NodeId, RecordRef)> = tree
            .subtree(root)
            .into_iter()
            .filter_map(|id| tree.node(id).and_then(TreeNode::record).map(|r| (id, r)))
            .collect();

        for (id, record) in backed {
            // Gone with an ancestor removed earlier in this pass
            let Some((kind, name)) = tree
                .node(id)
                .map(|node| (node.kind, node.display_name.clone()))
            else {
                continue;
            };

            let Some(info) = self.store.load(record).await? else {
                tracing::debug!(%record, "record vanished, dropping node");
                report.removed += self.remove_node(&mut tree, id)?;
                continue;
            };

            if info.display_name != name {
                if let Some(path) = tree.path_of(id) {
                    self.emit_event(TreeEvent::NodeRenamed {
                        path,
                        kind,
                        new_name: info.display_name.clone(),
                    });
                }
                tree.rename(id, info.display_name.as_str());
                report.renamed += 1;
            }
            if kind.ordering() == SiblingOrdering::Numeric && info.sort_order.is_some() {
                if let Some(node) = tree.node_mut(id) {
                    node.sort_order = info.sort_order;
                }
            }
        }

        for parent in tree.subtree(root) {
            if is_ordered(&tree, parent) {
                continue;
            }
            let order = ordered_children(&tree, parent);
            tree.set_children_order(parent, order);
            report.reordered += 1;
            if let Some(path) = tree.path_of(parent) {
                self.emit_event(TreeEvent::ChildrenReordered { path });
            }
        }

        tracing::info!(
            %branch,
            renamed = report.renamed,
            removed = report.removed,
            reordered = report.reordered,
            "branch refreshed"
        );
        Ok(report)
    }

    /// Drop everything below a branch root, e.g. before a full reload.
    /// Returns the number of removed nodes.
    pub async fn clear_branch(&self, branch: Branch) -> usize {
        let mut tree = self.tree.write().await;
        let root = tree.root(branch);
        self.invalidate_view_within(&tree, root);
        let removed = tree.clear_branch(branch);
        if removed > 0 {
            tracing::info!(%branch, removed, "branch cleared");
            self.emit_event(TreeEvent::NodeRemoved {
                path: NodePath::root(branch),
                kind: branch.root_kind(),
                removed,
            });
        }
        removed
    }

    fn placement_options(&self, terminal: bool) -> PlacementOptions {
        PlacementOptions {
            fast_append: self.config.fast_append,
            terminal,
        }
    }

    async fn infer_record_id(
        &self,
        kind: NodeKind,
        parent_record: i64,
        name: &str,
    ) -> Result<i64, TreeError> {
        let Some(record_type) = kind.record_type() else {
            return Ok(0);
        };
        match self.store.find_child(record_type, parent_record, name).await? {
            Some(info) => Ok(info.record.id),
            None => {
                tracing::debug!(%kind, name, parent_record, "no backing record for implicit ancestor");
                Ok(0)
            }
        }
    }

    /// Reload cached sort orders of the numeric children of `parent` from the
    /// store (only those at or after `from`, when given), then re-sort.
    async fn reload_sort_orders(
        &self,
        tree: &mut MediaTree,
        parent: NodeId,
        from: Option<i64>,
    ) -> Result<bool, TreeError> {
        let due: Vec<(NodeId, RecordRef)> = tree
            .children(parent)
            .iter()
            .filter_map(|id| {
                let node = tree.node(*id)?;
                if node.kind.ordering() != SiblingOrdering::Numeric {
                    return None;
                }
                let stale = match from {
                    None => true,
                    Some(from) => node.sort_order.is_some_and(|order| order >= from),
                };
                if stale {
                    node.record().map(|record| (*id, record))
                } else {
                    None
                }
            })
            .collect();

        for (id, record) in due {
            let fresh = self.store.sort_order(record).await?;
            if let Some(node) = tree.node_mut(id) {
                if fresh.is_some() && node.sort_order != fresh {
                    tracing::debug!(%record, old = ?node.sort_order, new = ?fresh, "refreshed sort order");
                    node.sort_order = fresh;
                }
            }
        }

        if is_ordered(tree, parent) {
            return Ok(false);
        }
        let order = ordered_children(tree, parent);
        tree.set_children_order(parent, order);
        Ok(true)
    }

    /// Remove a non-root node and its subtree, raising view invalidation first
    fn remove_node(&self, tree: &mut MediaTree, id: NodeId) -> Result<usize, TreeError> {
        let Some(kind) = tree.node(id).map(|node| node.kind) else {
            return Ok(0);
        };
        if kind.is_root() {
            return Err(TreeError::RootImmutable {
                branch: kind.branch(),
            });
        }

        let path = tree.path_of(id);
        self.invalidate_view_within(tree, id);
        let removed = tree.remove_subtree(id).len();
        if let Some(path) = path {
            self.emit_event(TreeEvent::NodeRemoved {
                path,
                kind,
                removed,
            });
        }
        Ok(removed)
    }

    /// Raise `ViewInvalidated` if the active view's record is represented at or
    /// below `root`
    fn invalidate_view_within(&self, tree: &MediaTree, root: NodeId) {
        let Some(active) = self.active_view() else {
            return;
        };
        let shown = tree.nodes_for_record(active).iter().any(|id| {
            tree.node(*id)
                .is_some_and(|node| represents_record(node.kind))
                && tree.is_ancestor_or_self(root, *id)
        });
        if shown {
            tracing::info!(record = %active, "active view removed from tree");
            self.set_active_view(None);
            self.emit_event(TreeEvent::ViewInvalidated { record: active });
        }
    }
}

fn is_blank(name: &str) -> bool {
    name.trim().is_empty()
}

fn kind_of(tree: &MediaTree, id: NodeId, branch: Branch) -> NodeKind {
    tree.node(id)
        .map_or_else(|| branch.root_kind(), |node| node.kind)
}

fn not_found(path: &NodePath, kind: NodeKind) -> TreeError {
    TreeError::from(NotFound {
        path: path.clone(),
        kind,
        depth: path.names().len(),
    })
}

/// Move `id` to where the Placement Engine puts it among its current siblings
fn reposition(tree: &mut MediaTree, id: NodeId) {
    let Some(probe) = tree.node(id).map(|node| {
        NewNode::new(node.kind, node.display_name.as_str(), node.record_id)
            .with_sort_order(node.sort_order)
    }) else {
        return;
    };
    let Some(parent) = tree.unlink(id) else {
        return;
    };
    let options = PlacementOptions {
        fast_append: false,
        terminal: true,
    };
    let at = placement(tree, parent, &probe, options);
    tree.link(parent, id, at);
}

/// Clone the descendants of `from` below `to`, keeping their order; returns the
/// number of cloned nodes
fn clone_descendants(tree: &mut MediaTree, from: NodeId, to: NodeId) -> usize {
    let mut cloned = 0;
    let mut pending = vec![(from, to)];
    while let Some((src_parent, dst_parent)) = pending.pop() {
        let parent_record = tree.node(dst_parent).map_or(0, |node| node.record_id);
        let children: Vec<NodeId> = tree.children(src_parent).to_vec();
        for child in children {
            let Some(new) = tree.node(child).map(|node| {
                NewNode::new(node.kind, node.display_name.as_str(), node.record_id)
                    .with_parent_record(parent_record)
                    .with_sort_order(node.sort_order)
            }) else {
                continue;
            };
            let id = tree.insert(dst_parent, new, Placement::Append);
            pending.push((child, id));
            cloned += 1;
        }
    }
    cloned
}

#[cfg(test)]
#[path = "tree_service_test.rs"]
mod tree_service_test;
