//! Node arena for one replica
//!
//! `MediaTree` owns every `TreeNode` of a replica. Nodes are stored by `NodeId`
//! and indexed by backing record, which is the stable identity used for internal
//! bookkeeping. Display names are only consulted at the protocol boundary; the
//! per-parent name index that serves those lookups is built lazily and dropped
//! whenever the parent's children change.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, PoisonError};

use crate::models::{Branch, NewNode, NodeId, NodePath, RecordRef, TreeNode};
use crate::tree::normalize::{names_match, normalize_name};
use crate::tree::placement::Placement;

type NameIndex = HashMap<String, Vec<NodeId>>;

/// In-memory replicated tree
#[derive(Debug)]
pub struct MediaTree {
    nodes: HashMap<NodeId, TreeNode>,
    roots: [NodeId; 4],
    by_record: HashMap<RecordRef, Vec<NodeId>>,
    name_index: Mutex<HashMap<NodeId, NameIndex>>,
    next_id: u64,
}

fn branch_slot(branch: Branch) -> usize {
    match branch {
        Branch::Series => 0,
        Branch::Collections => 1,
        Branch::Keywords => 2,
        Branch::Search => 3,
    }
}

impl MediaTree {
    /// Create a tree with one root per branch, labelled from `root_labels`.
    ///
    /// Branches missing from the map fall back to their untranslated marker.
    pub fn new(root_labels: &BTreeMap<Branch, String>) -> Self {
        let mut tree = Self {
            nodes: HashMap::new(),
            roots: [NodeId(0); 4],
            by_record: HashMap::new(),
            name_index: Mutex::new(HashMap::new()),
            next_id: 0,
        };
        for branch in Branch::ALL {
            let label = root_labels
                .get(&branch)
                .cloned()
                .unwrap_or_else(|| branch.marker().to_string());
            let id = tree.allocate(NewNode::new(branch.root_kind(), label, 0), None);
            tree.roots[branch_slot(branch)] = id;
        }
        tree
    }

    /// Tree with untranslated root labels
    pub fn with_default_labels() -> Self {
        Self::new(&BTreeMap::new())
    }

    pub fn root(&self, branch: Branch) -> NodeId {
        self.roots[branch_slot(branch)]
    }

    pub fn node(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(&id)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut TreeNode> {
        self.nodes.get_mut(&id)
    }

    /// Number of nodes, roots included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(&id)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    /// Display names of the direct children of `id`, in tree order
    pub fn child_names(&self, id: NodeId) -> Vec<String> {
        self.children(id)
            .iter()
            .filter_map(|child| self.nodes.get(child))
            .map(|child| child.display_name.clone())
            .collect()
    }

    /// Every node that refers to `record` (a Clip may appear as itself, as a
    /// keyword example and as a search result)
    pub fn nodes_for_record(&self, record: RecordRef) -> &[NodeId] {
        self.by_record
            .get(&record)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// `id` and all of its descendants, parents before children
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get(&current) {
                out.push(current);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    /// Whether `ancestor` is `node` or lies above it
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes.get(&id).and_then(|n| n.parent);
        }
        false
    }

    /// Display-name path from the branch root to `id`
    pub fn path_of(&self, id: NodeId) -> Option<NodePath> {
        let mut names = Vec::new();
        let mut current = self.nodes.get(&id)?;
        while let Some(parent) = current.parent {
            names.push(current.display_name.clone());
            current = self.nodes.get(&parent)?;
        }
        names.reverse();
        Some(NodePath::new(current.kind.branch(), names))
    }

    /// Branch whose root is labelled `label`, either by its display label or by
    /// its untranslated marker
    pub fn branch_for_label(&self, label: &str) -> Option<Branch> {
        Branch::ALL.into_iter().find(|branch| {
            names_match(branch.marker(), label)
                || self
                    .nodes
                    .get(&self.root(*branch))
                    .is_some_and(|root| names_match(&root.display_name, label))
        })
    }

    /// Build a `NodePath` from a full display path whose first element names the
    /// branch root
    pub fn path_from_display<S: AsRef<str>>(&self, display: &[S]) -> Option<NodePath> {
        let (root, rest) = display.split_first()?;
        let branch = self.branch_for_label(root.as_ref())?;
        Some(NodePath::new(
            branch,
            rest.iter().map(|name| name.as_ref().to_string()),
        ))
    }

    /// Children of `parent` whose normalized display name equals `name`'s, in tree order
    pub(crate) fn children_named(&self, parent: NodeId, name: &str) -> Vec<NodeId> {
        let key = normalize_name(name);
        let mut index = self.name_index.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = index
            .entry(parent)
            .or_insert_with(|| self.build_name_index(parent));
        entry.get(&key).cloned().unwrap_or_default()
    }

    fn build_name_index(&self, parent: NodeId) -> NameIndex {
        let mut index: NameIndex = HashMap::new();
        for child in self.children(parent) {
            if let Some(node) = self.nodes.get(child) {
                index
                    .entry(normalize_name(&node.display_name))
                    .or_default()
                    .push(*child);
            }
        }
        index
    }

    fn invalidate_names(&mut self, parent: NodeId) {
        self.name_index
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&parent);
    }

    fn allocate(&mut self, new: NewNode, parent: Option<NodeId>) -> NodeId {
        self.next_id += 1;
        let id = NodeId(self.next_id);
        let node = TreeNode {
            id,
            kind: new.kind,
            display_name: new.display_name,
            record_id: new.record_id,
            parent_record_id: new.parent_record_id,
            sort_order: new.sort_order,
            parent,
            children: Vec::new(),
        };
        if let Some(record) = node.record() {
            self.by_record.entry(record).or_default().push(id);
        }
        self.nodes.insert(id, node);
        id
    }

    /// Insert a new child of `parent` at `placement`
    pub(crate) fn insert(&mut self, parent: NodeId, new: NewNode, placement: Placement) -> NodeId {
        let id = self.allocate(new, Some(parent));
        self.link(parent, id, placement);
        id
    }

    /// Attach an existing, currently unlinked node under `parent`
    pub(crate) fn link(&mut self, parent: NodeId, id: NodeId, placement: Placement) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.parent = Some(parent);
        }
        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            let index = match placement {
                Placement::Append => None,
                Placement::Before(sibling) => {
                    parent_node.children.iter().position(|c| *c == sibling)
                }
            };
            match index {
                Some(index) => parent_node.children.insert(index, id),
                None => parent_node.children.push(id),
            }
        }
        self.invalidate_names(parent);
    }

    /// Detach `id` from its parent's child list without dropping it
    pub(crate) fn unlink(&mut self, id: NodeId) -> Option<NodeId> {
        let parent = self.nodes.get(&id)?.parent?;
        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            parent_node.children.retain(|c| *c != id);
        }
        self.invalidate_names(parent);
        Some(parent)
    }

    /// Remove `id` and its subtree, returning the removed nodes parents-first
    pub(crate) fn remove_subtree(&mut self, id: NodeId) -> Vec<TreeNode> {
        let ids = self.subtree(id);
        self.unlink(id);
        let mut removed = Vec::with_capacity(ids.len());
        for node_id in ids {
            if let Some(node) = self.nodes.remove(&node_id) {
                if let Some(record) = node.record() {
                    if let Some(entries) = self.by_record.get_mut(&record) {
                        entries.retain(|n| *n != node_id);
                        if entries.is_empty() {
                            self.by_record.remove(&record);
                        }
                    }
                }
                self.invalidate_names(node_id);
                removed.push(node);
            }
        }
        removed
    }

    pub(crate) fn rename(&mut self, id: NodeId, name: impl Into<String>) {
        let parent = match self.nodes.get_mut(&id) {
            Some(node) => {
                node.display_name = name.into();
                node.parent
            }
            None => return,
        };
        if let Some(parent) = parent {
            self.invalidate_names(parent);
        }
    }

    /// Change the backing record of a node, keeping the record index current
    pub(crate) fn set_record(&mut self, id: NodeId, record_id: i64, parent_record_id: i64) {
        let old = self.nodes.get(&id).and_then(TreeNode::record);
        if let Some(record) = old {
            if let Some(entries) = self.by_record.get_mut(&record) {
                entries.retain(|n| *n != id);
                if entries.is_empty() {
                    self.by_record.remove(&record);
                }
            }
        }
        let new = match self.nodes.get_mut(&id) {
            Some(node) => {
                node.record_id = record_id;
                node.parent_record_id = parent_record_id;
                node.record()
            }
            None => return,
        };
        if let Some(record) = new {
            self.by_record.entry(record).or_default().push(id);
        }
    }

    /// Replace the child order of `parent`; `order` must be a permutation of the
    /// current children
    pub(crate) fn set_children_order(&mut self, parent: NodeId, order: Vec<NodeId>) {
        if let Some(node) = self.nodes.get_mut(&parent) {
            debug_assert_eq!(node.children.len(), order.len());
            node.children = order;
        }
    }

    /// Drop everything below a branch root; returns the number of removed nodes
    pub(crate) fn clear_branch(&mut self, branch: Branch) -> usize {
        let root = self.root(branch);
        let children: Vec<NodeId> = self.children(root).to_vec();
        children
            .into_iter()
            .map(|child| self.remove_subtree(child).len())
            .sum()
    }
}

impl Default for MediaTree {
    fn default() -> Self {
        Self::with_default_labels()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NodeKind, RecordType};

    #[test]
    fn test_new_tree_has_one_root_per_branch() {
        let tree = MediaTree::with_default_labels();
        assert_eq!(tree.len(), 4);
        for branch in Branch::ALL {
            let root = tree.node(tree.root(branch)).unwrap();
            assert_eq!(root.kind, branch.root_kind());
            assert_eq!(root.display_name, branch.marker());
        }
    }

    #[test]
    fn test_translated_labels_still_accept_markers() {
        let mut labels = BTreeMap::new();
        labels.insert(Branch::Collections, "Sammlungen".to_string());
        let tree = MediaTree::new(&labels);

        assert_eq!(tree.branch_for_label("Sammlungen"), Some(Branch::Collections));
        assert_eq!(tree.branch_for_label("Collections"), Some(Branch::Collections));
        let path = tree
            .path_from_display(&["sammlungen", "Project A"])
            .unwrap();
        assert_eq!(path, NodePath::new(Branch::Collections, ["Project A"]));
    }

    #[test]
    fn test_insert_indexes_by_record_and_name() {
        let mut tree = MediaTree::with_default_labels();
        let root = tree.root(Branch::Collections);
        let collection = tree.insert(
            root,
            NewNode::new(NodeKind::Collection, "Project A", 7),
            Placement::Append,
        );
        let clip = tree.insert(
            collection,
            NewNode::new(NodeKind::Clip, "Clip 1", 101).with_parent_record(7),
            Placement::Append,
        );

        assert_eq!(tree.nodes_for_record(RecordRef::clip(101)), &[clip]);
        assert_eq!(tree.children_named(collection, "CLIP 1"), vec![clip]);
        assert_eq!(
            tree.path_of(clip),
            Some(NodePath::new(Branch::Collections, ["Project A", "Clip 1"]))
        );
        assert!(tree.is_ancestor_or_self(collection, clip));
        assert!(!tree.is_ancestor_or_self(clip, collection));
    }

    #[test]
    fn test_name_index_tracks_renames() {
        let mut tree = MediaTree::with_default_labels();
        let root = tree.root(Branch::Keywords);
        let group = tree.insert(
            root,
            NewNode::new(NodeKind::KeywordGroup, "Setting", 0),
            Placement::Append,
        );
        assert_eq!(tree.children_named(root, "Setting"), vec![group]);

        tree.rename(group, "Location");
        assert!(tree.children_named(root, "Setting").is_empty());
        assert_eq!(tree.children_named(root, "location"), vec![group]);
    }

    #[test]
    fn test_remove_subtree_clears_indexes() {
        let mut tree = MediaTree::with_default_labels();
        let root = tree.root(Branch::Collections);
        let collection = tree.insert(
            root,
            NewNode::new(NodeKind::Collection, "Project A", 7),
            Placement::Append,
        );
        tree.insert(
            collection,
            NewNode::new(NodeKind::Clip, "Clip 1", 101),
            Placement::Append,
        );

        let removed = tree.remove_subtree(collection);
        assert_eq!(removed.len(), 2);
        assert_eq!(removed[0].kind, NodeKind::Collection);
        assert!(tree.nodes_for_record(RecordRef::clip(101)).is_empty());
        assert!(tree
            .nodes_for_record(RecordRef::new(RecordType::Collection, 7))
            .is_empty());
        assert!(tree.children(root).is_empty());
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn test_synthetic_nodes_are_not_record_indexed() {
        let mut tree = MediaTree::with_default_labels();
        let root = tree.root(Branch::Keywords);
        tree.insert(
            root,
            NewNode::new(NodeKind::KeywordGroup, "Setting", 0),
            Placement::Append,
        );
        assert!(tree.by_record.is_empty());
    }
}
