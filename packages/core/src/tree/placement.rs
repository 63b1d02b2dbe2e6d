//! Placement Engine
//!
//! Decides where a new node goes among its siblings:
//!
//! - Clips and Snapshots are ordered by their numeric `sort_order`.
//! - Every other kind is ordered by normalized display name, with a type
//!   partition: structural kinds first, note variants last. Under a Collection
//!   the numeric items come before nested Collections, which come before the
//!   Collection's notes.
//! - Ties keep insertion order, so placement is stable.
//!
//! Bulk loads of long Collections take a fast path that appends without scanning.

use crate::models::{NewNode, NodeId, NodeKind, SiblingOrdering, TreeNode};
use crate::tree::arena::MediaTree;
use crate::tree::normalize::normalize_name;

/// Where to put a node among its siblings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// After every existing child
    Append,
    /// Directly before the given sibling
    Before(NodeId),
}

/// Knobs for a single placement decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementOptions {
    /// Allow the O(1) append path for numerically ordered kinds
    pub fast_append: bool,
    /// The node is the last element of the requested path, not an implicitly
    /// created ancestor
    pub terminal: bool,
}

impl Default for PlacementOptions {
    fn default() -> Self {
        Self {
            fast_append: true,
            terminal: true,
        }
    }
}

/// Partition of a kind among its siblings; lower ranks come first
pub fn sibling_rank(kind: NodeKind) -> u8 {
    if kind.ordering() == SiblingOrdering::Numeric {
        0
    } else if kind.is_note() {
        2
    } else {
        1
    }
}

/// Total sibling ordering key: (rank, sort order, normalized name)
pub type SortKey = (u8, i64, String);

pub fn sort_key(kind: NodeKind, display_name: &str, sort_order: Option<i64>) -> SortKey {
    match kind.ordering() {
        // Items without a known position go after the positioned ones
        SiblingOrdering::Numeric => (0, sort_order.unwrap_or(i64::MAX), String::new()),
        SiblingOrdering::Alphabetic => (sibling_rank(kind), 0, normalize_name(display_name)),
    }
}

fn node_key(node: &TreeNode) -> SortKey {
    sort_key(node.kind, &node.display_name, node.sort_order)
}

/// Decide where `candidate` belongs among the current children of `parent`
pub fn placement(
    tree: &MediaTree,
    parent: NodeId,
    candidate: &NewNode,
    options: PlacementOptions,
) -> Placement {
    let key = sort_key(candidate.kind, &candidate.display_name, candidate.sort_order);
    let children = tree.children(parent);

    if options.fast_append
        && options.terminal
        && candidate.kind.ordering() == SiblingOrdering::Numeric
    {
        match children.last().and_then(|id| tree.node(*id)) {
            None => return Placement::Append,
            Some(last)
                if last.kind.ordering() == SiblingOrdering::Numeric && node_key(last) <= key =>
            {
                return Placement::Append;
            }
            Some(_) => {}
        }
    }

    children
        .iter()
        .find(|id| tree.node(**id).is_some_and(|sibling| node_key(sibling) > key))
        .map(|id| Placement::Before(*id))
        .unwrap_or(Placement::Append)
}

/// Children of `parent` re-sorted by their current keys (stable)
pub fn ordered_children(tree: &MediaTree, parent: NodeId) -> Vec<NodeId> {
    let mut keyed: Vec<(SortKey, NodeId)> = tree
        .children(parent)
        .iter()
        .filter_map(|id| tree.node(*id).map(|node| (node_key(node), *id)))
        .collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    keyed.into_iter().map(|(_, id)| id).collect()
}

/// Whether the children of `parent` are already in placement order
pub fn is_ordered(tree: &MediaTree, parent: NodeId) -> bool {
    let keys: Vec<SortKey> = tree
        .children(parent)
        .iter()
        .filter_map(|id| tree.node(*id).map(node_key))
        .collect();
    keys.windows(2).all(|pair| pair[0] <= pair[1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Branch;

    fn insert_placed(tree: &mut MediaTree, parent: NodeId, new: NewNode) -> NodeId {
        let at = placement(tree, parent, &new, PlacementOptions::default());
        tree.insert(parent, new, at)
    }

    fn collection(tree: &mut MediaTree) -> NodeId {
        let root = tree.root(Branch::Collections);
        tree.insert(
            root,
            NewNode::new(NodeKind::Collection, "Project A", 7),
            Placement::Append,
        )
    }

    #[test]
    fn test_clips_follow_sort_order_regardless_of_arrival() {
        let mut tree = MediaTree::with_default_labels();
        let parent = collection(&mut tree);
        insert_placed(
            &mut tree,
            parent,
            NewNode::new(NodeKind::Clip, "B", 2).with_sort_order(Some(2)),
        );
        insert_placed(
            &mut tree,
            parent,
            NewNode::new(NodeKind::Clip, "A", 1).with_sort_order(Some(1)),
        );
        insert_placed(
            &mut tree,
            parent,
            NewNode::new(NodeKind::Snapshot, "C", 3).with_sort_order(Some(3)),
        );

        assert_eq!(tree.child_names(parent), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_collections_and_notes_follow_items() {
        let mut tree = MediaTree::with_default_labels();
        let parent = collection(&mut tree);
        insert_placed(
            &mut tree,
            parent,
            NewNode::new(NodeKind::CollectionNote, "Draft", 40),
        );
        insert_placed(&mut tree, parent, NewNode::new(NodeKind::Collection, "Zeta", 8));
        insert_placed(&mut tree, parent, NewNode::new(NodeKind::Collection, "Draft", 9));
        insert_placed(
            &mut tree,
            parent,
            NewNode::new(NodeKind::Clip, "Zoo", 11).with_sort_order(Some(5)),
        );

        assert_eq!(tree.child_names(parent), vec!["Zoo", "Draft", "Zeta", "Draft"]);
        let kinds: Vec<NodeKind> = tree
            .children(parent)
            .iter()
            .map(|id| tree.node(*id).unwrap().kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::Clip,
                NodeKind::Collection,
                NodeKind::Collection,
                NodeKind::CollectionNote
            ]
        );
    }

    #[test]
    fn test_alphabetic_order_is_case_insensitive_and_stable() {
        let mut tree = MediaTree::with_default_labels();
        let root = tree.root(Branch::Series);
        for (name, id) in [("beta", 1), ("Alpha", 2), ("gamma", 3), ("BETA", 4)] {
            insert_placed(&mut tree, root, NewNode::new(NodeKind::Series, name, id));
        }
        assert_eq!(tree.child_names(root), vec!["Alpha", "beta", "BETA", "gamma"]);
        assert!(is_ordered(&tree, root));
    }

    #[test]
    fn test_fast_path_appends_in_bulk_load_order() {
        let mut tree = MediaTree::with_default_labels();
        let parent = collection(&mut tree);
        for i in 1..=50 {
            let new = NewNode::new(NodeKind::Clip, format!("Clip {}", i), i)
                .with_sort_order(Some(i));
            assert_eq!(
                placement(&tree, parent, &new, PlacementOptions::default()),
                Placement::Append
            );
            tree.insert(parent, new, Placement::Append);
        }
        assert!(is_ordered(&tree, parent));
    }

    #[test]
    fn test_fast_path_never_breaks_numeric_order() {
        let mut tree = MediaTree::with_default_labels();
        let parent = collection(&mut tree);
        let late = insert_placed(
            &mut tree,
            parent,
            NewNode::new(NodeKind::Clip, "Late", 1).with_sort_order(Some(10)),
        );
        let early = NewNode::new(NodeKind::Clip, "Early", 2).with_sort_order(Some(3));
        assert_eq!(
            placement(&tree, parent, &early, PlacementOptions::default()),
            Placement::Before(late)
        );
    }

    #[test]
    fn test_fast_path_skipped_when_a_collection_is_last() {
        let mut tree = MediaTree::with_default_labels();
        let parent = collection(&mut tree);
        let nested = insert_placed(&mut tree, parent, NewNode::new(NodeKind::Collection, "Sub", 8));
        let clip = NewNode::new(NodeKind::Clip, "Clip", 3);
        assert_eq!(
            placement(&tree, parent, &clip, PlacementOptions::default()),
            Placement::Before(nested)
        );
    }

    #[test]
    fn test_unpositioned_items_go_after_positioned_ones() {
        let mut tree = MediaTree::with_default_labels();
        let parent = collection(&mut tree);
        insert_placed(&mut tree, parent, NewNode::new(NodeKind::Clip, "Loose", 1));
        let options = PlacementOptions {
            fast_append: false,
            terminal: true,
        };
        let positioned = NewNode::new(NodeKind::Clip, "Placed", 2).with_sort_order(Some(1));
        let at = placement(&tree, parent, &positioned, options);
        tree.insert(parent, positioned, at);
        assert_eq!(tree.child_names(parent), vec!["Placed", "Loose"]);
    }

    #[test]
    fn test_ordered_children_resorts_stale_positions() {
        let mut tree = MediaTree::with_default_labels();
        let parent = collection(&mut tree);
        let a = insert_placed(
            &mut tree,
            parent,
            NewNode::new(NodeKind::Clip, "A", 1).with_sort_order(Some(1)),
        );
        let b = insert_placed(
            &mut tree,
            parent,
            NewNode::new(NodeKind::Clip, "B", 2).with_sort_order(Some(2)),
        );
        tree.node_mut(a).unwrap().sort_order = Some(3);
        assert!(!is_ordered(&tree, parent));
        assert_eq!(ordered_children(&tree, parent), vec![b, a]);
    }
}
