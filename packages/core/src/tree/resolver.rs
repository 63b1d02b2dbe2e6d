//! Path Resolver
//!
//! Walks a `NodePath` top-down from its branch root. At each element the
//! candidate children are those whose normalized display name matches; a
//! candidate is accepted only if its kind is legal at that position according to
//! the transition table. Intermediate elements must be containers that can still
//! lead to the requested leaf kind; the last element must be in the leaf kind's
//! equivalence class and, when a disambiguating record id is supplied, refer to
//! that record.
//!
//! A name match with the wrong kind does not end the scan: a Collection and a
//! Collection Note may both be called "Draft".

use std::fmt;

use crate::models::{NodeId, NodeKind, NodePath};
use crate::tree::arena::MediaTree;
use crate::tree::transitions;

/// Resolution failed; the tree is untouched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotFound {
    pub path: NodePath,
    pub kind: NodeKind,
    /// Index into `path.names()` of the first element that did not resolve
    pub depth: usize,
}

impl fmt::Display for NotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "no {} at '{}' (stopped at element {})",
            self.kind, self.path, self.depth
        )
    }
}

impl std::error::Error for NotFound {}

/// What the element being matched must be
#[derive(Debug, Clone, Copy)]
pub(crate) enum Step {
    /// An ancestor on the way to a node of kind `leaf`
    Intermediate { leaf: NodeKind },
    /// The requested node itself
    Leaf {
        leaf: NodeKind,
        disambiguator: Option<i64>,
    },
}

/// Find the child of `parent` named `name` that is acceptable for `step`
pub(crate) fn find_child(
    tree: &MediaTree,
    parent: NodeId,
    name: &str,
    step: Step,
) -> Option<NodeId> {
    let parent_kind = tree.node(parent)?.kind;
    tree.children_named(parent, name).into_iter().find(|id| {
        let Some(child) = tree.node(*id) else {
            return false;
        };
        match step {
            Step::Intermediate { leaf } => {
                transitions::accepts_intermediate(parent_kind, child.kind, leaf)
            }
            Step::Leaf {
                leaf,
                disambiguator,
            } => {
                transitions::accepts_leaf(parent_kind, child.kind, leaf)
                    && disambiguator.map_or(true, |record_id| child.record_id == record_id)
            }
        }
    })
}

/// Resolve `path` to the node of kind `leaf` it names.
///
/// `disambiguator` is the record id that must match at the leaf; it is required
/// to tell apart Keyword Examples that share a display name.
pub fn resolve(
    tree: &MediaTree,
    path: &NodePath,
    leaf: NodeKind,
    disambiguator: Option<i64>,
) -> Result<NodeId, NotFound> {
    let not_found = |depth: usize| NotFound {
        path: path.clone(),
        kind: leaf,
        depth,
    };

    if path.branch() != leaf.branch() {
        return Err(not_found(0));
    }

    let mut current = tree.root(path.branch());
    if path.is_root() {
        return if leaf == path.branch().root_kind() {
            Ok(current)
        } else {
            Err(not_found(0))
        };
    }

    let last = path.names().len() - 1;
    for (depth, name) in path.names().iter().enumerate() {
        let step = if depth == last {
            Step::Leaf {
                leaf,
                disambiguator,
            }
        } else {
            Step::Intermediate { leaf }
        };
        current = match find_child(tree, current, name, step) {
            Some(child) => child,
            None => {
                tracing::debug!(%path, %leaf, depth, "path element did not resolve");
                return Err(not_found(depth));
            }
        };
    }
    Ok(current)
}

/// Resolve a full display path whose first element labels the branch root
pub fn resolve_display<S: AsRef<str>>(
    tree: &MediaTree,
    display: &[S],
    leaf: NodeKind,
    disambiguator: Option<i64>,
) -> Result<NodeId, NotFound> {
    match tree.path_from_display(display) {
        Some(path) => resolve(tree, &path, leaf, disambiguator),
        None => Err(NotFound {
            path: NodePath::root(leaf.branch()),
            kind: leaf,
            depth: 0,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Branch, NewNode};
    use crate::tree::placement::Placement;

    fn add(tree: &mut MediaTree, parent: NodeId, kind: NodeKind, name: &str, id: i64) -> NodeId {
        tree.insert(parent, NewNode::new(kind, name, id), Placement::Append)
    }

    #[test]
    fn test_resolves_nested_collections() {
        let mut tree = MediaTree::with_default_labels();
        let root = tree.root(Branch::Collections);
        let outer = add(&mut tree, root, NodeKind::Collection, "Project A", 7);
        let inner = add(&mut tree, outer, NodeKind::Collection, "Interviews", 8);
        let clip = add(&mut tree, inner, NodeKind::Clip, "Interview 1", 101);

        let found = resolve_display(
            &tree,
            &["Collections", "project a", "INTERVIEWS", "Interview 1"],
            NodeKind::Clip,
            None,
        );
        assert_eq!(found, Ok(clip));
    }

    #[test]
    fn test_same_name_different_class_keeps_scanning() {
        let mut tree = MediaTree::with_default_labels();
        let root = tree.root(Branch::Collections);
        let project = add(&mut tree, root, NodeKind::Collection, "Project A", 7);
        let note = add(&mut tree, project, NodeKind::CollectionNote, "Draft", 40);
        let draft = add(&mut tree, project, NodeKind::Collection, "Draft", 9);
        let clip = add(&mut tree, draft, NodeKind::Clip, "Take", 5);

        let path = NodePath::new(Branch::Collections, ["Project A", "Draft", "Take"]);
        assert_eq!(resolve(&tree, &path, NodeKind::Clip, None), Ok(clip));

        let note_path = NodePath::new(Branch::Collections, ["Project A", "Draft"]);
        assert_eq!(
            resolve(&tree, &note_path, NodeKind::CollectionNote, None),
            Ok(note)
        );
        assert_eq!(
            resolve(&tree, &note_path, NodeKind::Collection, None),
            Ok(draft)
        );
    }

    #[test]
    fn test_notes_are_only_recognised_as_leaf() {
        let mut tree = MediaTree::with_default_labels();
        let root = tree.root(Branch::Collections);
        let project = add(&mut tree, root, NodeKind::Collection, "Project A", 7);
        add(&mut tree, project, NodeKind::CollectionNote, "Draft", 40);

        let through_note = NodePath::new(Branch::Collections, ["Project A", "Draft", "Take"]);
        let err = resolve(&tree, &through_note, NodeKind::Clip, None).unwrap_err();
        assert_eq!(err.depth, 1);
    }

    #[test]
    fn test_keyword_examples_are_disambiguated_by_record() {
        let mut tree = MediaTree::with_default_labels();
        let root = tree.root(Branch::Keywords);
        let group = add(&mut tree, root, NodeKind::KeywordGroup, "Setting", 0);
        let keyword = add(&mut tree, group, NodeKind::Keyword, "Outdoor", 3);
        let first = add(&mut tree, keyword, NodeKind::KeywordExample, "Interview 1", 101);
        let second = add(&mut tree, keyword, NodeKind::KeywordExample, "Interview 1", 202);

        let path = NodePath::new(Branch::Keywords, ["Setting", "Outdoor", "Interview 1"]);
        assert_eq!(
            resolve(&tree, &path, NodeKind::KeywordExample, Some(202)),
            Ok(second)
        );
        assert_eq!(
            resolve(&tree, &path, NodeKind::KeywordExample, Some(101)),
            Ok(first)
        );
        assert!(resolve(&tree, &path, NodeKind::KeywordExample, Some(303)).is_err());
    }

    #[test]
    fn test_branch_mismatch_is_not_found() {
        let mut tree = MediaTree::with_default_labels();
        let root = tree.root(Branch::Series);
        add(&mut tree, root, NodeKind::Series, "Interview 1", 1);

        let path = NodePath::new(Branch::Series, ["Interview 1"]);
        assert!(resolve(&tree, &path, NodeKind::Collection, None).is_err());
        assert!(resolve(&tree, &path, NodeKind::Series, None).is_ok());
    }

    #[test]
    fn test_unknown_root_label_is_not_found() {
        let tree = MediaTree::with_default_labels();
        let err = resolve_display(&tree, &["Nowhere", "x"], NodeKind::Clip, None).unwrap_err();
        assert_eq!(err.path, NodePath::root(Branch::Collections));
    }

    #[test]
    fn test_root_resolves_to_itself() {
        let tree = MediaTree::with_default_labels();
        let path = NodePath::root(Branch::Search);
        assert_eq!(
            resolve(&tree, &path, NodeKind::SearchRoot, None),
            Ok(tree.root(Branch::Search))
        );
    }
}
