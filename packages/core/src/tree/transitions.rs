//! Type-transition table
//!
//! Pure functions describing which kinds may appear below which. The Path
//! Resolver advances its expected kind through this table one path element at a
//! time, and the Structural Mutation API consults it when it has to create an
//! intermediate ancestor implicitly.

use crate::models::NodeKind;

/// Structural (non-note) child kinds of `parent`, preferred container first
pub fn children_of(parent: NodeKind) -> &'static [NodeKind] {
    use NodeKind::*;
    match parent {
        SeriesRoot => &[Series],
        Series => &[Episode],
        Episode => &[Transcript],

        CollectionsRoot => &[Collection],
        Collection => &[Collection, Clip, Snapshot],

        KeywordsRoot => &[KeywordGroup],
        KeywordGroup => &[Keyword],
        Keyword => &[KeywordExample],

        SearchRoot => &[SearchResults],
        SearchResults => &[SearchSeries, SearchCollection],
        SearchSeries => &[SearchEpisode],
        SearchEpisode => &[SearchTranscript],
        SearchCollection => &[SearchCollection, SearchClip, SearchSnapshot],

        Transcript | Clip | Snapshot | KeywordExample | SearchTranscript | SearchClip
        | SearchSnapshot | SeriesNote | EpisodeNote | TranscriptNote | CollectionNote
        | ClipNote | SnapshotNote => &[],
    }
}

/// Note variant that may hang off `parent` as a leaf
pub fn note_of(parent: NodeKind) -> Option<NodeKind> {
    match parent {
        NodeKind::Series => Some(NodeKind::SeriesNote),
        NodeKind::Episode => Some(NodeKind::EpisodeNote),
        NodeKind::Transcript => Some(NodeKind::TranscriptNote),
        NodeKind::Collection => Some(NodeKind::CollectionNote),
        NodeKind::Clip => Some(NodeKind::ClipNote),
        NodeKind::Snapshot => Some(NodeKind::SnapshotNote),
        _ => None,
    }
}

/// Whether `child` is a legal direct child of `parent`
pub fn accepts_child(parent: NodeKind, child: NodeKind) -> bool {
    children_of(parent).contains(&child) || note_of(parent) == Some(child)
}

/// Whether a node of kind `container` can have `leaf` somewhere below it.
///
/// Self-recursive containers (nested Collections) are followed only once, which
/// is enough because recursion never introduces new kinds.
pub fn can_lead_to(container: NodeKind, leaf: NodeKind) -> bool {
    if accepts_child(container, leaf) {
        return true;
    }
    children_of(container)
        .iter()
        .filter(|kind| **kind != container)
        .any(|kind| can_lead_to(*kind, leaf))
}

/// Whether `candidate` is acceptable for an intermediate path element below
/// `parent` on the way to `leaf`
pub fn accepts_intermediate(parent: NodeKind, candidate: NodeKind, leaf: NodeKind) -> bool {
    !candidate.is_note()
        && children_of(parent).contains(&candidate)
        && can_lead_to(candidate, leaf)
}

/// Whether `candidate` is acceptable for the last path element below `parent`
pub fn accepts_leaf(parent: NodeKind, candidate: NodeKind, leaf: NodeKind) -> bool {
    candidate.same_class(leaf) && accepts_child(parent, candidate)
}

/// Kind to use when an intermediate ancestor on the way to `leaf` must be created.
///
/// `immediate` is set when the missing ancestor is the leaf's direct parent, in
/// which case it must accept the leaf itself (a Clip Note needs a Clip, not a
/// nested Collection).
pub fn container_for(parent: NodeKind, leaf: NodeKind, immediate: bool) -> Option<NodeKind> {
    children_of(parent).iter().copied().find(|kind| {
        if immediate {
            accepts_child(*kind, leaf)
        } else {
            can_lead_to(*kind, leaf)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use NodeKind::*;

    #[test]
    fn test_series_branch_chain() {
        assert!(accepts_child(SeriesRoot, Series));
        assert!(accepts_child(Series, Episode));
        assert!(accepts_child(Episode, Transcript));
        assert!(!accepts_child(SeriesRoot, Episode));
        assert!(accepts_child(Episode, EpisodeNote));
        assert!(!accepts_child(Episode, SeriesNote));
    }

    #[test]
    fn test_collections_recurse() {
        assert!(accepts_child(Collection, Collection));
        assert!(can_lead_to(Collection, Clip));
        assert!(can_lead_to(CollectionsRoot, ClipNote));
        assert_eq!(container_for(CollectionsRoot, Clip, true), Some(Collection));
        assert_eq!(container_for(Collection, Clip, true), Some(Collection));
        assert_eq!(container_for(Collection, ClipNote, false), Some(Collection));
        assert_eq!(container_for(Collection, ClipNote, true), Some(Clip));
    }

    #[test]
    fn test_notes_are_leaf_only() {
        assert!(!accepts_intermediate(Collection, CollectionNote, ClipNote));
        assert!(accepts_leaf(Collection, CollectionNote, CollectionNote));
        assert!(children_of(CollectionNote).is_empty());
    }

    #[test]
    fn test_keyword_branch_chain() {
        assert!(accepts_intermediate(KeywordsRoot, KeywordGroup, KeywordExample));
        assert!(accepts_intermediate(KeywordGroup, Keyword, KeywordExample));
        assert!(accepts_leaf(Keyword, KeywordExample, KeywordExample));
        assert!(!accepts_leaf(Keyword, Clip, KeywordExample));
    }

    #[test]
    fn test_search_branch_picks_container_by_leaf() {
        assert_eq!(
            container_for(SearchResults, SearchClip, true),
            Some(SearchCollection)
        );
        assert_eq!(
            container_for(SearchResults, SearchTranscript, false),
            Some(SearchSeries)
        );
        assert!(!accepts_intermediate(SearchResults, SearchSeries, SearchClip));
    }

    #[test]
    fn test_branches_do_not_cross() {
        assert!(!can_lead_to(CollectionsRoot, Keyword));
        assert!(!can_lead_to(SeriesRoot, Clip));
        assert_eq!(container_for(KeywordsRoot, Clip, false), None);
    }

    #[test]
    fn test_snapshot_matches_clip_class_at_leaf() {
        assert!(accepts_leaf(Collection, Snapshot, Clip));
        assert!(accepts_leaf(Collection, Clip, Snapshot));
    }
}
