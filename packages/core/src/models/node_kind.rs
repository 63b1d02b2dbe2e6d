//! Node Kinds and Branches
//!
//! Every position in the replicated tree carries a `NodeKind`. Kinds form a closed
//! set, grouped into four branches that each hang off their own root:
//!
//! - **Series**: `SeriesRoot → Series → Episode → Transcript` (+ note variants)
//! - **Collections**: `CollectionsRoot → Collection → {Clip | Snapshot | Collection}` (+ note variants)
//! - **Keywords**: `KeywordsRoot → KeywordGroup → Keyword → KeywordExample`
//! - **Search**: `SearchRoot → SearchResults → {SearchSeries…} | {SearchCollection…}`
//!
//! The wire tags returned by [`NodeKind::tag`] are part of the change-message protocol
//! and must stay stable across releases.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::record::RecordType;

/// Top-level subtree of the replicated tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Branch {
    Series,
    Collections,
    Keywords,
    Search,
}

impl Branch {
    /// All branches, in the order their roots appear in the tree
    pub const ALL: [Branch; 4] = [
        Branch::Series,
        Branch::Collections,
        Branch::Keywords,
        Branch::Search,
    ];

    /// Untranslated marker carried in change messages.
    ///
    /// Display labels of branch roots may be localized; the marker never is.
    pub fn marker(self) -> &'static str {
        match self {
            Branch::Series => "Series",
            Branch::Collections => "Collections",
            Branch::Keywords => "Keywords",
            Branch::Search => "Search",
        }
    }

    /// Parse an untranslated marker (case-sensitive, wire format)
    pub fn from_marker(marker: &str) -> Option<Self> {
        Branch::ALL.into_iter().find(|b| b.marker() == marker)
    }

    /// Kind of the node that roots this branch
    pub fn root_kind(self) -> NodeKind {
        match self {
            Branch::Series => NodeKind::SeriesRoot,
            Branch::Collections => NodeKind::CollectionsRoot,
            Branch::Keywords => NodeKind::KeywordsRoot,
            Branch::Search => NodeKind::SearchRoot,
        }
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.marker())
    }
}

/// How siblings of a kind are ordered under their parent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiblingOrdering {
    /// Explicit integer `sort_order`, unique within the parent
    Numeric,
    /// Case- and diacritic-insensitive display name
    Alphabetic,
}

/// Closed set of node classes in the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    SeriesRoot,
    Series,
    Episode,
    Transcript,
    SeriesNote,
    EpisodeNote,
    TranscriptNote,

    CollectionsRoot,
    Collection,
    Clip,
    Snapshot,
    CollectionNote,
    ClipNote,
    SnapshotNote,

    KeywordsRoot,
    KeywordGroup,
    Keyword,
    KeywordExample,

    SearchRoot,
    SearchResults,
    SearchSeries,
    SearchEpisode,
    SearchTranscript,
    SearchCollection,
    SearchClip,
    SearchSnapshot,
}

impl NodeKind {
    pub const ALL: [NodeKind; 26] = [
        NodeKind::SeriesRoot,
        NodeKind::Series,
        NodeKind::Episode,
        NodeKind::Transcript,
        NodeKind::SeriesNote,
        NodeKind::EpisodeNote,
        NodeKind::TranscriptNote,
        NodeKind::CollectionsRoot,
        NodeKind::Collection,
        NodeKind::Clip,
        NodeKind::Snapshot,
        NodeKind::CollectionNote,
        NodeKind::ClipNote,
        NodeKind::SnapshotNote,
        NodeKind::KeywordsRoot,
        NodeKind::KeywordGroup,
        NodeKind::Keyword,
        NodeKind::KeywordExample,
        NodeKind::SearchRoot,
        NodeKind::SearchResults,
        NodeKind::SearchSeries,
        NodeKind::SearchEpisode,
        NodeKind::SearchTranscript,
        NodeKind::SearchCollection,
        NodeKind::SearchClip,
        NodeKind::SearchSnapshot,
    ];

    /// Stable wire tag (e.g. `ClipNode`)
    pub fn tag(self) -> &'static str {
        match self {
            NodeKind::SeriesRoot => "SeriesRootNode",
            NodeKind::Series => "SeriesNode",
            NodeKind::Episode => "EpisodeNode",
            NodeKind::Transcript => "TranscriptNode",
            NodeKind::SeriesNote => "SeriesNoteNode",
            NodeKind::EpisodeNote => "EpisodeNoteNode",
            NodeKind::TranscriptNote => "TranscriptNoteNode",
            NodeKind::CollectionsRoot => "CollectionsRootNode",
            NodeKind::Collection => "CollectionNode",
            NodeKind::Clip => "ClipNode",
            NodeKind::Snapshot => "SnapshotNode",
            NodeKind::CollectionNote => "CollectionNoteNode",
            NodeKind::ClipNote => "ClipNoteNode",
            NodeKind::SnapshotNote => "SnapshotNoteNode",
            NodeKind::KeywordsRoot => "KeywordRootNode",
            NodeKind::KeywordGroup => "KeywordGroupNode",
            NodeKind::Keyword => "KeywordNode",
            NodeKind::KeywordExample => "KeywordExampleNode",
            NodeKind::SearchRoot => "SearchRootNode",
            NodeKind::SearchResults => "SearchResultsNode",
            NodeKind::SearchSeries => "SearchSeriesNode",
            NodeKind::SearchEpisode => "SearchEpisodeNode",
            NodeKind::SearchTranscript => "SearchTranscriptNode",
            NodeKind::SearchCollection => "SearchCollectionNode",
            NodeKind::SearchClip => "SearchClipNode",
            NodeKind::SearchSnapshot => "SearchSnapshotNode",
        }
    }

    /// Parse a wire tag produced by [`NodeKind::tag`]
    pub fn from_tag(tag: &str) -> Option<Self> {
        NodeKind::ALL.into_iter().find(|k| k.tag() == tag)
    }

    pub fn branch(self) -> Branch {
        use NodeKind::*;
        match self {
            SeriesRoot | Series | Episode | Transcript | SeriesNote | EpisodeNote
            | TranscriptNote => Branch::Series,
            CollectionsRoot | Collection | Clip | Snapshot | CollectionNote | ClipNote
            | SnapshotNote => Branch::Collections,
            KeywordsRoot | KeywordGroup | Keyword | KeywordExample => Branch::Keywords,
            SearchRoot | SearchResults | SearchSeries | SearchEpisode | SearchTranscript
            | SearchCollection | SearchClip | SearchSnapshot => Branch::Search,
        }
    }

    pub fn is_root(self) -> bool {
        matches!(
            self,
            NodeKind::SeriesRoot
                | NodeKind::CollectionsRoot
                | NodeKind::KeywordsRoot
                | NodeKind::SearchRoot
        )
    }

    /// Note variants are leaf-only: they may only appear as the last path element
    pub fn is_note(self) -> bool {
        matches!(
            self,
            NodeKind::SeriesNote
                | NodeKind::EpisodeNote
                | NodeKind::TranscriptNote
                | NodeKind::CollectionNote
                | NodeKind::ClipNote
                | NodeKind::SnapshotNote
        )
    }

    /// Representative of this kind's equivalence class.
    ///
    /// Clips and Snapshots share one name space inside a Collection, as do their
    /// search-result counterparts. Every other kind is its own class.
    pub fn class(self) -> NodeKind {
        match self {
            NodeKind::Snapshot => NodeKind::Clip,
            NodeKind::SearchSnapshot => NodeKind::SearchClip,
            other => other,
        }
    }

    pub fn same_class(self, other: NodeKind) -> bool {
        self.class() == other.class()
    }

    pub fn ordering(self) -> SiblingOrdering {
        match self {
            NodeKind::Clip | NodeKind::Snapshot | NodeKind::SearchClip | NodeKind::SearchSnapshot => {
                SiblingOrdering::Numeric
            }
            _ => SiblingOrdering::Alphabetic,
        }
    }

    /// Backing record type referenced by `record_id`, if any.
    ///
    /// Roots, keyword groups and search-result sets are synthetic (record id 0).
    /// Keyword examples point at the Clip that serves as the example.
    pub fn record_type(self) -> Option<RecordType> {
        use NodeKind::*;
        match self {
            SeriesRoot | CollectionsRoot | KeywordsRoot | SearchRoot | KeywordGroup
            | SearchResults => None,
            Series | SearchSeries => Some(RecordType::Series),
            Episode | SearchEpisode => Some(RecordType::Episode),
            Transcript | SearchTranscript => Some(RecordType::Transcript),
            Collection | SearchCollection => Some(RecordType::Collection),
            Clip | SearchClip | KeywordExample => Some(RecordType::Clip),
            Snapshot | SearchSnapshot => Some(RecordType::Snapshot),
            Keyword => Some(RecordType::Keyword),
            SeriesNote | EpisodeNote | TranscriptNote | CollectionNote | ClipNote
            | SnapshotNote => Some(RecordType::Note),
        }
    }

    /// Icon key used by views to render this kind; preserved when subtrees are cloned
    pub fn icon(self) -> &'static str {
        use NodeKind::*;
        match self {
            SeriesRoot | CollectionsRoot | KeywordsRoot | SearchRoot => "root",
            Series | SearchSeries => "series",
            Episode | SearchEpisode => "episode",
            Transcript | SearchTranscript => "transcript",
            Collection | SearchCollection => "collection",
            Clip | SearchClip => "clip",
            Snapshot | SearchSnapshot => "snapshot",
            KeywordGroup => "keyword-group",
            Keyword => "keyword",
            KeywordExample => "keyword-example",
            SearchResults => "search-results",
            SeriesNote | EpisodeNote | TranscriptNote | CollectionNote | ClipNote
            | SnapshotNote => "note",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
