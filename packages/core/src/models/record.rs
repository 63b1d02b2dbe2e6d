//! Backing record identity
//!
//! The tree never owns domain entities. A node only remembers which record it
//! stands for (`RecordRef`), and the few attributes it needs are loaded on demand
//! as a `RecordInfo`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Persisted entity types the tree can refer to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecordType {
    Series,
    Episode,
    Transcript,
    Collection,
    Clip,
    Snapshot,
    Keyword,
    Note,
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordType::Series => "Series",
            RecordType::Episode => "Episode",
            RecordType::Transcript => "Transcript",
            RecordType::Collection => "Collection",
            RecordType::Clip => "Clip",
            RecordType::Snapshot => "Snapshot",
            RecordType::Keyword => "Keyword",
            RecordType::Note => "Note",
        };
        f.write_str(name)
    }
}

/// Weak reference to a backing record: (type, id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordRef {
    pub record_type: RecordType,
    pub id: i64,
}

impl RecordRef {
    pub fn new(record_type: RecordType, id: i64) -> Self {
        Self { record_type, id }
    }

    pub fn clip(id: i64) -> Self {
        Self::new(RecordType::Clip, id)
    }

    pub fn transcript(id: i64) -> Self {
        Self::new(RecordType::Transcript, id)
    }

    pub fn collection(id: i64) -> Self {
        Self::new(RecordType::Collection, id)
    }

    pub fn note(id: i64) -> Self {
        Self::new(RecordType::Note, id)
    }
}

impl fmt::Display for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.record_type, self.id)
    }
}

/// The slice of a backing record the tree cares about
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordInfo {
    pub record: RecordRef,
    pub display_name: String,
    /// Record id of the parent entity (0 when top-level)
    pub parent_id: i64,
    /// Position inside the parent Collection (Clips and Snapshots only)
    pub sort_order: Option<i64>,
}

impl RecordInfo {
    pub fn new(record: RecordRef, display_name: impl Into<String>, parent_id: i64) -> Self {
        Self {
            record,
            display_name: display_name.into(),
            parent_id,
            sort_order: None,
        }
    }

    pub fn with_sort_order(mut self, sort_order: i64) -> Self {
        self.sort_order = Some(sort_order);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_ref_display() {
        assert_eq!(RecordRef::clip(5).to_string(), "Clip#5");
        assert_eq!(RecordRef::transcript(9).to_string(), "Transcript#9");
    }

    #[test]
    fn test_record_ref_serialization_contract() {
        let json = serde_json::to_value(RecordRef::clip(101)).unwrap();
        assert_eq!(json.get("recordType").unwrap(), "Clip");
        assert_eq!(json.get("id").unwrap(), 101);
    }
}
