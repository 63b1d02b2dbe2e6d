//! Structural-Change Message Codec
//!
//! A structural change travels as one line of text:
//!
//! ```text
//! OPCODE<TAB>NodeKind<TAB>BranchMarker<TAB>path[<TAB>key=value]*
//! ```
//!
//! `path` joins display names with `>`. Inside names and values a backslash
//! escapes `\`, `>`, and the control characters `\t`, `\n` and `\r`, so a raw tab
//! only ever separates fields. The branch marker is the untranslated root marker,
//! never the localized label, so peers running in different locales agree.
//!
//! Payload keys:
//!
//! | key        | used by        | value                                  |
//! |------------|----------------|----------------------------------------|
//! | `id`       | ADD            | record id of the node                  |
//! | `parent`   | ADD            | record id of the parent entity         |
//! | `sort`     | ADD, MOVE      | sort order                             |
//! | `name`     | RENAME         | new display name                       |
//! | `dest`     | MOVE           | path of the new parent                 |
//! | `destkind` | MOVE           | node kind of the new parent            |
//! | `copy`     | MOVE           | `1` when the source is kept            |
//! | `newid`    | MOVE           | record id of the copy                  |
//! | `disambig` | all but ADD    | record id that must match at the leaf  |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use super::error::ProtocolError;
use crate::models::{Branch, NodeKind, NodePath};
use crate::services::{
    AddRequest, DeleteRequest, MoveRequest, RenameRequest, ReorderRequest, StructuralChange,
};

const FIELD_SEPARATOR: char = '\t';
const PATH_SEPARATOR: char = '>';
const ESCAPE: char = '\\';

/// Message opcodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Add,
    Rename,
    Delete,
    Move,
    Reorder,
}

impl Opcode {
    pub const ALL: [Opcode; 5] = [
        Opcode::Add,
        Opcode::Rename,
        Opcode::Delete,
        Opcode::Move,
        Opcode::Reorder,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            Opcode::Add => "ADD",
            Opcode::Rename => "RENAME",
            Opcode::Delete => "DELETE",
            Opcode::Move => "MOVE",
            Opcode::Reorder => "REORDER",
        }
    }

    pub fn of(change: &StructuralChange) -> Self {
        match change {
            StructuralChange::Add(_) => Opcode::Add,
            StructuralChange::Delete(_) => Opcode::Delete,
            StructuralChange::Rename(_) => Opcode::Rename,
            StructuralChange::Move(_) => Opcode::Move,
            StructuralChange::Reorder(_) => Opcode::Reorder,
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Opcode {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Opcode::ALL
            .into_iter()
            .find(|op| op.tag() == s)
            .ok_or_else(|| ProtocolError::unknown_opcode(s))
    }
}

/// Serialize a structural change into its wire form
pub fn encode(change: &StructuralChange) -> String {
    let path = change.path();
    let mut line = String::new();
    line.push_str(Opcode::of(change).tag());
    line.push(FIELD_SEPARATOR);
    line.push_str(change.kind().tag());
    line.push(FIELD_SEPARATOR);
    line.push_str(path.branch().marker());
    line.push(FIELD_SEPARATOR);
    push_path(&mut line, path);

    match change {
        StructuralChange::Add(req) => {
            push_pair(&mut line, "id", &req.record_id.to_string());
            if req.parent_record_id != 0 {
                push_pair(&mut line, "parent", &req.parent_record_id.to_string());
            }
            if let Some(sort) = req.sort_order {
                push_pair(&mut line, "sort", &sort.to_string());
            }
        }
        StructuralChange::Delete(req) => {
            push_disambiguator(&mut line, req.disambiguator);
        }
        StructuralChange::Rename(req) => {
            push_pair(&mut line, "name", &req.new_name);
            push_disambiguator(&mut line, req.disambiguator);
        }
        StructuralChange::Move(req) => {
            line.push(FIELD_SEPARATOR);
            line.push_str("dest=");
            push_path(&mut line, &req.destination);
            push_pair(&mut line, "destkind", req.destination_kind.tag());
            if !req.delete_source {
                push_pair(&mut line, "copy", "1");
            }
            if let Some(new_id) = req.new_record_id {
                push_pair(&mut line, "newid", &new_id.to_string());
            }
            if let Some(sort) = req.sort_order {
                push_pair(&mut line, "sort", &sort.to_string());
            }
            push_disambiguator(&mut line, req.disambiguator);
        }
        StructuralChange::Reorder(_) => {}
    }

    line
}

/// Parse a wire-form line back into a structural change
pub fn decode(line: &str) -> Result<StructuralChange, ProtocolError> {
    let mut fields = line.trim_end_matches(['\r', '\n']).split(FIELD_SEPARATOR);
    let mut header = || {
        fields
            .next()
            .ok_or_else(|| ProtocolError::malformed(format!("truncated message: {:?}", line)))
    };

    let opcode: Opcode = header()?.parse()?;
    let kind_tag = header()?;
    let kind = NodeKind::from_tag(kind_tag).ok_or_else(|| ProtocolError::unknown_node_kind(kind_tag))?;
    let marker = header()?;
    let branch = Branch::from_marker(marker).ok_or_else(|| ProtocolError::unknown_branch(marker))?;
    let path = NodePath::new(branch, split_path(header()?)?);

    let mut payload = Payload::default();
    for field in fields {
        let (key, value) = field
            .split_once('=')
            .ok_or_else(|| ProtocolError::malformed(format!("expected key=value, got {:?}", field)))?;
        payload.0.insert(key, value);
    }

    let change = match opcode {
        Opcode::Add => StructuralChange::Add(AddRequest {
            path,
            kind,
            record_id: payload.required_int("id")?,
            parent_record_id: payload.int("parent")?.unwrap_or(0),
            sort_order: payload.int("sort")?,
        }),
        Opcode::Delete => StructuralChange::Delete(DeleteRequest {
            path,
            kind,
            disambiguator: payload.int("disambig")?,
        }),
        Opcode::Rename => StructuralChange::Rename(RenameRequest {
            path,
            kind,
            new_name: payload.required_text("name")?,
            disambiguator: payload.int("disambig")?,
        }),
        Opcode::Move => {
            let destkind_tag = payload.required_raw("destkind")?;
            let destination_kind = NodeKind::from_tag(destkind_tag)
                .ok_or_else(|| ProtocolError::unknown_node_kind(destkind_tag))?;
            let destination = NodePath::new(
                destination_kind.branch(),
                split_path(payload.required_raw("dest")?)?,
            );
            StructuralChange::Move(MoveRequest {
                source: path,
                kind,
                disambiguator: payload.int("disambig")?,
                destination,
                destination_kind,
                delete_source: payload.raw("copy") != Some("1"),
                new_record_id: payload.int("newid")?,
                sort_order: payload.int("sort")?,
            })
        }
        Opcode::Reorder => StructuralChange::Reorder(ReorderRequest { path, kind }),
    };
    Ok(change)
}

#[derive(Default)]
struct Payload<'a>(HashMap<&'a str, &'a str>);

impl<'a> Payload<'a> {
    fn raw(&self, key: &str) -> Option<&'a str> {
        self.0.get(key).copied()
    }

    fn required_raw(&self, key: &str) -> Result<&'a str, ProtocolError> {
        self.raw(key)
            .ok_or_else(|| ProtocolError::malformed(format!("missing {}", key)))
    }

    fn required_text(&self, key: &str) -> Result<String, ProtocolError> {
        unescape(self.required_raw(key)?)
    }

    fn int(&self, key: &str) -> Result<Option<i64>, ProtocolError> {
        self.raw(key)
            .map(|value| {
                value
                    .parse::<i64>()
                    .map_err(|_| ProtocolError::malformed(format!("{} is not an integer: {:?}", key, value)))
            })
            .transpose()
    }

    fn required_int(&self, key: &str) -> Result<i64, ProtocolError> {
        self.int(key)?
            .ok_or_else(|| ProtocolError::malformed(format!("missing {}", key)))
    }
}

fn push_pair(line: &mut String, key: &str, value: &str) {
    line.push(FIELD_SEPARATOR);
    line.push_str(key);
    line.push('=');
    push_escaped(line, value);
}

fn push_disambiguator(line: &mut String, disambiguator: Option<i64>) {
    if let Some(record_id) = disambiguator {
        push_pair(line, "disambig", &record_id.to_string());
    }
}

fn push_path(line: &mut String, path: &NodePath) {
    for (i, name) in path.names().iter().enumerate() {
        if i > 0 {
            line.push(PATH_SEPARATOR);
        }
        push_escaped(line, name);
    }
}

fn push_escaped(line: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            ESCAPE => line.push_str("\\\\"),
            PATH_SEPARATOR => line.push_str("\\>"),
            '\t' => line.push_str("\\t"),
            '\n' => line.push_str("\\n"),
            '\r' => line.push_str("\\r"),
            c => line.push(c),
        }
    }
}

/// Split an escaped `>`-joined path; the empty string is the branch root, so
/// no element of a non-root path may be empty
fn split_path(field: &str) -> Result<Vec<String>, ProtocolError> {
    if field.is_empty() {
        return Ok(Vec::new());
    }
    let names = unescape_split(field, Some(PATH_SEPARATOR))?;
    if names.iter().any(String::is_empty) {
        return Err(ProtocolError::malformed(format!(
            "empty name in path {:?}",
            field
        )));
    }
    Ok(names)
}

fn unescape(field: &str) -> Result<String, ProtocolError> {
    Ok(unescape_split(field, None)?.concat())
}

fn unescape_split(field: &str, separator: Option<char>) -> Result<Vec<String>, ProtocolError> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = field.chars();

    while let Some(c) = chars.next() {
        if c == ESCAPE {
            let escaped = match chars.next() {
                Some(ESCAPE) => ESCAPE,
                Some(PATH_SEPARATOR) => PATH_SEPARATOR,
                Some('t') => '\t',
                Some('n') => '\n',
                Some('r') => '\r',
                other => {
                    return Err(ProtocolError::malformed(format!(
                        "invalid escape {:?} in {:?}",
                        other, field
                    )))
                }
            };
            current.push(escaped);
        } else if Some(c) == separator {
            parts.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    parts.push(current);
    Ok(parts)
}

/// A structural-change message as handed to the transport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageEnvelope {
    /// Replica id of the sender
    pub sender: String,
    /// Per-sender sequence number, starting at 1
    pub seq: u64,
    pub sent_at: DateTime<Utc>,
    /// Wire-form change
    pub body: String,
}

impl MessageEnvelope {
    pub fn new(sender: impl Into<String>, seq: u64, body: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            seq,
            sent_at: Utc::now(),
            body: body.into(),
        }
    }

    pub fn for_change(sender: impl Into<String>, seq: u64, change: &StructuralChange) -> Self {
        Self::new(sender, seq, encode(change))
    }

    pub fn decode(&self) -> Result<StructuralChange, ProtocolError> {
        decode(&self.body)
    }
}
