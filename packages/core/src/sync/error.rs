//! Protocol Error Types

use thiserror::Error;

/// Structural-change message and transport errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The message body does not follow the wire form
    #[error("Malformed message: {0}")]
    Malformed(String),

    #[error("Unknown opcode: {0}")]
    UnknownOpcode(String),

    #[error("Unknown node kind: {0}")]
    UnknownNodeKind(String),

    /// The branch marker is not one of the untranslated root markers
    #[error("Unknown branch marker: {0}")]
    UnknownBranch(String),

    #[error("Transport failure: {0}")]
    Transport(String),
}

impl ProtocolError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }

    pub fn unknown_opcode(tag: impl Into<String>) -> Self {
        Self::UnknownOpcode(tag.into())
    }

    pub fn unknown_node_kind(tag: impl Into<String>) -> Self {
        Self::UnknownNodeKind(tag.into())
    }

    pub fn unknown_branch(marker: impl Into<String>) -> Self {
        Self::UnknownBranch(marker.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }
}
