//! Backing Store Error Types
//!
//! Errors reported by the backing-record collaborator. The tree core never talks
//! to a database directly; these are the failures it can receive from whoever
//! does.

use thiserror::Error;

use crate::models::RecordRef;

/// Backing-record operation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No record with this identity exists
    #[error("Record not found: {record}")]
    RecordNotFound { record: RecordRef },

    /// Another holder has the record locked
    #[error("Record {record} is locked by {holder}")]
    RecordLocked { record: RecordRef, holder: String },

    /// Deleting would violate a store integrity constraint
    #[error("Delete of {record} blocked: {reason}")]
    DeleteBlocked { record: RecordRef, reason: String },

    /// Transaction could not be committed
    #[error("Transaction failed: {context}")]
    TransactionFailed { context: String },

    /// Anything else the backend reports
    #[error("Backing store failure: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn record_not_found(record: RecordRef) -> Self {
        Self::RecordNotFound { record }
    }

    pub fn record_locked(record: RecordRef, holder: impl Into<String>) -> Self {
        Self::RecordLocked {
            record,
            holder: holder.into(),
        }
    }

    pub fn delete_blocked(record: RecordRef, reason: impl Into<String>) -> Self {
        Self::DeleteBlocked {
            record,
            reason: reason.into(),
        }
    }

    pub fn transaction_failed(context: impl Into<String>) -> Self {
        Self::TransactionFailed {
            context: context.into(),
        }
    }

    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}
