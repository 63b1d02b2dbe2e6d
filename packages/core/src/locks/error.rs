//! Lock Error Types

use thiserror::Error;

use crate::db::StoreError;
use crate::models::RecordRef;

/// Record lock and guarded-delete errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LockError {
    /// Another holder has the record (or its dependent) locked
    #[error("Record {record} is locked by {holder}")]
    RecordLocked { record: RecordRef, holder: String },

    /// The backing store refused the delete
    #[error("Delete of {record} blocked: {reason}")]
    DeleteBlocked { record: RecordRef, reason: String },

    /// Any other backing store failure
    #[error("Backing store operation failed: {0}")]
    Store(StoreError),
}

impl LockError {
    /// Create a record locked error
    pub fn record_locked(record: RecordRef, holder: impl Into<String>) -> Self {
        Self::RecordLocked {
            record,
            holder: holder.into(),
        }
    }

    /// Current holder, for `RecordLocked`
    pub fn holder(&self) -> Option<&str> {
        match self {
            Self::RecordLocked { holder, .. } => Some(holder),
            _ => None,
        }
    }
}

impl From<StoreError> for LockError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::RecordLocked { record, holder } => Self::RecordLocked { record, holder },
            StoreError::DeleteBlocked { record, reason } => Self::DeleteBlocked { record, reason },
            other => Self::Store(other),
        }
    }
}
