//! Backing-Record Collaborator Traits
//!
//! The tree core needs very little from the persistence layer: a record's
//! display name, parent and sort order, a way to find a record by name under a
//! parent, the lock contract, and a transactional delete. These traits are that
//! seam. Domain CRUD (saving a Clip, editing a Transcript) stays on the other side.
//!
//! # Design Decisions
//!
//! 1. **Async reads and deletes**: `RecordStore` is async so embedded and
//!    networked backends fit behind the same trait.
//! 2. **Synchronous locks**: lock acquisition is an immediate pass/fail call with
//!    no queueing, and release has to be callable from `Drop`, so `LockBackend`
//!    is synchronous.
//! 3. **Transactions are owned objects**: a `Transaction` is consumed by
//!    `commit`/`rollback`, so a transaction can never be finished twice.

use async_trait::async_trait;

use super::error::StoreError;
use crate::models::{RecordInfo, RecordRef, RecordType};

/// Records that hang off another record and must be handled with it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dependents {
    /// Notes attached to the record
    pub notes: Vec<RecordRef>,
    /// Keywords for which the record serves as an example, as (group, keyword)
    pub keyword_examples: Vec<(String, String)>,
}

/// Read and delete access to backing records
///
/// Implementations must be `Send + Sync`; the tree service holds one behind an
/// `Arc` and calls it from async tasks.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Load the tree-relevant attributes of a record
    async fn load(&self, record: RecordRef) -> Result<Option<RecordInfo>, StoreError>;

    /// Find a record of `record_type` named `name` under `parent_id`.
    ///
    /// Used to infer the record id of an ancestor that has to be created
    /// implicitly, e.g. a Collection known only by its name and parent.
    async fn find_child(
        &self,
        record_type: RecordType,
        parent_id: i64,
        name: &str,
    ) -> Result<Option<RecordInfo>, StoreError>;

    /// Current sort order of a Clip or Snapshot
    async fn sort_order(&self, record: RecordRef) -> Result<Option<i64>, StoreError> {
        Ok(self.load(record).await?.and_then(|info| info.sort_order))
    }

    /// Notes and keyword-example designations that depend on `record`
    async fn dependents(&self, record: RecordRef) -> Result<Dependents, StoreError>;

    /// Delete `record` inside `tx`.
    ///
    /// Returns `RecordLocked` when another holder has it locked and
    /// `DeleteBlocked` when an integrity constraint forbids it.
    async fn delete(&self, record: RecordRef, tx: &mut dyn Transaction) -> Result<(), StoreError>;
}

/// Pessimistic advisory locks and transactions on backing records
pub trait LockBackend: Send + Sync {
    /// Lock `record` for `holder`, failing immediately with the current holder
    /// if someone else has it.
    ///
    /// Returns `true` when the lock was taken by this call and `false` when
    /// `holder` already had it.
    fn try_lock(&self, record: RecordRef, holder: &str) -> Result<bool, StoreError>;

    /// Release a lock taken by `holder`; releasing an unheld lock is a no-op
    fn unlock(&self, record: RecordRef, holder: &str);

    /// Record that must be locked together with `record` (a Clip's Transcript)
    fn lockable_dependent(&self, record: RecordRef) -> Option<RecordRef>;

    /// Open a transaction on behalf of `holder`
    fn begin(&self, holder: &str) -> Result<Box<dyn Transaction>, StoreError>;
}

/// An open backing-store transaction
pub trait Transaction: Send {
    /// Holder that opened the transaction
    fn holder(&self) -> &str;

    /// Stage a delete; applied on commit
    fn stage_delete(&mut self, record: RecordRef);

    fn commit(self: Box<Self>) -> Result<(), StoreError>;

    fn rollback(self: Box<Self>);
}
