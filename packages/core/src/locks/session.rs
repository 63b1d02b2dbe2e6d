//! Edit Sessions
//!
//! An `EditSession` pairs the cascading lock on a record with the transaction
//! that edits it. However the session ends, the transaction is finished before
//! any lock is released: commit then unlock on success, rollback then unlock on
//! cancel, error or drop.

use super::error::LockError;
use super::manager::{LockGuard, RecordLockManager};
use crate::db::{StoreError, Transaction};
use crate::models::RecordRef;

/// A locked record with an open transaction
pub struct EditSession {
    record: RecordRef,
    transaction: Option<Box<dyn Transaction>>,
    lock: Option<LockGuard>,
}

impl EditSession {
    /// Lock `record` (and its dependent), then open a transaction
    pub fn begin(manager: &RecordLockManager, record: RecordRef) -> Result<Self, LockError> {
        let lock = manager.acquire(record)?;
        // On failure the guard drops here and releases both locks
        let transaction = manager.backend().begin(manager.holder())?;
        Ok(Self {
            record,
            transaction: Some(transaction),
            lock: Some(lock),
        })
    }

    pub fn record(&self) -> RecordRef {
        self.record
    }

    /// Dependent locked along with the record, while still held
    pub fn dependent(&self) -> Option<RecordRef> {
        self.lock.as_ref().and_then(LockGuard::dependent)
    }

    pub fn transaction_mut(&mut self) -> Result<&mut dyn Transaction, LockError> {
        match self.transaction.as_deref_mut() {
            Some(transaction) => {
                let transaction: &mut dyn Transaction = transaction;
                Ok(transaction)
            }
            None => Err(StoreError::transaction_failed("transaction already finished").into()),
        }
    }

    /// Release the dependent's lock while keeping the record locked
    pub fn release_dependent(&mut self) -> Option<RecordRef> {
        self.lock.as_mut().and_then(LockGuard::release_dependent)
    }

    /// Commit, then unlock
    pub fn commit(mut self) -> Result<(), LockError> {
        if let Some(transaction) = self.transaction.take() {
            transaction.commit()?;
        }
        if let Some(lock) = self.lock.take() {
            lock.release();
        }
        Ok(())
    }

    /// Roll back, then unlock
    pub fn cancel(mut self) {
        self.rollback_then_unlock();
    }

    fn rollback_then_unlock(&mut self) {
        if let Some(transaction) = self.transaction.take() {
            transaction.rollback();
        }
        if let Some(lock) = self.lock.take() {
            lock.release();
        }
    }
}

impl Drop for EditSession {
    fn drop(&mut self) {
        if self.transaction.is_some() {
            tracing::debug!(record = %self.record, "edit session dropped without commit");
        }
        self.rollback_then_unlock();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryRecordStore;
    use std::sync::Arc;

    fn session(store: &InMemoryRecordStore) -> EditSession {
        store.attach_transcript(RecordRef::clip(5), RecordRef::transcript(9));
        let manager = RecordLockManager::new(Arc::new(store.clone()), "a");
        EditSession::begin(&manager, RecordRef::clip(5)).unwrap()
    }

    #[test]
    fn test_cancel_rolls_back_before_unlocking() {
        let store = InMemoryRecordStore::new();
        session(&store).cancel();

        assert_eq!(
            store.journal(),
            vec![
                "lock Transcript#9",
                "lock Clip#5",
                "begin",
                "rollback",
                "unlock Clip#5",
                "unlock Transcript#9"
            ]
        );
    }

    #[test]
    fn test_drop_behaves_like_cancel() {
        let store = InMemoryRecordStore::new();
        drop(session(&store));

        let journal = store.journal();
        let rollback = journal.iter().position(|e| e == "rollback").unwrap();
        let unlock = journal.iter().position(|e| e.starts_with("unlock")).unwrap();
        assert!(rollback < unlock);
        assert_eq!(store.lock_holder(RecordRef::clip(5)), None);
    }

    #[test]
    fn test_commit_then_unlock() {
        let store = InMemoryRecordStore::new();
        session(&store).commit().unwrap();

        assert_eq!(
            &store.journal()[3..],
            &["commit", "unlock Clip#5", "unlock Transcript#9"]
        );
    }
}
