//! Cascading record locks
//!
//! A Clip owns a Transcript that is edited with it, so locking the Clip must lock
//! the Transcript too. Acquisition goes dependent first, then the record; release
//! goes the other way. Either both locks are held or neither is.

use std::sync::Arc;

use super::error::LockError;
use crate::db::LockBackend;
use crate::models::RecordRef;

/// Acquires locks on behalf of one holder (a replica)
#[derive(Clone)]
pub struct RecordLockManager {
    backend: Arc<dyn LockBackend>,
    holder: String,
}

impl RecordLockManager {
    pub fn new(backend: Arc<dyn LockBackend>, holder: impl Into<String>) -> Self {
        Self {
            backend,
            holder: holder.into(),
        }
    }

    pub fn holder(&self) -> &str {
        &self.holder
    }

    pub fn backend(&self) -> &Arc<dyn LockBackend> {
        &self.backend
    }

    /// Lock `record` and its lockable dependent.
    ///
    /// Fails immediately with the current holder if either lock is taken; no
    /// lock taken by this call is left behind on failure. Locks this holder
    /// already had are reused and stay with whoever took them first, so a
    /// nested guard never releases an outer guard's lock.
    pub fn acquire(&self, record: RecordRef) -> Result<LockGuard, LockError> {
        let dependent = self.backend.lockable_dependent(record);

        let mut owns_dependent = false;
        if let Some(dependent) = dependent {
            match self.backend.try_lock(dependent, &self.holder) {
                Ok(taken) => owns_dependent = taken,
                Err(err) => {
                    tracing::debug!(%record, %dependent, "dependent lock unavailable");
                    return Err(err.into());
                }
            }
        }

        let owns_record = match self.backend.try_lock(record, &self.holder) {
            Ok(taken) => taken,
            Err(err) => {
                if let Some(dependent) = dependent.filter(|_| owns_dependent) {
                    self.backend.unlock(dependent, &self.holder);
                }
                tracing::debug!(%record, "record lock unavailable");
                return Err(err.into());
            }
        };

        tracing::debug!(
            %record,
            ?dependent,
            holder = %self.holder,
            reused = !owns_record,
            "record locked"
        );
        Ok(LockGuard {
            backend: Arc::clone(&self.backend),
            holder: self.holder.clone(),
            record,
            dependent,
            owns_record,
            owns_dependent,
        })
    }
}

/// Locks held on a record and its dependent; the locks this guard took are
/// released exactly once, record first, when the guard is released or dropped
pub struct LockGuard {
    backend: Arc<dyn LockBackend>,
    holder: String,
    record: RecordRef,
    dependent: Option<RecordRef>,
    owns_record: bool,
    owns_dependent: bool,
}

impl LockGuard {
    pub fn record(&self) -> RecordRef {
        self.record
    }

    /// Dependent record still held for this guard's holder
    pub fn dependent(&self) -> Option<RecordRef> {
        self.dependent
    }

    /// Release the dependent's lock ahead of the record's, e.g. right before the
    /// dependent is deleted. A lock the holder had before this guard is left alone.
    pub fn release_dependent(&mut self) -> Option<RecordRef> {
        let dependent = self.dependent.take()?;
        if std::mem::take(&mut self.owns_dependent) {
            self.backend.unlock(dependent, &self.holder);
        }
        Some(dependent)
    }

    pub fn release(mut self) {
        self.release_all();
    }

    fn release_all(&mut self) {
        if std::mem::take(&mut self.owns_record) {
            self.backend.unlock(self.record, &self.holder);
        }
        self.release_dependent();
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        self.release_all();
    }
}

impl std::fmt::Debug for LockGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockGuard")
            .field("holder", &self.holder)
            .field("record", &self.record)
            .field("dependent", &self.dependent)
            .field("owns_record", &self.owns_record)
            .field("owns_dependent", &self.owns_dependent)
            .finish()
    }
}
