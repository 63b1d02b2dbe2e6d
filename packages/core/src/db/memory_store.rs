//! In-Memory Backing Store
//!
//! A complete `RecordStore` + `LockBackend` over process memory. Several replicas
//! may share one instance (via `Arc`) to stand in for the shared database: they
//! then see the same records and contend for the same locks.
//!
//! Every lock, unlock, transaction and delete is appended to a journal so callers
//! can observe the order in which the core drives the store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::error::StoreError;
use super::record_store::{Dependents, LockBackend, RecordStore, Transaction};
use crate::models::{RecordInfo, RecordRef, RecordType};
use crate::tree::names_match;

#[derive(Debug, Default)]
struct StoreState {
    records: HashMap<RecordRef, RecordInfo>,
    locks: HashMap<RecordRef, String>,
    transcripts: HashMap<RecordRef, RecordRef>,
    notes: HashMap<RecordRef, Vec<RecordRef>>,
    keyword_examples: HashMap<RecordRef, Vec<(String, String)>>,
    blocked: HashMap<RecordRef, String>,
    journal: Vec<String>,
}

impl StoreState {
    fn forget(&mut self, record: RecordRef) {
        self.records.remove(&record);
        self.transcripts.remove(&record);
        self.notes.remove(&record);
        self.keyword_examples.remove(&record);
        for notes in self.notes.values_mut() {
            notes.retain(|n| *n != record);
        }
    }
}

/// Shared in-memory backing store
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecordStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert or replace a record
    pub fn insert(&self, info: RecordInfo) {
        self.state().records.insert(info.record, info);
    }

    pub fn contains(&self, record: RecordRef) -> bool {
        self.state().records.contains_key(&record)
    }

    pub fn set_sort_order(&self, record: RecordRef, sort_order: i64) {
        if let Some(info) = self.state().records.get_mut(&record) {
            info.sort_order = Some(sort_order);
        }
    }

    /// Declare `transcript` as the Transcript owned by `clip`
    pub fn attach_transcript(&self, clip: RecordRef, transcript: RecordRef) {
        self.state().transcripts.insert(clip, transcript);
    }

    pub fn attach_note(&self, owner: RecordRef, note: RecordRef) {
        self.state().notes.entry(owner).or_default().push(note);
    }

    /// Designate `clip` as an example of `group : keyword`
    pub fn mark_keyword_example(&self, clip: RecordRef, group: &str, keyword: &str) {
        self.state()
            .keyword_examples
            .entry(clip)
            .or_default()
            .push((group.to_string(), keyword.to_string()));
    }

    /// Make every delete of `record` fail with `DeleteBlocked`
    pub fn block_delete(&self, record: RecordRef, reason: impl Into<String>) {
        self.state().blocked.insert(record, reason.into());
    }

    /// Current lock holder of `record`, if any
    pub fn lock_holder(&self, record: RecordRef) -> Option<String> {
        self.state().locks.get(&record).cloned()
    }

    /// Operations performed so far, in order
    pub fn journal(&self) -> Vec<String> {
        self.state().journal.clone()
    }

    pub fn clear_journal(&self) {
        self.state().journal.clear();
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn load(&self, record: RecordRef) -> Result<Option<RecordInfo>, StoreError> {
        Ok(self.state().records.get(&record).cloned())
    }

    async fn find_child(
        &self,
        record_type: RecordType,
        parent_id: i64,
        name: &str,
    ) -> Result<Option<RecordInfo>, StoreError> {
        let state = self.state();
        let mut matches = state.records.values().filter(|info| {
            info.record.record_type == record_type
                && info.parent_id == parent_id
                && names_match(&info.display_name, name)
        });
        Ok(matches.next().cloned())
    }

    async fn dependents(&self, record: RecordRef) -> Result<Dependents, StoreError> {
        let state = self.state();
        Ok(Dependents {
            notes: state.notes.get(&record).cloned().unwrap_or_default(),
            keyword_examples: state
                .keyword_examples
                .get(&record)
                .cloned()
                .unwrap_or_default(),
        })
    }

    async fn delete(&self, record: RecordRef, tx: &mut dyn Transaction) -> Result<(), StoreError> {
        let mut state = self.state();
        if !state.records.contains_key(&record) {
            return Err(StoreError::record_not_found(record));
        }
        if let Some(reason) = state.blocked.get(&record) {
            return Err(StoreError::delete_blocked(record, reason.clone()));
        }
        if let Some(holder) = state.locks.get(&record) {
            if holder != tx.holder() {
                return Err(StoreError::record_locked(record, holder.clone()));
            }
        }
        state.journal.push(format!("delete {}", record));
        tx.stage_delete(record);
        Ok(())
    }
}

impl LockBackend for InMemoryRecordStore {
    fn try_lock(&self, record: RecordRef, holder: &str) -> Result<bool, StoreError> {
        let mut state = self.state();
        if let Some(current) = state.locks.get(&record) {
            if current != holder {
                let current = current.clone();
                state.journal.push(format!("lock-failed {}", record));
                return Err(StoreError::record_locked(record, current));
            }
            return Ok(false);
        }
        state.locks.insert(record, holder.to_string());
        state.journal.push(format!("lock {}", record));
        Ok(true)
    }

    fn unlock(&self, record: RecordRef, holder: &str) {
        let mut state = self.state();
        if state.locks.get(&record).is_some_and(|h| h == holder) {
            state.locks.remove(&record);
            state.journal.push(format!("unlock {}", record));
        }
    }

    fn lockable_dependent(&self, record: RecordRef) -> Option<RecordRef> {
        self.state().transcripts.get(&record).copied()
    }

    fn begin(&self, holder: &str) -> Result<Box<dyn Transaction>, StoreError> {
        self.state().journal.push("begin".to_string());
        Ok(Box::new(MemoryTransaction {
            state: Arc::clone(&self.state),
            holder: holder.to_string(),
            staged: Vec::new(),
        }))
    }
}

struct MemoryTransaction {
    state: Arc<Mutex<StoreState>>,
    holder: String,
    staged: Vec<RecordRef>,
}

impl MemoryTransaction {
    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Transaction for MemoryTransaction {
    fn holder(&self) -> &str {
        &self.holder
    }

    fn stage_delete(&mut self, record: RecordRef) {
        self.staged.push(record);
    }

    fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let mut state = self.state();
        for record in &self.staged {
            state.forget(*record);
        }
        state.journal.push("commit".to_string());
        Ok(())
    }

    fn rollback(self: Box<Self>) {
        self.state().journal.push("rollback".to_string());
    }
}
