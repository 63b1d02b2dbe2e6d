//! Guarded Record Deletion
//!
//! Deleting a Clip runs under its cascading lock inside one transaction:
//!
//! 1. lock the Transcript, then the Clip, and open a transaction
//! 2. collect dependents (notes, keyword-example designations) into a
//!    [`DeletePlan`] the caller can show for confirmation
//! 3. on confirmation delete the notes, release the Transcript lock, delete the
//!    Transcript, delete the Clip, commit, unlock
//! 4. on refusal or failure roll back, then unlock
//!
//! Confirmation is an explicit step between [`RecordDeletion::plan`] and
//! [`PendingDelete::execute`]; nothing in here prompts anyone.

use std::sync::Arc;

use super::error::LockError;
use super::manager::RecordLockManager;
use super::session::EditSession;
use crate::db::RecordStore;
use crate::models::RecordRef;

/// Everything a delete will remove along with the record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletePlan {
    pub record: RecordRef,
    /// Locked dependent that is deleted with the record
    pub transcript: Option<RecordRef>,
    pub notes: Vec<RecordRef>,
    /// (group, keyword) pairs for which the record serves as an example
    pub keyword_examples: Vec<(String, String)>,
}

impl DeletePlan {
    /// Whether the user should be asked before going ahead
    pub fn needs_confirmation(&self) -> bool {
        !self.keyword_examples.is_empty()
    }
}

/// Entry point for guarded deletes on behalf of one replica
pub struct RecordDeletion {
    manager: RecordLockManager,
    store: Arc<dyn RecordStore>,
}

impl RecordDeletion {
    pub fn new(manager: RecordLockManager, store: Arc<dyn RecordStore>) -> Self {
        Self { manager, store }
    }

    /// Lock `record` and collect what deleting it would take along.
    ///
    /// The locks stay held until the returned `PendingDelete` is executed,
    /// cancelled or dropped.
    pub async fn plan(&self, record: RecordRef) -> Result<PendingDelete, LockError> {
        let session = EditSession::begin(&self.manager, record)?;
        // A failure here drops the session: rollback, then unlock
        let dependents = self.store.dependents(record).await?;
        let transcript = session.dependent();

        let plan = DeletePlan {
            record,
            transcript,
            notes: dependents.notes,
            keyword_examples: dependents.keyword_examples,
        };
        tracing::debug!(
            %record,
            notes = plan.notes.len(),
            keyword_examples = plan.keyword_examples.len(),
            "delete planned"
        );
        Ok(PendingDelete {
            store: Arc::clone(&self.store),
            session,
            plan,
        })
    }

    /// Plan and execute without a confirmation step
    pub async fn delete(&self, record: RecordRef) -> Result<DeletePlan, LockError> {
        self.plan(record).await?.execute().await
    }
}

/// A delete that holds its locks and waits for confirmation
pub struct PendingDelete {
    store: Arc<dyn RecordStore>,
    session: EditSession,
    plan: DeletePlan,
}

impl PendingDelete {
    pub fn plan(&self) -> &DeletePlan {
        &self.plan
    }

    /// Delete the record and its dependents, commit, then unlock
    pub async fn execute(mut self) -> Result<DeletePlan, LockError> {
        match self.run().await {
            Ok(()) => {
                self.session.commit()?;
                tracing::info!(record = %self.plan.record, "record deleted");
                Ok(self.plan)
            }
            Err(err) => {
                tracing::warn!(record = %self.plan.record, error = %err, "delete failed, rolling back");
                self.session.cancel();
                Err(err)
            }
        }
    }

    /// The user declined: roll back, then unlock
    pub fn cancel(self) {
        tracing::debug!(record = %self.plan.record, "delete cancelled");
        self.session.cancel();
    }

    async fn run(&mut self) -> Result<(), LockError> {
        for note in &self.plan.notes {
            self.store
                .delete(*note, self.session.transaction_mut()?)
                .await?;
        }

        if let Some(transcript) = self.plan.transcript {
            // A held lock would block deleting the transcript itself
            self.session.release_dependent();
            self.store
                .delete(transcript, self.session.transaction_mut()?)
                .await?;
        }

        self.store
            .delete(self.plan.record, self.session.transaction_mut()?)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryRecordStore;
    use crate::models::RecordInfo;

    fn seeded_store() -> InMemoryRecordStore {
        let store = InMemoryRecordStore::new();
        let clip = RecordRef::clip(5);
        store.insert(RecordInfo::new(clip, "Clip 1", 7));
        store.insert(RecordInfo::new(RecordRef::transcript(9), "Clip 1", 5));
        store.insert(RecordInfo::new(RecordRef::note(40), "Note", 5));
        store.attach_transcript(clip, RecordRef::transcript(9));
        store.attach_note(clip, RecordRef::note(40));
        store
    }

    fn deletion(store: &InMemoryRecordStore, holder: &str) -> RecordDeletion {
        let shared = Arc::new(store.clone());
        RecordDeletion::new(RecordLockManager::new(shared.clone(), holder), shared)
    }

    #[tokio::test]
    async fn test_delete_releases_transcript_lock_right_before_deleting_it() {
        let store = seeded_store();
        let plan = deletion(&store, "a").delete(RecordRef::clip(5)).await.unwrap();

        assert_eq!(plan.transcript, Some(RecordRef::transcript(9)));
        assert_eq!(plan.notes, vec![RecordRef::note(40)]);
        assert_eq!(
            store.journal(),
            vec![
                "lock Transcript#9",
                "lock Clip#5",
                "begin",
                "delete Note#40",
                "unlock Transcript#9",
                "delete Transcript#9",
                "delete Clip#5",
                "commit",
                "unlock Clip#5",
            ]
        );
        assert!(!store.contains(RecordRef::clip(5)));
        assert!(!store.contains(RecordRef::transcript(9)));
        assert!(!store.contains(RecordRef::note(40)));
    }

    #[tokio::test]
    async fn test_blocked_delete_rolls_back_before_unlocking() {
        let store = seeded_store();
        store.block_delete(RecordRef::clip(5), "referenced by a sequence");

        let err = deletion(&store, "a")
            .delete(RecordRef::clip(5))
            .await
            .unwrap_err();
        assert!(matches!(err, LockError::DeleteBlocked { .. }));

        let journal = store.journal();
        assert_eq!(
            &journal[journal.len() - 2..],
            &["rollback", "unlock Clip#5"]
        );
        assert!(store.contains(RecordRef::clip(5)));
        assert!(store.contains(RecordRef::note(40)));
        assert_eq!(store.lock_holder(RecordRef::clip(5)), None);
    }

    #[tokio::test]
    async fn test_plan_reports_keyword_examples_and_cancel_deletes_nothing() {
        let store = seeded_store();
        store.mark_keyword_example(RecordRef::clip(5), "Places", "Beach");

        let pending = deletion(&store, "a").plan(RecordRef::clip(5)).await.unwrap();
        assert!(pending.plan().needs_confirmation());
        assert_eq!(
            pending.plan().keyword_examples,
            vec![("Places".to_string(), "Beach".to_string())]
        );
        assert_eq!(store.lock_holder(RecordRef::clip(5)).as_deref(), Some("a"));

        pending.cancel();
        assert!(store.contains(RecordRef::clip(5)));
        assert_eq!(store.lock_holder(RecordRef::clip(5)), None);
        assert_eq!(store.lock_holder(RecordRef::transcript(9)), None);
    }

    #[tokio::test]
    async fn test_plan_fails_while_another_replica_holds_the_clip() {
        let store = seeded_store();
        let pending = deletion(&store, "a").plan(RecordRef::clip(5)).await.unwrap();

        let err = deletion(&store, "b")
            .plan(RecordRef::clip(5))
            .await
            .err()
            .unwrap();
        assert_eq!(err.holder(), Some("a"));
        drop(pending);
    }
}
