//! Record Lock Cascade Tests
//!
//! Replicas contend for the same backing records through one shared store.
//! A Clip always locks together with its Transcript, and a guarded delete
//! always finishes its transaction before letting go of any lock.

#[cfg(test)]
mod lock_cascade_tests {
    use std::sync::Arc;

    use anyhow::Result;
    use mediatree_core::db::{InMemoryRecordStore, LockBackend};
    use mediatree_core::locks::{EditSession, LockError, RecordDeletion, RecordLockManager};
    use mediatree_core::models::{Branch, NodeKind, NodePath, RecordInfo, RecordRef};
    use mediatree_core::services::{AddRequest, DeleteRequest, TreeError, TreeService};
    use mediatree_core::sync::{ChangePropagator, InProcessHub, MessageTransport};
    use mediatree_core::TreeSyncConfig;

    const CLIP: i64 = 5;
    const TRANSCRIPT: i64 = 9;

    /// Helper to create a store holding Clip #5 with Transcript #9 and one note
    fn create_store() -> InMemoryRecordStore {
        let store = InMemoryRecordStore::new();
        store.insert(RecordInfo::new(RecordRef::collection(7), "Project A", 0));
        store.insert(RecordInfo::new(RecordRef::clip(CLIP), "Clip 1", 7).with_sort_order(1));
        store.insert(RecordInfo::new(RecordRef::transcript(TRANSCRIPT), "Clip 1", CLIP));
        store.insert(RecordInfo::new(RecordRef::note(40), "Lighting", CLIP));
        store.attach_transcript(RecordRef::clip(CLIP), RecordRef::transcript(TRANSCRIPT));
        store.attach_note(RecordRef::clip(CLIP), RecordRef::note(40));
        store
    }

    fn manager(store: &InMemoryRecordStore, holder: &str) -> RecordLockManager {
        RecordLockManager::new(Arc::new(store.clone()), holder)
    }

    fn deletion(store: &InMemoryRecordStore, holder: &str) -> RecordDeletion {
        let shared = Arc::new(store.clone());
        RecordDeletion::new(RecordLockManager::new(shared.clone(), holder), shared)
    }

    #[test]
    fn test_clip_stays_unlocked_when_its_transcript_is_taken() {
        let store = create_store();
        let _transcript = manager(&store, "replica-b")
            .acquire(RecordRef::transcript(TRANSCRIPT))
            .unwrap();

        let err = manager(&store, "replica-a")
            .acquire(RecordRef::clip(CLIP))
            .unwrap_err();

        assert_eq!(
            err,
            LockError::record_locked(RecordRef::transcript(TRANSCRIPT), "replica-b")
        );
        assert_eq!(store.lock_holder(RecordRef::clip(CLIP)), None);
        assert_eq!(
            store.lock_holder(RecordRef::transcript(TRANSCRIPT)).as_deref(),
            Some("replica-b")
        );
    }

    #[test]
    fn test_failed_clip_lock_releases_the_transcript() {
        let store = create_store();
        store.try_lock(RecordRef::clip(CLIP), "replica-b").unwrap();

        let err = manager(&store, "replica-a")
            .acquire(RecordRef::clip(CLIP))
            .unwrap_err();

        assert_eq!(err.holder(), Some("replica-b"));
        assert_eq!(store.lock_holder(RecordRef::transcript(TRANSCRIPT)), None);
    }

    #[test]
    fn test_failed_clip_lock_keeps_a_transcript_session_open() {
        let store = create_store();
        let replica_a = manager(&store, "replica-a");
        let transcript_session =
            EditSession::begin(&replica_a, RecordRef::transcript(TRANSCRIPT)).unwrap();
        store.try_lock(RecordRef::clip(CLIP), "replica-b").unwrap();

        let err = replica_a.acquire(RecordRef::clip(CLIP)).unwrap_err();

        assert_eq!(err.holder(), Some("replica-b"));
        assert_eq!(
            store.lock_holder(RecordRef::transcript(TRANSCRIPT)).as_deref(),
            Some("replica-a")
        );
        transcript_session.commit().unwrap();
        assert_eq!(store.lock_holder(RecordRef::transcript(TRANSCRIPT)), None);
    }

    #[test]
    fn test_nested_clip_guard_leaves_outer_transcript_lock() {
        let store = create_store();
        let replica_a = manager(&store, "replica-a");
        let outer = replica_a.acquire(RecordRef::transcript(TRANSCRIPT)).unwrap();

        let nested = replica_a.acquire(RecordRef::clip(CLIP)).unwrap();
        assert_eq!(
            store.lock_holder(RecordRef::clip(CLIP)).as_deref(),
            Some("replica-a")
        );
        nested.release();

        assert_eq!(store.lock_holder(RecordRef::clip(CLIP)), None);
        assert_eq!(
            store.lock_holder(RecordRef::transcript(TRANSCRIPT)).as_deref(),
            Some("replica-a")
        );
        // Another replica is still kept out of the Clip through its Transcript
        assert!(manager(&store, "replica-b")
            .acquire(RecordRef::clip(CLIP))
            .is_err());

        drop(outer);
        assert_eq!(store.lock_holder(RecordRef::transcript(TRANSCRIPT)), None);
    }

    #[test]
    fn test_edit_session_serializes_replicas() {
        let store = create_store();
        let session = EditSession::begin(&manager(&store, "replica-a"), RecordRef::clip(CLIP))
            .unwrap();

        let err = EditSession::begin(&manager(&store, "replica-b"), RecordRef::clip(CLIP))
            .err()
            .unwrap();
        let surfaced = TreeError::from(err);
        assert_eq!(
            surfaced.to_string(),
            "Record Transcript#9 is locked by replica-a"
        );

        session.commit().unwrap();
        assert!(
            EditSession::begin(&manager(&store, "replica-b"), RecordRef::clip(CLIP)).is_ok()
        );
    }

    #[tokio::test]
    async fn test_guarded_delete_order() -> Result<()> {
        let store = create_store();
        deletion(&store, "replica-a")
            .delete(RecordRef::clip(CLIP))
            .await?;

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
        assert_eq!(store.lock_holder(RecordRef::clip(CLIP)), None);
        Ok(())
    }

    #[tokio::test]
    async fn test_blocked_delete_surfaces_reason_and_rolls_back() -> Result<()> {
        let store = create_store();
        store.block_delete(RecordRef::transcript(TRANSCRIPT), "transcript has open edits");

        let err = deletion(&store, "replica-a")
            .delete(RecordRef::clip(CLIP))
            .await
            .unwrap_err();
        let surfaced = TreeError::from(err);
        assert_eq!(
            surfaced,
            TreeError::DeleteBlocked {
                record: RecordRef::transcript(TRANSCRIPT),
                reason: "transcript has open edits".to_string(),
            }
        );

        let journal = store.journal();
        assert_eq!(&journal[journal.len() - 2..], &["rollback", "unlock Clip#5"]);
        assert!(store.contains(RecordRef::clip(CLIP)));
        assert!(store.contains(RecordRef::note(40)));
        assert_eq!(store.lock_holder(RecordRef::transcript(TRANSCRIPT)), None);
        Ok(())
    }

    #[tokio::test]
    async fn test_confirmed_delete_cleans_up_both_trees() -> Result<()> {
        let store = create_store();
        store.mark_keyword_example(RecordRef::clip(CLIP), "Places", "Beach");
        let hub = InProcessHub::new(64);
        let mut inbox_b = hub.subscribe();

        let mut replicas = Vec::new();
        for id in ["replica-a", "replica-b"] {
            let service = TreeService::new(
                Arc::new(store.clone()),
                TreeSyncConfig::default().with_replica_id(id),
            )?;
            replicas.push(ChangePropagator::new(Arc::new(service), Arc::new(hub.clone())));
        }
        let (a, b) = (&replicas[0], &replicas[1]);

        let clip_path = NodePath::new(Branch::Collections, ["Project A", "Clip 1"]);
        let example_path = NodePath::new(Branch::Keywords, ["Places", "Beach", "Clip 1"]);
        a.submit(
            AddRequest::new(clip_path.clone(), NodeKind::Clip, CLIP)
                .with_parent_record(7)
                .with_sort_order(1),
        )
        .await?;
        a.submit(AddRequest::new(example_path.clone(), NodeKind::KeywordExample, CLIP))
            .await?;
        b.service().set_active_view(Some(RecordRef::clip(CLIP)));

        // The plan asks for confirmation because the Clip is a keyword example
        let pending = deletion(&store, "replica-a")
            .plan(RecordRef::clip(CLIP))
            .await?;
        assert!(pending.plan().needs_confirmation());
        pending.execute().await?;

        a.submit(DeleteRequest::new(clip_path.clone(), NodeKind::Clip))
            .await?;
        assert_eq!(a.delete_keyword_examples(CLIP).await, 1);

        while let Ok(envelope) = inbox_b.try_recv() {
            b.receive(&envelope).await;
        }

        for replica in [a, b] {
            assert!(replica
                .service()
                .resolve(&clip_path, NodeKind::Clip, None)
                .await
                .is_err());
            assert!(replica
                .service()
                .resolve(&example_path, NodeKind::KeywordExample, Some(CLIP))
                .await
                .is_err());
        }
        // The Clip shown on B went away with it
        assert_eq!(b.service().active_view(), None);
        assert!(!store.contains(RecordRef::clip(CLIP)));
        Ok(())
    }
}
