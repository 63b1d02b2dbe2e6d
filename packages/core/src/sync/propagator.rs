//! Change Propagator
//!
//! Glue between one replica's [`TreeService`] and the message transport.
//!
//! Outbound, a change is applied locally first and only broadcast once it has
//! fully succeeded, so an aborted or failing change never reaches peers.
//! Inbound, each peer envelope is decoded and replayed through the same
//! Structural Mutation API call the sender made.
//!
//! Remote failures never propagate out of [`ChangePropagator::receive`]:
//!
//! - a Delete or Move whose source is already gone is a duplicate or late
//!   message and is skipped quietly
//! - any other failure, and any per-sender sequence gap, is a desync: it is
//!   logged under the `mediatree_core::sync` target and raised as
//!   [`TreeEvent::DesyncDetected`]; the local tree is left as-is until an
//!   operator triggers [`TreeService::refresh_branch`]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use super::error::ProtocolError;
use super::message::MessageEnvelope;
use super::transport::MessageTransport;
use crate::services::{ChangeOutcome, StructuralChange, TreeError, TreeEvent, TreeService};

const SYNC_TARGET: &str = "mediatree_core::sync";

/// What happened to an inbound envelope
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    /// Replayed against the local tree
    Applied(ChangeOutcome),
    /// Own or already-seen message
    Ignored,
    /// Decoded but could not be applied; the tree is unchanged
    Skipped(TreeError),
    /// Body could not be decoded
    Rejected(ProtocolError),
}

/// Broadcasts local changes and replays peers' changes for one replica
pub struct ChangePropagator {
    service: Arc<TreeService>,
    transport: Arc<dyn MessageTransport>,
    next_seq: AtomicU64,
    last_seen: Mutex<HashMap<String, u64>>,
}

impl ChangePropagator {
    pub fn new(service: Arc<TreeService>, transport: Arc<dyn MessageTransport>) -> Self {
        Self {
            service,
            transport,
            next_seq: AtomicU64::new(1),
            last_seen: Mutex::new(HashMap::new()),
        }
    }

    pub fn service(&self) -> &Arc<TreeService> {
        &self.service
    }

    fn replica_id(&self) -> &str {
        self.service.replica_id()
    }

    /// Apply a change locally, then broadcast it.
    ///
    /// Nothing is sent when the local change fails. A transport failure after
    /// a successful local change is logged, not returned: delivery is
    /// best-effort and the local tree already reflects the change.
    pub async fn submit(
        &self,
        change: impl Into<StructuralChange>,
    ) -> Result<ChangeOutcome, TreeError> {
        let change = change.into();
        let outcome = self.service.apply(&change).await?;
        self.broadcast(&change).await;
        Ok(outcome)
    }

    /// Remove every KeywordExample node of a deleted Clip and tell peers about
    /// each removal. Returns how many were removed.
    pub async fn delete_keyword_examples(&self, clip_id: i64) -> usize {
        let removed = self.service.remove_keyword_examples(clip_id).await;
        for req in &removed {
            self.broadcast(&StructuralChange::Delete(req.clone())).await;
        }
        removed.len()
    }

    async fn broadcast(&self, change: &StructuralChange) {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let envelope = MessageEnvelope::for_change(self.replica_id(), seq, change);
        tracing::debug!(target: SYNC_TARGET, seq, body = %envelope.body, "broadcasting change");
        if let Err(err) = self.transport.send(envelope).await {
            tracing::error!(target: SYNC_TARGET, seq, error = %err, "failed to broadcast change");
        }
    }

    /// Replay a peer's envelope against the local tree
    pub async fn receive(&self, envelope: &MessageEnvelope) -> ApplyOutcome {
        if envelope.sender == self.replica_id() {
            return ApplyOutcome::Ignored;
        }

        match self.check_sequence(&envelope.sender, envelope.seq) {
            SequenceCheck::Stale => {
                tracing::debug!(target: SYNC_TARGET, sender = %envelope.sender, seq = envelope.seq, "ignoring replayed message");
                return ApplyOutcome::Ignored;
            }
            SequenceCheck::Gap { missed } => {
                self.report_desync(
                    &envelope.sender,
                    format!("missed {} message(s) before seq {}", missed, envelope.seq),
                );
            }
            SequenceCheck::InOrder => {}
        }

        let change = match envelope.decode() {
            Ok(change) => change,
            Err(err) => {
                tracing::warn!(target: SYNC_TARGET, sender = %envelope.sender, error = %err, "rejecting malformed message");
                return ApplyOutcome::Rejected(err);
            }
        };

        match self.service.apply(&change).await {
            Ok(outcome) => {
                tracing::debug!(target: SYNC_TARGET, sender = %envelope.sender, ?outcome, "applied remote change");
                ApplyOutcome::Applied(outcome)
            }
            Err(err) if source_already_gone(&change, &err) => {
                tracing::debug!(target: SYNC_TARGET, sender = %envelope.sender, error = %err, "source already gone, skipping");
                ApplyOutcome::Skipped(err)
            }
            Err(err) => {
                let detail = format!("{}: {}", envelope.body, err);
                self.report_desync(&envelope.sender, detail.clone());
                if err.is_not_found() {
                    ApplyOutcome::Skipped(TreeError::protocol_desync(&envelope.sender, detail))
                } else {
                    ApplyOutcome::Skipped(err)
                }
            }
        }
    }

    fn check_sequence(&self, sender: &str, seq: u64) -> SequenceCheck {
        let mut last_seen = self.last_seen.lock().unwrap_or_else(PoisonError::into_inner);
        let check = match last_seen.get(sender) {
            Some(&last) if seq <= last => return SequenceCheck::Stale,
            Some(&last) if seq > last + 1 => SequenceCheck::Gap {
                missed: seq - last - 1,
            },
            // First contact: a replica that joined late has not missed anything
            _ => SequenceCheck::InOrder,
        };
        last_seen.insert(sender.to_string(), seq);
        check
    }

    fn report_desync(&self, sender: &str, detail: String) {
        tracing::warn!(target: SYNC_TARGET, %sender, %detail, "tree desync detected");
        self.service.emit_event(TreeEvent::DesyncDetected {
            sender: sender.to_string(),
            detail,
        });
    }

    /// Receive and replay envelopes until the transport closes.
    ///
    /// The subscription is taken before this returns, so nothing sent
    /// afterwards is missed.
    pub fn start(self: Arc<Self>) -> JoinHandle<anyhow::Result<()>> {
        let mut receiver = self.transport.subscribe();
        tokio::spawn(async move {
            tracing::info!(target: SYNC_TARGET, replica = %self.replica_id(), "change propagation started");
            loop {
                match receiver.recv().await {
                    Ok(envelope) => {
                        self.receive(&envelope).await;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        self.report_desync(
                            "transport",
                            format!("receiver lagged, {} message(s) lost", skipped),
                        );
                    }
                    Err(RecvError::Closed) => {
                        tracing::error!(target: SYNC_TARGET, replica = %self.replica_id(), "transport closed");
                        return Err(anyhow::anyhow!(ProtocolError::transport("transport closed")));
                    }
                }
            }
        })
    }
}

enum SequenceCheck {
    InOrder,
    Stale,
    Gap { missed: u64 },
}

/// A Delete or Move whose own source no longer resolves is a duplicate or
/// late message. A missing move destination is not.
fn source_already_gone(change: &StructuralChange, err: &TreeError) -> bool {
    let TreeError::NotFound(missing) = err else {
        return false;
    };
    matches!(
        change,
        StructuralChange::Delete(_) | StructuralChange::Move(_)
    ) && missing.path == *change.path()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TreeSyncConfig;
    use crate::db::InMemoryRecordStore;
    use crate::models::{Branch, NodeKind, NodePath};
    use crate::services::{AddRequest, DeleteRequest, RenameRequest};
    use crate::sync::{encode, InProcessHub};

    fn propagator(replica: &str, hub: &InProcessHub) -> ChangePropagator {
        let service = TreeService::new(
            Arc::new(InMemoryRecordStore::new()),
            TreeSyncConfig::default().with_replica_id(replica),
        )
        .unwrap();
        ChangePropagator::new(Arc::new(service), Arc::new(hub.clone()))
    }

    fn clip_path() -> NodePath {
        NodePath::new(Branch::Collections, ["Project A", "Clip 1"])
    }

    fn add_clip() -> StructuralChange {
        AddRequest::new(clip_path(), NodeKind::Clip, 101)
            .with_parent_record(7)
            .with_sort_order(1)
            .into()
    }

    #[tokio::test]
    async fn test_submit_sends_only_after_local_success() {
        let hub = InProcessHub::new(16);
        let mut rx = hub.subscribe();
        let local = propagator("a", &hub);

        let err = local
            .submit(DeleteRequest::new(clip_path(), NodeKind::Clip))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(rx.try_recv().is_err());

        local.submit(add_clip()).await.unwrap();
        let envelope = rx.try_recv().unwrap();
        assert_eq!(envelope.sender, "a");
        assert_eq!(envelope.seq, 1);
        assert_eq!(envelope.body, encode(&add_clip()));
    }

    #[tokio::test]
    async fn test_own_and_replayed_messages_are_ignored() {
        let hub = InProcessHub::new(16);
        let remote = propagator("b", &hub);

        let own = MessageEnvelope::for_change("b", 1, &add_clip());
        assert_eq!(remote.receive(&own).await, ApplyOutcome::Ignored);

        let peer = MessageEnvelope::for_change("a", 1, &add_clip());
        assert!(matches!(remote.receive(&peer).await, ApplyOutcome::Applied(_)));
        assert_eq!(remote.receive(&peer).await, ApplyOutcome::Ignored);
    }

    #[tokio::test]
    async fn test_duplicate_delete_is_skipped_without_desync() {
        let hub = InProcessHub::new(16);
        let remote = propagator("b", &hub);
        let mut events = remote.service().subscribe_to_events();

        let delete: StructuralChange = DeleteRequest::new(clip_path(), NodeKind::Clip).into();
        let outcome = remote
            .receive(&MessageEnvelope::for_change("a", 1, &delete))
            .await;

        match outcome {
            ApplyOutcome::Skipped(err) => assert!(err.is_not_found()),
            other => panic!("expected a skip, got {:?}", other),
        }
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unresolvable_rename_raises_desync() {
        let hub = InProcessHub::new(16);
        let remote = propagator("b", &hub);
        let mut events = remote.service().subscribe_to_events();

        let rename: StructuralChange =
            RenameRequest::new(clip_path(), NodeKind::Clip, "Clip 2").into();
        let outcome = remote
            .receive(&MessageEnvelope::for_change("a", 1, &rename))
            .await;

        assert!(matches!(
            outcome,
            ApplyOutcome::Skipped(TreeError::ProtocolDesync { .. })
        ));
        match events.try_recv().unwrap() {
            TreeEvent::DesyncDetected { sender, .. } => assert_eq!(sender, "a"),
            other => panic!("expected desync, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_rejected() {
        let hub = InProcessHub::new(16);
        let remote = propagator("b", &hub);

        let outcome = remote
            .receive(&MessageEnvelope::new("a", 1, "EXPLODE\tClipNode\tCollections\tx"))
            .await;
        assert_eq!(
            outcome,
            ApplyOutcome::Rejected(ProtocolError::unknown_opcode("EXPLODE"))
        );
    }

    #[tokio::test]
    async fn test_sequence_gap_raises_desync_and_still_applies() {
        let hub = InProcessHub::new(16);
        let remote = propagator("b", &hub);
        let mut events = remote.service().subscribe_to_events();

        let first: StructuralChange =
            AddRequest::new(NodePath::new(Branch::Collections, ["A"]), NodeKind::Collection, 1)
                .into();
        remote
            .receive(&MessageEnvelope::for_change("a", 1, &first))
            .await;
        let _ = events.try_recv();

        let outcome = remote
            .receive(&MessageEnvelope::for_change("a", 4, &add_clip()))
            .await;
        assert!(matches!(outcome, ApplyOutcome::Applied(_)));
        match events.try_recv().unwrap() {
            TreeEvent::DesyncDetected { detail, .. } => {
                assert_eq!(detail, "missed 2 message(s) before seq 4")
            }
            other => panic!("expected desync, got {:?}", other),
        }
    }
}
