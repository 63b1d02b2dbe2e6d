//! Message Transport
//!
//! Delivery is fire-and-forget with no acknowledgement or retry. The only
//! ordering a transport has to provide is per sender: envelopes from one replica
//! arrive in the order they were sent.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

use super::error::ProtocolError;
use super::message::MessageEnvelope;

/// Broadcast channel between replicas
#[async_trait]
pub trait MessageTransport: Send + Sync {
    /// Broadcast an envelope to every subscribed replica, including the sender
    async fn send(&self, envelope: MessageEnvelope) -> Result<(), ProtocolError>;

    /// Receive every envelope sent after this call
    fn subscribe(&self) -> broadcast::Receiver<MessageEnvelope>;
}

/// In-process hub connecting replicas that live in the same process
///
/// All clones share one broadcast channel, so each replica takes a clone and
/// subscribes to it.
#[derive(Clone, Debug)]
pub struct InProcessHub {
    sender: broadcast::Sender<MessageEnvelope>,
    drop_next: Arc<AtomicBool>,
}

impl InProcessHub {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            drop_next: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Silently lose the next envelope sent through the hub.
    /// Used to exercise dropped-message detection.
    pub fn drop_next_message(&self) {
        self.drop_next.store(true, Ordering::SeqCst);
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[async_trait]
impl MessageTransport for InProcessHub {
    async fn send(&self, envelope: MessageEnvelope) -> Result<(), ProtocolError> {
        if self
            .drop_next
            .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            tracing::debug!(sender = %envelope.sender, seq = envelope.seq, "hub dropped message");
            return Ok(());
        }
        // No subscribers just means nobody is listening yet
        let _ = self.sender.send(envelope);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<MessageEnvelope> {
        self.sender.subscribe()
    }
}
