//! Tokio broadcast-channel transport
//!
//! Connects instances running as separate tasks on the same runtime. Every
//! endpoint tags outgoing messages with its own origin id and filters its own
//! messages back out on receive, so a sender never sees its own broadcasts.
//! Lagged receivers drop the missed messages and carry on — best-effort
//! delivery, exactly as the transport contract allows.

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::transport::{MessageHandler, SyncTransport};
use crate::types::{SyncMessage, SYNC_CHANNEL_NAME};

/// Message envelope carried on the channel
#[derive(Debug, Clone)]
pub struct SyncEnvelope {
    /// Topic the message belongs to
    pub channel: &'static str,
    /// Sending endpoint
    pub origin: Uuid,
    /// The cache mutation
    pub message: SyncMessage,
}

/// One endpoint on a shared `tokio::sync::broadcast` channel
///
/// Must be used from within a tokio runtime: `set_handler` spawns the
/// receive loop as a background task. Dropping the transport stops the loop.
pub struct ChannelTransport {
    sender: broadcast::Sender<SyncEnvelope>,
    origin: Uuid,
    receiver_task: Mutex<Option<JoinHandle<()>>>,
}

impl ChannelTransport {
    /// Attach a new endpoint to an existing channel
    pub fn new(sender: broadcast::Sender<SyncEnvelope>) -> Self {
        Self {
            sender,
            origin: Uuid::new_v4(),
            receiver_task: Mutex::new(None),
        }
    }

    /// Create a fresh channel and its first endpoint
    pub fn create(capacity: usize) -> (Self, broadcast::Sender<SyncEnvelope>) {
        let (sender, _) = broadcast::channel(capacity);
        (Self::new(sender.clone()), sender)
    }

    /// This endpoint's origin id
    pub fn origin(&self) -> Uuid {
        self.origin
    }
}

impl SyncTransport for ChannelTransport {
    fn broadcast(&self, message: &SyncMessage) {
        let envelope = SyncEnvelope {
            channel: SYNC_CHANNEL_NAME,
            origin: self.origin,
            message: message.clone(),
        };
        // A send error only means no peer is currently listening.
        if self.sender.send(envelope).is_err() {
            tracing::trace!("Sync broadcast dropped: no active peers");
        }
    }

    fn set_handler(&self, handler: MessageHandler) {
        let mut receiver = self.sender.subscribe();
        let origin = self.origin;

        let task = tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(envelope) => {
                        if envelope.origin == origin || envelope.channel != SYNC_CHANNEL_NAME {
                            continue;
                        }
                        handler(envelope.message);
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        tracing::debug!(missed, "Sync receiver lagged; messages dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        if let Some(previous) = self.receiver_task.lock().replace(task) {
            previous.abort();
        }
    }
}

impl Drop for ChannelTransport {
    fn drop(&mut self) {
        if let Some(task) = self.receiver_task.lock().take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn test_peer_receives_broadcast() {
        let (a, sender) = ChannelTransport::create(16);
        let b = ChannelTransport::new(sender);

        let received = Arc::new(Mutex::new(None));
        let sink = received.clone();
        b.set_handler(Arc::new(move |msg| {
            *sink.lock() = Some(msg);
        }));

        let sent = SyncMessage::set("k", json!(7), Duration::from_secs(5));
        a.broadcast(&sent);
        settle().await;

        assert_eq!(received.lock().clone(), Some(sent));
    }

    #[tokio::test]
    async fn test_sender_filters_own_messages() {
        let (a, _sender) = ChannelTransport::create(16);

        let count = Arc::new(AtomicUsize::new(0));
        let sink = count.clone();
        a.set_handler(Arc::new(move |_| {
            sink.fetch_add(1, Ordering::SeqCst);
        }));

        a.broadcast(&SyncMessage::invalidate("k"));
        settle().await;

        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_broadcast_without_listeners_is_harmless() {
        let (a, sender) = ChannelTransport::create(16);
        drop(sender);
        a.broadcast(&SyncMessage::invalidate_all());
    }
}
