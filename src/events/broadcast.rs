//! In-process change broadcaster

use super::{ChangeEvent, ChangeNotifier};
use crate::error::NotifyError;
use crate::store::{now_millis, ConfigEntry};
use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::debug;

/// Fans change events out to every live subscriber
#[derive(Clone)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<ChangeEvent>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribe to change events
    pub fn subscribe(&self) -> BroadcastStream<ChangeEvent> {
        BroadcastStream::new(self.sender.subscribe())
    }

    /// Raw receiver, for callers that poll with `recv`
    pub fn receiver(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[async_trait]
impl ChangeNotifier for BroadcastNotifier {
    async fn publish(&self, topic: &str, entry: &ConfigEntry) -> Result<(), NotifyError> {
        let event = ChangeEvent {
            topic: topic.to_string(),
            entry: entry.clone(),
            timestamp: now_millis(),
        };

        // A send error only means nobody is listening right now
        if self.sender.send(event).is_err() {
            debug!(topic, key = %entry.key, "No subscribers for change event");
        }
        Ok(())
    }
}

/// Notifier that drops every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

#[async_trait]
impl ChangeNotifier for NoopNotifier {
    async fn publish(&self, _topic: &str, _entry: &ConfigEntry) -> Result<(), NotifyError> {
        Ok(())
    }
}
