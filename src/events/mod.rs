//! Change Notification Module
//!
//! Publish/subscribe plumbing for `config.changed` events.

pub mod broadcast;

pub use broadcast::{BroadcastNotifier, NoopNotifier};

use crate::error::NotifyError;
use crate::store::ConfigEntry;
use async_trait::async_trait;
use serde::Serialize;

/// Topic published whenever a write changes a stored value
pub const CONFIG_CHANGED_TOPIC: &str = "config.changed";

/// A published change
#[derive(Debug, Clone, Serialize)]
pub struct ChangeEvent {
    pub topic: String,
    pub entry: ConfigEntry,
    /// Milliseconds since the Unix epoch
    pub timestamp: u64,
}

/// Fire-and-forget publisher for change events
#[async_trait]
pub trait ChangeNotifier: Send + Sync {
    async fn publish(&self, topic: &str, entry: &ConfigEntry) -> Result<(), NotifyError>;
}
