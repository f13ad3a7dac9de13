use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::broadcast;

use super::events::{BoardEvent, ChannelKey, EventPublisher, PublishError};

const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// In-process fan-out hub keyed by logical channel.
///
/// Delivery is at-most-once and fire-and-forget: there is no queue, retry, or
/// persistence behind a channel. A subscriber that lags past the channel
/// capacity loses the oldest events; a channel with no subscribers drops the
/// event entirely.
pub struct NotificationHub {
    capacity: usize,
    channels: Mutex<HashMap<String, broadcast::Sender<BoardEvent>>>,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            channels: Mutex::new(HashMap::new()),
        }
    }

    /// Join a logical channel. The channel is created on first subscription
    /// and lives for the hub's lifetime.
    pub fn subscribe(&self, key: &ChannelKey) -> broadcast::Receiver<BoardEvent> {
        let mut channels = self.channels.lock().expect("channel registry poisoned");
        channels
            .entry(key.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new()
    }
}

impl EventPublisher for NotificationHub {
    fn publish(&self, event: BoardEvent) -> Result<(), PublishError> {
        let channels = self
            .channels
            .lock()
            .map_err(|_| PublishError::Transport("channel registry poisoned".to_string()))?;
        if let Some(sender) = channels.get(&event.channel().to_string()) {
            // A send error means no receiver is currently connected; the
            // event is simply missed.
            let _ = sender.send(event);
        }
        Ok(())
    }
}
