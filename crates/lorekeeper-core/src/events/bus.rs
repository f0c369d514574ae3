//! Event bus using tokio broadcast channel
//!
//! Slow subscribers miss events rather than blocking the lorebook.

use crate::events::LorebookEvent;
use tokio::sync::broadcast;

const DEFAULT_CAPACITY: usize = 256;

/// Fire-and-forget bus for lorebook events.
///
/// With no subscribers, emitted events are dropped.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<LorebookEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events emitted after this call.
    pub fn subscribe(&self) -> EventSubscriber {
        EventSubscriber {
            receiver: self.sender.subscribe(),
        }
    }

    /// Emit an event to all subscribers. Never blocks, never fails.
    pub fn emit(&self, event: LorebookEvent) {
        tracing::trace!(event = event.event_type(), "Lorebook event");
        let _ = self.sender.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Subscriber to the event bus.
pub struct EventSubscriber {
    receiver: broadcast::Receiver<LorebookEvent>,
}

impl EventSubscriber {
    /// Receive the next event; `None` once the bus is dropped.
    ///
    /// A lagging subscriber skips what it missed and keeps going.
    pub async fn recv(&mut self) -> Option<LorebookEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("Lorebook event subscriber lagged by {} events", n);
                    continue;
                }
            }
        }
    }

    /// Try to receive an event without blocking.
    pub fn try_recv(&mut self) -> Option<LorebookEvent> {
        self.receiver.try_recv().ok()
    }
}
