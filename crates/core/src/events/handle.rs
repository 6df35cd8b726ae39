use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use super::DraftEvent;

/// Envelope wrapping a domain event with its emission time.
#[derive(Debug, Clone)]
pub struct EventEnvelope {
    pub timestamp: DateTime<Utc>,
    pub event: DraftEvent,
}

/// Handle for emitting domain events.
///
/// Cheaply cloneable. Events go through a bounded channel to the [`EventWriter`](super::EventWriter).
#[derive(Clone)]
pub struct EventHandle {
    tx: mpsc::Sender<EventEnvelope>,
}

impl EventHandle {
    pub fn new(tx: mpsc::Sender<EventEnvelope>) -> Self {
        Self { tx }
    }

    /// Emit an event, waiting for channel capacity.
    ///
    /// A closed channel is logged, never returned to the caller.
    pub async fn emit(&self, event: DraftEvent) {
        let envelope = EventEnvelope {
            timestamp: Utc::now(),
            event,
        };
        if let Err(e) = self.tx.send(envelope).await {
            tracing::error!("Failed to emit draft event: {}", e);
        }
    }

    /// Try to emit without waiting. Returns false if the channel is full or closed.
    pub fn try_emit(&self, event: DraftEvent) -> bool {
        let envelope = EventEnvelope {
            timestamp: Utc::now(),
            event,
        };
        match self.tx.try_send(envelope) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Failed to emit draft event: {}", e);
                false
            }
        }
    }
}
