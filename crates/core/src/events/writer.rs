use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::{DraftEvent, EventEnvelope, EventHandle, EventRecord, EventStore};
use crate::metrics::{EVENTS_DROPPED, EVENTS_WRITTEN, EVENT_PICK_GAPS};

/// Totals reported when the writer exits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriterSummary {
    pub written: u64,
    pub dropped: u64,
    /// Stored pick events that did not follow the previous stored pick of their draft.
    pub pick_gaps: u64,
}

/// Background task that drains emitted events into an [`EventStore`].
///
/// Tracks the next expected pick index per draft so a hole in the stored
/// pick trail is logged when it appears. Drafts started before the writer
/// begin tracking at their first stored pick.
pub struct EventWriter {
    rx: mpsc::Receiver<EventEnvelope>,
    store: Arc<dyn EventStore>,
    next_pick: HashMap<String, u32>,
    summary: WriterSummary,
}

impl EventWriter {
    pub fn new(rx: mpsc::Receiver<EventEnvelope>, store: Arc<dyn EventStore>) -> Self {
        Self {
            rx,
            store,
            next_pick: HashMap::new(),
            summary: WriterSummary::default(),
        }
    }

    /// Consume events until every handle has been dropped.
    pub async fn run(mut self) -> WriterSummary {
        info!("Event writer started");

        while let Some(envelope) = self.rx.recv().await {
            self.write(envelope);
        }

        info!(
            written = self.summary.written,
            dropped = self.summary.dropped,
            pick_gaps = self.summary.pick_gaps,
            "Event writer shutting down"
        );
        self.summary
    }

    fn write(&mut self, envelope: EventEnvelope) {
        let event_type = envelope.event.event_type();
        let record = EventRecord {
            id: 0,
            timestamp: envelope.timestamp,
            event_type: event_type.to_string(),
            session_id: envelope.event.session_id().map(String::from),
            participant_id: envelope.event.participant_id().map(String::from),
            data: envelope.event,
        };

        match self.store.insert(&record) {
            Ok(id) => {
                self.summary.written += 1;
                EVENTS_WRITTEN.with_label_values(&[event_type]).inc();
                debug!(id, event_type, session_id = ?record.session_id, "Stored draft event");
                self.track_pick_trail(&record.data);
            }
            Err(e) => {
                self.summary.dropped += 1;
                EVENTS_DROPPED.with_label_values(&[event_type]).inc();
                error!(
                    event_type,
                    session_id = ?record.session_id,
                    "Failed to write draft event: {}",
                    e
                );
            }
        }
    }

    fn track_pick_trail(&mut self, event: &DraftEvent) {
        match event {
            DraftEvent::DraftStarted { session_id, .. } => {
                self.next_pick.insert(session_id.clone(), 0);
            }
            DraftEvent::PickMade {
                session_id,
                pick_index,
                ..
            } => {
                if let Some(&expected) = self.next_pick.get(session_id) {
                    if *pick_index != expected {
                        self.summary.pick_gaps += 1;
                        EVENT_PICK_GAPS.inc();
                        warn!(
                            session_id = %session_id,
                            expected,
                            pick_index,
                            "Stored pick trail skips ahead"
                        );
                    }
                }
                self.next_pick.insert(session_id.clone(), pick_index + 1);
            }
            DraftEvent::DraftCompleted { session_id, .. }
            | DraftEvent::DraftAborted { session_id, .. } => {
                self.next_pick.remove(session_id);
            }
            _ => {}
        }
    }
}

/// Create the event pipeline.
///
/// Returns the handle to clone into emitters and the writer to spawn with
/// `tokio::spawn(writer.run())`.
pub fn create_event_system(
    store: Arc<dyn EventStore>,
    buffer_size: usize,
) -> (EventHandle, EventWriter) {
    let (tx, rx) = mpsc::channel(buffer_size);
    (EventHandle::new(tx), EventWriter::new(rx, store))
}
