//! Shared deadline heap.
//!
//! Entries are never removed when a turn ends early. A pick, pause or abort
//! leaves the old entry in place and the scheduler discards it when it pops,
//! after checking it against the stored session.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tokio::sync::Notify;

use super::DeadlineEntry;
use crate::metrics::PENDING_DEADLINES;

/// Min-heap of turn deadlines across all sessions, with a wake signal.
#[derive(Debug, Default)]
pub struct DeadlineQueue {
    heap: Mutex<BinaryHeap<Reverse<DeadlineEntry>>>,
    wake: Notify,
}

impl DeadlineQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn heap(&self) -> MutexGuard<'_, BinaryHeap<Reverse<DeadlineEntry>>> {
        self.heap.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a deadline. Wakes the scheduler if this is now the earliest one.
    pub fn push(&self, entry: DeadlineEntry) {
        let earliest = {
            let mut heap = self.heap();
            let earliest = heap
                .peek()
                .is_none_or(|Reverse(head)| entry.deadline < head.deadline);
            heap.push(Reverse(entry));
            PENDING_DEADLINES.set(heap.len() as i64);
            earliest
        };
        if earliest {
            self.wake.notify_one();
        }
    }

    /// Put an entry back without waking the scheduler.
    pub(crate) fn requeue(&self, entry: DeadlineEntry) {
        let mut heap = self.heap();
        heap.push(Reverse(entry));
        PENDING_DEADLINES.set(heap.len() as i64);
    }

    /// Remove and return every entry due at `now`, earliest first.
    pub fn pop_due(&self, now: DateTime<Utc>) -> Vec<DeadlineEntry> {
        let mut heap = self.heap();
        let mut due = Vec::new();
        while heap
            .peek()
            .is_some_and(|Reverse(head)| head.deadline <= now)
        {
            if let Some(Reverse(entry)) = heap.pop() {
                due.push(entry);
            }
        }
        PENDING_DEADLINES.set(heap.len() as i64);
        due
    }

    /// Earliest registered deadline.
    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        self.heap().peek().map(|Reverse(head)| head.deadline)
    }

    pub fn len(&self) -> usize {
        self.heap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap().is_empty()
    }

    /// Drop every in-memory entry. Stored deadlines are untouched.
    pub fn clear(&self) {
        let mut heap = self.heap();
        heap.clear();
        PENDING_DEADLINES.set(0);
    }

    /// Wait until a push lowers the earliest deadline.
    pub async fn notified(&self) {
        self.wake.notified().await;
    }
}
