//! Draft store wrapper with switchable write failures.

use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Utc};

use crate::draft::{
    CastawayPoolEntry, DraftFilter, DraftPick, DraftReader, DraftSession, DraftStatus, DraftStore,
    ParticipantRanking, PickCommit, SessionStart, SqliteDraftStore, StoreError,
};

/// An in-memory [`SqliteDraftStore`] whose pick commits and status
/// transitions can be made to fail.
///
/// A failed write returns a database error before touching the inner store,
/// the same as a transaction that rolled back.
///
/// # Example
///
/// ```rust,ignore
/// let store = FailingDraftStore::new()?;
/// store.fail_next_commits(2);
/// // the next two commit_pick calls fail, then writes go through again
/// ```
pub struct FailingDraftStore {
    inner: SqliteDraftStore,
    /// Number of upcoming commits that will fail.
    failing_commits: AtomicUsize,
    failing_transitions: AtomicUsize,
}

impl FailingDraftStore {
    pub fn new() -> Result<Self, StoreError> {
        Ok(Self {
            inner: SqliteDraftStore::in_memory()?,
            failing_commits: AtomicUsize::new(0),
            failing_transitions: AtomicUsize::new(0),
        })
    }

    pub fn fail_next_commits(&self, count: usize) {
        self.failing_commits.store(count, Ordering::SeqCst);
    }

    pub fn fail_next_transitions(&self, count: usize) {
        self.failing_transitions.store(count, Ordering::SeqCst);
    }

    fn take_failure(counter: &AtomicUsize) -> Result<(), StoreError> {
        match counter.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1)) {
            Ok(_) => Err(StoreError::Database("injected write failure".to_string())),
            Err(_) => Ok(()),
        }
    }
}

impl DraftReader for FailingDraftStore {
    fn get_session(&self, id: &str) -> Result<Option<DraftSession>, StoreError> {
        self.inner.get_session(id)
    }

    fn list_sessions(&self, filter: &DraftFilter) -> Result<Vec<DraftSession>, StoreError> {
        self.inner.list_sessions(filter)
    }

    fn count_sessions(&self, filter: &DraftFilter) -> Result<i64, StoreError> {
        self.inner.count_sessions(filter)
    }

    fn pool(&self, session_id: &str) -> Result<Vec<CastawayPoolEntry>, StoreError> {
        self.inner.pool(session_id)
    }

    fn ledger(&self, session_id: &str) -> Result<Vec<DraftPick>, StoreError> {
        self.inner.ledger(session_id)
    }

    fn ranking(
        &self,
        session_id: &str,
        participant_id: &str,
    ) -> Result<Option<ParticipantRanking>, StoreError> {
        self.inner.ranking(session_id, participant_id)
    }
}

impl DraftStore for FailingDraftStore {
    fn create_session(
        &self,
        id: &str,
        castaway_ids: &[String],
        now: DateTime<Utc>,
    ) -> Result<DraftSession, StoreError> {
        self.inner.create_session(id, castaway_ids, now)
    }

    fn start_session(&self, start: &SessionStart) -> Result<DraftSession, StoreError> {
        self.inner.start_session(start)
    }

    fn transition(
        &self,
        id: &str,
        allowed_from: &[DraftStatus],
        to: DraftStatus,
        deadline: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<DraftSession, StoreError> {
        Self::take_failure(&self.failing_transitions)?;
        self.inner.transition(id, allowed_from, to, deadline, now)
    }

    fn put_ranking(
        &self,
        session_id: &str,
        ranking: &ParticipantRanking,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.inner.put_ranking(session_id, ranking, now)
    }

    fn commit_pick(&self, commit: &PickCommit) -> Result<DraftSession, StoreError> {
        Self::take_failure(&self.failing_commits)?;
        self.inner.commit_pick(commit)
    }
}
