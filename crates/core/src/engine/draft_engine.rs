//! The draft engine: lifecycle, pick validation and the atomic commit path.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, error, info, warn};

use super::types::{CreateDraftRequest, PickRequest, RecoveryReport, StartDraftRequest};
use crate::clock::Clock;
use crate::config::{DraftConfig, OddParticipantPolicy};
use crate::draft::{
    replay, AutoPickSelector, CastawayPoolEntry, ConcurrencyError, DraftError, DraftFilter,
    DraftPick, DraftSession, DraftSnapshot, DraftStatus, DraftStore, ParticipantRanking,
    ParticipantRoster, PersistenceError, PickCommit, PickMethod, ReplayedDraft, SchedulerError,
    SessionStart, SnakeOrder, StoreError, ValidationError,
};
use crate::events::{DraftEvent, EventHandle};
use crate::metrics::{
    COMMIT_DURATION, DRAFTS_COMPLETED, DRAFTS_STALLED, PICKS_COMMITTED, PICKS_REJECTED,
};
use crate::scheduler::{DeadlineEntry, DeadlineQueue};

/// Sessions fetched per page during recovery.
const RECOVERY_PAGE_SIZE: i64 = 100;

/// Owns every mutation of draft state.
///
/// Manual picks, forced auto-picks and lifecycle changes all go through here.
/// Each pick is validated against a fresh read of the session and then handed
/// to [`DraftStore::commit_pick`], which re-checks the pick index inside its
/// transaction. Of two racing commits for the same index, exactly one wins and
/// the other fails with a stale-version error.
pub struct DraftEngine {
    store: Arc<dyn DraftStore>,
    events: EventHandle,
    clock: Arc<dyn Clock>,
    deadlines: Arc<DeadlineQueue>,
    config: DraftConfig,
    selector: AutoPickSelector,
}

impl DraftEngine {
    pub fn new(
        store: Arc<dyn DraftStore>,
        events: EventHandle,
        clock: Arc<dyn Clock>,
        config: DraftConfig,
    ) -> Self {
        Self {
            store,
            events,
            clock,
            deadlines: Arc::new(DeadlineQueue::new()),
            config,
            selector: AutoPickSelector,
        }
    }

    /// Deadline heap fed by this engine and drained by the scheduler.
    pub fn deadlines(&self) -> Arc<DeadlineQueue> {
        Arc::clone(&self.deadlines)
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    pub fn config(&self) -> &DraftConfig {
        &self.config
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Create a NotStarted draft over the given castaway pool.
    pub async fn create_draft(
        &self,
        request: CreateDraftRequest,
    ) -> Result<DraftSnapshot, DraftError> {
        validate_pool(&request.castaway_ids)?;

        let session_id = request
            .session_id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        if session_id.trim().is_empty() {
            return Err(invalid_config("session id cannot be empty"));
        }

        let session =
            self.store
                .create_session(&session_id, &request.castaway_ids, self.clock.now())?;

        info!(
            "Created draft {} with {} castaways",
            session.id,
            request.castaway_ids.len()
        );
        self.events
            .emit(DraftEvent::DraftCreated {
                session_id: session.id.clone(),
                pool_size: request.castaway_ids.len(),
            })
            .await;

        self.snapshot_of(&session)
    }

    /// Store a participant's preference order for auto-picks.
    ///
    /// Accepted any time before the draft ends. Once participants are fixed,
    /// only they may submit.
    pub async fn submit_ranking(
        &self,
        session_id: &str,
        participant_id: &str,
        castaway_ids: Vec<String>,
    ) -> Result<ParticipantRanking, DraftError> {
        let session = self.load(session_id)?;
        if session.status.is_terminal() {
            return Err(ValidationError::DraftNotActive {
                status: session.status,
            }
            .into());
        }
        if participant_id.trim().is_empty() {
            return Err(
                ValidationError::InvalidParticipant("participant id cannot be empty".into()).into(),
            );
        }
        if !session.participants.is_empty()
            && !session.participants.iter().any(|p| p == participant_id)
        {
            return Err(ValidationError::InvalidParticipant(format!(
                "{} is not in draft {}",
                participant_id, session_id
            ))
            .into());
        }

        let pool = self.store.pool(session_id).map_err(read_err)?;
        {
            let known: HashSet<&str> = pool.iter().map(|e| e.castaway_id.as_str()).collect();
            let mut seen = HashSet::new();
            for id in &castaway_ids {
                if !known.contains(id.as_str()) {
                    return Err(ValidationError::UnknownCastaway(id.clone()).into());
                }
                if !seen.insert(id.as_str()) {
                    return Err(invalid_config(&format!(
                        "ranking lists {} more than once",
                        id
                    )));
                }
            }
        }

        let ranking = ParticipantRanking {
            participant_id: participant_id.to_string(),
            castaway_ids,
        };
        self.store
            .put_ranking(session_id, &ranking, self.clock.now())?;

        debug!(
            "Stored ranking of {} castaways for {} in draft {}",
            ranking.castaway_ids.len(),
            participant_id,
            session_id
        );
        self.events
            .emit(DraftEvent::RankingSubmitted {
                session_id: session_id.to_string(),
                participant_id: participant_id.to_string(),
                ranked: ranking.castaway_ids.len(),
            })
            .await;

        Ok(ranking)
    }

    /// Fix participants and roster size and open the first turn.
    pub async fn start_draft(
        &self,
        session_id: &str,
        request: StartDraftRequest,
    ) -> Result<DraftSnapshot, DraftError> {
        let turn_duration_secs = request
            .turn_duration_secs
            .unwrap_or(self.config.default_turn_duration_secs);
        self.validate_start(&request, turn_duration_secs)?;

        let session = self.load(session_id)?;
        if session.status != DraftStatus::NotStarted {
            return Err(ValidationError::AlreadyStarted {
                status: session.status,
            }
            .into());
        }

        let pool = self.store.pool(session_id).map_err(read_err)?;
        let needed = request.participants.len() as u64 * u64::from(request.roster_size);
        if needed > pool.len() as u64 {
            return Err(invalid_config(&format!(
                "{} picks needed but the pool holds {} castaways",
                needed,
                pool.len()
            )));
        }

        let now = self.clock.now();
        let first_deadline = now + Duration::seconds(i64::from(turn_duration_secs));
        let started = self.store.start_session(&SessionStart {
            session_id: session_id.to_string(),
            participants: request.participants.clone(),
            roster_size: request.roster_size,
            turn_duration_secs,
            first_deadline,
            started_at: now,
        })?;

        self.deadlines.push(DeadlineEntry {
            deadline: first_deadline,
            session_id: started.id.clone(),
            pick_index: 0,
        });

        info!(
            "Started draft {}: {} participants, {} picks each, {}s turns",
            started.id,
            started.participants.len(),
            started.roster_size,
            started.turn_duration_secs
        );
        self.events
            .emit(DraftEvent::DraftStarted {
                session_id: started.id.clone(),
                participants: started.participants.clone(),
                roster_size: started.roster_size,
                turn_duration_secs: started.turn_duration_secs,
            })
            .await;

        self.snapshot_of(&started)
    }

    fn validate_start(
        &self,
        request: &StartDraftRequest,
        turn_duration_secs: u32,
    ) -> Result<(), DraftError> {
        let participants = &request.participants;
        if participants.is_empty() {
            return Err(ValidationError::InvalidParticipant(
                "at least one participant is required".into(),
            )
            .into());
        }
        let mut seen = HashSet::new();
        for p in participants {
            if p.trim().is_empty() {
                return Err(ValidationError::InvalidParticipant(
                    "participant ids cannot be empty".into(),
                )
                .into());
            }
            if !seen.insert(p.as_str()) {
                return Err(ValidationError::InvalidParticipant(format!(
                    "{} is listed more than once",
                    p
                ))
                .into());
            }
        }
        if participants.len() > self.config.max_participants {
            return Err(invalid_config(&format!(
                "{} participants exceeds the limit of {}",
                participants.len(),
                self.config.max_participants
            )));
        }
        if participants.len() % 2 == 1
            && self.config.odd_participant_policy == OddParticipantPolicy::Reject
        {
            return Err(invalid_config(&format!(
                "odd participant count ({}) is not allowed",
                participants.len()
            )));
        }
        if request.roster_size == 0 {
            return Err(invalid_config("roster size must be at least 1"));
        }
        if turn_duration_secs < self.config.min_turn_duration_secs {
            return Err(invalid_config(&format!(
                "turn duration {}s is below the minimum of {}s",
                turn_duration_secs, self.config.min_turn_duration_secs
            )));
        }
        Ok(())
    }

    /// Suspend a running draft. The pending deadline is dropped.
    pub async fn pause_draft(&self, session_id: &str) -> Result<DraftSnapshot, DraftError> {
        let paused = self.store.transition(
            session_id,
            &[DraftStatus::InProgress],
            DraftStatus::Paused,
            None,
            self.clock.now(),
        )?;

        info!("Paused draft {} at pick {}", paused.id, paused.pick_index);
        self.events
            .emit(DraftEvent::DraftPaused {
                session_id: paused.id.clone(),
                pick_index: paused.pick_index,
            })
            .await;

        self.snapshot_of(&paused)
    }

    /// Continue a paused draft. The current picker gets a full new turn.
    pub async fn resume_draft(&self, session_id: &str) -> Result<DraftSnapshot, DraftError> {
        let session = self.load(session_id)?;
        let now = self.clock.now();
        let deadline = now + session.turn_duration();
        let resumed = self.store.transition(
            session_id,
            &[DraftStatus::Paused],
            DraftStatus::InProgress,
            Some(deadline),
            now,
        )?;

        self.deadlines.push(DeadlineEntry {
            deadline,
            session_id: resumed.id.clone(),
            pick_index: resumed.pick_index,
        });

        info!("Resumed draft {} at pick {}", resumed.id, resumed.pick_index);
        self.events
            .emit(DraftEvent::DraftResumed {
                session_id: resumed.id.clone(),
                pick_index: resumed.pick_index,
                deadline,
            })
            .await;

        self.snapshot_of(&resumed)
    }

    /// Terminate a draft that has not completed. Committed picks stay in the ledger.
    pub async fn abort_draft(&self, session_id: &str) -> Result<DraftSnapshot, DraftError> {
        let session = self.load(session_id)?;
        let aborted = self.store.transition(
            session_id,
            &[
                DraftStatus::NotStarted,
                DraftStatus::InProgress,
                DraftStatus::Paused,
            ],
            DraftStatus::Aborted,
            None,
            self.clock.now(),
        )?;

        warn!(
            "Aborted draft {} at pick {} (was {})",
            aborted.id, aborted.pick_index, session.status
        );
        self.events
            .emit(DraftEvent::DraftAborted {
                session_id: aborted.id.clone(),
                previous_status: session.status,
            })
            .await;

        self.snapshot_of(&aborted)
    }

    // =========================================================================
    // Picks
    // =========================================================================

    /// Commit a participant's own pick.
    ///
    /// Checks run in order: the draft is in progress, the caller's pick index
    /// is current, it is the caller's turn, and the castaway is available.
    pub async fn submit_pick(
        &self,
        session_id: &str,
        request: PickRequest,
    ) -> Result<DraftSnapshot, DraftError> {
        match self.try_manual_pick(session_id, &request).await {
            Ok(session) => self.snapshot_of(&session),
            Err(e) => {
                self.record_rejection(
                    session_id,
                    &request.participant_id,
                    request.expected_pick_index,
                    PickMethod::Manual,
                    &e,
                )
                .await;
                Err(e)
            }
        }
    }

    async fn try_manual_pick(
        &self,
        session_id: &str,
        request: &PickRequest,
    ) -> Result<DraftSession, DraftError> {
        let session = self.load(session_id)?;
        if session.status != DraftStatus::InProgress {
            return Err(ValidationError::DraftNotActive {
                status: session.status,
            }
            .into());
        }
        if request.expected_pick_index != session.pick_index {
            return Err(ConcurrencyError::StaleVersion {
                expected: request.expected_pick_index,
                actual: session.pick_index,
            }
            .into());
        }
        if !session
            .participants
            .iter()
            .any(|p| p == &request.participant_id)
        {
            return Err(ValidationError::InvalidParticipant(format!(
                "{} is not in draft {}",
                request.participant_id, session_id
            ))
            .into());
        }

        let expected = current_picker(&session)?;
        if expected != request.participant_id {
            return Err(ValidationError::WrongTurn {
                pick_index: session.pick_index,
                expected: expected.to_string(),
                actual: request.participant_id.clone(),
            }
            .into());
        }

        self.commit(
            &session,
            &request.participant_id,
            &request.castaway_id,
            PickMethod::Manual,
        )
        .await
    }

    /// Pick on behalf of the participant whose turn at `pick_index` expired.
    ///
    /// Takes the first available castaway from their ranking, else the lowest
    /// available id. If nothing can be chosen the draft is paused and a
    /// stall error is returned.
    pub async fn force_auto_pick(
        &self,
        session_id: &str,
        pick_index: u32,
    ) -> Result<DraftSnapshot, DraftError> {
        let session = self.load(session_id)?;
        if session.status != DraftStatus::InProgress {
            return Err(ValidationError::DraftNotActive {
                status: session.status,
            }
            .into());
        }
        if pick_index != session.pick_index {
            return Err(ConcurrencyError::StaleVersion {
                expected: pick_index,
                actual: session.pick_index,
            }
            .into());
        }
        let participant_id = current_picker(&session)?.to_string();

        info!(
            "Turn {} of draft {} timed out for {}",
            pick_index, session_id, participant_id
        );
        self.events
            .emit(DraftEvent::TurnTimedOut {
                session_id: session_id.to_string(),
                participant_id: participant_id.clone(),
                pick_index,
            })
            .await;

        let updated = self.auto_pick(&session, &participant_id).await?;
        self.snapshot_of(&updated)
    }

    async fn auto_pick(
        &self,
        session: &DraftSession,
        participant_id: &str,
    ) -> Result<DraftSession, DraftError> {
        let pool = self.store.pool(&session.id).map_err(read_err)?;
        let ranking = self
            .store
            .ranking(&session.id, participant_id)
            .map_err(read_err)?;

        let choice = match self
            .selector
            .select(ranking.as_ref().map(|r| r.castaway_ids.as_slice()), &pool)
        {
            Ok(choice) => choice,
            Err(SchedulerError::Stalled { reason }) => {
                self.stall(session, &reason).await?;
                return Err(SchedulerError::Stalled { reason }.into());
            }
        };

        debug!(
            "Auto-pick for {} in draft {}: {} ({:?})",
            participant_id, session.id, choice.castaway_id, choice.source
        );

        match self
            .commit(session, participant_id, &choice.castaway_id, PickMethod::Auto)
            .await
        {
            Ok(updated) => Ok(updated),
            Err(e) => {
                self.record_rejection(
                    &session.id,
                    participant_id,
                    session.pick_index,
                    PickMethod::Auto,
                    &e,
                )
                .await;
                Err(e)
            }
        }
    }

    /// The one path that writes a pick. Everything after the store call is
    /// bookkeeping for a commit that has already happened.
    async fn commit(
        &self,
        session: &DraftSession,
        participant_id: &str,
        castaway_id: &str,
        method: PickMethod,
    ) -> Result<DraftSession, DraftError> {
        let now = self.clock.now();
        let commit = PickCommit {
            session_id: session.id.clone(),
            expected_pick_index: session.pick_index,
            participant_id: participant_id.to_string(),
            castaway_id: castaway_id.to_string(),
            method,
            committed_at: now,
            next_deadline: now + session.turn_duration(),
        };

        let timer = COMMIT_DURATION
            .with_label_values(&[method.as_str()])
            .start_timer();
        let result = self.store.commit_pick(&commit);
        timer.observe_duration();
        let updated = result?;

        PICKS_COMMITTED.with_label_values(&[method.as_str()]).inc();

        if updated.status == DraftStatus::InProgress {
            if let Some(deadline) = updated.current_deadline {
                self.deadlines.push(DeadlineEntry {
                    deadline,
                    session_id: updated.id.clone(),
                    pick_index: updated.pick_index,
                });
            }
        }

        info!(
            "Draft {} pick {}: {} took {} ({})",
            updated.id, commit.expected_pick_index, participant_id, castaway_id, method
        );
        self.events
            .emit(DraftEvent::PickMade {
                session_id: updated.id.clone(),
                pick_index: commit.expected_pick_index,
                participant_id: participant_id.to_string(),
                castaway_id: castaway_id.to_string(),
                method,
            })
            .await;

        if updated.status == DraftStatus::Completed {
            DRAFTS_COMPLETED.inc();
            info!(
                "Draft {} completed after {} picks",
                updated.id, updated.pick_index
            );
            self.events
                .emit(DraftEvent::DraftCompleted {
                    session_id: updated.id.clone(),
                    total_picks: updated.pick_index,
                })
                .await;
        }

        Ok(updated)
    }

    /// Pause a draft that cannot progress automatically and raise an alert.
    ///
    /// The alert is only raised once the pause is stored. If the session left
    /// InProgress in the meantime the error is `DraftNotActive`.
    async fn stall(&self, session: &DraftSession, reason: &str) -> Result<(), DraftError> {
        if let Err(e) = self.store.transition(
            &session.id,
            &[DraftStatus::InProgress],
            DraftStatus::Paused,
            None,
            self.clock.now(),
        ) {
            error!(
                "Draft {} stalled at pick {} ({}) but could not be paused: {}",
                session.id, session.pick_index, reason, e
            );
            return Err(match e {
                StoreError::InvalidTransition { from, .. } => {
                    ValidationError::DraftNotActive { status: from }.into()
                }
                other => other.into(),
            });
        }

        error!(
            "Draft {} stalled at pick {}: {}",
            session.id, session.pick_index, reason
        );
        DRAFTS_STALLED.inc();
        self.events
            .emit(DraftEvent::DraftStalled {
                session_id: session.id.clone(),
                reason: reason.to_string(),
            })
            .await;
        Ok(())
    }

    async fn record_rejection(
        &self,
        session_id: &str,
        participant_id: &str,
        pick_index: u32,
        method: PickMethod,
        error: &DraftError,
    ) {
        PICKS_REJECTED
            .with_label_values(&[method.as_str(), error.kind()])
            .inc();
        debug!(
            "Rejected {} pick {} in draft {} from {}: {}",
            method, pick_index, session_id, participant_id, error
        );
        self.events
            .emit(DraftEvent::PickRejected {
                session_id: session_id.to_string(),
                participant_id: participant_id.to_string(),
                pick_index,
                method,
                reason: error.kind().to_string(),
            })
            .await;
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub fn get_state(&self, session_id: &str) -> Result<DraftSnapshot, DraftError> {
        let session = self.load(session_id)?;
        self.snapshot_of(&session)
    }

    /// Committed picks in order.
    pub fn ledger(&self, session_id: &str) -> Result<Vec<DraftPick>, DraftError> {
        self.load(session_id)?;
        self.store.ledger(session_id).map_err(read_err)
    }

    pub fn find_session(&self, session_id: &str) -> Result<Option<DraftSession>, DraftError> {
        self.store.get_session(session_id).map_err(read_err)
    }

    pub fn list_drafts(&self, filter: &DraftFilter) -> Result<Vec<DraftSession>, DraftError> {
        self.store.list_sessions(filter).map_err(read_err)
    }

    pub fn count_drafts(&self, status: Option<DraftStatus>) -> Result<i64, DraftError> {
        let filter = DraftFilter {
            status,
            ..DraftFilter::new()
        };
        self.store.count_sessions(&filter).map_err(read_err)
    }

    /// Replay the ledger and compare it with the stored session and pool.
    pub fn verify_ledger(&self, session_id: &str) -> Result<ReplayedDraft, DraftError> {
        let session = self.load(session_id)?;
        self.verify(&session)
    }

    fn verify(&self, session: &DraftSession) -> Result<ReplayedDraft, DraftError> {
        let pool = self.store.pool(&session.id).map_err(read_err)?;
        let picks = self.store.ledger(&session.id).map_err(read_err)?;
        let mismatch = |detail: String| -> DraftError {
            PersistenceError::LedgerMismatch {
                session_id: session.id.clone(),
                detail,
            }
            .into()
        };

        let pool_ids: Vec<String> = pool.iter().map(|e| e.castaway_id.clone()).collect();
        let replayed = replay(&session.participants, session.roster_size, &pool_ids, &picks)
            .map_err(|e| mismatch(e.to_string()))?;

        if replayed.pick_index != session.pick_index {
            return Err(mismatch(format!(
                "ledger holds {} picks but the session is at pick {}",
                replayed.pick_index, session.pick_index
            )));
        }
        if session.version != replayed.pick_index {
            return Err(mismatch(format!(
                "version {} does not match {} committed picks",
                session.version, replayed.pick_index
            )));
        }
        let stored_available: BTreeSet<String> = pool
            .iter()
            .filter(|e| e.available)
            .map(|e| e.castaway_id.clone())
            .collect();
        if stored_available != replayed.available {
            return Err(mismatch(
                "pool availability differs from the ledger".to_string(),
            ));
        }
        if replayed.complete != (session.status == DraftStatus::Completed) {
            return Err(mismatch(format!(
                "ledger completeness ({}) disagrees with status {}",
                replayed.complete, session.status
            )));
        }

        Ok(replayed)
    }

    // =========================================================================
    // Recovery
    // =========================================================================

    /// Verify every InProgress session and put its deadline back on the heap.
    ///
    /// A session whose ledger disagrees with its stored state is paused and
    /// reported instead of being scheduled.
    pub async fn recover_sessions(&self) -> Result<RecoveryReport, DraftError> {
        let mut sessions = Vec::new();
        let mut offset = 0;
        loop {
            let filter = DraftFilter::new()
                .with_status(DraftStatus::InProgress)
                .with_limit(RECOVERY_PAGE_SIZE)
                .with_offset(offset);
            let page = self.store.list_sessions(&filter).map_err(read_err)?;
            let fetched = page.len() as i64;
            sessions.extend(page);
            if fetched < RECOVERY_PAGE_SIZE {
                break;
            }
            offset += fetched;
        }

        let mut report = RecoveryReport {
            sessions: sessions.len(),
            ..RecoveryReport::default()
        };

        for session in sessions {
            match self.verify(&session) {
                Ok(_) => {}
                Err(DraftError::Persistence(PersistenceError::LedgerMismatch { detail, .. })) => {
                    let reason = format!("ledger mismatch: {}", detail);
                    if let Err(e) = self.stall(&session, &reason).await {
                        warn!("Inconsistent draft {} left unpaused: {}", session.id, e);
                    }
                    report.inconsistent.push(session.id.clone());
                    continue;
                }
                Err(e) => return Err(e),
            }

            let deadline = match session.current_deadline {
                Some(deadline) => deadline,
                None => self.reissue_deadline(&session)?,
            };
            self.deadlines.push(DeadlineEntry {
                deadline,
                session_id: session.id.clone(),
                pick_index: session.pick_index,
            });
            report.seeded += 1;
        }

        info!(
            "Recovered {} in-progress drafts ({} scheduled, {} inconsistent)",
            report.sessions,
            report.seeded,
            report.inconsistent.len()
        );
        Ok(report)
    }

    fn reissue_deadline(&self, session: &DraftSession) -> Result<DateTime<Utc>, DraftError> {
        let now = self.clock.now();
        let deadline = now + session.turn_duration();
        self.store.transition(
            &session.id,
            &[DraftStatus::InProgress],
            DraftStatus::InProgress,
            Some(deadline),
            now,
        )?;
        warn!(
            "Draft {} had no deadline for pick {}; issued a new one",
            session.id, session.pick_index
        );
        Ok(deadline)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn load(&self, session_id: &str) -> Result<DraftSession, DraftError> {
        self.store
            .get_session(session_id)
            .map_err(read_err)?
            .ok_or_else(|| DraftError::SessionNotFound(session_id.to_string()))
    }

    fn snapshot_of(&self, session: &DraftSession) -> Result<DraftSnapshot, DraftError> {
        let pool = self.store.pool(&session.id).map_err(read_err)?;
        let picks = self.store.ledger(&session.id).map_err(read_err)?;
        Ok(build_snapshot(session, &pool, &picks))
    }
}

fn build_snapshot(
    session: &DraftSession,
    pool: &[CastawayPoolEntry],
    picks: &[DraftPick],
) -> DraftSnapshot {
    let rosters = session
        .participants
        .iter()
        .map(|participant| ParticipantRoster {
            participant_id: participant.clone(),
            castaway_ids: picks
                .iter()
                .filter(|pick| &pick.participant_id == participant)
                .map(|pick| pick.castaway_id.clone())
                .collect(),
        })
        .collect();

    let current_picker = match session.status {
        DraftStatus::InProgress | DraftStatus::Paused if !session.is_full() => {
            SnakeOrder::new(&session.participants)
                .picker_at(session.pick_index)
                .map(String::from)
        }
        _ => None,
    };

    DraftSnapshot {
        session_id: session.id.clone(),
        status: session.status,
        pick_index: session.pick_index,
        version: session.version,
        total_picks: session.total_picks(),
        roster_size: session.roster_size,
        turn_duration_secs: session.turn_duration_secs,
        current_picker,
        current_deadline: session.current_deadline,
        available_castaways: pool.iter().filter(|e| e.available).count(),
        rosters,
    }
}

fn current_picker(session: &DraftSession) -> Result<&str, DraftError> {
    SnakeOrder::new(&session.participants)
        .picker_at(session.pick_index)
        .ok_or_else(|| invalid_config("draft has no participants"))
}

fn validate_pool(castaway_ids: &[String]) -> Result<(), DraftError> {
    if castaway_ids.is_empty() {
        return Err(invalid_config("castaway pool cannot be empty"));
    }
    let mut seen = HashSet::new();
    for id in castaway_ids {
        if id.trim().is_empty() {
            return Err(invalid_config("castaway ids cannot be empty"));
        }
        if !seen.insert(id.as_str()) {
            return Err(invalid_config(&format!(
                "castaway {} appears more than once in the pool",
                id
            )));
        }
    }
    Ok(())
}

fn invalid_config(msg: &str) -> DraftError {
    ValidationError::InvalidConfiguration(msg.to_string()).into()
}

/// Read paths report database trouble as a read failure, not a write failure.
fn read_err(err: StoreError) -> DraftError {
    match err {
        StoreError::Database(msg) => PersistenceError::ReadFailed(msg).into(),
        other => other.into(),
    }
}
