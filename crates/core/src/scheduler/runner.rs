//! Turn scheduler runner.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{
    DeadlineEntry, DeadlineOutcome, DeadlineQueue, SchedulerConfig, SchedulerStatus, TickReport,
};
use crate::clock::Clock;
use crate::draft::{DraftError, DraftSession, DraftStatus, ValidationError};
use crate::engine::{DraftEngine, RecoveryReport};
use crate::metrics::DEADLINES_FIRED;

/// Fires forced auto-picks when turn deadlines elapse.
///
/// One background loop serves every session. It sleeps until the earliest
/// deadline in the shared heap (or `max_idle_ms`, whichever is sooner) and is
/// woken early when a push lowers that deadline. Each popped entry is checked
/// against the stored session before anything is committed.
pub struct TurnScheduler {
    config: SchedulerConfig,
    engine: Arc<DraftEngine>,
    queue: Arc<DeadlineQueue>,
    clock: Arc<dyn Clock>,

    // Runtime state
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl TurnScheduler {
    pub fn new(config: SchedulerConfig, engine: Arc<DraftEngine>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        let queue = engine.deadlines();
        let clock = engine.clock();

        Self {
            config,
            engine,
            queue,
            clock,
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
            task: Mutex::new(None),
        }
    }

    /// Recover in-progress sessions, then spawn the deadline loop.
    ///
    /// Deadlines that passed while the service was down fire on the first tick.
    pub async fn start(&self) -> Result<RecoveryReport, DraftError> {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Turn scheduler already running");
            return Ok(RecoveryReport::default());
        }

        info!("Starting turn scheduler");

        let report = match self.engine.recover_sessions().await {
            Ok(report) => report,
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                return Err(e);
            }
        };

        self.spawn_deadline_loop();

        info!("Turn scheduler started");
        Ok(report)
    }

    /// Stop the loop and wait for it to exit. In-memory deadlines are dropped;
    /// stored deadlines survive for the next [`start`](Self::start).
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Turn scheduler not running");
            return;
        }

        info!("Stopping turn scheduler");
        let _ = self.shutdown_tx.send(());

        let task = self.task.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!("Deadline loop ended abnormally: {}", e);
            }
        }

        self.queue.clear();
        info!("Turn scheduler stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    pub fn status(&self) -> SchedulerStatus {
        SchedulerStatus {
            running: self.is_running(),
            pending_deadlines: self.queue.len(),
            next_deadline: self.queue.next_deadline(),
        }
    }

    /// Process every due deadline once, without the background loop.
    pub async fn tick(&self) -> TickReport {
        Self::run_tick(&self.engine, &self.queue, self.clock.as_ref()).await
    }

    fn spawn_deadline_loop(&self) {
        let running = Arc::clone(&self.running);
        let engine = Arc::clone(&self.engine);
        let queue = Arc::clone(&self.queue);
        let clock = Arc::clone(&self.clock);
        let max_idle = Duration::from_millis(self.config.max_idle_ms);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        let handle = tokio::spawn(async move {
            info!("Deadline loop started");
            let mut backoff = false;
            loop {
                let wait = if backoff {
                    max_idle
                } else {
                    Self::time_until_next(&queue, clock.as_ref(), max_idle)
                };

                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Deadline loop received shutdown signal");
                        break;
                    }
                    _ = queue.notified() => {}
                    _ = tokio::time::sleep(wait) => {}
                }

                if !running.load(Ordering::Relaxed) {
                    break;
                }

                let report = Self::run_tick(&engine, &queue, clock.as_ref()).await;
                if report.fired() > 0 {
                    debug!(
                        "Deadline tick: {} auto-picked, {} stale, {} stalled, {} rejected, {} retried",
                        report.auto_picked,
                        report.stale,
                        report.stalled,
                        report.rejected,
                        report.retried
                    );
                }
                // retries wait a full idle period
                backoff = report.retried > 0;
            }
            info!("Deadline loop stopped");
        });

        *self.task.lock().unwrap_or_else(|e| e.into_inner()) = Some(handle);
    }

    fn time_until_next(queue: &DeadlineQueue, clock: &dyn Clock, max_idle: Duration) -> Duration {
        match queue.next_deadline() {
            Some(deadline) => (deadline - clock.now())
                .to_std()
                .unwrap_or(Duration::ZERO)
                .min(max_idle),
            None => max_idle,
        }
    }

    async fn run_tick(engine: &DraftEngine, queue: &DeadlineQueue, clock: &dyn Clock) -> TickReport {
        let mut report = TickReport::default();
        for entry in queue.pop_due(clock.now()) {
            let outcome = Self::fire(engine, &entry).await;
            DEADLINES_FIRED.with_label_values(&[outcome.as_str()]).inc();
            if outcome == DeadlineOutcome::Retry {
                queue.requeue(entry);
            }
            report.record(outcome);
        }
        report
    }

    async fn fire(engine: &DraftEngine, entry: &DeadlineEntry) -> DeadlineOutcome {
        match engine.find_session(&entry.session_id) {
            Ok(Some(session)) if is_live(&session, entry) => {}
            Ok(_) => {
                debug!(
                    "Discarding stale deadline for draft {} pick {}",
                    entry.session_id, entry.pick_index
                );
                return DeadlineOutcome::Stale;
            }
            Err(e) => {
                warn!(
                    "Could not load draft {} for deadline check: {}",
                    entry.session_id, e
                );
                return if e.is_retryable() {
                    DeadlineOutcome::Retry
                } else {
                    DeadlineOutcome::Rejected
                };
            }
        }

        match engine
            .force_auto_pick(&entry.session_id, entry.pick_index)
            .await
        {
            Ok(_) => DeadlineOutcome::AutoPicked,
            Err(DraftError::Scheduler(_)) => DeadlineOutcome::Stalled,
            Err(DraftError::Concurrency(_))
            | Err(DraftError::Validation(ValidationError::DraftNotActive { .. })) => {
                debug!(
                    "Turn {} of draft {} ended before the auto-pick landed",
                    entry.pick_index, entry.session_id
                );
                DeadlineOutcome::Stale
            }
            Err(e) if e.is_retryable() => {
                warn!(
                    "Auto-pick for draft {} pick {} failed, will retry: {}",
                    entry.session_id, entry.pick_index, e
                );
                DeadlineOutcome::Retry
            }
            Err(e) => {
                warn!(
                    "Auto-pick for draft {} pick {} rejected: {}",
                    entry.session_id, entry.pick_index, e
                );
                DeadlineOutcome::Rejected
            }
        }
    }
}

/// An entry fires only for the exact turn it was registered for.
fn is_live(session: &DraftSession, entry: &DeadlineEntry) -> bool {
    session.status == DraftStatus::InProgress
        && session.pick_index == entry.pick_index
        && session.current_deadline == Some(entry.deadline)
}
