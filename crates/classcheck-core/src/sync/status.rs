// ── Live poll status ──
//
// One task per viewer. A coarse interval fetches the authoritative status;
// a one-second local countdown runs in between and is reset whenever a
// fetch is applied. When the countdown reaches zero the task re-fetches
// immediately instead of assuming the poll ended. Scheduled fetches are
// skipped while the newest request is still outstanding, so a backend slower
// than the refresh period still gets its answers applied.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Notify, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::countdown::{Countdown, Tick, Urgency, format_clock};
use super::generation::{Generation, GenerationGate};
use crate::error::CoreError;
use crate::lifecycle::PollPhase;
use crate::model::PollStatus;

/// Fallback message when a status fetch fails without a service message.
const STATUS_FALLBACK_MESSAGE: &str = "Failed to fetch poll status";

/// What a viewer renders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusView {
    /// Last applied authoritative status.
    pub status: PollStatus,
    /// Local countdown, decremented each tick and reset on every fetch.
    pub remaining_seconds: u64,
    /// Generation of the applied status; 0 until the first fetch lands.
    pub generation: u64,
    pub synced_at: Option<DateTime<Utc>>,
    /// Message from the most recent failed fetch. Cleared on success.
    pub last_error: Option<String>,
}

impl StatusView {
    pub fn is_synced(&self) -> bool {
        self.generation > 0
    }

    pub fn phase(&self) -> PollPhase {
        self.status.phase()
    }

    pub fn clock(&self) -> String {
        format_clock(self.remaining_seconds)
    }

    pub fn urgency(&self) -> Urgency {
        Urgency::for_remaining(self.remaining_seconds)
    }
}

/// Timer settings for a status viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncTiming {
    /// Authoritative refresh period (2-3 s in the stock views).
    pub refresh: Duration,
    /// Local countdown step.
    pub tick: Duration,
}

impl Default for SyncTiming {
    fn default() -> Self {
        Self {
            refresh: Duration::from_secs(3),
            tick: Duration::from_secs(1),
        }
    }
}

// ── StatusSync ──────────────────────────────────────────────────────

/// Handle to a running status viewer task.
///
/// Dropping the handle cancels the task; [`shutdown`](Self::shutdown)
/// also waits for it to finish.
pub struct StatusSync {
    view: watch::Receiver<StatusView>,
    refresh: Arc<Notify>,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl StatusSync {
    /// Spawn the viewer task. `fetch` issues one status request.
    pub fn spawn<F, Fut>(fetch: F, timing: SyncTiming, cancel: CancellationToken) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<PollStatus, CoreError>> + Send + 'static,
    {
        let (tx, view) = watch::channel(StatusView::default());
        let refresh = Arc::new(Notify::new());
        let handle = tokio::spawn(status_sync_task(
            fetch,
            timing,
            tx,
            Arc::clone(&refresh),
            cancel.clone(),
        ));
        Self {
            view,
            refresh,
            cancel,
            handle: Some(handle),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<StatusView> {
        self.view.clone()
    }

    pub fn current(&self) -> StatusView {
        self.view.borrow().clone()
    }

    /// Issue a fetch now, outside the regular schedule.
    pub fn request_refresh(&self) {
        self.refresh.notify_one();
    }

    /// Cancel the task and wait for it to exit.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for StatusSync {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ── Task ────────────────────────────────────────────────────────────

type Fetched = (Generation, Result<PollStatus, CoreError>);

fn spawn_fetch<F, Fut>(
    fetch: &F,
    gate: &GenerationGate,
    inflight: &mut JoinSet<Fetched>,
    awaiting: &mut bool,
) where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<PollStatus, CoreError>> + Send + 'static,
{
    let ticket = gate.issue();
    let request = fetch();
    inflight.spawn(async move { (ticket, request.await) });
    *awaiting = true;
}

fn countdown_ticker(period: Duration) -> tokio::time::Interval {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

async fn status_sync_task<F, Fut>(
    fetch: F,
    timing: SyncTiming,
    tx: watch::Sender<StatusView>,
    refresh: Arc<Notify>,
    cancel: CancellationToken,
) where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<PollStatus, CoreError>> + Send + 'static,
{
    let gate = GenerationGate::new();
    let mut inflight: JoinSet<Fetched> = JoinSet::new();
    // The newest issued request has not come back yet.
    let mut awaiting = false;
    let mut countdown = Countdown::default();
    let mut schedule = tokio::time::interval(timing.refresh);
    schedule.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut ticker = countdown_ticker(timing.tick);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            Some(joined) = inflight.join_next() => {
                let (ticket, result) = match joined {
                    Ok(fetched) => fetched,
                    Err(e) => {
                        warn!(error = %e, "status fetch task failed");
                        awaiting &= !inflight.is_empty();
                        continue;
                    }
                };
                if !gate.is_current(ticket) {
                    debug!(generation = ticket.get(), latest = gate.issued(), "discarding superseded status");
                    continue;
                }
                awaiting = false;
                match result {
                    Ok(status) => {
                        countdown.resync(&status);
                        ticker.reset();
                        let remaining = countdown.remaining();
                        tx.send_replace(StatusView {
                            status,
                            remaining_seconds: remaining,
                            generation: ticket.get(),
                            synced_at: Some(Utc::now()),
                            last_error: None,
                        });
                    }
                    Err(e) => {
                        debug!(error = %e, "status fetch failed");
                        let message = e.user_message(STATUS_FALLBACK_MESSAGE);
                        tx.send_modify(|view| view.last_error = Some(message));
                    }
                }
            }
            _ = schedule.tick() => {
                if awaiting {
                    debug!(latest = gate.issued(), "status request outstanding, skipping scheduled fetch");
                } else {
                    spawn_fetch(&fetch, &gate, &mut inflight, &mut awaiting);
                }
            }
            () = refresh.notified() => spawn_fetch(&fetch, &gate, &mut inflight, &mut awaiting),
            _ = ticker.tick() => match countdown.tick() {
                Tick::Running(left) => {
                    tx.send_modify(|view| view.remaining_seconds = left);
                }
                Tick::ReachedZero => {
                    debug!("countdown reached zero, re-fetching status");
                    tx.send_modify(|view| view.remaining_seconds = 0);
                    spawn_fetch(&fetch, &gate, &mut inflight, &mut awaiting);
                }
                Tick::Idle => {}
            },
        }
    }

    inflight.abort_all();
    debug!("status sync stopped");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};

    use chrono::TimeZone;

    use super::*;
    use crate::clock::Clock;
    use crate::ledger::AttendanceLedger;
    use crate::lifecycle::PollDuration;
    use crate::model::PollId;

    /// Wall clock that follows tokio's (pausable) time.
    struct TokioClock {
        base: DateTime<Utc>,
        origin: Instant,
    }

    impl TokioClock {
        fn new() -> Self {
            Self {
                base: Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
                origin: Instant::now(),
            }
        }
    }

    impl Clock for TokioClock {
        fn now(&self) -> DateTime<Utc> {
            self.base + chrono::Duration::from_std(self.origin.elapsed()).unwrap()
        }
    }

    fn ledger_sync(
        ledger: &Arc<AttendanceLedger<TokioClock>>,
        timing: SyncTiming,
    ) -> StatusSync {
        let ledger = Arc::clone(ledger);
        StatusSync::spawn(
            move || {
                let ledger = Arc::clone(&ledger);
                async move { Ok(ledger.current_status().await) }
            },
            timing,
            CancellationToken::new(),
        )
    }

    fn active(id: u64, remaining: u64) -> PollStatus {
        PollStatus {
            is_active: true,
            poll_id: Some(PollId::new(id)),
            start_time: None,
            end_time: None,
            remaining_seconds: remaining,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_runs_between_fetches_and_resyncs_without_jump() {
        let ledger = Arc::new(AttendanceLedger::with_clock(TokioClock::new()));
        let origin = Instant::now();
        ledger
            .start_poll(PollDuration::try_from(5).unwrap())
            .await
            .unwrap();

        let sync = ledger_sync(&ledger, SyncTiming::default());
        let mut rx = sync.subscribe();

        let first = rx.wait_for(StatusView::is_synced).await.unwrap().clone();
        assert_eq!(first.remaining_seconds, 300);
        assert_eq!(first.generation, 1);

        let v = rx.wait_for(|v| v.remaining_seconds == 299).await.unwrap().clone();
        assert_eq!(v.generation, 1);
        assert_eq!(origin.elapsed(), Duration::from_secs(1));

        rx.wait_for(|v| v.remaining_seconds == 298).await.unwrap();
        assert_eq!(origin.elapsed(), Duration::from_secs(2));

        // Second authoritative fetch at t=3s agrees with the local value.
        let v = rx.wait_for(|v| v.generation == 2).await.unwrap().clone();
        assert_eq!(v.remaining_seconds, 297);
        assert_eq!(origin.elapsed(), Duration::from_secs(3));

        sync.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn reaching_zero_triggers_refetch() {
        let ledger = Arc::new(AttendanceLedger::with_clock(TokioClock::new()));
        let origin = Instant::now();
        ledger
            .start_poll(PollDuration::try_from(1).unwrap())
            .await
            .unwrap();

        // Scheduled refreshes far apart so only the countdown can re-fetch.
        let sync = ledger_sync(
            &ledger,
            SyncTiming {
                refresh: Duration::from_secs(3600),
                tick: Duration::from_secs(1),
            },
        );
        let mut rx = sync.subscribe();

        rx.wait_for(|v| v.status.is_active).await.unwrap();
        let ended = rx
            .wait_for(|v| v.is_synced() && !v.status.is_active)
            .await
            .unwrap()
            .clone();

        assert_eq!(ended.generation, 2);
        assert_eq!(ended.phase(), PollPhase::NoPoll);
        assert_eq!(origin.elapsed(), Duration::from_secs(60));
        sync.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_responses_are_discarded() {
        let calls = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&calls);
        let sync = StatusSync::spawn(
            move || {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n == 1 {
                        // The first request is slow and carries stale data.
                        tokio::time::sleep(Duration::from_secs(2)).await;
                        Ok(active(1, 10))
                    } else {
                        Ok(active(2, 500))
                    }
                }
            },
            SyncTiming {
                refresh: Duration::from_secs(3600),
                tick: Duration::from_secs(1),
            },
            CancellationToken::new(),
        );
        let mut rx = sync.subscribe();

        tokio::task::yield_now().await;
        sync.request_refresh();

        let v = rx.wait_for(StatusView::is_synced).await.unwrap().clone();
        assert_eq!(v.generation, 2);
        assert_eq!(v.status.poll_id, Some(PollId::new(2)));

        // Let the stale request finish; it must not be applied.
        tokio::time::sleep(Duration::from_secs(3)).await;
        let v = sync.current();
        assert_eq!(v.generation, 2);
        assert_eq!(v.status.poll_id, Some(PollId::new(2)));
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        sync.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn backend_slower_than_refresh_period_still_syncs() {
        let calls = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&calls);
        let sync = StatusSync::spawn(
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async {
                    tokio::time::sleep(Duration::from_secs(4)).await;
                    Ok(active(1, 600))
                }
            },
            SyncTiming {
                refresh: Duration::from_secs(3),
                tick: Duration::from_secs(1),
            },
            CancellationToken::new(),
        );

        tokio::time::sleep(Duration::from_secs(120)).await;
        let v = sync.current();
        assert!(v.is_synced());
        assert!(v.generation > 1);
        assert_eq!(v.status.poll_id, Some(PollId::new(1)));
        // One request at a time: never more issued than could have finished.
        assert!(calls.load(Ordering::SeqCst) <= 120 / 4 + 1);

        sync.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_errors_keep_last_status() {
        let calls = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&calls);
        let sync = StatusSync::spawn(
            move || {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n == 1 {
                        Ok(active(1, 100))
                    } else {
                        Err(CoreError::Api {
                            message: "database locked".into(),
                            status: Some(500),
                        })
                    }
                }
            },
            SyncTiming::default(),
            CancellationToken::new(),
        );
        let mut rx = sync.subscribe();

        let v = rx
            .wait_for(|v| v.last_error.is_some())
            .await
            .unwrap()
            .clone();
        assert_eq!(v.last_error.as_deref(), Some("database locked"));
        assert_eq!(v.status.poll_id, Some(PollId::new(1)));
        assert!(v.status.is_active);

        sync.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_the_task() {
        let calls = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&calls);
        let cancel = CancellationToken::new();
        let sync = StatusSync::spawn(
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Ok(PollStatus::inactive()) }
            },
            SyncTiming::default(),
            cancel.clone(),
        );
        let mut rx = sync.subscribe();
        rx.wait_for(StatusView::is_synced).await.unwrap();

        cancel.cancel();
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        drop(sync);
    }
}
