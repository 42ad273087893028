// ── Generic periodic fetch ──
//
// Fixed-interval refresh of a single value, with the same "latest issued
// request wins" rule as the status viewer. Scheduled ticks are skipped while
// the newest request is outstanding. Used for the live board.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Notify, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::generation::{Generation, GenerationGate};
use crate::error::CoreError;

/// The last value that was applied, plus sync metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Synced<T> {
    pub value: Option<T>,
    pub generation: u64,
    pub synced_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl<T> Default for Synced<T> {
    fn default() -> Self {
        Self {
            value: None,
            generation: 0,
            synced_at: None,
            last_error: None,
        }
    }
}

impl<T> Synced<T> {
    pub fn is_synced(&self) -> bool {
        self.generation > 0
    }
}

pub struct PollingSync<T> {
    view: watch::Receiver<Synced<T>>,
    refresh: Arc<Notify>,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl<T> PollingSync<T>
where
    T: Send + Sync + 'static,
{
    pub fn spawn<F, Fut>(
        fetch: F,
        interval: Duration,
        fallback: &'static str,
        cancel: CancellationToken,
    ) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, CoreError>> + Send + 'static,
    {
        let (tx, view) = watch::channel(Synced::default());
        let refresh = Arc::new(Notify::new());
        let handle = tokio::spawn(polling_task(
            fetch,
            interval,
            fallback,
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

    pub fn subscribe(&self) -> watch::Receiver<Synced<T>> {
        self.view.clone()
    }

    pub fn request_refresh(&self) {
        self.refresh.notify_one();
    }

    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl<T: Clone> PollingSync<T> {
    pub fn current(&self) -> Synced<T> {
        self.view.borrow().clone()
    }
}

impl<T> Drop for PollingSync<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn polling_task<T, F, Fut>(
    fetch: F,
    period: Duration,
    fallback: &'static str,
    tx: watch::Sender<Synced<T>>,
    refresh: Arc<Notify>,
    cancel: CancellationToken,
) where
    T: Send + Sync + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, CoreError>> + Send + 'static,
{
    let gate = GenerationGate::new();
    let mut inflight: JoinSet<(Generation, Result<T, CoreError>)> = JoinSet::new();
    let mut schedule = tokio::time::interval(period);
    schedule.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut awaiting = false;

    loop {
        let issue = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            Some(joined) = inflight.join_next() => {
                match joined {
                    Ok((ticket, result)) if gate.is_current(ticket) => {
                        awaiting = false;
                        match result {
                            Ok(value) => {
                                tx.send_replace(Synced {
                                    value: Some(value),
                                    generation: ticket.get(),
                                    synced_at: Some(Utc::now()),
                                    last_error: None,
                                });
                            }
                            Err(e) => {
                                let message = e.user_message(fallback);
                                tx.send_modify(|view| view.last_error = Some(message));
                            }
                        }
                    }
                    Ok((ticket, _)) => {
                        debug!(generation = ticket.get(), "discarding superseded response");
                    }
                    Err(e) => {
                        warn!(error = %e, "periodic fetch task failed");
                        awaiting &= !inflight.is_empty();
                    }
                }
                false
            }
            _ = schedule.tick() => {
                if awaiting {
                    debug!(latest = gate.issued(), "request outstanding, skipping scheduled fetch");
                }
                !awaiting
            }
            () = refresh.notified() => true,
        };

        if issue {
            let ticket = gate.issue();
            let request = fetch();
            inflight.spawn(async move { (ticket, request.await) });
            awaiting = true;
        }
    }

    inflight.abort_all();
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn refreshes_on_interval() {
        let calls = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&calls);
        let sync = PollingSync::spawn(
            move || {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                async move { Ok(n) }
            },
            Duration::from_secs(2),
            "failed",
            CancellationToken::new(),
        );
        let mut rx = sync.subscribe();

        let v = rx.wait_for(|v| v.value == Some(3)).await.unwrap().clone();
        assert_eq!(v.generation, 3);
        assert!(v.last_error.is_none());
        sync.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stale_slow_response_is_dropped() {
        let calls = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&calls);
        let sync = PollingSync::spawn(
            move || {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n == 1 {
                        tokio::time::sleep(Duration::from_secs(5)).await;
                    }
                    Ok(n)
                }
            },
            Duration::from_secs(3600),
            "failed",
            CancellationToken::new(),
        );
        let mut rx = sync.subscribe();
        tokio::task::yield_now().await;
        sync.request_refresh();

        rx.wait_for(|v| v.value == Some(2)).await.unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(sync.current().value, Some(2));
        sync.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn slow_fetches_are_not_starved_by_the_interval() {
        let calls = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&calls);
        let sync = PollingSync::spawn(
            move || {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    tokio::time::sleep(Duration::from_secs(4)).await;
                    Ok(n)
                }
            },
            Duration::from_secs(2),
            "failed",
            CancellationToken::new(),
        );

        tokio::time::sleep(Duration::from_secs(60)).await;
        let v = sync.current();
        assert!(v.is_synced());
        assert!(v.value.is_some_and(|n| n > 1));
        sync.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn error_uses_fallback_when_service_says_nothing() {
        let sync: PollingSync<u64> = PollingSync::spawn(
            || async {
                Err(CoreError::ConnectionFailed {
                    url: "http://localhost:8000/".into(),
                    reason: "refused".into(),
                })
            },
            Duration::from_secs(2),
            "Failed to load board",
            CancellationToken::new(),
        );
        let mut rx = sync.subscribe();
        let v = rx
            .wait_for(|v| v.last_error.is_some())
            .await
            .unwrap()
            .clone();
        assert_eq!(v.last_error.as_deref(), Some("Failed to load board"));
        assert!(v.value.is_none());
        sync.shutdown().await;
    }
}
