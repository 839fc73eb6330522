//! Cached belief about whether the companion service is reachable.
//!
//! The prober is the only writer: it owns the `watch::Sender` and every other
//! component reads snapshots. Liveness is advisory and never gates an attempt.

use crate::http_client::CompanionClient;
use crate::observability;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct LivenessState {
    pub reachable: bool,
    pub last_checked_at: Option<DateTime<Utc>>,
    pub consecutive_failures: u32,
}

impl LivenessState {
    /// True when the last check happened less than `interval` before `now`.
    pub fn is_fresh(&self, now: DateTime<Utc>, interval: Duration) -> bool {
        let Some(checked) = self.last_checked_at else {
            return false;
        };
        match (now - checked).to_std() {
            Ok(age) => age < interval,
            // Checked "in the future" (clock step back): treat as fresh.
            Err(_) => true,
        }
    }

    /// Time left until the cached answer goes stale; zero when it already is.
    pub fn stale_in(&self, now: DateTime<Utc>, interval: Duration) -> Duration {
        let Some(checked) = self.last_checked_at else {
            return Duration::ZERO;
        };
        match (now - checked).to_std() {
            Ok(age) => interval.saturating_sub(age),
            Err(_) => interval,
        }
    }

    /// A fresh negative answer; callers use it to shorten the next push.
    pub fn known_down(&self, now: DateTime<Utc>, interval: Duration) -> bool {
        !self.reachable && self.is_fresh(now, interval)
    }
}

pub struct LivenessProber {
    client: CompanionClient,
    timeout: Duration,
    interval: Duration,
    state: watch::Sender<LivenessState>,
    refreshing: AtomicBool,
}

impl LivenessProber {
    pub fn new(client: CompanionClient, timeout: Duration, interval: Duration) -> Arc<Self> {
        let (state, _) = watch::channel(LivenessState::default());
        Arc::new(Self {
            client,
            timeout,
            interval,
            state,
            refreshing: AtomicBool::new(false),
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Current cached state; never touches the network.
    pub fn state(&self) -> LivenessState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<LivenessState> {
        self.state.subscribe()
    }

    /// Ask the service right now and publish the answer.
    pub async fn probe(&self) -> LivenessState {
        let result = self.client.status(self.timeout).await;
        let now = Utc::now();
        let mut published = LivenessState::default();
        self.state.send_modify(|s| {
            let was_reachable = s.reachable;
            match &result {
                Ok(()) => {
                    if !was_reachable {
                        tracing::info!("companion service reachable at {}", self.client.base_url());
                    }
                    s.reachable = true;
                    s.consecutive_failures = 0;
                }
                Err(e) => {
                    if was_reachable || s.last_checked_at.is_none() {
                        tracing::warn!("companion service unreachable: {}", e);
                    } else {
                        tracing::debug!("companion service still unreachable: {}", e);
                    }
                    s.reachable = false;
                    s.consecutive_failures = s.consecutive_failures.saturating_add(1);
                }
            }
            s.last_checked_at = Some(now);
            published = s.clone();
        });
        observability::record_probe(&published);
        published
    }

    /// Probe only when the cached answer is older than the interval. If
    /// another refresh is already running, answer from cache instead of
    /// issuing a second call.
    pub async fn refresh_if_stale(&self) -> LivenessState {
        let cached = self.state();
        if cached.is_fresh(Utc::now(), self.interval) {
            return cached;
        }
        self.try_refresh().await.unwrap_or(cached)
    }

    /// Single-flight probe: `None` when another refresh holds the slot.
    async fn try_refresh(&self) -> Option<LivenessState> {
        if self.refreshing.swap(true, Ordering::AcqRel) {
            return None;
        }
        // Released on drop, so a cancelled refresh does not wedge the slot.
        let _slot = RefreshSlot(&self.refreshing);
        Some(self.probe().await)
    }

    /// Non-blocking read. A stale cache schedules a background refresh but
    /// the answer still comes from the cache.
    pub fn is_likely_reachable(self: &Arc<Self>) -> bool {
        let cached = self.state();
        if !cached.is_fresh(Utc::now(), self.interval) {
            let prober = Arc::clone(self);
            tokio::spawn(async move {
                prober.refresh_if_stale().await;
            });
        }
        cached.reachable
    }

    /// Refresh the cache whenever it goes stale until the returned task is
    /// shut down. Shares the single-flight slot with on-demand refreshes, so
    /// the timer and a caller never probe inside the same interval.
    pub fn spawn(self: &Arc<Self>) -> ProberTask {
        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let prober = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut published = prober.subscribe();
            loop {
                let wait = prober.state().stale_in(Utc::now(), prober.interval);
                tokio::select! {
                    biased;
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                        continue;
                    }
                    _ = tokio::time::sleep(wait) => {}
                }

                if prober.state().is_fresh(Utc::now(), prober.interval) {
                    continue;
                }
                published.mark_unchanged();
                if prober.try_refresh().await.is_some() {
                    continue;
                }
                // An on-demand refresh is in flight; wait for its answer, or
                // one interval if that caller gave up before publishing.
                tokio::select! {
                    biased;
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                    _ = published.changed() => {}
                    _ = tokio::time::sleep(prober.interval) => {}
                }
            }
            tracing::debug!("liveness prober stopped");
        });
        ProberTask { shutdown, handle }
    }
}

struct RefreshSlot<'a>(&'a AtomicBool);

impl Drop for RefreshSlot<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Handle to the recurring probe; dropping it without `shutdown` still stops
/// the loop once the sender is gone.
pub struct ProberTask {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl ProberTask {
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.handle.await {
            tracing::warn!("liveness prober task ended abnormally: {}", e);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
