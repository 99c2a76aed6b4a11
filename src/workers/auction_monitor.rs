use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::DurationSource;
use crate::constants::{MONITOR_TICK_INTERVAL, MONITOR_TICK_TIMEOUT};
use crate::expiration;
use crate::store::operations::auctions::AuctionStore;
use crate::store::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Running,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepOutcome {
    pub duration_minutes: i64,
    pub cutoff: DateTime<Utc>,
    pub completed: u64,
}

/// One sweep: resolve the current duration, derive the cutoff, and complete
/// everything that expired before it.
pub fn sweep_once(
    store: &dyn AuctionStore,
    durations: &dyn DurationSource,
    now: DateTime<Utc>,
) -> Result<SweepOutcome, StoreError> {
    let duration_minutes = durations.current_duration_minutes();
    let cutoff = expiration::cutoff(duration_minutes, now);
    let completed = store.complete_expired_active(cutoff)?;
    Ok(SweepOutcome {
        duration_minutes,
        cutoff,
        completed,
    })
}

/// Why a tick produced no outcome.
#[derive(Debug, thiserror::Error)]
enum TickError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("sweep task panicked: {0}")]
    Panicked(#[from] tokio::task::JoinError),
}

/// Periodically closes auctions whose bidding window has elapsed.
///
/// A monitor runs once: `start` consumes it, and after it stops a new
/// instance is needed to resume sweeping.
pub struct AuctionMonitor {
    store: Arc<dyn AuctionStore>,
    durations: Arc<dyn DurationSource>,
    tick_timeout: Duration,
}

/// Handle to a running monitor task.
pub struct MonitorHandle {
    running: Arc<AtomicBool>,
    join: JoinHandle<()>,
}

impl MonitorHandle {
    pub fn state(&self) -> MonitorState {
        if self.running.load(Ordering::SeqCst) {
            MonitorState::Running
        } else {
            MonitorState::Stopped
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == MonitorState::Running
    }

    /// Wait for the monitor task to finish. Only returns once the shutdown
    /// channel has fired or closed and the last sweep has finished writing.
    pub async fn wait(self) {
        if let Err(e) = self.join.await {
            tracing::error!(error = %e, "auction_monitor task panicked");
        }
    }
}

/// Flips the shared flag to stopped on every exit path, unwinding included.
struct StoppedOnDrop(Arc<AtomicBool>);

impl Drop for StoppedOnDrop {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl AuctionMonitor {
    pub fn new(store: Arc<dyn AuctionStore>, durations: Arc<dyn DurationSource>) -> Self {
        Self {
            store,
            durations,
            tick_timeout: MONITOR_TICK_TIMEOUT,
        }
    }

    /// Deadline after which a slow sweep is reported as `StoreError::Timeout`.
    /// The sweep itself is still awaited before the next tick.
    pub fn with_tick_timeout(mut self, tick_timeout: Duration) -> Self {
        self.tick_timeout = tick_timeout;
        self
    }

    /// Spawn the sweep loop and return immediately. The loop ends when
    /// `shutdown_rx` receives a message or its sender side is dropped.
    pub fn start(self, shutdown_rx: broadcast::Receiver<()>) -> MonitorHandle {
        let running = Arc::new(AtomicBool::new(true));
        let guard = StoppedOnDrop(running.clone());

        let join = tokio::spawn(async move {
            let _guard = guard;
            self.run(shutdown_rx).await;
        });

        MonitorHandle { running, join }
    }

    async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) {
        tracing::info!(
            interval_ms = MONITOR_TICK_INTERVAL.as_millis() as u64,
            timeout_ms = self.tick_timeout.as_millis() as u64,
            "auction_monitor: started"
        );

        let mut interval = tokio::time::interval(MONITOR_TICK_INTERVAL);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => break,
                _ = interval.tick() => self.tick().await,
            }
        }

        tracing::info!("auction_monitor: stopped");
    }

    async fn tick(&self) {
        match self.sweep().await {
            Ok(outcome) if outcome.completed > 0 => tracing::info!(
                completed = outcome.completed,
                duration_minutes = outcome.duration_minutes,
                cutoff = %outcome.cutoff,
                "auction_monitor: completed expired auctions"
            ),
            Ok(outcome) => tracing::debug!(
                duration_minutes = outcome.duration_minutes,
                cutoff = %outcome.cutoff,
                "auction_monitor: nothing expired"
            ),
            Err(e) => tracing::error!(error = %e, "auction_monitor: sweep failed"),
        }
    }

    /// Run one sweep on the blocking pool. Never returns while that sweep can
    /// still write: past the deadline the same task is awaited to completion.
    async fn sweep(&self) -> Result<SweepOutcome, TickError> {
        let store = self.store.clone();
        let durations = self.durations.clone();
        let mut task = tokio::task::spawn_blocking(move || {
            sweep_once(store.as_ref(), durations.as_ref(), Utc::now())
        });

        match tokio::time::timeout(self.tick_timeout, &mut task).await {
            Ok(joined) => Ok(joined??),
            Err(_) => {
                let timeout = StoreError::Timeout {
                    operation: "complete_expired_active",
                    secs: self.tick_timeout.as_secs(),
                };
                tracing::error!(error = %timeout, "auction_monitor: sweep overran, waiting for it");

                match task.await? {
                    Ok(outcome) => tracing::warn!(
                        completed = outcome.completed,
                        "auction_monitor: overrunning sweep finished"
                    ),
                    Err(e) => {
                        tracing::error!(error = %e, "auction_monitor: overrunning sweep failed")
                    }
                }
                Err(timeout.into())
            }
        }
    }
}
