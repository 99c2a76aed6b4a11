pub mod auction_monitor;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;

use crate::config::{DurationSource, EnvDurationSource, WorkerConfig};
use crate::store::Store;

use self::auction_monitor::{AuctionMonitor, MonitorHandle};

/// How long shutdown waits for workers to finish their current tick.
#[cfg(test)]
const DRAIN_TIMEOUT: Duration = Duration::from_millis(10);
#[cfg(not(test))]
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerName {
    AuctionMonitor,
}

impl WorkerName {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AuctionMonitor => "auction_monitor",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerSpec {
    pub name: WorkerName,
    pub enabled: bool,
}

pub struct WorkerManager {
    store: Arc<Store>,
    durations: Arc<dyn DurationSource>,
    shutdown_rx: broadcast::Receiver<()>,
    config: WorkerConfig,
}

impl WorkerManager {
    pub fn new(
        store: Arc<Store>,
        shutdown_rx: broadcast::Receiver<()>,
        config: &WorkerConfig,
    ) -> Self {
        Self {
            store,
            durations: Arc::new(EnvDurationSource::new()),
            shutdown_rx,
            config: config.clone(),
        }
    }

    /// Replace the environment-backed duration source.
    pub fn with_duration_source(mut self, durations: Arc<dyn DurationSource>) -> Self {
        self.durations = durations;
        self
    }

    /// Single source of truth for the workers this process runs.
    pub fn planned_workers(&self) -> Vec<WorkerSpec> {
        if !self.config.is_leader {
            return Vec::new();
        }

        vec![WorkerSpec {
            name: WorkerName::AuctionMonitor,
            enabled: true,
        }]
    }

    /// Start every enabled worker, then block until shutdown and give the
    /// workers up to `DRAIN_TIMEOUT` to stop.
    pub async fn start(mut self) {
        if !self.config.is_leader {
            tracing::info!("Worker leader disabled; skipping worker startup");
            return;
        }

        let mut handles: Vec<(WorkerName, MonitorHandle)> = Vec::new();
        for spec in self.planned_workers() {
            if !spec.enabled {
                tracing::info!(name = spec.name.as_str(), "Skipping disabled worker");
                continue;
            }

            match spec.name {
                WorkerName::AuctionMonitor => {
                    let monitor = AuctionMonitor::new(self.store.clone(), self.durations.clone());
                    handles.push((spec.name, monitor.start(self.shutdown_rx.resubscribe())));
                }
            }
            tracing::info!(name = spec.name.as_str(), "Started worker");
        }

        tracing::info!(workers = handles.len(), "Worker manager started");
        let _ = self.shutdown_rx.recv().await;

        tracing::info!(
            "Worker manager shutting down, draining for up to {}s",
            DRAIN_TIMEOUT.as_secs()
        );
        for (name, handle) in handles {
            if tokio::time::timeout(DRAIN_TIMEOUT, handle.wait())
                .await
                .is_err()
            {
                tracing::warn!(
                    worker = name.as_str(),
                    "Worker did not stop within drain timeout"
                );
            }
        }
        tracing::info!("Worker manager stopped");
    }
}
