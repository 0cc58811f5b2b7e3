//! Heartbeat service: the serial event pipeline.
//!
//! One consumer task owns the throttle and handles queued events in order:
//! throttle → project → ensure_cli → credentials → dispatch. Throttle state
//! only advances when the heartbeat process actually started. Every failure
//! drops the current event and is logged; nothing is retried or re-queued.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use wakabeat_core::{
    HeartbeatConfig, HeartbeatEvent, HeartbeatThrottle, SendReason, ThrottleDecision,
    resolve_project,
};
use wakabeat_tool::{HeartbeatLauncher, Provisioner, ToolError, dispatch, require_credentials};

/// Events waiting beyond this are dropped at enqueue time.
pub const QUEUE_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Dispatched(SendReason),
    Throttled,
    /// Another task is downloading wakatime-cli right now.
    DownloadPending,
    MissingDependency,
    MissingCredentials,
    LaunchFailed,
}

/// Snapshot exposed through the `status` RPC.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ServiceStatus {
    pub last_file_path: Option<String>,
    pub last_heartbeat_at: Option<DateTime<Utc>>,
    pub dispatched: u64,
    pub throttled: u64,
    pub failed: u64,
    pub download_in_progress: bool,
}

pub struct HeartbeatService<L> {
    throttle: HeartbeatThrottle,
    provisioner: Arc<Provisioner>,
    launcher: L,
    plugin: String,
    status: ServiceStatus,
    status_tx: watch::Sender<ServiceStatus>,
}

impl<L: HeartbeatLauncher> HeartbeatService<L> {
    pub fn new(config: &HeartbeatConfig, provisioner: Arc<Provisioner>, launcher: L) -> Self {
        let (status_tx, _) = watch::channel(ServiceStatus::default());
        Self {
            throttle: HeartbeatThrottle::from_config(config),
            provisioner,
            launcher,
            plugin: config.plugin_identity(),
            status: ServiceStatus::default(),
            status_tx,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ServiceStatus> {
        self.status_tx.subscribe()
    }

    pub fn throttle(&self) -> &HeartbeatThrottle {
        &self.throttle
    }

    /// Run one event through the pipeline and publish the resulting status.
    pub async fn handle(&mut self, event: &HeartbeatEvent) -> Outcome {
        let outcome = self.process(event).await;
        self.publish(outcome);
        outcome
    }

    async fn process(&mut self, event: &HeartbeatEvent) -> Outcome {
        let reason = match self.throttle.decide(event) {
            ThrottleDecision::Send(reason) => reason,
            ThrottleDecision::Suppress { remaining } => {
                tracing::debug!(
                    entity = %event.file_path,
                    remaining_secs = remaining.num_seconds(),
                    "heartbeat throttled"
                );
                return Outcome::Throttled;
            }
        };

        let project = resolve_project(Path::new(&event.file_path));

        let cli = match self.provisioner.ensure_cli().await {
            Ok(path) => path,
            Err(ToolError::DownloadInProgress) => {
                tracing::debug!(
                    entity = %event.file_path,
                    "wakatime-cli not available yet, download in progress"
                );
                return Outcome::DownloadPending;
            }
            Err(e) => {
                tracing::warn!(entity = %event.file_path, "{e}");
                return Outcome::MissingDependency;
            }
        };

        if let Err(e) = require_credentials(self.provisioner.paths()) {
            tracing::warn!("{e}; add an api_key before heartbeats can be sent");
            return Outcome::MissingCredentials;
        }

        if dispatch(&self.launcher, &cli, event, &self.plugin, project.as_deref()) {
            self.throttle.record_sent(event);
            tracing::info!(
                entity = %event.file_path,
                project = project.as_deref().unwrap_or("-"),
                reason = reason.as_str(),
                "heartbeat sent"
            );
            Outcome::Dispatched(reason)
        } else {
            self.provisioner.invalidate();
            Outcome::LaunchFailed
        }
    }

    fn publish(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Dispatched(_) => self.status.dispatched += 1,
            Outcome::Throttled => self.status.throttled += 1,
            Outcome::DownloadPending
            | Outcome::MissingDependency
            | Outcome::MissingCredentials
            | Outcome::LaunchFailed => self.status.failed += 1,
        }
        let state = self.throttle.state();
        self.status.last_file_path = state.last_file_path.clone();
        self.status.last_heartbeat_at = state.last_heartbeat_at;
        self.status.download_in_progress = self.provisioner.download_in_progress();
        self.status_tx.send_replace(self.status.clone());
    }

    /// Consume events until every sender is dropped.
    pub async fn run(mut self, mut events: mpsc::Receiver<HeartbeatEvent>) {
        while let Some(event) = events.recv().await {
            self.handle(&event).await;
        }
        self.throttle.reset();
        tracing::info!("heartbeat queue closed");
    }
}

/// Cloneable front door to a running service.
#[derive(Clone)]
pub struct ServiceHandle {
    events: mpsc::Sender<HeartbeatEvent>,
    status: watch::Receiver<ServiceStatus>,
    provisioner: Arc<Provisioner>,
}

impl ServiceHandle {
    /// Queue an event without waiting. A full queue drops the event.
    pub fn enqueue(&self, event: HeartbeatEvent) -> anyhow::Result<()> {
        self.events.try_send(event).map_err(|e| match e {
            mpsc::error::TrySendError::Full(ev) => {
                tracing::warn!(entity = %ev.file_path, "heartbeat queue full, dropping event");
                anyhow::anyhow!("heartbeat queue is full")
            }
            mpsc::error::TrySendError::Closed(_) => anyhow::anyhow!("heartbeat service stopped"),
        })
    }

    pub fn status(&self) -> ServiceStatus {
        let mut status = self.status.borrow().clone();
        status.download_in_progress = self.provisioner.download_in_progress();
        status
    }

    pub fn provisioner(&self) -> &Provisioner {
        &self.provisioner
    }
}

/// Start the consumer task and return its handle.
pub fn spawn_service<L: HeartbeatLauncher + 'static>(
    service: HeartbeatService<L>,
) -> (ServiceHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
    let handle = ServiceHandle {
        events: tx,
        status: service.subscribe(),
        provisioner: Arc::clone(&service.provisioner),
    };
    let task = tokio::spawn(service.run(rx));
    (handle, task)
}
