//! Periodic polling of the metrics backend.
//!
//! A single task owns the whole cycle: fetch (with retries), validate,
//! aggregate, publish. Subscribers share its results through a watch
//! channel, so a late subscriber immediately sees the latest snapshot and
//! the backend is hit once per cycle no matter how many views are open.

mod message;
mod source;

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use crate::error::{PipelineError, TransportError};
use crate::metrics::MetricsSnapshot;
use crate::metrics::snapshot::{build_snapshot, validate_snapshot};

pub use message::{MessageKind, PipelineMessage};
pub use source::{HttpSource, SnapshotSource};

pub const DEFAULT_BACKEND_URL: &str = "http://explorer.raiden.network:4567/json";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10_000);
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_millis(60_000);
pub const DEFAULT_MAX_RETRIES: usize = 3;

const MESSAGE_BUFFER: usize = 16;

#[derive(Clone, Debug)]
pub struct PollConfig {
    pub backend_url: String,
    /// Pause between the end of one cycle and the start of the next. Also
    /// used as the delay before each retry.
    pub poll_interval: Duration,
    pub http_timeout: Duration,
    pub max_retries: usize,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_owned(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    Fetching { attempt: usize },
    Retrying { attempt: usize },
    Validating,
    Aggregating,
    Emitting,
    Failed,
}

pub struct Subscription {
    snapshots: watch::Receiver<Option<Arc<MetricsSnapshot>>>,
    messages: broadcast::Receiver<PipelineMessage>,
    state: watch::Receiver<CycleState>,
}

impl Subscription {
    pub fn latest(&self) -> Option<Arc<MetricsSnapshot>> {
        self.snapshots.borrow().clone()
    }

    pub fn take_fresh(&mut self) -> Option<Arc<MetricsSnapshot>> {
        if self.snapshots.has_changed().unwrap_or(false) {
            self.snapshots.borrow_and_update().clone()
        } else {
            None
        }
    }

    /// Waits for a snapshot newer than the one last seen. `None` once the
    /// poller is gone.
    pub async fn next_snapshot(&mut self) -> Option<Arc<MetricsSnapshot>> {
        loop {
            self.snapshots.changed().await.ok()?;
            if let Some(snapshot) = self.snapshots.borrow_and_update().clone() {
                return Some(snapshot);
            }
        }
    }

    pub async fn next_message(&mut self) -> Option<PipelineMessage> {
        loop {
            match self.messages.recv().await {
                Ok(message) => return Some(message),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "pipeline messages dropped for a slow subscriber");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    pub fn try_message(&mut self) -> Option<PipelineMessage> {
        loop {
            match self.messages.try_recv() {
                Ok(message) => return Some(message),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }

    pub fn state(&self) -> CycleState {
        *self.state.borrow()
    }
}

/// Owns the polling task; dropping it stops polling.
pub struct PollerHandle {
    snapshots: watch::Receiver<Option<Arc<MetricsSnapshot>>>,
    messages: broadcast::Sender<PipelineMessage>,
    state: watch::Receiver<CycleState>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            snapshots: self.snapshots.clone(),
            messages: self.messages.subscribe(),
            state: self.state.clone(),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Starts polling on the current tokio runtime. The first cycle runs
/// immediately.
pub fn spawn_poller<S: SnapshotSource>(source: S, config: PollConfig) -> PollerHandle {
    let (snapshot_tx, snapshots) = watch::channel(None);
    let (message_tx, _) = broadcast::channel(MESSAGE_BUFFER);
    let (state_tx, state) = watch::channel(CycleState::Idle);

    let poller = Poller {
        source,
        config,
        snapshot_tx,
        message_tx: message_tx.clone(),
        state_tx,
        cycle: 0,
    };
    let task = tokio::spawn(poller.run());

    PollerHandle {
        snapshots,
        messages: message_tx,
        state,
        task,
    }
}

struct Poller<S> {
    source: S,
    config: PollConfig,
    snapshot_tx: watch::Sender<Option<Arc<MetricsSnapshot>>>,
    message_tx: broadcast::Sender<PipelineMessage>,
    state_tx: watch::Sender<CycleState>,
    cycle: u64,
}

impl<S: SnapshotSource> Poller<S> {
    async fn run(mut self) {
        loop {
            self.cycle += 1;
            match self.run_cycle().await {
                Ok(snapshot) => {
                    tracing::info!(
                        cycle = self.cycle,
                        networks = snapshot.networks.len(),
                        open_channels = snapshot.overall.total_open_channels,
                        "metrics snapshot published"
                    );
                    self.publish(snapshot);
                    self.state_tx.send_replace(CycleState::Idle);
                }
                Err(error) => {
                    tracing::error!(cycle = self.cycle, %error, "poll cycle failed");
                    self.state_tx.send_replace(CycleState::Failed);
                    // No receivers is fine; messages are not replayed.
                    let _ = self
                        .message_tx
                        .send(PipelineMessage::from_error(&error, self.cycle));
                }
            }

            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    fn publish(&self, snapshot: Arc<MetricsSnapshot>) {
        self.state_tx.send_replace(CycleState::Emitting);
        self.snapshot_tx.send_replace(Some(snapshot));
    }

    async fn run_cycle(&self) -> Result<Arc<MetricsSnapshot>, PipelineError> {
        let document = self.fetch_with_retries().await?;

        self.state_tx.send_replace(CycleState::Validating);
        validate_snapshot(&document)?;

        self.state_tx.send_replace(CycleState::Aggregating);
        Ok(Arc::new(build_snapshot(document)?))
    }

    async fn fetch_with_retries(&self) -> Result<Value, TransportError> {
        let mut attempt = 0;
        loop {
            self.state_tx.send_replace(CycleState::Fetching { attempt });
            match self.source.fetch().await {
                Ok(document) => return Ok(document),
                Err(error) if attempt < self.config.max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        cycle = self.cycle,
                        attempt,
                        max = self.config.max_retries,
                        %error,
                        "fetch failed, retrying"
                    );
                    self.state_tx.send_replace(CycleState::Retrying { attempt });
                    tokio::time::sleep(self.config.poll_interval).await;
                }
                Err(error) => return Err(error),
            }
        }
    }
}
