use std::sync::Arc;
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use anyhow::Context as _;
use eframe::egui::Context;
use paynet_explorer::metrics::MetricsSnapshot;
use paynet_explorer::pipeline::{
    CycleState, HttpSource, PipelineMessage, PollConfig, Subscription, spawn_poller,
};
use tokio::sync::oneshot;

/// Background thread running the poller on its own current-thread runtime.
/// The UI reads results through a [`Subscription`] and never blocks.
pub(super) struct PollWorker {
    subscription: Subscription,
    shutdown: Option<oneshot::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl PollWorker {
    pub(super) fn start(config: PollConfig, ctx: Context) -> anyhow::Result<Self> {
        let source = HttpSource::new(config.backend_url.clone(), config.http_timeout)
            .context("failed to build the HTTP client")?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("failed to build the polling runtime")?;

        let (subscription_tx, subscription_rx) = mpsc::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let thread = thread::Builder::new()
            .name("metrics-poller".to_owned())
            .spawn(move || {
                runtime.block_on(async move {
                    let poller = spawn_poller(source, config);
                    if subscription_tx.send(poller.subscribe()).is_err() {
                        return;
                    }

                    // Wake the UI whenever something new is there to show.
                    let mut snapshots = poller.subscribe();
                    let mut messages = poller.subscribe();
                    tokio::select! {
                        _ = shutdown_rx => {}
                        () = async {
                            while snapshots.next_snapshot().await.is_some() {
                                ctx.request_repaint();
                            }
                        } => {}
                        () = async {
                            while messages.next_message().await.is_some() {
                                ctx.request_repaint();
                            }
                        } => {}
                    }
                    tracing::debug!("poll worker stopping");
                });
            })
            .context("failed to spawn the poll worker thread")?;

        let subscription = subscription_rx
            .recv()
            .context("poll worker exited before subscribing")?;

        Ok(Self {
            subscription,
            shutdown: Some(shutdown_tx),
            thread: Some(thread),
        })
    }

    pub(super) fn take_fresh(&mut self) -> Option<Arc<MetricsSnapshot>> {
        self.subscription.take_fresh()
    }

    pub(super) fn drain_messages(&mut self) -> Vec<PipelineMessage> {
        std::iter::from_fn(|| self.subscription.try_message()).collect()
    }

    pub(super) fn state(&self) -> CycleState {
        self.subscription.state()
    }

    pub(super) fn is_running(&self) -> bool {
        self.thread
            .as_ref()
            .is_some_and(|thread| !thread.is_finished())
    }
}

impl Drop for PollWorker {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            tracing::warn!("poll worker panicked");
        }
    }
}
