use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use paynet_explorer::error::TransportError;
use paynet_explorer::pipeline::{
    MessageKind, PipelineMessage, PollConfig, SnapshotSource, Subscription, spawn_poller,
};
use serde_json::{Value, json};
use tokio::time::Instant;

const ALICE: &str = "0x00000000000000000000000000000000000000a1";
const BOB: &str = "0x00000000000000000000000000000000000000b2";

#[derive(Default)]
struct ScriptedSource {
    responses: Mutex<VecDeque<Result<Value, TransportError>>>,
    started: Mutex<Vec<Instant>>,
    latency: Duration,
}

impl ScriptedSource {
    fn new(responses: Vec<Result<Value, TransportError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            ..Self::default()
        })
    }

    fn slow(responses: Vec<Result<Value, TransportError>>, latency: Duration) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            latency,
            ..Self::default()
        })
    }

    fn calls(&self) -> usize {
        self.started.lock().unwrap().len()
    }

    fn started_at(&self, call: usize, origin: Instant) -> Duration {
        self.started.lock().unwrap()[call] - origin
    }
}

impl SnapshotSource for ScriptedSource {
    fn fetch(&self) -> impl Future<Output = Result<Value, TransportError>> + Send {
        async move {
            self.started.lock().unwrap().push(Instant::now());
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(unreachable_backend()))
        }
    }
}

fn unreachable_backend() -> TransportError {
    TransportError::Request {
        url: "http://metrics.invalid/json".into(),
        reason: "connection refused".into(),
    }
}

fn config() -> PollConfig {
    PollConfig {
        poll_interval: Duration::from_secs(10),
        max_retries: 3,
        ..PollConfig::default()
    }
}

fn document() -> Value {
    json!({
        "overall_metrics": {
            "num_token_networks": 1,
            "num_channels_opened": 1,
            "num_channels_closed": 0,
            "num_channels_settled": 0,
            "num_nodes_with_open_channels": 2,
            "avg_channels_per_node": 1.0,
            "top_nodes_by_channels": [{"address": ALICE, "channels": 1}]
        },
        "networks": [{
            "address": "0x0000000000000000000000000000000000000042",
            "token": {"address": "0x00000000000000000000000000000000000000ff",
                      "name": "Test Token", "symbol": "TTT", "decimals": 18},
            "num_channels_total": 1,
            "num_channels_opened": 1,
            "num_channels_closed": 0,
            "num_channels_settled": 0,
            "total_deposits": 3,
            "avg_deposit_per_channel": 3,
            "avg_deposit_per_node": 1.5,
            "avg_channels_per_node": 1,
            "channels": [{
                "channel_identifier": 7, "status": "opened",
                "participant1": ALICE, "participant2": BOB,
                "deposit1": 2000000000000000000u64, "deposit2": 1000000000000000000u64
            }],
            "nodes": {
                ALICE: {"opened": 1, "closed": 0, "settled": 0, "online": true},
                BOB: {"opened": 1, "closed": 0, "settled": 0}
            }
        }]
    })
}

async fn expect_message(subscription: &mut Subscription) -> PipelineMessage {
    subscription
        .next_message()
        .await
        .expect("poller should still be running")
}

#[tokio::test(start_paused = true)]
async fn one_fetch_serves_every_subscriber() {
    let source = ScriptedSource::new(vec![Ok(document())]);
    let origin = Instant::now();

    let handle = spawn_poller(Arc::clone(&source), config());
    let mut first = handle.subscribe();
    let second = handle.subscribe();

    let snapshot = first.next_snapshot().await.expect("snapshot");
    assert_eq!(source.calls(), 1);
    assert_eq!(source.started_at(0, origin), Duration::ZERO);
    assert_eq!(snapshot.overall.total_open_channels, 1);
    assert_eq!(snapshot.networks[0].summary.total_deposits, 3.0);

    let late = handle.subscribe();
    let replayed = late.latest().expect("late subscriber sees the latest snapshot");
    assert!(Arc::ptr_eq(&snapshot, &replayed));
    assert!(second.latest().is_some_and(|seen| Arc::ptr_eq(&seen, &snapshot)));
}

#[tokio::test(start_paused = true)]
async fn exhausted_retries_report_once_per_cycle() {
    let source = ScriptedSource::new(Vec::new());
    let origin = Instant::now();

    let handle = spawn_poller(Arc::clone(&source), config());
    let mut subscription = handle.subscribe();

    let message = expect_message(&mut subscription).await;
    assert_eq!(message.kind, MessageKind::Transport);
    assert_eq!(message.title, "Network error");
    assert_eq!(message.cycle, 1);
    assert_eq!(source.calls(), 4);
    for (call, expected) in [0, 10, 20, 30].into_iter().enumerate() {
        assert_eq!(source.started_at(call, origin), Duration::from_secs(expected));
    }
    assert!(subscription.try_message().is_none());
    assert!(subscription.latest().is_none());

    let message = expect_message(&mut subscription).await;
    assert_eq!(message.cycle, 2);
    assert_eq!(source.calls(), 8);
    assert_eq!(source.started_at(4, origin), Duration::from_secs(40));
}

#[tokio::test(start_paused = true)]
async fn a_retry_that_succeeds_publishes_without_a_message() {
    let source = ScriptedSource::new(vec![Err(unreachable_backend()), Ok(document())]);
    let origin = Instant::now();

    let handle = spawn_poller(Arc::clone(&source), config());
    let mut subscription = handle.subscribe();

    let snapshot = subscription.next_snapshot().await.expect("snapshot");
    assert_eq!(snapshot.networks.len(), 1);
    assert_eq!(source.started_at(1, origin), Duration::from_secs(10));
    assert!(subscription.try_message().is_none());
}

#[tokio::test(start_paused = true)]
async fn malformed_documents_are_not_retried() {
    let source = ScriptedSource::new(vec![Ok(json!({"overall_metrics": {}, "networks": 3}))]);

    let handle = spawn_poller(Arc::clone(&source), config());
    let mut subscription = handle.subscribe();

    let message = expect_message(&mut subscription).await;
    assert_eq!(message.kind, MessageKind::Schema);
    assert_eq!(message.title, "Malformed API data");
    assert!(message.description.contains("type '.networks'; should be array."));
    assert_eq!(source.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn slow_cycles_never_overlap() {
    let source = ScriptedSource::slow(vec![Ok(document()), Ok(document())], Duration::from_secs(25));
    let origin = Instant::now();

    let handle = spawn_poller(Arc::clone(&source), config());
    let mut subscription = handle.subscribe();

    subscription.next_snapshot().await.expect("first snapshot");
    subscription.next_snapshot().await.expect("second snapshot");

    assert_eq!(source.calls(), 2);
    assert_eq!(source.started_at(1, origin), Duration::from_secs(35));
}

#[tokio::test(start_paused = true)]
async fn dropping_the_handle_stops_polling() {
    let source = ScriptedSource::new(Vec::new());
    let handle = spawn_poller(Arc::clone(&source), config());
    let mut subscription = handle.subscribe();

    expect_message(&mut subscription).await;
    drop(handle);
    tokio::time::sleep(Duration::from_secs(120)).await;

    assert_eq!(source.calls(), 4);
    assert!(subscription.next_message().await.is_none());
}
