use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use forgeops_agent::{ConversationRequest, RequestKind};
use forgeops_core::{RequestId, ResourceName, Urgency};
use forgeops_realtime::{
    ChangeEvent, ChangeKind, ChannelError, InMemoryLiveSource, Refresh, SubscriptionPhase,
    ToggleProbe,
};
use forgeops_runtime::{AppContext, RuntimeConfig, RuntimeError};
use serde_json::json;
use tokio::sync::mpsc;

struct TestApp {
    ctx: AppContext,
    source: Arc<InMemoryLiveSource>,
    probe: Arc<ToggleProbe>,
    refreshes: Arc<AtomicUsize>,
}

impl TestApp {
    fn start(config: RuntimeConfig) -> Self {
        forgeops_runtime::init_logging();

        let source = Arc::new(InMemoryLiveSource::new());
        let probe = Arc::new(ToggleProbe::new(true));
        let ctx = AppContext::start(config, probe.clone(), source.clone())
            .expect("context should start");

        Self {
            ctx,
            source,
            probe,
            refreshes: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn refresh(&self) -> impl Refresh {
        let refreshes = Arc::clone(&self.refreshes);
        move || {
            let refreshes = Arc::clone(&refreshes);
            async move {
                refreshes.fetch_add(1, Ordering::SeqCst);
                Ok::<(), anyhow::Error>(())
            }
        }
    }

    fn refreshes(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }
}

fn request(id: &str, urgency: Urgency) -> ConversationRequest {
    ConversationRequest::new(format!("handle {id}"), RequestKind::Request)
        .with_id(RequestId::new(id).unwrap())
        .with_urgency(urgency)
}

fn drain_ids(app: &TestApp) -> Vec<String> {
    std::iter::from_fn(|| app.ctx.request_queue().dequeue())
        .map(|r| r.id.into_inner())
        .collect()
}

fn inventory() -> ResourceName {
    ResourceName::new("inventory_items").unwrap()
}

#[tokio::test]
async fn higher_urgency_is_dequeued_first() {
    let app = TestApp::start(RuntimeConfig::default());
    let queue = app.ctx.request_queue();

    queue.enqueue(request("B", Urgency::High)).unwrap();
    queue.enqueue(request("A", Urgency::Critical)).unwrap();

    assert_eq!(drain_ids(&app), ["A", "B"]);
}

#[tokio::test]
async fn equal_urgency_is_fifo() {
    let app = TestApp::start(RuntimeConfig::default());
    for id in ["1", "2", "3"] {
        app.ctx
            .request_queue()
            .enqueue(request(id, Urgency::Medium))
            .unwrap();
    }

    assert_eq!(drain_ids(&app), ["1", "2", "3"]);
}

#[tokio::test]
async fn mixed_urgencies_drain_in_priority_then_arrival_order() {
    let app = TestApp::start(RuntimeConfig::default());
    let levels = [
        Urgency::Low,
        Urgency::Critical,
        Urgency::Medium,
        Urgency::High,
        Urgency::Critical,
    ];
    for (i, urgency) in levels.into_iter().enumerate() {
        app.ctx
            .request_queue()
            .enqueue(request(&(i + 1).to_string(), urgency))
            .unwrap();
    }

    assert_eq!(drain_ids(&app), ["2", "5", "4", "3", "1"]);
}

#[tokio::test]
async fn full_queue_evicts_a_lowest_urgency_request() {
    let config = RuntimeConfig {
        queue_max_size: 2,
        ..RuntimeConfig::default()
    };
    let app = TestApp::start(config);
    let queue = app.ctx.request_queue();

    queue.enqueue(request("1", Urgency::Low)).unwrap();
    queue.enqueue(request("2", Urgency::Low)).unwrap();
    let evicted = queue
        .enqueue(request("3", Urgency::Medium))
        .unwrap()
        .expect("one low request should be evicted");

    assert_eq!(queue.len(), 2);
    assert!(queue.contains(&RequestId::new("3").unwrap()));
    assert!(["1", "2"].contains(&evicted.id.as_str()));
    assert_eq!(queue.stats().count(Urgency::Low), 1);
}

#[tokio::test]
async fn peek_does_not_consume() {
    let app = TestApp::start(RuntimeConfig::default());
    let queue = app.ctx.request_queue();
    queue.enqueue(request("only", Urgency::High)).unwrap();

    let peeked = queue.peek().unwrap();
    assert_eq!(queue.len(), 1);
    let dequeued = queue.dequeue().unwrap();

    assert_eq!(peeked.id, dequeued.id);
    assert!(queue.is_empty());
}

#[tokio::test(start_paused = true)]
async fn repeated_channel_failures_converge_on_polling() {
    let app = TestApp::start(RuntimeConfig::default());
    app.source
        .fail_always(ChannelError::Transport("websocket refused".into()));

    let handle = app
        .ctx
        .subscriptions()
        .watch(inventory(), (), app.refresh())
        .unwrap();
    let degraded = handle.wait_for(|s| s.is_using_fallback).await.unwrap();

    assert_eq!(degraded.phase, SubscriptionPhase::FallbackPolling);
    assert_eq!(degraded.retry_count, 3);
    let attempts = app.source.subscribe_attempts();

    tokio::time::sleep(Duration::from_secs(30 * 4 + 1)).await;

    assert_eq!(app.refreshes(), 4);
    assert_eq!(handle.retry_count(), 3);
    assert_eq!(app.source.subscribe_attempts(), attempts);
}

#[tokio::test(start_paused = true)]
async fn nothing_fires_after_teardown() {
    let app = TestApp::start(RuntimeConfig::default());
    let (tx, mut rx) = mpsc::unbounded_channel::<ChangeEvent>();
    let mut handle = app
        .ctx
        .subscriptions()
        .watch(inventory(), tx, app.refresh())
        .unwrap();
    handle
        .wait_for(|s| s.phase == SubscriptionPhase::Connected)
        .await
        .unwrap();

    handle.stop().await;
    let delivered = app
        .source
        .publish(&inventory(), ChangeKind::Insert, json!({ "sku": "A-1" }));
    tokio::time::sleep(Duration::from_secs(600)).await;

    assert_eq!(delivered, 0);
    assert!(rx.recv().await.is_none());
    assert_eq!(app.refreshes(), 0);
}

#[tokio::test(start_paused = true)]
async fn unhealthy_backend_routes_new_subscriptions_to_polling() {
    let app = TestApp::start(RuntimeConfig::default());
    app.probe.set_reachable(false);

    // Default threshold: three failed checks, 30s apart.
    let mut health = app.ctx.health().subscribe();
    health.wait_for(|s| !s.is_healthy).await.unwrap();

    // The backend is back, but the health signal is still failing.
    app.probe.set_reachable(true);
    let handle = app
        .ctx
        .subscriptions()
        .watch(inventory(), (), app.refresh())
        .unwrap();
    handle
        .wait_for(|s| s.phase == SubscriptionPhase::FallbackPolling)
        .await
        .unwrap();
    assert_eq!(app.source.subscribe_attempts(), 0);

    // The next check recovers; a manual retry now goes live.
    health.wait_for(|s| s.is_healthy).await.unwrap();
    handle.retry_realtime().unwrap();
    handle
        .wait_for(|s| s.phase == SubscriptionPhase::Connected)
        .await
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_health_checks_and_is_idempotent() {
    let app = TestApp::start(RuntimeConfig::default());
    tokio::time::sleep(Duration::from_secs(1)).await;

    app.ctx.shutdown().await;
    let probes = app.probe.attempts();
    app.ctx.shutdown().await;
    tokio::time::sleep(Duration::from_secs(300)).await;

    assert!(app.ctx.is_shut_down());
    assert!(app.ctx.health().is_stopped());
    assert_eq!(app.probe.attempts(), probes);
}

#[test]
fn starting_outside_a_runtime_fails() {
    let result = AppContext::start(
        RuntimeConfig::default(),
        Arc::new(ToggleProbe::new(true)),
        Arc::new(InMemoryLiveSource::new()),
    );

    assert!(matches!(result, Err(RuntimeError::NoRuntime)));
}

#[tokio::test]
async fn invalid_config_is_rejected() {
    let config = RuntimeConfig {
        queue_max_size: 0,
        ..RuntimeConfig::default()
    };
    let result = AppContext::start(
        config,
        Arc::new(ToggleProbe::new(true)),
        Arc::new(InMemoryLiveSource::new()),
    );

    assert!(matches!(result, Err(RuntimeError::Config(_))));
}
