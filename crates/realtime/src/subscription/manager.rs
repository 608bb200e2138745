//! Entry point for watching resources.

use std::fmt;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use forgeops_core::ResourceName;

use crate::channel::LiveSource;
use crate::error::SubscriptionError;
use crate::health::HealthSignal;
use crate::probe::Probe;

use super::actor::{Collaborators, Command, SubscriptionActor};
use super::config::SubscriptionConfig;
use super::handler::{ChangeHandler, Refresh};
use super::state::{SubscriptionPhase, SubscriptionState};

/// Creates subscriptions against one live source.
///
/// Cheap to clone; every clone shares the same collaborators.
#[derive(Clone)]
pub struct SubscriptionManager {
    source: Arc<dyn LiveSource>,
    reachability: Arc<dyn Probe>,
    health: Option<Arc<dyn HealthSignal>>,
    config: SubscriptionConfig,
}

impl SubscriptionManager {
    pub fn new(source: Arc<dyn LiveSource>, reachability: Arc<dyn Probe>) -> Self {
        Self {
            source,
            reachability,
            health: None,
            config: SubscriptionConfig::default(),
        }
    }

    /// Skip live attempts while `health` reports unhealthy.
    pub fn with_health(mut self, health: Arc<dyn HealthSignal>) -> Self {
        self.health = Some(health);
        self
    }

    /// Default settings for subscriptions created by [`watch`](Self::watch).
    pub fn with_config(mut self, config: SubscriptionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &SubscriptionConfig {
        &self.config
    }

    /// Start watching `resource` with the manager's default settings.
    ///
    /// Must be called from within a tokio runtime.
    pub fn watch<H, R>(
        &self,
        resource: ResourceName,
        handler: H,
        refresh: R,
    ) -> Result<SubscriptionHandle, SubscriptionError>
    where
        H: ChangeHandler,
        R: Refresh,
    {
        self.watch_with_config(resource, handler, refresh, self.config.clone())
    }

    pub fn watch_with_config<H, R>(
        &self,
        resource: ResourceName,
        handler: H,
        refresh: R,
        config: SubscriptionConfig,
    ) -> Result<SubscriptionHandle, SubscriptionError>
    where
        H: ChangeHandler,
        R: Refresh,
    {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|_| SubscriptionError::NoRuntime)?;

        let (state_tx, state_rx) = watch::channel(SubscriptionState::new(resource.clone()));
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let actor = SubscriptionActor::new(
            resource.clone(),
            config,
            Collaborators {
                source: Arc::clone(&self.source),
                reachability: Arc::clone(&self.reachability),
                health: self.health.clone(),
            },
            Box::new(handler),
            Arc::new(refresh),
            command_rx,
            state_tx,
            cancel.clone(),
        );
        let task = runtime.spawn(actor.run());

        Ok(SubscriptionHandle {
            resource,
            state: state_rx,
            commands: command_tx,
            cancel,
            task: Some(task),
        })
    }
}

impl fmt::Debug for SubscriptionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionManager")
            .field("config", &self.config)
            .field("health_gated", &self.health.is_some())
            .finish_non_exhaustive()
    }
}

/// Owner of one running subscription.
///
/// Dropping the handle cancels the subscription; [`stop`](Self::stop) also
/// waits for it to finish.
pub struct SubscriptionHandle {
    resource: ResourceName,
    state: watch::Receiver<SubscriptionState>,
    commands: mpsc::UnboundedSender<Command>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl SubscriptionHandle {
    pub fn resource(&self) -> &ResourceName {
        &self.resource
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> SubscriptionState {
        self.state.borrow().clone()
    }

    pub fn phase(&self) -> SubscriptionPhase {
        self.state.borrow().phase
    }

    pub fn is_connected(&self) -> bool {
        self.state.borrow().is_connected
    }

    pub fn is_using_fallback(&self) -> bool {
        self.state.borrow().is_using_fallback
    }

    pub fn retry_count(&self) -> u32 {
        self.state.borrow().retry_count
    }

    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe_state(&self) -> watch::Receiver<SubscriptionState> {
        self.state.clone()
    }

    /// Wait for the next state change and return the new state.
    ///
    /// After the subscription has ended this fails with
    /// [`SubscriptionError::Destroyed`].
    pub async fn changed(&mut self) -> Result<SubscriptionState, SubscriptionError> {
        match self.state.changed().await {
            Ok(()) => Ok(self.state.borrow_and_update().clone()),
            Err(_) => Err(SubscriptionError::Destroyed(self.resource.clone())),
        }
    }

    /// Wait until the state satisfies `predicate`.
    ///
    /// Fails with [`SubscriptionError::Destroyed`] if the subscription ends
    /// first without ever matching.
    pub async fn wait_for<F>(&self, mut predicate: F) -> Result<SubscriptionState, SubscriptionError>
    where
        F: FnMut(&SubscriptionState) -> bool,
    {
        let mut rx = self.state.clone();
        let matched = rx
            .wait_for(|state| predicate(state))
            .await
            .map(|state| state.clone());
        match matched {
            Ok(state) => Ok(state),
            Err(_) => {
                let last = rx.borrow().clone();
                if predicate(&last) {
                    Ok(last)
                } else {
                    Err(SubscriptionError::Destroyed(self.resource.clone()))
                }
            }
        }
    }

    /// Abandon the current mode and attempt a live channel immediately.
    ///
    /// Resets the retry counters and clears the last error. Valid from any
    /// non-terminal state.
    pub fn retry_realtime(&self) -> Result<(), SubscriptionError> {
        if self.is_stopped() {
            return Err(SubscriptionError::Destroyed(self.resource.clone()));
        }
        self.commands
            .send(Command::RetryRealtime)
            .map_err(|_| SubscriptionError::Destroyed(self.resource.clone()))
    }

    /// Cancel the subscription and wait for it to wind down.
    ///
    /// Once this returns no callback fires and the live channel is released.
    /// Idempotent.
    pub async fn stop(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                warn!(resource = %self.resource, error = %err, "subscription task ended abnormally");
            }
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("resource", &self.resource)
            .field("phase", &self.phase())
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use serde_json::json;
    use tokio::time::Instant;

    use super::*;
    use crate::channel::{ChangeEvent, ChangeKind};
    use crate::error::ChannelError;
    use crate::in_memory::{InMemoryLiveSource, ToggleProbe};

    struct Harness {
        source: Arc<InMemoryLiveSource>,
        probe: Arc<ToggleProbe>,
        refreshes: Arc<AtomicUsize>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                source: Arc::new(InMemoryLiveSource::new()),
                probe: Arc::new(ToggleProbe::new(true)),
                refreshes: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn manager(&self) -> SubscriptionManager {
            SubscriptionManager::new(self.source.clone(), self.probe.clone())
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

    fn orders() -> ResourceName {
        ResourceName::new("orders").unwrap()
    }

    async fn wait_phase(handle: &SubscriptionHandle, phase: SubscriptionPhase) -> SubscriptionState {
        handle.wait_for(|s| s.phase == phase).await.unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn connects_and_reports_connected_state() {
        let h = Harness::new();
        let handle = h.manager().watch(orders(), (), h.refresh()).unwrap();

        let state = wait_phase(&handle, SubscriptionPhase::Connected).await;

        assert!(state.is_connected);
        assert!(state.is_realtime_enabled);
        assert!(!state.is_using_fallback);
        assert_eq!(state.retry_count, 0);
        assert_eq!(h.source.active_channels(&orders()), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn changed_reports_each_transition_until_stopped() {
        let h = Harness::new();
        let mut handle = h.manager().watch(orders(), (), h.refresh()).unwrap();

        let mut phases = Vec::new();
        while phases.last() != Some(&SubscriptionPhase::Connected) {
            phases.push(handle.changed().await.unwrap().phase);
        }
        assert!(phases.contains(&SubscriptionPhase::Connected));

        handle.stop().await;
        // Destroyed is the last published value; afterwards the sender is gone.
        let _ = handle.changed().await;
        assert!(matches!(
            handle.changed().await,
            Err(SubscriptionError::Destroyed(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn persistent_failures_degrade_to_polling_after_max_retries() {
        let h = Harness::new();
        h.source
            .fail_always(ChannelError::Transport("connection refused".into()));
        let handle = h.manager().watch(orders(), (), h.refresh()).unwrap();

        let state = wait_phase(&handle, SubscriptionPhase::FallbackPolling).await;
        assert!(state.is_using_fallback);
        assert!(!state.is_connected);
        assert!(!state.is_realtime_enabled);
        assert_eq!(state.retry_count, 3);
        assert!(state.error.is_some());
        assert!(state.last_error_at.is_some());
        assert_eq!(h.source.subscribe_attempts(), 3);

        // First refresh one interval after degrading, then every interval.
        tokio::time::sleep(Duration::from_secs(95)).await;
        assert_eq!(h.refreshes(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn generic_retries_back_off_exponentially() {
        let h = Harness::new();
        h.source
            .fail_next_n(2, ChannelError::Transport("reset".into()));
        let started = Instant::now();
        let handle = h.manager().watch(orders(), (), h.refresh()).unwrap();

        wait_phase(&handle, SubscriptionPhase::Connected).await;

        // 4s after the first failure, 8s after the second.
        assert!(started.elapsed() >= Duration::from_secs(12));
        assert!(started.elapsed() < Duration::from_secs(13));
        assert_eq!(h.source.subscribe_attempts(), 3);
        assert_eq!(handle.retry_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn early_close_uses_its_own_linear_policy() {
        let h = Harness::new();
        h.source.fail_next_n(5, ChannelError::ClosedBeforeEstablished);
        let started = Instant::now();
        let handle = h.manager().watch(orders(), (), h.refresh()).unwrap();

        let state = wait_phase(&handle, SubscriptionPhase::Connected).await;

        // 2 + 4 + 6 + 8 + 10 seconds.
        assert!(started.elapsed() >= Duration::from_secs(30));
        assert_eq!(h.source.subscribe_attempts(), 6);
        assert_eq!(state.retry_count, 0);
        assert!(state.error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_early_close_retries_fall_through_to_generic_policy() {
        let h = Harness::new();
        h.source.fail_always(ChannelError::ClosedBeforeEstablished);
        let handle = h.manager().watch(orders(), (), h.refresh()).unwrap();

        let state = wait_phase(&handle, SubscriptionPhase::FallbackPolling).await;

        assert_eq!(state.retry_count, 3);
        assert_eq!(h.source.subscribe_attempts(), 1 + 5 + 2);
    }

    #[tokio::test(start_paused = true)]
    async fn unreachable_backend_skips_the_live_channel() {
        let h = Harness::new();
        h.probe.set_reachable(false);
        let handle = h.manager().watch(orders(), (), h.refresh()).unwrap();

        let state = wait_phase(&handle, SubscriptionPhase::FallbackPolling).await;

        assert_eq!(h.source.subscribe_attempts(), 0);
        assert!(state.error.unwrap().contains("unreachable"));
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_probe_times_out_and_degrades() {
        let h = Harness::new();
        h.probe.set_hanging(true);
        let started = Instant::now();
        let handle = h.manager().watch(orders(), (), h.refresh()).unwrap();

        wait_phase(&handle, SubscriptionPhase::FallbackPolling).await;

        assert!(started.elapsed() >= Duration::from_secs(5));
        assert_eq!(h.source.subscribe_attempts(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn unhealthy_connection_skips_the_live_channel() {
        struct Failing;
        impl HealthSignal for Failing {
            fn is_healthy(&self) -> bool {
                false
            }
        }

        let h = Harness::new();
        let handle = h
            .manager()
            .with_health(Arc::new(Failing))
            .watch(orders(), (), h.refresh())
            .unwrap();

        let state = wait_phase(&handle, SubscriptionPhase::FallbackPolling).await;

        assert_eq!(h.source.subscribe_attempts(), 0);
        assert!(state.error.unwrap().contains("health"));
    }

    #[tokio::test(start_paused = true)]
    async fn live_changes_reach_the_handler_in_order() {
        let h = Harness::new();
        let (tx, mut rx) = mpsc::unbounded_channel::<ChangeEvent>();
        let handle = h.manager().watch(orders(), tx, h.refresh()).unwrap();
        wait_phase(&handle, SubscriptionPhase::Connected).await;

        h.source
            .publish(&orders(), ChangeKind::Insert, json!({ "id": 1 }));
        h.source
            .publish(&orders(), ChangeKind::Update, json!({ "id": 1, "qty": 2 }));
        h.source
            .publish(&orders(), ChangeKind::Delete, json!({ "id": 1 }));

        let kinds = [
            rx.recv().await.unwrap().kind,
            rx.recv().await.unwrap().kind,
            rx.recv().await.unwrap().kind,
        ];
        assert_eq!(
            kinds,
            [ChangeKind::Insert, ChangeKind::Update, ChangeKind::Delete]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn manual_retry_leaves_fallback_and_stops_polling() {
        let h = Harness::new();
        h.source
            .fail_always(ChannelError::Transport("down".into()));
        let config = SubscriptionConfig::default().with_max_retries(1);
        let handle = h
            .manager()
            .with_config(config)
            .watch(orders(), (), h.refresh())
            .unwrap();
        wait_phase(&handle, SubscriptionPhase::FallbackPolling).await;
        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(h.refreshes(), 1);

        h.source.clear_failures();
        handle.retry_realtime().unwrap();
        let state = wait_phase(&handle, SubscriptionPhase::Connected).await;

        assert!(!state.is_using_fallback);
        assert!(state.is_realtime_enabled);
        assert_eq!(state.retry_count, 0);
        assert!(state.error.is_none());

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(h.refreshes(), 1);
        assert!(handle.is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn broken_channel_is_released_and_reopened() {
        let h = Harness::new();
        let handle = h.manager().watch(orders(), (), h.refresh()).unwrap();
        wait_phase(&handle, SubscriptionPhase::Connected).await;

        h.source
            .break_channels(&orders(), ChannelError::Transport("socket reset".into()));
        let retrying = wait_phase(&handle, SubscriptionPhase::Retrying).await;
        assert_eq!(retrying.retry_count, 1);
        assert!(!retrying.is_connected);
        assert_eq!(h.source.active_channels(&orders()), 0);

        let state = wait_phase(&handle, SubscriptionPhase::Connected).await;
        assert_eq!(state.retry_count, 0);
        assert_eq!(h.source.active_channels(&orders()), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn source_closing_the_channel_counts_as_an_error() {
        let h = Harness::new();
        let handle = h.manager().watch(orders(), (), h.refresh()).unwrap();
        wait_phase(&handle, SubscriptionPhase::Connected).await;

        assert_eq!(h.source.close_channels(&orders()), 1);

        let state = wait_phase(&handle, SubscriptionPhase::Retrying).await;
        assert_eq!(state.error.as_deref(), Some("channel closed"));
        wait_phase(&handle, SubscriptionPhase::Connected).await;
    }

    #[tokio::test(start_paused = true)]
    async fn failing_refresh_does_not_change_state() {
        let h = Harness::new();
        h.source
            .fail_always(ChannelError::Transport("down".into()));
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let refresh = move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(anyhow::anyhow!("backend returned 500"))
            }
        };
        let handle = h
            .manager()
            .with_config(SubscriptionConfig::default().with_max_retries(1))
            .watch(orders(), (), refresh)
            .unwrap();
        let degraded = wait_phase(&handle, SubscriptionPhase::FallbackPolling).await;

        tokio::time::sleep(Duration::from_secs(65)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(handle.state(), degraded);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_ends_polling_and_callbacks() {
        let h = Harness::new();
        h.source
            .fail_always(ChannelError::Transport("down".into()));
        let (tx, mut rx) = mpsc::unbounded_channel::<ChangeEvent>();
        let mut handle = h
            .manager()
            .with_config(SubscriptionConfig::default().with_max_retries(1))
            .watch(orders(), tx, h.refresh())
            .unwrap();
        wait_phase(&handle, SubscriptionPhase::FallbackPolling).await;

        handle.stop().await;
        let after_stop = h.refreshes();
        tokio::time::sleep(Duration::from_secs(300)).await;

        assert_eq!(h.refreshes(), after_stop);
        assert!(rx.recv().await.is_none());
        assert!(handle.state().is_destroyed());
        assert!(!handle.is_using_fallback());
        assert!(matches!(
            handle.retry_realtime(),
            Err(SubscriptionError::Destroyed(_))
        ));

        // Idempotent.
        handle.stop().await;
        assert!(handle.is_stopped());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_during_backoff_cancels_the_pending_reconnect() {
        let h = Harness::new();
        h.source
            .fail_always(ChannelError::Transport("connection refused".into()));
        let mut handle = h.manager().watch(orders(), (), h.refresh()).unwrap();
        let retrying = wait_phase(&handle, SubscriptionPhase::Retrying).await;
        assert_eq!(retrying.retry_count, 1);
        let attempts = h.source.subscribe_attempts();

        handle.stop().await;
        // Well past the 4s backoff and every later one.
        tokio::time::sleep(Duration::from_secs(120)).await;

        assert_eq!(h.source.subscribe_attempts(), attempts);
        assert_eq!(handle.phase(), SubscriptionPhase::Destroyed);
        assert_eq!(h.refreshes(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_handshake_times_out_as_a_channel_error() {
        let h = Harness::new();
        h.source.set_hanging(true);
        let started = Instant::now();
        let handle = h.manager().watch(orders(), (), h.refresh()).unwrap();

        let retrying = wait_phase(&handle, SubscriptionPhase::Retrying).await;
        assert!(started.elapsed() >= Duration::from_secs(5));
        assert_eq!(retrying.retry_count, 1);
        assert_eq!(
            retrying.error.as_deref(),
            Some(ChannelError::Timeout.to_string().as_str())
        );

        h.source.set_hanging(false);
        wait_phase(&handle, SubscriptionPhase::Connected).await;
        assert_eq!(h.source.subscribe_attempts(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_retry_interrupts_a_stalled_handshake() {
        let h = Harness::new();
        h.source.set_hanging(true);
        let handle = h.manager().watch(orders(), (), h.refresh()).unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(h.source.subscribe_attempts(), 1);

        handle.retry_realtime().unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(h.source.subscribe_attempts(), 2);
        assert_eq!(handle.phase(), SubscriptionPhase::Connecting);
        assert_eq!(handle.retry_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_releases_the_live_channel() {
        let h = Harness::new();
        let mut handle = h.manager().watch(orders(), (), h.refresh()).unwrap();
        wait_phase(&handle, SubscriptionPhase::Connected).await;

        handle.stop().await;

        assert_eq!(h.source.active_channels(&orders()), 0);
        assert_eq!(handle.phase(), SubscriptionPhase::Destroyed);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_cancels_the_subscription() {
        let h = Harness::new();
        let (tx, mut rx) = mpsc::unbounded_channel::<ChangeEvent>();
        let handle = h.manager().watch(orders(), tx, h.refresh()).unwrap();
        wait_phase(&handle, SubscriptionPhase::Connected).await;

        drop(handle);

        // The actor owns the sender; it is gone once teardown finished.
        assert!(rx.recv().await.is_none());
        assert_eq!(h.source.active_channels(&orders()), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_fallback_parks_until_manual_retry() {
        let h = Harness::new();
        h.source
            .fail_always(ChannelError::Transport("down".into()));
        let config = SubscriptionConfig::default()
            .with_max_retries(1)
            .with_fallback(false);
        let handle = h
            .manager()
            .with_config(config)
            .watch(orders(), (), h.refresh())
            .unwrap();

        let parked = handle
            .wait_for(|s| s.phase == SubscriptionPhase::Disconnected && !s.is_realtime_enabled)
            .await
            .unwrap();
        assert!(!parked.is_using_fallback);

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(h.refreshes(), 0);
        assert_eq!(h.source.subscribe_attempts(), 1);

        h.source.clear_failures();
        handle.retry_realtime().unwrap();
        wait_phase(&handle, SubscriptionPhase::Connected).await;
    }

    #[tokio::test(start_paused = true)]
    async fn channel_options_are_handed_to_the_source() {
        let h = Harness::new();
        let manager = h.manager();
        let handle = manager.watch(orders(), (), h.refresh()).unwrap();
        wait_phase(&handle, SubscriptionPhase::Connected).await;

        let options = h.source.last_options().unwrap();
        assert_eq!(options, manager.config().channel_options());
        assert_eq!(options.events_per_second, 1);
        assert_eq!(options.reconnect_after.len(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_config_is_rejected_before_spawning() {
        let h = Harness::new();
        let config = SubscriptionConfig::default().with_fallback_interval(Duration::ZERO);

        let err = h
            .manager()
            .watch_with_config(orders(), (), h.refresh(), config)
            .unwrap_err();

        assert!(matches!(err, SubscriptionError::Config(_)));
        assert_eq!(h.source.subscribe_attempts(), 0);
    }

    #[test]
    fn watching_outside_a_runtime_fails() {
        let h = Harness::new();
        let err = h.manager().watch(orders(), (), h.refresh()).unwrap_err();
        assert_eq!(err, SubscriptionError::NoRuntime);
    }
}
