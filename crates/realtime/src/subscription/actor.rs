//! Per-resource subscription actor.
//!
//! The actor is the single owner of a subscription's state. Every transition
//! happens on its task, so timers cannot race each other, and cancellation is
//! observed before any callback or state change.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use forgeops_core::ResourceName;

use crate::channel::{ChannelId, ChannelMessage, ChannelOptions, LiveSource};
use crate::error::ChannelError;
use crate::health::HealthSignal;
use crate::policy::RetryPolicies;
use crate::probe::{Probe, probe_within};

use super::config::SubscriptionConfig;
use super::handler::{self, ChangeHandler, Refresh};
use super::state::{SubscriptionPhase, SubscriptionState};

#[derive(Debug)]
pub(crate) enum Command {
    RetryRealtime,
}

/// Next thing the actor does.
enum Step {
    Connect { preflight: bool },
    Live(mpsc::UnboundedReceiver<ChannelMessage>),
    Backoff(Duration),
    Fallback,
    /// Degraded with fallback disabled: wait for a manual retry.
    Parked,
    Stop,
}

/// Why a wait ended.
enum Wake<T> {
    Cancelled,
    Command(Option<Command>),
    Ready(T),
}

pub(crate) struct Collaborators {
    pub source: Arc<dyn LiveSource>,
    pub reachability: Arc<dyn Probe>,
    pub health: Option<Arc<dyn HealthSignal>>,
}

pub(crate) struct SubscriptionActor {
    resource: ResourceName,
    config: SubscriptionConfig,
    policies: RetryPolicies,
    options: ChannelOptions,
    collaborators: Collaborators,
    handler: Box<dyn ChangeHandler>,
    refresh: Arc<dyn Refresh>,
    commands: mpsc::UnboundedReceiver<Command>,
    state: watch::Sender<SubscriptionState>,
    cancel: CancellationToken,
    channel: Option<ChannelId>,
    retry_count: u32,
    early_close_attempts: u32,
}

impl SubscriptionActor {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        resource: ResourceName,
        config: SubscriptionConfig,
        collaborators: Collaborators,
        handler: Box<dyn ChangeHandler>,
        refresh: Arc<dyn Refresh>,
        commands: mpsc::UnboundedReceiver<Command>,
        state: watch::Sender<SubscriptionState>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            policies: config.retry_policies(),
            options: config.channel_options(),
            resource,
            config,
            collaborators,
            handler,
            refresh,
            commands,
            state,
            cancel,
            channel: None,
            retry_count: 0,
            early_close_attempts: 0,
        }
    }

    pub(crate) async fn run(mut self) {
        info!(resource = %self.resource, "subscription started");

        let mut step = Step::Connect { preflight: true };
        loop {
            step = match step {
                Step::Connect { preflight } => self.connect(preflight).await,
                Step::Live(events) => self.stream(events).await,
                Step::Backoff(delay) => self.backoff(delay).await,
                Step::Fallback => self.poll().await,
                Step::Parked => self.park().await,
                Step::Stop => break,
            };
        }

        self.teardown().await;
    }

    async fn connect(&mut self, preflight: bool) -> Step {
        self.release_channel().await;
        self.update(|s| {
            s.phase = SubscriptionPhase::Connecting;
            s.is_connected = false;
        });

        if preflight {
            let probe = probe_within(
                self.collaborators.reachability.as_ref(),
                self.config.probe_timeout,
            );
            let outcome = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Step::Stop,
                outcome = probe => outcome,
            };
            if let Err(err) = outcome {
                warn!(resource = %self.resource, error = %err, "backend unreachable; skipping live channel");
                return self.degrade(format!("pre-flight probe failed: {err}"));
            }
        }

        if let Some(health) = &self.collaborators.health {
            if !health.is_healthy() {
                warn!(resource = %self.resource, "connection health failing; skipping live channel");
                return self.degrade("connection health check failing".to_string());
            }
        }

        let handshake = tokio::time::timeout(
            self.config.probe_timeout,
            self.collaborators.source.subscribe(&self.resource, &self.options),
        );
        let wake = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Wake::Cancelled,
            cmd = self.commands.recv() => Wake::Command(cmd),
            attempt = handshake => Wake::Ready(attempt.unwrap_or_else(|_| Err(ChannelError::Timeout))),
        };

        let attempt = match wake {
            Wake::Cancelled | Wake::Command(None) => return Step::Stop,
            Wake::Command(Some(Command::RetryRealtime)) => return self.manual_retry(),
            Wake::Ready(attempt) => attempt,
        };

        match attempt {
            Ok(channel) => {
                info!(resource = %self.resource, channel = %channel.id, "live channel established");
                self.channel = Some(channel.id);
                self.retry_count = 0;
                self.early_close_attempts = 0;
                self.update(|s| {
                    s.phase = SubscriptionPhase::Connected;
                    s.is_connected = true;
                    s.is_realtime_enabled = true;
                    s.is_using_fallback = false;
                    s.retry_count = 0;
                    s.error = None;
                });
                Step::Live(channel.events)
            }
            Err(err) => self.on_channel_error(err),
        }
    }

    async fn stream(&mut self, mut events: mpsc::UnboundedReceiver<ChannelMessage>) -> Step {
        loop {
            let wake = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Wake::Cancelled,
                cmd = self.commands.recv() => Wake::Command(cmd),
                msg = events.recv() => Wake::Ready(msg),
            };

            match wake {
                Wake::Cancelled | Wake::Command(None) => return Step::Stop,
                Wake::Command(Some(Command::RetryRealtime)) => return self.manual_retry(),
                Wake::Ready(Some(ChannelMessage::Change(event))) => {
                    if self.cancel.is_cancelled() {
                        return Step::Stop;
                    }
                    handler::dispatch(self.handler.as_mut(), &event);
                }
                Wake::Ready(Some(ChannelMessage::Error(err))) => {
                    warn!(resource = %self.resource, error = %err, "live channel failed");
                    self.release_channel().await;
                    return self.on_channel_error(err);
                }
                Wake::Ready(None) => {
                    warn!(resource = %self.resource, "live channel closed by source");
                    self.release_channel().await;
                    return self.on_channel_error(ChannelError::Closed);
                }
            }
        }
    }

    async fn backoff(&mut self, delay: Duration) -> Step {
        debug!(resource = %self.resource, delay_ms = delay.as_millis() as u64, "reconnect scheduled");

        let wake = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Wake::Cancelled,
            cmd = self.commands.recv() => Wake::Command(cmd),
            _ = tokio::time::sleep(delay) => Wake::Ready(()),
        };

        match wake {
            Wake::Cancelled | Wake::Command(None) => Step::Stop,
            Wake::Command(Some(Command::RetryRealtime)) => self.manual_retry(),
            Wake::Ready(()) => Step::Connect { preflight: false },
        }
    }

    async fn poll(&mut self) -> Step {
        self.release_channel().await;
        self.update(|s| {
            s.phase = SubscriptionPhase::FallbackPolling;
            s.is_connected = false;
            s.is_using_fallback = true;
            s.is_realtime_enabled = false;
        });

        let period = self.config.fallback_interval;
        info!(
            resource = %self.resource,
            interval_ms = period.as_millis() as u64,
            "fallback polling started"
        );

        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let wake = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Wake::Cancelled,
                cmd = self.commands.recv() => Wake::Command(cmd),
                _ = ticker.tick() => Wake::Ready(()),
            };

            match wake {
                Wake::Cancelled | Wake::Command(None) => return Step::Stop,
                Wake::Command(Some(Command::RetryRealtime)) => {
                    info!(resource = %self.resource, "fallback polling stopped for manual retry");
                    return self.manual_retry();
                }
                Wake::Ready(()) => {
                    let refresh = Arc::clone(&self.refresh);
                    let outcome = tokio::select! {
                        biased;
                        _ = self.cancel.cancelled() => return Step::Stop,
                        outcome = refresh.refresh() => outcome,
                    };
                    if let Err(err) = outcome {
                        warn!(resource = %self.resource, error = %format!("{err:#}"), "fallback refresh failed");
                    }
                }
            }
        }
    }

    async fn park(&mut self) -> Step {
        loop {
            let wake: Wake<()> = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Wake::Cancelled,
                cmd = self.commands.recv() => Wake::Command(cmd),
            };

            match wake {
                Wake::Command(Some(Command::RetryRealtime)) => return self.manual_retry(),
                Wake::Cancelled | Wake::Command(None) => return Step::Stop,
                Wake::Ready(()) => {}
            }
        }
    }

    fn on_channel_error(&mut self, err: ChannelError) -> Step {
        let message = err.to_string();
        let now = Utc::now();

        if err.is_early_close() && self.policies.early_close.should_retry(self.early_close_attempts)
        {
            self.early_close_attempts += 1;
            let delay = self
                .policies
                .early_close
                .delay_for_attempt(self.early_close_attempts);
            warn!(
                resource = %self.resource,
                attempt = self.early_close_attempts,
                delay_ms = delay.as_millis() as u64,
                "channel closed before it was established; retrying"
            );
            self.update(|s| {
                s.phase = SubscriptionPhase::Retrying;
                s.is_connected = false;
                s.error = Some(message);
                s.last_error_at = Some(now);
            });
            return Step::Backoff(delay);
        }

        self.retry_count += 1;
        let retry_count = self.retry_count;
        let retry = self.policies.generic.should_retry(retry_count);
        self.update(|s| {
            if retry {
                s.phase = SubscriptionPhase::Retrying;
            }
            s.is_connected = false;
            s.retry_count = retry_count;
            s.error = Some(message);
            s.last_error_at = Some(now);
        });

        if retry {
            let delay = self.policies.generic.delay_for_attempt(retry_count);
            warn!(
                resource = %self.resource,
                retry_count,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "live channel error; retrying"
            );
            Step::Backoff(delay)
        } else {
            warn!(
                resource = %self.resource,
                retry_count,
                error = %err,
                "live channel retries exhausted"
            );
            self.degrade_after_error()
        }
    }

    /// Give up on live delivery without a channel error (pre-flight or health).
    fn degrade(&mut self, reason: String) -> Step {
        let now = Utc::now();
        self.update(|s| {
            s.error = Some(reason);
            s.last_error_at = Some(now);
        });
        self.degrade_after_error()
    }

    fn degrade_after_error(&mut self) -> Step {
        if self.config.enable_fallback {
            return Step::Fallback;
        }

        info!(resource = %self.resource, "fallback disabled; waiting for manual retry");
        self.update(|s| {
            s.phase = SubscriptionPhase::Disconnected;
            s.is_connected = false;
            s.is_realtime_enabled = false;
        });
        Step::Parked
    }

    fn manual_retry(&mut self) -> Step {
        info!(resource = %self.resource, "manual realtime retry requested");
        self.retry_count = 0;
        self.early_close_attempts = 0;
        self.update(|s| {
            s.retry_count = 0;
            s.is_realtime_enabled = true;
            s.is_using_fallback = false;
            s.error = None;
        });
        Step::Connect { preflight: true }
    }

    async fn release_channel(&mut self) {
        if let Some(id) = self.channel.take() {
            self.collaborators.source.unsubscribe(id).await;
            debug!(resource = %self.resource, channel = %id, "live channel released");
        }
    }

    async fn teardown(&mut self) {
        self.release_channel().await;
        self.update(|s| {
            s.phase = SubscriptionPhase::Destroyed;
            s.is_connected = false;
            s.is_using_fallback = false;
            s.is_realtime_enabled = false;
        });
        info!(resource = %self.resource, "subscription stopped");
    }

    fn update(&self, f: impl FnOnce(&mut SubscriptionState)) {
        self.state.send_modify(f);
    }
}
