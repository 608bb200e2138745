//! In-memory collaborators for tests/dev.
//!
//! - [`InMemoryLiveSource`]: scriptable live source (failures, broken channels)
//! - [`ToggleProbe`]: probe whose outcome is switched by the caller

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tokio::sync::mpsc;

use forgeops_core::ResourceName;

use crate::channel::{
    ChangeEvent, ChangeKind, ChannelId, ChannelMessage, ChannelOptions, LiveChannel, LiveSource,
};
use crate::error::{ChannelError, ProbeError};
use crate::probe::Probe;

/// In-memory live source.
///
/// - No IO
/// - Fan-out to every open channel of a resource
/// - Subscribe failures can be scripted one at a time or made permanent
#[derive(Debug, Default)]
pub struct InMemoryLiveSource {
    inner: Mutex<SourceState>,
}

#[derive(Debug, Default)]
struct SourceState {
    next_id: u64,
    channels: HashMap<ChannelId, OpenChannel>,
    scripted_failures: VecDeque<ChannelError>,
    permanent_failure: Option<ChannelError>,
    subscribe_attempts: u64,
    last_options: Option<ChannelOptions>,
    hang_subscribes: bool,
}

#[derive(Debug)]
struct OpenChannel {
    resource: ResourceName,
    tx: mpsc::UnboundedSender<ChannelMessage>,
}

impl InMemoryLiveSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next subscribe attempt with `error`.
    pub fn fail_next(&self, error: ChannelError) {
        self.fail_next_n(1, error);
    }

    /// Fail the next `n` subscribe attempts with `error`.
    pub fn fail_next_n(&self, n: usize, error: ChannelError) {
        let mut state = self.lock();
        state
            .scripted_failures
            .extend(std::iter::repeat_n(error, n));
    }

    /// Fail every subscribe attempt until [`clear_failures`](Self::clear_failures).
    pub fn fail_always(&self, error: ChannelError) {
        self.lock().permanent_failure = Some(error);
    }

    /// Make subscribe attempts never complete (a stalled handshake).
    pub fn set_hanging(&self, hanging: bool) {
        self.lock().hang_subscribes = hanging;
    }

    pub fn clear_failures(&self) {
        let mut state = self.lock();
        state.scripted_failures.clear();
        state.permanent_failure = None;
    }

    /// Deliver a change to every open channel of `resource`.
    ///
    /// Returns the number of channels it reached.
    pub fn publish(&self, resource: &ResourceName, kind: ChangeKind, payload: JsonValue) -> usize {
        let event = ChangeEvent::new(resource.clone(), kind, payload);
        let mut state = self.lock();

        // Drop channels whose receiver is gone while publishing.
        let mut delivered = 0;
        state.channels.retain(|_, ch| {
            if &ch.resource != resource {
                return true;
            }
            let alive = ch.tx.send(ChannelMessage::Change(event.clone())).is_ok();
            if alive {
                delivered += 1;
            }
            alive
        });
        delivered
    }

    /// Report `error` on every open channel of `resource`.
    ///
    /// Channels stay registered until the subscriber releases them.
    pub fn break_channels(&self, resource: &ResourceName, error: ChannelError) -> usize {
        let state = self.lock();
        state
            .channels
            .values()
            .filter(|ch| &ch.resource == resource)
            .filter(|ch| ch.tx.send(ChannelMessage::Error(error.clone())).is_ok())
            .count()
    }

    /// Drop every open channel of `resource` without an error message.
    pub fn close_channels(&self, resource: &ResourceName) -> usize {
        let mut state = self.lock();
        let before = state.channels.len();
        state.channels.retain(|_, ch| &ch.resource != resource);
        before - state.channels.len()
    }

    pub fn active_channels(&self, resource: &ResourceName) -> usize {
        self.lock()
            .channels
            .values()
            .filter(|ch| &ch.resource == resource)
            .count()
    }

    pub fn subscribe_attempts(&self) -> u64 {
        self.lock().subscribe_attempts
    }

    /// Options passed with the most recent subscribe attempt.
    pub fn last_options(&self) -> Option<ChannelOptions> {
        self.lock().last_options.clone()
    }

    fn lock(&self) -> MutexGuard<'_, SourceState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl LiveSource for InMemoryLiveSource {
    async fn subscribe(
        &self,
        resource: &ResourceName,
        options: &ChannelOptions,
    ) -> Result<LiveChannel, ChannelError> {
        let hanging = {
            let mut state = self.lock();
            state.subscribe_attempts += 1;
            state.last_options = Some(options.clone());
            state.hang_subscribes
        };
        if hanging {
            std::future::pending::<()>().await;
        }

        let mut state = self.lock();
        if let Some(error) = state.scripted_failures.pop_front() {
            return Err(error);
        }
        if let Some(error) = state.permanent_failure.clone() {
            return Err(error);
        }

        state.next_id += 1;
        let id = ChannelId(state.next_id);
        let (tx, events) = mpsc::unbounded_channel();
        state.channels.insert(
            id,
            OpenChannel {
                resource: resource.clone(),
                tx,
            },
        );

        Ok(LiveChannel { id, events })
    }

    async fn unsubscribe(&self, channel: ChannelId) {
        self.lock().channels.remove(&channel);
    }
}

/// Probe whose outcome is controlled by the caller.
#[derive(Debug)]
pub struct ToggleProbe {
    reachable: AtomicBool,
    hanging: AtomicBool,
    attempts: AtomicU64,
    latency: Duration,
}

impl ToggleProbe {
    pub fn new(reachable: bool) -> Self {
        Self {
            reachable: AtomicBool::new(reachable),
            hanging: AtomicBool::new(false),
            attempts: AtomicU64::new(0),
            latency: Duration::ZERO,
        }
    }

    /// Simulated round-trip time for every probe.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    /// Make probes never resolve (exercises caller timeouts).
    pub fn set_hanging(&self, hanging: bool) {
        self.hanging.store(hanging, Ordering::SeqCst);
    }

    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Probe for ToggleProbe {
    async fn probe(&self) -> Result<(), ProbeError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        if self.hanging.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if self.reachable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ProbeError::Unreachable("probe switched off".to_string()))
        }
    }
}
