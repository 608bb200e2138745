//! Connection health monitor.
//!
//! Decides, without opening a live channel, whether the backend is currently
//! reachable. The result is advisory: it never blocks callers, it only stops
//! the subscription manager from attempting channels that are likely to fail.
//!
//! Semantics:
//! - every check issues one probe, bounded by `probe_timeout`
//! - success resets the failure streak and marks the backend healthy at once
//! - failure extends the streak; the backend turns unhealthy when the streak
//!   reaches `failure_threshold`

use std::sync::{Arc, Mutex as StdMutex, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{ConfigError, HealthError};
use crate::millis::millis;
use crate::probe::{Probe, probe_within};

/// Read-only health signal consumed by subscriptions.
pub trait HealthSignal: Send + Sync + 'static {
    fn is_healthy(&self) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    #[serde(rename = "check_interval_ms", with = "millis")]
    pub check_interval: Duration,
    pub failure_threshold: u32,
    #[serde(rename = "probe_timeout_ms", with = "millis")]
    pub probe_timeout: Duration,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            check_interval: Duration::from_secs(30),
            failure_threshold: 3,
            probe_timeout: Duration::from_secs(5),
        }
    }
}

impl HealthConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.check_interval.is_zero() {
            return Err(ConfigError::invalid("health check_interval must be non-zero"));
        }
        if self.failure_threshold == 0 {
            return Err(ConfigError::invalid("health failure_threshold must be at least 1"));
        }
        if self.probe_timeout.is_zero() {
            return Err(ConfigError::invalid("health probe_timeout must be non-zero"));
        }
        Ok(())
    }
}

/// Snapshot of the backend's health as last observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionHealthState {
    pub is_healthy: bool,
    /// `None` until the first check completes.
    pub last_check: Option<DateTime<Utc>>,
    pub latency_ms: u64,
    pub consecutive_failures: u32,
    pub error: Option<String>,
}

impl Default for ConnectionHealthState {
    fn default() -> Self {
        Self {
            is_healthy: true,
            last_check: None,
            latency_ms: 0,
            consecutive_failures: 0,
            error: None,
        }
    }
}

/// Handle to a running health monitor.
///
/// Cheap to clone. The background task stops on [`stop`](Self::stop) or when
/// the last handle is dropped.
#[derive(Clone)]
pub struct HealthMonitor {
    inner: Arc<Inner>,
}

struct Inner {
    probe: Arc<dyn Probe>,
    config: HealthConfig,
    state: watch::Sender<ConnectionHealthState>,
    // Serializes periodic and forced checks.
    check_lock: Mutex<()>,
    cancel: CancellationToken,
    task: StdMutex<Option<JoinHandle<()>>>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl HealthMonitor {
    /// Start monitoring. Fails with [`HealthError::NoRuntime`] outside a
    /// Tokio runtime.
    ///
    /// The first check runs immediately, then every `check_interval`.
    pub fn start(probe: Arc<dyn Probe>, config: HealthConfig) -> Result<Self, HealthError> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|_| HealthError::NoRuntime)?;

        let (state, _) = watch::channel(ConnectionHealthState::default());
        let cancel = CancellationToken::new();
        let interval = config.check_interval;

        let inner = Arc::new(Inner {
            probe,
            config,
            state,
            check_lock: Mutex::new(()),
            cancel: cancel.clone(),
            task: StdMutex::new(None),
        });

        let task = runtime.spawn(run_checks(Arc::downgrade(&inner), cancel, interval));
        *inner.task_slot() = Some(task);
        info!(interval_ms = interval.as_millis() as u64, "health monitor started");

        Ok(Self { inner })
    }

    pub fn state(&self) -> ConnectionHealthState {
        self.inner.state.borrow().clone()
    }

    pub fn is_healthy(&self) -> bool {
        self.inner.state.borrow().is_healthy
    }

    /// Receiver that observes every state change.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionHealthState> {
        self.inner.state.subscribe()
    }

    pub fn config(&self) -> &HealthConfig {
        &self.inner.config
    }

    /// Run one check now and return the resulting state.
    pub async fn force_check(&self) -> ConnectionHealthState {
        self.inner.check().await
    }

    /// Stop periodic checks. Idempotent.
    pub fn stop(&self) {
        if !self.inner.cancel.is_cancelled() {
            self.inner.cancel.cancel();
            info!("health monitor stopped");
        }
    }

    /// Stop periodic checks and wait for the check loop to exit. Idempotent.
    pub async fn shutdown(&self) {
        self.stop();
        let task = self.inner.task_slot().take();
        if let Some(task) = task {
            if let Err(err) = task.await {
                warn!(error = %err, "health check loop ended abnormally");
            }
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }
}

impl HealthSignal for HealthMonitor {
    fn is_healthy(&self) -> bool {
        HealthMonitor::is_healthy(self)
    }
}

impl core::fmt::Debug for HealthMonitor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HealthMonitor")
            .field("config", &self.inner.config)
            .field("state", &*self.inner.state.borrow())
            .finish()
    }
}

impl Inner {
    fn task_slot(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.task.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn check(&self) -> ConnectionHealthState {
        let _guard = self.check_lock.lock().await;

        let outcome = probe_within(self.probe.as_ref(), self.config.probe_timeout).await;
        let mut next = self.state.borrow().clone();
        next.last_check = Some(Utc::now());

        match outcome {
            Ok(latency) => {
                if !next.is_healthy {
                    info!(
                        latency_ms = latency.as_millis() as u64,
                        after_failures = next.consecutive_failures,
                        "backend healthy again"
                    );
                }
                next.is_healthy = true;
                next.consecutive_failures = 0;
                next.latency_ms = latency.as_millis() as u64;
                next.error = None;
            }
            Err(err) => {
                next.consecutive_failures = next.consecutive_failures.saturating_add(1);
                next.error = Some(err.to_string());

                if next.is_healthy && next.consecutive_failures >= self.config.failure_threshold {
                    next.is_healthy = false;
                    warn!(
                        consecutive_failures = next.consecutive_failures,
                        error = %err,
                        "backend marked unhealthy"
                    );
                } else {
                    debug!(
                        consecutive_failures = next.consecutive_failures,
                        error = %err,
                        "health probe failed"
                    );
                }
            }
        }

        self.state.send_replace(next.clone());
        next
    }
}

async fn run_checks(inner: Weak<Inner>, cancel: CancellationToken, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let Some(inner) = inner.upgrade() else { break };
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = inner.check() => {}
        }
    }

    debug!("health check loop exited");
}
