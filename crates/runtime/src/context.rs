//! Application context.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tokio::runtime::Handle;
use tracing::info;

use forgeops_agent::{AgentError, RequestQueue};
use forgeops_realtime::{HealthError, HealthMonitor, LiveSource, Probe, SubscriptionManager};

use crate::config::{ConfigError, RuntimeConfig};

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error("the application context must be started inside a tokio runtime")]
    NoRuntime,
}

impl From<HealthError> for RuntimeError {
    fn from(err: HealthError) -> Self {
        match err {
            HealthError::Config(err) => Self::Config(ConfigError::from(err)),
            HealthError::NoRuntime => Self::NoRuntime,
        }
    }
}

/// Explicitly constructed owner of the shared services.
///
/// Cloning shares the same services. The subscription manager consults the
/// health monitor before every live attempt.
#[derive(Debug, Clone)]
pub struct AppContext {
    config: RuntimeConfig,
    queue: RequestQueue,
    health: HealthMonitor,
    subscriptions: SubscriptionManager,
    stopped: Arc<AtomicBool>,
}

impl AppContext {
    /// Build every service from `config` and start the health monitor.
    ///
    /// `backend_probe` is used both for periodic health checks and for the
    /// reachability pre-flight of each subscription.
    pub fn start(
        config: RuntimeConfig,
        backend_probe: Arc<dyn Probe>,
        live_source: Arc<dyn LiveSource>,
    ) -> Result<Self, RuntimeError> {
        config.validate()?;
        Handle::try_current().map_err(|_| RuntimeError::NoRuntime)?;

        let queue = RequestQueue::new(config.queue_max_size)?;
        let health = HealthMonitor::start(Arc::clone(&backend_probe), config.health.clone())?;
        let subscriptions = SubscriptionManager::new(live_source, backend_probe)
            .with_health(Arc::new(health.clone()))
            .with_config(config.subscription.clone());

        info!(
            queue_max_size = config.queue_max_size,
            max_retries = config.subscription.max_retries,
            enable_fallback = config.subscription.enable_fallback,
            "application context started"
        );

        Ok(Self {
            config,
            queue,
            health,
            subscriptions,
            stopped: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn request_queue(&self) -> &RequestQueue {
        &self.queue
    }

    pub fn health(&self) -> &HealthMonitor {
        &self.health
    }

    pub fn subscriptions(&self) -> &SubscriptionManager {
        &self.subscriptions
    }

    /// Stop background work owned by the context and wait for it to exit.
    /// Idempotent.
    ///
    /// Subscriptions are owned by their handles and end with them.
    pub async fn shutdown(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        self.health.shutdown().await;
        info!(pending_requests = self.queue.len(), "application context shut down");
    }

    pub fn is_shut_down(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}
