use std::time::Duration;

use thiserror::Error;

use forgeops_core::ResourceName;

/// Failure of a health/reachability probe.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("backend unreachable: {0}")]
    Unreachable(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("probe timed out after {0:?}")]
    Timeout(Duration),
}

/// Failure reported by a live change source.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// The channel was closed by the source before the handshake completed.
    ///
    /// Retried under its own, more generous policy.
    #[error("channel closed before it was established")]
    ClosedBeforeEstablished,

    #[error("channel handshake timed out")]
    Timeout,

    #[error("channel transport error: {0}")]
    Transport(String),

    /// An established channel stopped delivering.
    #[error("channel closed")]
    Closed,
}

impl ChannelError {
    pub fn is_early_close(&self) -> bool {
        matches!(self, ChannelError::ClosedBeforeEstablished)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HealthError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The monitor's check loop is a task and needs a tokio runtime.
    #[error("no tokio runtime available to run health checks")]
    NoRuntime,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The subscription was stopped; its handle can no longer drive it.
    #[error("subscription for {0} has been stopped")]
    Destroyed(ResourceName),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Subscriptions are driven by a task and need a tokio runtime.
    #[error("no tokio runtime available to drive the subscription")]
    NoRuntime,
}
