use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use forgeops_core::ResourceName;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionPhase {
    Disconnected,
    Connecting,
    Connected,
    Retrying,
    FallbackPolling,
    /// Terminal.
    Destroyed,
}

/// Caller-visible state of one subscription.
///
/// At most one of `is_connected` / `is_using_fallback` is ever true.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubscriptionState {
    pub resource: ResourceName,
    pub phase: SubscriptionPhase,
    pub is_connected: bool,
    /// Whether live attempts are allowed (false after degrading, until a manual retry).
    pub is_realtime_enabled: bool,
    pub is_using_fallback: bool,
    pub error: Option<String>,
    pub retry_count: u32,
    pub last_error_at: Option<DateTime<Utc>>,
}

impl SubscriptionState {
    pub(crate) fn new(resource: ResourceName) -> Self {
        Self {
            resource,
            phase: SubscriptionPhase::Disconnected,
            is_connected: false,
            is_realtime_enabled: true,
            is_using_fallback: false,
            error: None,
            retry_count: 0,
            last_error_at: None,
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.phase == SubscriptionPhase::Destroyed
    }
}
