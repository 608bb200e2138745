use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::channel::ChannelOptions;
use crate::error::ConfigError;
use crate::millis::{millis, millis_vec};
use crate::policy::{RetryPolicies, RetryPolicy};

/// Per-resource subscription settings.
///
/// Every field is optional when deserializing; missing fields keep defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubscriptionConfig {
    /// Generic channel failures tolerated before degrading to polling.
    pub max_retries: u32,
    /// Base of the exponential backoff for generic failures.
    #[serde(rename = "retry_delay_ms", with = "millis")]
    pub retry_delay: Duration,
    #[serde(rename = "heartbeat_interval_ms", with = "millis")]
    pub heartbeat_interval: Duration,
    #[serde(rename = "reconnect_after_ms", with = "millis_vec")]
    pub reconnect_after: Vec<Duration>,
    pub events_per_second: u32,
    pub enable_fallback: bool,
    #[serde(rename = "fallback_interval_ms", with = "millis")]
    pub fallback_interval: Duration,
    /// Bound for the reachability pre-flight.
    #[serde(rename = "probe_timeout_ms", with = "millis")]
    pub probe_timeout: Duration,
    #[serde(rename = "max_backoff_ms", with = "millis")]
    pub max_backoff: Duration,
    pub early_close_retries: u32,
    #[serde(rename = "early_close_delay_ms", with = "millis")]
    pub early_close_delay: Duration,
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_millis(2000),
            heartbeat_interval: Duration::from_millis(30_000),
            reconnect_after: [2, 5, 10, 20, 30]
                .into_iter()
                .map(Duration::from_secs)
                .collect(),
            events_per_second: 1,
            enable_fallback: true,
            fallback_interval: Duration::from_millis(30_000),
            probe_timeout: Duration::from_secs(5),
            max_backoff: Duration::from_secs(30),
            early_close_retries: 5,
            early_close_delay: Duration::from_millis(2000),
        }
    }
}

impl SubscriptionConfig {
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn with_fallback_interval(mut self, interval: Duration) -> Self {
        self.fallback_interval = interval;
        self
    }

    pub fn with_fallback(mut self, enabled: bool) -> Self {
        self.enable_fallback = enabled;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fallback_interval.is_zero() {
            return Err(ConfigError::invalid("fallback_interval must be non-zero"));
        }
        if self.probe_timeout.is_zero() {
            return Err(ConfigError::invalid("probe_timeout must be non-zero"));
        }
        if self.events_per_second == 0 {
            return Err(ConfigError::invalid("events_per_second must be at least 1"));
        }
        if self.max_backoff < self.retry_delay {
            return Err(ConfigError::invalid(
                "max_backoff must not be smaller than retry_delay",
            ));
        }
        Ok(())
    }

    pub fn channel_options(&self) -> ChannelOptions {
        ChannelOptions {
            heartbeat_interval: self.heartbeat_interval,
            reconnect_after: self.reconnect_after.clone(),
            events_per_second: self.events_per_second,
        }
    }

    pub fn retry_policies(&self) -> RetryPolicies {
        RetryPolicies {
            generic: RetryPolicy::exponential(self.max_retries, self.retry_delay, self.max_backoff),
            early_close: RetryPolicy::linear(
                self.early_close_retries,
                self.early_close_delay,
                self.early_close_delay
                    .saturating_mul(self.early_close_retries.max(1)),
            ),
        }
    }
}
