//! Process configuration.
//!
//! Defaults come from the component configs; the environment overrides
//! individual fields. Missing variables keep defaults, unparsable ones are an
//! error rather than being silently ignored.

use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use forgeops_queue::DEFAULT_MAX_SIZE;
use forgeops_realtime::{HealthConfig, SubscriptionConfig};

pub const QUEUE_MAX_SIZE: &str = "FORGEOPS_QUEUE_MAX_SIZE";
pub const HEALTH_INTERVAL_MS: &str = "FORGEOPS_HEALTH_INTERVAL_MS";
pub const HEALTH_FAILURE_THRESHOLD: &str = "FORGEOPS_HEALTH_FAILURE_THRESHOLD";
pub const HEALTH_PROBE_TIMEOUT_MS: &str = "FORGEOPS_HEALTH_PROBE_TIMEOUT_MS";
pub const MAX_RETRIES: &str = "FORGEOPS_MAX_RETRIES";
pub const RETRY_DELAY_MS: &str = "FORGEOPS_RETRY_DELAY_MS";
pub const ENABLE_FALLBACK: &str = "FORGEOPS_ENABLE_FALLBACK";
pub const FALLBACK_INTERVAL_MS: &str = "FORGEOPS_FALLBACK_INTERVAL_MS";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name}={value:?}: {reason}")]
    InvalidVar {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("queue_max_size must be at least 1")]
    ZeroQueueCapacity,

    #[error(transparent)]
    Component(#[from] forgeops_realtime::ConfigError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub queue_max_size: usize,
    pub health: HealthConfig,
    pub subscription: SubscriptionConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            queue_max_size: DEFAULT_MAX_SIZE,
            health: HealthConfig::default(),
            subscription: SubscriptionConfig::default(),
        }
    }
}

impl RuntimeConfig {
    /// Defaults overridden by `FORGEOPS_*` process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable name.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(size) = parse_var(&lookup, QUEUE_MAX_SIZE)? {
            config.queue_max_size = size;
        }

        if let Some(ms) = parse_var(&lookup, HEALTH_INTERVAL_MS)? {
            config.health.check_interval = Duration::from_millis(ms);
        }
        if let Some(threshold) = parse_var(&lookup, HEALTH_FAILURE_THRESHOLD)? {
            config.health.failure_threshold = threshold;
        }
        if let Some(ms) = parse_var(&lookup, HEALTH_PROBE_TIMEOUT_MS)? {
            config.health.probe_timeout = Duration::from_millis(ms);
        }

        if let Some(retries) = parse_var(&lookup, MAX_RETRIES)? {
            config.subscription.max_retries = retries;
        }
        if let Some(ms) = parse_var(&lookup, RETRY_DELAY_MS)? {
            config.subscription.retry_delay = Duration::from_millis(ms);
        }
        if let Some(enabled) = parse_flag(&lookup, ENABLE_FALLBACK)? {
            config.subscription.enable_fallback = enabled;
        }
        if let Some(ms) = parse_var(&lookup, FALLBACK_INTERVAL_MS)? {
            config.subscription.fallback_interval = Duration::from_millis(ms);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_max_size == 0 {
            return Err(ConfigError::ZeroQueueCapacity);
        }
        self.health.validate()?;
        self.subscription.validate()?;
        Ok(())
    }
}

fn parse_var<F, T>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    let Some(raw) = lookup(name) else {
        return Ok(None);
    };
    raw.trim()
        .parse()
        .map(Some)
        .map_err(|err: T::Err| ConfigError::InvalidVar {
            name,
            value: raw.clone(),
            reason: err.to_string(),
        })
}

fn parse_flag<F>(lookup: &F, name: &'static str) -> Result<Option<bool>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(name) else {
        return Ok(None);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        _ => Err(ConfigError::InvalidVar {
            name,
            value: raw,
            reason: "expected a boolean".to_string(),
        }),
    }
}
