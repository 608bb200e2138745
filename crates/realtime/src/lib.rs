//! `forgeops-realtime`
//!
//! **Responsibility:** keep UI-facing data fresh against a live change source.
//!
//! This crate provides:
//! - A connection health monitor (periodic probe, failure streak, latency)
//! - A per-resource subscription state machine with two retry policies
//! - Degradation to fixed-interval polling when live delivery is unreliable
//!
//! The live source, the backend probe and the refresh callback are external
//! collaborators, modelled as traits. In-memory implementations live in
//! [`in_memory`] for tests and local development.

pub mod channel;
pub mod error;
pub mod health;
pub mod in_memory;
pub mod policy;
pub mod probe;
pub mod subscription;

mod millis;

pub use channel::{
    ChangeEvent, ChangeKind, ChannelId, ChannelMessage, ChannelOptions, LiveChannel, LiveSource,
};
pub use error::{ChannelError, ConfigError, HealthError, ProbeError, SubscriptionError};
pub use health::{ConnectionHealthState, HealthConfig, HealthMonitor, HealthSignal};
pub use in_memory::{InMemoryLiveSource, ToggleProbe};
pub use policy::{BackoffStrategy, RetryPolicies, RetryPolicy};
pub use probe::Probe;
pub use subscription::{
    ChangeHandler, Refresh, SubscriptionConfig, SubscriptionHandle, SubscriptionManager,
    SubscriptionPhase, SubscriptionState,
};
