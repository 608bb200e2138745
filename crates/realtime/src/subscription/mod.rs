//! Resilient live-data subscriptions.
//!
//! Each watched resource is driven by one actor task that owns all of its
//! state. The caller holds a [`SubscriptionHandle`]; everything else (timers,
//! the live channel, the polling loop) lives inside the actor and ends with it.
//!
//! ```text
//! Disconnected ─► Connecting ─► Connected
//!                    ▲   │           │ error
//!                    │   └─error─► Retrying ─(retries exhausted)─► FallbackPolling
//!                    └──backoff──────┘                                  │
//!                    └───────────────── retry_realtime() ───────────────┘
//! any state ─stop()─► Destroyed
//! ```

mod actor;
pub mod config;
pub mod handler;
pub mod manager;
pub mod state;

pub use config::SubscriptionConfig;
pub use handler::{ChangeHandler, Refresh};
pub use manager::{SubscriptionHandle, SubscriptionManager};
pub use state::{SubscriptionPhase, SubscriptionState};
