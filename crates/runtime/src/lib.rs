//! `forgeops-runtime`
//!
//! **Responsibility:** wire the queue, the health monitor and the subscription
//! manager into one explicitly constructed context.
//!
//! There is no global accessor. A host builds one [`AppContext`] at startup
//! (tests build as many as they like) and hands out clones of its parts.

pub mod config;
pub mod context;

pub use config::{ConfigError, RuntimeConfig};
pub use context::{AppContext, RuntimeError};
pub use forgeops_observability::init as init_logging;
