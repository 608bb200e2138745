//! `forgeops-core`: shared building blocks for request scheduling and live sync.
//!
//! This crate contains **pure** primitives (no IO, no async runtime).

pub mod error;
pub mod id;
pub mod urgency;

pub use error::CoreError;
pub use id::{RequestId, ResourceName};
pub use urgency::Urgency;
