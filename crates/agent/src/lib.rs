//! `forgeops-agent`
//!
//! **Responsibility:** intake of automated-agent requests.
//!
//! This crate decides *in which order* agent work is handed out; it never runs it:
//! - It owns the request envelope and the "what counts as priority" rule.
//! - It must not interpret prompts or contexts (opaque payloads).
//! - Dispatching (dequeue loop + agent invocation) belongs to the host.

pub mod error;
pub mod queue;
pub mod request;

pub use error::AgentError;
pub use queue::RequestQueue;
pub use request::{ConversationRequest, RequestKind};
