use forgeops_core::RequestId;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("queue capacity must be at least 1 (got {0})")]
    InvalidCapacity(usize),

    #[error("request id already queued: {0}")]
    DuplicateId(RequestId),
}
