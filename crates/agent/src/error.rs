use forgeops_queue::QueueError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Queue(#[from] QueueError),
}
