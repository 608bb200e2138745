//! Request queue adapter.
//!
//! Binds `ConversationRequest::id` as the queue key and
//! `ConversationRequest::effective_priority` as the ordering priority. No other
//! rules live here; ordering and capacity are the generic queue's job.

use tracing::{debug, info};

use forgeops_core::RequestId;
use forgeops_queue::{BoundedPriorityQueue, QueueStats, SharedQueue};

use crate::error::AgentError;
use crate::request::ConversationRequest;

/// Cloneable handle to a queue of pending agent requests.
///
/// Construct one per process (or per test) and pass it to whoever needs it.
#[derive(Debug, Clone)]
pub struct RequestQueue {
    inner: SharedQueue<ConversationRequest>,
}

impl RequestQueue {
    pub fn new(max_size: usize) -> Result<Self, AgentError> {
        Ok(Self {
            inner: SharedQueue::new(max_size)?,
        })
    }

    pub fn with_default_capacity() -> Self {
        Self {
            inner: SharedQueue::from_queue(BoundedPriorityQueue::with_default_capacity()),
        }
    }

    /// Queue a request.
    ///
    /// Returns the request evicted to make room, if the queue was full.
    pub fn enqueue(
        &self,
        request: ConversationRequest,
    ) -> Result<Option<ConversationRequest>, AgentError> {
        let priority = request.effective_priority();
        let id = request.id.clone();
        let kind = request.kind;

        let outcome = self.inner.enqueue(request, priority, id)?;
        debug!(request_id = %outcome.request_id, priority = %priority, kind = ?kind, "request queued");

        Ok(outcome.evicted.map(|entry| entry.into_inner()))
    }

    /// Next request to dispatch, if any.
    pub fn dequeue(&self) -> Option<ConversationRequest> {
        self.inner.dequeue().map(|entry| entry.into_inner())
    }

    pub fn peek(&self) -> Option<ConversationRequest> {
        self.inner.peek().map(|entry| entry.into_inner())
    }

    /// Cancel a pending request.
    pub fn remove(&self, id: &RequestId) -> bool {
        let removed = self.inner.remove(id);
        if removed {
            info!(request_id = %id, "pending request cancelled");
        }
        removed
    }

    pub fn contains(&self, id: &RequestId) -> bool {
        self.inner.contains(id)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Pending requests in dispatch order.
    pub fn pending(&self) -> Vec<ConversationRequest> {
        self.inner
            .get_all()
            .into_iter()
            .map(|entry| entry.into_inner())
            .collect()
    }

    pub fn stats(&self) -> QueueStats {
        self.inner.stats()
    }

    pub fn clear(&self) {
        self.inner.clear();
    }
}

impl Default for RequestQueue {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}
