use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use forgeops_core::{RequestId, Urgency};

/// An entry held by a [`BoundedPriorityQueue`](crate::BoundedPriorityQueue).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueItem<T> {
    pub item: T,
    pub priority: Urgency,
    pub created_at: DateTime<Utc>,
    pub request_id: RequestId,
    /// Insertion counter, strictly increasing per queue.
    ///
    /// Used as the FIFO tie-break instead of `created_at`, which can collide.
    pub sequence: u64,
}

impl<T> QueueItem<T> {
    pub fn into_inner(self) -> T {
        self.item
    }
}
