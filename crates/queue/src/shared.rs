//! Thread-safe handle around [`BoundedPriorityQueue`].

use std::sync::{Arc, Mutex, MutexGuard};

use forgeops_core::{RequestId, Urgency};

use crate::bounded::{BoundedPriorityQueue, Enqueued};
use crate::error::QueueError;
use crate::item::QueueItem;
use crate::stats::QueueStats;

/// Shared queue handle.
///
/// Concurrent producers are linearized by a single lock, so insertion order
/// (and therefore FIFO-within-urgency) is the order in which the lock was won.
///
/// Cheap to clone; all clones see the same queue.
#[derive(Debug)]
pub struct SharedQueue<T> {
    inner: Arc<Mutex<BoundedPriorityQueue<T>>>,
}

impl<T> Clone for SharedQueue<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> SharedQueue<T> {
    pub fn new(max_size: usize) -> Result<Self, QueueError> {
        Ok(Self::from_queue(BoundedPriorityQueue::new(max_size)?))
    }

    pub fn from_queue(queue: BoundedPriorityQueue<T>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(queue)),
        }
    }

    pub fn enqueue(
        &self,
        item: T,
        priority: Urgency,
        request_id: RequestId,
    ) -> Result<Enqueued<T>, QueueError> {
        self.lock().enqueue(item, priority, request_id)
    }

    pub fn dequeue(&self) -> Option<QueueItem<T>> {
        self.lock().dequeue()
    }

    pub fn remove(&self, request_id: &RequestId) -> bool {
        self.lock().remove(request_id)
    }

    pub fn contains(&self, request_id: &RequestId) -> bool {
        self.lock().contains(request_id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.lock().max_size()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn stats(&self) -> QueueStats {
        self.lock().stats()
    }

    // Every queue operation leaves the structure consistent before it can
    // panic, so a poisoned lock still guards a valid queue.
    fn lock(&self) -> MutexGuard<'_, BoundedPriorityQueue<T>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<T: Clone> SharedQueue<T> {
    pub fn peek(&self) -> Option<QueueItem<T>> {
        self.lock().peek().cloned()
    }

    pub fn get_all(&self) -> Vec<QueueItem<T>> {
        self.lock().get_all()
    }
}
