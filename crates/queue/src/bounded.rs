//! Bounded urgency-ordered queue.
//!
//! Ordering key is `(Reverse(priority), sequence)`:
//! - higher urgency sorts first
//! - among equal urgency, lower insertion sequence (older) sorts first
//!
//! Both ends of the ordered map are meaningful: the front is the next item to
//! dequeue, the back holds the lowest urgency level (used for eviction).

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use tracing::warn;

use forgeops_core::{RequestId, Urgency};

use crate::error::QueueError;
use crate::item::QueueItem;
use crate::stats::QueueStats;

/// Default capacity when callers do not choose one.
pub const DEFAULT_MAX_SIZE: usize = 100;

type OrderKey = (Reverse<Urgency>, u64);

/// Outcome of a successful [`BoundedPriorityQueue::enqueue`].
#[derive(Debug)]
pub struct Enqueued<T> {
    pub request_id: RequestId,
    /// Item dropped to make room, if the queue was full.
    pub evicted: Option<QueueItem<T>>,
}

/// Priority queue with a hard capacity bound.
///
/// Invariants:
/// - `len() <= max_size()` at all times
/// - request ids are unique among live items
#[derive(Debug)]
pub struct BoundedPriorityQueue<T> {
    entries: BTreeMap<OrderKey, QueueItem<T>>,
    index: HashMap<RequestId, OrderKey>,
    max_size: usize,
    next_sequence: u64,
}

impl<T> BoundedPriorityQueue<T> {
    pub fn new(max_size: usize) -> Result<Self, QueueError> {
        if max_size == 0 {
            return Err(QueueError::InvalidCapacity(max_size));
        }

        Ok(Self {
            entries: BTreeMap::new(),
            index: HashMap::new(),
            max_size,
            next_sequence: 0,
        })
    }

    pub fn with_default_capacity() -> Self {
        Self {
            entries: BTreeMap::new(),
            index: HashMap::new(),
            max_size: DEFAULT_MAX_SIZE,
            next_sequence: 0,
        }
    }

    /// Insert an item.
    ///
    /// When the queue is full, exactly one item is evicted first: the oldest
    /// item at the lowest urgency level currently present. Overflow is never an
    /// error; a duplicate live id is.
    pub fn enqueue(
        &mut self,
        item: T,
        priority: Urgency,
        request_id: RequestId,
    ) -> Result<Enqueued<T>, QueueError> {
        if self.index.contains_key(&request_id) {
            return Err(QueueError::DuplicateId(request_id));
        }

        let evicted = if self.entries.len() >= self.max_size {
            self.evict_lowest()
        } else {
            None
        };

        if let Some(dropped) = &evicted {
            warn!(
                evicted_id = %dropped.request_id,
                evicted_priority = %dropped.priority,
                incoming_id = %request_id,
                incoming_priority = %priority,
                max_size = self.max_size,
                "queue full; evicted lowest-priority item"
            );
        }

        let sequence = self.next_sequence;
        self.next_sequence += 1;

        let key = (Reverse(priority), sequence);
        self.index.insert(request_id.clone(), key);
        self.entries.insert(
            key,
            QueueItem {
                item,
                priority,
                created_at: Utc::now(),
                request_id: request_id.clone(),
                sequence,
            },
        );

        Ok(Enqueued {
            request_id,
            evicted,
        })
    }

    /// Remove and return the highest-priority, oldest item.
    pub fn dequeue(&mut self) -> Option<QueueItem<T>> {
        let (_, entry) = self.entries.pop_first()?;
        self.index.remove(&entry.request_id);
        Some(entry)
    }

    /// Same selection as [`dequeue`](Self::dequeue), without removing.
    pub fn peek(&self) -> Option<&QueueItem<T>> {
        self.entries.values().next()
    }

    /// Remove a pending item by id. Returns whether it was present.
    pub fn remove(&mut self, request_id: &RequestId) -> bool {
        self.take(request_id).is_some()
    }

    /// Remove a pending item by id and hand it back.
    pub fn take(&mut self, request_id: &RequestId) -> Option<QueueItem<T>> {
        let key = self.index.remove(request_id)?;
        self.entries.remove(&key)
    }

    pub fn contains(&self, request_id: &RequestId) -> bool {
        self.index.contains_key(request_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Alias of [`len`](Self::len).
    pub fn size(&self) -> usize {
        self.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Items in dequeue order.
    pub fn iter(&self) -> impl Iterator<Item = &QueueItem<T>> {
        self.entries.values()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }

    pub fn stats(&self) -> QueueStats {
        let mut stats = QueueStats::empty(self.max_size);

        for entry in self.entries.values() {
            stats.total += 1;
            *stats.by_urgency.entry(entry.priority).or_insert(0) += 1;

            if stats.oldest.is_none_or(|t| entry.created_at < t) {
                stats.oldest = Some(entry.created_at);
            }
            if stats.newest.is_none_or(|t| entry.created_at > t) {
                stats.newest = Some(entry.created_at);
            }
        }

        stats
    }

    fn evict_lowest(&mut self) -> Option<QueueItem<T>> {
        let (Reverse(lowest), _) = *self.entries.keys().next_back()?;
        let key = *self.entries.range((Reverse(lowest), 0)..).next()?.0;
        let entry = self.entries.remove(&key)?;
        self.index.remove(&entry.request_id);
        Some(entry)
    }
}

impl<T: Clone> BoundedPriorityQueue<T> {
    /// Priority-ordered snapshot; the queue is left untouched.
    pub fn get_all(&self) -> Vec<QueueItem<T>> {
        self.entries.values().cloned().collect()
    }
}

impl<T> Default for BoundedPriorityQueue<T> {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}
