use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use forgeops_core::Urgency;

/// Point-in-time summary of a queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    pub total: usize,
    pub max_size: usize,
    /// Count per level; every level is present (zero-filled).
    pub by_urgency: BTreeMap<Urgency, usize>,
    pub oldest: Option<DateTime<Utc>>,
    pub newest: Option<DateTime<Utc>>,
}

impl QueueStats {
    pub(crate) fn empty(max_size: usize) -> Self {
        Self {
            total: 0,
            max_size,
            by_urgency: Urgency::ALL.into_iter().map(|u| (u, 0)).collect(),
            oldest: None,
            newest: None,
        }
    }

    pub fn count(&self, urgency: Urgency) -> usize {
        self.by_urgency.get(&urgency).copied().unwrap_or(0)
    }
}
