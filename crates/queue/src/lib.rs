//! `forgeops-queue`
//!
//! **Responsibility:** generic, bounded, urgency-ordered storage.
//!
//! - Highest urgency first, FIFO among equal urgency.
//! - Capacity is enforced by evicting the oldest item of the lowest urgency present.
//! - Passive storage only: no dispatching, no IO.

pub mod bounded;
pub mod error;
pub mod item;
pub mod shared;
pub mod stats;

pub use bounded::{BoundedPriorityQueue, DEFAULT_MAX_SIZE, Enqueued};
pub use error::QueueError;
pub use item::QueueItem;
pub use shared::SharedQueue;
pub use stats::QueueStats;
