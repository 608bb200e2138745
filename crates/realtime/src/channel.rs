//! Live change-notification channels (collaborator contract).

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tokio::sync::mpsc;

use forgeops_core::ResourceName;

use crate::error::ChannelError;

/// Identifier a source assigns to an established channel.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub u64);

impl core::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "ch-{}", self.0)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// One change notification for a watched resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub resource: ResourceName,
    pub kind: ChangeKind,
    pub payload: JsonValue,
    pub received_at: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn new(resource: ResourceName, kind: ChangeKind, payload: JsonValue) -> Self {
        Self {
            resource,
            kind,
            payload,
            received_at: Utc::now(),
        }
    }
}

/// What an established channel delivers.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelMessage {
    Change(ChangeEvent),
    /// The channel failed after being established. The subscriber releases it.
    Error(ChannelError),
}

/// Transport parameters handed to the source unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelOptions {
    pub heartbeat_interval: Duration,
    /// Source-level reconnect schedule for dropped sockets.
    pub reconnect_after: Vec<Duration>,
    pub events_per_second: u32,
}

/// An established channel.
///
/// The receiver closing (all senders dropped) counts as [`ChannelError::Closed`].
#[derive(Debug)]
pub struct LiveChannel {
    pub id: ChannelId,
    pub events: mpsc::UnboundedReceiver<ChannelMessage>,
}

/// A source of live change notifications.
#[async_trait]
pub trait LiveSource: Send + Sync + 'static {
    /// Open a channel for `resource`. Resolves once the channel is established
    /// or has definitively failed.
    async fn subscribe(
        &self,
        resource: &ResourceName,
        options: &ChannelOptions,
    ) -> Result<LiveChannel, ChannelError>;

    /// Release a channel. Unknown ids are ignored.
    async fn unsubscribe(&self, channel: ChannelId);
}
