//! Caller-supplied callbacks.

use std::future::Future;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::channel::{ChangeEvent, ChangeKind};

/// Receives live change events. All methods default to no-ops.
///
/// Called from the subscription's own task, one event at a time.
pub trait ChangeHandler: Send + 'static {
    fn on_insert(&mut self, _event: &ChangeEvent) {}
    fn on_update(&mut self, _event: &ChangeEvent) {}
    fn on_delete(&mut self, _event: &ChangeEvent) {}
}

pub(crate) fn dispatch(handler: &mut dyn ChangeHandler, event: &ChangeEvent) {
    match event.kind {
        ChangeKind::Insert => handler.on_insert(event),
        ChangeKind::Update => handler.on_update(event),
        ChangeKind::Delete => handler.on_delete(event),
    }
}

/// Ignores live events (polling-only consumers).
impl ChangeHandler for () {}

/// Forwards every event into a channel. A closed receiver drops events.
impl ChangeHandler for mpsc::UnboundedSender<ChangeEvent> {
    fn on_insert(&mut self, event: &ChangeEvent) {
        let _ = self.send(event.clone());
    }

    fn on_update(&mut self, event: &ChangeEvent) {
        let _ = self.send(event.clone());
    }

    fn on_delete(&mut self, event: &ChangeEvent) {
        let _ = self.send(event.clone());
    }
}

/// Full re-fetch used while live delivery is degraded.
///
/// Failures are logged by the caller of `refresh`; they never change
/// subscription state.
#[async_trait]
pub trait Refresh: Send + Sync + 'static {
    async fn refresh(&self) -> anyhow::Result<()>;
}

#[async_trait]
impl<F, Fut> Refresh for F
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn refresh(&self) -> anyhow::Result<()> {
        (self)().await
    }
}
