//! Backend probes.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::error::ProbeError;

/// One cheap operation against the backend (e.g. a single-row read).
///
/// Used both for coarse reachability checks and by the health monitor.
#[async_trait]
pub trait Probe: Send + Sync + 'static {
    async fn probe(&self) -> Result<(), ProbeError>;
}

#[async_trait]
impl<P> Probe for Arc<P>
where
    P: Probe + ?Sized,
{
    async fn probe(&self) -> Result<(), ProbeError> {
        (**self).probe().await
    }
}

/// Run `probe` bounded by `timeout`, returning the measured round trip.
///
/// Exceeding the bound is reported as [`ProbeError::Timeout`].
pub async fn probe_within(probe: &dyn Probe, timeout: Duration) -> Result<Duration, ProbeError> {
    let started = Instant::now();
    match tokio::time::timeout(timeout, probe.probe()).await {
        Ok(Ok(())) => Ok(started.elapsed()),
        Ok(Err(err)) => Err(err),
        Err(_) => Err(ProbeError::Timeout(timeout)),
    }
}
