//! Capability seam between the observer and the host network facility.

use crate::{NetworkEvent, NetworkRequirement, Result};
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

/// Stream of network events produced by a monitoring backend.
pub type EventStream = Pin<Box<dyn Stream<Item = NetworkEvent> + Send>>;

/// Access to the host's network monitoring facility.
///
/// The observer drives whichever backend it is configured with through
/// this trait. The production backend talks to NetworkManager over
/// D-Bus; tests substitute a scripted fake.
///
/// Contract:
///
/// - `probe` checks that the facility is reachable at all. It is called
///   once during `configure` and its failure is surfaced synchronously;
///   the observer never retries it.
/// - `watch` registers interest in networks matching `requirement` and
///   returns the resulting event stream. One call corresponds to one
///   registration with the facility. Dropping the returned stream
///   deregisters. For every network that already satisfies the
///   requirement when `watch` is called, the stream yields an initial
///   `Available` event.
#[async_trait]
pub trait NetworkMonitor: Send + Sync {
    /// Checks that the facility is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ObserverError::FacilityUnavailable`] when the host has
    /// no usable monitoring facility, or a transport error when the
    /// check itself could not be performed.
    ///
    /// [`ObserverError::FacilityUnavailable`]: crate::ObserverError::FacilityUnavailable
    async fn probe(&self) -> Result<()>;

    /// Registers interest and returns the event stream.
    ///
    /// # Errors
    ///
    /// Returns an error when registration with the facility fails; no
    /// stream exists in that case and nothing needs to be undone.
    async fn watch(&self, requirement: &NetworkRequirement) -> Result<EventStream>;
}
