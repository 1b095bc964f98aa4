//! Connectivity observation over an injected monitoring backend.
//!
//! The observer owns the lifecycle around one facility registration:
//! it is configured with a [`NetworkRequirement`] and a backend, started
//! to register interest and pump events, and stopped to deregister.
//! Subscribers receive `on_connected`/`on_disconnected` callbacks only
//! when the aggregate state actually changes, no matter how many
//! matching networks come and go underneath.
//!
//! # Signal-Based Monitoring
//!
//! The pump consumes the backend's event stream instead of polling:
//!
//! - Immediate response to state changes (no polling delay)
//! - Lower CPU usage (no spinning loops)
//! - No missed rapid transitions between reads
//!
//! All mutable state sits behind one mutex that is never held across an
//! await or a listener callback, so listeners may call back into the
//! observer (including unsubscribing themselves) from inside a handler.

use futures::StreamExt;
use log::{debug, warn};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::Result;
use crate::listener::{ConnectivityListener, SubscriptionId};
use crate::models::{ConnectivityState, Lifecycle, NetworkEvent, NetworkId, ObserverError};
use crate::monitor::{EventStream, NetworkMonitor};
use crate::requirement::NetworkRequirement;

/// One registered subscriber.
///
/// The reference is weak: registration never extends a subscriber's
/// lifetime, and dead entries are pruned opportunistically.
struct Registration {
    id: SubscriptionId,
    listener: Weak<dyn ConnectivityListener>,
}

/// The facility binding installed by `configure`.
struct Binding {
    requirement: NetworkRequirement,
    monitor: Arc<dyn NetworkMonitor>,
}

/// Handle to the running event pump task.
struct Pump {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// Cancels the pump when the observer is dropped without `stop()`.
impl Drop for Pump {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

struct Inner {
    lifecycle: Lifecycle,
    binding: Option<Binding>,
    connectivity: ConnectivityState,
    /// Networks currently up and matching the requirement, keyed by the
    /// backend-issued id. Connected iff non-empty.
    up: HashSet<NetworkId>,
    subscribers: Vec<Registration>,
    /// Bumped by `start` and `stop`. A pump only dispatches while the
    /// epoch it was spawned under is still current, so events from a
    /// superseded cycle are inert.
    epoch: u64,
    pump: Option<Pump>,
}

impl Inner {
    fn new() -> Self {
        Self {
            lifecycle: Lifecycle::Unconfigured,
            binding: None,
            connectivity: ConnectivityState::Unknown,
            up: HashSet::new(),
            subscribers: Vec::new(),
            epoch: 0,
            pump: None,
        }
    }

    /// Applies one event to the up-set and returns the new aggregate
    /// state if it changed.
    fn apply(&mut self, event: &NetworkEvent) -> Option<ConnectivityState> {
        match event {
            NetworkEvent::Available(id) => {
                self.up.insert(id.clone());
            }
            NetworkEvent::Lost(id) => {
                self.up.remove(id);
            }
        }

        let next = if self.up.is_empty() {
            ConnectivityState::Disconnected
        } else {
            ConnectivityState::Connected
        };

        if next == self.connectivity {
            None
        } else {
            self.connectivity = next;
            Some(next)
        }
    }

    fn prune_dead(&mut self) {
        self.subscribers.retain(|r| r.listener.strong_count() > 0);
    }

    /// Upgrades the live subscribers in subscription order, pruning the
    /// dead ones on the way.
    fn snapshot_listeners(&mut self) -> Vec<Arc<dyn ConnectivityListener>> {
        let mut live = Vec::with_capacity(self.subscribers.len());
        self.subscribers.retain(|r| match r.listener.upgrade() {
            Some(listener) => {
                live.push(listener);
                true
            }
            None => false,
        });
        live
    }
}

/// Observer of aggregate internet connectivity.
///
/// A cheap cloneable handle; clones share the same state, so a process
/// keeps one observer and hands clones to whoever needs to subscribe or
/// query it.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use netwatch::{ConnectivityObserver, NetworkManagerMonitor, NetworkRequirement};
///
/// # async fn example(listener: Arc<dyn netwatch::ConnectivityListener>) -> netwatch::Result<()> {
/// let observer = ConnectivityObserver::new();
/// let monitor = Arc::new(NetworkManagerMonitor::new().await?);
///
/// observer.configure(NetworkRequirement::default(), monitor).await?;
/// let id = observer.subscribe(listener)?;
/// observer.start().await?;
///
/// // ... callbacks fire on transitions ...
///
/// observer.stop().await?;
/// observer.unsubscribe(id);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ConnectivityObserver {
    inner: Arc<Mutex<Inner>>,
}

impl Default for ConnectivityObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectivityObserver {
    /// Creates an unconfigured observer with connectivity `Unknown`.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::new())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Binds the observer to a monitoring backend.
    ///
    /// Probes the backend first; the binding is only installed when the
    /// probe succeeds, so a failed `configure` leaves the observer
    /// exactly as it was. Re-configuring replaces the previous binding.
    ///
    /// # Errors
    ///
    /// Returns [`ObserverError::InvalidState`] while started, and the
    /// probe's error when the facility is unusable.
    pub async fn configure(
        &self,
        requirement: NetworkRequirement,
        monitor: Arc<dyn NetworkMonitor>,
    ) -> Result<()> {
        // Check current state first
        {
            let state = self.lock();
            if state.lifecycle == Lifecycle::Started {
                return Err(ObserverError::InvalidState {
                    op: "configure",
                    state: state.lifecycle,
                });
            }
        }

        monitor.probe().await?;

        // Re-validate: start() may have won the race while probing
        let mut state = self.lock();
        if state.lifecycle == Lifecycle::Started {
            return Err(ObserverError::InvalidState {
                op: "configure",
                state: state.lifecycle,
            });
        }

        debug!("configured with requirement {requirement:?}");
        state.binding = Some(Binding {
            requirement,
            monitor,
        });
        state.lifecycle = Lifecycle::Configured;
        Ok(())
    }

    /// Registers a listener for future connectivity transitions.
    ///
    /// The observer holds only a weak reference; dropping the last
    /// strong reference elsewhere retires the subscription on its own.
    /// Subscribing an already-registered listener returns the existing
    /// id instead of creating a second registration.
    ///
    /// # Errors
    ///
    /// Returns [`ObserverError::InvalidState`] while unconfigured.
    pub fn subscribe(&self, listener: Arc<dyn ConnectivityListener>) -> Result<SubscriptionId> {
        let mut state = self.lock();
        if state.lifecycle == Lifecycle::Unconfigured {
            return Err(ObserverError::InvalidState {
                op: "subscribe",
                state: state.lifecycle,
            });
        }

        state.prune_dead();

        if let Some(existing) = state
            .subscribers
            .iter()
            .find(|r| std::ptr::addr_eq(r.listener.as_ptr(), Arc::as_ptr(&listener)))
        {
            debug!("listener already subscribed as {}", existing.id);
            return Ok(existing.id);
        }

        let id = SubscriptionId::new();
        state.subscribers.push(Registration {
            id,
            listener: Arc::downgrade(&listener),
        });
        debug!("subscribed listener {id}");
        Ok(id)
    }

    /// Removes a registration. Returns whether it was present.
    ///
    /// After this returns, no new dispatch includes the listener; one
    /// dispatch already snapshotted by the pump may still complete.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut state = self.lock();
        state.prune_dead();
        let before = state.subscribers.len();
        state.subscribers.retain(|r| r.id != id);
        let removed = state.subscribers.len() < before;
        if removed {
            debug!("unsubscribed listener {id}");
        }
        removed
    }

    /// Registers interest with the backend and spawns the event pump.
    ///
    /// Exactly one facility registration exists per started observer.
    /// Valid from `Configured` or `Stopped` (re-start reuses the stored
    /// binding); each start begins a fresh cycle with connectivity back
    /// at `Unknown`.
    ///
    /// # Errors
    ///
    /// Returns [`ObserverError::AlreadyStarted`] while started (the
    /// call registers nothing in that case),
    /// [`ObserverError::InvalidState`] while unconfigured, and the
    /// backend's error when `watch` fails, in which case the observer
    /// rolls back to `Configured`.
    pub async fn start(&self) -> Result<()> {
        let (requirement, monitor, my_epoch) = {
            let mut state = self.lock();
            match state.lifecycle {
                Lifecycle::Started => return Err(ObserverError::AlreadyStarted),
                Lifecycle::Unconfigured => {
                    return Err(ObserverError::InvalidState {
                        op: "start",
                        state: state.lifecycle,
                    });
                }
                Lifecycle::Configured | Lifecycle::Stopped => {}
            }
            let Some(binding) = state.binding.as_ref() else {
                return Err(ObserverError::InvalidState {
                    op: "start",
                    state: state.lifecycle,
                });
            };
            let requirement = binding.requirement.clone();
            let monitor = Arc::clone(&binding.monitor);

            // Claim the new cycle before awaiting anything
            state.epoch += 1;
            state.lifecycle = Lifecycle::Started;
            state.connectivity = ConnectivityState::Unknown;
            state.up.clear();
            (requirement, monitor, state.epoch)
        };

        let stream = match monitor.watch(&requirement).await {
            Ok(stream) => stream,
            Err(e) => {
                let mut state = self.lock();
                if state.epoch == my_epoch {
                    warn!("watch registration failed: {e}");
                    state.lifecycle = Lifecycle::Configured;
                }
                return Err(e);
            }
        };

        let mut state = self.lock();
        if state.epoch != my_epoch {
            // A stop() overtook the in-flight watch; dropping the
            // stream deregisters and no pump is spawned.
            debug!("start superseded before pump spawn");
            return Ok(());
        }

        let token = CancellationToken::new();
        let handle = tokio::spawn(run_pump(
            Arc::downgrade(&self.inner),
            stream,
            token.clone(),
            my_epoch,
        ));
        state.pump = Some(Pump { token, handle });
        debug!("started watching (epoch {my_epoch})");
        Ok(())
    }

    /// Deregisters from the backend and stops the event pump.
    ///
    /// Cancels the pump and awaits its exit, so once this returns no
    /// new notification begins. Connectivity resets to `Unknown`;
    /// subscriptions are kept for the next cycle.
    ///
    /// # Errors
    ///
    /// Returns [`ObserverError::InvalidState`] unless started.
    pub async fn stop(&self) -> Result<()> {
        let pump = {
            let mut state = self.lock();
            if state.lifecycle != Lifecycle::Started {
                return Err(ObserverError::InvalidState {
                    op: "stop",
                    state: state.lifecycle,
                });
            }
            state.epoch += 1;
            state.lifecycle = Lifecycle::Stopped;
            state.connectivity = ConnectivityState::Unknown;
            state.up.clear();
            state.pump.take()
        };

        if let Some(mut pump) = pump {
            pump.token.cancel();
            // Await by reference, the handle stays owned by the Drop type
            if let Err(e) = (&mut pump.handle).await {
                warn!("event pump task failed: {e}");
            }
        }
        debug!("stopped watching");
        Ok(())
    }

    /// The current aggregate connectivity state.
    pub fn current_state(&self) -> ConnectivityState {
        self.lock().connectivity
    }

    /// Whether the current aggregate state is `Connected`.
    pub fn is_connected(&self) -> bool {
        self.current_state() == ConnectivityState::Connected
    }

    /// The observer's lifecycle state.
    pub fn lifecycle(&self) -> Lifecycle {
        self.lock().lifecycle
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.lock()
            .subscribers
            .iter()
            .filter(|r| r.listener.strong_count() > 0)
            .count()
    }
}

/// Drains the backend stream, folds events into the aggregate state and
/// fans transitions out to subscribers.
///
/// Holds only a weak reference to the observer state so an observer
/// dropped without `stop()` does not keep the pump alive past its next
/// event.
async fn run_pump(
    inner: Weak<Mutex<Inner>>,
    mut stream: EventStream,
    token: CancellationToken,
    epoch: u64,
) {
    debug!("event pump running (epoch {epoch})");
    loop {
        tokio::select! {
            _ = token.cancelled() => {
                debug!("event pump cancelled");
                break;
            }
            event = stream.next() => {
                let Some(event) = event else {
                    warn!("facility event stream ended");
                    break;
                };
                let Some(shared) = inner.upgrade() else {
                    break;
                };

                // Fold under the lock, notify outside it
                let dispatch = {
                    let mut state = shared.lock().unwrap_or_else(PoisonError::into_inner);
                    if state.epoch != epoch {
                        debug!("event pump superseded (epoch {epoch})");
                        break;
                    }
                    debug!("network event: {event:?}");
                    state
                        .apply(&event)
                        .map(|next| (next, state.snapshot_listeners()))
                };

                if let Some((next, listeners)) = dispatch {
                    debug!("connectivity changed to {next}");
                    notify(&listeners, next);
                }
            }
        }
    }
}

fn notify(listeners: &[Arc<dyn ConnectivityListener>], state: ConnectivityState) {
    for listener in listeners {
        match state {
            ConnectivityState::Connected => listener.on_connected(),
            ConnectivityState::Disconnected => listener.on_disconnected(),
            ConnectivityState::Unknown => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u32) -> NetworkId {
        NetworkId::new(format!("/test/{n}"))
    }

    #[test]
    fn first_available_connects() {
        let mut inner = Inner::new();
        assert_eq!(
            inner.apply(&NetworkEvent::Available(id(1))),
            Some(ConnectivityState::Connected)
        );
    }

    #[test]
    fn second_available_is_silent() {
        let mut inner = Inner::new();
        inner.apply(&NetworkEvent::Available(id(1)));
        assert_eq!(inner.apply(&NetworkEvent::Available(id(2))), None);
        assert_eq!(inner.connectivity, ConnectivityState::Connected);
    }

    #[test]
    fn losing_one_of_two_is_silent() {
        let mut inner = Inner::new();
        inner.apply(&NetworkEvent::Available(id(1)));
        inner.apply(&NetworkEvent::Available(id(2)));
        assert_eq!(inner.apply(&NetworkEvent::Lost(id(1))), None);
    }

    #[test]
    fn losing_last_disconnects() {
        let mut inner = Inner::new();
        inner.apply(&NetworkEvent::Available(id(1)));
        assert_eq!(
            inner.apply(&NetworkEvent::Lost(id(1))),
            Some(ConnectivityState::Disconnected)
        );
    }

    #[test]
    fn initial_lost_reports_disconnected() {
        let mut inner = Inner::new();
        assert_eq!(
            inner.apply(&NetworkEvent::Lost(id(1))),
            Some(ConnectivityState::Disconnected)
        );
    }

    #[test]
    fn unknown_lost_while_connected_is_silent() {
        let mut inner = Inner::new();
        inner.apply(&NetworkEvent::Available(id(1)));
        assert_eq!(inner.apply(&NetworkEvent::Lost(id(9))), None);
        assert_eq!(inner.connectivity, ConnectivityState::Connected);
    }

    #[test]
    fn duplicate_available_then_single_lost_disconnects() {
        let mut inner = Inner::new();
        inner.apply(&NetworkEvent::Available(id(1)));
        inner.apply(&NetworkEvent::Available(id(1)));
        assert_eq!(
            inner.apply(&NetworkEvent::Lost(id(1))),
            Some(ConnectivityState::Disconnected)
        );
    }
}
