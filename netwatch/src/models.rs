use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use thiserror::Error;

/// Aggregate connectivity status of the host.
///
/// A single authoritative value per observer, updated only in response
/// to events from the host monitoring facility. `Unknown` is the value
/// before the first event after `start()` and again after `stop()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectivityState {
    /// No event has been observed yet.
    Unknown,
    /// At least one qualifying network is up.
    Connected,
    /// No qualifying network is up.
    Disconnected,
}

impl Display for ConnectivityState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::Connected => write!(f, "connected"),
            Self::Disconnected => write!(f, "disconnected"),
        }
    }
}

/// Lifecycle state of a [`ConnectivityObserver`](crate::ConnectivityObserver).
///
/// Orthogonal to [`ConnectivityState`]: the lifecycle tracks the
/// observer's own registration against the host facility, not whether
/// the host is online.
///
/// Valid transitions:
///
/// - `Unconfigured` → `Configured` via `configure`
/// - `Configured` → `Started` via `start`
/// - `Started` → `Stopped` via `stop`
/// - `Stopped` → `Configured` via `configure`, or `Stopped` → `Started`
///   via `start` (the stored facility binding is reused)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// No facility binding yet.
    Unconfigured,
    /// Bound to a facility and requirement; not yet watching.
    Configured,
    /// Watching; the event pump is running.
    Started,
    /// Previously started, now deregistered. Re-enterable.
    Stopped,
}

impl Display for Lifecycle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unconfigured => write!(f, "unconfigured"),
            Self::Configured => write!(f, "configured"),
            Self::Started => write!(f, "started"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

/// Opaque identity of one network as issued by the host facility.
///
/// The monitoring backend chooses the token; the NetworkManager backend
/// uses the device's D-Bus object path. The observer only ever compares
/// ids, it never interprets them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NetworkId(String);

impl NetworkId {
    /// Wraps a backend-issued token.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for NetworkId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One transition reported by the host facility for a matching network.
///
/// The host delivers one event per matching network, so several
/// `Available` events may arrive while the aggregate state is already
/// connected (e.g. Wi-Fi and cellular both up). De-duplication against
/// the aggregate state is the observer's job, not the backend's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetworkEvent {
    /// A network satisfying the requirement came up.
    Available(NetworkId),
    /// A previously available network went away.
    Lost(NetworkId),
}

/// Errors that can occur while configuring or driving an observer.
///
/// # Examples
///
/// ```no_run
/// use netwatch::{ConnectivityObserver, ObserverError};
///
/// # async fn example(observer: ConnectivityObserver) {
/// match observer.start().await {
///     Ok(()) => println!("watching"),
///     Err(ObserverError::AlreadyStarted) => {
///         eprintln!("start() called twice without stop()");
///     }
///     Err(e) => eprintln!("error: {e}"),
/// }
/// # }
/// ```
#[derive(Debug, Error)]
pub enum ObserverError {
    /// A D-Bus communication error occurred.
    #[error("D-Bus error: {0}")]
    Dbus(#[from] zbus::Error),

    /// The platform cannot supply a usable network monitoring facility.
    ///
    /// Surfaced synchronously by `configure` when the facility probe
    /// fails; never retried internally.
    #[error("network monitoring facility unavailable: {0}")]
    FacilityUnavailable(String),

    /// `start()` was invoked while the observer was already started.
    ///
    /// Reported instead of silently ignoring the call, since a second
    /// registration against the host facility would leak.
    #[error("observer already started")]
    AlreadyStarted,

    /// An operation was invoked in a lifecycle state that does not
    /// allow it (e.g. `subscribe` before `configure`).
    #[error("cannot {op} while {state}")]
    InvalidState {
        /// The operation that was attempted.
        op: &'static str,
        /// The lifecycle state the observer was in.
        state: Lifecycle,
    },
}
