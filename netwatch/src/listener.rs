//! Subscriber-facing callback trait and subscription identity.

use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Callbacks delivered on aggregate connectivity transitions.
///
/// Implementations are invoked from the observer's event pump task, so
/// they must be `Send + Sync`. Callbacks should return quickly; a slow
/// listener delays delivery to the listeners after it.
///
/// Each registered listener sees the same ordered sequence of
/// transitions. A listener is free to call back into the observer from
/// inside a callback, including unsubscribing itself.
///
/// # Example
///
/// ```rust
/// use netwatch::ConnectivityListener;
///
/// struct Logger;
///
/// impl ConnectivityListener for Logger {
///     fn on_connected(&self) {
///         println!("online");
///     }
///
///     fn on_disconnected(&self) {
///         println!("offline");
///     }
/// }
/// ```
pub trait ConnectivityListener: Send + Sync {
    /// The host transitioned to connected.
    fn on_connected(&self);

    /// The host transitioned to disconnected.
    fn on_disconnected(&self);
}

/// Handle identifying one subscription.
///
/// Returned by `subscribe` and consumed by `unsubscribe`. Subscribing
/// the same listener twice returns the id of the existing subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Display for SubscriptionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let a = SubscriptionId::new();
        let b = SubscriptionId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn id_displays_as_uuid() {
        let id = SubscriptionId::new();
        let shown = format!("{id}");
        assert_eq!(shown.len(), 36);
        assert_eq!(shown.matches('-').count(), 4);
    }
}
