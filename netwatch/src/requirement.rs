//! Network requirement describing which networks qualify for observation.

use crate::constants::device_type;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Transport technology a network rides on.
///
/// Mirrors the device classes NetworkManager distinguishes; backends
/// for other facilities map their own codes onto the same set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transport {
    /// Wired Ethernet.
    Ethernet,
    /// 802.11 wireless.
    Wifi,
    /// Mobile broadband (LTE, 5G, ...).
    Cellular,
    /// Bluetooth tethering.
    Bluetooth,
}

impl Transport {
    /// Maps a NetworkManager device type code onto a transport.
    ///
    /// Returns `None` for device classes that never carry internet
    /// traffic on their own (bridges, loopback, P2P).
    pub fn from_device_type(code: u32) -> Option<Self> {
        match code {
            device_type::ETHERNET => Some(Self::Ethernet),
            device_type::WIFI => Some(Self::Wifi),
            device_type::MODEM => Some(Self::Cellular),
            device_type::BLUETOOTH => Some(Self::Bluetooth),
            _ => None,
        }
    }
}

impl Display for Transport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ethernet => write!(f, "ethernet"),
            Self::Wifi => write!(f, "wifi"),
            Self::Cellular => write!(f, "cellular"),
            Self::Bluetooth => write!(f, "bluetooth"),
        }
    }
}

/// Which networks an observer cares about.
///
/// A network qualifies when it provides internet reachability (if
/// required), rides on one of the allowed transports, and satisfies the
/// metering constraint. An empty transport list allows any transport.
///
/// # Examples
///
/// ```rust
/// use netwatch::{NetworkRequirement, Transport};
///
/// // Internet over anything (the default)
/// let any = NetworkRequirement::default();
///
/// // Internet over Wi-Fi or cellular only
/// let mobile = NetworkRequirement::new()
///     .with_transport(Transport::Wifi)
///     .with_transport(Transport::Cellular);
///
/// // Large transfers: unmetered links only
/// let bulk = NetworkRequirement::new().unmetered_only();
/// # let _ = (any, mobile, bulk);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkRequirement {
    /// Whether the network must provide internet reachability.
    pub internet: bool,
    /// Allowed transports. Empty means any transport qualifies.
    pub transports: Vec<Transport>,
    /// Whether only unmetered networks qualify.
    pub require_unmetered: bool,
}

impl Default for NetworkRequirement {
    /// Returns the default requirement.
    ///
    /// Defaults:
    /// - `internet`: `true`
    /// - `transports`: empty (any transport)
    /// - `require_unmetered`: `false`
    fn default() -> Self {
        Self {
            internet: true,
            transports: Vec::new(),
            require_unmetered: false,
        }
    }
}

impl NetworkRequirement {
    /// Creates the default requirement: internet over any transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a transport to the allowed set.
    pub fn with_transport(mut self, transport: Transport) -> Self {
        if !self.transports.contains(&transport) {
            self.transports.push(transport);
        }
        self
    }

    /// Restricts the requirement to unmetered networks.
    pub fn unmetered_only(mut self) -> Self {
        self.require_unmetered = true;
        self
    }

    /// Whether a network on `transport` satisfies the transport
    /// constraint.
    pub fn allows_transport(&self, transport: Transport) -> bool {
        self.transports.is_empty() || self.transports.contains(&transport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_allows_any_transport() {
        let req = NetworkRequirement::default();
        assert!(req.internet);
        assert!(!req.require_unmetered);
        assert!(req.allows_transport(Transport::Ethernet));
        assert!(req.allows_transport(Transport::Cellular));
    }

    #[test]
    fn transport_list_restricts() {
        let req = NetworkRequirement::new().with_transport(Transport::Wifi);
        assert!(req.allows_transport(Transport::Wifi));
        assert!(!req.allows_transport(Transport::Ethernet));
    }

    #[test]
    fn with_transport_deduplicates() {
        let req = NetworkRequirement::new()
            .with_transport(Transport::Wifi)
            .with_transport(Transport::Wifi);
        assert_eq!(req.transports.len(), 1);
    }

    #[test]
    fn device_type_mapping() {
        assert_eq!(Transport::from_device_type(1), Some(Transport::Ethernet));
        assert_eq!(Transport::from_device_type(2), Some(Transport::Wifi));
        assert_eq!(Transport::from_device_type(5), Some(Transport::Bluetooth));
        assert_eq!(Transport::from_device_type(8), Some(Transport::Cellular));
        assert_eq!(Transport::from_device_type(32), None);
    }
}
