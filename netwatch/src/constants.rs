//! Constants for NetworkManager D-Bus interface values.
//!
//! These constants correspond to the numeric codes used by NetworkManager's
//! D-Bus API for device types, device states, and metering status.

/// NetworkManager device type constants.
pub mod device_type {
    pub const ETHERNET: u32 = 1;
    pub const WIFI: u32 = 2;
    pub const BLUETOOTH: u32 = 5;
    pub const MODEM: u32 = 8;
    // pub const BRIDGE: u32 = 13;
    // pub const WIFI_P2P: u32 = 30;
    // pub const LOOPBACK: u32 = 32;
}

/// NetworkManager device state constants
pub mod device_state {
    // pub const UNKNOWN: u32 = 0;
    // pub const UNAVAILABLE: u32 = 20;
    // pub const DISCONNECTED: u32 = 30;
    pub const ACTIVATED: u32 = 100;
    // pub const DEACTIVATING: u32 = 110;
    // pub const FAILED: u32 = 120;
}

/// NetworkManager device metering constants
pub mod metered {
    pub const UNKNOWN: u32 = 0;
    pub const YES: u32 = 1;
    pub const NO: u32 = 2;
    pub const GUESS_YES: u32 = 3;
    pub const GUESS_NO: u32 = 4;

    /// Whether a metering code counts as "not metered" for requirement
    /// matching. Guesses count toward their guessed side.
    pub fn is_unmetered(code: u32) -> bool {
        matches!(code, NO | GUESS_NO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metering_guesses_follow_their_side() {
        assert!(metered::is_unmetered(metered::NO));
        assert!(metered::is_unmetered(metered::GUESS_NO));
        assert!(!metered::is_unmetered(metered::YES));
        assert!(!metered::is_unmetered(metered::GUESS_YES));
        assert!(!metered::is_unmetered(metered::UNKNOWN));
    }
}
