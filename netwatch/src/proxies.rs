//! D-Bus proxies for the NetworkManager daemon.

use zbus::proxy;
use zvariant::OwnedObjectPath;

/// Proxy for the main NetworkManager interface.
///
/// Provides the device inventory and the hot-plug signals the watcher
/// uses to follow devices appearing and disappearing at runtime.
#[proxy(
    interface = "org.freedesktop.NetworkManager",
    default_service = "org.freedesktop.NetworkManager",
    default_path = "/org/freedesktop/NetworkManager"
)]
pub trait NM {
    /// Returns paths to all network devices.
    fn get_devices(&self) -> zbus::Result<Vec<OwnedObjectPath>>;

    /// Overall daemon state as a numeric code.
    #[zbus(property)]
    fn state(&self) -> zbus::Result<u32>;

    /// Signal emitted when a device is added to the system.
    #[zbus(signal)]
    fn device_added(&self, device_path: OwnedObjectPath);

    /// Signal emitted when a device is removed from the system.
    #[zbus(signal)]
    fn device_removed(&self, device_path: OwnedObjectPath);
}

/// Proxy for the NetworkManager device interface.
///
/// # Signals
///
/// The `StateChanged` signal is emitted whenever the device state changes.
/// Use `receive_device_state_changed()` to get a stream of state change events:
///
/// ```ignore
/// let mut stream = device_proxy.receive_device_state_changed().await?;
/// while let Some(signal) = stream.next().await {
///     let args = signal.args()?;
///     println!("New state: {}, Old state: {}", args.new_state, args.old_state);
/// }
/// ```
#[proxy(
    interface = "org.freedesktop.NetworkManager.Device",
    default_service = "org.freedesktop.NetworkManager"
)]
pub trait NMDevice {
    /// The network interface name (e.g., "wlan0").
    #[zbus(property)]
    fn interface(&self) -> zbus::Result<String>;

    /// Device type as a numeric code (1 = Ethernet, 2 = Wi-Fi).
    #[zbus(property)]
    fn device_type(&self) -> zbus::Result<u32>;

    /// Current device state (100 = activated, 120 = failed).
    #[zbus(property)]
    fn state(&self) -> zbus::Result<u32>;

    /// Metering status as a numeric code (2 = no, 4 = guessed no).
    #[zbus(property)]
    fn metered(&self) -> zbus::Result<u32>;

    /// Signal emitted when device state changes.
    ///
    /// The method is named `device_state_changed` to avoid conflicts with the
    /// `state` property's change stream. Use `receive_device_state_changed()`
    /// to subscribe to this signal.
    ///
    /// Arguments:
    /// - `new_state`: The new device state code
    /// - `old_state`: The previous device state code
    /// - `reason`: The reason code for the state change
    #[zbus(signal, name = "StateChanged")]
    fn device_state_changed(&self, new_state: u32, old_state: u32, reason: u32);
}
