//! Production monitoring backend over the NetworkManager D-Bus API.
//!
//! Watches device state through NetworkManager's signals instead of
//! polling. A watch subscribes to `StateChanged` on every device whose
//! type matches the requirement, plus `DeviceAdded`/`DeviceRemoved` on
//! the manager itself so hot-plugged devices join the watch at runtime.
//! Activation boundary crossings become `Available`/`Lost` events.

use async_trait::async_trait;
use futures::stream::{Stream, StreamExt};
use log::{debug, warn};
use std::collections::HashSet;
use std::pin::Pin;
use tokio::sync::mpsc;
use zbus::Connection;
use zvariant::OwnedObjectPath;

use crate::Result;
use crate::constants::{device_state, metered};
use crate::models::{NetworkEvent, NetworkId, ObserverError};
use crate::monitor::{EventStream, NetworkMonitor};
use crate::proxies::{NMDeviceProxy, NMProxy};
use crate::requirement::{NetworkRequirement, Transport};
use crate::try_log;

/// Internal feed item merged from all signal streams.
enum Feed {
    Added(OwnedObjectPath),
    Removed(OwnedObjectPath),
    State { path: OwnedObjectPath, new_state: u32 },
}

type FeedStream = Pin<Box<dyn Stream<Item = Feed> + Send>>;

/// One device kept by the requirement filter.
struct DeviceWatch {
    path: OwnedObjectPath,
    /// Whether the device was already activated when classified.
    up: bool,
    stream: FeedStream,
}

/// [`NetworkMonitor`] backed by NetworkManager on the system bus.
#[derive(Clone)]
pub struct NetworkManagerMonitor {
    conn: Connection,
}

impl NetworkManagerMonitor {
    /// Creates a monitor connected to the system D-Bus.
    pub async fn new() -> Result<Self> {
        let conn = Connection::system().await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl NetworkMonitor for NetworkManagerMonitor {
    async fn probe(&self) -> Result<()> {
        let nm = NMProxy::new(&self.conn).await?;
        match nm.state().await {
            Ok(state) => {
                debug!("NetworkManager daemon state: {state}");
                Ok(())
            }
            Err(e) => Err(ObserverError::FacilityUnavailable(e.to_string())),
        }
    }

    async fn watch(&self, requirement: &NetworkRequirement) -> Result<EventStream> {
        let nm = NMProxy::new(&self.conn).await?;

        // Subscribe to hot-plug signals before enumerating so a device
        // added in between is not missed
        let added = nm.receive_device_added().await?;
        let removed = nm.receive_device_removed().await?;
        let device_paths = nm.get_devices().await?;

        // Use dynamic dispatch to handle the different signal stream types
        let mut streams: Vec<FeedStream> = Vec::new();

        streams.push(Box::pin(added.filter_map(|signal| async move {
            match signal.args() {
                Ok(args) => Some(Feed::Added(args.device_path)),
                Err(e) => {
                    warn!("Failed to parse DeviceAdded signal args: {e}");
                    None
                }
            }
        })));
        streams.push(Box::pin(removed.filter_map(|signal| async move {
            match signal.args() {
                Ok(args) => Some(Feed::Removed(args.device_path)),
                Err(e) => {
                    warn!("Failed to parse DeviceRemoved signal args: {e}");
                    None
                }
            }
        })));

        let (tx, rx) = mpsc::unbounded_channel();
        let mut up: HashSet<OwnedObjectPath> = HashSet::new();

        for path in device_paths {
            let Some(watch) = classify_device(&self.conn, path, requirement).await else {
                continue;
            };
            if watch.up {
                up.insert(watch.path.clone());
                // Initial event for a network that is already up
                let _ = tx.send(NetworkEvent::Available(NetworkId::new(watch.path.as_str())));
            }
            streams.push(watch.stream);
        }

        debug!("watching {} NetworkManager signal streams", streams.len());

        tokio::spawn(forward_events(
            self.conn.clone(),
            requirement.clone(),
            streams,
            up,
            tx,
        ));

        let events = futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        });
        Ok(Box::pin(events))
    }
}

/// Builds the per-device watch for one device path.
///
/// Returns `None` when the device does not match the requirement or
/// when any of its properties cannot be read (the device is skipped,
/// the watch as a whole continues).
///
/// The `StateChanged` subscription is installed before the state is
/// read, so a transition landing in between is seen by the stream
/// rather than lost.
async fn classify_device(
    conn: &Connection,
    path: OwnedObjectPath,
    requirement: &NetworkRequirement,
) -> Option<DeviceWatch> {
    let builder = try_log!(
        NMDeviceProxy::builder(conn).path(path.clone()),
        "Failed to create device proxy builder"
    );
    let dev = try_log!(builder.build().await, "Failed to build device proxy");

    let dev_type = try_log!(dev.device_type().await, "Failed to get device type");
    let transport = Transport::from_device_type(dev_type)?;
    if !requirement.allows_transport(transport) {
        return None;
    }

    if requirement.require_unmetered {
        let metered_code = try_log!(dev.metered().await, "Failed to get metered property");
        if !metered::is_unmetered(metered_code) {
            return None;
        }
    }

    let stream = try_log!(
        dev.receive_device_state_changed().await,
        "Failed to subscribe to StateChanged"
    );
    let state = try_log!(dev.state().await, "Failed to get device state");

    debug!("watching {transport} device {path} (state {state})");

    let signal_path = path.clone();
    let feed = stream.filter_map(move |signal| {
        let path = signal_path.clone();
        async move {
            match signal.args() {
                Ok(args) => Some(Feed::State {
                    path,
                    new_state: args.new_state,
                }),
                Err(e) => {
                    warn!("Failed to parse StateChanged signal args: {e}");
                    None
                }
            }
        }
    });

    Some(DeviceWatch {
        up: state == device_state::ACTIVATED,
        path,
        stream: Box::pin(feed),
    })
}

/// Merges all signal streams and forwards activation boundary crossings
/// as network events.
///
/// Exits when the consumer drops the receiving stream (dropping the
/// zbus streams then deregisters the match rules) or when the signal
/// streams end underneath us.
async fn forward_events(
    conn: Connection,
    requirement: NetworkRequirement,
    streams: Vec<FeedStream>,
    mut up: HashSet<OwnedObjectPath>,
    tx: mpsc::UnboundedSender<NetworkEvent>,
) {
    let mut merged = futures::stream::select_all(streams);

    loop {
        let feed = tokio::select! {
            _ = tx.closed() => {
                debug!("event consumer dropped, ending watch");
                return;
            }
            feed = merged.next() => match feed {
                Some(feed) => feed,
                None => break,
            },
        };

        match feed {
            Feed::Added(path) => {
                debug!("device added: {path}");
                if let Some(watch) = classify_device(&conn, path, &requirement).await {
                    if watch.up && up.insert(watch.path.clone()) {
                        let event = NetworkEvent::Available(NetworkId::new(watch.path.as_str()));
                        if !send(&tx, event) {
                            return;
                        }
                    }
                    merged.push(watch.stream);
                }
            }
            Feed::Removed(path) => {
                debug!("device removed: {path}");
                if up.remove(&path)
                    && !send(&tx, NetworkEvent::Lost(NetworkId::new(path.as_str())))
                {
                    return;
                }
            }
            Feed::State { path, new_state } => {
                let is_up = new_state == device_state::ACTIVATED;
                let was_up = up.contains(&path);
                if is_up && !was_up {
                    up.insert(path.clone());
                    if !send(&tx, NetworkEvent::Available(NetworkId::new(path.as_str()))) {
                        return;
                    }
                } else if !is_up && was_up {
                    up.remove(&path);
                    if !send(&tx, NetworkEvent::Lost(NetworkId::new(path.as_str()))) {
                        return;
                    }
                }
            }
        }
    }

    warn!("NetworkManager signal streams ended");
}

/// Pushes one event to the consumer. Returns `false` when the consumer
/// has dropped the stream, which deregisters the watch.
fn send(tx: &mpsc::UnboundedSender<NetworkEvent>, event: NetworkEvent) -> bool {
    match tx.send(event) {
        Ok(()) => true,
        Err(_) => {
            debug!("event consumer dropped, ending watch");
            false
        }
    }
}
