//! A Rust library for observing internet connectivity via NetworkManager.
//!
//! This crate provides a process-wide connectivity observer: it watches
//! the host's network state facility and tells subscribers when the
//! aggregate status flips between connected and disconnected:
//!
//! - One facility registration per started observer, however many
//!   subscribers are attached
//! - Transition-only callbacks: overlapping networks (Wi-Fi plus
//!   cellular, failover handoffs) produce no duplicate notifications
//! - A small lifecycle around the registration: configure, start, stop,
//!   restart
//! - The OS facility sits behind the [`NetworkMonitor`] trait, so tests
//!   drive the observer with scripted events instead of a live bus
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use netwatch::{
//!     ConnectivityListener, ConnectivityObserver, NetworkManagerMonitor, NetworkRequirement,
//! };
//!
//! struct Logger;
//!
//! impl ConnectivityListener for Logger {
//!     fn on_connected(&self) {
//!         println!("online");
//!     }
//!
//!     fn on_disconnected(&self) {
//!         println!("offline");
//!     }
//! }
//!
//! # async fn example() -> netwatch::Result<()> {
//! let observer = ConnectivityObserver::new();
//! let monitor = Arc::new(NetworkManagerMonitor::new().await?);
//! observer.configure(NetworkRequirement::default(), monitor).await?;
//!
//! let listener: Arc<dyn ConnectivityListener> = Arc::new(Logger);
//! observer.subscribe(listener.clone())?;
//!
//! observer.start().await?;
//! // ... transitions invoke the listener ...
//! observer.stop().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! All operations return `Result<T, ObserverError>`. The error type
//! distinguishes facility-unavailable configuration failures, lifecycle
//! misuse (double start, operations in the wrong state) and D-Bus
//! transport errors.
//!
//! # Signal-Based State Monitoring
//!
//! The NetworkManager backend consumes D-Bus signals instead of polling
//! device state in a loop. This provides:
//!
//! - Faster response times (immediate notification vs polling delay)
//! - Lower CPU usage (no spinning loops)
//! - No missed rapid transitions between reads
//!
//! # Logging
//!
//! This crate uses the [`log`](https://docs.rs/log) facade for logging.
//! To see log output, add a logging implementation like `env_logger`:
//!
//! ```ignore
//! env_logger::init();
//! // ...
//! ```

// Internal implementation modules
mod constants;
mod proxies;
mod utils;

// Public API modules
pub mod listener;
pub mod models;
pub mod monitor;
pub mod network_manager;
pub mod observer;
pub mod requirement;

// Re-exported public API
pub use listener::{ConnectivityListener, SubscriptionId};
pub use models::{ConnectivityState, Lifecycle, NetworkEvent, NetworkId, ObserverError};
pub use monitor::{EventStream, NetworkMonitor};
pub use network_manager::NetworkManagerMonitor;
pub use observer::ConnectivityObserver;
pub use requirement::{NetworkRequirement, Transport};

/// A specialized `Result` type for observer operations.
pub type Result<T> = std::result::Result<T, ObserverError>;
