/// Example that watches internet connectivity for thirty seconds.
///
/// Prints a line for every connected/disconnected transition reported
/// by NetworkManager. Unplug a cable or toggle Wi-Fi to see it react.
use netwatch::{
    ConnectivityListener, ConnectivityObserver, NetworkManagerMonitor, NetworkRequirement,
};
use std::sync::Arc;
use std::time::Duration;

struct Printer;

impl ConnectivityListener for Printer {
    fn on_connected(&self) {
        println!("connectivity: connected");
    }

    fn on_disconnected(&self) {
        println!("connectivity: disconnected");
    }
}

#[tokio::main]
async fn main() -> netwatch::Result<()> {
    let observer = ConnectivityObserver::new();
    let monitor = Arc::new(NetworkManagerMonitor::new().await?);

    observer
        .configure(NetworkRequirement::default(), monitor)
        .await?;

    // The observer holds only a weak reference, so keep the listener
    // alive for as long as it should receive callbacks
    let listener: Arc<dyn ConnectivityListener> = Arc::new(Printer);
    observer.subscribe(listener.clone())?;

    observer.start().await?;
    println!("watching connectivity for 30 seconds...");

    tokio::time::sleep(Duration::from_secs(30)).await;

    println!("last state: {}", observer.current_state());
    observer.stop().await?;
    println!("done");
    Ok(())
}
