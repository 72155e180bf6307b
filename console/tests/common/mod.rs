#![allow(dead_code)]

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use aircon_common::{ConsoleConfig, DeviceDefaults};
use aircon_console::{Console, DeviceClient, LocalStore};
use aircon_device_sim::{router, DeviceHandle, SimulatedDevice};
use tempfile::TempDir;
use tokio::net::TcpListener;

// Nothing listens on the discard port in the test environment.
pub const UNREACHABLE: &str = "127.0.0.1:9";

pub async fn start_device(device: SimulatedDevice) -> (DeviceHandle, String) {
    let handle = DeviceHandle::new(device);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap().to_string();
    let app = router(handle.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (handle, address)
}

/// Accepts connections and never answers; returns the accepted count.
pub async fn start_silent_device() -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap().to_string();
    let accepted = Arc::new(AtomicUsize::new(0));
    let counter = accepted.clone();
    tokio::spawn(async move {
        let mut open = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            open.push(socket);
        }
    });
    (address, accepted)
}

pub async fn wait_for_connections(accepted: &AtomicUsize, count: usize) {
    for _ in 0..200 {
        if accepted.load(Ordering::SeqCst) >= count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("device never saw {count} connection(s)");
}

pub fn client() -> DeviceClient {
    DeviceClient::with_client(reqwest::Client::builder().no_proxy().build().unwrap())
}

pub fn config_for(address: &str) -> ConsoleConfig {
    ConsoleConfig {
        defaults: DeviceDefaults {
            address: address.to_string(),
            threshold_c: 30.0,
        },
        ..ConsoleConfig::default()
    }
}

pub async fn console_for(address: &str, dir: &TempDir) -> Console {
    Console::load(LocalStore::new(dir.path()), &config_for(address), client()).await
}
