use std::{net::SocketAddr, time::Duration};

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};

use aircon_device_sim::{router, spawn_simulation, DeviceHandle, SimulatedDevice};

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let port = std::env::var("DEVICE_SIM_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8081);
    let threshold_c = match std::env::var("DEVICE_SIM_THRESHOLD") {
        Ok(raw) => raw.parse::<f32>().unwrap_or_else(|_| {
            warn!("ignoring invalid DEVICE_SIM_THRESHOLD {raw:?}");
            30.0
        }),
        Err(_) => 30.0,
    };

    let handle = DeviceHandle::new(SimulatedDevice::new(threshold_c));
    let simulation = spawn_simulation(handle.clone(), Duration::from_secs(2));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind simulated device at {addr}"))?;

    info!("simulated fan controller listening on http://{addr} (threshold {threshold_c:.1} °C)");
    let served = axum::serve(listener, router(handle)).await;
    simulation.abort();
    served.context("simulated device server failed")
}
