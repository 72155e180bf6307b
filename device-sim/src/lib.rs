pub mod device;

use std::{sync::Arc, time::Duration};

use aircon_common::{
    FanCommand, TemperaturePayload, ThresholdResponse, VoltagePayload, PATH_FAN, PATH_MODE_AUTO,
    PATH_TEMPERATURE, PATH_THRESHOLD, PATH_VOLTAGE,
};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tokio::{sync::Mutex, task::JoinHandle};
use tracing::info;

pub use device::SimulatedDevice;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
}

#[derive(Clone, Default)]
pub struct DeviceHandle {
    device: Arc<Mutex<SimulatedDevice>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    offline: Arc<Mutex<bool>>,
}

impl DeviceHandle {
    pub fn new(device: SimulatedDevice) -> Self {
        Self {
            device: Arc::new(Mutex::new(device)),
            ..Self::default()
        }
    }

    pub async fn device(&self) -> SimulatedDevice {
        self.device.lock().await.clone()
    }

    pub async fn update<R>(&self, apply: impl FnOnce(&mut SimulatedDevice) -> R) -> R {
        let mut device = self.device.lock().await;
        apply(&mut device)
    }

    // While offline every endpoint answers 503.
    pub async fn set_offline(&self, offline: bool) {
        *self.offline.lock().await = offline;
    }

    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn clear_requests(&self) {
        self.requests.lock().await.clear();
    }
}

pub fn router(handle: DeviceHandle) -> Router {
    Router::new()
        .route(PATH_TEMPERATURE, get(handle_get_temperature))
        .route(PATH_VOLTAGE, get(handle_get_voltage))
        .route(PATH_FAN, post(handle_post_fan).options(handle_preflight))
        .route(PATH_MODE_AUTO, get(handle_mode_auto))
        .route(
            PATH_THRESHOLD,
            post(handle_post_threshold).options(handle_preflight),
        )
        .layer(middleware::from_fn_with_state(
            handle.clone(),
            record_and_gate,
        ))
        .with_state(handle)
}

pub fn spawn_simulation(handle: DeviceHandle, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            handle.update(SimulatedDevice::step).await;
        }
    })
}

async fn record_and_gate(
    State(handle): State<DeviceHandle>,
    request: Request,
    next: Next,
) -> Response {
    handle.requests.lock().await.push(RecordedRequest {
        method: request.method().clone(),
        path: request.uri().path().to_string(),
    });

    let offline = *handle.offline.lock().await;
    let mut response = if offline {
        StatusCode::SERVICE_UNAVAILABLE.into_response()
    } else {
        next.run(request).await
    };
    response.headers_mut().insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    response
}

async fn handle_preflight() -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        [
            (header::ACCESS_CONTROL_ALLOW_METHODS, "GET, POST, OPTIONS"),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
        ],
    )
}

async fn handle_get_temperature(State(handle): State<DeviceHandle>) -> impl IntoResponse {
    let device = handle.device().await;
    Json(TemperaturePayload {
        temp: device.temperature_c(),
        mode: device.mode().as_str().to_string(),
    })
}

async fn handle_get_voltage(State(handle): State<DeviceHandle>) -> impl IntoResponse {
    let device = handle.device().await;
    Json(VoltagePayload {
        voltage: device.voltage(),
    })
}

async fn handle_post_fan(
    State(handle): State<DeviceHandle>,
    Json(command): Json<FanCommand>,
) -> impl IntoResponse {
    let on = handle.update(|device| device.set_fan(command.on)).await;
    info!("fan forced {} (manual mode)", if on { "on" } else { "off" });
    Json(FanCommand { on })
}

async fn handle_mode_auto(State(handle): State<DeviceHandle>) -> impl IntoResponse {
    handle.update(SimulatedDevice::set_auto).await;
    info!("automatic control resumed");
    StatusCode::OK
}

async fn handle_post_threshold(
    State(handle): State<DeviceHandle>,
    Json(body): Json<serde_json::Value>,
) -> impl IntoResponse {
    // Firmware parses leniently; a missing or non-numeric value is refused.
    let temp = body
        .get("temp")
        .and_then(serde_json::Value::as_f64)
        .map(|value| value as f32)
        .unwrap_or(f32::NAN);

    match handle.update(|device| device.set_threshold(temp)).await {
        Ok(()) => {
            info!("threshold set to {temp:.1} °C");
            Json(ThresholdResponse::ok())
        }
        Err(message) => Json(ThresholdResponse::error(message)),
    }
}
