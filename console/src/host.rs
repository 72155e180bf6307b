use std::net::SocketAddr;

use anyhow::Context;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use aircon_common::ConsoleConfig;

use crate::{client::DeviceClient, console::Console, poller::Poller, store::LocalStore};

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Deserialize)]
struct ConfigUpdate {
    #[serde(default)]
    address: String,
    #[serde(default)]
    threshold: serde_json::Value,
}

impl ConfigUpdate {
    // Accept the raw form string or a JSON number.
    fn threshold_input(&self) -> String {
        match &self.threshold {
            serde_json::Value::String(text) => text.clone(),
            serde_json::Value::Number(number) => number.to_string(),
            _ => String::new(),
        }
    }
}

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let store = LocalStore::from_env();
    let mut config = store.load_console_config().await.unwrap_or_else(|err| {
        warn!("failed to load console config: {err:#}");
        ConsoleConfig::default()
    });
    if let Ok(address) = std::env::var("AIRCON_DEFAULT_IP") {
        config.defaults.address = address;
    }
    if let Some(port) = std::env::var("AIRCON_HTTP_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
    {
        config.http_port = port;
    }
    config.sanitize();

    let console = Console::load(store, &config, DeviceClient::new()).await;

    {
        let console = console.clone();
        tokio::spawn(async move {
            console.sync_threshold_on_load().await;
        });
    }

    let poller = Poller::start(console.clone(), &config.poll);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind console server at {addr}"))?;

    info!("console listening on http://{addr}");
    axum::serve(listener, router(console))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("console server failed")?;

    poller.shutdown();
    Ok(())
}

pub fn router(console: Console) -> Router {
    Router::new()
        .route("/api/view", get(handle_get_view))
        .route("/api/fan/toggle", post(handle_toggle_fan))
        .route(
            "/api/config",
            get(handle_get_config).put(handle_put_config),
        )
        .route("/api/config/open", post(handle_open_config))
        .route("/api/config/close", post(handle_close_config))
        .route("/api/dialog/close", post(handle_close_dialog))
        .layer(TraceLayer::new_for_http())
        .with_state(console)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

async fn handle_get_view(State(console): State<Console>) -> impl IntoResponse {
    Json(console.view().await)
}

async fn handle_toggle_fan(State(console): State<Console>) -> impl IntoResponse {
    if let Err(err) = console.toggle_fan().await {
        return error_response(StatusCode::CONFLICT, &err.to_string());
    }
    handle_get_view(State(console)).await.into_response()
}

async fn handle_get_config(State(console): State<Console>) -> impl IntoResponse {
    Json(console.settings().await)
}

async fn handle_put_config(
    State(console): State<Console>,
    Json(update): Json<ConfigUpdate>,
) -> impl IntoResponse {
    if let Err(err) = console
        .save_config(&update.address, &update.threshold_input())
        .await
    {
        return error_response(StatusCode::CONFLICT, &err.to_string());
    }
    handle_get_view(State(console)).await.into_response()
}

async fn handle_open_config(State(console): State<Console>) -> impl IntoResponse {
    console.open_config().await;
    handle_get_view(State(console)).await.into_response()
}

async fn handle_close_config(State(console): State<Console>) -> impl IntoResponse {
    console.close_config().await;
    handle_get_view(State(console)).await.into_response()
}

async fn handle_close_dialog(State(console): State<Console>) -> impl IntoResponse {
    console.close_dialog().await;
    handle_get_view(State(console)).await.into_response()
}

fn error_response(status: StatusCode, message: &str) -> axum::response::Response {
    (
        status,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
        .into_response()
}
