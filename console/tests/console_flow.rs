mod common;

use std::{sync::atomic::Ordering, time::Duration};

use aircon_common::{
    display::{COLOR_ALERT, COLOR_MUTED, GAUGE_HIGH},
    FanMode, PollConfig, SaveOutcome, KEY_DEVICE_ADDRESS, KEY_TEMP_LIMIT,
};
use aircon_console::{Console, LocalStore, Poller};
use aircon_device_sim::{RecordedRequest, SimulatedDevice};
use axum::http::Method;
use pretty_assertions::assert_eq;
use tokio::time::timeout;

use common::{
    client, config_for, console_for, start_device, start_silent_device, wait_for_connections,
    UNREACHABLE,
};

fn request(method: Method, path: &str) -> RecordedRequest {
    RecordedRequest {
        method,
        path: path.to_string(),
    }
}

#[tokio::test]
async fn temperature_at_threshold_renders_red() {
    let mut device = SimulatedDevice::new(30.0);
    device.set_temperature(31.0);
    let (_handle, address) = start_device(device).await;
    let dir = tempfile::tempdir().unwrap();
    let console = console_for(&address, &dir).await;

    console.fetch_temperature().await;

    let view = console.view().await;
    assert_eq!(view.temperature.text, "31.0");
    assert_eq!(view.temperature.color, COLOR_ALERT);
    assert_eq!(view.mode, "auto");
    assert!(view.status.ends_with("(auto mode)"), "{}", view.status);
}

#[tokio::test]
async fn sensor_fault_renders_nan() {
    let mut device = SimulatedDevice::new(30.0);
    device.set_sensor_fault(true);
    let (_handle, address) = start_device(device).await;
    let dir = tempfile::tempdir().unwrap();
    let console = console_for(&address, &dir).await;

    console.fetch_temperature().await;

    let view = console.view().await;
    assert_eq!(view.temperature.text, "NAN");
    assert_eq!(view.temperature.color, COLOR_MUTED);
}

#[tokio::test]
async fn toggle_round_trip_sends_manual_on_then_auto() {
    let (handle, address) = start_device(SimulatedDevice::new(30.0)).await;
    let dir = tempfile::tempdir().unwrap();
    let console = console_for(&address, &dir).await;

    console.toggle_fan().await.unwrap();

    assert!(console.is_manual_override().await);
    assert_eq!(handle.device().await.mode(), FanMode::Manual);
    assert!(handle.device().await.is_fan_on());
    assert_eq!(
        handle.requests().await,
        vec![
            request(Method::OPTIONS, "/fan"),
            request(Method::POST, "/fan"),
            request(Method::GET, "/temperature"),
        ]
    );
    let view = console.view().await;
    assert_eq!(view.fan_button.label, "Switch back to auto mode");
    assert!(!view.fan_button.disabled);
    assert!(view.dialog.unwrap().success);

    handle.clear_requests().await;
    console.toggle_fan().await.unwrap();

    assert!(!console.is_manual_override().await);
    assert_eq!(handle.device().await.mode(), FanMode::Auto);
    assert_eq!(
        handle.requests().await,
        vec![
            request(Method::GET, "/mode/auto"),
            request(Method::GET, "/temperature"),
        ]
    );
}

#[tokio::test]
async fn failed_toggle_leaves_override_and_reports() {
    let (handle, address) = start_device(SimulatedDevice::new(30.0)).await;
    handle.set_offline(true).await;
    let dir = tempfile::tempdir().unwrap();
    let console = console_for(&address, &dir).await;

    console.toggle_fan().await.unwrap();

    assert!(!console.is_manual_override().await);
    let view = console.view().await;
    assert!(!view.fan_button.disabled);
    let dialog = view.dialog.unwrap();
    assert!(!dialog.success);
    assert!(dialog.message.contains(&address));
    assert_eq!(view.temperature.text, "--");
}

#[tokio::test]
async fn device_reported_manual_mode_is_adopted() {
    let (handle, address) = start_device(SimulatedDevice::new(30.0)).await;
    let dir = tempfile::tempdir().unwrap();
    let console = console_for(&address, &dir).await;

    handle.update(|device| device.set_fan(true)).await;
    console.fetch_temperature().await;
    assert!(console.is_manual_override().await);

    handle.update(SimulatedDevice::set_auto).await;
    console.fetch_temperature().await;
    assert!(!console.is_manual_override().await);
}

#[tokio::test]
async fn voltage_drives_battery_gauge() {
    let mut device = SimulatedDevice::new(30.0);
    device.set_voltage(12.0);
    let (handle, address) = start_device(device).await;
    let dir = tempfile::tempdir().unwrap();
    let console = console_for(&address, &dir).await;

    console.fetch_voltage().await;
    let view = console.view().await;
    assert_eq!(view.voltage.text, "12.00");
    assert!((view.battery.percent - 83.33).abs() < 0.1);
    assert_eq!(view.battery.color, GAUGE_HIGH);

    handle.set_offline(true).await;
    console.fetch_voltage().await;
    let view = console.view().await;
    assert_eq!(view.voltage.text, "--");
    assert_eq!(view.battery.percent, 0.0);
}

#[tokio::test]
async fn saved_threshold_persists_and_resyncs_on_load() {
    let (handle, address) = start_device(SimulatedDevice::new(30.0)).await;
    let dir = tempfile::tempdir().unwrap();
    let console = console_for(&address, &dir).await;
    console.open_config().await;

    let outcome = console.save_config(&address, "27.5").await.unwrap();

    assert_eq!(outcome, SaveOutcome::Synced);
    assert_eq!(handle.device().await.threshold_c(), 27.5);
    let view = console.view().await;
    assert!(!view.config.open);
    assert_eq!(view.threshold, 27.5);

    let store = LocalStore::new(dir.path());
    assert_eq!(
        store.get_item(KEY_TEMP_LIMIT).await.unwrap().as_deref(),
        Some("27.5")
    );

    // A fresh device that has forgotten the threshold gets it back on load.
    let (fresh, fresh_address) = start_device(SimulatedDevice::new(30.0)).await;
    store.set_item(KEY_DEVICE_ADDRESS, &fresh_address).await.unwrap();
    let reloaded = console_for(&address, &dir).await;
    assert_eq!(reloaded.settings().await.threshold_c, 27.5);

    assert!(reloaded.sync_threshold_on_load().await);
    assert_eq!(fresh.device().await.threshold_c(), 27.5);
    assert_eq!(
        fresh.requests().await,
        vec![
            request(Method::OPTIONS, "/threshold"),
            request(Method::POST, "/threshold"),
        ]
    );
}

#[tokio::test]
async fn unreachable_device_keeps_panel_open_but_saves_locally() {
    let dir = tempfile::tempdir().unwrap();
    let console = console_for(UNREACHABLE, &dir).await;
    console.open_config().await;

    let outcome = console.save_config("  ", "26").await.unwrap();

    assert_eq!(outcome, SaveOutcome::DeviceSyncFailed);
    let view = console.view().await;
    assert!(view.config.open);
    assert_eq!(view.config.status_color, COLOR_ALERT);
    assert_eq!(view.threshold, 26.0);
    assert_eq!(view.address, UNREACHABLE);
    assert!(!view.dialog.unwrap().success);

    let store = LocalStore::new(dir.path());
    assert_eq!(store.get_item(KEY_DEVICE_ADDRESS).await.unwrap(), None);
    assert_eq!(
        store.get_item(KEY_TEMP_LIMIT).await.unwrap().as_deref(),
        Some("26.0")
    );
}

#[tokio::test]
async fn invalid_threshold_input_keeps_stored_value() {
    let (handle, address) = start_device(SimulatedDevice::new(25.0)).await;
    let dir = tempfile::tempdir().unwrap();
    let console = console_for(&address, &dir).await;

    let outcome = console.save_config("", "warm").await.unwrap();

    // The unchanged threshold is still pushed.
    assert_eq!(outcome, SaveOutcome::Synced);
    assert_eq!(console.view().await.threshold, 30.0);
    assert_eq!(handle.device().await.threshold_c(), 30.0);
}

#[tokio::test]
async fn startup_sync_failure_is_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let console = console_for(UNREACHABLE, &dir).await;

    assert!(!console.sync_threshold_on_load().await);
    assert_eq!(console.view().await.threshold, 30.0);
}

#[tokio::test]
async fn poller_refreshes_until_shut_down() {
    let (handle, address) = start_device(SimulatedDevice::new(30.0)).await;
    let dir = tempfile::tempdir().unwrap();
    let console = console_for(&address, &dir).await;

    let poller = Poller::start(
        console.clone(),
        &PollConfig {
            temperature_interval_ms: 100,
            voltage_interval_ms: 100,
            flicker_interval_ms: 100,
        },
    );
    tokio::time::sleep(Duration::from_millis(350)).await;
    assert!(poller.is_running());

    let view = console.view().await;
    assert_eq!(view.temperature.text, "28.0");
    assert_eq!(view.voltage.text, "12.40");

    poller.shutdown();
    tokio::time::sleep(Duration::from_millis(50)).await;
    handle.clear_requests().await;
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(handle.requests().await, Vec::new());
}

#[tokio::test]
async fn saved_threshold_is_rounded_before_use() {
    let (handle, address) = start_device(SimulatedDevice::new(30.0)).await;
    let dir = tempfile::tempdir().unwrap();
    let console = console_for(&address, &dir).await;

    let outcome = console.save_config(&address, "28.46").await.unwrap();

    assert_eq!(outcome, SaveOutcome::Synced);
    assert_eq!(console.view().await.threshold, 28.5);
    assert_eq!(handle.device().await.threshold_c(), 28.5);

    let reloaded = console_for(&address, &dir).await;
    assert_eq!(reloaded.settings().await.threshold_c, 28.5);
}

#[tokio::test]
async fn storage_failure_aborts_save_before_device() {
    let (handle, address) = start_device(SimulatedDevice::new(30.0)).await;
    // A regular file where the data directory should be.
    let file = tempfile::NamedTempFile::new().unwrap();
    let store = LocalStore::new(file.path());
    let console = Console::load(store, &config_for(&address), client()).await;
    console.open_config().await;

    let outcome = console.save_config("10.9.9.9", "25.0").await.unwrap();

    assert!(matches!(outcome, SaveOutcome::StorageFailed(_)), "{outcome:?}");
    let view = console.view().await;
    assert_eq!(view.address, address);
    assert_eq!(view.threshold, 30.0);
    assert!(view.config.open);
    assert!(!view.config.saving);
    assert_eq!(view.dialog.unwrap().title, "Save failed");
    assert_eq!(handle.requests().await, Vec::new());
}

#[tokio::test]
async fn cancelled_toggle_releases_the_fan_button() {
    let (address, accepted) = start_silent_device().await;
    let dir = tempfile::tempdir().unwrap();
    let console = console_for(&address, &dir).await;

    assert!(timeout(Duration::from_millis(200), console.toggle_fan())
        .await
        .is_err());
    assert_eq!(accepted.load(Ordering::SeqCst), 1);

    let view = console.view().await;
    assert!(!view.fan_button.disabled);
    assert!(!view.manual_override);
    assert_eq!(view.dialog, None);

    // A retry goes back to the device instead of being rejected.
    assert!(timeout(Duration::from_millis(200), console.toggle_fan())
        .await
        .is_err());
}

#[tokio::test]
async fn cancelled_save_releases_the_panel() {
    let (address, accepted) = start_silent_device().await;
    let dir = tempfile::tempdir().unwrap();
    let console = console_for(&address, &dir).await;
    console.open_config().await;

    assert!(
        timeout(Duration::from_millis(200), console.save_config("", "27"))
            .await
            .is_err()
    );
    wait_for_connections(&accepted, 1).await;

    let view = console.view().await;
    assert!(!view.config.saving);
    assert!(view.config.open);
    assert_eq!(view.threshold, 27.0);

    assert!(
        timeout(Duration::from_millis(200), console.save_config("", "26"))
            .await
            .is_err()
    );
}
