use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::{
    config::{encode_threshold, BatteryProfile, ConfigDraft, DeviceSettings},
    display::{
        battery_gauge, temperature_readout, voltage_readout, BatteryGauge, Readout, COLOR_ALERT,
        COLOR_INFO, COLOR_OK, COLOR_WARNING,
    },
    types::{FanMode, TelemetrySnapshot, TemperatureReading},
};

const LABEL_MANUAL_ON: &str = "Turn fan on manually";
const LABEL_BACK_TO_AUTO: &str = "Switch back to auto mode";
const MANUAL_MODE_NOTICE: &str = "(manual cooling mode)";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConsoleError {
    #[error("a fan mode change is already in progress")]
    ToggleInFlight,
    #[error("a configuration save is already in progress")]
    SaveInFlight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAction {
    ManualOn,
    Auto,
}

/// A ticket older than the last local mode change may not change the mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollTicket {
    mode_generation: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Synced,
    DeviceSyncFailed,
    StorageFailed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusDialog {
    pub title: String,
    pub message: String,
    pub success: bool,
}

impl StatusDialog {
    fn new(title: &str, message: impl Into<String>, success: bool) -> Self {
        Self {
            title: title.to_string(),
            message: message.into(),
            success,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigPanel {
    pub open: bool,
    pub address_input: String,
    pub threshold_input: String,
    pub status_message: String,
    pub status_color: &'static str,
    pub current_threshold: String,
    pub current_address: String,
    pub saving: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FanButton {
    pub label: &'static str,
    pub disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleView {
    pub address: String,
    pub threshold: f32,
    pub mode: &'static str,
    pub manual_override: bool,
    pub temperature: Readout,
    pub voltage: Readout,
    pub battery: BatteryGauge,
    pub status: String,
    pub fan_button: FanButton,
    pub config: ConfigPanel,
    pub dialog: Option<StatusDialog>,
}

#[derive(Debug, Clone)]
struct PanelState {
    open: bool,
    address_input: String,
    threshold_input: String,
    status_message: String,
    status_color: &'static str,
}

#[derive(Debug, Clone)]
pub struct ConsoleState {
    settings: DeviceSettings,
    battery: BatteryProfile,

    telemetry: TelemetrySnapshot,
    temperature_fresh: bool,
    voltage_fresh: bool,
    link_error: Option<String>,
    updated_at: Option<DateTime<FixedOffset>>,
    flicker_clock: Option<DateTime<FixedOffset>>,

    manual_override: bool,
    mode_generation: u64,
    flicker_visible: bool,

    toggle_in_flight: bool,
    save_in_flight: bool,

    panel: PanelState,
    dialog: Option<StatusDialog>,
}

impl ConsoleState {
    pub fn new(settings: DeviceSettings, battery: BatteryProfile) -> Self {
        let panel = PanelState {
            open: false,
            address_input: settings.address.clone(),
            threshold_input: encode_threshold(settings.threshold_c),
            status_message: String::new(),
            status_color: COLOR_OK,
        };

        Self {
            settings,
            battery,
            telemetry: TelemetrySnapshot::default(),
            temperature_fresh: false,
            voltage_fresh: false,
            link_error: None,
            updated_at: None,
            flicker_clock: None,
            manual_override: false,
            mode_generation: 0,
            flicker_visible: true,
            toggle_in_flight: false,
            save_in_flight: false,
            panel,
            dialog: None,
        }
    }

    pub fn settings(&self) -> &DeviceSettings {
        &self.settings
    }

    pub fn address(&self) -> &str {
        &self.settings.address
    }

    pub fn threshold_c(&self) -> f32 {
        self.settings.threshold_c
    }

    pub fn telemetry(&self) -> TelemetrySnapshot {
        self.telemetry
    }

    pub fn is_manual_override(&self) -> bool {
        self.manual_override
    }

    pub fn dialog(&self) -> Option<&StatusDialog> {
        self.dialog.as_ref()
    }

    pub fn begin_temperature_poll(&self) -> PollTicket {
        PollTicket {
            mode_generation: self.mode_generation,
        }
    }

    pub fn apply_temperature(
        &mut self,
        ticket: PollTicket,
        reading: TemperatureReading,
        now: DateTime<FixedOffset>,
    ) {
        self.telemetry.temperature_c = reading.temperature_c;
        self.temperature_fresh = true;
        self.link_error = None;
        self.updated_at = Some(now);

        if ticket.mode_generation == self.mode_generation {
            self.telemetry.mode = reading.mode;
            self.set_override(reading.mode == FanMode::Manual);
        }
    }

    pub fn temperature_failed(&mut self) {
        self.temperature_fresh = false;
        self.flicker_visible = true;
        self.link_error = Some(format!(
            "Read failed: Failed to fetch. Check that the IP ({}) is correct.",
            self.settings.address
        ));
    }

    pub fn apply_voltage(&mut self, voltage: f32) {
        self.telemetry.voltage = voltage;
        self.voltage_fresh = true;
    }

    pub fn voltage_failed(&mut self) {
        self.voltage_fresh = false;
    }

    pub fn flicker_tick(&mut self, now: DateTime<FixedOffset>) {
        if self.manual_override && self.link_error.is_none() {
            self.flicker_visible = !self.flicker_visible;
            self.flicker_clock = Some(now);
        } else {
            self.flicker_visible = true;
            self.flicker_clock = None;
        }
    }

    pub fn begin_toggle(&mut self) -> Result<ToggleAction, ConsoleError> {
        if self.toggle_in_flight {
            return Err(ConsoleError::ToggleInFlight);
        }
        self.toggle_in_flight = true;

        Ok(if self.manual_override {
            ToggleAction::Auto
        } else {
            ToggleAction::ManualOn
        })
    }

    pub fn finish_toggle(&mut self, action: ToggleAction, succeeded: bool) {
        self.toggle_in_flight = false;

        if !succeeded {
            self.dialog = Some(StatusDialog::new(
                "Operation failed",
                format!(
                    "Mode switch failed: Failed to fetch. Check that the IP ({}) is correct and the connection is up.",
                    self.settings.address
                ),
                false,
            ));
            return;
        }

        self.mode_generation += 1;
        let message = match action {
            ToggleAction::ManualOn => {
                self.telemetry.mode = FanMode::Manual;
                self.set_override(true);
                "Switched to manual mode and turned the fan on."
            }
            ToggleAction::Auto => {
                self.telemetry.mode = FanMode::Auto;
                self.set_override(false);
                "Switched back to automatic temperature control."
            }
        };
        self.dialog = Some(StatusDialog::new("Operation succeeded", message, true));
    }

    // The device outcome is unknown, so only the button is released.
    pub fn cancel_toggle(&mut self) {
        self.toggle_in_flight = false;
    }

    pub fn cancel_save(&mut self) {
        if self.save_in_flight {
            self.save_in_flight = false;
            self.load_settings_into_panel();
        }
    }

    pub fn open_config(&mut self) {
        self.panel.open = true;
        self.load_settings_into_panel();
    }

    pub fn close_config(&mut self) {
        self.panel.open = false;
    }

    pub fn close_dialog(&mut self) {
        self.dialog = None;
    }

    pub fn begin_save(&mut self) -> Result<(), ConsoleError> {
        if self.save_in_flight {
            return Err(ConsoleError::SaveInFlight);
        }
        self.save_in_flight = true;
        self.panel.status_message = "Saving to local storage...".to_string();
        self.panel.status_color = COLOR_WARNING;
        Ok(())
    }

    pub fn commit_draft(&mut self, draft: &ConfigDraft) {
        if let Some(address) = &draft.address {
            self.settings.address = address.clone();
        }
        if let Some(threshold_c) = draft.threshold_c {
            self.settings.threshold_c = threshold_c;
        }
    }

    pub fn finish_save(&mut self, outcome: SaveOutcome) {
        self.save_in_flight = false;

        match outcome {
            SaveOutcome::Synced => {
                self.load_settings_into_panel();
                self.panel.status_message =
                    "Settings saved! Threshold updated on the device.".to_string();
                self.panel.status_color = COLOR_INFO;
                self.panel.open = false;
                self.dialog = Some(StatusDialog::new(
                    "Save complete",
                    "Settings saved locally. Threshold updated on the device!",
                    true,
                ));
            }
            SaveOutcome::DeviceSyncFailed => {
                self.load_settings_into_panel();
                self.panel.status_message =
                    "Settings saved, but updating the threshold on the device failed.".to_string();
                self.panel.status_color = COLOR_ALERT;
                self.dialog = Some(StatusDialog::new(
                    "Save complete",
                    "Settings saved locally. Warning: updating the threshold on the device failed. Check that the IP is correct and the connection is up.",
                    false,
                ));
            }
            SaveOutcome::StorageFailed(reason) => {
                self.panel.status_message = format!("Save failed: {reason}");
                self.panel.status_color = COLOR_ALERT;
                self.dialog = Some(StatusDialog::new(
                    "Save failed",
                    format!("An error occurred while saving the configuration: {reason}"),
                    false,
                ));
            }
        }
    }

    pub fn status_line(&self) -> String {
        if let Some(error) = &self.link_error {
            return error.clone();
        }

        let clock = |at: Option<DateTime<FixedOffset>>| {
            at.map(|at| at.format("%H:%M:%S").to_string())
                .unwrap_or_else(|| "--:--:--".to_string())
        };

        if !self.manual_override {
            format!("Updated: {} (auto mode)", clock(self.updated_at))
        } else if self.flicker_visible {
            format!("Updated: {}", clock(self.flicker_clock.or(self.updated_at)))
        } else {
            MANUAL_MODE_NOTICE.to_string()
        }
    }

    pub fn view(&self) -> ConsoleView {
        let temperature = if self.temperature_fresh {
            temperature_readout(self.telemetry.temperature_c, self.settings.threshold_c)
        } else {
            Readout::placeholder()
        };

        let (voltage, battery) = if self.voltage_fresh {
            (
                voltage_readout(self.telemetry.voltage, &self.battery),
                battery_gauge(self.telemetry.voltage, &self.battery),
            )
        } else {
            (Readout::placeholder(), BatteryGauge::empty())
        };

        ConsoleView {
            address: self.settings.address.clone(),
            threshold: self.settings.threshold_c,
            mode: if self.manual_override {
                FanMode::Manual.as_str()
            } else {
                FanMode::Auto.as_str()
            },
            manual_override: self.manual_override,
            temperature,
            voltage,
            battery,
            status: self.status_line(),
            fan_button: FanButton {
                label: if self.manual_override {
                    LABEL_BACK_TO_AUTO
                } else {
                    LABEL_MANUAL_ON
                },
                disabled: self.toggle_in_flight,
            },
            config: ConfigPanel {
                open: self.panel.open,
                address_input: self.panel.address_input.clone(),
                threshold_input: self.panel.threshold_input.clone(),
                status_message: self.panel.status_message.clone(),
                status_color: self.panel.status_color,
                current_threshold: format!(
                    "Current setting: {} °C",
                    encode_threshold(self.settings.threshold_c)
                ),
                current_address: format!("Current device IP: {}", self.settings.address),
                saving: self.save_in_flight,
            },
            dialog: self.dialog.clone(),
        }
    }

    fn set_override(&mut self, manual: bool) {
        if self.manual_override != manual {
            self.flicker_visible = true;
        }
        self.manual_override = manual;
    }

    fn load_settings_into_panel(&mut self) {
        self.panel.address_input = self.settings.address.clone();
        self.panel.threshold_input = encode_threshold(self.settings.threshold_c);
        self.panel.status_message = "Configuration loaded from local storage.".to_string();
        self.panel.status_color = COLOR_OK;
    }
}
