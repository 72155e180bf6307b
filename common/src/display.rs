use serde::Serialize;

use crate::config::BatteryProfile;

pub const COLOR_NORMAL: &str = "#0078d7";
pub const COLOR_ALERT: &str = "red";
pub const COLOR_MUTED: &str = "gray";
pub const COLOR_WARNING: &str = "orange";
pub const COLOR_OK: &str = "green";
pub const COLOR_INFO: &str = "blue";

pub const GAUGE_LOW: &str = "#e53935";
pub const GAUGE_MID: &str = "#f7b731";
pub const GAUGE_HIGH: &str = "#4caf50";

pub const PLACEHOLDER: &str = "--";
pub const SENSOR_FAULT: &str = "NAN";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Readout {
    pub text: String,
    pub color: &'static str,
}

impl Readout {
    pub fn placeholder() -> Self {
        Self {
            text: PLACEHOLDER.to_string(),
            color: COLOR_MUTED,
        }
    }

    pub fn sensor_fault() -> Self {
        Self {
            text: SENSOR_FAULT.to_string(),
            color: COLOR_MUTED,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatteryGauge {
    pub percent: f32,
    pub color: &'static str,
}

impl BatteryGauge {
    pub fn empty() -> Self {
        Self {
            percent: 0.0,
            color: gauge_color(0.0),
        }
    }
}

pub fn is_over_threshold(temperature_c: f32, threshold_c: f32) -> bool {
    temperature_c >= threshold_c
}

pub fn temperature_readout(temperature_c: f32, threshold_c: f32) -> Readout {
    if !temperature_c.is_finite() {
        return Readout::sensor_fault();
    }

    Readout {
        text: format!("{temperature_c:.1}"),
        color: if is_over_threshold(temperature_c, threshold_c) {
            COLOR_ALERT
        } else {
            COLOR_NORMAL
        },
    }
}

pub fn voltage_readout(voltage: f32, profile: &BatteryProfile) -> Readout {
    if !voltage.is_finite() {
        return Readout::sensor_fault();
    }

    Readout {
        text: format!("{voltage:.2}"),
        color: if voltage < profile.low_voltage_alert {
            COLOR_ALERT
        } else {
            COLOR_NORMAL
        },
    }
}

pub fn battery_percent(voltage: f32, profile: &BatteryProfile) -> f32 {
    if !voltage.is_finite() {
        return 0.0;
    }
    let span = profile.max_voltage - profile.min_voltage;
    if span <= 0.0 {
        return 0.0;
    }

    ((voltage - profile.min_voltage) / span * 100.0).clamp(0.0, 100.0)
}

pub fn gauge_color(percent: f32) -> &'static str {
    if percent < 20.0 {
        GAUGE_LOW
    } else if percent < 50.0 {
        GAUGE_MID
    } else {
        GAUGE_HIGH
    }
}

pub fn battery_gauge(voltage: f32, profile: &BatteryProfile) -> BatteryGauge {
    let percent = battery_percent(voltage, profile);
    BatteryGauge {
        percent,
        color: gauge_color(percent),
    }
}
