use serde::{Deserialize, Serialize};

pub const DEFAULT_DEVICE_ADDRESS: &str = "10.224.57.117";
pub const DEFAULT_THRESHOLD_C: f32 = 30.0;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("threshold input {0:?} is not a number")]
    InvalidThreshold(String),
    #[error("device address cannot be empty")]
    EmptyAddress,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    pub temperature_interval_ms: u64,
    pub voltage_interval_ms: u64,
    pub flicker_interval_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            temperature_interval_ms: 500,
            voltage_interval_ms: 500,
            flicker_interval_ms: 500,
        }
    }
}

impl PollConfig {
    pub fn sanitize(&mut self) {
        self.temperature_interval_ms = self.temperature_interval_ms.clamp(100, 60_000);
        self.voltage_interval_ms = self.voltage_interval_ms.clamp(100, 60_000);
        self.flicker_interval_ms = self.flicker_interval_ms.clamp(100, 5_000);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatteryProfile {
    pub min_voltage: f32,
    pub max_voltage: f32,
    pub low_voltage_alert: f32,
}

impl Default for BatteryProfile {
    // 3S 18650 pack.
    fn default() -> Self {
        Self {
            min_voltage: 9.0,
            max_voltage: 12.6,
            low_voltage_alert: 11.1,
        }
    }
}

impl BatteryProfile {
    pub fn sanitize(&mut self) {
        let usable = self.min_voltage.is_finite()
            && self.max_voltage.is_finite()
            && self.max_voltage > self.min_voltage;
        if !usable {
            let defaults = Self::default();
            self.min_voltage = defaults.min_voltage;
            self.max_voltage = defaults.max_voltage;
        }
        if !self.low_voltage_alert.is_finite() {
            self.low_voltage_alert = self.min_voltage;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceDefaults {
    pub address: String,
    pub threshold_c: f32,
}

impl Default for DeviceDefaults {
    fn default() -> Self {
        Self {
            address: DEFAULT_DEVICE_ADDRESS.to_string(),
            threshold_c: DEFAULT_THRESHOLD_C,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleConfig {
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub battery: BatteryProfile,
    #[serde(default)]
    pub defaults: DeviceDefaults,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

fn default_timezone() -> String {
    "Asia/Taipei".to_string()
}

fn default_http_port() -> u16 {
    8080
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            poll: PollConfig::default(),
            battery: BatteryProfile::default(),
            defaults: DeviceDefaults::default(),
            timezone: default_timezone(),
            http_port: default_http_port(),
        }
    }
}

impl ConsoleConfig {
    pub fn sanitize(&mut self) {
        self.poll.sanitize();
        self.battery.sanitize();

        let address = self.defaults.address.trim();
        self.defaults.address = if address.is_empty() {
            DEFAULT_DEVICE_ADDRESS.to_string()
        } else {
            address.to_string()
        };
        self.defaults.threshold_c = if self.defaults.threshold_c.is_finite() {
            round_threshold(self.defaults.threshold_c)
        } else {
            DEFAULT_THRESHOLD_C
        };
        if self.http_port == 0 {
            self.http_port = default_http_port();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSettings {
    pub address: String,
    #[serde(rename = "threshold")]
    pub threshold_c: f32,
}

impl DeviceSettings {
    // A stored threshold of zero or one that does not parse counts as absent.
    pub fn from_stored(
        address: Option<&str>,
        threshold: Option<&str>,
        defaults: &DeviceDefaults,
    ) -> Self {
        let address = address
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(defaults.address.as_str())
            .to_string();
        let threshold_c = threshold
            .and_then(|raw| raw.trim().parse::<f32>().ok())
            .filter(|value| value.is_finite() && *value != 0.0)
            .unwrap_or(defaults.threshold_c);

        Self {
            address,
            threshold_c,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigDraft {
    pub address: Option<String>,
    pub threshold_c: Option<f32>,
}

impl ConfigDraft {
    pub fn from_inputs(address: &str, threshold: &str) -> Self {
        Self {
            address: parse_address_input(address).ok(),
            threshold_c: parse_threshold_input(threshold).ok(),
        }
    }
}

pub fn parse_address_input(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::EmptyAddress);
    }
    Ok(trimmed.to_string())
}

pub fn parse_threshold_input(raw: &str) -> Result<f32, ConfigError> {
    raw.trim()
        .parse::<f32>()
        .ok()
        .filter(|value| value.is_finite())
        .map(round_threshold)
        .ok_or_else(|| ConfigError::InvalidThreshold(raw.to_string()))
}

/// Rounds to the one decimal kept in storage.
pub fn round_threshold(threshold_c: f32) -> f32 {
    encode_threshold(threshold_c)
        .parse()
        .unwrap_or(threshold_c)
}

pub fn encode_threshold(threshold_c: f32) -> String {
    format!("{threshold_c:.1}")
}
