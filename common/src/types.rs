use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FanMode {
    #[default]
    Auto,
    Manual,
}

impl FanMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Manual => "manual",
        }
    }

    pub fn from_device(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("manual") {
            Self::Manual
        } else {
            Self::Auto
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemperaturePayload {
    #[serde(with = "sensor_value")]
    pub temp: f32,
    #[serde(default)]
    pub mode: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoltagePayload {
    #[serde(with = "sensor_value")]
    pub voltage: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FanCommand {
    pub on: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdUpdate {
    pub temp: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ThresholdResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: Some(message.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureReading {
    pub temperature_c: f32,
    pub mode: FanMode,
}

impl From<TemperaturePayload> for TemperatureReading {
    fn from(payload: TemperaturePayload) -> Self {
        Self {
            temperature_c: payload.temp,
            mode: FanMode::from_device(&payload.mode),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetrySnapshot {
    pub temperature_c: f32,
    pub mode: FanMode,
    pub voltage: f32,
}

impl Default for TelemetrySnapshot {
    fn default() -> Self {
        Self {
            temperature_c: f32::NAN,
            mode: FanMode::Auto,
            voltage: f32::NAN,
        }
    }
}

// Firmware sends "NAN" for an unreadable sensor and sometimes quotes numbers.
mod sensor_value {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(value: &f32, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f32(*value)
        } else {
            serializer.serialize_str("NAN")
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f32, D::Error> {
        let value = match Option::<Raw>::deserialize(deserializer)? {
            Some(Raw::Number(number)) => number as f32,
            Some(Raw::Text(text)) => text.trim().parse::<f32>().unwrap_or(f32::NAN),
            None => f32::NAN,
        };
        Ok(if value.is_finite() { value } else { f32::NAN })
    }
}
