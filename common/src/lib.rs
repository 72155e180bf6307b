pub mod config;
pub mod console;
pub mod display;
pub mod endpoints;
pub mod types;

pub use config::{
    BatteryProfile, ConfigDraft, ConsoleConfig, DeviceDefaults, DeviceSettings, PollConfig,
};
pub use console::{
    ConsoleError, ConsoleState, ConsoleView, PollTicket, SaveOutcome, StatusDialog, ToggleAction,
};
pub use endpoints::*;
pub use types::{
    FanCommand, FanMode, TelemetrySnapshot, TemperaturePayload, TemperatureReading,
    ThresholdResponse, ThresholdUpdate, VoltagePayload,
};
