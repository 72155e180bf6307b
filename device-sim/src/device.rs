use aircon_common::FanMode;

pub const MIN_TEMP_C: f32 = 24.0;
pub const MAX_TEMP_C: f32 = 36.0;
pub const EMPTY_PACK_V: f32 = 9.0;

const HEATING_STEP_C: f32 = 0.3;
const COOLING_STEP_C: f32 = 0.4;
const DRAIN_STEP_V: f32 = 0.002;

#[derive(Debug, Clone)]
pub struct SimulatedDevice {
    temperature_c: f32,
    threshold_c: f32,
    voltage: f32,
    mode: FanMode,
    fan_on: bool,
    sensor_fault: bool,
}

impl Default for SimulatedDevice {
    fn default() -> Self {
        Self::new(30.0)
    }
}

impl SimulatedDevice {
    pub fn new(threshold_c: f32) -> Self {
        let mut device = Self {
            temperature_c: 28.0,
            threshold_c,
            voltage: 12.4,
            mode: FanMode::Auto,
            fan_on: false,
            sensor_fault: false,
        };
        device.apply_auto_control();
        device
    }

    pub fn temperature_c(&self) -> f32 {
        if self.sensor_fault {
            f32::NAN
        } else {
            self.temperature_c
        }
    }

    pub fn threshold_c(&self) -> f32 {
        self.threshold_c
    }

    pub fn voltage(&self) -> f32 {
        self.voltage
    }

    pub fn mode(&self) -> FanMode {
        self.mode
    }

    pub fn is_fan_on(&self) -> bool {
        self.fan_on
    }

    pub fn set_temperature(&mut self, temperature_c: f32) {
        self.temperature_c = temperature_c.clamp(MIN_TEMP_C, MAX_TEMP_C);
        self.apply_auto_control();
    }

    pub fn set_voltage(&mut self, voltage: f32) {
        self.voltage = voltage;
    }

    pub fn set_sensor_fault(&mut self, fault: bool) {
        self.sensor_fault = fault;
    }

    pub fn step(&mut self) {
        if self.fan_on {
            self.temperature_c -= COOLING_STEP_C;
        } else {
            self.temperature_c += HEATING_STEP_C;
        }
        self.temperature_c = self.temperature_c.clamp(MIN_TEMP_C, MAX_TEMP_C);
        self.voltage = (self.voltage - DRAIN_STEP_V).max(EMPTY_PACK_V);
        self.apply_auto_control();
    }

    // Always leaves the device in manual mode.
    pub fn set_fan(&mut self, on: bool) -> bool {
        self.mode = FanMode::Manual;
        self.fan_on = on;
        self.fan_on
    }

    pub fn set_auto(&mut self) {
        self.mode = FanMode::Auto;
        self.apply_auto_control();
    }

    pub fn set_threshold(&mut self, threshold_c: f32) -> Result<(), &'static str> {
        if !threshold_c.is_finite() {
            return Err("threshold must be a finite number");
        }
        self.threshold_c = threshold_c;
        self.apply_auto_control();
        Ok(())
    }

    fn apply_auto_control(&mut self) {
        if self.mode == FanMode::Auto {
            self.fan_on = !self.sensor_fault && self.temperature_c >= self.threshold_c;
        }
    }
}
