pub const PATH_TEMPERATURE: &str = "/temperature";
pub const PATH_VOLTAGE: &str = "/v";
pub const PATH_FAN: &str = "/fan";
pub const PATH_MODE_AUTO: &str = "/mode/auto";
pub const PATH_THRESHOLD: &str = "/threshold";

pub const KEY_DEVICE_ADDRESS: &str = "esp32_ip";
pub const KEY_TEMP_LIMIT: &str = "temp_limit";

pub fn device_url(address: &str, path: &str) -> String {
    format!("http://{address}{path}")
}
