use aircon_common::{
    device_url, FanCommand, TemperaturePayload, TemperatureReading, ThresholdResponse,
    ThresholdUpdate, VoltagePayload, PATH_FAN, PATH_MODE_AUTO, PATH_TEMPERATURE, PATH_THRESHOLD,
    PATH_VOLTAGE,
};
use reqwest::Method;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("device answered with HTTP {0}")]
    Status(u16),

    #[error("device rejected the request: {0}")]
    Rejected(String),
}

#[derive(Clone, Default)]
pub struct DeviceClient {
    http: reqwest::Client,
}

impl DeviceClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    pub async fn fetch_temperature(&self, address: &str) -> Result<TemperatureReading, DeviceError> {
        let response = self
            .http
            .get(device_url(address, PATH_TEMPERATURE))
            .send()
            .await?;
        let payload: TemperaturePayload = Self::ensure_success(response)?.json().await?;
        Ok(payload.into())
    }

    pub async fn fetch_voltage(&self, address: &str) -> Result<f32, DeviceError> {
        let response = self
            .http
            .get(device_url(address, PATH_VOLTAGE))
            .send()
            .await?;
        let payload: VoltagePayload = Self::ensure_success(response)?.json().await?;
        Ok(payload.voltage)
    }

    pub async fn set_fan(&self, address: &str, on: bool) -> Result<bool, DeviceError> {
        let url = device_url(address, PATH_FAN);
        self.preflight(&url).await?;

        let response = self
            .http
            .post(&url)
            .json(&FanCommand { on })
            .send()
            .await?;
        let reported: FanCommand = Self::ensure_success(response)?.json().await?;
        Ok(reported.on)
    }

    pub async fn set_auto_mode(&self, address: &str) -> Result<(), DeviceError> {
        let response = self
            .http
            .get(device_url(address, PATH_MODE_AUTO))
            .send()
            .await?;
        Self::ensure_success(response)?;
        Ok(())
    }

    // Only `{"status":"ok"}` counts as accepted.
    pub async fn push_threshold(&self, address: &str, threshold_c: f32) -> Result<(), DeviceError> {
        let url = device_url(address, PATH_THRESHOLD);
        self.preflight(&url).await?;

        let response = self
            .http
            .post(&url)
            .json(&ThresholdUpdate { temp: threshold_c })
            .send()
            .await?;
        let result: ThresholdResponse = Self::ensure_success(response)?.json().await?;
        if result.is_ok() {
            Ok(())
        } else {
            Err(DeviceError::Rejected(
                result
                    .message
                    .unwrap_or_else(|| format!("status {:?}", result.status)),
            ))
        }
    }

    // The device only needs the OPTIONS round trip; its status is not checked.
    async fn preflight(&self, url: &str) -> Result<(), DeviceError> {
        let response = self.http.request(Method::OPTIONS, url).send().await?;
        debug!("pre-flight {url} -> {}", response.status());
        Ok(())
    }

    fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, DeviceError> {
        let status = response.status();
        if !status.is_success() {
            return Err(DeviceError::Status(status.as_u16()));
        }
        Ok(response)
    }
}
