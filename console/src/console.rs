use std::sync::Arc;

use aircon_common::{
    ConfigDraft, ConsoleConfig, ConsoleError, ConsoleState, ConsoleView, DeviceSettings,
    SaveOutcome, ToggleAction,
};
use chrono::{DateTime, FixedOffset, Offset, Utc};
use chrono_tz::Tz;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{client::DeviceClient, store::LocalStore};

// The state lock is never held across a device request.
#[derive(Clone)]
pub struct Console {
    state: Arc<Mutex<ConsoleState>>,
    client: DeviceClient,
    store: LocalStore,
    timezone: Tz,
}

impl Console {
    pub async fn load(store: LocalStore, config: &ConsoleConfig, client: DeviceClient) -> Self {
        let settings = store
            .load_device_settings(&config.defaults)
            .await
            .unwrap_or_else(|err| {
                warn!("failed to load device settings from local storage: {err:#}");
                DeviceSettings::from_stored(None, None, &config.defaults)
            });
        let timezone = config.timezone.parse::<Tz>().unwrap_or_else(|_| {
            warn!("unknown timezone {:?}, using UTC", config.timezone);
            Tz::UTC
        });

        info!(
            "console targeting device {} with threshold {:.1} °C",
            settings.address, settings.threshold_c
        );

        Self {
            state: Arc::new(Mutex::new(ConsoleState::new(settings, config.battery))),
            client,
            store,
            timezone,
        }
    }

    pub async fn view(&self) -> ConsoleView {
        self.state.lock().await.view()
    }

    pub async fn settings(&self) -> DeviceSettings {
        self.state.lock().await.settings().clone()
    }

    pub async fn is_manual_override(&self) -> bool {
        self.state.lock().await.is_manual_override()
    }

    pub async fn fetch_temperature(&self) {
        let (ticket, address) = {
            let state = self.state.lock().await;
            (state.begin_temperature_poll(), state.address().to_string())
        };

        match self.client.fetch_temperature(&address).await {
            Ok(reading) => {
                debug!(
                    "temperature {} °C, device mode {}",
                    reading.temperature_c,
                    reading.mode.as_str()
                );
                let now = self.now();
                self.state.lock().await.apply_temperature(ticket, reading, now);
            }
            Err(err) => {
                warn!("temperature fetch from {address} failed: {err}");
                self.state.lock().await.temperature_failed();
            }
        }
    }

    pub async fn fetch_voltage(&self) {
        let address = self.state.lock().await.address().to_string();

        match self.client.fetch_voltage(&address).await {
            Ok(voltage) => {
                if voltage.is_nan() {
                    warn!("device at {address} reported a voltage sensor fault");
                }
                self.state.lock().await.apply_voltage(voltage);
            }
            Err(err) => {
                warn!("voltage fetch from {address} failed: {err}");
                self.state.lock().await.voltage_failed();
            }
        }
    }

    pub async fn flicker_tick(&self) {
        let now = self.now();
        self.state.lock().await.flicker_tick(now);
    }

    pub async fn toggle_fan(&self) -> Result<(), ConsoleError> {
        let (action, address) = {
            let mut state = self.state.lock().await;
            let action = state.begin_toggle()?;
            (action, state.address().to_string())
        };
        let pending = PendingGuard::new(&self.state, Pending::Toggle);

        let result = match action {
            ToggleAction::ManualOn => self.client.set_fan(&address, true).await.map(|on| {
                debug!("device reports fan on={on}");
            }),
            ToggleAction::Auto => self.client.set_auto_mode(&address).await,
        };

        match &result {
            Ok(()) => info!("fan mode switched ({action:?}) on {address}"),
            Err(err) => warn!("fan mode switch ({action:?}) on {address} failed: {err}"),
        }
        self.state
            .lock()
            .await
            .finish_toggle(action, result.is_ok());
        pending.disarm();

        self.fetch_temperature().await;
        Ok(())
    }

    pub async fn save_config(
        &self,
        address_input: &str,
        threshold_input: &str,
    ) -> Result<SaveOutcome, ConsoleError> {
        let draft = ConfigDraft::from_inputs(address_input, threshold_input);
        if draft.threshold_c.is_none() {
            debug!("ignoring threshold input {threshold_input:?}");
        }

        self.state.lock().await.begin_save()?;
        let pending = PendingGuard::new(&self.state, Pending::Save);

        if let Err(err) = self.store.save_draft(&draft).await {
            warn!("failed to persist console settings: {err:#}");
            let outcome = SaveOutcome::StorageFailed(err.to_string());
            self.state.lock().await.finish_save(outcome.clone());
            pending.disarm();
            return Ok(outcome);
        }

        let settings = {
            let mut state = self.state.lock().await;
            state.commit_draft(&draft);
            state.settings().clone()
        };

        let outcome = match self
            .client
            .push_threshold(&settings.address, settings.threshold_c)
            .await
        {
            Ok(()) => {
                info!(
                    "threshold {:.1} °C pushed to {}",
                    settings.threshold_c, settings.address
                );
                SaveOutcome::Synced
            }
            Err(err) => {
                warn!(
                    "threshold update on {} failed: {err}",
                    settings.address
                );
                SaveOutcome::DeviceSyncFailed
            }
        };

        self.state.lock().await.finish_save(outcome.clone());
        pending.disarm();
        Ok(outcome)
    }

    pub async fn sync_threshold_on_load(&self) -> bool {
        let settings = self.settings().await;
        info!(
            "syncing threshold {:.1} °C to device at {}",
            settings.threshold_c, settings.address
        );

        match self
            .client
            .push_threshold(&settings.address, settings.threshold_c)
            .await
        {
            Ok(()) => {
                info!("threshold synchronized to device on load");
                true
            }
            Err(err) => {
                warn!(
                    "startup threshold sync to {} failed: {err}",
                    settings.address
                );
                false
            }
        }
    }

    pub async fn open_config(&self) {
        self.state.lock().await.open_config();
    }

    pub async fn close_config(&self) {
        self.state.lock().await.close_config();
    }

    pub async fn close_dialog(&self) {
        self.state.lock().await.close_dialog();
    }

    fn now(&self) -> DateTime<FixedOffset> {
        let local = Utc::now().with_timezone(&self.timezone);
        local.with_timezone(&local.offset().fix())
    }
}

#[derive(Debug, Clone, Copy)]
enum Pending {
    Toggle,
    Save,
}

impl Pending {
    fn cancel(self, state: &mut ConsoleState) {
        match self {
            Self::Toggle => state.cancel_toggle(),
            Self::Save => state.cancel_save(),
        }
    }
}

// Releases the in-flight flag when the owning future is dropped before it
// reports an outcome, e.g. a disconnected API client.
struct PendingGuard {
    state: Option<Arc<Mutex<ConsoleState>>>,
    pending: Pending,
}

impl PendingGuard {
    fn new(state: &Arc<Mutex<ConsoleState>>, pending: Pending) -> Self {
        Self {
            state: Some(state.clone()),
            pending,
        }
    }

    fn disarm(mut self) {
        self.state = None;
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        let Some(state) = self.state.take() else {
            return;
        };
        let pending = self.pending;
        warn!("{pending:?} abandoned before the device answered");

        if let Ok(mut locked) = state.try_lock() {
            pending.cancel(&mut locked);
            return;
        }
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            runtime.spawn(async move {
                pending.cancel(&mut *state.lock().await);
            });
        }
    }
}
