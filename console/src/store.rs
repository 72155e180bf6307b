use std::{collections::BTreeMap, io::ErrorKind, path::PathBuf, sync::Arc};

use aircon_common::{
    config::encode_threshold, ConfigDraft, ConsoleConfig, DeviceDefaults, DeviceSettings,
    KEY_DEVICE_ADDRESS, KEY_TEMP_LIMIT,
};
use anyhow::Context;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct LocalStore {
    storage_path: Arc<PathBuf>,
    config_path: Arc<PathBuf>,
    lock: Arc<Mutex<()>>,
}

type Items = BTreeMap<String, String>;

impl LocalStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            storage_path: Arc::new(data_dir.join("local_storage.json")),
            config_path: Arc::new(data_dir.join("console.json")),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn from_env() -> Self {
        let data_dir = std::env::var("AIRCON_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./.aircon"));
        Self::new(data_dir)
    }

    pub async fn load_console_config(&self) -> anyhow::Result<ConsoleConfig> {
        let _guard = self.lock.lock().await;
        match tokio::fs::read(self.config_path.as_ref()).await {
            Ok(raw) => serde_json::from_slice::<ConsoleConfig>(&raw)
                .with_context(|| format!("invalid {}", self.config_path.display())),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(ConsoleConfig::default()),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn get_item(&self, key: &str) -> anyhow::Result<Option<String>> {
        let _guard = self.lock.lock().await;
        Ok(self.read_items().await?.remove(key))
    }

    pub async fn set_item(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let _guard = self.lock.lock().await;
        let mut items = self.read_items().await?;
        items.insert(key.to_string(), value.to_string());
        self.write_items(&items).await
    }

    pub async fn load_device_settings(
        &self,
        defaults: &DeviceDefaults,
    ) -> anyhow::Result<DeviceSettings> {
        let _guard = self.lock.lock().await;
        let items = self.read_items().await?;
        Ok(DeviceSettings::from_stored(
            items.get(KEY_DEVICE_ADDRESS).map(String::as_str),
            items.get(KEY_TEMP_LIMIT).map(String::as_str),
            defaults,
        ))
    }

    pub async fn save_draft(&self, draft: &ConfigDraft) -> anyhow::Result<()> {
        let _guard = self.lock.lock().await;
        let mut items = self.read_items().await?;
        if let Some(address) = &draft.address {
            items.insert(KEY_DEVICE_ADDRESS.to_string(), address.clone());
        }
        if let Some(threshold_c) = draft.threshold_c {
            items.insert(KEY_TEMP_LIMIT.to_string(), encode_threshold(threshold_c));
        }
        self.write_items(&items).await
    }

    async fn read_items(&self) -> anyhow::Result<Items> {
        match tokio::fs::read(self.storage_path.as_ref()).await {
            Ok(raw) => serde_json::from_slice::<Items>(&raw)
                .with_context(|| format!("invalid {}", self.storage_path.display())),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Items::new()),
            Err(err) => Err(err.into()),
        }
    }

    async fn write_items(&self, items: &Items) -> anyhow::Result<()> {
        let path = self.storage_path.as_ref().clone();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let payload = serde_json::to_vec_pretty(items)?;
        tokio::fs::write(&path, payload)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }
}
