use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use {
    async_trait::async_trait,
    chmask_common::DevEui,
    tokio::sync::Mutex,
    tracing::{debug, info},
};

use crate::{
    entry::{DeviceConfig, DeviceConfigListItem},
    error::StoreError,
    memory::{page, upsert_into},
    store::DeviceConfigStore,
};

/// JSON file-backed store: a single object mapping DevEUI → entry,
/// rewritten on every change. A change is visible only once it is on disk.
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<DevEui, DeviceConfig>>,
}

impl JsonFileStore {
    /// Load the store from disk, or start empty if the file does not exist.
    pub fn open(path: PathBuf) -> Result<Self, StoreError> {
        let entries = if path.exists() {
            let data = std::fs::read_to_string(&path)?;
            serde_json::from_str(&data)?
        } else {
            BTreeMap::new()
        };
        debug!(path = %path.display(), entries = entries.len(), "opened device config store");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, entries: &BTreeMap<DevEui, DeviceConfig>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let data = serde_json::to_string_pretty(entries)?;
        tokio::fs::write(&self.path, data).await?;
        Ok(())
    }
}

#[async_trait]
impl DeviceConfigStore for JsonFileStore {
    async fn upsert(&self, config: DeviceConfig) -> Result<DeviceConfig, StoreError> {
        let mut entries = self.entries.lock().await;
        let mut next = entries.clone();
        let dc = upsert_into(&mut next, config)?;
        self.persist(&next).await?;
        *entries = next;
        info!(dev_eui = %dc.dev_eui, "Device config store set");
        Ok(dc)
    }

    async fn get(&self, dev_eui: &DevEui) -> Result<DeviceConfig, StoreError> {
        self.entries
            .lock()
            .await
            .get(dev_eui)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(dev_eui.to_string()))
    }

    async fn delete(&self, dev_eui: &DevEui) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().await;
        let mut next = entries.clone();
        if next.remove(dev_eui).is_none() {
            return Err(StoreError::NotFound(dev_eui.to_string()));
        }
        self.persist(&next).await?;
        *entries = next;
        info!(dev_eui = %dev_eui, "Device config store deleted");
        Ok(())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.entries.lock().await.len())
    }

    async fn list(
        &self,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<DeviceConfigListItem>, StoreError> {
        Ok(page(&*self.entries.lock().await, limit, offset))
    }
}
