use std::collections::BTreeMap;

use {async_trait::async_trait, chmask_common::DevEui, tokio::sync::RwLock, tracing::info};

use crate::{
    entry::{DeviceConfig, DeviceConfigListItem, now_ms},
    error::StoreError,
    store::DeviceConfigStore,
};

/// Process-local store; contents are lost on exit.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<DevEui, DeviceConfig>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Validate `config` and write it into `entries`, keeping the original
/// `created_at` of an existing entry.
pub(crate) fn upsert_into(
    entries: &mut BTreeMap<DevEui, DeviceConfig>,
    mut config: DeviceConfig,
) -> Result<DeviceConfig, StoreError> {
    config.validate()?;

    let now = now_ms();
    config.updated_at = now;
    config.created_at = entries
        .get(&config.dev_eui)
        .map(|existing| existing.created_at)
        .unwrap_or(now);

    entries.insert(config.dev_eui, config.clone());
    Ok(config)
}

pub(crate) fn page(
    entries: &BTreeMap<DevEui, DeviceConfig>,
    limit: usize,
    offset: usize,
) -> Vec<DeviceConfigListItem> {
    entries
        .values()
        .skip(offset)
        .take(limit)
        .map(DeviceConfig::list_item)
        .collect()
}

#[async_trait]
impl DeviceConfigStore for MemoryStore {
    async fn upsert(&self, config: DeviceConfig) -> Result<DeviceConfig, StoreError> {
        let dc = upsert_into(&mut *self.entries.write().await, config)?;
        info!(dev_eui = %dc.dev_eui, "Device config store set");
        Ok(dc)
    }

    async fn get(&self, dev_eui: &DevEui) -> Result<DeviceConfig, StoreError> {
        self.entries
            .read()
            .await
            .get(dev_eui)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(dev_eui.to_string()))
    }

    async fn delete(&self, dev_eui: &DevEui) -> Result<(), StoreError> {
        self.entries
            .write()
            .await
            .remove(dev_eui)
            .ok_or_else(|| StoreError::NotFound(dev_eui.to_string()))?;
        info!(dev_eui = %dev_eui, "Device config store deleted");
        Ok(())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.entries.read().await.len())
    }

    async fn list(
        &self,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<DeviceConfigListItem>, StoreError> {
        Ok(page(&*self.entries.read().await, limit, offset))
    }
}
