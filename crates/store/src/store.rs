//! Storage abstraction for per-device configuration.

use {async_trait::async_trait, chmask_common::DevEui};

use crate::{
    entry::{ConfigStoreAlignment, DeviceConfig, DeviceConfigListItem},
    error::StoreError,
};

#[async_trait]
pub trait DeviceConfigStore: Send + Sync {
    /// Validate and insert or replace the configuration of a device. An
    /// existing entry keeps its `created_at`.
    async fn upsert(&self, config: DeviceConfig) -> Result<DeviceConfig, StoreError>;

    async fn get(&self, dev_eui: &DevEui) -> Result<DeviceConfig, StoreError>;

    async fn delete(&self, dev_eui: &DevEui) -> Result<(), StoreError>;

    async fn count(&self) -> Result<usize, StoreError>;

    /// Entries ordered by DevEUI.
    async fn list(
        &self,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<DeviceConfigListItem>, StoreError>;

    /// Like [`get`](Self::get), but a missing entry is `None`.
    async fn find(&self, dev_eui: &DevEui) -> Result<Option<DeviceConfig>, StoreError> {
        match self.get(dev_eui).await {
            Ok(config) => Ok(Some(config)),
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn alignment(
        &self,
        dev_eui: &DevEui,
        enabled_indices: &[usize],
    ) -> Result<ConfigStoreAlignment, StoreError> {
        Ok(self.get(dev_eui).await?.alignment(enabled_indices))
    }
}
