use std::time::{SystemTime, UNIX_EPOCH};

use {
    chmask_common::DevEui,
    serde::{Deserialize, Serialize},
};

use crate::error::StoreError;

/// Channel mask an operator wants a device to use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChMaskOverride {
    pub enabled_uplink_channel_indices: Vec<usize>,
}

/// Stored configuration for one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub dev_eui: DevEui,
    /// Milliseconds since the Unix epoch.
    pub created_at: u64,
    pub updated_at: u64,
    #[serde(default)]
    pub chmask_config: Option<ChMaskOverride>,
}

/// Summary row returned by listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfigListItem {
    pub dev_eui: DevEui,
    pub created_at: u64,
    pub updated_at: u64,
}

/// Whether each stored configuration is already in effect on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigStoreAlignment {
    pub chmask_config: bool,
}

pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

impl DeviceConfig {
    pub fn new(dev_eui: DevEui, chmask: Option<Vec<usize>>) -> Self {
        let now = now_ms();
        Self {
            dev_eui,
            created_at: now,
            updated_at: now,
            chmask_config: chmask.map(|enabled_uplink_channel_indices| ChMaskOverride {
                enabled_uplink_channel_indices,
            }),
        }
    }

    /// Reject empty configurations and normalize the channel list.
    pub fn validate(&mut self) -> Result<(), StoreError> {
        let Some(cm) = self.chmask_config.as_mut() else {
            return Err(StoreError::Validation(
                "empty configuration, consider deleting".into(),
            ));
        };

        let uc = &mut cm.enabled_uplink_channel_indices;
        if uc.is_empty() {
            return Err(StoreError::Validation("provided chmask_config is empty".into()));
        }
        uc.sort_unstable();
        uc.dedup();

        Ok(())
    }

    /// Compare the stored configuration with what the device currently runs.
    /// A device without a stored channel mask is aligned.
    pub fn alignment(&self, enabled_indices: &[usize]) -> ConfigStoreAlignment {
        let chmask_config = match &self.chmask_config {
            Some(cm) => {
                let mut enabled = enabled_indices.to_vec();
                enabled.sort_unstable();
                enabled.dedup();
                cm.enabled_uplink_channel_indices == enabled
            },
            None => true,
        };
        ConfigStoreAlignment { chmask_config }
    }

    pub fn list_item(&self) -> DeviceConfigListItem {
        DeviceConfigListItem {
            dev_eui: self.dev_eui,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eui() -> DevEui {
        DevEui::from_be_bytes([1, 2, 3, 4, 5, 6, 7, 8])
    }

    #[test]
    fn test_validate_empty() {
        assert!(DeviceConfig::new(eui(), None).validate().is_err());
        assert!(DeviceConfig::new(eui(), Some(vec![])).validate().is_err());
    }

    #[test]
    fn test_validate_normalizes() {
        let mut dc = DeviceConfig::new(eui(), Some(vec![7, 0, 5, 0]));
        dc.validate().unwrap();
        assert_eq!(
            dc.chmask_config.unwrap().enabled_uplink_channel_indices,
            vec![0, 5, 7]
        );
    }

    #[test]
    fn test_alignment() {
        let mut dc = DeviceConfig::new(eui(), Some(vec![0, 1, 2]));
        dc.validate().unwrap();
        assert!(dc.alignment(&[2, 1, 0]).chmask_config);
        assert!(!dc.alignment(&[0, 1, 2, 3]).chmask_config);

        let none = DeviceConfig::new(eui(), None);
        assert!(none.alignment(&[4]).chmask_config);
    }
}
