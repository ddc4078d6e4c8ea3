use std::collections::{BTreeMap, BTreeSet, HashMap};

use {
    chmask_common::{CommonName, DevEui, MacVersion, Revision, UplinkChannel, UplinkHistoryEntry},
    serde::{Deserialize, Serialize},
};

/// Input handed to a channel-mask algorithm for one device.
///
/// `uplink_channels` is keyed by channel index. `uplink_history` is ordered
/// oldest-first and may have been truncated by the host, so algorithms must
/// not assume the frame counters are contiguous.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub region_config_id: String,
    pub region_common_name: CommonName,
    pub dev_eui: DevEui,
    pub mac_version: MacVersion,
    pub reg_params_revision: Revision,
    pub uplink_channels: BTreeMap<usize, UplinkChannel>,
    pub uplink_history: Vec<UplinkHistoryEntry>,
    pub device_variables: HashMap<String, String>,
}

impl Request {
    /// Request with no channels, history or variables.
    pub fn new(
        region_config_id: impl Into<String>,
        region_common_name: CommonName,
        dev_eui: DevEui,
        mac_version: MacVersion,
        reg_params_revision: Revision,
    ) -> Self {
        Self {
            region_config_id: region_config_id.into(),
            region_common_name,
            dev_eui,
            mac_version,
            reg_params_revision,
            uplink_channels: BTreeMap::new(),
            uplink_history: Vec::new(),
            device_variables: HashMap::new(),
        }
    }

    pub fn with_channel(mut self, index: usize, channel: UplinkChannel) -> Self {
        self.uplink_channels.insert(index, channel);
        self
    }

    pub fn with_history(mut self, entry: UplinkHistoryEntry) -> Self {
        self.uplink_history.push(entry);
        self
    }

    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.device_variables.insert(key.into(), value.into());
        self
    }

    pub fn has_channel(&self, index: usize) -> bool {
        self.uplink_channels.contains_key(&index)
    }

    /// Indices of every channel in the request, ascending.
    pub fn available_channel_indices(&self) -> Vec<usize> {
        self.uplink_channels.keys().copied().collect()
    }

    /// The mask the device is using right now.
    pub fn enabled_channel_indices(&self) -> ChannelMask {
        self.uplink_channels
            .iter()
            .filter(|(_, c)| c.enabled)
            .map(|(i, _)| *i)
            .collect()
    }

    /// Drop the oldest history entries so at most `max` remain.
    pub fn truncate_history(&mut self, max: usize) {
        let len = self.uplink_history.len();
        if len > max {
            self.uplink_history.drain(..len - max);
        }
    }
}

/// A validated channel-mask decision: distinct channel indices in ascending
/// order. Indices not present are disabled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelMask(BTreeSet<usize>);

impl ChannelMask {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.0.contains(&index)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<usize> {
        self.iter().collect()
    }
}

impl FromIterator<usize> for ChannelMask {
    fn from_iter<T: IntoIterator<Item = usize>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<Vec<usize>> for ChannelMask {
    fn from(v: Vec<usize>) -> Self {
        v.into_iter().collect()
    }
}

impl From<&[usize]> for ChannelMask {
    fn from(v: &[usize]) -> Self {
        v.iter().copied().collect()
    }
}
