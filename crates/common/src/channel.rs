use serde::{Deserialize, Serialize};

/// An uplink channel as configured for a device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UplinkChannel {
    /// Center frequency in Hz.
    pub frequency: u32,
    pub min_dr: u8,
    pub max_dr: u8,
    /// Whether the device currently has this channel active.
    pub enabled: bool,
    /// Configured by an operator rather than taken from the region defaults.
    #[serde(default)]
    pub user_defined: bool,
}

/// Link quality observed for one uplink frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UplinkHistoryEntry {
    pub f_cnt: u32,
    /// Best SNR over all receiving gateways, in dB.
    pub max_snr: f32,
    /// Best RSSI over all receiving gateways, in dBm.
    pub max_rssi: i32,
    pub tx_power_index: u32,
    pub gateway_count: u32,
}
