//! Shared LoRaWAN primitives: device identifiers, regional parameters and
//! the channel/uplink records exchanged with channel-mask algorithms.

pub mod channel;
pub mod error;
pub mod eui;
pub mod region;

pub use {
    channel::{UplinkChannel, UplinkHistoryEntry},
    error::ParseError,
    eui::DevEui,
    region::{CommonName, MacVersion, Revision},
};
