//! Algorithms that ship with the host.

pub mod all_channels;
pub mod fixed;
pub mod retain;

use std::sync::Arc;

use crate::algorithm::ChannelMaskAlgorithm;

pub use {all_channels::AllChannels, fixed::FixedMask, retain::Retain};

/// Every built-in algorithm that needs no configuration.
pub fn all() -> Vec<Arc<dyn ChannelMaskAlgorithm>> {
    vec![Arc::new(Retain), Arc::new(AllChannels)]
}
