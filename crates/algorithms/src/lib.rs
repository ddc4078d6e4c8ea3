//! Channel-mask algorithms.
//!
//! Each algorithm implements [`ChannelMaskAlgorithm`]: a stable id, a display
//! name and a pure `handle` function mapping a device's channel plan and
//! uplink history to the channel indices it should enable. Algorithms are
//! collected in an [`AlgorithmRegistry`] keyed by id.

pub mod algorithm;
pub mod builtin;
pub mod registry;
pub mod request;

pub use {
    algorithm::{AlgorithmInfo, ChannelMaskAlgorithm, DecisionError, is_valid_id},
    registry::{AlgorithmRegistry, RegistryError},
    request::{ChannelMask, Request},
};
