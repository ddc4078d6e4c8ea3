//! Channel-mask host: validates requests at the boundary, dispatches them to
//! the registered algorithm with a time budget, checks the answer against
//! the request and falls back to the device's current mask on any failure.

pub mod dispatch;
pub mod error;
pub mod service;
pub mod setup;
pub mod validate;
pub mod wire;

pub use {
    dispatch::{ChannelMaskHost, DecisionSource, Outcome},
    error::HostError,
    service::ChannelMaskService,
    setup::{build_host, build_registry, build_service, open_store},
};
