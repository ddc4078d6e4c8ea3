//! Device config store: operator-provided channel-mask overrides per device.
//!
//! Backends: in-memory, a JSON file, or SQLite. All of them implement
//! [`DeviceConfigStore`].

pub mod entry;
pub mod error;
pub mod file;
pub mod memory;
pub mod sqlite;
pub mod store;

pub use {
    entry::{ChMaskOverride, ConfigStoreAlignment, DeviceConfig, DeviceConfigListItem},
    error::StoreError,
    file::JsonFileStore,
    memory::MemoryStore,
    sqlite::SqliteStore,
    store::DeviceConfigStore,
};
