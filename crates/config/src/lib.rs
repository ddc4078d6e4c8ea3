//! Configuration: discovery, `${ENV}` substitution and the config schema.
//!
//! Files are looked up as `chmask.{toml,yaml,yml,json}` in the override
//! directory, the working directory, then `~/.config/chmask/`.

pub mod env_subst;
pub mod loader;
pub mod schema;

pub use {
    loader::{
        data_dir, discover_and_load, find_config_file, load_config, save_config, set_config_dir,
        update_config,
    },
    schema::{ChMaskConfig, FixedMaskEntry, NetworkConfig, StoreBackend, StoreConfig},
};
