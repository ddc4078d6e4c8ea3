use std::path::PathBuf;

use {
    anyhow::{Result, bail},
    chmask_config::{ChMaskConfig, StoreBackend, find_config_file, save_config, update_config},
    clap::{Args, Subcommand},
};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration.
    Show,
    /// Write a default configuration file.
    Init,
    /// Change settings in the configuration file.
    Set(ConfigSettings),
}

#[derive(Debug, Default, Args)]
pub struct ConfigSettings {
    /// Algorithm used when a request names none.
    #[arg(long)]
    pub algorithm: Option<String>,
    #[arg(long)]
    pub timeout_ms: Option<u64>,
    #[arg(long)]
    pub max_uplink_history: Option<usize>,
    /// memory, json or sqlite.
    #[arg(long)]
    pub store_backend: Option<StoreBackend>,
    #[arg(long)]
    pub store_path: Option<PathBuf>,
}

impl ConfigSettings {
    fn is_empty(&self) -> bool {
        self.algorithm.is_none()
            && self.timeout_ms.is_none()
            && self.max_uplink_history.is_none()
            && self.store_backend.is_none()
            && self.store_path.is_none()
    }

    fn apply(self, config: &mut ChMaskConfig) {
        if let Some(algorithm) = self.algorithm {
            config.network.chmask_algorithm = algorithm;
        }
        if let Some(ms) = self.timeout_ms {
            config.network.chmask_timeout_ms = ms;
        }
        if let Some(n) = self.max_uplink_history {
            config.network.max_uplink_history = n;
        }
        if let Some(backend) = self.store_backend {
            config.store.backend = backend;
        }
        if let Some(path) = self.store_path {
            config.store.path = Some(path);
        }
    }
}

pub fn handle_config(action: ConfigAction, config: &ChMaskConfig) -> Result<()> {
    match action {
        ConfigAction::Show => {
            print!("{}", toml::to_string_pretty(config)?);
            Ok(())
        },
        ConfigAction::Init => init(),
        ConfigAction::Set(settings) => set(settings),
    }
}

fn init() -> Result<()> {
    if let Some(existing) = find_config_file() {
        bail!("config file already exists at {}", existing.display());
    }
    let path = save_config(&ChMaskConfig::default())?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn set(settings: ConfigSettings) -> Result<()> {
    if settings.is_empty() {
        bail!("nothing to change, pass at least one setting");
    }
    let path = update_config(|config| settings.apply(config))?;
    println!("Updated {}", path.display());
    Ok(())
}
