use std::{
    io::Write,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use tracing::{debug, warn};

use crate::{env_subst::substitute_env, schema::ChMaskConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &["chmask.toml", "chmask.yaml", "chmask.yml", "chmask.json"];

/// Override for the config directory, set via `set_config_dir()`.
static CONFIG_DIR_OVERRIDE: Mutex<Option<PathBuf>> = Mutex::new(None);

/// Lock guarding config read-modify-write cycles.
static CONFIG_SAVE_LOCK: Mutex<()> = Mutex::new(());

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Set a custom config directory. When set, config discovery only looks in
/// this directory and saving writes there.
pub fn set_config_dir(path: PathBuf) {
    *lock(&CONFIG_DIR_OVERRIDE) = Some(path);
}

/// Clear the config directory override, restoring default discovery.
#[cfg(test)]
fn clear_config_dir() {
    *lock(&CONFIG_DIR_OVERRIDE) = None;
}

fn config_dir_override() -> Option<PathBuf> {
    lock(&CONFIG_DIR_OVERRIDE).clone()
}

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<ChMaskConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. the override directory, if set (nothing else is searched then)
/// 2. `./chmask.{toml,yaml,yml,json}`
/// 3. `~/.config/chmask/chmask.{toml,yaml,yml,json}`
///
/// Returns `ChMaskConfig::default()` if no config file is found or the one
/// found cannot be parsed.
pub fn discover_and_load() -> ChMaskConfig {
    match find_config_file() {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            match load_config(&path) {
                Ok(cfg) => cfg,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
                    ChMaskConfig::default()
                },
            }
        },
        None => {
            debug!("no config file found, using defaults");
            ChMaskConfig::default()
        },
    }
}

fn find_in_dir(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    if let Some(dir) = config_dir_override() {
        return find_in_dir(&dir);
    }

    find_in_dir(Path::new(".")).or_else(|| user_config_dir().and_then(|d| find_in_dir(&d)))
}

fn user_config_dir() -> Option<PathBuf> {
    home_dir().map(|h| h.join(".config").join("chmask"))
}

/// Returns the config directory: override, or `~/.config/chmask/`.
fn config_dir() -> Option<PathBuf> {
    config_dir_override().or_else(user_config_dir)
}

/// Returns the data directory: `~/.chmask/`.
pub fn data_dir() -> PathBuf {
    home_dir()
        .map(|h| h.join(".chmask"))
        .unwrap_or_else(|| PathBuf::from(".chmask"))
}

fn home_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf())
}

/// Returns the path of an existing config file, or the default TOML path.
fn find_or_default_config_path() -> PathBuf {
    if let Some(path) = find_config_file() {
        return path;
    }
    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("chmask.toml")
}

/// Atomically load the current config, apply `f`, and save.
///
/// Returns the path written to.
pub fn update_config(f: impl FnOnce(&mut ChMaskConfig)) -> anyhow::Result<PathBuf> {
    let _guard = lock(&CONFIG_SAVE_LOCK);
    let mut config = discover_and_load();
    f(&mut config);
    save_config_inner(&config)
}

/// Serialize `config` and write it over the discovered config file, or to
/// `chmask.toml` in the config directory when none exists yet.
///
/// Prefer [`update_config`] for read-modify-write cycles.
pub fn save_config(config: &ChMaskConfig) -> anyhow::Result<PathBuf> {
    let _guard = lock(&CONFIG_SAVE_LOCK);
    save_config_inner(config)
}

fn save_config_inner(config: &ChMaskConfig) -> anyhow::Result<PathBuf> {
    let path = find_or_default_config_path();
    let raw = serialize_config(config, &path)?;
    write_atomic(&path, &raw)?;
    debug!(path = %path.display(), "saved config");
    Ok(path)
}

/// Write through a temp file in the same directory, then rename over `path`.
fn write_atomic(path: &Path, raw: &str) -> anyhow::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(raw.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)?;
    Ok(())
}

fn serialize_config(config: &ChMaskConfig, path: &Path) -> anyhow::Result<String> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => {
            toml::to_string_pretty(config).map_err(|e| anyhow::anyhow!("serialize config: {e}"))
        },
        "yaml" | "yml" => Ok(serde_yaml::to_string(config)?),
        "json" => Ok(serde_json::to_string_pretty(config)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<ChMaskConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::StoreBackend;

    #[test]
    fn test_load_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chmask.toml");
        std::fs::write(
            &path,
            "[network]\nchmask_algorithm = \"all_channels\"\nchmask_timeout_ms = 250\n",
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.network.chmask_algorithm, "all_channels");
        assert_eq!(config.network.chmask_timeout_ms, 250);
    }

    #[test]
    fn test_load_yaml_and_json() {
        let dir = tempfile::tempdir().unwrap();

        let yaml = dir.path().join("chmask.yaml");
        std::fs::write(&yaml, "store:\n  backend: memory\n").unwrap();
        assert_eq!(load_config(&yaml).unwrap().store.backend, StoreBackend::Memory);

        let json = dir.path().join("chmask.json");
        std::fs::write(&json, r#"{"network": {"max_uplink_history": 5}}"#).unwrap();
        assert_eq!(load_config(&json).unwrap().network.max_uplink_history, 5);
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chmask.ini");
        std::fs::write(&path, "").unwrap();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(load_config(Path::new("/nonexistent/chmask.toml")).is_err());
    }

    #[test]
    fn test_find_in_dir_order() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_in_dir(dir.path()).is_none());

        std::fs::write(dir.path().join("chmask.json"), "{}").unwrap();
        std::fs::write(dir.path().join("chmask.yaml"), "{}").unwrap();
        assert_eq!(find_in_dir(dir.path()).unwrap(), dir.path().join("chmask.yaml"));
    }

    #[test]
    fn test_write_atomic_replaces_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("chmask.toml");

        write_atomic(&path, "[network]\nchmask_algorithm = \"default\"\n").unwrap();
        write_atomic(&path, "[network]\nchmask_algorithm = \"all_channels\"\n").unwrap();

        assert_eq!(
            load_config(&path).unwrap().network.chmask_algorithm,
            "all_channels"
        );
        let names: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("chmask.toml")]);
    }

    // Only test touching the process-wide override.
    #[test]
    fn test_override_discover_and_save() {
        let dir = tempfile::tempdir().unwrap();
        set_config_dir(dir.path().to_path_buf());

        let config = discover_and_load();
        assert_eq!(config.network.chmask_algorithm, "default");

        let path = update_config(|c| {
            c.network.chmask_algorithm = "all_channels".into();
            c.store.backend = StoreBackend::Sqlite;
        })
        .unwrap();
        assert_eq!(path, dir.path().join("chmask.toml"));

        let reloaded = discover_and_load();
        assert_eq!(reloaded.network.chmask_algorithm, "all_channels");
        assert_eq!(reloaded.store.backend, StoreBackend::Sqlite);

        clear_config_dir();
    }
}
