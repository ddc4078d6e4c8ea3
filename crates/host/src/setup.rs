//! Build the host and its store from configuration.

use std::{path::Path, sync::Arc, time::Duration};

use {
    chmask_algorithms::{AlgorithmRegistry, builtin::FixedMask},
    chmask_config::{ChMaskConfig, NetworkConfig, StoreBackend, StoreConfig},
    chmask_store::{DeviceConfigStore, JsonFileStore, MemoryStore, SqliteStore, StoreError},
    tracing::{info, warn},
};

use crate::{dispatch::ChannelMaskHost, service::ChannelMaskService};

/// Built-in algorithms plus the fixed masks declared in `[network]`.
/// Entries that fail registration are logged and left out.
pub fn build_registry(config: &NetworkConfig) -> AlgorithmRegistry {
    info!("Setting up channel mask algorithms");
    let mut registry = AlgorithmRegistry::with_builtin();

    for entry in &config.fixed_masks {
        info!(algorithm_id = %entry.id, "Setting up fixed channel mask");
        let algorithm = FixedMask::new(&entry.id, &entry.name, entry.channels.clone());
        if let Err(e) = registry.register(Arc::new(algorithm)) {
            warn!(algorithm_id = %entry.id, error = %e, "skipping channel mask algorithm");
        }
    }

    if !registry.contains(&config.chmask_algorithm) {
        warn!(
            algorithm_id = %config.chmask_algorithm,
            "configured channel mask algorithm is not registered, devices will keep their current mask"
        );
    }

    registry
}

pub fn build_host(config: &NetworkConfig) -> ChannelMaskHost {
    ChannelMaskHost::new(
        build_registry(config),
        Duration::from_millis(config.chmask_timeout_ms),
    )
}

/// Open the configured device config store. Relative or missing paths
/// resolve under `data_dir`.
pub async fn open_store(
    config: &StoreConfig,
    data_dir: &Path,
) -> Result<Arc<dyn DeviceConfigStore>, StoreError> {
    let path = match (&config.path, config.backend.default_file_name()) {
        (Some(p), _) => Some(data_dir.join(p)),
        (None, Some(name)) => Some(data_dir.join(name)),
        (None, None) => None,
    };

    let store: Arc<dyn DeviceConfigStore> = match (config.backend, path) {
        (StoreBackend::Json, Some(path)) => {
            info!(path = %path.display(), "Opening JSON device config store");
            Arc::new(JsonFileStore::open(path)?)
        },
        (StoreBackend::Sqlite, Some(path)) => {
            info!(path = %path.display(), "Opening SQLite device config store");
            Arc::new(SqliteStore::open(&path).await?)
        },
        _ => {
            info!("Using in-memory device config store");
            Arc::new(MemoryStore::new())
        },
    };
    Ok(store)
}

/// Everything needed to evaluate requests, built from a loaded config.
pub async fn build_service(
    config: &ChMaskConfig,
    data_dir: &Path,
) -> anyhow::Result<ChannelMaskService> {
    let host = build_host(&config.network);
    let store = open_store(&config.store, data_dir).await?;
    Ok(ChannelMaskService::new(host, store, &config.network))
}

#[cfg(test)]
mod tests {
    use {super::*, chmask_config::FixedMaskEntry};

    fn fixed(id: &str, channels: Vec<usize>) -> FixedMaskEntry {
        FixedMaskEntry {
            id: id.into(),
            name: format!("Fixed {id}"),
            channels,
        }
    }

    #[test]
    fn test_registry_includes_fixed_masks() {
        let config = NetworkConfig {
            fixed_masks: vec![fixed("first_eight", (0..8).collect())],
            ..Default::default()
        };
        let registry = build_registry(&config);
        let ids: Vec<String> = registry.list().into_iter().map(|a| a.id).collect();
        assert_eq!(ids, vec!["all_channels", "default", "first_eight"]);
    }

    #[test]
    fn test_bad_entries_are_skipped() {
        let config = NetworkConfig {
            fixed_masks: vec![
                fixed("default", vec![0]),
                fixed("Bad Id", vec![0]),
                fixed("ok", vec![1]),
            ],
            ..Default::default()
        };
        let registry = build_registry(&config);
        assert_eq!(registry.len(), 3);
        assert!(registry.contains("ok"));
        assert_eq!(
            registry.get("default").map(|a| a.name().to_string()),
            Some("Default behaviour (do nothing)".to_string())
        );
    }

    #[tokio::test]
    async fn test_open_store_backends() {
        let dir = tempfile::tempdir().unwrap();

        for backend in [StoreBackend::Memory, StoreBackend::Json, StoreBackend::Sqlite] {
            let config = StoreConfig {
                backend,
                path: None,
            };
            let store = open_store(&config, dir.path()).await.unwrap();
            assert_eq!(store.count().await.unwrap(), 0);
        }

        let config = StoreConfig {
            backend: StoreBackend::Json,
            path: Some("custom/dcs.json".into()),
        };
        let store = open_store(&config, dir.path()).await.unwrap();
        store
            .upsert(chmask_store::DeviceConfig::new(Default::default(), Some(vec![0])))
            .await
            .unwrap();
        assert!(dir.path().join("custom/dcs.json").exists());
    }
}
