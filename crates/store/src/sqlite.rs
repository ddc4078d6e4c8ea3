use std::path::Path;

use {
    async_trait::async_trait,
    chmask_common::DevEui,
    sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
    tracing::info,
};

use crate::{
    entry::{ChMaskOverride, DeviceConfig, DeviceConfigListItem, now_ms},
    error::StoreError,
    store::DeviceConfigStore,
};

/// SQLite-backed store.
pub struct SqliteStore {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct DeviceConfigRow {
    dev_eui: String,
    created_at: i64,
    updated_at: i64,
    chmask_config: Option<String>,
}

#[derive(sqlx::FromRow)]
struct ListRow {
    dev_eui: String,
    created_at: i64,
    updated_at: i64,
}

fn parse_eui(raw: &str) -> Result<DevEui, StoreError> {
    raw.parse()
        .map_err(|e| StoreError::Corrupt(format!("dev_eui {raw:?}: {e}")))
}

impl TryFrom<DeviceConfigRow> for DeviceConfig {
    type Error = StoreError;

    fn try_from(r: DeviceConfigRow) -> Result<Self, Self::Error> {
        let chmask_config = r
            .chmask_config
            .map(|raw| serde_json::from_str::<Vec<usize>>(&raw))
            .transpose()?
            .map(|enabled_uplink_channel_indices| ChMaskOverride {
                enabled_uplink_channel_indices,
            });

        Ok(Self {
            dev_eui: parse_eui(&r.dev_eui)?,
            created_at: r.created_at as u64,
            updated_at: r.updated_at as u64,
            chmask_config,
        })
    }
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if needed) the database file and its table.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        Self::init(&pool).await?;
        Ok(Self::new(pool))
    }

    /// Create the `device_config_store` table if it doesn't exist.
    pub async fn init(pool: &SqlitePool) -> Result<(), StoreError> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS device_config_store (
                dev_eui       TEXT PRIMARY KEY,
                created_at    INTEGER NOT NULL,
                updated_at    INTEGER NOT NULL,
                chmask_config TEXT
            )"#,
        )
        .execute(pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl DeviceConfigStore for SqliteStore {
    async fn upsert(&self, mut config: DeviceConfig) -> Result<DeviceConfig, StoreError> {
        config.validate()?;

        let now = now_ms() as i64;
        let chmask_config = config
            .chmask_config
            .as_ref()
            .map(|cm| serde_json::to_string(&cm.enabled_uplink_channel_indices))
            .transpose()?;

        sqlx::query(
            r#"INSERT INTO device_config_store (dev_eui, created_at, updated_at, chmask_config)
               VALUES (?, ?, ?, ?)
               ON CONFLICT(dev_eui) DO UPDATE SET
                 updated_at = excluded.updated_at,
                 chmask_config = excluded.chmask_config"#,
        )
        .bind(config.dev_eui.to_string())
        .bind(now)
        .bind(now)
        .bind(&chmask_config)
        .execute(&self.pool)
        .await?;

        info!(dev_eui = %config.dev_eui, "Device config store set");
        self.get(&config.dev_eui).await
    }

    async fn get(&self, dev_eui: &DevEui) -> Result<DeviceConfig, StoreError> {
        sqlx::query_as::<_, DeviceConfigRow>(
            "SELECT dev_eui, created_at, updated_at, chmask_config FROM device_config_store WHERE dev_eui = ?",
        )
        .bind(dev_eui.to_string())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(dev_eui.to_string()))?
        .try_into()
    }

    async fn delete(&self, dev_eui: &DevEui) -> Result<(), StoreError> {
        let res = sqlx::query("DELETE FROM device_config_store WHERE dev_eui = ?")
            .bind(dev_eui.to_string())
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(StoreError::NotFound(dev_eui.to_string()));
        }
        info!(dev_eui = %dev_eui, "Device config store deleted");
        Ok(())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM device_config_store")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }

    async fn list(
        &self,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<DeviceConfigListItem>, StoreError> {
        sqlx::query_as::<_, ListRow>(
            "SELECT dev_eui, created_at, updated_at FROM device_config_store ORDER BY dev_eui LIMIT ? OFFSET ?",
        )
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|r| {
            Ok(DeviceConfigListItem {
                dev_eui: parse_eui(&r.dev_eui)?,
                created_at: r.created_at as u64,
                updated_at: r.updated_at as u64,
            })
        })
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn sqlite_pool() -> SqlitePool {
        // One connection, or every connection gets its own in-memory database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        SqliteStore::init(&pool).await.unwrap();
        pool
    }

    fn eui(last: u8) -> DevEui {
        DevEui::from_be_bytes([1, 2, 3, 4, 5, 6, 7, last])
    }

    #[tokio::test]
    async fn test_sqlite_device_config_store() {
        let store = SqliteStore::new(sqlite_pool().await);
        let dev_eui = eui(8);

        assert!(store.upsert(DeviceConfig::new(dev_eui, None)).await.is_err());
        assert!(matches!(
            store.get(&dev_eui).await,
            Err(StoreError::NotFound(_))
        ));

        let created = store
            .upsert(DeviceConfig::new(dev_eui, Some(vec![2, 1, 0, 2])))
            .await
            .unwrap();
        assert_eq!(
            created
                .chmask_config
                .as_ref()
                .unwrap()
                .enabled_uplink_channel_indices,
            vec![0, 1, 2]
        );
        assert!(store.alignment(&dev_eui, &[0, 1, 2]).await.unwrap().chmask_config);

        let updated = store
            .upsert(DeviceConfig::new(dev_eui, Some(vec![0, 1, 2, 3])))
            .await
            .unwrap();
        assert_eq!(updated.created_at, created.created_at);
        assert!(!store.alignment(&dev_eui, &[0, 1, 2]).await.unwrap().chmask_config);

        store.delete(&dev_eui).await.unwrap();
        assert!(store.delete(&dev_eui).await.is_err());
    }

    #[tokio::test]
    async fn test_sqlite_count_and_list() {
        let store = SqliteStore::new(sqlite_pool().await);
        for last in [9, 3, 5] {
            store
                .upsert(DeviceConfig::new(eui(last), Some(vec![0])))
                .await
                .unwrap();
        }

        assert_eq!(store.count().await.unwrap(), 3);
        let items = store.list(2, 1).await.unwrap();
        let euis: Vec<DevEui> = items.iter().map(|i| i.dev_eui).collect();
        assert_eq!(euis, vec![eui(5), eui(9)]);
    }

    #[tokio::test]
    async fn test_sqlite_open_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dcs.db");
        {
            let store = SqliteStore::open(&path).await.unwrap();
            store
                .upsert(DeviceConfig::new(eui(1), Some(vec![4])))
                .await
                .unwrap();
        }
        let store = SqliteStore::open(&path).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
    }
}
