use {
    anyhow::Result,
    chmask_common::DevEui,
    chmask_store::{DeviceConfig, DeviceConfigStore},
    clap::Subcommand,
};

#[derive(Subcommand)]
pub enum StoreAction {
    /// Set the channel mask a device must use.
    Set {
        #[arg(long)]
        dev_eui: DevEui,
        /// Comma-separated channel indices (e.g. "0,1,2").
        #[arg(long, value_delimiter = ',', required = true)]
        channels: Vec<usize>,
    },
    /// Show the stored configuration of a device.
    Get {
        #[arg(long)]
        dev_eui: DevEui,
    },
    /// Remove the stored configuration of a device.
    Delete {
        #[arg(long)]
        dev_eui: DevEui,
    },
    /// List stored devices.
    List {
        #[arg(long, default_value_t = 100)]
        limit: usize,
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },
    /// Compare the stored mask with the channels a device has enabled.
    Alignment {
        #[arg(long)]
        dev_eui: DevEui,
        #[arg(long, value_delimiter = ',')]
        enabled: Vec<usize>,
    },
}

pub async fn handle_store(action: StoreAction, store: &dyn DeviceConfigStore) -> Result<()> {
    match action {
        StoreAction::Set { dev_eui, channels } => set(store, dev_eui, channels).await,
        StoreAction::Get { dev_eui } => get(store, &dev_eui).await,
        StoreAction::Delete { dev_eui } => {
            store.delete(&dev_eui).await?;
            println!("Deleted {dev_eui}");
            Ok(())
        },
        StoreAction::List { limit, offset } => list(store, limit, offset).await,
        StoreAction::Alignment { dev_eui, enabled } => {
            let alignment = store.alignment(&dev_eui, &enabled).await?;
            let state = if alignment.chmask_config {
                "aligned"
            } else {
                "not aligned"
            };
            println!("{dev_eui}: channel mask {state}");
            Ok(())
        },
    }
}

async fn set(store: &dyn DeviceConfigStore, dev_eui: DevEui, channels: Vec<usize>) -> Result<()> {
    let dc = store.upsert(DeviceConfig::new(dev_eui, Some(channels))).await?;
    let indices = dc
        .chmask_config
        .map(|cm| cm.enabled_uplink_channel_indices)
        .unwrap_or_default();
    println!("{dev_eui}: channels {indices:?}");
    Ok(())
}

async fn get(store: &dyn DeviceConfigStore, dev_eui: &DevEui) -> Result<()> {
    let dc = store.get(dev_eui).await?;
    println!("{}", serde_json::to_string_pretty(&dc)?);
    Ok(())
}

async fn list(store: &dyn DeviceConfigStore, limit: usize, offset: usize) -> Result<()> {
    let total = store.count().await?;
    let items = store.list(limit, offset).await?;
    if items.is_empty() {
        println!("No stored device configurations.");
        return Ok(());
    }
    for item in &items {
        println!("{}  updated_at={}", item.dev_eui, item.updated_at);
    }
    println!("{} of {total}", items.len());
    Ok(())
}
