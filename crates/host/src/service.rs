use std::sync::Arc;

use {
    chmask_algorithms::{ChannelMask, Request},
    chmask_config::NetworkConfig,
    chmask_store::DeviceConfigStore,
    tracing::{debug, warn},
};

use crate::dispatch::{ChannelMaskHost, DecisionSource, Outcome};

/// Per-device channel-mask evaluation: stored overrides first, then the
/// selected algorithm, with history trimmed to the configured length.
pub struct ChannelMaskService {
    host: ChannelMaskHost,
    store: Arc<dyn DeviceConfigStore>,
    default_algorithm: String,
    max_uplink_history: usize,
}

impl ChannelMaskService {
    pub fn new(
        host: ChannelMaskHost,
        store: Arc<dyn DeviceConfigStore>,
        network: &NetworkConfig,
    ) -> Self {
        Self {
            host,
            store,
            default_algorithm: network.chmask_algorithm.clone(),
            max_uplink_history: network.max_uplink_history,
        }
    }

    pub fn host(&self) -> &ChannelMaskHost {
        &self.host
    }

    pub fn store(&self) -> &dyn DeviceConfigStore {
        self.store.as_ref()
    }

    pub fn default_algorithm(&self) -> &str {
        &self.default_algorithm
    }

    /// Channels that may be enabled for this device.
    pub fn available_uplink_channels(&self, req: &Request) -> Vec<usize> {
        req.available_channel_indices()
    }

    /// Decide the channel mask for one device. `algorithm_id` overrides the
    /// configured algorithm.
    pub async fn evaluate(&self, algorithm_id: Option<&str>, mut req: Request) -> Outcome {
        req.truncate_history(self.max_uplink_history);

        if let Some(mask) = self.stored_mask(&req).await {
            debug!(dev_eui = %req.dev_eui, "using channel mask from device config store");
            return Outcome {
                dev_eui: req.dev_eui,
                mask,
                source: DecisionSource::ConfigStore,
            };
        }

        let algorithm_id = algorithm_id.unwrap_or(&self.default_algorithm);
        self.host.handle(algorithm_id, Arc::new(req)).await
    }

    /// Evaluate many devices concurrently. Results are in input order.
    pub async fn evaluate_many(&self, jobs: Vec<(Option<String>, Request)>) -> Vec<Outcome> {
        futures::future::join_all(
            jobs.into_iter()
                .map(|(id, req)| async move { self.evaluate(id.as_deref(), req).await }),
        )
        .await
    }

    /// A stored override that fits the request's channel plan.
    async fn stored_mask(&self, req: &Request) -> Option<ChannelMask> {
        let config = match self.store.find(&req.dev_eui).await {
            Ok(config) => config?,
            Err(e) => {
                warn!(dev_eui = %req.dev_eui, error = %e, "reading device config store failed");
                return None;
            },
        };
        let indices = config.chmask_config?.enabled_uplink_channel_indices;

        if let Some(missing) = indices.iter().find(|i| !req.has_channel(**i)) {
            warn!(
                dev_eui = %req.dev_eui,
                channel = missing,
                "stored channel mask names a channel the device does not have, ignoring it"
            );
            return None;
        }
        Some(indices.into())
    }
}
