use std::{sync::Arc, time::Duration};

use {
    chmask_algorithms::{AlgorithmInfo, AlgorithmRegistry, ChannelMask, Request},
    chmask_common::DevEui,
    serde::Serialize,
    tracing::{debug, warn},
};

use crate::{error::HostError, validate::check_decision};

/// Where the mask in an [`Outcome`] came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecisionSource {
    /// The named algorithm answered and its answer passed validation.
    Algorithm { id: String },
    /// An operator override from the device config store.
    ConfigStore,
    /// Evaluation failed; the device keeps its current mask.
    Fallback { reason: String },
}

/// The channel mask to apply to one device.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
    pub dev_eui: DevEui,
    pub mask: ChannelMask,
    pub source: DecisionSource,
}

impl Outcome {
    pub fn is_fallback(&self) -> bool {
        matches!(self.source, DecisionSource::Fallback { .. })
    }
}

/// Runs registered algorithms against requests.
pub struct ChannelMaskHost {
    registry: Arc<AlgorithmRegistry>,
    timeout: Duration,
}

impl ChannelMaskHost {
    pub fn new(registry: AlgorithmRegistry, timeout: Duration) -> Self {
        Self {
            registry: Arc::new(registry),
            timeout,
        }
    }

    pub fn registry(&self) -> &AlgorithmRegistry {
        &self.registry
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Identity of every registered algorithm, ordered by id.
    pub fn algorithms(&self) -> Vec<AlgorithmInfo> {
        self.registry.list()
    }

    /// Run one algorithm and validate its answer.
    ///
    /// The algorithm runs on the blocking pool. Failures, panics and
    /// overrunning the time budget are reported as [`HostError::Decision`].
    pub async fn decide(
        &self,
        algorithm_id: &str,
        req: Arc<Request>,
    ) -> Result<ChannelMask, HostError> {
        let algorithm = self
            .registry
            .get(algorithm_id)
            .ok_or_else(|| HostError::UnknownAlgorithm(algorithm_id.to_string()))?;

        let task_req = Arc::clone(&req);
        let task = tokio::task::spawn_blocking(move || algorithm.handle(&task_req));

        let indices = match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(Ok(indices))) => indices,
            Ok(Ok(Err(e))) => return Err(HostError::decision(algorithm_id, e.reason())),
            Ok(Err(e)) => {
                return Err(HostError::decision(
                    algorithm_id,
                    format!("algorithm task failed: {e}"),
                ));
            },
            Err(_) => {
                return Err(HostError::decision(
                    algorithm_id,
                    format!("no answer within {}ms", self.timeout.as_millis()),
                ));
            },
        };

        debug!(algorithm_id, dev_eui = %req.dev_eui, ?indices, "algorithm answered");
        check_decision(algorithm_id, &req, indices)
    }

    /// Like [`decide`](Self::decide), but never fails: on any error the
    /// device keeps the channels it currently has enabled.
    pub async fn handle(&self, algorithm_id: &str, req: Arc<Request>) -> Outcome {
        match self.decide(algorithm_id, Arc::clone(&req)).await {
            Ok(mask) => Outcome {
                dev_eui: req.dev_eui,
                mask,
                source: DecisionSource::Algorithm {
                    id: algorithm_id.to_string(),
                },
            },
            Err(e) => {
                warn!(
                    algorithm_id,
                    dev_eui = %req.dev_eui,
                    error = %e,
                    "ChannelMask algorithm failed, keeping current channel mask"
                );
                Outcome {
                    dev_eui: req.dev_eui,
                    mask: req.enabled_channel_indices(),
                    source: DecisionSource::Fallback {
                        reason: e.to_string(),
                    },
                }
            },
        }
    }

    /// Evaluate many devices concurrently. Results are in input order.
    pub async fn handle_many(&self, jobs: Vec<(String, Arc<Request>)>) -> Vec<Outcome> {
        futures::future::join_all(
            jobs.into_iter()
                .map(|(id, req)| async move { self.handle(&id, req).await }),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        chmask_algorithms::{ChannelMaskAlgorithm, DecisionError},
        chmask_common::{CommonName, MacVersion, Revision, UplinkChannel},
    };

    struct Failing;

    impl ChannelMaskAlgorithm for Failing {
        fn id(&self) -> &str {
            "failing"
        }

        fn name(&self) -> &str {
            "Always fails"
        }

        fn handle(&self, _req: &Request) -> Result<Vec<usize>, DecisionError> {
            Err(DecisionError::new("not enough history"))
        }
    }

    struct Slow;

    impl ChannelMaskAlgorithm for Slow {
        fn id(&self) -> &str {
            "slow"
        }

        fn name(&self) -> &str {
            "Too slow"
        }

        fn handle(&self, req: &Request) -> Result<Vec<usize>, DecisionError> {
            std::thread::sleep(Duration::from_millis(300));
            Ok(req.available_channel_indices())
        }
    }

    struct Panicking;

    impl ChannelMaskAlgorithm for Panicking {
        fn id(&self) -> &str {
            "panicking"
        }

        fn name(&self) -> &str {
            "Panics"
        }

        fn handle(&self, _req: &Request) -> Result<Vec<usize>, DecisionError> {
            panic!("boom")
        }
    }

    fn host() -> ChannelMaskHost {
        let mut registry = AlgorithmRegistry::with_builtin();
        registry.register(Arc::new(Failing)).unwrap();
        registry.register(Arc::new(Slow)).unwrap();
        registry.register(Arc::new(Panicking)).unwrap();
        ChannelMaskHost::new(registry, Duration::from_millis(50))
    }

    fn request(last: u8) -> Arc<Request> {
        let ch = |enabled| UplinkChannel {
            frequency: 868_100_000,
            max_dr: 5,
            enabled,
            ..Default::default()
        };
        Arc::new(
            Request::new(
                "eu868",
                CommonName::EU868,
                DevEui::from_be_bytes([1, 2, 3, 4, 5, 6, 7, last]),
                MacVersion::LORAWAN_1_0_4,
                Revision::RP002_1_0_3,
            )
            .with_channel(0, ch(true))
            .with_channel(1, ch(false))
            .with_channel(2, ch(true)),
        )
    }

    #[tokio::test]
    async fn test_decide_builtin() {
        let host = host();
        let mask = host.decide("all_channels", request(1)).await.unwrap();
        assert_eq!(mask.to_vec(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_unknown_algorithm_falls_back() {
        let host = host();
        assert_eq!(
            host.decide("nope", request(1)).await,
            Err(HostError::UnknownAlgorithm("nope".into()))
        );

        let out = host.handle("nope", request(1)).await;
        assert!(out.is_fallback());
        assert_eq!(out.mask.to_vec(), vec![0, 2]);
    }

    #[tokio::test]
    async fn test_failures_fall_back() {
        let host = host();
        for id in ["failing", "slow", "panicking"] {
            assert!(
                matches!(
                    host.decide(id, request(1)).await,
                    Err(HostError::Decision { .. })
                ),
                "{id}"
            );
            let out = host.handle(id, request(1)).await;
            assert!(out.is_fallback(), "{id}");
            assert_eq!(out.mask.to_vec(), vec![0, 2]);
        }
    }

    #[tokio::test]
    async fn test_handle_many_keeps_order() {
        let host = host();
        let jobs = (1..=6)
            .map(|last| {
                let id = if last % 2 == 0 { "all_channels" } else { "default" };
                (id.to_string(), request(last))
            })
            .collect();

        let outcomes = host.handle_many(jobs).await;
        assert_eq!(outcomes.len(), 6);
        for (i, out) in outcomes.iter().enumerate() {
            let last = i as u8 + 1;
            assert_eq!(out.dev_eui, DevEui::from_be_bytes([1, 2, 3, 4, 5, 6, 7, last]));
            let expected = if last % 2 == 0 { vec![0, 1, 2] } else { vec![0, 2] };
            assert_eq!(out.mask.to_vec(), expected);
            assert!(!out.is_fallback());
        }
    }

    #[test]
    fn test_outcome_json() {
        let out = Outcome {
            dev_eui: DevEui::from_be_bytes([1, 2, 3, 4, 5, 6, 7, 8]),
            mask: ChannelMask::from(vec![1, 0]),
            source: DecisionSource::Algorithm { id: "default".into() },
        };
        assert_eq!(
            serde_json::to_value(&out).unwrap(),
            serde_json::json!({
                "devEui": "0102030405060708",
                "mask": [0, 1],
                "source": { "kind": "algorithm", "id": "default" }
            })
        );
    }
}
