use {
    serde::{Deserialize, Serialize},
    thiserror::Error,
};

use crate::request::Request;

/// A channel-mask selection algorithm.
///
/// Implementations must be pure: the same request always yields the same
/// indices, nothing is retained between calls, and `handle` returns without
/// blocking on anything but its own computation. Hosts may call `handle`
/// concurrently for different devices.
pub trait ChannelMaskAlgorithm: Send + Sync {
    /// Stable identifier (e.g. "default"). Lowercase letters, digits and `_`.
    fn id(&self) -> &str;

    /// Human-readable name.
    fn name(&self) -> &str;

    /// Channel indices the device should enable. Every index must be a key
    /// of `req.uplink_channels`; an empty list disables all channels.
    fn handle(&self, req: &Request) -> Result<Vec<usize>, DecisionError>;

    fn identify(&self) -> AlgorithmInfo {
        AlgorithmInfo {
            id: self.id().to_string(),
            name: self.name().to_string(),
        }
    }
}

/// Identity of a registered algorithm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlgorithmInfo {
    pub id: String,
    pub name: String,
}

/// An algorithm could not produce a channel set for a well-formed request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct DecisionError(String);

impl DecisionError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }

    pub fn reason(&self) -> &str {
        &self.0
    }
}

/// Whether `id` is a non-empty `[a-z0-9_]+` token.
pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_ids() {
        assert!(is_valid_id("default"));
        assert!(is_valid_id("example_id"));
        assert!(is_valid_id("snr_v2"));
    }

    #[test]
    fn test_invalid_ids() {
        assert!(!is_valid_id(""));
        assert!(!is_valid_id("Default"));
        assert!(!is_valid_id("with-dash"));
        assert!(!is_valid_id("with space"));
        assert!(!is_valid_id("ünïcode"));
    }
}
