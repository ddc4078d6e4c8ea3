use thiserror::Error;

/// Why a channel-mask evaluation did not produce an algorithm's answer.
///
/// None of these are fatal: the host keeps the device's current mask.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// A required field is missing or malformed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("no channel mask algorithm registered with id {0:?}")]
    UnknownAlgorithm(String),

    /// The algorithm failed, panicked, or overran its time budget.
    #[error("algorithm {algorithm_id:?} failed: {reason}")]
    Decision { algorithm_id: String, reason: String },

    /// The algorithm returned something that is not a channel of the request.
    #[error("algorithm {algorithm_id:?} returned {value}, which is not a channel of the request")]
    ContractViolation { algorithm_id: String, value: String },
}

impl HostError {
    pub(crate) fn decision(algorithm_id: &str, reason: impl Into<String>) -> Self {
        Self::Decision {
            algorithm_id: algorithm_id.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn violation(algorithm_id: &str, value: impl ToString) -> Self {
        Self::ContractViolation {
            algorithm_id: algorithm_id.to_string(),
            value: value.to_string(),
        }
    }
}
