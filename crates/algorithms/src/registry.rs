use std::{collections::HashMap, sync::Arc};

use {thiserror::Error, tracing::debug};

use crate::{
    algorithm::{AlgorithmInfo, ChannelMaskAlgorithm, is_valid_id},
    builtin,
};

/// Reasons an algorithm is refused by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("algorithm id {0:?} is not a [a-z0-9_]+ token")]
    InvalidId(String),

    #[error("algorithm {0:?} has an empty name")]
    EmptyName(String),

    #[error("algorithm id {0:?} is already registered")]
    Duplicate(String),
}

/// Registry of channel-mask algorithms keyed by id.
pub struct AlgorithmRegistry {
    algorithms: HashMap<String, Arc<dyn ChannelMaskAlgorithm>>,
}

impl Default for AlgorithmRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AlgorithmRegistry {
    pub fn new() -> Self {
        Self {
            algorithms: HashMap::new(),
        }
    }

    /// Registry holding the algorithms that ship with the host.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        for algorithm in builtin::all() {
            // Built-in identities are static and distinct.
            if let Err(e) = registry.register(algorithm) {
                debug!(error = %e, "skipping built-in algorithm");
            }
        }
        registry
    }

    /// Add an algorithm after checking its identity.
    pub fn register(&mut self, algorithm: Arc<dyn ChannelMaskAlgorithm>) -> Result<(), RegistryError> {
        let AlgorithmInfo { id, name } = algorithm.identify();
        if !is_valid_id(&id) {
            return Err(RegistryError::InvalidId(id));
        }
        if name.trim().is_empty() {
            return Err(RegistryError::EmptyName(id));
        }
        if self.algorithms.contains_key(&id) {
            return Err(RegistryError::Duplicate(id));
        }
        debug!(algorithm_id = %id, algorithm_name = %name, "registered channel mask algorithm");
        self.algorithms.insert(id, algorithm);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn ChannelMaskAlgorithm>> {
        self.algorithms.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.algorithms.contains_key(id)
    }

    /// Identities of all registered algorithms, sorted by id.
    pub fn list(&self) -> Vec<AlgorithmInfo> {
        let mut out: Vec<AlgorithmInfo> = self.algorithms.values().map(|a| a.identify()).collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }

    pub fn len(&self) -> usize {
        self.algorithms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.algorithms.is_empty()
    }
}
