use crate::{
    algorithm::{ChannelMaskAlgorithm, DecisionError},
    request::Request,
};

/// Always answers with the same channel set, whatever the request holds.
///
/// The channels are not checked against the request here; indices missing
/// from a device's plan are caught by the host.
#[derive(Debug, Clone)]
pub struct FixedMask {
    id: String,
    name: String,
    channels: Vec<usize>,
}

impl FixedMask {
    pub fn new(id: impl Into<String>, name: impl Into<String>, channels: Vec<usize>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            channels,
        }
    }

    pub fn channels(&self) -> &[usize] {
        &self.channels
    }
}

impl ChannelMaskAlgorithm for FixedMask {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn handle(&self, _req: &Request) -> Result<Vec<usize>, DecisionError> {
        Ok(self.channels.clone())
    }
}
