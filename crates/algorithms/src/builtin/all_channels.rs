use crate::{
    algorithm::{ChannelMaskAlgorithm, DecisionError},
    request::Request,
};

/// Enables every channel configured for the device, ignoring history.
pub struct AllChannels;

impl ChannelMaskAlgorithm for AllChannels {
    fn id(&self) -> &str {
        "all_channels"
    }

    fn name(&self) -> &str {
        "Enable all configured channels"
    }

    fn handle(&self, req: &Request) -> Result<Vec<usize>, DecisionError> {
        Ok(req.available_channel_indices())
    }
}
