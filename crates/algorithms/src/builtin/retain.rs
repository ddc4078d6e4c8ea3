use crate::{
    algorithm::{ChannelMaskAlgorithm, DecisionError},
    request::Request,
};

/// Keeps whatever channels the device has enabled today.
pub struct Retain;

impl ChannelMaskAlgorithm for Retain {
    fn id(&self) -> &str {
        "default"
    }

    fn name(&self) -> &str {
        "Default behaviour (do nothing)"
    }

    fn handle(&self, req: &Request) -> Result<Vec<usize>, DecisionError> {
        Ok(req.enabled_channel_indices().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::test_support::{enabled, request};

    #[test]
    fn test_id() {
        assert_eq!("default", Retain.id());
    }

    #[test]
    fn test_handle() {
        let req = request()
            .with_channel(0, enabled())
            .with_channel(1, enabled())
            .with_channel(2, enabled())
            .with_channel(3, Default::default())
            .with_channel(4, Default::default());

        assert_eq!(Retain.handle(&req).unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_handle_nothing_enabled() {
        let req = request().with_channel(7, Default::default());
        assert!(Retain.handle(&req).unwrap().is_empty());
    }
}
