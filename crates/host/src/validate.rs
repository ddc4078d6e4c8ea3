use {
    chmask_algorithms::{ChannelMask, Request},
    tracing::debug,
};

use crate::error::HostError;

/// Check an algorithm's answer against the request it was given.
///
/// Every index must name a channel of the request. Duplicates are folded
/// and the result is ordered ascending.
pub fn check_decision(
    algorithm_id: &str,
    req: &Request,
    indices: Vec<usize>,
) -> Result<ChannelMask, HostError> {
    if let Some(bad) = indices.iter().find(|i| !req.has_channel(**i)) {
        return Err(HostError::violation(algorithm_id, bad));
    }

    let returned = indices.len();
    let mask = ChannelMask::from(indices);
    if mask.len() != returned {
        debug!(
            algorithm_id,
            dev_eui = %req.dev_eui,
            returned,
            distinct = mask.len(),
            "folded duplicate channel indices"
        );
    }
    Ok(mask)
}
