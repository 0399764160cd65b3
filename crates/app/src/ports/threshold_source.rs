//! Threshold source port — the remote configuration service.

use std::future::Future;

use aquagrow_domain::error::AquaGrowError;
use aquagrow_domain::id::DeviceId;
use aquagrow_domain::threshold::ThresholdConfig;

/// Fetches the threshold configuration of a device from its owner.
///
/// Implementations classify failures as
/// [`AquaGrowError::ConfigUnavailable`] (unreachable, non-success status)
/// or [`AquaGrowError::ConfigMalformed`] (unusable body). They do not
/// retry and do not cache; the resolver owns both concerns.
pub trait ThresholdSource {
    /// Fetch the current configuration for `device_id`.
    fn fetch(
        &self,
        device_id: &DeviceId,
    ) -> impl Future<Output = Result<ThresholdConfig, AquaGrowError>> + Send;
}

impl<T: ThresholdSource + Send + Sync> ThresholdSource for std::sync::Arc<T> {
    fn fetch(
        &self,
        device_id: &DeviceId,
    ) -> impl Future<Output = Result<ThresholdConfig, AquaGrowError>> + Send {
        (**self).fetch(device_id)
    }
}
