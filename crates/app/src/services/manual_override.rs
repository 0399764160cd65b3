//! Manual override — operator-requested actuation, bypassing the policy.

use std::sync::Arc;

use aquagrow_domain::actuation::{Action, ActuationCommand, CommandOrigin, RequestedAction};
use aquagrow_domain::error::AquaGrowError;
use aquagrow_domain::id::DeviceId;

use crate::ports::CommandPublisher;
use crate::services::actuation_publisher::ActuationPublisher;

/// Turns an operator request straight into a published command.
///
/// Cache, resolver and policy are not involved, and the ingestion loop's
/// per-device "last decided action" is left untouched: the next automatic
/// decision for the device is computed as if the override never happened.
pub struct ManualOverride<P> {
    publisher: Arc<ActuationPublisher<P>>,
}

impl<P: CommandPublisher> ManualOverride<P> {
    /// Create an override service sharing `publisher` with the ingestion loop.
    pub fn new(publisher: Arc<ActuationPublisher<P>>) -> Self {
        Self { publisher }
    }

    /// Validate the request and publish the command.
    ///
    /// Returns once the command has been handed to the transport.
    ///
    /// # Errors
    ///
    /// Returns [`AquaGrowError::Validation`] for a blank device id or an
    /// unknown action, or [`AquaGrowError::PublishFailure`] from the
    /// publisher.
    #[tracing::instrument(skip(self))]
    pub async fn request(
        &self,
        device_id: &str,
        requested: RequestedAction,
    ) -> Result<ActuationCommand, AquaGrowError> {
        let device_id = DeviceId::new(device_id)?;
        let action = Action::try_from(requested)?;
        self.publisher
            .publish(device_id, action, CommandOrigin::Manual)
            .await
    }
}
