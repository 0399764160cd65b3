//! Actuation publisher — builds commands and hands them to the transport.

use std::time::Duration;

use aquagrow_domain::actuation::{Action, ActuationCommand, CommandOrigin};
use aquagrow_domain::error::AquaGrowError;
use aquagrow_domain::id::DeviceId;

use crate::ports::CommandPublisher;

/// Default bound on handing one command to the transport.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(2);

/// Emits actuation commands with a bounded send time.
///
/// No local de-duplication: identical consecutive commands are harmless to
/// the actuator. A failed or timed-out send is logged and reported to the
/// caller; it is never queued for retry.
pub struct ActuationPublisher<P> {
    sink: P,
    send_timeout: Duration,
}

impl<P: CommandPublisher> ActuationPublisher<P> {
    /// Create a publisher writing to `sink`.
    pub fn new(sink: P, send_timeout: Duration) -> Self {
        Self { sink, send_timeout }
    }

    /// Publish `action` for `device_id`.
    ///
    /// # Errors
    ///
    /// Returns [`AquaGrowError::PublishFailure`] if the transport rejects the
    /// command or does not accept it within the send timeout.
    pub async fn publish(
        &self,
        device_id: DeviceId,
        action: Action,
        origin: CommandOrigin,
    ) -> Result<ActuationCommand, AquaGrowError> {
        let command = ActuationCommand::new(device_id, action, origin);

        let result = match tokio::time::timeout(self.send_timeout, self.sink.publish(&command))
            .await
        {
            Ok(result) => result,
            Err(elapsed) => Err(AquaGrowError::PublishFailure(Box::new(elapsed))),
        };

        match result {
            Ok(()) => {
                tracing::info!(
                    device_id = %command.device_id,
                    action = %command.action,
                    origin = %command.origin,
                    "actuation command published"
                );
                Ok(command)
            }
            Err(err) => {
                tracing::warn!(
                    device_id = %command.device_id,
                    action = %command.action,
                    origin = %command.origin,
                    error = %err,
                    "actuation command dropped"
                );
                Err(err)
            }
        }
    }
}
