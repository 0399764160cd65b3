//! Command publisher port — the outbound irrigation channel.

use std::future::Future;

use aquagrow_domain::actuation::ActuationCommand;
use aquagrow_domain::error::AquaGrowError;

/// Hands actuation commands to the transport.
///
/// Delivery is fire-and-forget: success means the command was accepted by
/// the transport, not that the device acted on it. Repeating a command is
/// harmless to the actuator, so implementations need no de-duplication.
pub trait CommandPublisher {
    /// Emit `command` on the outbound channel.
    fn publish(
        &self,
        command: &ActuationCommand,
    ) -> impl Future<Output = Result<(), AquaGrowError>> + Send;
}

impl<T: CommandPublisher + Send + Sync> CommandPublisher for std::sync::Arc<T> {
    fn publish(
        &self,
        command: &ActuationCommand,
    ) -> impl Future<Output = Result<(), AquaGrowError>> + Send {
        (**self).publish(command)
    }
}
