//! MQTT adapter error types.

use aquagrow_domain::error::AquaGrowError;

/// Errors specific to the MQTT adapter.
#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    /// The configured QoS level does not exist.
    #[error("unsupported QoS level {0}")]
    InvalidQos(u8),

    /// The rumqttc client refused the request.
    #[error("MQTT client error")]
    Client(#[source] rumqttc::ClientError),

    /// Failed to serialize an outbound command.
    #[error("failed to encode MQTT payload")]
    Encode(#[source] serde_json::Error),
}

impl MqttError {
    /// Convert into a [`AquaGrowError::PublishFailure`] for propagation
    /// across port boundaries.
    pub fn into_domain(self) -> AquaGrowError {
        AquaGrowError::PublishFailure(Box::new(self))
    }
}

impl From<MqttError> for AquaGrowError {
    fn from(err: MqttError) -> Self {
        err.into_domain()
    }
}
