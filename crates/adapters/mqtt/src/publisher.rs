//! Command publisher — writes actuation commands to the irrigation topic.

use std::future::Future;

use rumqttc::{AsyncClient, QoS};

use aquagrow_app::ports::CommandPublisher;
use aquagrow_domain::actuation::ActuationCommand;
use aquagrow_domain::error::AquaGrowError;

use crate::error::MqttError;

/// Serialize a command into its wire form, `{"device_id": "...", "action": "1"}`.
///
/// # Errors
///
/// Returns [`MqttError::Encode`] if serialization fails.
pub fn encode_command(command: &ActuationCommand) -> Result<Vec<u8>, MqttError> {
    serde_json::to_vec(&command.payload()).map_err(MqttError::Encode)
}

/// [`CommandPublisher`] backed by a rumqttc client.
///
/// `publish` resolves once the request is queued to the client's event loop;
/// delivery to the broker follows the configured QoS.
#[derive(Clone)]
pub struct MqttCommandPublisher {
    client: AsyncClient,
    topic: String,
    qos: QoS,
}

impl MqttCommandPublisher {
    pub(crate) fn new(client: AsyncClient, topic: String, qos: QoS) -> Self {
        Self { client, topic, qos }
    }

    /// Send a DISCONNECT to the broker.
    ///
    /// # Errors
    ///
    /// Returns [`MqttError::Client`] when the event loop is already gone.
    pub async fn disconnect(&self) -> Result<(), MqttError> {
        self.client.disconnect().await.map_err(MqttError::Client)
    }
}

impl CommandPublisher for MqttCommandPublisher {
    fn publish(
        &self,
        command: &ActuationCommand,
    ) -> impl Future<Output = Result<(), AquaGrowError>> + Send {
        let encoded = encode_command(command);
        let client = self.client.clone();
        let topic = self.topic.clone();
        let qos = self.qos;
        async move {
            let payload = encoded?;
            client
                .publish(topic, qos, false, payload)
                .await
                .map_err(MqttError::Client)?;
            Ok::<(), AquaGrowError>(())
        }
    }
}
