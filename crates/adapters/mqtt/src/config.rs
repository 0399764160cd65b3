//! MQTT transport configuration.

use std::time::Duration;

use rumqttc::{MqttOptions, QoS};
use serde::Deserialize;

use crate::error::MqttError;

/// Configuration for the broker connection and the two topics.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    /// MQTT broker hostname or IP address.
    pub broker_host: String,
    /// MQTT broker port.
    pub broker_port: u16,
    /// MQTT client identifier. A unique `aquagrow-<uuid>` id is generated
    /// when unset.
    pub client_id: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Topic the field devices publish telemetry on.
    pub monitoring_topic: String,
    /// Topic actuation commands are published on.
    pub irrigation_topic: String,
    /// Keep-alive interval in seconds.
    pub keep_alive_secs: u64,
    /// QoS level (0, 1 or 2) for both the subscription and the commands.
    pub qos: u8,
    /// Pause after a connection error before polling again, in seconds.
    pub reconnect_backoff_secs: u64,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker_host: "localhost".to_string(),
            broker_port: 1883,
            client_id: None,
            username: None,
            password: None,
            monitoring_topic: "farm/sensor".to_string(),
            irrigation_topic: "farm/irrigate".to_string(),
            keep_alive_secs: 30,
            qos: 1,
            reconnect_backoff_secs: 5,
        }
    }
}

impl MqttConfig {
    /// The configured QoS level.
    ///
    /// # Errors
    ///
    /// Returns [`MqttError::InvalidQos`] for anything outside `0..=2`.
    pub fn qos(&self) -> Result<QoS, MqttError> {
        match self.qos {
            0 => Ok(QoS::AtMostOnce),
            1 => Ok(QoS::AtLeastOnce),
            2 => Ok(QoS::ExactlyOnce),
            other => Err(MqttError::InvalidQos(other)),
        }
    }

    #[must_use]
    pub fn reconnect_backoff(&self) -> Duration {
        Duration::from_secs(self.reconnect_backoff_secs)
    }

    /// The client id to present to the broker.
    #[must_use]
    pub fn effective_client_id(&self) -> String {
        self.client_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| format!("aquagrow-{}", uuid::Uuid::new_v4()))
    }

    /// Build the rumqttc session options.
    #[must_use]
    pub fn options(&self) -> MqttOptions {
        let mut options = MqttOptions::new(
            self.effective_client_id(),
            self.broker_host.clone(),
            self.broker_port,
        );
        options.set_keep_alive(Duration::from_secs(self.keep_alive_secs.max(5)));
        if let (Some(username), Some(password)) = (&self.username, &self.password) {
            options.set_credentials(username, password);
        }
        options
    }
}
