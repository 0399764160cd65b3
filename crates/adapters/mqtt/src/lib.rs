//! # aquagrow-adapter-mqtt
//!
//! MQTT adapter — the field-device transport.
//!
//! ## Responsibilities
//! - Connect to the broker (credentials, keep-alive, unique client id)
//! - Subscribe to the monitoring topic and push each payload onto the
//!   ingestion queue
//! - Publish actuation commands on the irrigation topic
//!   (implements [`CommandPublisher`](aquagrow_app::ports::CommandPublisher))
//!
//! ## Dependency rule
//! Same as other adapters: depends on `aquagrow-app` and `aquagrow-domain`.

pub mod config;
pub mod error;
pub mod publisher;
pub mod subscriber;

pub use config::MqttConfig;
pub use error::MqttError;
pub use publisher::MqttCommandPublisher;
pub use subscriber::TelemetrySubscriber;

use rumqttc::AsyncClient;

/// Capacity of the request channel between the client handles and the event
/// loop.
const REQUEST_CHANNEL_CAPACITY: usize = 32;

/// Build the client handles for `config`.
///
/// No network traffic happens until [`TelemetrySubscriber::run`] starts
/// polling; the publisher can be used as soon as it does.
///
/// # Errors
///
/// Returns [`MqttError::InvalidQos`] if the configured QoS is not 0, 1 or 2.
pub fn connect(
    config: &MqttConfig,
) -> Result<(MqttCommandPublisher, TelemetrySubscriber), MqttError> {
    let qos = config.qos()?;
    let (client, event_loop) = AsyncClient::new(config.options(), REQUEST_CHANNEL_CAPACITY);

    tracing::info!(
        broker = %config.broker_host,
        port = config.broker_port,
        monitoring_topic = %config.monitoring_topic,
        irrigation_topic = %config.irrigation_topic,
        "MQTT client configured"
    );

    let publisher = MqttCommandPublisher::new(client.clone(), config.irrigation_topic.clone(), qos);
    let subscriber = TelemetrySubscriber::new(
        client,
        event_loop,
        config.monitoring_topic.clone(),
        qos,
        config.reconnect_backoff(),
    );
    Ok((publisher, subscriber))
}
