//! Telemetry subscriber — drives the rumqttc event loop and feeds the
//! ingestion queue.

use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, Outgoing, Packet, QoS};
use tokio::sync::{mpsc, watch};

use aquagrow_app::ingestion::InboundMessage;

/// Owns the MQTT event loop.
///
/// Every `ConnAck` (first connect and each reconnect) re-issues the
/// subscription to the monitoring topic, so a broker restart does not
/// silently stop telemetry. Connection errors are logged and retried after
/// a backoff; they never end the task.
pub struct TelemetrySubscriber {
    client: AsyncClient,
    event_loop: EventLoop,
    topic: String,
    qos: QoS,
    backoff: Duration,
}

impl TelemetrySubscriber {
    pub(crate) fn new(
        client: AsyncClient,
        event_loop: EventLoop,
        topic: String,
        qos: QoS,
        backoff: Duration,
    ) -> Self {
        Self {
            client,
            event_loop,
            topic,
            qos,
            backoff,
        }
    }

    /// Poll the broker until a disconnect has been sent or `shutdown` flips
    /// to `true`. Telemetry arriving after the ingestion loop has stopped is
    /// dropped.
    ///
    /// A full queue makes this task wait, which stops reading from the
    /// socket until the loop catches up.
    pub async fn run(
        mut self,
        inbox: mpsc::Sender<InboundMessage>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        tracing::info!(topic = %self.topic, "telemetry subscriber started");
        loop {
            let event = tokio::select! {
                biased;
                _ = shutdown.wait_for(|stop| *stop) => break,
                event = self.event_loop.poll() => event,
            };

            match event {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    tracing::info!(topic = %self.topic, "connected to broker, subscribing");
                    if let Err(err) = self.client.try_subscribe(self.topic.as_str(), self.qos) {
                        tracing::error!(error = %err, "failed to queue subscription");
                    }
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    tracing::debug!(
                        topic = %publish.topic,
                        bytes = publish.payload.len(),
                        "telemetry received"
                    );
                    let message = InboundMessage::new(publish.payload.to_vec());
                    if inbox.send(message).await.is_err() {
                        tracing::debug!("ingestion stopped, telemetry dropped");
                    }
                }
                Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                    tracing::info!("disconnect sent to broker");
                    break;
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::error!(error = %err, backoff = ?self.backoff, "MQTT connection error");
                    tokio::select! {
                        _ = shutdown.wait_for(|stop| *stop) => break,
                        () = tokio::time::sleep(self.backoff) => {}
                    }
                }
            }
        }
        tracing::info!("telemetry subscriber stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    use crate::{MqttCommandPublisher, MqttConfig, connect};

    const CONNECT: u8 = 1;
    const SUBSCRIBE: u8 = 8;
    const DISCONNECT: u8 = 14;
    const CONNACK: [u8; 4] = [0x20, 0x02, 0x00, 0x00];
    const WAIT: Duration = Duration::from_secs(5);

    /// Minimal broker side of one session: reads whole packets and writes
    /// raw bytes.
    struct Broker {
        stream: TcpStream,
    }

    impl Broker {
        async fn accept(listener: &TcpListener) -> Self {
            let (stream, _) = tokio::time::timeout(WAIT, listener.accept())
                .await
                .unwrap()
                .unwrap();
            Self { stream }
        }

        /// Returns the packet type and the bytes after the fixed header.
        async fn read_packet(&mut self) -> (u8, Vec<u8>) {
            let first = self.stream.read_u8().await.unwrap();
            let mut remaining = 0usize;
            let mut shift = 0;
            loop {
                let byte = self.stream.read_u8().await.unwrap();
                remaining |= usize::from(byte & 0x7f) << shift;
                if byte & 0x80 == 0 {
                    break;
                }
                shift += 7;
            }
            let mut body = vec![0; remaining];
            self.stream.read_exact(&mut body).await.unwrap();
            (first >> 4, body)
        }

        /// Answer CONNECT, then acknowledge the subscription that follows
        /// and return its topic filter.
        async fn handshake(&mut self) -> String {
            let (kind, _) = self.read_packet().await;
            assert_eq!(kind, CONNECT);
            self.stream.write_all(&CONNACK).await.unwrap();

            let (kind, body) = self.read_packet().await;
            assert_eq!(kind, SUBSCRIBE);
            let len = usize::from(u16::from_be_bytes([body[2], body[3]]));
            let topic = String::from_utf8(body[4..4 + len].to_vec()).unwrap();
            let suback = [0x90, 0x03, body[0], body[1], 0x01];
            self.stream.write_all(&suback).await.unwrap();
            topic
        }

        async fn publish(&mut self, topic: &str, payload: &[u8]) {
            let remaining = 2 + topic.len() + payload.len();
            let mut packet = vec![0x30, u8::try_from(remaining).unwrap()];
            packet.extend_from_slice(&u16::try_from(topic.len()).unwrap().to_be_bytes());
            packet.extend_from_slice(topic.as_bytes());
            packet.extend_from_slice(payload);
            self.stream.write_all(&packet).await.unwrap();
        }
    }

    struct Running {
        listener: TcpListener,
        publisher: MqttCommandPublisher,
        inbox: mpsc::Receiver<InboundMessage>,
        stop: watch::Sender<bool>,
        task: JoinHandle<()>,
    }

    async fn start() -> Running {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let config = MqttConfig {
            broker_host: "127.0.0.1".to_string(),
            broker_port: listener.local_addr().unwrap().port(),
            reconnect_backoff_secs: 0,
            ..MqttConfig::default()
        };
        let (publisher, subscriber) = connect(&config).unwrap();
        let (tx, inbox) = mpsc::channel(4);
        let (stop, stopped) = watch::channel(false);
        let task = tokio::spawn(subscriber.run(tx, stopped));

        Running {
            listener,
            publisher,
            inbox,
            stop,
            task,
        }
    }

    #[tokio::test]
    async fn should_subscribe_and_forward_telemetry() {
        let mut running = start().await;
        let mut broker = Broker::accept(&running.listener).await;

        assert_eq!(broker.handshake().await, "farm/sensor");

        let payload = br#"{"esp32_id":"esp-1","moisture":250}"#;
        broker.publish("farm/sensor", payload).await;

        let message = tokio::time::timeout(WAIT, running.inbox.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(message.payload, payload.to_vec());
        running.task.abort();
    }

    #[tokio::test]
    async fn should_resubscribe_after_reconnect() {
        let running = start().await;

        let mut first = Broker::accept(&running.listener).await;
        assert_eq!(first.handshake().await, "farm/sensor");
        drop(first);

        let mut second = Broker::accept(&running.listener).await;
        assert_eq!(second.handshake().await, "farm/sensor");
        running.task.abort();
    }

    #[tokio::test]
    async fn should_stop_after_disconnect_is_sent() {
        let running = start().await;
        let mut broker = Broker::accept(&running.listener).await;
        broker.handshake().await;

        running.publisher.disconnect().await.unwrap();

        tokio::time::timeout(WAIT, running.task)
            .await
            .unwrap()
            .unwrap();
        let (kind, _) = broker.read_packet().await;
        assert_eq!(kind, DISCONNECT);
    }

    #[tokio::test]
    async fn should_stop_on_shutdown_signal() {
        let running = start().await;
        // Accepted but never answered: the event loop is stuck waiting for
        // CONNACK.
        let _broker = Broker::accept(&running.listener).await;

        running.stop.send(true).unwrap();

        tokio::time::timeout(WAIT, running.task)
            .await
            .unwrap()
            .unwrap();
    }
}
