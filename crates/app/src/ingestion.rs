//! Ingestion loop — turns raw telemetry into actuation commands.
//!
//! Messages arrive on a bounded queue filled by the transport adapter. Each
//! one is parsed, matched against the device's thresholds, run through the
//! decision policy and, if the policy asks for it, published. A failure at
//! any step is logged and ends processing of *that* message only; the loop
//! keeps consuming.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{mpsc, watch};

use aquagrow_domain::actuation::{Action, ActuationCommand, CommandOrigin};
use aquagrow_domain::error::{AquaGrowError, ValidationError};
use aquagrow_domain::id::DeviceId;
use aquagrow_domain::policy::{Decision, decide};
use aquagrow_domain::reading::SensorReading;
use aquagrow_domain::time::{Timestamp, now};

use crate::ports::{CommandPublisher, ThresholdSource};
use crate::services::actuation_publisher::ActuationPublisher;
use crate::services::threshold_resolver::ThresholdResolver;

/// A raw message taken off the monitoring topic.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub payload: Vec<u8>,
    pub received_at: Timestamp,
}

impl InboundMessage {
    /// Wrap `payload`, stamped with the current time.
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: payload.into(),
            received_at: now(),
        }
    }
}

/// What happened to one inbound message.
#[derive(Debug)]
pub enum Outcome {
    /// A command was handed to the transport.
    Published(ActuationCommand),
    /// Reading inside the band; nothing sent. Carries the device's last
    /// decided action, if any.
    Held(Option<Action>),
    /// Payload could not be turned into a reading.
    Rejected(ValidationError),
    /// No usable thresholds for the device.
    Skipped(AquaGrowError),
    /// The policy decided, but publishing failed.
    PublishFailed(AquaGrowError),
}

/// Create the bounded queue between the transport and the loop.
///
/// When full, the transport's `send` waits, which in turn stops it from
/// polling the broker.
#[must_use]
pub fn queue(capacity: usize) -> (mpsc::Sender<InboundMessage>, mpsc::Receiver<InboundMessage>) {
    mpsc::channel(capacity.max(1))
}

/// Sequential consumer of inbound telemetry.
pub struct IngestionLoop<S, P> {
    resolver: Arc<ThresholdResolver<S>>,
    publisher: Arc<ActuationPublisher<P>>,
    last_decided: Mutex<HashMap<DeviceId, Action>>,
}

impl<S, P> IngestionLoop<S, P>
where
    S: ThresholdSource,
    P: CommandPublisher,
{
    /// Create a loop sharing `resolver` and `publisher` with the rest of the
    /// service.
    pub fn new(resolver: Arc<ThresholdResolver<S>>, publisher: Arc<ActuationPublisher<P>>) -> Self {
        Self {
            resolver,
            publisher,
            last_decided: Mutex::new(HashMap::new()),
        }
    }

    /// Last action the policy decided for `device_id`.
    ///
    /// Manual overrides are not reflected here.
    #[must_use]
    pub fn last_decided(&self, device_id: &DeviceId) -> Option<Action> {
        self.last_decided
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(device_id)
            .copied()
    }

    fn remember(&self, device_id: DeviceId, action: Action) {
        self.last_decided
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(device_id, action);
    }

    /// Process a single message end to end.
    ///
    /// Never fails: every error is logged and reported in the [`Outcome`].
    pub async fn handle(&self, message: &InboundMessage) -> Outcome {
        let reading = match SensorReading::parse(&message.payload, message.received_at) {
            Ok(reading) => reading,
            Err(err) => {
                tracing::warn!(error = %err, "telemetry rejected");
                return Outcome::Rejected(err);
            }
        };
        let device_id = reading.device_id.clone();

        let config = match self.resolver.lookup(&device_id).await {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(
                    %device_id,
                    kind = err.kind(),
                    error = %err,
                    "no thresholds, skipping reading"
                );
                return Outcome::Skipped(err);
            }
        };

        let previous = self.last_decided(&device_id);
        let action = match decide(&reading, &config, previous) {
            Ok(Decision::Actuate(action)) => action,
            Ok(Decision::Hold(current)) => {
                tracing::debug!(
                    %device_id,
                    moisture = reading.moisture,
                    "moisture within band, holding"
                );
                return Outcome::Held(current);
            }
            Err(err) => {
                tracing::warn!(%device_id, error = %err, "incomplete thresholds, skipping reading");
                return Outcome::Skipped(err.into());
            }
        };

        self.remember(device_id.clone(), action);
        match self
            .publisher
            .publish(device_id, action, CommandOrigin::Policy)
            .await
        {
            Ok(command) => Outcome::Published(command),
            Err(err) => Outcome::PublishFailed(err),
        }
    }

    /// Consume `inbox` until it closes or `shutdown` flips to `true`.
    ///
    /// A message already being handled is finished before the loop stops;
    /// messages still queued at that point are dropped. Dropping the
    /// shutdown sender also stops the loop.
    pub async fn run(
        &self,
        mut inbox: mpsc::Receiver<InboundMessage>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        tracing::info!("ingestion loop started");
        loop {
            tokio::select! {
                biased;
                _ = async { shutdown.wait_for(|stop| *stop).await.map(|_| ()) } => {
                    tracing::info!(dropped = inbox.len(), "ingestion loop stopping");
                    break;
                }
                message = inbox.recv() => {
                    let Some(message) = message else {
                        tracing::info!("inbox closed, ingestion loop stopping");
                        break;
                    };
                    self.handle(&message).await;
                }
            }
        }
    }
}
