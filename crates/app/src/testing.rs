//! Port test doubles shared by the service and ingestion tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use aquagrow_domain::actuation::ActuationCommand;
use aquagrow_domain::error::AquaGrowError;
use aquagrow_domain::id::DeviceId;
use aquagrow_domain::threshold::ThresholdConfig;

use crate::ports::{CommandPublisher, ThresholdSource};

/// How a stubbed device answers.
#[derive(Clone)]
pub enum Reply {
    Config(ThresholdConfig),
    Unavailable,
    Malformed,
    Slow(Duration, ThresholdConfig),
}

/// In-memory threshold source counting every fetch.
#[derive(Default)]
pub struct StubSource {
    replies: Mutex<HashMap<DeviceId, Reply>>,
    calls: AtomicUsize,
}

impl StubSource {
    pub fn with(replies: Vec<(&str, Reply)>) -> Self {
        let replies = replies
            .into_iter()
            .map(|(id, reply)| (DeviceId::new(id).unwrap(), reply))
            .collect();
        Self {
            replies: Mutex::new(replies),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set(&self, id: &str, reply: Reply) {
        self.replies
            .lock()
            .unwrap()
            .insert(DeviceId::new(id).unwrap(), reply);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ThresholdSource for StubSource {
    async fn fetch(&self, device_id: &DeviceId) -> Result<ThresholdConfig, AquaGrowError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.replies.lock().unwrap().get(device_id).cloned();
        match reply {
            Some(Reply::Config(config)) => Ok(config),
            Some(Reply::Slow(delay, config)) => {
                tokio::time::sleep(delay).await;
                Ok(config)
            }
            Some(Reply::Malformed) => Err(AquaGrowError::ConfigMalformed("bad body".into())),
            Some(Reply::Unavailable) | None => {
                Err(AquaGrowError::ConfigUnavailable("status 503".into()))
            }
        }
    }
}

/// Publisher recording every command it accepts.
#[derive(Default)]
pub struct RecordingPublisher {
    sent: Mutex<Vec<ActuationCommand>>,
    failing: std::sync::atomic::AtomicBool,
    delay: Mutex<Option<Duration>>,
}

impl RecordingPublisher {
    pub fn sent(&self) -> Vec<ActuationCommand> {
        self.sent.lock().unwrap().clone()
    }

    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn stall(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }
}

impl CommandPublisher for RecordingPublisher {
    async fn publish(&self, command: &ActuationCommand) -> Result<(), AquaGrowError> {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(AquaGrowError::PublishFailure("broker gone".into()));
        }
        self.sent.lock().unwrap().push(command.clone());
        Ok(())
    }
}

pub fn config(id: &str, lower: f64, upper: f64) -> ThresholdConfig {
    ThresholdConfig::moisture(DeviceId::new(id).unwrap(), lower, upper)
}
