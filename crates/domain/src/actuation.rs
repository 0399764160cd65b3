//! Actuation — ON/OFF commands sent to irrigation devices.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::id::DeviceId;
use crate::time::{Timestamp, now};

/// What the irrigation device should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    On,
    Off,
}

impl Action {
    /// Encoding used on the irrigation topic: `"1"` for ON, `"0"` for OFF.
    #[must_use]
    pub fn wire_code(self) -> &'static str {
        match self {
            Self::On => "1",
            Self::Off => "0",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::On => f.write_str("ON"),
            Self::Off => f.write_str("OFF"),
        }
    }
}

impl FromStr for Action {
    type Err = ValidationError;

    /// Accepts `ON`/`OFF` (any case), `1`/`0` and `true`/`false`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "on" | "1" | "true" => Ok(Self::On),
            "off" | "0" | "false" => Ok(Self::Off),
            _ => Err(ValidationError::InvalidAction(s.to_string())),
        }
    }
}

/// Action as requested by an operator: either a boolean or a name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RequestedAction {
    Flag(bool),
    Named(String),
}

impl TryFrom<RequestedAction> for Action {
    type Error = ValidationError;

    fn try_from(value: RequestedAction) -> Result<Self, Self::Error> {
        match value {
            RequestedAction::Flag(true) => Ok(Self::On),
            RequestedAction::Flag(false) => Ok(Self::Off),
            RequestedAction::Named(name) => name.parse(),
        }
    }
}

/// Which path produced a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandOrigin {
    /// Computed by the decision policy from telemetry.
    Policy,
    /// Requested by an operator, bypassing the policy.
    Manual,
}

impl fmt::Display for CommandOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Policy => f.write_str("policy"),
            Self::Manual => f.write_str("manual"),
        }
    }
}

/// A transient instruction for one device. Not persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActuationCommand {
    pub device_id: DeviceId,
    pub action: Action,
    pub origin: CommandOrigin,
    pub issued_at: Timestamp,
}

impl ActuationCommand {
    /// Create a command stamped with the current time.
    #[must_use]
    pub fn new(device_id: DeviceId, action: Action, origin: CommandOrigin) -> Self {
        Self {
            device_id,
            action,
            origin,
            issued_at: now(),
        }
    }

    /// The message published on the irrigation topic.
    #[must_use]
    pub fn payload(&self) -> CommandPayload<'_> {
        CommandPayload {
            device_id: self.device_id.as_str(),
            action: self.action.wire_code(),
        }
    }
}

/// Wire shape of an outbound command: `{"device_id": "...", "action": "1"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CommandPayload<'a> {
    pub device_id: &'a str,
    pub action: &'static str,
}
