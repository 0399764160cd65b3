//! Error taxonomy shared across the workspace.
//!
//! Every failure of the control loop falls into one of the
//! [`AquaGrowError`] variants. Adapters define their own typed errors and
//! convert into this enum at the port boundary, so the application layer
//! only ever reasons about *what kind* of failure happened.

/// Boxed source error carried across port boundaries.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Top-level error for the irrigation control pipeline.
#[derive(Debug, thiserror::Error)]
pub enum AquaGrowError {
    /// Inbound data (telemetry, override request) failed validation.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The threshold configuration service could not be reached, timed
    /// out, or answered with a non-success status.
    #[error("threshold configuration unavailable")]
    ConfigUnavailable(#[source] BoxError),

    /// The threshold configuration service answered, but the body could not
    /// be turned into a usable configuration.
    #[error("threshold configuration malformed")]
    ConfigMalformed(#[source] BoxError),

    /// The configuration lacks the moisture bounds needed for a decision.
    #[error("threshold configuration incomplete: {0}")]
    ConfigIncomplete(#[from] ConfigIncompleteError),

    /// The actuation command could not be handed to the outbound channel.
    #[error("failed to publish actuation command")]
    PublishFailure(#[source] BoxError),
}

/// Reasons an inbound value is rejected.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// The device identifier is empty or whitespace.
    #[error("device id must not be empty")]
    EmptyDeviceId,

    /// A required field is absent (or explicitly `null`).
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    /// `device_id` and `esp32_id` are both present and disagree.
    #[error("device id given twice: `{device_id}` and `{esp32_id}`")]
    ConflictingDeviceId {
        device_id: String,
        esp32_id: String,
    },

    /// A numeric field is NaN or infinite.
    #[error("field `{0}` must be a finite number")]
    NonFinite(&'static str),

    /// The payload is not JSON of the expected shape.
    #[error("payload does not match the telemetry schema")]
    MalformedPayload(#[source] serde_json::Error),

    /// An actuation request named something other than ON/OFF.
    #[error("invalid action `{0}`, expected ON, OFF or a boolean")]
    InvalidAction(String),

    /// The lower moisture bound is above the upper one.
    #[error("moisture lower bound {lower} exceeds upper bound {upper}")]
    InvertedBounds {
        /// Configured lower bound.
        lower: f64,
        /// Configured upper bound.
        upper: f64,
    },
}

/// Which moisture bound is missing from a threshold configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConfigIncompleteError {
    /// Neither bound is set.
    #[error("moisture thresholds are not set")]
    MoistureBoundsMissing,
    /// Only the upper bound is set.
    #[error("lower moisture threshold is not set")]
    LowerBoundMissing,
    /// Only the lower bound is set.
    #[error("upper moisture threshold is not set")]
    UpperBoundMissing,
}

impl AquaGrowError {
    /// Short, stable label for structured logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::ConfigUnavailable(_) => "config_unavailable",
            Self::ConfigMalformed(_) => "config_malformed",
            Self::ConfigIncomplete(_) => "config_incomplete",
            Self::PublishFailure(_) => "publish_failure",
        }
    }
}
