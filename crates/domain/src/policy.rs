//! Irrigation decision policy.
//!
//! A pure function of the latest reading and the device's thresholds. Two
//! distinct bounds form a hysteresis band: below the lower bound the device
//! is switched on, at or above the upper bound it is switched off, and in
//! between it keeps whatever state it is in. Because nothing depends on
//! message order, replayed or reordered telemetry yields the same decision
//! for the same reading.
//!
//! Temperature bounds are not consulted.

use crate::actuation::Action;
use crate::error::ConfigIncompleteError;
use crate::reading::SensorReading;
use crate::threshold::ThresholdConfig;

/// Outcome of evaluating the policy for one reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Send this command.
    Actuate(Action),
    /// Reading is inside the band; stay in the current state (if known).
    Hold(Option<Action>),
}

impl Decision {
    /// The command to send, if any.
    #[must_use]
    pub fn action(self) -> Option<Action> {
        match self {
            Self::Actuate(action) => Some(action),
            Self::Hold(_) => None,
        }
    }
}

/// Decide what to do with `reading` given `config`.
///
/// `previous` is the last action the policy decided for this device. It
/// never changes the outcome; it is echoed back in [`Decision::Hold`].
///
/// # Errors
///
/// Returns [`ConfigIncompleteError`] when a moisture bound is missing, so
/// "don't know" is never confused with "nothing to do".
pub fn decide(
    reading: &SensorReading,
    config: &ThresholdConfig,
    previous: Option<Action>,
) -> Result<Decision, ConfigIncompleteError> {
    let band = config.moisture_band()?;

    if reading.moisture < band.lower {
        Ok(Decision::Actuate(Action::On))
    } else if reading.moisture >= band.upper {
        Ok(Decision::Actuate(Action::Off))
    } else {
        Ok(Decision::Hold(previous))
    }
}
