//! Threshold configuration — per-device bounds owned by the configuration
//! service.
//!
//! The control loop only ever holds a read-only copy. Moisture bounds drive
//! the decision policy; temperature bounds are carried for operators but are
//! not consulted when deciding.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigIncompleteError, ValidationError};
use crate::id::DeviceId;
use crate::reading::ensure_finite;

/// Threshold configuration for one device.
///
/// Field names on the wire follow the configuration service
/// (`moisture_lower_threshold`, …).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    pub device_id: DeviceId,
    #[serde(rename = "moisture_lower_threshold")]
    pub moisture_lower: Option<f64>,
    #[serde(rename = "moisture_upper_threshold")]
    pub moisture_upper: Option<f64>,
    #[serde(rename = "temperature_lower_threshold")]
    pub temperature_lower: Option<f64>,
    #[serde(rename = "temperature_upper_threshold")]
    pub temperature_upper: Option<f64>,
}

/// Both moisture bounds, known to be present.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoistureBand {
    pub lower: f64,
    pub upper: f64,
}

impl ThresholdConfig {
    /// Create a configuration with only moisture bounds set.
    #[must_use]
    pub fn moisture(device_id: DeviceId, lower: f64, upper: f64) -> Self {
        Self {
            device_id,
            moisture_lower: Some(lower),
            moisture_upper: Some(upper),
            temperature_lower: None,
            temperature_upper: None,
        }
    }

    /// Return the moisture band, or which bound is missing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigIncompleteError`] if either bound is unset.
    pub fn moisture_band(&self) -> Result<MoistureBand, ConfigIncompleteError> {
        match (self.moisture_lower, self.moisture_upper) {
            (Some(lower), Some(upper)) => Ok(MoistureBand { lower, upper }),
            (None, None) => Err(ConfigIncompleteError::MoistureBoundsMissing),
            (None, Some(_)) => Err(ConfigIncompleteError::LowerBoundMissing),
            (Some(_), None) => Err(ConfigIncompleteError::UpperBoundMissing),
        }
    }

    /// Check that every bound is finite and that the moisture band is not
    /// inverted. Missing bounds are allowed here; the policy reports them.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NonFinite`] or
    /// [`ValidationError::InvertedBounds`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        ensure_finite("moisture_lower_threshold", self.moisture_lower)?;
        ensure_finite("moisture_upper_threshold", self.moisture_upper)?;
        ensure_finite("temperature_lower_threshold", self.temperature_lower)?;
        ensure_finite("temperature_upper_threshold", self.temperature_upper)?;

        if let (Some(lower), Some(upper)) = (self.moisture_lower, self.moisture_upper) {
            if lower > upper {
                return Err(ValidationError::InvertedBounds { lower, upper });
            }
        }
        Ok(())
    }
}
