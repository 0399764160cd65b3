//! Sensor reading — one telemetry sample from a field device.
//!
//! Readings arrive as JSON on the monitoring topic. [`TelemetryPayload`]
//! mirrors the wire shape loosely (every field optional) so that a missing
//! field is reported as a precise [`ValidationError`] instead of a generic
//! deserialization failure.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::id::DeviceId;
use crate::time::Timestamp;

/// Raw inbound telemetry message.
///
/// Field firmware names the device `esp32_id`; it is accepted in place of
/// `device_id`, or next to it when both name the same device.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TelemetryPayload {
    pub device_id: Option<String>,
    pub esp32_id: Option<String>,
    pub moisture: Option<f64>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
}

/// A validated, immutable sensor reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorReading {
    pub device_id: DeviceId,
    pub moisture: f64,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub observed_at: Timestamp,
}

impl SensorReading {
    /// Decode and validate a raw telemetry message.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MalformedPayload`] when the bytes are not
    /// JSON of the telemetry shape, or any error from
    /// [`from_payload`](Self::from_payload).
    pub fn parse(bytes: &[u8], observed_at: Timestamp) -> Result<Self, ValidationError> {
        let payload: TelemetryPayload =
            serde_json::from_slice(bytes).map_err(ValidationError::MalformedPayload)?;
        Self::from_payload(payload, observed_at)
    }

    /// Validate a decoded payload.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when the device id or moisture is
    /// missing, the device id is blank or given twice with different
    /// values, or any value is not finite.
    pub fn from_payload(
        payload: TelemetryPayload,
        observed_at: Timestamp,
    ) -> Result<Self, ValidationError> {
        let device_id = match (payload.device_id, payload.esp32_id) {
            (Some(device_id), Some(esp32_id)) if device_id != esp32_id => {
                return Err(ValidationError::ConflictingDeviceId {
                    device_id,
                    esp32_id,
                });
            }
            (Some(id), _) | (None, Some(id)) => DeviceId::new(id)?,
            (None, None) => return Err(ValidationError::MissingField("device_id")),
        };
        let moisture = payload
            .moisture
            .ok_or(ValidationError::MissingField("moisture"))?;

        ensure_finite("moisture", Some(moisture))?;
        ensure_finite("temperature", payload.temperature)?;
        ensure_finite("humidity", payload.humidity)?;

        Ok(Self {
            device_id,
            moisture,
            temperature: payload.temperature,
            humidity: payload.humidity,
            observed_at,
        })
    }
}

pub(crate) fn ensure_finite(
    field: &'static str,
    value: Option<f64>,
) -> Result<(), ValidationError> {
    match value {
        Some(v) if !v.is_finite() => Err(ValidationError::NonFinite(field)),
        _ => Ok(()),
    }
}
