//! # aquagrow-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `ThresholdSource` — fetch a device's thresholds from the configuration service
//!   - `CommandPublisher` — hand an actuation command to the transport
//! - Define **driving/inbound** use-cases:
//!   - `ThresholdResolver` — cache-first threshold lookup with a bounded timeout
//!   - `ActuationPublisher` — emit commands with a bounded send time
//!   - `ManualOverride` — operator-requested actuation
//!   - `IngestionLoop` — telemetry in, decisions out
//! - Provide **in-process infrastructure** (threshold cache, ingestion queue)
//!
//! ## Dependency rule
//! Depends on `aquagrow-domain` only (plus `tokio` for channels and timers).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod ingestion;
pub mod ports;
pub mod services;
pub mod threshold_cache;

#[cfg(test)]
mod testing;
