//! # aquagrow-domain
//!
//! Pure domain model for the aquagrow irrigation controller.
//!
//! ## Responsibilities
//! - Foundational types: device identifiers, error taxonomy, timestamps
//! - Define **Sensor readings** (validated telemetry samples)
//! - Define **Threshold configurations** (per-device moisture/temperature bounds)
//! - Define **Actuation commands** (ON/OFF instructions and their wire shape)
//! - Implement the **decision policy** (hysteresis band over moisture)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod actuation;
pub mod policy;
pub mod reading;
pub mod threshold;
