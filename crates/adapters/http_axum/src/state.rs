//! Shared application state for axum handlers.

use std::sync::Arc;

use aquagrow_app::services::manual_override::ManualOverride;
use aquagrow_app::services::threshold_resolver::ThresholdResolver;

use crate::auth::JwtVerifier;

/// Application state shared across all axum handlers.
///
/// Generic over the threshold source and command publisher to avoid dynamic
/// dispatch. `Clone` is implemented manually so the underlying types
/// themselves do not need to be `Clone`; only the `Arc` wrappers are cloned.
pub struct AppState<S, P> {
    /// Cache-first threshold lookup, shared with the ingestion loop.
    pub resolver: Arc<ThresholdResolver<S>>,
    /// Operator-requested actuation.
    pub manual_override: Arc<ManualOverride<P>>,
    /// Bearer token verification for operator endpoints.
    pub verifier: Arc<JwtVerifier>,
}

impl<S, P> Clone for AppState<S, P> {
    fn clone(&self) -> Self {
        Self {
            resolver: Arc::clone(&self.resolver),
            manual_override: Arc::clone(&self.manual_override),
            verifier: Arc::clone(&self.verifier),
        }
    }
}

impl<S, P> AppState<S, P> {
    /// Create the state from services already shared with background tasks.
    pub fn new(
        resolver: Arc<ThresholdResolver<S>>,
        manual_override: Arc<ManualOverride<P>>,
        jwt_secret: &str,
    ) -> Self {
        Self {
            resolver,
            manual_override,
            verifier: Arc::new(JwtVerifier::new(jwt_secret)),
        }
    }
}
