//! JWT Bearer authentication for operator endpoints.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::AppState;

/// Claims we read from an operator token. Other claims are ignored.
#[derive(Debug, Deserialize)]
pub struct Claims {
    /// Token subject; issuers use either a string or a numeric user id.
    #[serde(default)]
    pub sub: serde_json::Value,
    pub exp: u64,
}

/// Verifies HS256 tokens signed with the shared secret.
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    #[must_use]
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            // HS256, `exp` required and checked
            validation: Validation::default(),
        }
    }

    /// Check signature and expiry and return the claims.
    ///
    /// # Errors
    ///
    /// Returns the `jsonwebtoken` error for a bad signature, an expired
    /// token, or a token that does not decode.
    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode::<Claims>(token, &self.key, &self.validation).map(|data| data.claims)
    }
}

impl std::fmt::Debug for JwtVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtVerifier").finish_non_exhaustive()
    }
}

/// Authenticated operator extracted from the `Authorization: Bearer` header.
#[derive(Debug, Clone)]
pub struct Operator {
    pub subject: String,
}

impl<S, P> FromRequestParts<AppState<S, P>> for Operator
where
    S: Send + Sync,
    P: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<S, P>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized("missing Authorization header"))?;

        let token = header.strip_prefix("Bearer ").ok_or(ApiError::Unauthorized(
            "invalid Authorization format, expected: Bearer <token>",
        ))?;

        let claims = state.verifier.verify(token.trim()).map_err(|err| {
            tracing::debug!(error = %err, "token rejected");
            ApiError::Unauthorized("invalid or expired token")
        })?;

        let subject = match claims.sub {
            serde_json::Value::String(subject) => subject,
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        };
        Ok(Self { subject })
    }
}
