//! HTTP error response mapping.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use aquagrow_domain::error::{AquaGrowError, ValidationError};

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`AquaGrowError`] and authentication failures to an HTTP response
/// with an appropriate status code.
#[derive(Debug)]
pub enum ApiError {
    Domain(AquaGrowError),
    Unauthorized(&'static str),
    /// The request body is not a JSON object.
    Body(JsonRejection),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Body(rejection)
    }
}

impl From<AquaGrowError> for ApiError {
    fn from(err: AquaGrowError) -> Self {
        Self::Domain(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::Domain(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Unauthorized(reason) => (StatusCode::UNAUTHORIZED, (*reason).to_string()),
            Self::Body(rejection) => (StatusCode::BAD_REQUEST, rejection.body_text()),
            Self::Domain(err @ AquaGrowError::Validation(_)) => {
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            Self::Domain(err @ AquaGrowError::ConfigIncomplete(_)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
            }
            Self::Domain(
                err @ (AquaGrowError::ConfigUnavailable(_) | AquaGrowError::ConfigMalformed(_)),
            ) => {
                tracing::warn!(error = %err, kind = err.kind(), "configuration service error");
                (StatusCode::BAD_GATEWAY, err.to_string())
            }
            Self::Domain(err @ AquaGrowError::PublishFailure(_)) => {
                tracing::error!(error = %err, "publish failure");
                (StatusCode::SERVICE_UNAVAILABLE, err.to_string())
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
