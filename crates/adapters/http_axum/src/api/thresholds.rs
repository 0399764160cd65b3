//! Effective thresholds and cache invalidation.

use axum::Json;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use aquagrow_app::ports::{CommandPublisher, ThresholdSource};
use aquagrow_domain::id::DeviceId;
use aquagrow_domain::threshold::ThresholdConfig;

use crate::auth::Operator;
use crate::error::ApiError;
use crate::state::AppState;

/// Possible responses from the get endpoint.
pub enum GetResponse {
    Ok(Json<ThresholdConfig>),
}

impl IntoResponse for GetResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InvalidateBody {
    pub device_id: String,
    /// Whether an entry was actually cached.
    pub invalidated: bool,
}

/// Possible responses from the invalidate endpoint.
pub enum InvalidateResponse {
    Ok(Json<InvalidateBody>),
}

impl IntoResponse for InvalidateResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /irrigation/thresholds/{device_id}`
///
/// Cache first; a miss goes to the configuration service and fills the cache.
pub async fn get<S, P>(
    State(state): State<AppState<S, P>>,
    _operator: Operator,
    Path(device_id): Path<String>,
) -> Result<GetResponse, ApiError>
where
    S: ThresholdSource + Send + Sync + 'static,
    P: CommandPublisher + Send + Sync + 'static,
{
    let device_id = DeviceId::new(device_id)?;
    let config = state.resolver.lookup(&device_id).await?;
    Ok(GetResponse::Ok(Json(config)))
}

/// `DELETE /irrigation/thresholds/{device_id}`
///
/// Drops the cached entry so the next reading refetches.
pub async fn invalidate<S, P>(
    State(state): State<AppState<S, P>>,
    operator: Operator,
    Path(device_id): Path<String>,
) -> Result<InvalidateResponse, ApiError>
where
    S: ThresholdSource + Send + Sync + 'static,
    P: CommandPublisher + Send + Sync + 'static,
{
    let device_id = DeviceId::new(device_id)?;
    let invalidated = state.resolver.cache().invalidate(&device_id);
    tracing::info!(
        operator = %operator.subject,
        %device_id,
        invalidated,
        "threshold cache entry invalidated"
    );

    Ok(InvalidateResponse::Ok(Json(InvalidateBody {
        device_id: device_id.to_string(),
        invalidated,
    })))
}
