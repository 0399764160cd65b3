//! Service status and manual irrigation override.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use aquagrow_app::ports::{CommandPublisher, ThresholdSource};
use aquagrow_domain::actuation::{Action, RequestedAction};
use aquagrow_domain::error::ValidationError;

use crate::auth::Operator;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct StatusBody {
    pub status: &'static str,
}

/// `GET /irrigation`
pub async fn status() -> Json<StatusBody> {
    Json(StatusBody {
        status: "The irrigation service is up and running",
    })
}

/// Request body for a manual toggle: `true`/`false`, `"ON"`/`"OFF"`.
///
/// `action` stays raw JSON; a missing, `null` or mistyped value is a
/// validation error.
#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    #[serde(default)]
    pub action: serde_json::Value,
}

impl ToggleRequest {
    fn requested_action(self) -> Result<RequestedAction, ValidationError> {
        match self.action {
            serde_json::Value::Null => Err(ValidationError::MissingField("action")),
            serde_json::Value::Bool(flag) => Ok(RequestedAction::Flag(flag)),
            serde_json::Value::String(name) => Ok(RequestedAction::Named(name)),
            other => Err(ValidationError::InvalidAction(other.to_string())),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ToggleBody {
    pub message: String,
    pub device_id: String,
    pub action: Action,
}

/// Possible responses from the toggle endpoint.
pub enum ToggleResponse {
    Ok(Json<ToggleBody>),
}

impl IntoResponse for ToggleResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `POST /irrigation/toggle/{device_id}`
///
/// Publishes the command directly, regardless of the current thresholds.
pub async fn toggle<S, P>(
    State(state): State<AppState<S, P>>,
    operator: Operator,
    Path(device_id): Path<String>,
    body: Result<Json<ToggleRequest>, JsonRejection>,
) -> Result<ToggleResponse, ApiError>
where
    S: ThresholdSource + Send + Sync + 'static,
    P: CommandPublisher + Send + Sync + 'static,
{
    let Json(req) = body?;
    tracing::debug!(
        operator = %operator.subject,
        %device_id,
        requested = %req.action,
        "manual toggle"
    );
    let requested = req.requested_action()?;
    let command = state
        .manual_override
        .request(&device_id, requested)
        .await?;

    Ok(ToggleResponse::Ok(Json(ToggleBody {
        message: format!("Irrigation {} for device {}", command.action, command.device_id),
        device_id: command.device_id.to_string(),
        action: command.action,
    })))
}
