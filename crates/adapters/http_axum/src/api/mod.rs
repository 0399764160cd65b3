//! JSON API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod irrigation;
#[allow(clippy::missing_errors_doc)]
pub mod thresholds;

use axum::Router;
use axum::routing::{get, post};

use aquagrow_app::ports::{CommandPublisher, ThresholdSource};

use crate::state::AppState;

/// Build the `/irrigation` sub-router.
pub fn routes<S, P>() -> Router<AppState<S, P>>
where
    S: ThresholdSource + Send + Sync + 'static,
    P: CommandPublisher + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(irrigation::status))
        .route("/toggle/{device_id}", post(irrigation::toggle::<S, P>))
        .route(
            "/thresholds/{device_id}",
            get(thresholds::get::<S, P>).delete(thresholds::invalidate::<S, P>),
        )
}
