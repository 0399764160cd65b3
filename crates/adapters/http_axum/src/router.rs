//! Axum router assembly.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use aquagrow_app::ports::{CommandPublisher, ThresholdSource};

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Mounts the irrigation API under `/irrigation` next to a plain `/health`
/// probe. Includes a [`TraceLayer`] that logs each HTTP request/response at
/// the `DEBUG` level using the `tracing` ecosystem.
pub fn build<S, P>(state: AppState<S, P>) -> Router
where
    S: ThresholdSource + Send + Sync + 'static,
    P: CommandPublisher + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .nest("/irrigation", crate::api::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use aquagrow_app::services::actuation_publisher::ActuationPublisher;
    use aquagrow_app::services::manual_override::ManualOverride;
    use aquagrow_app::services::threshold_resolver::ThresholdResolver;
    use aquagrow_app::threshold_cache::ThresholdCache;
    use aquagrow_domain::actuation::{Action, ActuationCommand};
    use aquagrow_domain::error::AquaGrowError;
    use aquagrow_domain::id::DeviceId;
    use aquagrow_domain::threshold::ThresholdConfig;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode, header};
    use http_body_util::BodyExt;
    use jsonwebtoken::{EncodingKey, Header, encode, get_current_timestamp};
    use tower::ServiceExt;

    const SECRET: &str = "router-test-secret";

    #[derive(Default)]
    struct StubSource {
        configs: Mutex<HashMap<DeviceId, ThresholdConfig>>,
    }

    impl ThresholdSource for StubSource {
        async fn fetch(&self, device_id: &DeviceId) -> Result<ThresholdConfig, AquaGrowError> {
            self.configs
                .lock()
                .unwrap()
                .get(device_id)
                .cloned()
                .ok_or_else(|| AquaGrowError::ConfigUnavailable("status 404".into()))
        }
    }

    #[derive(Default)]
    struct StubPublisher {
        sent: Mutex<Vec<ActuationCommand>>,
    }

    impl CommandPublisher for StubPublisher {
        async fn publish(&self, command: &ActuationCommand) -> Result<(), AquaGrowError> {
            self.sent.lock().unwrap().push(command.clone());
            Ok(())
        }
    }

    struct Fixture {
        app: Router,
        cache: Arc<ThresholdCache>,
        sink: Arc<StubPublisher>,
    }

    fn fixture() -> Fixture {
        let source = StubSource::default();
        source.configs.lock().unwrap().insert(
            DeviceId::new("esp-1").unwrap(),
            ThresholdConfig::moisture(DeviceId::new("esp-1").unwrap(), 300.0, 700.0),
        );
        let cache = Arc::new(ThresholdCache::default());
        let resolver = Arc::new(ThresholdResolver::new(
            source,
            Arc::clone(&cache),
            Duration::from_secs(5),
        ));
        let sink = Arc::new(StubPublisher::default());
        let publisher = Arc::new(ActuationPublisher::new(
            Arc::clone(&sink),
            Duration::from_secs(2),
        ));
        let manual = Arc::new(ManualOverride::new(publisher));

        Fixture {
            app: build(AppState::new(resolver, manual, SECRET)),
            cache,
            sink,
        }
    }

    fn bearer() -> String {
        let token = encode(
            &Header::default(),
            &serde_json::json!({"sub": "operator@farm", "exp": get_current_timestamp() + 600}),
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        format!("Bearer {token}")
    }

    fn toggle(device: &str, body: &serde_json::Value, auth: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(format!("/irrigation/toggle/{device}"))
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn should_return_ok_when_health_check_called() {
        let response = fixture()
            .app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"OK");
    }

    #[tokio::test]
    async fn should_report_service_status() {
        let response = fixture()
            .app
            .oneshot(Request::builder().uri("/irrigation").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            serde_json::json!({"status": "The irrigation service is up and running"})
        );
    }

    #[tokio::test]
    async fn should_publish_manual_toggle() {
        let f = fixture();
        let auth = bearer();
        let response = f
            .app
            .oneshot(toggle("esp-1", &serde_json::json!({"action": true}), Some(&auth)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["device_id"], "esp-1");
        assert_eq!(body["action"], "ON");
        assert_eq!(body["message"], "Irrigation ON for device esp-1");

        let sent = f.sink.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].action, Action::On);
    }

    #[tokio::test]
    async fn should_accept_named_off_action() {
        let f = fixture();
        let auth = bearer();
        let response = f
            .app
            .oneshot(toggle("esp-1", &serde_json::json!({"action": "OFF"}), Some(&auth)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["action"], "OFF");
    }

    #[tokio::test]
    async fn should_reject_invalid_action_with_bad_request() {
        let f = fixture();
        let auth = bearer();
        let response = f
            .app
            .oneshot(toggle("esp-1", &serde_json::json!({"action": "FLOOD"}), Some(&auth)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(response).await["error"].is_string());
        assert!(f.sink.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_reject_missing_or_mistyped_action_with_bad_request() {
        let bodies = [
            serde_json::json!({"action": 2}),
            serde_json::json!({"action": null}),
            serde_json::json!({"action": ["ON"]}),
            serde_json::json!({}),
        ];
        for body in bodies {
            let f = fixture();
            let auth = bearer();
            let response = f
                .app
                .oneshot(toggle("esp-1", &body, Some(&auth)))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
            assert!(json_body(response).await["error"].is_string(), "body: {body}");
            assert!(f.sink.sent.lock().unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn should_reject_non_json_toggle_body_with_bad_request() {
        let f = fixture();
        let request = Request::builder()
            .method(Method::POST)
            .uri("/irrigation/toggle/esp-1")
            .header(header::AUTHORIZATION, bearer())
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("action=ON"))
            .unwrap();

        let response = f.app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(response).await["error"].is_string());
        assert!(f.sink.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_reject_toggle_without_token() {
        let f = fixture();
        let response = f
            .app
            .oneshot(toggle("esp-1", &serde_json::json!({"action": true}), None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(f.sink.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_reject_toggle_with_bad_token() {
        let f = fixture();
        let response = f
            .app
            .oneshot(toggle(
                "esp-1",
                &serde_json::json!({"action": true}),
                Some("Bearer not-a-token"),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn should_return_effective_thresholds_and_fill_cache() {
        let f = fixture();
        let response = f
            .app
            .oneshot(
                Request::builder()
                    .uri("/irrigation/thresholds/esp-1")
                    .header(header::AUTHORIZATION, bearer())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["moisture_lower_threshold"], 300.0);
        assert_eq!(body["moisture_upper_threshold"], 700.0);
        assert_eq!(f.cache.len(), 1);
    }

    #[tokio::test]
    async fn should_map_unavailable_config_to_bad_gateway() {
        let response = fixture()
            .app
            .oneshot(
                Request::builder()
                    .uri("/irrigation/thresholds/esp-unknown")
                    .header(header::AUTHORIZATION, bearer())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn should_invalidate_cached_thresholds() {
        let f = fixture();
        f.cache.put(ThresholdConfig::moisture(
            DeviceId::new("esp-1").unwrap(),
            100.0,
            200.0,
        ));

        let response = f
            .app
            .oneshot(
                Request::builder()
                    .method(Method::DELETE)
                    .uri("/irrigation/thresholds/esp-1")
                    .header(header::AUTHORIZATION, bearer())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            serde_json::json!({"device_id": "esp-1", "invalidated": true})
        );
        assert!(f.cache.is_empty());
    }
}
