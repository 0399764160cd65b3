//! # aquagrowd — aquagrow irrigation controller daemon
//!
//! Composition root that wires all adapters together and starts the service.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Initialise logging
//! - Construct the threshold source, cache and resolver
//! - Construct the MQTT transport, the actuation publisher and the
//!   ingestion loop, and start them as background tasks
//! - Build the axum router, injecting application services
//! - Bind to a TCP port and serve
//! - Handle graceful shutdown (SIGTERM/SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use std::sync::Arc;

use tokio::sync::watch;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use aquagrow_adapter_http_axum::{AppState, router};
use aquagrow_adapter_threshold_http::HttpThresholdSource;
use aquagrow_app::ingestion::{self, IngestionLoop};
use aquagrow_app::services::actuation_publisher::ActuationPublisher;
use aquagrow_app::services::manual_override::ManualOverride;
use aquagrow_app::services::threshold_resolver::ThresholdResolver;
use aquagrow_app::threshold_cache::ThresholdCache;

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    // Logging
    let filter = EnvFilter::try_new(&config.logging.filter)
        .unwrap_or_else(|_| EnvFilter::new("aquagrowd=info,aquagrow=info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Thresholds
    let source = HttpThresholdSource::new(
        &config.thresholds.service_url,
        config.thresholds.api_key.clone(),
        config.thresholds.timeout(),
    )?;
    let cache = Arc::new(ThresholdCache::new(config.thresholds.cache_ttl()));
    let resolver = Arc::new(ThresholdResolver::new(
        source,
        cache,
        config.thresholds.timeout(),
    ));

    // Transport
    let (mqtt_publisher, subscriber) = aquagrow_adapter_mqtt::connect(&config.mqtt)?;
    let publisher = Arc::new(ActuationPublisher::new(
        mqtt_publisher.clone(),
        config.control.publish_timeout(),
    ));
    let manual_override = Arc::new(ManualOverride::new(Arc::clone(&publisher)));
    let ingestion_loop = IngestionLoop::new(Arc::clone(&resolver), publisher);

    // Background tasks
    let (stop_ingestion, ingestion_stopped) = watch::channel(false);
    let (stop_transport, transport_stopped) = watch::channel(false);
    let (inbox_tx, inbox_rx) = ingestion::queue(config.control.queue_capacity);

    let mut subscriber_task = tokio::spawn(subscriber.run(inbox_tx, transport_stopped));
    let ingestion_task =
        tokio::spawn(async move { ingestion_loop.run(inbox_rx, ingestion_stopped).await });

    // HTTP
    let state = AppState::new(resolver, manual_override, &config.auth.jwt_secret);
    let app = router::build(state);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "aquagrowd listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Drain: finish the message in flight, flush the disconnect, stop polling.
    tracing::info!("server stopped accepting connections, shutting down");
    let grace = config.control.shutdown_grace();

    let _ = stop_ingestion.send(true);
    match tokio::time::timeout(grace, ingestion_task).await {
        Ok(Ok(())) => tracing::info!("ingestion loop stopped"),
        Ok(Err(err)) => tracing::error!(error = %err, "ingestion task failed"),
        Err(_) => tracing::warn!(?grace, "ingestion loop did not stop within grace period"),
    }

    if let Err(err) = mqtt_publisher.disconnect().await {
        tracing::warn!(error = %err, "MQTT disconnect failed");
    }
    if tokio::time::timeout(grace, &mut subscriber_task).await.is_err() {
        tracing::warn!(?grace, "MQTT event loop did not stop within grace period");
        let _ = stop_transport.send(true);
        subscriber_task.abort();
    }

    tracing::info!("graceful shutdown complete");
    Ok(())
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}
