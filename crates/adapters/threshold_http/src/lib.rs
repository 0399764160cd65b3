//! # aquagrow-adapter-threshold-http
//!
//! HTTP client for the farm configuration service.
//!
//! Implements [`ThresholdSource`] by calling
//! `GET {base_url}/farms/threshold/{device_id}` with the shared
//! `X-API-KEY` header and decoding the threshold document.
//!
//! ## Dependency rule
//! Same as other adapters: depends on `aquagrow-app` and `aquagrow-domain`.

pub mod error;

use std::future::Future;
use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;

use aquagrow_app::ports::ThresholdSource;
use aquagrow_domain::error::AquaGrowError;
use aquagrow_domain::id::DeviceId;
use aquagrow_domain::threshold::ThresholdConfig;

pub use error::ThresholdHttpError;

/// Header carrying the service-to-service key.
pub const API_KEY_HEADER: &str = "X-API-KEY";

/// Body of a successful threshold lookup. Every bound may be absent or null.
#[derive(Debug, Deserialize)]
struct ThresholdDocument {
    moisture_lower_threshold: Option<f64>,
    moisture_upper_threshold: Option<f64>,
    temperature_lower_threshold: Option<f64>,
    temperature_upper_threshold: Option<f64>,
}

impl ThresholdDocument {
    fn into_config(self, device_id: DeviceId) -> ThresholdConfig {
        ThresholdConfig {
            device_id,
            moisture_lower: self.moisture_lower_threshold,
            moisture_upper: self.moisture_upper_threshold,
            temperature_lower: self.temperature_lower_threshold,
            temperature_upper: self.temperature_upper_threshold,
        }
    }
}

/// [`ThresholdSource`] talking to the configuration service over HTTP.
pub struct HttpThresholdSource {
    client: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl HttpThresholdSource {
    /// Create a client with its own connection pool and request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ThresholdHttpError::InvalidUrl`] if `base_url` does not
    /// parse, or [`ThresholdHttpError::Request`] if the client cannot be
    /// built.
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ThresholdHttpError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Self::with_client(client, base_url, api_key)
    }

    /// Create a source reusing an existing [`reqwest::Client`].
    ///
    /// # Errors
    ///
    /// Returns [`ThresholdHttpError::InvalidUrl`] if `base_url` does not
    /// parse as an absolute URL.
    pub fn with_client(
        client: reqwest::Client,
        base_url: &str,
        api_key: impl Into<String>,
    ) -> Result<Self, ThresholdHttpError> {
        let base_url = Url::parse(base_url)
            .map_err(|err| ThresholdHttpError::InvalidUrl(err.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ThresholdHttpError::InvalidUrl(base_url.to_string()));
        }
        Ok(Self {
            client,
            base_url,
            api_key: api_key.into(),
        })
    }

    /// URL of the threshold document for `device_id`; the id is a single,
    /// percent-encoded path segment.
    fn threshold_url(&self, device_id: &DeviceId) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["farms", "threshold", device_id.as_str()]);
        }
        url
    }

    /// Fetch and decode the thresholds for `device_id`.
    ///
    /// # Errors
    ///
    /// See [`ThresholdHttpError`].
    pub async fn get(&self, device_id: &DeviceId) -> Result<ThresholdConfig, ThresholdHttpError> {
        let url = self.threshold_url(device_id);
        tracing::debug!(%url, "fetching thresholds");

        let response = self
            .client
            .get(url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ThresholdHttpError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        let document: ThresholdDocument =
            serde_json::from_slice(&bytes).map_err(ThresholdHttpError::Decode)?;
        Ok(document.into_config(device_id.clone()))
    }
}

impl ThresholdSource for HttpThresholdSource {
    fn fetch(
        &self,
        device_id: &DeviceId,
    ) -> impl Future<Output = Result<ThresholdConfig, AquaGrowError>> + Send {
        async move {
            self.get(device_id).await.map_err(|err| {
                tracing::warn!(%device_id, error = %err, "threshold lookup failed");
                err.into_domain()
            })
        }
    }
}
