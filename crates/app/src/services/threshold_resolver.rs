//! Threshold resolver — cache-first lookup backed by the configuration
//! service.

use std::sync::Arc;
use std::time::Duration;

use aquagrow_domain::error::AquaGrowError;
use aquagrow_domain::id::DeviceId;
use aquagrow_domain::threshold::ThresholdConfig;

use crate::ports::ThresholdSource;
use crate::threshold_cache::ThresholdCache;

/// Default bound on a single remote lookup.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Resolves the thresholds that apply to a device.
///
/// The resolver never retries: a failed lookup fails the message that asked
/// for it, and the next message for the same device tries again.
pub struct ThresholdResolver<S> {
    source: S,
    cache: Arc<ThresholdCache>,
    timeout: Duration,
}

impl<S: ThresholdSource> ThresholdResolver<S> {
    /// Create a resolver writing into `cache`.
    pub fn new(source: S, cache: Arc<ThresholdCache>, timeout: Duration) -> Self {
        Self {
            source,
            cache,
            timeout,
        }
    }

    /// The cache this resolver fills.
    #[must_use]
    pub fn cache(&self) -> &Arc<ThresholdCache> {
        &self.cache
    }

    /// Return the cached configuration, fetching it only on a miss.
    ///
    /// # Errors
    ///
    /// Same as [`resolve`](Self::resolve), on a cache miss.
    pub async fn lookup(&self, device_id: &DeviceId) -> Result<ThresholdConfig, AquaGrowError> {
        if let Some(config) = self.cache.get(device_id) {
            tracing::debug!(%device_id, "threshold cache hit");
            return Ok(config);
        }
        self.resolve(device_id).await
    }

    /// Fetch the configuration from the remote service and cache it.
    ///
    /// # Errors
    ///
    /// Returns [`AquaGrowError::ConfigUnavailable`] if the source fails or
    /// does not answer within the timeout, and
    /// [`AquaGrowError::ConfigMalformed`] if the source answers with
    /// unusable data (including non-finite or inverted bounds). Nothing is
    /// cached on failure.
    #[tracing::instrument(skip_all, fields(%device_id))]
    pub async fn resolve(&self, device_id: &DeviceId) -> Result<ThresholdConfig, AquaGrowError> {
        let config = tokio::time::timeout(self.timeout, self.source.fetch(device_id))
            .await
            .map_err(|elapsed| AquaGrowError::ConfigUnavailable(Box::new(elapsed)))??;

        config
            .validate()
            .map_err(|err| AquaGrowError::ConfigMalformed(Box::new(err)))?;

        self.cache.put(config.clone());
        tracing::debug!(
            lower = ?config.moisture_lower,
            upper = ?config.moisture_upper,
            "thresholds resolved"
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Reply, StubSource, config};

    fn id(s: &str) -> DeviceId {
        DeviceId::new(s).unwrap()
    }

    fn resolver(source: StubSource) -> ThresholdResolver<StubSource> {
        ThresholdResolver::new(source, Arc::new(ThresholdCache::default()), DEFAULT_TIMEOUT)
    }

    #[tokio::test]
    async fn should_cache_after_successful_resolve() {
        let resolver = resolver(StubSource::with(vec![(
            "esp-1",
            Reply::Config(config("esp-1", 300.0, 700.0)),
        )]));

        let resolved = resolver.resolve(&id("esp-1")).await.unwrap();
        assert_eq!(resolver.cache().get(&id("esp-1")), Some(resolved));
    }

    #[tokio::test]
    async fn should_not_call_source_again_on_cache_hit() {
        let resolver = resolver(StubSource::with(vec![(
            "esp-1",
            Reply::Config(config("esp-1", 300.0, 700.0)),
        )]));

        let first = resolver.lookup(&id("esp-1")).await.unwrap();
        let second = resolver.lookup(&id("esp-1")).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(resolver.source.calls(), 1);
    }

    #[tokio::test]
    async fn should_refetch_after_invalidation() {
        let resolver = resolver(StubSource::with(vec![(
            "esp-1",
            Reply::Config(config("esp-1", 300.0, 700.0)),
        )]));
        resolver.lookup(&id("esp-1")).await.unwrap();

        resolver
            .source
            .set("esp-1", Reply::Config(config("esp-1", 200.0, 500.0)));
        resolver.cache().invalidate(&id("esp-1"));

        let fresh = resolver.lookup(&id("esp-1")).await.unwrap();
        assert_eq!(fresh.moisture_lower, Some(200.0));
        assert_eq!(resolver.source.calls(), 2);
    }

    #[tokio::test]
    async fn should_fail_unavailable_without_caching() {
        let resolver = resolver(StubSource::with(vec![("esp-1", Reply::Unavailable)]));

        let err = resolver.resolve(&id("esp-1")).await.unwrap_err();
        assert!(matches!(err, AquaGrowError::ConfigUnavailable(_)));
        assert!(resolver.cache().is_empty());
    }

    #[tokio::test]
    async fn should_fail_malformed_without_caching() {
        let resolver = resolver(StubSource::with(vec![("esp-1", Reply::Malformed)]));

        let err = resolver.resolve(&id("esp-1")).await.unwrap_err();
        assert!(matches!(err, AquaGrowError::ConfigMalformed(_)));
        assert!(resolver.cache().is_empty());
    }

    #[tokio::test]
    async fn should_reject_inverted_bounds_as_malformed() {
        let resolver = resolver(StubSource::with(vec![(
            "esp-1",
            Reply::Config(config("esp-1", 800.0, 200.0)),
        )]));

        let err = resolver.resolve(&id("esp-1")).await.unwrap_err();
        assert!(matches!(err, AquaGrowError::ConfigMalformed(_)));
        assert!(resolver.cache().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn should_time_out_slow_source() {
        let resolver = resolver(StubSource::with(vec![(
            "esp-1",
            Reply::Slow(Duration::from_secs(30), config("esp-1", 300.0, 700.0)),
        )]));

        let err = resolver.resolve(&id("esp-1")).await.unwrap_err();
        assert!(matches!(err, AquaGrowError::ConfigUnavailable(_)));
        assert!(resolver.cache().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn should_accept_answer_within_timeout() {
        let resolver = resolver(StubSource::with(vec![(
            "esp-1",
            Reply::Slow(Duration::from_secs(4), config("esp-1", 300.0, 700.0)),
        )]));

        assert!(resolver.resolve(&id("esp-1")).await.is_ok());
    }
}
