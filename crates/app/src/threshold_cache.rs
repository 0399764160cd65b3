//! Process-local threshold cache shared by the ingestion loop and the API.
//!
//! At most one entry per device; every successful resolution replaces the
//! entry wholesale (last write wins). Entries may carry a time-to-live after
//! which they read as absent, so the next telemetry message for that device
//! goes back to the configuration service.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use tokio::time::Instant;

use aquagrow_domain::id::DeviceId;
use aquagrow_domain::threshold::ThresholdConfig;

struct CacheEntry {
    config: ThresholdConfig,
    stored_at: Instant,
}

/// Thread-safe map from device id to its last known thresholds.
///
/// No eviction: the map grows with the device population. A poisoned lock
/// is recovered rather than propagated, since every write replaces a whole
/// entry and cannot leave the map half-updated.
pub struct ThresholdCache {
    entries: RwLock<HashMap<DeviceId, CacheEntry>>,
    ttl: Option<Duration>,
}

impl Default for ThresholdCache {
    fn default() -> Self {
        Self::new(None)
    }
}

impl ThresholdCache {
    /// Create an empty cache. `None` means entries never expire.
    #[must_use]
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Return the cached configuration, unless absent or expired.
    #[must_use]
    pub fn get(&self, device_id: &DeviceId) -> Option<ThresholdConfig> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.get(device_id)?;
        if self.is_expired(entry) {
            return None;
        }
        Some(entry.config.clone())
    }

    /// Store `config` under its own device id, replacing any previous entry.
    pub fn put(&self, config: ThresholdConfig) {
        let entry = CacheEntry {
            stored_at: Instant::now(),
            config,
        };
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(entry.config.device_id.clone(), entry);
    }

    /// Drop the entry for `device_id`. Returns whether one was present.
    pub fn invalidate(&self, device_id: &DeviceId) -> bool {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(device_id)
            .is_some()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of stored entries, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the cache holds no entries at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_expired(&self, entry: &CacheEntry) -> bool {
        self.ttl
            .is_some_and(|ttl| entry.stored_at.elapsed() >= ttl)
    }
}
