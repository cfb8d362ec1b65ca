//! Per-viewer segmented cache for patient-scoped data
//!
//! Patient data fetched from the integrator is filtered remotely by the
//! caller's access rights, so the same patient's chart can legitimately
//! differ between two providers. Cache entries are therefore keyed by
//! the full access scope (facility, provider, patient) plus the payload
//! type; a hit is only ever returned to the exact viewer that populated
//! it. There is no cross-provider sharing and no partial key matching.
//!
//! The payload type participates in the key via `TypeId`, so a list of
//! notes and a list of drugs for the same scope coexist. Some payloads
//! carry an extra discriminator (document contents are keyed per
//! document); those use the sub-key variants.

use crate::cache::queue::QueueCache;
use crate::config::CacheConfig;
use crate::domain::keys::AccessScope;
use std::any::{Any, TypeId};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone, PartialEq, Eq, Hash)]
struct SegmentedKey {
    type_id: TypeId,
    scope: AccessScope,
    sub_key: Option<String>,
}

/// Access-scoped cache of patient data
pub struct SegmentedAccessCache {
    inner: QueueCache<SegmentedKey, Arc<dyn Any + Send + Sync>>,
}

impl SegmentedAccessCache {
    /// Creates the cache from shared cache tuning.
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            inner: QueueCache::new(
                config.capacity,
                config.shards,
                Duration::from_secs(config.ttl_seconds),
            ),
        }
    }

    fn key<T: Any>(scope: &AccessScope, sub_key: Option<&str>) -> SegmentedKey {
        SegmentedKey {
            type_id: TypeId::of::<T>(),
            scope: scope.clone(),
            sub_key: sub_key.map(str::to_string),
        }
    }

    /// Caches a payload for one access scope.
    pub fn put<T: Any + Send + Sync>(&self, scope: &AccessScope, value: Arc<T>) {
        self.inner.put(Self::key::<T>(scope, None), value);
    }

    /// Caches a payload under an extra discriminator within the scope,
    /// e.g. one document's contents among many.
    pub fn put_with_sub_key<T: Any + Send + Sync>(
        &self,
        scope: &AccessScope,
        sub_key: &str,
        value: Arc<T>,
    ) {
        self.inner.put(Self::key::<T>(scope, Some(sub_key)), value);
    }

    /// Returns the cached payload for exactly this scope and type, if
    /// fresh.
    pub fn get<T: Any + Send + Sync>(&self, scope: &AccessScope) -> Option<Arc<T>> {
        self.inner
            .get(&Self::key::<T>(scope, None))
            .and_then(|value| value.downcast::<T>().ok())
    }

    /// Sub-keyed variant of [`get`](Self::get).
    pub fn get_with_sub_key<T: Any + Send + Sync>(
        &self,
        scope: &AccessScope,
        sub_key: &str,
    ) -> Option<Arc<T>> {
        self.inner
            .get(&Self::key::<T>(scope, Some(sub_key)))
            .and_then(|value| value.downcast::<T>().ok())
    }

    /// Drops a single cached payload.
    pub fn remove<T: Any + Send + Sync>(&self, scope: &AccessScope) {
        self.inner.remove(&Self::key::<T>(scope, None));
    }

    /// Drops every cached payload for every scope.
    pub fn clear(&self) {
        self.inner.clear();
    }
}
