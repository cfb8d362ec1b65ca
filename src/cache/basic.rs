//! Facility-wide reference data cache
//!
//! Facility, program, and provider directories are small, change rarely,
//! and are requested constantly by screens that render pickers and name
//! lookups. They are cached under fixed keys shared by every caller, so
//! one fetch serves the whole process until the entry expires.
//!
//! Lists are stored behind `Arc` so a hit hands out a shared handle
//! instead of cloning the whole directory.

use crate::cache::queue::QueueCache;
use crate::config::CacheConfig;
use crate::domain::records::{RemoteFacility, RemoteProgram, RemoteProvider};
use std::sync::Arc;
use std::time::Duration;

/// Fixed keys for the shared reference lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum BasicDataKey {
    AllFacilities,
    AllPrograms,
    AllProviders,
}

#[derive(Clone)]
enum BasicDataValue {
    Facilities(Arc<Vec<RemoteFacility>>),
    Programs(Arc<Vec<RemoteProgram>>),
    Providers(Arc<Vec<RemoteProvider>>),
}

/// Cache for facility-wide reference data
pub struct BasicDataCache {
    inner: QueueCache<BasicDataKey, BasicDataValue>,
}

impl BasicDataCache {
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

    /// Cached facility directory, if fresh.
    pub fn facilities(&self) -> Option<Arc<Vec<RemoteFacility>>> {
        match self.inner.get(&BasicDataKey::AllFacilities) {
            Some(BasicDataValue::Facilities(list)) => Some(list),
            _ => None,
        }
    }

    /// Replaces the cached facility directory.
    pub fn set_facilities(&self, facilities: Arc<Vec<RemoteFacility>>) {
        self.inner
            .put(BasicDataKey::AllFacilities, BasicDataValue::Facilities(facilities));
    }

    /// Cached program directory, if fresh.
    pub fn programs(&self) -> Option<Arc<Vec<RemoteProgram>>> {
        match self.inner.get(&BasicDataKey::AllPrograms) {
            Some(BasicDataValue::Programs(list)) => Some(list),
            _ => None,
        }
    }

    /// Replaces the cached program directory.
    pub fn set_programs(&self, programs: Arc<Vec<RemoteProgram>>) {
        self.inner
            .put(BasicDataKey::AllPrograms, BasicDataValue::Programs(programs));
    }

    /// Cached provider directory, if fresh.
    pub fn providers(&self) -> Option<Arc<Vec<RemoteProvider>>> {
        match self.inner.get(&BasicDataKey::AllProviders) {
            Some(BasicDataValue::Providers(list)) => Some(list),
            _ => None,
        }
    }

    /// Replaces the cached provider directory.
    ///
    /// Empty lists are not cached: an empty directory usually means a
    /// degraded fetch, and caching it would pin the degradation for the
    /// whole TTL.
    pub fn set_providers(&self, providers: Arc<Vec<RemoteProvider>>) {
        if providers.is_empty() {
            return;
        }
        self.inner
            .put(BasicDataKey::AllProviders, BasicDataValue::Providers(providers));
    }

    /// Drops every cached directory.
    pub fn clear(&self) {
        self.inner.clear();
    }
}
