//! Integration tests for the caching layer's observable guarantees

use meridian::cache::{QueueCache, SegmentedAccessCache};
use meridian::config::CacheConfig;
use meridian::domain::ids::{FacilityId, PatientId, ProviderId};
use meridian::domain::keys::AccessScope;
use meridian::domain::records::RemoteNote;
use std::sync::Arc;
use std::time::Duration;

fn scope(facility: i32, provider: &str, patient: i32) -> AccessScope {
    AccessScope::new(
        FacilityId(facility),
        ProviderId::new(provider).unwrap(),
        PatientId(patient),
    )
}

#[test]
fn test_two_providers_never_share_a_cache_slot() {
    let cache = SegmentedAccessCache::new(&CacheConfig::default());

    let viewer_a = scope(3, "10023", 500);
    let viewer_b = scope(3, "20555", 500);

    let notes: Arc<Vec<RemoteNote>> = Arc::new(vec![]);
    cache.put(&viewer_a, Arc::clone(&notes));

    // Same patient, same facility, different provider: each viewer only
    // ever sees what was fetched under their own access rights.
    assert!(cache.get::<Vec<RemoteNote>>(&viewer_a).is_some());
    assert!(cache.get::<Vec<RemoteNote>>(&viewer_b).is_none());

    cache.put(&viewer_b, Arc::<Vec<RemoteNote>>::new(vec![]));
    assert!(cache.get::<Vec<RemoteNote>>(&viewer_b).is_some());

    // Populating B did not disturb A's entry
    assert!(cache.get::<Vec<RemoteNote>>(&viewer_a).is_some());
}

#[test]
fn test_entries_expire_after_ttl() {
    let cache: QueueCache<i32, i32> = QueueCache::new(10, 2, Duration::from_millis(30));

    cache.put(1, 10);
    assert_eq!(cache.get(&1), Some(10));

    std::thread::sleep(Duration::from_millis(40));
    assert_eq!(cache.get(&1), None);
}

#[test]
fn test_capacity_overflow_evicts_exactly_the_oldest() {
    // Single shard so insertion order is the eviction order
    let cache: QueueCache<i32, &str> = QueueCache::new(3, 1, Duration::from_secs(3600));

    cache.put(1, "first");
    cache.put(2, "second");
    cache.put(3, "third");
    cache.put(4, "fourth");

    assert_eq!(cache.get(&1), None);
    assert_eq!(cache.get(&2), Some("second"));
    assert_eq!(cache.get(&3), Some("third"));
    assert_eq!(cache.get(&4), Some("fourth"));
}

#[test]
fn test_reads_do_not_protect_from_eviction() {
    let cache: QueueCache<i32, &str> = QueueCache::new(2, 1, Duration::from_secs(3600));

    cache.put(1, "first");
    cache.put(2, "second");

    // Heavy use of the oldest entry
    for _ in 0..10 {
        assert_eq!(cache.get(&1), Some("first"));
    }

    // It is still the one evicted
    cache.put(3, "third");
    assert_eq!(cache.get(&1), None);
    assert_eq!(cache.get(&2), Some("second"));
}

#[test]
fn test_replacement_keeps_eviction_position() {
    let cache: QueueCache<i32, &str> = QueueCache::new(2, 1, Duration::from_secs(3600));

    cache.put(1, "first");
    cache.put(2, "second");

    // Refreshing key 1 replaces its value but not its queue position
    cache.put(1, "first-refreshed");

    cache.put(3, "third");
    assert_eq!(cache.get(&1), None);
    assert_eq!(cache.get(&2), Some("second"));
    assert_eq!(cache.get(&3), Some("third"));
}
