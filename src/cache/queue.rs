//! Sharded FIFO cache with per-entry expiry
//!
//! The cache is split into independently locked shards so concurrent
//! readers on different keys do not contend on one lock. Each shard
//! holds a bounded map plus an insertion-order queue; when a shard is
//! full the oldest entry is evicted regardless of how recently it was
//! read. Eviction is by insertion order, not access order: entries
//! are refreshed by re-fetching, never by being read.
//!
//! Entries also carry a time-to-live. An expired entry is treated as
//! absent on read and lazily removed.

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

struct Shard<K, V> {
    entries: HashMap<K, Entry<V>>,
    order: VecDeque<K>,
}

impl<K: Hash + Eq + Clone, V> Shard<K, V> {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
        }
    }
}

/// A sharded, bounded, insertion-ordered cache with entry expiry.
///
/// Values are cloned out on read; callers that cache large values wrap
/// them in `Arc`.
pub struct QueueCache<K, V> {
    shards: Vec<Mutex<Shard<K, V>>>,
    shard_capacity: usize,
    ttl: Duration,
}

impl<K, V> QueueCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Creates a cache with `capacity` total entries spread over
    /// `shard_count` shards, each entry living for `ttl` after insert.
    ///
    /// `shard_count` is clamped to at least 1 and per-shard capacity to
    /// at least 1, so a misconfigured cache degrades to a small cache
    /// rather than a panic.
    pub fn new(capacity: usize, shard_count: usize, ttl: Duration) -> Self {
        let shard_count = shard_count.max(1);
        let shard_capacity = (capacity / shard_count).max(1);

        let shards = (0..shard_count)
            .map(|_| Mutex::new(Shard::with_capacity(shard_capacity)))
            .collect();

        Self {
            shards,
            shard_capacity,
            ttl,
        }
    }

    fn shard_for(&self, key: &K) -> &Mutex<Shard<K, V>> {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        let index = (hasher.finish() as usize) % self.shards.len();
        &self.shards[index]
    }

    fn lock_shard<'a>(
        shard: &'a Mutex<Shard<K, V>>,
    ) -> std::sync::MutexGuard<'a, Shard<K, V>> {
        // A poisoned shard only means a panic happened mid-update; the
        // map itself is still structurally sound.
        match shard.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Inserts a value, evicting the oldest entry in the target shard if
    /// it is full. Re-inserting an existing key replaces the value and
    /// restarts its lifetime but keeps its position in eviction order.
    pub fn put(&self, key: K, value: V) {
        let mut shard = Self::lock_shard(self.shard_for(&key));

        let entry = Entry {
            value,
            inserted_at: Instant::now(),
        };

        if shard.entries.insert(key.clone(), entry).is_none() {
            shard.order.push_back(key);

            while shard.entries.len() > self.shard_capacity {
                match shard.order.pop_front() {
                    Some(oldest) => {
                        shard.entries.remove(&oldest);
                    }
                    None => break,
                }
            }
        }
    }

    /// Returns a clone of the cached value, or `None` if the key is
    /// absent or its entry has expired. Expired entries are removed on
    /// the way out.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut shard = Self::lock_shard(self.shard_for(key));

        let expired = match shard.entries.get(key) {
            Some(entry) => entry.inserted_at.elapsed() >= self.ttl,
            None => return None,
        };

        if expired {
            shard.entries.remove(key);
            shard.order.retain(|k| k != key);
            return None;
        }

        shard.entries.get(key).map(|entry| entry.value.clone())
    }

    /// Removes a single entry.
    pub fn remove(&self, key: &K) {
        let mut shard = Self::lock_shard(self.shard_for(key));
        if shard.entries.remove(key).is_some() {
            shard.order.retain(|k| k != key);
        }
    }

    /// Drops every entry in every shard.
    pub fn clear(&self) {
        for shard in &self.shards {
            let mut shard = Self::lock_shard(shard);
            shard.entries.clear();
            shard.order.clear();
        }
    }

    /// Number of live entries across all shards. Expired-but-unswept
    /// entries are counted; this is a capacity gauge, not a freshness
    /// gauge.
    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| Self::lock_shard(shard).entries.len())
            .sum()
    }

    /// True when no shard holds any entry.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hour() -> Duration {
        Duration::from_secs(3600)
    }

    #[test]
    fn test_put_get_roundtrip() {
        let cache: QueueCache<String, i32> = QueueCache::new(100, 4, hour());
        cache.put("a".to_string(), 1);
        assert_eq!(cache.get(&"a".to_string()), Some(1));
        assert_eq!(cache.get(&"b".to_string()), None);
    }

    #[test]
    fn test_replacement_keeps_single_entry() {
        let cache: QueueCache<String, i32> = QueueCache::new(100, 1, hour());
        cache.put("a".to_string(), 1);
        cache.put("a".to_string(), 2);
        assert_eq!(cache.get(&"a".to_string()), Some(2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_fifo_eviction_in_insertion_order() {
        // Single shard so eviction order is deterministic
        let cache: QueueCache<i32, i32> = QueueCache::new(3, 1, hour());
        cache.put(1, 10);
        cache.put(2, 20);
        cache.put(3, 30);

        // Reading the oldest entry does not protect it
        assert_eq!(cache.get(&1), Some(10));

        cache.put(4, 40);
        assert_eq!(cache.get(&1), None);
        assert_eq!(cache.get(&2), Some(20));
        assert_eq!(cache.get(&4), Some(40));
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_expired_entry_is_absent() {
        let cache: QueueCache<i32, i32> = QueueCache::new(10, 2, Duration::from_millis(0));
        cache.put(1, 10);
        assert_eq!(cache.get(&1), None);
        // expired entry was swept on read
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_remove_and_clear() {
        let cache: QueueCache<i32, i32> = QueueCache::new(10, 2, hour());
        cache.put(1, 10);
        cache.put(2, 20);

        cache.remove(&1);
        assert_eq!(cache.get(&1), None);
        assert_eq!(cache.get(&2), Some(20));

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_capacity_spread_across_shards() {
        let cache: QueueCache<i32, i32> = QueueCache::new(100, 4, hour());
        for i in 0..100 {
            cache.put(i, i);
        }
        // Total never exceeds configured capacity
        assert!(cache.len() <= 100);
    }

    #[test]
    fn test_degenerate_configuration_does_not_panic() {
        let cache: QueueCache<i32, i32> = QueueCache::new(0, 0, hour());
        cache.put(1, 10);
        assert_eq!(cache.get(&1), Some(10));
    }

    #[test]
    fn test_concurrent_access() {
        use std::sync::Arc;
        use std::thread;

        let cache: Arc<QueueCache<i32, i32>> = Arc::new(QueueCache::new(100, 4, hour()));
        let mut handles = Vec::new();

        for t in 0..4 {
            let cache = Arc::clone(&cache);
            handles.push(thread::spawn(move || {
                for i in 0..25 {
                    let key = t * 25 + i;
                    cache.put(key, key);
                    assert_eq!(cache.get(&key), Some(key));
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }
    }
}
