use dashmap::DashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

pub trait CacheEntry {
    fn stored_at(&self) -> Instant;
}

/// Drop entries older than `max_age`, then the oldest until at most
/// `max_entries` remain. Returns how many entries were removed.
///
/// An entry replaced after the scan started is left alone.
pub fn prune_cache<K, V>(cache: &DashMap<K, V>, max_entries: usize, max_age: Duration) -> usize
where
    K: Clone + Eq + Hash,
    V: CacheEntry,
{
    let now = Instant::now();
    let mut removed = 0;
    let mut entries: Vec<(K, Instant)> = cache
        .iter()
        .map(|entry| (entry.key().clone(), entry.value().stored_at()))
        .collect();

    entries.retain(|(key, stored_at)| {
        if now.duration_since(*stored_at) > max_age {
            if evict_if_unchanged(cache, key, *stored_at) {
                removed += 1;
            }
            false
        } else {
            true
        }
    });

    if cache.len() > max_entries {
        entries.sort_by_key(|(_, stored_at)| *stored_at);
        for (key, stored_at) in entries {
            if cache.len() <= max_entries {
                break;
            }
            if evict_if_unchanged(cache, &key, stored_at) {
                removed += 1;
            }
        }
    }

    removed
}

/// Remove `key` only if it still holds the entry stored at `stored_at`.
fn evict_if_unchanged<K, V>(cache: &DashMap<K, V>, key: &K, stored_at: Instant) -> bool
where
    K: Eq + Hash,
    V: CacheEntry,
{
    cache
        .remove_if(key, |_, value| value.stored_at() == stored_at)
        .is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Entry(Instant);

    impl CacheEntry for Entry {
        fn stored_at(&self) -> Instant {
            self.0
        }
    }

    #[test]
    fn evicts_oldest_beyond_capacity() {
        let cache = DashMap::new();
        let base = Instant::now();
        for i in 0..5u64 {
            cache.insert(i, Entry(base + Duration::from_millis(i)));
        }
        let removed = prune_cache(&cache, 3, Duration::from_secs(3600));
        assert_eq!(removed, 2);
        assert!(!cache.contains_key(&0));
        assert!(!cache.contains_key(&1));
        assert!(cache.contains_key(&4));
    }

    #[test]
    fn evicts_expired_entries() {
        let cache = DashMap::new();
        let now = Instant::now();
        cache.insert("fresh", Entry(now));
        if let Some(old) = now.checked_sub(Duration::from_secs(120)) {
            cache.insert("stale", Entry(old));
            prune_cache(&cache, 10, Duration::from_secs(60));
            assert!(!cache.contains_key("stale"));
        }
        assert!(cache.contains_key("fresh"));
    }

    #[test]
    fn replaced_entries_survive_a_stale_scan() {
        let cache = DashMap::new();
        let scanned_at = Instant::now();
        cache.insert("uav-001", Entry(scanned_at));
        cache.insert("uav-001", Entry(scanned_at + Duration::from_millis(5)));

        assert!(!evict_if_unchanged(&cache, &"uav-001", scanned_at));
        assert!(cache.contains_key("uav-001"));

        let current = cache.get("uav-001").map(|entry| entry.stored_at()).unwrap();
        assert!(evict_if_unchanged(&cache, &"uav-001", current));
        assert!(cache.is_empty());
    }
}
