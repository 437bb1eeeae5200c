use std::{hash::Hash, num::NonZeroUsize};

use lru::LruCache;

/// A bounded least-recently-used map. Entries leave when capacity is exceeded or when they are
/// evicted explicitly, never behind the owner's back
pub struct Cache<K: Hash + Eq, V> {
    entries: LruCache<K, V>,
}

impl<K: Hash + Eq + Clone, V: Clone> Cache<K, V> {
    /// A capacity of zero is treated as one
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: LruCache::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)),
        }
    }

    /// Marks the entry as recently used
    pub fn get(&mut self, key: &K) -> Option<V> {
        self.entries.get(key).cloned()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains(key)
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.entries.put(key, value);
    }

    pub fn evict(&mut self, key: &K) -> Option<V> {
        self.entries.pop(key)
    }

    /// Evicts every entry for which `keep` returns false
    pub fn retain(&mut self, mut keep: impl FnMut(&K, &V) -> bool) {
        let doomed = self
            .entries
            .iter()
            .filter(|(k, v)| !keep(k, v))
            .map(|(k, _)| k.clone())
            .collect::<Vec<K>>();

        for key in doomed {
            self.entries.pop(&key);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    pub fn keys(&self) -> Vec<K> {
        self.entries.iter().map(|(k, _)| k.clone()).collect()
    }
}

impl<K: Hash + Eq, V> std::fmt::Debug for Cache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("len", &self.entries.len())
            .field("cap", &self.entries.cap())
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn least_recently_used_entry_leaves_first() {
        let mut cache = Cache::new(2);
        cache.insert(1, "a");
        cache.insert(2, "b");
        cache.get(&1);
        cache.insert(3, "c");

        assert!(cache.contains(&1));
        assert!(!cache.contains(&2));
        assert!(cache.contains(&3));
    }

    #[test]
    fn evict_and_retain() {
        let mut cache = Cache::new(8);
        for i in 0..6 {
            cache.insert(i, i * 10);
        }

        assert_eq!(cache.evict(&0), Some(0));
        assert_eq!(cache.evict(&0), None);

        cache.retain(|k, _| k % 2 == 0);

        let mut keys = cache.keys();
        keys.sort_unstable();
        assert_eq!(keys, vec![2, 4]);
    }

    #[test]
    fn zero_capacity_holds_one() {
        let mut cache = Cache::new(0);
        cache.insert("k", 1);
        assert_eq!(cache.capacity(), 1);
        assert_eq!(cache.get(&"k"), Some(1));
    }
}
