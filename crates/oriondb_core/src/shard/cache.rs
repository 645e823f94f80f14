//! Bounded LRU cache of decoded shards.

use crate::shard::name::ShardName;
use oriondb_codec::Record;
use std::collections::HashMap;
use std::sync::Arc;

/// Decoded shard content as shared between the cache and its readers.
///
/// Readers hold an `Arc` so an eviction never invalidates a slice someone is
/// still scanning.
pub type ShardData = Arc<Vec<Record>>;

struct Entry {
    key: ShardName,
    value: ShardData,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Least-recently-used cache from shard name to decoded shard content.
///
/// Entries live in a slab and are threaded onto an intrusive list, most
/// recently used at the head. A capacity of zero turns every operation into
/// a no-op.
pub struct ShardCache {
    capacity: usize,
    map: HashMap<ShardName, usize>,
    entries: Vec<Option<Entry>>,
    free_list: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
}

impl ShardCache {
    /// Creates an empty cache holding at most `capacity` shards.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            map: HashMap::with_capacity(capacity),
            entries: Vec::with_capacity(capacity),
            free_list: Vec::new(),
            head: None,
            tail: None,
        }
    }

    /// Looks a shard up and marks it most recently used.
    pub fn get(&mut self, key: &ShardName) -> Option<ShardData> {
        let index = *self.map.get(key)?;
        self.move_to_front(index);
        self.entries[index].as_ref().map(|e| Arc::clone(&e.value))
    }

    /// Inserts or refreshes a shard.
    ///
    /// Refreshing an existing key replaces its content and recency without
    /// growing the cache. Adding a new key at capacity evicts the least
    /// recently used shard, which is returned.
    pub fn put(&mut self, key: ShardName, value: ShardData) -> Option<ShardName> {
        if self.capacity == 0 {
            return None;
        }

        if let Some(&index) = self.map.get(&key) {
            if let Some(entry) = &mut self.entries[index] {
                entry.value = value;
            }
            self.move_to_front(index);
            return None;
        }

        let evicted = if self.map.len() >= self.capacity {
            self.evict()
        } else {
            None
        };

        let index = self.allocate(key.clone(), value);
        self.map.insert(key, index);
        self.push_front(index);
        evicted
    }

    /// Drops a shard from the cache, returning its content if it was cached.
    pub fn invalidate(&mut self, key: &ShardName) -> Option<ShardData> {
        let index = self.map.remove(key)?;
        self.unlink(index);
        let entry = self.entries[index].take();
        self.free_list.push(index);
        entry.map(|e| e.value)
    }

    /// Returns true if the shard is cached. Does not affect recency.
    pub fn contains(&self, key: &ShardName) -> bool {
        self.map.contains_key(key)
    }

    /// Number of cached shards.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Maximum number of cached shards.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Empties the cache.
    pub fn clear(&mut self) {
        self.map.clear();
        self.entries.clear();
        self.free_list.clear();
        self.head = None;
        self.tail = None;
    }

    /// Cached shard names, most recently used first.
    pub fn keys_by_recency(&self) -> Vec<ShardName> {
        let mut keys = Vec::with_capacity(self.map.len());
        let mut cursor = self.head;
        while let Some(index) = cursor {
            let Some(entry) = &self.entries[index] else {
                break;
            };
            keys.push(entry.key.clone());
            cursor = entry.next;
        }
        keys
    }

    fn allocate(&mut self, key: ShardName, value: ShardData) -> usize {
        let entry = Entry {
            key,
            value,
            prev: None,
            next: None,
        };
        if let Some(index) = self.free_list.pop() {
            self.entries[index] = Some(entry);
            index
        } else {
            self.entries.push(Some(entry));
            self.entries.len() - 1
        }
    }

    fn push_front(&mut self, index: usize) {
        if let Some(entry) = &mut self.entries[index] {
            entry.prev = None;
            entry.next = self.head;
        }
        if let Some(old_head) = self.head {
            if let Some(entry) = &mut self.entries[old_head] {
                entry.prev = Some(index);
            }
        }
        self.head = Some(index);
        if self.tail.is_none() {
            self.tail = Some(index);
        }
    }

    fn unlink(&mut self, index: usize) {
        let Some((prev, next)) = self.entries[index].as_ref().map(|e| (e.prev, e.next)) else {
            return;
        };

        match prev {
            Some(p) => {
                if let Some(entry) = &mut self.entries[p] {
                    entry.next = next;
                }
            }
            None => self.head = next,
        }
        match next {
            Some(n) => {
                if let Some(entry) = &mut self.entries[n] {
                    entry.prev = prev;
                }
            }
            None => self.tail = prev,
        }
    }

    fn move_to_front(&mut self, index: usize) {
        if self.head == Some(index) {
            return;
        }
        self.unlink(index);
        self.push_front(index);
    }

    fn evict(&mut self) -> Option<ShardName> {
        let tail = self.tail?;
        let key = self.entries[tail].as_ref()?.key.clone();
        self.invalidate(&key);
        tracing::trace!(shard = %key, "evicted shard from cache");
        Some(key)
    }
}

impl std::fmt::Debug for ShardCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShardCache")
            .field("capacity", &self.capacity)
            .field("keys", &self.keys_by_recency())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oriondb_codec::record;
    use proptest::prelude::*;

    fn shard(n: u64) -> ShardName {
        ShardName::for_index(n)
    }

    fn data(id: i64) -> ShardData {
        Arc::new(vec![record! { "id" => id }])
    }

    #[test]
    fn get_and_put() {
        let mut cache = ShardCache::new(3);
        assert!(cache.get(&shard(1)).is_none());

        cache.put(shard(1), data(1));
        assert_eq!(cache.get(&shard(1)).unwrap()[0], record! { "id" => 1 });
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn evicts_least_recently_used() {
        let mut cache = ShardCache::new(2);
        cache.put(shard(1), data(1));
        cache.put(shard(2), data(2));

        // Touch 1 so 2 becomes the eviction candidate.
        cache.get(&shard(1));
        let evicted = cache.put(shard(3), data(3));

        assert_eq!(evicted, Some(shard(2)));
        assert!(cache.contains(&shard(1)));
        assert!(!cache.contains(&shard(2)));
        assert_eq!(cache.keys_by_recency(), vec![shard(3), shard(1)]);
    }

    #[test]
    fn refresh_does_not_grow() {
        let mut cache = ShardCache::new(2);
        cache.put(shard(1), data(1));
        cache.put(shard(2), data(2));
        assert_eq!(cache.put(shard(1), data(10)), None);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.keys_by_recency(), vec![shard(1), shard(2)]);
        assert_eq!(cache.get(&shard(1)).unwrap()[0], record! { "id" => 10 });
    }

    #[test]
    fn invalidate_frees_slot() {
        let mut cache = ShardCache::new(2);
        cache.put(shard(1), data(1));
        cache.put(shard(2), data(2));

        assert!(cache.invalidate(&shard(1)).is_some());
        assert!(cache.invalidate(&shard(1)).is_none());
        assert_eq!(cache.put(shard(3), data(3)), None);
        assert_eq!(cache.keys_by_recency(), vec![shard(3), shard(2)]);
    }

    #[test]
    fn zero_capacity_caches_nothing() {
        let mut cache = ShardCache::new(0);
        assert_eq!(cache.put(shard(1), data(1)), None);
        assert!(cache.is_empty());
        assert!(cache.get(&shard(1)).is_none());
    }

    #[test]
    fn readers_survive_eviction() {
        let mut cache = ShardCache::new(1);
        cache.put(shard(1), data(1));
        let held = cache.get(&shard(1)).unwrap();

        cache.put(shard(2), data(2));
        assert!(!cache.contains(&shard(1)));
        assert_eq!(held.len(), 1);
    }

    #[test]
    fn clear_resets() {
        let mut cache = ShardCache::new(4);
        for n in 1..=4 {
            cache.put(shard(n), data(n as i64));
        }
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.keys_by_recency().is_empty());
        assert_eq!(cache.capacity(), 4);
    }

    #[test]
    fn never_exceeds_capacity() {
        let mut cache = ShardCache::new(3);
        for n in 1..=20 {
            cache.put(shard(n), data(n as i64));
            cache.get(&shard(n / 2 + 1));
            assert!(cache.len() <= 3);
        }
        assert_eq!(cache.keys_by_recency().len(), cache.len());
    }

    #[derive(Debug, Clone)]
    enum CacheOp {
        Get(u64),
        Put(u64),
    }

    fn cache_op() -> impl Strategy<Value = CacheOp> {
        prop_oneof![
            (1u64..8).prop_map(CacheOp::Get),
            (1u64..8).prop_map(CacheOp::Put),
        ]
    }

    proptest! {
        #[test]
        fn agrees_with_reference_lru(
            capacity in 0usize..5,
            ops in prop::collection::vec(cache_op(), 0..64),
        ) {
            let mut cache = ShardCache::new(capacity);
            // Most recently used first.
            let mut model: Vec<ShardName> = Vec::new();

            for op in ops {
                match op {
                    CacheOp::Get(n) => {
                        let key = shard(n);
                        let hit = cache.get(&key).map(|d| d[0].clone());
                        let position = model.iter().position(|k| *k == key);
                        prop_assert_eq!(hit, position.map(|_| record! { "id" => n as i64 }));
                        if let Some(position) = position {
                            let key = model.remove(position);
                            model.insert(0, key);
                        }
                    }
                    CacheOp::Put(n) => {
                        let key = shard(n);
                        let evicted = cache.put(key.clone(), data(n as i64));
                        let mut expected = None;
                        if capacity > 0 {
                            if let Some(position) = model.iter().position(|k| *k == key) {
                                model.remove(position);
                            } else if model.len() >= capacity {
                                expected = model.pop();
                            }
                            model.insert(0, key);
                        }
                        prop_assert_eq!(evicted, expected);
                    }
                }
                prop_assert!(cache.len() <= capacity);
                prop_assert_eq!(cache.keys_by_recency(), model.clone());
            }
        }
    }
}
