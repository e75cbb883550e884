//! Local cache tier
//!
//! An in-process mapping from key to value built on a sharded concurrent
//! map. Operations on different keys never block each other; operations
//! on the same key are serialized by the shard lock, so a reader never
//! observes a partially written value.
//!
//! The store is unbounded: no capacity limit, no TTL, no eviction. The
//! remote tier is the durable source of truth and this tier is a
//! best-effort accelerator bounded only by process lifetime.

use dashmap::DashMap;
use std::fmt::Display;
use std::hash::Hash;
use std::sync::Arc;

/// Trait for cache key types
pub trait CacheKey: Display + Hash + Eq + Clone + Send + Sync + 'static {}
impl<T> CacheKey for T where T: Display + Hash + Eq + Clone + Send + Sync + 'static {}

/// Trait for cached value types
pub trait CacheValue: Send + Sync + 'static {}
impl<T> CacheValue for T where T: Send + Sync + 'static {}

/// The local (in-process) cache tier.
///
/// Values are held behind `Arc` so a `get` hands out a cheap handle
/// instead of cloning the payload.
pub struct LocalStore<K, V>
where
    K: CacheKey,
    V: CacheValue,
{
    map: DashMap<K, Arc<V>>,
}

impl<K, V> LocalStore<K, V>
where
    K: CacheKey,
    V: CacheValue,
{
    pub fn new() -> Self {
        Self {
            map: DashMap::new(),
        }
    }

    /// Look up a key, returning a handle to the value if present.
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        self.map.get(key).map(|entry| Arc::clone(entry.value()))
    }

    /// Insert or overwrite the entry for `key`.
    pub fn set(&self, key: K, value: Arc<V>) {
        self.map.insert(key, value);
    }

    /// Remove the entry for `key` if present.
    pub fn remove(&self, key: &K) {
        self.map.remove(key);
    }

    pub fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl<K, V> Default for LocalStore<K, V>
where
    K: CacheKey,
    V: CacheValue,
{
    fn default() -> Self {
        Self::new()
    }
}
