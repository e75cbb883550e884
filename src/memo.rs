//! Caller-owned memoization cache
//!
//! Memoizes a single function's results by argument. Unlike a
//! process-global table keyed by function name, each memoized function
//! gets its own `Memo` instance owned by the caller, so unrelated
//! functions can never collide on a key and the cache's lifetime is
//! explicit.
//!
//! Unbounded: entries live until `invalidate` or `clear`. Async
//! producers that need miss-coalescing or a durable tier belong in
//! [`TwoTierCache`](crate::TwoTierCache) instead.

use dashmap::DashMap;
use std::hash::Hash;

/// Memoization cache for one function, keyed by its argument.
pub struct Memo<A, R>
where
    A: Hash + Eq + Clone + Send + Sync + 'static,
    R: Clone + Send + Sync + 'static,
{
    cache: DashMap<A, R>,
}

impl<A, R> Memo<A, R>
where
    A: Hash + Eq + Clone + Send + Sync + 'static,
    R: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            cache: DashMap::new(),
        }
    }

    /// Return the cached result for `arg`, computing and storing it with
    /// `f` on first use.
    ///
    /// Concurrent first calls for the same argument may each run `f`;
    /// one result wins the insert.
    pub fn get_or_insert_with<F>(&self, arg: A, f: F) -> R
    where
        F: FnOnce(&A) -> R,
    {
        if let Some(hit) = self.cache.get(&arg) {
            return hit.value().clone();
        }
        let result = f(&arg);
        self.cache.insert(arg, result.clone());
        result
    }

    /// Drop the cached result for `arg`, if any.
    pub fn invalidate(&self, arg: &A) {
        self.cache.remove(arg);
    }

    /// Drop all cached results.
    pub fn clear(&self) {
        self.cache.clear();
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

impl<A, R> Default for Memo<A, R>
where
    A: Hash + Eq + Clone + Send + Sync + 'static,
    R: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
