use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tracing::debug;

/// Keyed read cache.
///
/// Readers see whatever value was stored last; a successful mutation
/// invalidates the keys it affects so the next read goes back to the source.
/// A fetch that overlaps an invalidation returns its value but does not store
/// it, so a value read before a write is never cached after that write.
#[derive(Debug)]
pub struct QueryCache<V> {
    entries: DashMap<String, V>,
    epoch: AtomicU64,
}

impl<V> Default for QueryCache<V> {
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
            epoch: AtomicU64::new(0),
        }
    }
}

impl<V: Clone> QueryCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    pub fn insert(&self, key: impl Into<String>, value: V) {
        self.entries.insert(key.into(), value);
    }

    /// Return the cached value or load it with `fetch`. Errors are not cached.
    pub async fn get_or_fetch<F, Fut, E>(&self, key: &str, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(hit) = self.get(key) {
            return Ok(hit);
        }
        let started = self.epoch.load(Ordering::SeqCst);
        let value = fetch().await?;
        // Checked under the entry's shard lock, which invalidation also takes.
        let entry = self.entries.entry(key.to_string());
        if self.epoch.load(Ordering::SeqCst) == started {
            entry.insert(value.clone());
        } else {
            debug!(key, "invalidated during fetch, not caching");
        }
        Ok(value)
    }

    pub fn invalidate(&self, key: &str) -> bool {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        let removed = self.entries.remove(key).is_some();
        if removed {
            debug!(key, "cache entry invalidated");
        }
        removed
    }

    /// Drop every key starting with `prefix`. Returns how many were removed.
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.starts_with(prefix));
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            debug!(prefix, removed, "cache entries invalidated");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
