//! In-memory cache with a fixed time-to-live.
//!
//! Entries are keyed by their exact input (normalized address string,
//! coordinate bits) and are never mutated in place: [`TtlCache::insert`]
//! replaces the whole entry. Expired entries read as misses and are
//! dropped on the next write.

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
}

/// A thread-safe map whose entries expire `ttl` after insertion.
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: RwLock<BTreeMap<K, CacheEntry<V>>>,
}

impl<K: Ord, V: Clone> TtlCache<K, V> {
    /// Creates an empty cache. A zero `ttl` disables caching.
    #[must_use]
    pub const fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns a clone of the live value for `key`, if any.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(key)
            .filter(|entry| entry.stored_at.elapsed() < self.ttl)
            .map(|entry| entry.value.clone())
    }

    /// Stores `value` under `key`, replacing any previous entry.
    pub fn insert(&self, key: K, value: V) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let ttl = self.ttl;
        entries.retain(|_, entry| entry.stored_at.elapsed() < ttl);
        entries.insert(
            key,
            CacheEntry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|entry| entry.stored_at.elapsed() < self.ttl)
            .count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_inserted_value() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.insert("700 River Terminal Rd".to_string(), Some(1));
        assert_eq!(cache.get("700 River Terminal Rd"), Some(Some(1)));
        assert_eq!(cache.get("5401 School Dr"), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn insert_replaces_entry() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.insert(1_u8, "a");
        cache.insert(1_u8, "b");
        assert_eq!(cache.get(&1), Some("b"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn zero_ttl_never_hits() {
        let cache = TtlCache::new(Duration::ZERO);
        cache.insert(1_u8, "a");
        assert_eq!(cache.get(&1), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn clear_drops_everything() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.insert(1_u8, 1);
        cache.insert(2_u8, 2);
        cache.clear();
        assert!(cache.is_empty());
    }
}
