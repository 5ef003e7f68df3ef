//! In-process query cache
//!
//! [`MemoryCache`] keeps materialized tables in a map guarded by a
//! `RwLock`. Entries expire after a fixed time to live; an expired entry is
//! dropped when it is looked up, and every insert sweeps all expired entries.

use bulkapi_core::query::ResultTable;
use bulkapi_core::{CacheKey, QueryCache};
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::{trace, warn};

struct Entry {
    table: ResultTable,
    expires_at: Instant,
}

/// Thread-safe in-memory [`QueryCache`] with per-entry expiry
pub struct MemoryCache {
    entries: RwLock<HashMap<CacheKey, Entry>>,
    ttl: Duration,
}

impl MemoryCache {
    /// Cache whose entries stay valid for `ttl`
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Time to live of new entries
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of stored entries, expired ones included
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    /// True if nothing is stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every expired entry
    pub fn purge_expired(&self) {
        let now = Instant::now();
        match self.entries.write() {
            Ok(mut entries) => entries.retain(|_, entry| entry.expires_at > now),
            Err(_) => warn!("query cache lock poisoned; purge skipped"),
        }
    }
}

impl QueryCache for MemoryCache {
    fn get(&self, key: &CacheKey) -> Option<ResultTable> {
        let now = Instant::now();
        {
            let entries = self.entries.read().ok()?;
            match entries.get(key) {
                Some(entry) if entry.expires_at > now => {
                    trace!(key = %key, "cache hit");
                    return Some(entry.table.clone());
                }
                Some(_) => {}
                None => {
                    trace!(key = %key, "cache miss");
                    return None;
                }
            }
        }
        trace!(key = %key, "cache entry expired");
        if let Ok(mut entries) = self.entries.write() {
            if entries.get(key).is_some_and(|e| e.expires_at <= now) {
                entries.remove(key);
            }
        }
        None
    }

    fn put(&self, key: CacheKey, table: ResultTable) {
        let now = Instant::now();
        let expires_at = now + self.ttl;
        match self.entries.write() {
            Ok(mut entries) => {
                entries.retain(|_, entry| entry.expires_at > now);
                entries.insert(key, Entry { table, expires_at });
            }
            Err(_) => warn!("query cache lock poisoned; result not cached"),
        }
    }

    fn invalidate(&self) {
        match self.entries.write() {
            Ok(mut entries) => entries.clear(),
            Err(_) => warn!("query cache lock poisoned; invalidate skipped"),
        }
    }
}

impl std::fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("entries", &self.len())
            .field("ttl", &self.ttl)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bulkapi_core::query::{compile, materialize, QueryOptions};
    use serde_json::json;
    use std::sync::Arc;
    use std::thread;

    fn key(page: usize) -> CacheKey {
        let params = compile(&QueryOptions::new().with_page(page)).unwrap();
        CacheKey::new("http://localhost/api/app/model/query", &params)
    }

    fn table() -> ResultTable {
        let rows: Vec<serde_json::Map<String, serde_json::Value>> =
            serde_json::from_value(json!([{"id": 1}, {"id": 2}])).unwrap();
        materialize(&rows, None)
    }

    #[test]
    fn test_put_get_invalidate() {
        let cache = MemoryCache::new(Duration::from_secs(60));
        assert!(cache.get(&key(1)).is_none());

        cache.put(key(1), table());
        assert_eq!(cache.get(&key(1)), Some(table()));
        assert!(cache.get(&key(2)).is_none());

        cache.invalidate();
        assert!(cache.is_empty());
        assert!(cache.get(&key(1)).is_none());
    }

    #[test]
    fn test_expired_entries_are_dropped() {
        let cache = MemoryCache::new(Duration::ZERO);
        cache.put(key(1), table());
        assert!(cache.get(&key(1)).is_none());
        assert!(cache.is_empty());

        cache.put(key(2), table());
        cache.purge_expired();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_insert_sweeps_expired_entries() {
        let cache = MemoryCache::new(Duration::ZERO);
        for page in 1..=5 {
            cache.put(key(page), table());
        }
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_concurrent_access() {
        let cache = Arc::new(MemoryCache::new(Duration::from_secs(60)));
        let handles: Vec<_> = (1..=8)
            .map(|page| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    cache.put(key(page), table());
                    cache.get(&key(page)).is_some()
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }
        assert_eq!(cache.len(), 8);
    }
}
