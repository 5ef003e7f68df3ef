//! Query result caching contract.
//!
//! The core never caches anything itself. It only derives a deterministic
//! key from compiled parameters; a [`QueryCache`] implementation supplied by
//! the caller stores tables under that key.

use crate::query::{QueryParams, ResultTable};
use crc32fast::Hasher;
use std::fmt;

/// Deterministic cache key for one query against one endpoint
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    canonical: String,
    fingerprint: u32,
}

impl CacheKey {
    /// Key for `params` sent to `endpoint`
    pub fn new(endpoint: &str, params: &QueryParams) -> Self {
        let canonical = format!("{} {}", endpoint, params.canonical_string());
        let mut hasher = Hasher::new();
        hasher.update(canonical.as_bytes());
        Self {
            fingerprint: hasher.finalize(),
            canonical,
        }
    }

    /// Endpoint followed by the canonical JSON of the parameters
    pub fn as_str(&self) -> &str {
        &self.canonical
    }

    /// CRC32 of the canonical form
    pub fn fingerprint(&self) -> u32 {
        self.fingerprint
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.fingerprint)
    }
}

/// Storage for materialized query results
pub trait QueryCache: Send + Sync {
    /// Cached table for `key`, if present and still valid
    fn get(&self, key: &CacheKey) -> Option<ResultTable>;

    /// Store `table` under `key`
    fn put(&self, key: CacheKey, table: ResultTable);

    /// Drop every entry
    fn invalidate(&self);
}
