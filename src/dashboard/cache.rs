//! Time-boxed memoization of query results keyed on query text

use moka::sync::Cache;
use std::sync::Arc;
use std::time::Duration;

use crate::warehouse::ResultTable;

/// How long results stay fresh unless configured otherwise
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

const MAX_ENTRIES: u64 = 256;

/// Shared cache of immutable query results
#[derive(Clone)]
pub struct QueryCache {
    inner: Cache<String, Arc<ResultTable>>,
    ttl: Duration,
}

impl QueryCache {
    pub fn new(ttl: Duration) -> Self {
        let inner = Cache::builder()
            .max_capacity(MAX_ENTRIES)
            .time_to_live(ttl)
            .build();
        Self { inner, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the cached result for `sql`, or run `fetch` and cache what it
    /// returns. The flag is true on a cache hit. Errors are never cached.
    pub fn get_or_fetch<E>(
        &self,
        sql: &str,
        fetch: impl FnOnce() -> Result<ResultTable, E>,
    ) -> Result<(Arc<ResultTable>, bool), E> {
        if let Some(hit) = self.inner.get(sql) {
            return Ok((hit, true));
        }

        let table = Arc::new(fetch()?);
        self.inner.insert(sql.to_string(), Arc::clone(&table));
        Ok((table, false))
    }

    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn fetch_counting(calls: &Cell<u32>) -> Result<ResultTable, String> {
        calls.set(calls.get() + 1);
        Ok(ResultTable::new(vec!["n".into()], vec![]))
    }

    #[test]
    fn test_hit_within_ttl() {
        let cache = QueryCache::default();
        let calls = Cell::new(0);

        let (_, hit) = cache.get_or_fetch("SELECT 1", || fetch_counting(&calls)).unwrap();
        assert!(!hit);
        let (_, hit) = cache.get_or_fetch("SELECT 1", || fetch_counting(&calls)).unwrap();
        assert!(hit);
        assert_eq!(calls.get(), 1);

        // Different text, different entry
        cache.get_or_fetch("SELECT 2", || fetch_counting(&calls)).unwrap();
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_refetch_after_ttl() {
        let cache = QueryCache::new(Duration::from_millis(50));
        let calls = Cell::new(0);

        cache.get_or_fetch("SELECT 1", || fetch_counting(&calls)).unwrap();
        std::thread::sleep(Duration::from_millis(150));
        let (_, hit) = cache.get_or_fetch("SELECT 1", || fetch_counting(&calls)).unwrap();
        assert!(!hit);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let cache = QueryCache::default();
        let calls = Cell::new(0);

        let failed: Result<_, String> = cache.get_or_fetch("SELECT x", || Err("boom".to_string()));
        assert!(failed.is_err());
        let (_, hit) = cache.get_or_fetch("SELECT x", || fetch_counting(&calls)).unwrap();
        assert!(!hit);
    }

    #[test]
    fn test_invalidate_all() {
        let cache = QueryCache::default();
        let calls = Cell::new(0);
        cache.get_or_fetch("SELECT 1", || fetch_counting(&calls)).unwrap();
        cache.invalidate_all();
        cache.get_or_fetch("SELECT 1", || fetch_counting(&calls)).unwrap();
        assert_eq!(calls.get(), 2);
    }
}
