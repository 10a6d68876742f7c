use super::{AdvCountResponse, ApiError, Backend, SearchResponse};
use crate::expression::SearchExpression;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Default number of cached lookups (columns, tags and per-field choices).
const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CacheKey {
    Columns,
    Tags,
    SupportedChoices,
    Choices { column: String, max: usize },
}

struct Entry {
    fetched_at: Instant,
    values: Vec<String>,
}

/// Backend wrapper that revalidates metadata lookups after `ttl`.
///
/// Only list lookups are cached. Searches and counts always go to the
/// wrapped backend. Failed lookups are not cached.
pub struct CachedBackend<B> {
    inner: B,
    ttl: Duration,
    cache: Mutex<LruCache<CacheKey, Entry>>,
}

impl<B: Backend> CachedBackend<B> {
    pub fn new(inner: B, ttl: Duration) -> Self {
        Self::with_capacity(inner, ttl, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(inner: B, ttl: Duration, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            ttl,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }

    /// Drop every cached lookup.
    pub fn invalidate(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<CacheKey, Entry>> {
        match self.cache.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn get_or_load<F>(&self, key: CacheKey, loader: F) -> Result<Vec<String>, ApiError>
    where
        F: FnOnce(&B) -> Result<Vec<String>, ApiError>,
    {
        {
            let mut cache = self.lock();
            if let Some(entry) = cache.get(&key) {
                if entry.fetched_at.elapsed() < self.ttl {
                    return Ok(entry.values.clone());
                }
            }
            cache.pop(&key);
        }

        // Lock is released while the request runs.
        let values = loader(&self.inner)?;
        self.lock().put(
            key,
            Entry {
                fetched_at: Instant::now(),
                values: values.clone(),
            },
        );
        Ok(values)
    }
}

impl<B: Backend> Backend for CachedBackend<B> {
    fn columns(&self) -> Result<Vec<String>, ApiError> {
        self.get_or_load(CacheKey::Columns, |b| b.columns())
    }

    fn tags(&self) -> Result<Vec<String>, ApiError> {
        self.get_or_load(CacheKey::Tags, |b| b.tags())
    }

    fn search(
        &self,
        expression: &SearchExpression,
        page: usize,
        size: usize,
    ) -> Result<SearchResponse, ApiError> {
        self.inner.search(expression, page, size)
    }

    fn count(&self, query: &SearchExpression) -> Result<u64, ApiError> {
        self.inner.count(query)
    }

    fn adv_count(
        &self,
        query: &SearchExpression,
        limit: usize,
    ) -> Result<AdvCountResponse, ApiError> {
        self.inner.adv_count(query, limit)
    }

    fn field_choices(&self, column: &str, max_choices: usize) -> Result<Vec<String>, ApiError> {
        let key = CacheKey::Choices {
            column: column.to_string(),
            max: max_choices,
        };
        self.get_or_load(key, |b| b.field_choices(column, max_choices))
    }

    fn supported_field_choices(&self) -> Result<Vec<String>, ApiError> {
        self.get_or_load(CacheKey::SupportedChoices, |b| b.supported_field_choices())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockBackend;

    #[test]
    fn test_columns_fetched_once_within_ttl() {
        let cached = CachedBackend::new(MockBackend::new(), Duration::from_secs(300));
        assert_eq!(cached.columns().unwrap(), cached.columns().unwrap());
        assert_eq!(cached.inner().calls("columns"), 1);
    }

    #[test]
    fn test_zero_ttl_always_revalidates() {
        let cached = CachedBackend::new(MockBackend::new(), Duration::ZERO);
        cached.columns().unwrap();
        cached.columns().unwrap();
        assert_eq!(cached.inner().calls("columns"), 2);
    }

    #[test]
    fn test_choices_cached_per_column() {
        let cached = CachedBackend::new(MockBackend::new(), Duration::from_secs(300));
        cached.field_choices("action", 20).unwrap();
        cached.field_choices("action", 20).unwrap();
        cached.field_choices("tags", 20).unwrap();
        assert_eq!(cached.inner().calls("field_choices"), 2);
        assert_eq!(cached.len(), 2);
    }

    #[test]
    fn test_failures_not_cached() {
        let mock = MockBackend::new();
        mock.fail_next("tags", ApiError::invalid_data("boom"));
        let cached = CachedBackend::new(mock, Duration::from_secs(300));
        assert!(cached.tags().is_err());
        assert!(cached.tags().is_ok());
        assert_eq!(cached.inner().calls("tags"), 2);
    }

    #[test]
    fn test_searches_bypass_cache() {
        let cached = CachedBackend::new(MockBackend::new(), Duration::from_secs(300));
        cached.search(&SearchExpression::default(), 0, 10).unwrap();
        cached.search(&SearchExpression::default(), 0, 10).unwrap();
        assert_eq!(cached.inner().calls("search"), 2);
        assert!(cached.is_empty());
    }

    #[test]
    fn test_invalidate() {
        let cached = CachedBackend::new(MockBackend::new(), Duration::from_secs(300));
        cached.columns().unwrap();
        cached.invalidate();
        cached.columns().unwrap();
        assert_eq!(cached.inner().calls("columns"), 2);
    }
}
