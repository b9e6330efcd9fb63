//! Positive-result caches for revocation and TPP validation outcomes.
//!
//! Only successful outcomes are ever written: a revoked, indeterminate or
//! unauthorized result is re-evaluated on the next request.

use dashmap::DashMap;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone, Copy)]
struct CachedVerdict {
    /// Cached outcome
    value: bool,

    /// When this entry was cached
    cached_at: Instant,
}

impl CachedVerdict {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.cached_at.elapsed() > ttl
    }
}

/// TTL-bounded key to boolean cache, safe for concurrent use
#[derive(Debug)]
pub struct ValidationCache {
    entries: DashMap<String, CachedVerdict>,
    ttl: Duration,
    max_size: usize,
}

impl ValidationCache {
    pub fn new(ttl: Duration, max_size: usize) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            max_size: max_size.max(1),
        }
    }

    /// Cached value, or `None` when absent or expired
    pub fn get(&self, key: &str) -> Option<bool> {
        let (value, expired) = self
            .entries
            .get(key)
            .map(|entry| (entry.value, entry.is_expired(self.ttl)))?;

        if expired {
            let ttl = self.ttl;
            self.entries.remove_if(key, |_, entry| entry.is_expired(ttl));
            return None;
        }
        Some(value)
    }

    /// Store a value; last writer wins.
    ///
    /// Eviction runs after the insert, so concurrent writers settle back to
    /// `max_size` instead of each passing a stale length check.
    pub fn put(&self, key: String, value: bool) {
        self.entries.insert(
            key.clone(),
            CachedVerdict {
                value,
                cached_at: Instant::now(),
            },
        );
        if self.entries.len() > self.max_size {
            self.evict(&key);
        }
    }

    // Expired entries first, then arbitrary ones other than `keep`
    fn evict(&self, keep: &str) {
        let ttl = self.ttl;
        self.entries
            .retain(|key, entry| key == keep || !entry.is_expired(ttl));

        while self.entries.len() > self.max_size {
            let victim = self
                .entries
                .iter()
                .find(|entry| entry.key() != keep)
                .map(|entry| entry.key().clone());
            let Some(key) = victim else { break };
            debug!(cache_key = %key, "Evicting cache entry");
            self.entries.remove(&key);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

/// Certificates that passed revocation checking, keyed by thumbprint
#[derive(Debug)]
pub struct CertificateRevocationCache {
    inner: ValidationCache,
}

impl CertificateRevocationCache {
    pub fn new(ttl: Duration, max_size: usize) -> Self {
        Self {
            inner: ValidationCache::new(ttl, max_size),
        }
    }

    /// `true` when the certificate is known not to be revoked
    pub fn is_known_good(&self, thumbprint: &str) -> bool {
        self.inner.get(thumbprint).unwrap_or(false)
    }

    pub fn remember_not_revoked(&self, thumbprint: &str) {
        self.inner.put(thumbprint.to_string(), true);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn clear(&self) {
        self.inner.clear();
    }
}

/// TPP authorization results, keyed by the validation service's cache key
#[derive(Debug)]
pub struct TppValidationCache {
    inner: ValidationCache,
}

impl TppValidationCache {
    pub fn new(ttl: Duration, max_size: usize) -> Self {
        Self {
            inner: ValidationCache::new(ttl, max_size),
        }
    }

    pub fn is_known_authorized(&self, cache_key: &str) -> bool {
        self.inner.get(cache_key).unwrap_or(false)
    }

    pub fn remember_authorized(&self, cache_key: &str) {
        self.inner.put(cache_key.to_string(), true);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn clear(&self) {
        self.inner.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_get_and_put() {
        let cache = ValidationCache::new(Duration::from_secs(60), 10);
        assert_eq!(cache.get("a"), None);

        cache.put("a".to_string(), true);
        cache.put("b".to_string(), false);
        assert_eq!(cache.get("a"), Some(true));
        assert_eq!(cache.get("b"), Some(false));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_entries_expire() {
        let cache = ValidationCache::new(Duration::from_millis(50), 10);
        cache.put("a".to_string(), true);

        std::thread::sleep(Duration::from_millis(80));
        assert_eq!(cache.get("a"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_capacity_is_bounded() {
        let cache = ValidationCache::new(Duration::from_secs(60), 2);
        cache.put("a".to_string(), true);
        cache.put("b".to_string(), true);
        cache.put("c".to_string(), true);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("c"), Some(true));
    }

    #[test]
    fn test_capacity_holds_under_concurrent_inserts() {
        let cache = Arc::new(ValidationCache::new(Duration::from_secs(60), 16));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    for j in 0..100 {
                        cache.put(format!("key-{i}-{j}"), true);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert!(cache.len() <= 16);
    }

    #[test]
    fn test_revocation_cache_only_answers_positively() {
        let cache = CertificateRevocationCache::new(Duration::from_secs(60), 10);
        assert!(!cache.is_known_good("thumb"));

        cache.remember_not_revoked("thumb");
        assert!(cache.is_known_good("thumb"));
    }

    #[test]
    fn test_concurrent_writers() {
        let cache = Arc::new(TppValidationCache::new(Duration::from_secs(60), 1000));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    for j in 0..50 {
                        cache.remember_authorized(&format!("key-{i}-{j}"));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.len(), 400);
        assert!(cache.is_known_authorized("key-3-49"));
    }
}
