//! Time-boxed translation result cache

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

use crate::core::models::CacheKey;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Result cache keyed by (text, source, target).
///
/// Every entry shares the same TTL. Expired entries behave as misses and are
/// removed on the lookup that finds them.
#[derive(Debug, Clone)]
pub struct ResultCache {
    entries: Arc<RwLock<HashMap<CacheKey, CacheEntry>>>,
    ttl: Duration,
}

impl ResultCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Look up a cached translation
    pub async fn get(&self, key: &CacheKey) -> Option<String> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if !entry.is_expired(now) => return Some(entry.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        // Re-check under the write lock; a concurrent put may have refreshed it.
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|entry| entry.is_expired(now)) {
            entries.remove(key);
            debug!("Evicted expired cache entry for target {}", key.target_lang);
        }
        None
    }

    /// Store a translation, overwriting any previous value for the key
    pub async fn put(&self, key: CacheKey, value: String) {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + self.ttl,
        };
        self.entries.write().await.insert(key, entry);
    }

    /// Drop every entry
    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        let count = entries.len();
        entries.clear();
        debug!("Cleared {} cache entries", count);
    }

    /// Drop expired entries nobody has looked up
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::TranslationRequest;

    fn key(text: &str) -> CacheKey {
        TranslationRequest::new(text, "es").with_source_lang("en").cache_key()
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_returns_stored_value() {
        let cache = ResultCache::new(Duration::from_secs(3600));
        assert_eq!(cache.get(&key("hello")).await, None);

        cache.put(key("hello"), "hola".to_string()).await;
        assert_eq!(cache.get(&key("hello")).await.as_deref(), Some("hola"));

        cache.put(key("hello"), "buenas".to_string()).await;
        assert_eq!(cache.get(&key("hello")).await.as_deref(), Some("buenas"));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_is_a_miss_and_removed() {
        let cache = ResultCache::new(Duration::from_secs(60));
        cache.put(key("hello"), "hola".to_string()).await;

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(cache.get(&key("hello")).await.is_some());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.get(&key("hello")).await, None);
        assert!(cache.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let cache = ResultCache::new(Duration::from_secs(10));
        cache.put(key("a"), "1".to_string()).await;
        tokio::time::advance(Duration::from_secs(5)).await;
        cache.put(key("b"), "2".to_string()).await;
        tokio::time::advance(Duration::from_secs(6)).await;

        assert_eq!(cache.purge_expired().await, 1);
        assert_eq!(cache.len().await, 1);
        assert!(cache.get(&key("b")).await.is_some());
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = ResultCache::new(Duration::from_secs(3600));
        cache.put(key("a"), "1".to_string()).await;
        cache.put(key("b"), "2".to_string()).await;

        cache.clear().await;
        assert!(cache.is_empty().await);
        assert_eq!(cache.get(&key("a")).await, None);
    }
}
