use dashmap::DashMap;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Entry stored in the DashMap with an expiry timestamp.
#[derive(Clone)]
pub(crate) struct CacheEntry {
    value: String,
    pub(crate) expires_at: Instant,
}

/// In-memory TTL cache backing both keyspaces of the login flow:
/// `token:*` for the cached upstream access token and `scene:*` for
/// scene records. A single process owns the store; coherency across
/// instances is out of scope.
///
/// Entries are checked on read and evicted lazily. A background sweep
/// can be triggered with `evict_expired()`.
///
/// Writes to the same key are last-write-wins; there is no
/// compare-and-swap, so callers needing conditional transitions get
/// best-effort semantics only.
#[derive(Clone)]
pub struct TtlCache {
    pub(crate) entries: Arc<DashMap<String, CacheEntry>>,
}

impl TtlCache {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
        }
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        if let Some(entry) = self.entries.get(key) {
            if Instant::now() < entry.expires_at {
                return serde_json::from_str(&entry.value).ok();
            }
            // expired — drop the ref before removing
            drop(entry);
            self.entries.remove(key);
        }
        None
    }

    pub fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) -> anyhow::Result<()> {
        let json = serde_json::to_string(value)?;
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                value: json,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    pub fn remove(&self, key: &str) {
        self.entries.remove(key);
    }

    /// Remove all expired entries.  Call this periodically from a
    /// background task (e.g. every 60 s) to bound memory usage.
    pub fn evict_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        before - self.entries.len()
    }

    /// Current number of entries (for metrics / debugging).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for TtlCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_then_get_roundtrip() {
        let cache = TtlCache::new();
        cache
            .set(
                "scene:abc",
                &serde_json::json!({"status": "waiting"}),
                Duration::from_secs(60),
            )
            .unwrap();

        let v: serde_json::Value = cache.get("scene:abc").unwrap();
        assert_eq!(v["status"], "waiting");
    }

    #[test]
    fn test_miss_is_none_not_error() {
        let cache = TtlCache::new();
        let v: Option<String> = cache.get("scene:never-written");
        assert!(v.is_none());
    }

    #[test]
    fn test_expired_entry_is_unreadable() {
        let cache = TtlCache::new();
        cache
            .set("token:app", &"tok".to_string(), Duration::from_millis(0))
            .unwrap();

        std::thread::sleep(Duration::from_millis(5));
        let v: Option<String> = cache.get("token:app");
        assert!(v.is_none());
    }

    #[test]
    fn test_set_overwrites_prior_value() {
        let cache = TtlCache::new();
        cache.set("k", &1u32, Duration::from_secs(60)).unwrap();
        cache.set("k", &2u32, Duration::from_secs(60)).unwrap();
        assert_eq!(cache.get::<u32>("k"), Some(2));
    }

    #[test]
    fn test_evict_expired_removes_only_stale() {
        let cache = TtlCache::new();
        cache.set("stale", &1u32, Duration::from_millis(0)).unwrap();
        cache.set("live", &2u32, Duration::from_secs(60)).unwrap();

        std::thread::sleep(Duration::from_millis(5));
        let evicted = cache.evict_expired();
        assert_eq!(evicted, 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get::<u32>("live"), Some(2));
    }
}
