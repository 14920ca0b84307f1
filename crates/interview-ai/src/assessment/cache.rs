//! Bounded TTL memoization shared across sessions.
//!
//! Keys are namespaced by session id, so one session never observes another's values. The
//! cache is an optimization only: a poisoned lock is reported and treated as a miss.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::domain::SessionId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    pub capacity: usize,
    pub ttl_secs: u64,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 100,
            ttl_secs: 300,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub session_id: SessionId,
    pub fingerprint: String,
}

impl CacheKey {
    pub fn new(session_id: &SessionId, fingerprint: String) -> Self {
        Self {
            session_id: session_id.clone(),
            fingerprint,
        }
    }
}

/// SHA-256 over the parts, each length-prefixed so boundaries cannot collide.
pub fn fingerprint<S: AsRef<str>>(parts: &[S]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        let bytes = part.as_ref().as_bytes();
        hasher.update((bytes.len() as u64).to_le_bytes());
        hasher.update(bytes);
    }
    hasher
        .finalize()
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache lock poisoned")]
    Poisoned,
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    created_at: Instant,
    ttl: Duration,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) >= self.ttl
    }
}

#[derive(Debug)]
pub struct ResultCache<V> {
    capacity: usize,
    default_ttl: Duration,
    entries: Mutex<HashMap<CacheKey, CacheEntry<V>>>,
}

impl<V: Clone> ResultCache<V> {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            capacity: config.capacity,
            default_ttl: config.ttl(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    pub fn insert(&self, key: CacheKey, value: V) {
        self.insert_at(key, value, self.default_ttl, Instant::now());
    }

    pub fn insert_with_ttl(&self, key: CacheKey, value: V, ttl: Duration) {
        self.insert_at(key, value, ttl, Instant::now());
    }

    pub fn get_at(&self, key: &CacheKey, now: Instant) -> Option<V> {
        let mut entries = match self.lock() {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(%err, "result cache unavailable, treating as miss");
                return None;
            }
        };

        let expired = entries.get(key)?.is_expired(now);
        if expired {
            entries.remove(key);
            return None;
        }
        entries.get(key).map(|entry| entry.value.clone())
    }

    pub fn insert_at(&self, key: CacheKey, value: V, ttl: Duration, now: Instant) {
        if self.capacity == 0 {
            return;
        }

        let mut entries = match self.lock() {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(%err, "result cache unavailable, skipping insert");
                return;
            }
        };

        entries.insert(
            key,
            CacheEntry {
                value,
                created_at: now,
                ttl,
            },
        );

        if entries.len() > self.capacity {
            entries.retain(|_, entry| !entry.is_expired(now));
        }
        while entries.len() > self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.created_at)
                .map(|(key, _)| key.clone());
            match oldest {
                Some(key) => {
                    entries.remove(&key);
                }
                None => break,
            }
        }
    }

    /// Drop every entry belonging to the session.
    pub fn invalidate_session(&self, session_id: &SessionId) {
        if let Ok(mut entries) = self.lock() {
            entries.retain(|key, _| &key.session_id != session_id);
        }
    }

    pub fn len(&self) -> usize {
        self.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<CacheKey, CacheEntry<V>>>, CacheError> {
        self.entries.lock().map_err(|_| CacheError::Poisoned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(session: &str, fingerprint_part: &str) -> CacheKey {
        CacheKey::new(
            &SessionId(session.to_string()),
            fingerprint(&[fingerprint_part]),
        )
    }

    fn cache(capacity: usize) -> ResultCache<u32> {
        ResultCache::new(&CacheConfig {
            capacity,
            ttl_secs: 60,
        })
    }

    #[test]
    fn expired_entries_are_misses_and_evicted_on_access() {
        let cache = cache(10);
        let start = Instant::now();
        cache.insert_at(key("s1", "a"), 7, Duration::from_secs(5), start);

        assert_eq!(cache.get_at(&key("s1", "a"), start + Duration::from_secs(4)), Some(7));
        assert_eq!(cache.get_at(&key("s1", "a"), start + Duration::from_secs(5)), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn over_capacity_evicts_expired_then_oldest() {
        let cache = cache(2);
        let start = Instant::now();
        cache.insert_at(key("s1", "short"), 1, Duration::from_secs(1), start);
        cache.insert_at(
            key("s1", "old"),
            2,
            Duration::from_secs(60),
            start + Duration::from_secs(1),
        );
        cache.insert_at(
            key("s1", "new"),
            3,
            Duration::from_secs(60),
            start + Duration::from_secs(2),
        );

        let now = start + Duration::from_secs(2);
        assert_eq!(cache.get_at(&key("s1", "short"), now), None);
        assert_eq!(cache.get_at(&key("s1", "old"), now), Some(2));
        assert_eq!(cache.get_at(&key("s1", "new"), now), Some(3));

        cache.insert_at(key("s1", "newest"), 4, Duration::from_secs(60), now);
        assert_eq!(cache.get_at(&key("s1", "old"), now), None);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn keys_are_namespaced_by_session() {
        let cache = cache(10);
        cache.insert(key("s1", "same-input"), 11);

        assert_eq!(cache.get(&key("s2", "same-input")), None);
        assert_eq!(cache.get(&key("s1", "same-input")), Some(11));

        cache.invalidate_session(&SessionId("s1".to_string()));
        assert_eq!(cache.get(&key("s1", "same-input")), None);
    }

    #[test]
    fn fingerprint_is_stable_and_boundary_aware() {
        assert_eq!(fingerprint(&["ab", "c"]), fingerprint(&["ab", "c"]));
        assert_ne!(fingerprint(&["ab", "c"]), fingerprint(&["a", "bc"]));
        assert_eq!(fingerprint(&["x"]).len(), 64);
    }

    #[test]
    fn poisoned_lock_degrades_to_miss() {
        let cache = std::sync::Arc::new(cache(10));
        cache.insert(key("s1", "a"), 1);

        let poisoner = std::sync::Arc::clone(&cache);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.entries.lock().expect("first lock succeeds");
            panic!("poison the cache lock");
        })
        .join();

        assert_eq!(cache.get(&key("s1", "a")), None);
        cache.insert(key("s1", "b"), 2);
        assert_eq!(cache.len(), 0);
    }
}
