//! In-memory parse memoization.
//!
//! A bounded key-value memo with deliberately simple semantics: entries are
//! inserted until the capacity cap is reached, after which `put` becomes a
//! silent no-op until an explicit `clear`. There is no eviction and no TTL.
//! The cache is best-effort memoization, not a source of truth.

use crate::language::ModelSize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Mutex;

/// Result of a cache clear request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearOutcome {
    /// Cache was active; `removed` entries were dropped.
    Cleared { removed: usize },
    /// Caching is not enabled; nothing to clear.
    Disabled,
}

/// Bounded memoization cache shared across request handlers.
///
/// Concurrent access is serialized through a mutex, which also closes the
/// insert race near the capacity boundary.
pub struct ParseCache<V> {
    entries: Option<Mutex<HashMap<String, V>>>,
    capacity: usize,
}

impl<V: Clone> ParseCache<V> {
    /// Create a cache; a disabled cache never stores and always misses.
    pub fn new(enabled: bool, capacity: usize) -> Self {
        Self {
            entries: enabled.then(|| Mutex::new(HashMap::new())),
            capacity,
        }
    }

    /// Digest key over the `(text, language, size)` triple.
    ///
    /// NUL separators keep distinct triples from concatenating to the same
    /// byte stream.
    pub fn key(text: &str, language: &str, size: ModelSize) -> String {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        hasher.update([0]);
        hasher.update(language.as_bytes());
        hasher.update([0]);
        hasher.update(size.as_str().as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn is_enabled(&self) -> bool {
        self.entries.is_some()
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let entries = self.entries.as_ref()?;
        entries.lock().expect("cache lock poisoned").get(key).cloned()
    }

    /// Insert unless disabled or already at capacity.
    pub fn put(&self, key: String, value: V) {
        if let Some(entries) = &self.entries {
            let mut entries = entries.lock().expect("cache lock poisoned");
            if entries.len() < self.capacity {
                entries.insert(key, value);
            }
        }
    }

    pub fn clear(&self) -> ClearOutcome {
        match &self.entries {
            Some(entries) => {
                let mut entries = entries.lock().expect("cache lock poisoned");
                let removed = entries.len();
                entries.clear();
                ClearOutcome::Cleared { removed }
            }
            None => ClearOutcome::Disabled,
        }
    }

    pub fn len(&self) -> usize {
        self.entries
            .as_ref()
            .map(|entries| entries.lock().expect("cache lock poisoned").len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_deterministic_and_distinct() {
        let a = ParseCache::<u32>::key("Berlin", "de", ModelSize::Sm);
        let b = ParseCache::<u32>::key("Berlin", "de", ModelSize::Sm);
        assert_eq!(a, b);

        assert_ne!(a, ParseCache::<u32>::key("Berlin", "de", ModelSize::Lg));
        assert_ne!(a, ParseCache::<u32>::key("Berlin", "en", ModelSize::Sm));
        assert_ne!(a, ParseCache::<u32>::key("Berlim", "de", ModelSize::Sm));
    }

    #[test]
    fn test_separator_prevents_concat_collisions() {
        let a = ParseCache::<u32>::key("ab", "c", ModelSize::Sm);
        let b = ParseCache::<u32>::key("a", "bc", ModelSize::Sm);
        assert_ne!(a, b);
    }

    #[test]
    fn test_roundtrip() {
        let cache = ParseCache::new(true, 10);
        cache.put("k1".into(), 7u32);
        assert_eq!(cache.get("k1"), Some(7));
        assert_eq!(cache.get("k2"), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_capacity_cap_is_silent() {
        let cache = ParseCache::new(true, 2);
        cache.put("a".into(), 1u32);
        cache.put("b".into(), 2u32);
        cache.put("c".into(), 3u32);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("c"), None);
        // Existing entries are untouched.
        assert_eq!(cache.get("a"), Some(1));
        assert_eq!(cache.get("b"), Some(2));
    }

    #[test]
    fn test_clear_makes_room_again() {
        let cache = ParseCache::new(true, 1);
        cache.put("a".into(), 1u32);
        cache.put("b".into(), 2u32);
        assert_eq!(cache.clear(), ClearOutcome::Cleared { removed: 1 });
        cache.put("b".into(), 2u32);
        assert_eq!(cache.get("b"), Some(2));
    }

    #[test]
    fn test_disabled_cache() {
        let cache = ParseCache::new(false, 10);
        assert!(!cache.is_enabled());
        cache.put("a".into(), 1u32);
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.clear(), ClearOutcome::Disabled);
    }
}
