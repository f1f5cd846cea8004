//! Content-addressed cache of fetched module sources.
//!
//! Entries are keyed by the hex SHA-256 of the content. A lookup with a
//! validation hash that is already cached skips the fetch entirely; an empty
//! validation string always fetches. Concurrent fetches with the same
//! validation hash wait on a per-hash load lock, so validated content is loaded
//! at most once. The table lock is never held while reading or downloading.
//! Entries are never evicted.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use sha2::{Digest, Sha256};

use crate::error::{ModuleError, ModuleResult};

/// Hex-encoded SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

#[derive(Debug, Default)]
pub struct ModuleCache {
    entries: Mutex<HashMap<String, Arc<str>>>,
    /// One load lock per validation hash seen so far.
    loading: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ModuleCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, hash: &str) -> Option<Arc<str>> {
        self.entries.lock().get(hash).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the content of `name`, loading it with `load` unless `validation`
    /// names a cached entry. Loaded content must hash to `validation` when it is not empty.
    pub fn fetch<F>(&self, name: &str, validation: &str, load: F) -> ModuleResult<Arc<str>>
    where
        F: FnOnce() -> ModuleResult<Vec<u8>>,
    {
        if validation.is_empty() {
            return self.load_and_store(name, validation, load);
        }

        let key = validation.to_ascii_lowercase();
        if let Some(content) = self.get(&key) {
            tracing::debug!(name, "module cache hit");
            return Ok(content);
        }

        let load_lock = self.loading.lock().entry(key.clone()).or_default().clone();
        let _loading = load_lock.lock();

        // Another task may have stored the content while we were waiting.
        if let Some(content) = self.get(&key) {
            tracing::debug!(name, "module cache hit after concurrent load");
            return Ok(content);
        }
        self.load_and_store(name, validation, load)
    }

    fn load_and_store<F>(&self, name: &str, validation: &str, load: F) -> ModuleResult<Arc<str>>
    where
        F: FnOnce() -> ModuleResult<Vec<u8>>,
    {
        let bytes = load()?;
        let hash = sha256_hex(&bytes);
        if !validation.is_empty() && !hash.eq_ignore_ascii_case(validation) {
            return Err(ModuleError::ValidationFailed(name.to_string()));
        }

        let content: Arc<str> = String::from_utf8(bytes)
            .map_err(|_| ModuleError::Retrieval(format!("failed to get {}: content is not valid UTF-8", name)))?
            .into();

        self.entries.lock().insert(hash, content.clone());
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

    #[test]
    fn test_sha256_hex() {
        assert_eq!(sha256_hex(b"hello"), HELLO_SHA256);
    }

    #[test]
    fn test_validated_content_is_loaded_once() {
        let cache = ModuleCache::new();
        let loads = Cell::new(0);
        let load = || {
            loads.set(loads.get() + 1);
            Ok(b"hello".to_vec())
        };

        let first = cache.fetch("/a.ix", HELLO_SHA256, load).unwrap();
        let second = cache.fetch("/a.ix", HELLO_SHA256, load).unwrap();
        assert_eq!(&*first, "hello");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(loads.get(), 1);
    }

    #[test]
    fn test_concurrent_validated_fetches_load_once() {
        let cache = ModuleCache::new();
        let loads = AtomicUsize::new(0);

        let contents: Vec<Arc<str>> = thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    scope.spawn(|| {
                        cache
                            .fetch("https://example.com/d.ix", HELLO_SHA256, || {
                                loads.fetch_add(1, Ordering::SeqCst);
                                thread::sleep(Duration::from_millis(50));
                                Ok(b"hello".to_vec())
                            })
                            .unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert!(contents.iter().all(|c| Arc::ptr_eq(c, &contents[0])));
    }

    #[test]
    fn test_uppercase_validation_hits_the_cache() {
        let cache = ModuleCache::new();
        cache.fetch("/a.ix", HELLO_SHA256, || Ok(b"hello".to_vec())).unwrap();
        let content = cache
            .fetch("/a.ix", &HELLO_SHA256.to_ascii_uppercase(), || panic!("loaded twice"))
            .unwrap();
        assert_eq!(&*content, "hello");
    }

    #[test]
    fn test_empty_validation_always_loads() {
        let cache = ModuleCache::new();
        let loads = Cell::new(0);
        let load = || {
            loads.set(loads.get() + 1);
            Ok(b"hello".to_vec())
        };
        cache.fetch("/a.ix", "", load).unwrap();
        cache.fetch("/a.ix", "", load).unwrap();
        assert_eq!(loads.get(), 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_validation_mismatch() {
        let cache = ModuleCache::new();
        let err = cache
            .fetch("https://example.com/a.ix", "00ff", || Ok(b"hello".to_vec()))
            .unwrap_err();
        assert!(matches!(err, ModuleError::ValidationFailed(_)));
        assert!(cache.is_empty());
    }
}
