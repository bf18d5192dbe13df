//! Document Cache
//!
//! Maps absolute resource identifiers to weakly held documents, so
//! resolving several pointers into the same resource parses it once while
//! anything still holds it. The cache never keeps a document alive: a dead
//! entry is a miss, and LRU eviction only drops weak handles.

use crate::dom::XmlDocument;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError, Weak};

/// Entries kept by the process-wide cache
pub const DEFAULT_CACHE_CAPACITY: usize = 64;

const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(DEFAULT_CACHE_CAPACITY) {
    Some(capacity) => capacity,
    None => panic!("document cache capacity must be non-zero"),
};

static GLOBAL: LazyLock<Arc<DocumentCache>> =
    LazyLock::new(|| Arc::new(DocumentCache::new(DEFAULT_CAPACITY)));

/// Identifier → weakly held document
#[derive(Debug)]
pub struct DocumentCache {
    entries: Mutex<LruCache<String, Weak<XmlDocument>>>,
}

impl DocumentCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        DocumentCache {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// The process-wide cache
    pub fn global() -> Arc<DocumentCache> {
        Arc::clone(&GLOBAL)
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, Weak<XmlDocument>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Live document for `uri`. Dead entries are removed.
    pub fn get(&self, uri: &str) -> Option<Arc<XmlDocument>> {
        lookup(&mut self.lock(), uri)
    }

    /// Live document for `uri`, or the result of `materialize`, which is
    /// cached on success. The lock is held while materializing, so one
    /// identifier is never materialized twice concurrently.
    pub fn get_or_materialize<E, F>(&self, uri: &str, materialize: F) -> Result<Arc<XmlDocument>, E>
    where
        F: FnOnce() -> Result<XmlDocument, E>,
    {
        let mut entries = self.lock();
        if let Some(doc) = lookup(&mut entries, uri) {
            tracing::debug!(uri, "document cache hit");
            return Ok(doc);
        }
        tracing::debug!(uri, "document cache miss");
        let doc = Arc::new(materialize()?);
        store(&mut entries, uri, &doc);
        Ok(doc)
    }

    /// Record `doc` under `uri`, replacing any previous entry
    pub fn insert(&self, uri: &str, doc: &Arc<XmlDocument>) {
        store(&mut self.lock(), uri, doc);
    }

    /// Drop entries whose document is gone; returns how many were dropped
    pub fn purge(&self) -> usize {
        let mut entries = self.lock();
        let dead: Vec<String> = entries
            .iter()
            .filter(|(_, weak)| weak.strong_count() == 0)
            .map(|(uri, _)| uri.clone())
            .collect();
        for uri in &dead {
            entries.pop(uri);
        }
        dead.len()
    }

    /// Number of entries whose document is still alive
    pub fn len(&self) -> usize {
        self.lock()
            .iter()
            .filter(|(_, weak)| weak.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn capacity(&self) -> usize {
        self.lock().cap().get()
    }
}

impl Default for DocumentCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

fn lookup(
    entries: &mut LruCache<String, Weak<XmlDocument>>,
    uri: &str,
) -> Option<Arc<XmlDocument>> {
    let weak = entries.get(uri)?;
    match weak.upgrade() {
        Some(doc) => Some(doc),
        None => {
            entries.pop(uri);
            None
        }
    }
}

fn store(entries: &mut LruCache<String, Weak<XmlDocument>>, uri: &str, doc: &Arc<XmlDocument>) {
    if let Some((evicted, _)) = entries.push(uri.to_string(), Arc::downgrade(doc)) {
        if evicted != uri {
            tracing::debug!(uri = %evicted, "document cache eviction");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DocumentError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    fn parse(xml: &str) -> Result<XmlDocument, DocumentError> {
        XmlDocument::parse(xml.as_bytes())
    }

    fn small_cache(capacity: usize) -> DocumentCache {
        DocumentCache::new(NonZeroUsize::new(capacity).unwrap())
    }

    #[test]
    fn test_reuse_while_alive() {
        let cache = DocumentCache::default();
        let first = cache.get_or_materialize("file:///a.xml", || parse("<a/>")).unwrap();
        let second = cache
            .get_or_materialize("file:///a.xml", || -> Result<XmlDocument, DocumentError> {
                panic!("must not materialize twice")
            })
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_rematerialize_after_drop() {
        let cache = DocumentCache::default();
        let doc = cache.get_or_materialize("u", || parse("<a/>")).unwrap();
        drop(doc);
        assert!(cache.get("u").is_none());
        assert!(cache.is_empty());

        let mut calls = 0;
        let doc = cache
            .get_or_materialize("u", || {
                calls += 1;
                parse("<b/>")
            })
            .unwrap();
        assert_eq!(calls, 1);
        assert_eq!(doc.root_name(), Some("b"));
    }

    #[test]
    fn test_concurrent_materialization_runs_once() {
        let cache = &DocumentCache::default();
        let calls = &AtomicUsize::new(0);
        let docs: Vec<Arc<XmlDocument>> = thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(move || {
                        cache
                            .get_or_materialize("file:///shared.xml", || {
                                calls.fetch_add(1, Ordering::SeqCst);
                                thread::sleep(Duration::from_millis(20));
                                parse("<shared/>")
                            })
                            .unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(docs.len(), 8);
        assert!(docs.iter().all(|doc| Arc::ptr_eq(doc, &docs[0])));
    }

    #[test]
    fn test_failed_materialization_is_not_cached() {
        let cache = DocumentCache::default();
        assert!(cache.get_or_materialize("bad", || parse("<a>")).is_err());
        assert!(cache.get("bad").is_none());
    }

    #[test]
    fn test_cache_does_not_own_documents() {
        let cache = DocumentCache::default();
        let doc = Arc::new(parse("<a/>").unwrap());
        cache.insert("x", &doc);
        assert_eq!(Arc::strong_count(&doc), 1);
        assert!(cache.get("x").is_some());
    }

    #[test]
    fn test_purge_and_eviction() {
        let cache = small_cache(2);
        let a = Arc::new(parse("<a/>").unwrap());
        let b = Arc::new(parse("<b/>").unwrap());
        cache.insert("a", &a);
        cache.insert("b", &b);
        drop(b);
        assert_eq!(cache.purge(), 1);
        assert_eq!(cache.len(), 1);

        let c = Arc::new(parse("<c/>").unwrap());
        let d = Arc::new(parse("<d/>").unwrap());
        cache.insert("c", &c);
        cache.insert("d", &d);
        // evicted entry's document stays alive for its owner
        assert!(cache.get("a").is_none());
        assert_eq!(a.root_name(), Some("a"));
        assert_eq!(cache.capacity(), 2);

        cache.clear();
        assert!(cache.is_empty());
    }
}
