//! URI to file entry resolution
//!
//! Resolution walks the storage hierarchy, which can be slow on removable media,
//! so successful lookups are remembered in a small LRU cache keyed by decoded URI.

use crate::error::ServeError;
use crate::storage::FileEntry;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Maximum number of cached resolutions
pub const CACHE_CAPACITY: usize = 100;

struct CacheState {
    entries: LruCache<String, Arc<dyn FileEntry>>,
    /// Set on shutdown; puts are dropped until reopened
    closed: bool,
}

/// Bounded, internally synchronized URI -> entry cache
pub struct FileCache {
    state: Mutex<CacheState>,
}

impl FileCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            state: Mutex::new(CacheState {
                entries: LruCache::new(capacity),
                closed: false,
            }),
        }
    }

    /// Look up `uri`, marking it most recently used
    pub fn get(&self, uri: &str) -> Option<Arc<dyn FileEntry>> {
        self.state.lock().entries.get(uri).cloned()
    }

    /// Insert or refresh `uri`, evicting the least recently used entry when full.
    ///
    /// Returns false when the cache is closed and nothing was stored.
    pub fn put(&self, uri: String, entry: Arc<dyn FileEntry>) -> bool {
        let mut state = self.state.lock();
        if state.closed {
            return false;
        }
        state.entries.put(uri, entry);
        true
    }

    /// Drop every entry and refuse new ones until [`reopen`](Self::reopen)
    pub fn evict_all(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        state.entries.clear();
    }

    pub fn reopen(&self) {
        self.state.lock().closed = false;
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, uri: &str) -> bool {
        self.state.lock().entries.contains(uri)
    }
}

impl std::fmt::Debug for FileCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("FileCache")
            .field("len", &state.entries.len())
            .field("cap", &state.entries.cap())
            .field("closed", &state.closed)
            .finish()
    }
}

/// Maps decoded URIs to servable (non-directory) entries under a root
#[derive(Debug)]
pub struct FileResolver {
    root: Arc<dyn FileEntry>,
    cache: FileCache,
}

impl FileResolver {
    pub fn new(root: Arc<dyn FileEntry>) -> Self {
        Self {
            root,
            cache: FileCache::new(CACHE_CAPACITY),
        }
    }

    pub fn root(&self) -> &Arc<dyn FileEntry> {
        &self.root
    }

    pub const fn cache(&self) -> &FileCache {
        &self.cache
    }

    /// Resolve a decoded request URI. Blocking on a cache miss.
    pub fn resolve(&self, uri: &str) -> Result<Arc<dyn FileEntry>, ServeError> {
        if let Some(entry) = self.cache.get(uri) {
            tracing::debug!(uri, "Using file cache");
            return Ok(entry);
        }

        tracing::debug!(uri, "Searching file on volume");
        let entry = self
            .lookup(uri)?
            .ok_or_else(|| ServeError::NotFound(uri.to_string()))?;

        if entry.is_directory() {
            return Err(ServeError::NotAFile(uri.to_string()));
        }

        self.cache.put(uri.to_string(), Arc::clone(&entry));
        Ok(entry)
    }

    fn lookup(&self, uri: &str) -> Result<Option<Arc<dyn FileEntry>>, ServeError> {
        if !self.root.is_directory() {
            // Single-file root: only "/" and "/<name>" address it
            let named = uri
                .strip_prefix('/')
                .is_some_and(|rest| rest == self.root.name());
            return Ok((uri == "/" || named).then(|| Arc::clone(&self.root)));
        }

        let path = uri.strip_prefix('/').unwrap_or(uri);
        Ok(self.root.search(path)?)
    }

    /// Clear the cache and stop caching; in-flight resolutions still complete
    pub fn shutdown(&self) {
        self.cache.evict_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{EntryReader, MemoryEntry};
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Directory root that counts hierarchy searches and serves any "fileN" name
    #[derive(Debug, Default)]
    struct CountingRoot {
        searches: AtomicUsize,
    }

    impl FileEntry for CountingRoot {
        fn is_directory(&self) -> bool {
            true
        }
        fn name(&self) -> &str {
            "root"
        }
        fn length(&self) -> u64 {
            0
        }
        fn search(&self, path: &str) -> io::Result<Option<Arc<dyn FileEntry>>> {
            self.searches.fetch_add(1, Ordering::SeqCst);
            if path == "broken" {
                return Err(io::Error::other("sector read failed"));
            }
            Ok(path
                .starts_with("file")
                .then(|| Arc::new(MemoryEntry::file(path, "x")) as Arc<dyn FileEntry>))
        }
        fn open(&self) -> io::Result<Box<dyn EntryReader>> {
            Err(io::Error::other("directory"))
        }
    }

    fn counting() -> (Arc<CountingRoot>, FileResolver) {
        let root = Arc::new(CountingRoot::default());
        let resolver = FileResolver::new(Arc::clone(&root) as Arc<dyn FileEntry>);
        (root, resolver)
    }

    fn volume() -> FileResolver {
        FileResolver::new(Arc::new(MemoryEntry::directory(
            "volume",
            vec![
                MemoryEntry::file("video.mp4", vec![0u8; 64]),
                MemoryEntry::directory("folder", vec![MemoryEntry::file("a.txt", "a")]),
            ],
        )))
    }

    #[test]
    fn test_resolves_and_caches() {
        let resolver = volume();
        let first = resolver.resolve("/video.mp4").unwrap();
        assert_eq!(first.name(), "video.mp4");
        assert!(resolver.cache().contains("/video.mp4"));

        let second = resolver.resolve("/video.mp4").unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let nested = resolver.resolve("/folder/a.txt").unwrap();
        assert_eq!(nested.length(), 1);
    }

    #[test]
    fn test_cache_hit_skips_search() {
        let (root, resolver) = counting();
        resolver.resolve("/file1").unwrap();
        resolver.resolve("/file1").unwrap();
        resolver.resolve("/file1").unwrap();
        assert_eq!(root.searches.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_not_found() {
        let resolver = volume();
        assert!(matches!(
            resolver.resolve("/missing.txt"),
            Err(ServeError::NotFound(uri)) if uri == "/missing.txt"
        ));
        assert!(resolver.cache().is_empty());
    }

    #[test]
    fn test_directory_is_not_a_file() {
        let resolver = volume();
        for uri in ["/folder", "/folder/", "/"] {
            assert!(
                matches!(resolver.resolve(uri), Err(ServeError::NotAFile(_))),
                "{uri}"
            );
        }
        assert!(resolver.cache().is_empty());
    }

    #[test]
    fn test_search_error_is_io() {
        let (_, resolver) = counting();
        assert!(matches!(resolver.resolve("/broken"), Err(ServeError::Io(_))));
    }

    #[test]
    fn test_single_file_root() {
        let resolver = FileResolver::new(Arc::new(MemoryEntry::file("movie.mkv", "frames")));
        assert_eq!(resolver.resolve("/").unwrap().name(), "movie.mkv");
        assert_eq!(resolver.resolve("/movie.mkv").unwrap().name(), "movie.mkv");
        assert!(matches!(
            resolver.resolve("/other"),
            Err(ServeError::NotFound(_))
        ));
        assert!(matches!(
            resolver.resolve("/movie.mkv/x"),
            Err(ServeError::NotFound(_))
        ));
    }

    #[test]
    fn test_capacity_and_lru_eviction() {
        let (root, resolver) = counting();
        for i in 0..CACHE_CAPACITY {
            resolver.resolve(&format!("/file{i}")).unwrap();
        }
        assert_eq!(resolver.cache().len(), CACHE_CAPACITY);

        // Touch file0 so file1 becomes least recently used
        resolver.resolve("/file0").unwrap();
        resolver.resolve("/file100").unwrap();

        assert_eq!(resolver.cache().len(), CACHE_CAPACITY);
        assert!(resolver.cache().contains("/file0"));
        assert!(!resolver.cache().contains("/file1"));
        assert!(resolver.cache().contains("/file100"));

        let before = root.searches.load(Ordering::SeqCst);
        resolver.resolve("/file1").unwrap();
        assert_eq!(root.searches.load(Ordering::SeqCst), before + 1);
    }

    #[test]
    fn test_shutdown_clears_and_blocks_caching() {
        let (root, resolver) = counting();
        resolver.resolve("/file1").unwrap();
        resolver.shutdown();
        assert!(resolver.cache().is_empty());

        // Still resolvable, but a miss that is not cached again
        resolver.resolve("/file1").unwrap();
        assert_eq!(root.searches.load(Ordering::SeqCst), 2);
        assert!(resolver.cache().is_empty());

        resolver.cache().reopen();
        resolver.resolve("/file1").unwrap();
        assert!(resolver.cache().contains("/file1"));
    }

    #[test]
    fn test_concurrent_resolution() {
        let (_, resolver) = counting();
        let resolver = Arc::new(resolver);
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let resolver = Arc::clone(&resolver);
                std::thread::spawn(move || {
                    for i in 0..200 {
                        resolver.resolve(&format!("/file{}", (i * 7 + t) % 150)).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(resolver.cache().len() <= CACHE_CAPACITY);
    }
}
