// SPDX-License-Identifier: MPL-2.0
//! Local object store backing `blob:` URLs.
//!
//! Bytes fetched manually (restricted previews, media that cannot be streamed
//! directly) are kept here and handed to renderers through a local URL.
//!
//! # Design
//!
//! - **Content-addressed**: the URL is `blob:viewer/<blake3-hex>` of the bytes
//! - **LRU eviction**: least recently used blobs are revoked first
//! - **Memory-bounded**: total size limited by a configurable byte limit
//! - **Session-scoped**: the owning session clears the store on close

use lru::LruCache;
use std::sync::Arc;

/// Scheme prefix of every URL minted by the store.
pub const BLOB_URL_PREFIX: &str = "blob:viewer/";

/// Default blob store size in bytes (64 MB).
pub const DEFAULT_BLOB_CACHE_BYTES: usize = 64 * 1024 * 1024;

/// Minimum blob store size in bytes (8 MB).
pub const MIN_BLOB_CACHE_BYTES: usize = 8 * 1024 * 1024;

/// Maximum blob store size in bytes (512 MB).
pub const MAX_BLOB_CACHE_BYTES: usize = 512 * 1024 * 1024;

/// Bytes held behind a blob URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub content_type: Option<String>,
    pub bytes: Arc<[u8]>,
}

impl Blob {
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Statistics about blob store usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlobStats {
    /// Number of blobs currently stored.
    pub blob_count: usize,

    /// Total bytes currently held.
    pub total_bytes: usize,

    /// Number of lookups that found their blob.
    pub hits: u64,

    /// Number of lookups for revoked or unknown URLs.
    pub misses: u64,

    /// Number of blobs evicted due to the byte limit.
    pub evictions: u64,

    /// Number of blobs inserted.
    pub insertions: u64,
}

/// Byte-bounded LRU of blobs keyed by their URL.
pub struct BlobStore {
    blobs: LruCache<String, Blob>,
    max_bytes: usize,
    current_bytes: usize,
    stats: BlobStats,
}

impl BlobStore {
    /// Creates a store holding at most `max_bytes`, clamped to the allowed range.
    #[must_use]
    pub fn new(max_bytes: usize) -> Self {
        Self {
            blobs: LruCache::unbounded(),
            max_bytes: max_bytes.clamp(MIN_BLOB_CACHE_BYTES, MAX_BLOB_CACHE_BYTES),
            current_bytes: 0,
            stats: BlobStats::default(),
        }
    }

    /// Creates a store with the default size.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_BLOB_CACHE_BYTES)
    }

    /// URL the store would mint for `bytes`.
    #[must_use]
    pub fn url_for(bytes: &[u8]) -> String {
        format!("{BLOB_URL_PREFIX}{}", blake3::hash(bytes).to_hex())
    }

    /// Stores `bytes` and returns their URL.
    ///
    /// Storing identical bytes again refreshes the existing entry. A blob
    /// larger than the whole budget is still kept, alone.
    pub fn insert(&mut self, content_type: Option<String>, bytes: Vec<u8>) -> String {
        let url = Self::url_for(&bytes);
        if self.blobs.get(&url).is_some() {
            return url;
        }

        let size = bytes.len();
        while self.current_bytes + size > self.max_bytes {
            let Some((evicted_url, evicted)) = self.blobs.pop_lru() else {
                break;
            };
            self.current_bytes = self.current_bytes.saturating_sub(evicted.len());
            self.stats.evictions += 1;
            tracing::debug!("Evicted {evicted_url} ({} bytes)", evicted.len());
        }

        self.current_bytes += size;
        self.blobs.put(
            url.clone(),
            Blob {
                content_type,
                bytes: bytes.into(),
            },
        );
        self.stats.insertions += 1;
        self.refresh_stats();
        url
    }

    /// Looks up a blob, updating LRU order.
    pub fn get(&mut self, url: &str) -> Option<Blob> {
        match self.blobs.get(url) {
            Some(blob) => {
                self.stats.hits += 1;
                Some(blob.clone())
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Checks for a blob without touching LRU order.
    #[must_use]
    pub fn contains(&self, url: &str) -> bool {
        self.blobs.contains(url)
    }

    /// Drops one blob. Returns `false` if the URL was unknown.
    pub fn revoke(&mut self, url: &str) -> bool {
        match self.blobs.pop(url) {
            Some(blob) => {
                self.current_bytes = self.current_bytes.saturating_sub(blob.len());
                self.refresh_stats();
                true
            }
            None => false,
        }
    }

    /// Revokes every blob.
    pub fn clear(&mut self) {
        if !self.blobs.is_empty() {
            tracing::debug!("Revoking {} blob URLs", self.blobs.len());
        }
        self.blobs.clear();
        self.current_bytes = 0;
        self.refresh_stats();
    }

    /// Returns the current store statistics.
    #[must_use]
    pub fn stats(&self) -> BlobStats {
        self.stats
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    /// Returns the current memory usage in bytes.
    #[must_use]
    pub fn memory_usage(&self) -> usize {
        self.current_bytes
    }

    #[must_use]
    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    fn refresh_stats(&mut self) {
        self.stats.blob_count = self.blobs.len();
        self.stats.total_bytes = self.current_bytes;
    }
}

impl Default for BlobStore {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for BlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobStore")
            .field("blob_count", &self.blobs.len())
            .field("memory_usage", &self.current_bytes)
            .field("max_bytes", &self.max_bytes)
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MB: usize = 1024 * 1024;

    fn payload(size: usize, fill: u8) -> Vec<u8> {
        vec![fill; size]
    }

    #[test]
    fn new_store_is_empty() {
        let store = BlobStore::with_defaults();
        assert!(store.is_empty());
        assert_eq!(store.memory_usage(), 0);
        assert_eq!(store.max_bytes(), DEFAULT_BLOB_CACHE_BYTES);
    }

    #[test]
    fn size_is_clamped() {
        assert_eq!(BlobStore::new(1).max_bytes(), MIN_BLOB_CACHE_BYTES);
        assert_eq!(BlobStore::new(usize::MAX).max_bytes(), MAX_BLOB_CACHE_BYTES);
    }

    #[test]
    fn insert_returns_content_addressed_url() {
        let mut store = BlobStore::with_defaults();
        let url = store.insert(Some("video/mp4".into()), b"frames".to_vec());
        assert!(url.starts_with(BLOB_URL_PREFIX));
        assert_eq!(url, BlobStore::url_for(b"frames"));

        let again = store.insert(None, b"frames".to_vec());
        assert_eq!(url, again);
        assert_eq!(store.len(), 1);

        let blob = store.get(&url).expect("stored");
        assert_eq!(blob.content_type.as_deref(), Some("video/mp4"));
        assert_eq!(&*blob.bytes, b"frames");
    }

    #[test]
    fn least_recently_used_blob_is_evicted() {
        let mut store = BlobStore::new(8 * MB);
        let first = store.insert(None, payload(3 * MB, 1));
        let second = store.insert(None, payload(3 * MB, 2));
        store.get(&first);
        let third = store.insert(None, payload(3 * MB, 3));

        assert!(store.contains(&first));
        assert!(!store.contains(&second));
        assert!(store.contains(&third));
        assert_eq!(store.stats().evictions, 1);
        assert_eq!(store.memory_usage(), 6 * MB);
    }

    #[test]
    fn oversized_blob_is_kept_alone() {
        let mut store = BlobStore::new(8 * MB);
        let small = store.insert(None, payload(MB, 1));
        let huge = store.insert(None, payload(9 * MB, 2));
        assert!(!store.contains(&small));
        assert!(store.contains(&huge));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn revoke_and_clear_release_memory() {
        let mut store = BlobStore::with_defaults();
        let a = store.insert(None, payload(10, 1));
        let _b = store.insert(None, payload(20, 2));
        assert!(store.revoke(&a));
        assert!(!store.revoke(&a));
        assert_eq!(store.memory_usage(), 20);

        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.stats().total_bytes, 0);
        assert!(store.get(&a).is_none());
        assert_eq!(store.stats().misses, 1);
    }
}
