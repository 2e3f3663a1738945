//! Cache for rendered images and info dimensions.
//!
//! Entries are keyed by strings built the same way for every deployment:
//!
//! - image: `iiif:{identifier}/{region}/{size}/{quality}/{rotation}.{format}`
//! - info:  `iiif:info:{version}/{identifier}`
//!
//! The cache tracks the total size of cached values in bytes and evicts
//! least-recently-used entries when the capacity is exceeded.

use std::num::NonZeroUsize;
use std::sync::Arc;

use bytes::Bytes;
use lru::LruCache;
use tokio::sync::RwLock;

use super::{ImageInfo, ImageRequest};

/// Default cache capacity: 100MB
pub const DEFAULT_IMAGE_CACHE_CAPACITY: usize = 100 * 1024 * 1024;

/// Default maximum number of entries (to bound LRU overhead)
const DEFAULT_MAX_ENTRIES: usize = 10_000;

// =============================================================================
// Cache Key
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageCacheKey(Arc<str>);

impl ImageCacheKey {
    /// Key for a rendered image.
    pub fn image(request: &ImageRequest) -> Self {
        Self(
            format!(
                "iiif:{}/{}/{}/{}/{}.{}",
                request.identifier,
                request.region,
                request.size,
                request.quality,
                request.rotation,
                request.format
            )
            .into(),
        )
    }

    /// Key for the dimensions of an image.
    pub fn info(version: &str, identifier: &str) -> Self {
        Self(format!("iiif:info:{}/{}", version, identifier).into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Encode dimensions as a cache value (`"{width},{height}"`).
pub(crate) fn encode_info(info: ImageInfo) -> Bytes {
    Bytes::from(format!("{},{}", info.width, info.height))
}

/// Decode a cached `"{width},{height}"` value.
pub(crate) fn decode_info(data: &[u8]) -> Option<ImageInfo> {
    let text = std::str::from_utf8(data).ok()?;
    let (width, height) = text.split_once(',')?;
    Some(ImageInfo {
        width: width.trim().parse().ok()?,
        height: height.trim().parse().ok()?,
    })
}

// =============================================================================
// Image Cache
// =============================================================================

/// LRU cache with size-based capacity.
///
/// # Thread Safety
///
/// The cache is thread-safe and can be shared across async tasks via `Arc`.
///
/// # Example
///
/// ```
/// use iiif_axum::{ImageCache, ImageCacheKey, ImageRequest};
/// use bytes::Bytes;
///
/// #[tokio::main]
/// async fn main() {
///     let cache = ImageCache::new();
///
///     let key = ImageCacheKey::image(&ImageRequest::full("v2", "cat.png", "png"));
///     let data = Bytes::from_static(b"\x89PNG");
///
///     cache.put(key.clone(), data.clone()).await;
///     assert_eq!(cache.get(&key).await, Some(data));
/// }
/// ```
pub struct ImageCache {
    cache: RwLock<LruCache<ImageCacheKey, Bytes>>,

    /// Maximum total size in bytes
    max_size: usize,

    /// Current total size in bytes
    current_size: RwLock<usize>,
}

impl ImageCache {
    /// Create a new cache with default capacity (100MB).
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_IMAGE_CACHE_CAPACITY)
    }

    /// Create a new cache holding at most `max_size` bytes.
    pub fn with_capacity(max_size: usize) -> Self {
        Self::with_capacity_and_entries(max_size, DEFAULT_MAX_ENTRIES)
    }

    /// Create a new cache bounded both in bytes and in entry count.
    ///
    /// A `max_entries` of zero is treated as one.
    pub fn with_capacity_and_entries(max_size: usize, max_entries: usize) -> Self {
        Self {
            cache: RwLock::new(LruCache::new(
                NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN),
            )),
            max_size,
            current_size: RwLock::new(0),
        }
    }

    /// Get a value, marking it as recently used.
    pub async fn get(&self, key: &ImageCacheKey) -> Option<Bytes> {
        let mut cache = self.cache.write().await;
        cache.get(key).cloned()
    }

    /// Check for a key without updating LRU order.
    pub async fn contains(&self, key: &ImageCacheKey) -> bool {
        let cache = self.cache.read().await;
        cache.contains(key)
    }

    /// Store a value, evicting least-recently-used entries while over capacity.
    pub async fn put(&self, key: ImageCacheKey, data: Bytes) {
        let data_size = data.len();
        let mut cache = self.cache.write().await;
        let mut current_size = self.current_size.write().await;

        if let Some(old_data) = cache.peek(&key) {
            *current_size = current_size.saturating_sub(old_data.len());
        }

        // Entry-count eviction happens inside the LRU and must be accounted too
        if let Some((evicted_key, evicted_data)) = cache.push(key.clone(), data) {
            if evicted_key != key {
                *current_size = current_size.saturating_sub(evicted_data.len());
            }
        }
        *current_size += data_size;

        while *current_size > self.max_size {
            match cache.pop_lru() {
                Some((_, evicted_data)) => {
                    *current_size = current_size.saturating_sub(evicted_data.len());
                }
                None => break,
            }
        }
    }

    pub async fn remove(&self, key: &ImageCacheKey) -> Option<Bytes> {
        let mut cache = self.cache.write().await;
        let mut current_size = self.current_size.write().await;

        let data = cache.pop(key)?;
        *current_size = current_size.saturating_sub(data.len());
        Some(data)
    }

    pub async fn clear(&self) {
        let mut cache = self.cache.write().await;
        let mut current_size = self.current_size.write().await;
        cache.clear();
        *current_size = 0;
    }

    pub async fn len(&self) -> usize {
        self.cache.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.cache.read().await.is_empty()
    }

    /// Current total size of cached values in bytes.
    pub async fn size(&self) -> usize {
        *self.current_size.read().await
    }

    pub fn capacity(&self) -> usize {
        self.max_size
    }
}

impl Default for ImageCache {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
