//! Compiled template cache
//!
//! Compiling a template parses it and builds a regex, which costs far more
//! than matching against it. [`TemplateCache`] keeps recently used
//! templates in a bounded LRU keyed by the template string.
//!
//! # Usage
//!
//! ```
//! use armature_uri_core::cache::TemplateCache;
//!
//! let cache = TemplateCache::with_capacity(128);
//! let first = cache.get_or_compile("/users/{id}").unwrap();
//! let second = cache.get_or_compile("/users/{id}").unwrap();
//!
//! assert_eq!(first, second);
//! assert_eq!(cache.stats().hits(), 1);
//! assert_eq!(cache.stats().misses(), 1);
//! ```

use crate::error::Result;
use crate::logging::{debug, trace, warn};
use crate::template::UriTemplate;
use lru::LruCache;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Capacity of [`TemplateCache::new`] and of the global cache.
pub const DEFAULT_CAPACITY: usize = 1024;

static GLOBAL: Lazy<TemplateCache> = Lazy::new(TemplateCache::new);

/// The process-wide template cache.
pub fn global() -> &'static TemplateCache {
    &GLOBAL
}

// ============================================================================
// Template Cache
// ============================================================================

/// Bounded LRU cache of compiled templates.
///
/// Thread-safe; compilation happens outside the lock, so two threads may
/// compile the same template concurrently and the later insert wins.
pub struct TemplateCache {
    cache: Mutex<LruCache<String, UriTemplate>>,
    stats: TemplateCacheStats,
}

impl TemplateCache {
    /// Create a cache holding up to 1024 templates.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a cache with a specific capacity (at least one entry).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
            stats: TemplateCacheStats::default(),
        }
    }

    /// Get a cached template.
    pub fn get(&self, template: &str) -> Option<UriTemplate> {
        let result = self.cache.lock().get(template).cloned();

        if result.is_some() {
            self.stats.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.stats.misses.fetch_add(1, Ordering::Relaxed);
        }

        result
    }

    /// Get a cached template, compiling and caching it on a miss.
    ///
    /// Templates that fail to compile are not cached.
    pub fn get_or_compile(&self, template: &str) -> Result<UriTemplate> {
        if let Some(compiled) = self.get(template) {
            trace!(template = template, "Template cache hit");
            return Ok(compiled);
        }

        let compiled = UriTemplate::new(template).inspect_err(|e| {
            warn!(template = template, error = %e, "Rejected URI template");
        })?;
        self.insert(compiled.clone());
        Ok(compiled)
    }

    /// Insert a compiled template, evicting the least recently used entry
    /// when full.
    pub fn insert(&self, template: UriTemplate) {
        let key = template.template().to_string();
        let evicted = self.cache.lock().push(key.clone(), template);

        self.stats.insertions.fetch_add(1, Ordering::Relaxed);
        if let Some((evicted_key, _)) = evicted {
            if evicted_key != key {
                self.stats.evictions.fetch_add(1, Ordering::Relaxed);
                debug!(template = evicted_key.as_str(), "Evicted template from cache");
            }
        }
    }

    pub fn clear(&self) {
        self.cache.lock().clear();
    }

    pub fn stats(&self) -> &TemplateCacheStats {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.cache.lock().cap().get()
    }
}

impl Default for TemplateCache {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Statistics
// ============================================================================

/// Template cache statistics.
#[derive(Debug, Default)]
pub struct TemplateCacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    insertions: AtomicU64,
    evictions: AtomicU64,
}

impl TemplateCacheStats {
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn insertions(&self) -> u64 {
        self.insertions.load(Ordering::Relaxed)
    }

    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    /// Get hit ratio.
    pub fn hit_ratio(&self) -> f64 {
        let hits = self.hits() as f64;
        let total = hits + self.misses() as f64;
        if total > 0.0 {
            hits / total
        } else {
            0.0
        }
    }
}
