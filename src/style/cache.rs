//! Per-conversion style caches.
//!
//! Three caches with very different recomputation costs sit side by side:
//! parsed inline styles, normalized colors and the format handles created
//! by the sink. Each is a bounded LRU map that, once full, evicts in one
//! batch down to 90% of its capacity.

use std::borrow::Borrow;
use std::hash::Hash;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;
use tracing::trace;

use super::cell_style::CellStyle;
use super::properties::StyleProperties;
use crate::common::{Result, normalize_color};
use crate::config::ConvertOptions;
use crate::emit::FormatHandle;

/// Hit and miss counters of one cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheCounters {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub len: usize,
    pub capacity: usize,
}

impl CacheCounters {
    /// Share of lookups answered from the cache.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Counters of all three caches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub styles: CacheCounters,
    pub colors: CacheCounters,
    pub formats: CacheCounters,
}

/// LRU map with batch eviction.
struct BoundedLru<K: Hash + Eq, V> {
    entries: LruCache<K, V>,
    capacity: usize,
    counters: CacheCounters,
}

impl<K: Hash + Eq, V: Clone> BoundedLru<K, V> {
    fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: LruCache::unbounded(),
            capacity,
            counters: CacheCounters {
                capacity,
                ..Default::default()
            },
        }
    }

    fn get<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.entries.get(key) {
            Some(value) => {
                self.counters.hits += 1;
                Some(value.clone())
            },
            None => {
                self.counters.misses += 1;
                None
            },
        }
    }

    fn put(&mut self, key: K, value: V) {
        self.entries.put(key, value);
        if self.entries.len() > self.capacity {
            let target = (self.capacity * 9 / 10).max(1);
            let mut evicted = 0;
            while self.entries.len() > target && self.entries.pop_lru().is_some() {
                evicted += 1;
            }
            self.counters.evictions += evicted;
            trace!(evicted, remaining = self.entries.len(), "style cache eviction");
        }
    }

    fn counters(&self) -> CacheCounters {
        CacheCounters {
            len: self.entries.len(),
            ..self.counters
        }
    }
}

/// Caches scoped to one conversion.
///
/// Lookups may come from several grid-building threads at once; each cache
/// sits behind its own lock. Format handles are created only by the thread
/// that owns the sink, through [`format_handle`](Self::format_handle), so a
/// key is never materialized twice while it is resident. A new cache is
/// built for every conversion; handles never outlive their sink.
pub struct StyleCache {
    styles: Mutex<BoundedLru<String, Arc<StyleProperties>>>,
    colors: Mutex<BoundedLru<String, Option<String>>>,
    formats: Mutex<BoundedLru<CellStyle, FormatHandle>>,
}

impl StyleCache {
    pub fn new(options: &ConvertOptions) -> Self {
        Self::with_capacities(
            options.style_cache_capacity,
            options.color_cache_capacity,
            options.format_cache_capacity,
        )
    }

    pub fn with_capacities(styles: usize, colors: usize, formats: usize) -> Self {
        Self {
            styles: Mutex::new(BoundedLru::new(styles)),
            colors: Mutex::new(BoundedLru::new(colors)),
            formats: Mutex::new(BoundedLru::new(formats)),
        }
    }

    /// Parsed form of an inline style string.
    pub fn properties(&self, raw: &str) -> Arc<StyleProperties> {
        if let Some(props) = self.styles.lock().get(raw) {
            return props;
        }
        // Parse outside the lock; a concurrent duplicate parse is harmless.
        let props = Arc::new(StyleProperties::parse(raw));
        self.styles.lock().put(raw.to_string(), Arc::clone(&props));
        props
    }

    /// Normalized form of a raw color value.
    pub fn color(&self, raw: &str) -> Option<String> {
        let key = raw.trim();
        if let Some(color) = self.colors.lock().get(key) {
            return color;
        }
        let color = normalize_color(key);
        self.colors.lock().put(key.to_string(), color.clone());
        color
    }

    /// Format handle previously stored for `style`.
    pub fn get(&self, style: &CellStyle) -> Option<FormatHandle> {
        self.formats.lock().get(style)
    }

    /// Store the format handle of `style`.
    pub fn put(&self, style: CellStyle, handle: FormatHandle) {
        self.formats.lock().put(style, handle);
    }

    /// Cached handle for `style`, creating it with `create` on a miss.
    pub fn format_handle<F>(&self, style: &CellStyle, create: F) -> Result<FormatHandle>
    where
        F: FnOnce(&CellStyle) -> Result<FormatHandle>,
    {
        if let Some(handle) = self.get(style) {
            return Ok(handle);
        }
        let handle = create(style)?;
        self.put(style.clone(), handle);
        Ok(handle)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            styles: self.styles.lock().counters(),
            colors: self.colors.lock().counters(),
            formats: self.formats.lock().counters(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style_with_size(size: u32) -> CellStyle {
        CellStyle {
            font_size: size,
            ..CellStyle::plain(&ConvertOptions::default())
        }
    }

    #[test]
    fn test_properties_are_shared() {
        let cache = StyleCache::with_capacities(10, 10, 10);
        let a = cache.properties("color: red");
        let b = cache.properties("color: red");
        assert!(Arc::ptr_eq(&a, &b));
        let stats = cache.stats();
        assert_eq!(stats.styles.hits, 1);
        assert_eq!(stats.styles.misses, 1);
    }

    #[test]
    fn test_color_cache_remembers_failures() {
        let cache = StyleCache::with_capacities(10, 10, 10);
        assert_eq!(cache.color(" #abc ").as_deref(), Some("#AABBCC"));
        assert_eq!(cache.color("bogus"), None);
        assert_eq!(cache.color("bogus"), None);
        assert_eq!(cache.stats().colors.hits, 1);
        assert_eq!(cache.stats().colors.len, 2);
    }

    #[test]
    fn test_batch_eviction_to_ninety_percent() {
        let cache = StyleCache::with_capacities(10, 10, 10);
        for size in 0..10 {
            cache.put(style_with_size(size), FormatHandle(size));
        }
        assert_eq!(cache.stats().formats.len, 10);

        cache.put(style_with_size(10), FormatHandle(10));
        let stats = cache.stats().formats;
        assert_eq!(stats.len, 9);
        assert_eq!(stats.evictions, 2);

        // Oldest entries went first.
        assert_eq!(cache.get(&style_with_size(0)), None);
        assert_eq!(cache.get(&style_with_size(1)), None);
        assert_eq!(cache.get(&style_with_size(10)), Some(FormatHandle(10)));
    }

    #[test]
    fn test_recently_used_entries_survive() {
        let cache = StyleCache::with_capacities(10, 10, 10);
        for size in 0..10 {
            cache.put(style_with_size(size), FormatHandle(size));
        }
        assert!(cache.get(&style_with_size(0)).is_some());
        cache.put(style_with_size(10), FormatHandle(10));
        assert_eq!(cache.get(&style_with_size(0)), Some(FormatHandle(0)));
        assert_eq!(cache.get(&style_with_size(1)), None);
    }

    #[test]
    fn test_format_handle_creates_once() {
        let cache = StyleCache::with_capacities(10, 10, 10);
        let style = style_with_size(1100);
        let mut created = 0;
        for _ in 0..3 {
            let handle = cache
                .format_handle(&style, |_| {
                    created += 1;
                    Ok(FormatHandle(7))
                })
                .unwrap();
            assert_eq!(handle, FormatHandle(7));
        }
        assert_eq!(created, 1);
    }

    #[test]
    fn test_format_handle_fills_and_reads_the_format_cache() {
        let cache = StyleCache::with_capacities(10, 10, 10);
        let style = style_with_size(1200);
        cache.put(style_with_size(900), FormatHandle(3));

        let handle = cache
            .format_handle(&style_with_size(900), |_| Ok(FormatHandle(99)))
            .unwrap();
        assert_eq!(handle, FormatHandle(3));

        cache.format_handle(&style, |_| Ok(FormatHandle(4))).unwrap();
        assert_eq!(cache.get(&style), Some(FormatHandle(4)));
        let stats = cache.stats().formats;
        assert_eq!((stats.hits, stats.misses, stats.len), (2, 1, 2));
    }
}
