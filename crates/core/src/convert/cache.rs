//! Process-wide converter cache
//!
//! Converters are built lazily, once per target: a synthesized shape is keyed
//! by its [`ShapeId`], a typed record by its `TypeId`. Entries are never
//! evicted.

use std::any::{Any, TypeId};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, LazyLock};

use dashmap::DashMap;
use tracing::{debug, trace, warn};

use crate::config::{self, ConversionOptions};
use crate::shape::ShapeId;

/// Identity of a conversion target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConverterKey {
    /// A synthesized shape
    Shape(ShapeId),
    /// An externally supplied typed record
    Type(TypeId),
}

type CachedConverter = Arc<dyn Any + Send + Sync>;

/// Memoized store of conversion functions
///
/// Same publication rule as the shape cache: a concurrent miss may build
/// more than once, but only the first inserted converter is ever returned.
pub struct ConverterCache {
    converters: DashMap<ConverterKey, CachedConverter>,
    builds: AtomicUsize,
    options: ConversionOptions,
}

/// Global converter cache, configured from the installed config
static GLOBAL: LazyLock<ConverterCache> =
    LazyLock::new(|| ConverterCache::with_options(config::installed().conversion));

impl ConverterCache {
    /// Create an empty cache with default options
    pub fn new() -> Self {
        Self::with_options(ConversionOptions::default())
    }

    /// Create an empty cache whose converters apply `options`
    pub fn with_options(options: ConversionOptions) -> Self {
        Self {
            converters: DashMap::new(),
            builds: AtomicUsize::new(0),
            options,
        }
    }

    /// The process-wide cache
    pub fn global() -> &'static ConverterCache {
        &GLOBAL
    }

    pub fn options(&self) -> ConversionOptions {
        self.options
    }

    /// Get the converter for `key`, building it on first request
    ///
    /// `build` runs outside of any shard lock. Its result is only used if no
    /// other caller published a converter for `key` first.
    pub(crate) fn get_or_build<C, E>(
        &self,
        key: ConverterKey,
        build: impl FnOnce() -> Result<C, E>,
    ) -> Result<C, E>
    where
        C: Any + Clone + Send + Sync,
    {
        if let Some(entry) = self.converters.get(&key) {
            if let Some(converter) = entry.value().downcast_ref::<C>() {
                trace!("Converter cache hit for {:?}", key);
                return Ok(converter.clone());
            }
        }

        let built = build()?;
        self.builds.fetch_add(1, Ordering::Relaxed);

        let published = Arc::clone(
            self.converters
                .entry(key)
                .or_insert_with(|| Arc::new(built.clone()) as CachedConverter)
                .value(),
        );

        match published.downcast_ref::<C>() {
            Some(converter) => {
                debug!("Published converter for {:?}", key);
                Ok(converter.clone())
            }
            None => {
                // A key always maps to one converter type; this is unreachable
                // through the public converter functions.
                warn!("Converter for {:?} has an unexpected type", key);
                Ok(built)
            }
        }
    }

    /// Number of cached converters
    pub fn len(&self) -> usize {
        self.converters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }

    /// Number of converter builds, including builds that lost a race
    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::Relaxed)
    }
}

impl Default for ConverterCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConverterCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConverterCache")
            .field("len", &self.converters.len())
            .field("builds", &self.build_count())
            .field("options", &self.options)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    #[derive(Clone)]
    struct Dummy(u32);

    #[test]
    fn test_builds_once_per_key() {
        let cache = ConverterCache::new();
        let key = ConverterKey::Type(TypeId::of::<Dummy>());

        let a = cache
            .get_or_build(key, || Ok::<_, Infallible>(Dummy(1)))
            .unwrap();
        let b = cache
            .get_or_build(key, || Ok::<_, Infallible>(Dummy(2)))
            .unwrap();

        assert_eq!(a.0, 1);
        assert_eq!(b.0, 1);
        assert_eq!(cache.build_count(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_failed_build_is_not_cached() {
        let cache = ConverterCache::new();
        let key = ConverterKey::Type(TypeId::of::<Dummy>());

        let err = cache.get_or_build::<Dummy, &str>(key, || Err("boom"));
        assert_eq!(err.err(), Some("boom"));
        assert!(cache.is_empty());
        assert_eq!(cache.build_count(), 0);
    }
}
