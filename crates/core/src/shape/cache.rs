//! Process-wide shape cache
//!
//! Shapes are populated lazily: the first caller of a given key pays the
//! synthesis cost, every later caller gets the published `Arc<Shape>`.
//! Entries are never evicted.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, LazyLock};

use dashmap::DashMap;
use tracing::{debug, trace};

use super::{Shape, Strategy};
use crate::schema::{Schema, Signature};

/// Cache key: one shape per signature and strategy
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ShapeKey {
    signature: Signature,
    strategy: Strategy,
}

/// Memoized store of synthesized shapes
///
/// Concurrent requests for one key may each build a candidate, but only the
/// first candidate inserted is published and returned to all of them. No
/// shard lock is held while a candidate is being built.
#[derive(Debug, Default)]
pub struct ShapeCache {
    shapes: DashMap<ShapeKey, Arc<Shape>>,
    synthesized: AtomicUsize,
}

/// Global shape cache used by the free synthesis functions
static GLOBAL: LazyLock<ShapeCache> = LazyLock::new(ShapeCache::new);

impl ShapeCache {
    /// Create an empty, independent cache
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache
    pub fn global() -> &'static ShapeCache {
        &GLOBAL
    }

    /// Get the shape for a schema, synthesizing it on first request
    ///
    /// # Arguments
    /// * `schema` - Validated field set; presentation order does not matter
    /// * `strategy` - Backing strategy of the shape
    ///
    /// # Returns
    /// The single published shape for `(signature(schema), strategy)`.
    pub fn get_or_synthesize(&self, schema: &Schema, strategy: Strategy) -> Arc<Shape> {
        let key = ShapeKey {
            signature: schema.signature(),
            strategy,
        };

        if let Some(entry) = self.shapes.get(&key) {
            trace!("Shape cache hit for {} ({})", key.signature, strategy);
            return Arc::clone(entry.value());
        }

        // Build outside of any shard lock
        let candidate = Arc::new(Shape::synthesize(schema, key.signature.clone(), strategy));
        self.synthesized.fetch_add(1, Ordering::Relaxed);

        let published = Arc::clone(
            self.shapes
                .entry(key)
                .or_insert_with(|| Arc::clone(&candidate))
                .value(),
        );

        if Arc::ptr_eq(&published, &candidate) {
            debug!(
                "Synthesized {} shape {} with {} fields",
                strategy,
                published.name(),
                published.fields().len()
            );
        } else {
            debug!(
                "Discarded concurrent {} shape build for {}",
                strategy,
                published.name()
            );
        }

        published
    }

    /// Look up a shape without synthesizing it
    pub fn get(&self, schema: &Schema, strategy: Strategy) -> Option<Arc<Shape>> {
        let key = ShapeKey {
            signature: schema.signature(),
            strategy,
        };
        self.shapes.get(&key).map(|entry| Arc::clone(entry.value()))
    }

    /// Number of published shapes
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Number of synthesis runs, including candidates that lost a race
    pub fn synthesis_count(&self) -> usize {
        self.synthesized.load(Ordering::Relaxed)
    }
}
