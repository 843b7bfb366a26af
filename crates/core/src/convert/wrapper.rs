//! Wrapper converter: shared mapping -> wrapper-strategy record

use std::sync::Arc;

use tracing::debug;

use super::cache::{ConverterCache, ConverterKey};
use crate::error::ShapeResult;
use crate::expando::{ExpandoRecord, SharedMap};
use crate::shape::{Shape, Strategy, WrapperRecord};

/// Cached conversion function for one wrapper-strategy shape
///
/// Conversion binds the mapping to a new record; no field is copied.
#[derive(Debug, Clone)]
pub struct WrapperConverter {
    shape: Arc<Shape>,
}

impl WrapperConverter {
    pub(crate) fn build(shape: &Arc<Shape>) -> ShapeResult<Self> {
        shape.require_strategy(Strategy::Wrapper)?;
        debug!("Built wrapper converter for {}", shape.name());
        Ok(Self {
            shape: Arc::clone(shape),
        })
    }

    /// Target shape
    pub fn shape(&self) -> &Arc<Shape> {
        &self.shape
    }

    /// Bind a shared mapping; the record and the caller then share it
    pub fn convert(&self, mapping: SharedMap) -> ShapeResult<WrapperRecord> {
        self.shape.bind(mapping)
    }

    /// Move an owned record into a fresh shared mapping and bind it
    pub fn convert_owned(&self, record: ExpandoRecord) -> ShapeResult<WrapperRecord> {
        self.convert(record.into_shared())
    }
}

impl ConverterCache {
    /// Get or build the wrapper converter for a shape
    ///
    /// Fails with `InvalidArgument` for a copy-strategy shape.
    pub fn wrapper_converter(&self, shape: &Arc<Shape>) -> ShapeResult<WrapperConverter> {
        self.get_or_build(ConverterKey::Shape(shape.id()), || {
            WrapperConverter::build(shape)
        })
    }
}

/// Get or build the wrapper converter for a shape from the global cache
pub fn wrapper_converter(shape: &Arc<Shape>) -> ShapeResult<WrapperConverter> {
    ConverterCache::global().wrapper_converter(shape)
}

/// Bind a shared mapping to an instance of a wrapper-strategy shape
pub fn convert_wrapper(shape: &Arc<Shape>, mapping: SharedMap) -> ShapeResult<WrapperRecord> {
    wrapper_converter(shape)?.convert(mapping)
}
