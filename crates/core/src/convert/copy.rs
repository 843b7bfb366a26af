//! Copy converter: generic record -> copy-strategy record

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::cache::{ConverterCache, ConverterKey};
use crate::config::ConversionOptions;
use crate::error::{ShapeError, ShapeResult};
use crate::expando::ExpandoRecord;
use crate::shape::{CopyRecord, Shape, Strategy};
use crate::value::{check_assignable, SemanticType};

/// One settable field the converter populates
#[derive(Debug)]
struct FieldPlan {
    name: String,
    ty: SemanticType,
    slot: usize,
    accepts_null: bool,
}

/// Cached conversion function for one copy-strategy shape
///
/// Cloning is cheap; clones share the field plan.
#[derive(Clone)]
pub struct CopyConverter {
    shape: Arc<Shape>,
    plan: Arc<[FieldPlan]>,
    options: ConversionOptions,
}

impl CopyConverter {
    /// Build the field plan for a shape (uncached)
    pub(crate) fn build(shape: &Arc<Shape>, options: ConversionOptions) -> ShapeResult<Self> {
        shape.require_strategy(Strategy::Copy)?;

        let plan: Arc<[FieldPlan]> = shape
            .fields()
            .iter()
            .filter(|f| f.is_settable())
            .map(|f| FieldPlan {
                name: f.name().to_string(),
                ty: f.ty().clone(),
                slot: f.slot(),
                accepts_null: f.is_nullable(),
            })
            .collect();

        debug!(
            "Built copy converter for {} ({} settable fields)",
            shape.name(),
            plan.len()
        );

        Ok(Self {
            shape: Arc::clone(shape),
            plan,
            options,
        })
    }

    /// Target shape
    pub fn shape(&self) -> &Arc<Shape> {
        &self.shape
    }

    /// Allocate a new instance and copy every settable field out of `source`
    ///
    /// A field missing from `source`, or holding a value of the wrong type,
    /// fails the whole conversion; no partially populated record is returned.
    pub fn convert(&self, source: &ExpandoRecord) -> ShapeResult<CopyRecord> {
        if self.options.reject_extra_keys {
            if let Some(extra) = source.keys().find(|key| self.shape.field(key).is_none()) {
                return Err(ShapeError::UnknownField(extra.to_string()));
            }
        }

        let mut record = self.shape.new_instance()?;
        for field in self.plan.iter() {
            let value = source
                .get(&field.name)
                .ok_or_else(|| ShapeError::missing(&field.name, &field.ty))?;
            check_assignable(&field.name, &field.ty, value, field.accepts_null)?;
            record.set_slot(field.slot, value.clone());
        }
        Ok(record)
    }

    /// Convert a batch of records, stopping at the first failure
    pub fn convert_all<'a>(
        &self,
        sources: impl IntoIterator<Item = &'a ExpandoRecord>,
    ) -> ShapeResult<Vec<CopyRecord>> {
        sources.into_iter().map(|source| self.convert(source)).collect()
    }
}

impl fmt::Debug for CopyConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CopyConverter")
            .field("shape", &self.shape.name())
            .field("fields", &self.plan.len())
            .field("options", &self.options)
            .finish()
    }
}

impl ConverterCache {
    /// Get or build the copy converter for a shape
    ///
    /// Fails with `InvalidArgument` for a wrapper-strategy shape.
    pub fn copy_converter(&self, shape: &Arc<Shape>) -> ShapeResult<CopyConverter> {
        self.get_or_build(ConverterKey::Shape(shape.id()), || {
            CopyConverter::build(shape, self.options())
        })
    }
}

/// Get or build the copy converter for a shape from the global cache
pub fn copy_converter(shape: &Arc<Shape>) -> ShapeResult<CopyConverter> {
    ConverterCache::global().copy_converter(shape)
}

/// Convert one record into an instance of a copy-strategy shape
pub fn convert_copy(shape: &Arc<Shape>, source: &ExpandoRecord) -> ShapeResult<CopyRecord> {
    copy_converter(shape)?.convert(source)
}
