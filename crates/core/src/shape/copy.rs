//! Copy-strategy shapes and records
//!
//! A [`CopyRecord`] owns one private slot per field. Once constructed its
//! lifetime is independent of whatever record it was populated from.

use std::sync::Arc;

use super::{Shape, ShapeCache, Strategy};
use crate::error::{ShapeError, ShapeResult};
use crate::expando::ExpandoRecord;
use crate::schema::Schema;
use crate::value::{check_assignable, unbox, FieldValue, Value};

/// Get or synthesize the copy-strategy shape for a schema
///
/// Uses the process-wide [`ShapeCache`].
pub fn synthesize_copy_shape(schema: &Schema) -> Arc<Shape> {
    ShapeCache::global().get_or_synthesize(schema, Strategy::Copy)
}

impl Shape {
    /// Parameterless constructor of a copy-strategy shape
    ///
    /// Every slot is default-initialized from its declared type.
    pub fn new_instance(self: &Arc<Self>) -> ShapeResult<CopyRecord> {
        self.require_strategy(Strategy::Copy)?;
        Ok(CopyRecord {
            shape: Arc::clone(self),
            slots: self.fields.iter().map(|f| f.ty.default_value()).collect(),
        })
    }
}

/// Instance of a copy-strategy shape
#[derive(Debug, Clone, PartialEq)]
pub struct CopyRecord {
    shape: Arc<Shape>,
    slots: Vec<Value>,
}

impl CopyRecord {
    pub fn shape(&self) -> &Arc<Shape> {
        &self.shape
    }

    /// Borrow the raw value of a field
    pub fn get_value(&self, name: &str) -> ShapeResult<&Value> {
        let field = self.shape.require_field(name)?;
        Ok(&self.slots[field.slot])
    }

    /// Read a field as a typed value
    ///
    /// Fails with `ConversionMismatch` when `T` is not the field's type, or
    /// when the slot holds `Null` and `T` is not an `Option`.
    pub fn get<T: FieldValue>(&self, name: &str) -> ShapeResult<T> {
        let field = self.shape.require_field(name)?;
        let value = &self.slots[field.slot];
        unbox(name, value)
    }

    /// Write a field, checking the value against the declared type
    pub fn set_value(&mut self, name: &str, value: impl Into<Value>) -> ShapeResult<()> {
        let field = self.shape.require_field(name)?;
        if !field.is_settable() {
            return Err(ShapeError::InvalidArgument(format!(
                "field {} has no set accessor",
                name
            )));
        }
        let value = value.into();
        check_assignable(name, &field.ty, &value, field.is_nullable())?;
        let slot = field.slot;
        self.slots[slot] = value;
        Ok(())
    }

    /// Write a typed value
    pub fn set<T: FieldValue>(&mut self, name: &str, value: T) -> ShapeResult<()> {
        self.set_value(name, value.into_value())
    }

    /// Store an already-checked value (converter fast path)
    pub(crate) fn set_slot(&mut self, slot: usize, value: Value) {
        self.slots[slot] = value;
    }

    /// Field values in declaration order
    pub fn values(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.shape
            .fields()
            .iter()
            .map(|f| f.name())
            .zip(self.slots.iter())
    }

    /// Copy the fields back into a generic record
    pub fn to_expando(&self) -> ExpandoRecord {
        self.values()
            .map(|(name, value)| (name, value.clone()))
            .collect()
    }
}
