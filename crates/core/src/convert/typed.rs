//! Typed records defined ahead of time
//!
//! Structs deriving [`Record`](crate::Record) implement [`TypedRecord`]: the
//! accessors and per-field copy logic are generated at build time instead of
//! being dispatched through a shape's lookup table.

use std::any::TypeId;
use std::collections::HashSet;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::debug;

use super::cache::{ConverterCache, ConverterKey};
use crate::config::ConversionOptions;
use crate::error::{ShapeError, ShapeResult};
use crate::expando::ExpandoRecord;
use crate::schema::{FieldSchema, Schema, Signature};
use crate::value::{unbox, FieldValue, SemanticType};

/// Static description of one field of a typed record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordField {
    /// Externally visible name
    pub name: &'static str,
    /// Declared type
    pub ty: SemanticType,
    /// Whether converters populate this field
    pub settable: bool,
}

/// A record type with statically known fields
///
/// `Default` is the parameterless constructor converters start from.
///
/// Field types unbox strictly, so a text, bytes or external field that may
/// hold `Null` must be declared as `Option<T>`. A plain `String` field rejects
/// `Null`, even though a copy shape with the same signature accepts it.
pub trait TypedRecord: Default + Send + Sync + 'static {
    /// Record name used in diagnostics
    const RECORD_NAME: &'static str;

    /// Declared fields in declaration order
    fn fields() -> Vec<RecordField>;

    /// Copy every settable field out of `source`
    fn populate(&mut self, source: &ExpandoRecord) -> ShapeResult<()>;

    /// Copy all declared fields into a generic record
    fn to_expando(&self) -> ExpandoRecord;

    /// The schema this record declares
    fn schema() -> ShapeResult<Schema> {
        Schema::new(
            Self::fields()
                .into_iter()
                .map(|f| FieldSchema::new(f.name, f.ty)),
        )
    }

    /// Default-construct and populate from `source`
    fn from_expando(source: &ExpandoRecord) -> ShapeResult<Self> {
        let mut record = Self::default();
        record.populate(source)?;
        Ok(record)
    }
}

/// Read and unbox one field of a source record
///
/// Used by generated `populate` implementations.
pub fn read_field<T: FieldValue>(source: &ExpandoRecord, name: &str) -> ShapeResult<T> {
    let value = source
        .get(name)
        .ok_or_else(|| ShapeError::missing(name, T::semantic_type()))?;
    unbox(name, value)
}

/// Cached conversion function for one typed record
pub struct TypedConverter<T> {
    signature: Signature,
    declared: Arc<HashSet<String>>,
    options: ConversionOptions,
    _marker: PhantomData<fn() -> T>,
}

impl<T: TypedRecord> TypedConverter<T> {
    pub(crate) fn build(options: ConversionOptions) -> ShapeResult<Self> {
        let schema = T::schema()?;
        let declared = T::fields()
            .into_iter()
            .map(|f| f.name.to_string())
            .collect();
        debug!(
            "Built typed converter for {} ({} fields)",
            T::RECORD_NAME,
            schema.len()
        );
        Ok(Self {
            signature: schema.signature(),
            declared: Arc::new(declared),
            options,
            _marker: PhantomData,
        })
    }

    /// Signature of the record's declared schema
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Construct a record and populate it from `source`
    pub fn convert(&self, source: &ExpandoRecord) -> ShapeResult<T> {
        if self.options.reject_extra_keys {
            if let Some(extra) = source.keys().find(|key| !self.declared.contains(*key)) {
                return Err(ShapeError::UnknownField(extra.to_string()));
            }
        }
        T::from_expando(source)
    }

    /// Convert a batch of records, stopping at the first failure
    pub fn convert_all<'a>(
        &self,
        sources: impl IntoIterator<Item = &'a ExpandoRecord>,
    ) -> ShapeResult<Vec<T>> {
        sources.into_iter().map(|source| self.convert(source)).collect()
    }
}

impl<T> Clone for TypedConverter<T> {
    fn clone(&self) -> Self {
        Self {
            signature: self.signature.clone(),
            declared: Arc::clone(&self.declared),
            options: self.options,
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for TypedConverter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedConverter")
            .field("signature", &self.signature)
            .field("options", &self.options)
            .finish()
    }
}

impl ConverterCache {
    /// Get or build the converter for a typed record
    pub fn typed_converter<T: TypedRecord>(&self) -> ShapeResult<TypedConverter<T>> {
        self.get_or_build(ConverterKey::Type(TypeId::of::<T>()), || {
            TypedConverter::<T>::build(self.options())
        })
    }
}

/// Get or build the converter for a typed record from the global cache
pub fn typed_converter<T: TypedRecord>() -> ShapeResult<TypedConverter<T>> {
    ConverterCache::global().typed_converter::<T>()
}

/// Convert one record into a typed record
pub fn convert_typed<T: TypedRecord>(source: &ExpandoRecord) -> ShapeResult<T> {
    typed_converter::<T>()?.convert(source)
}
