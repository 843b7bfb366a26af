//! Converters - generic records into shape instances
//!
//! Every conversion target gets one cached conversion function:
//!
//! ```text
//! ExpandoRecord ──copy_converter(shape)──▶ CopyRecord     (fields copied, type-checked)
//! SharedMap     ──wrapper_converter(shape)▶ WrapperRecord  (mapping bound, no copy)
//! ExpandoRecord ──typed_converter::<T>()──▶ T              (derive(Record) types)
//! ```
//!
//! Converters live in a [`ConverterCache`]; the free functions use the
//! process-wide one. The first request for a target builds its converter,
//! later requests clone the cached one.
//!
//! # Usage
//!
//! ```ignore
//! use rowshape_core::convert::convert_copy;
//! use rowshape_core::shape::synthesize_copy_shape;
//! use rowshape_core::schema::Schema;
//!
//! let schema = Schema::infer(&rows[0])?;
//! let shape = synthesize_copy_shape(&schema);
//! let records = rows
//!     .iter()
//!     .map(|row| convert_copy(&shape, row))
//!     .collect::<Result<Vec<_>, _>>()?;
//! ```

pub mod cache;
pub mod copy;
pub mod typed;
pub mod wrapper;

pub use cache::{ConverterCache, ConverterKey};
pub use copy::{convert_copy, copy_converter, CopyConverter};
pub use typed::{
    convert_typed, read_field, typed_converter, RecordField, TypedConverter, TypedRecord,
};
pub use wrapper::{convert_wrapper, wrapper_converter, WrapperConverter};
