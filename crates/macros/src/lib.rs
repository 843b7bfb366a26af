//! rowshape proc macros
//!
//! - `#[derive(Record)]` - Declare a typed record whose fields are known at build time
//!
//! A derived record converts from the same generic records as a runtime
//! copy shape, but its accessors and copy logic are ordinary generated code.
//!
//! # Example
//!
//! ```ignore
//! use rowshape_core::Record;
//!
//! #[derive(Debug, Default, Record)]
//! #[record(name = "Measurement")]
//! pub struct Measurement {
//!     #[record(field = "InputString")]
//!     input_string: String,
//!
//!     #[record(field = "OutputValue")]
//!     output_value: i64,
//!
//!     #[record(field = "Revision", readonly)]
//!     revision: i64,
//!
//!     #[record(skip)]
//!     scratch: Vec<u8>,
//! }
//!
//! // Generated:
//! // - m.input_string() -> &String, m.set_input_string(..)
//! // - m.revision() -> &i64 (no setter)
//! // - Measurement::OUTPUT_VALUE_FIELD / Measurement::OUTPUT_VALUE_HASH
//! // - impl TypedRecord for Measurement
//! ```
//!
//! # Attributes
//!
//! ## Struct Attributes
//!
//! - `#[record(name = "Name")]` - Optional. Record name for diagnostics (default: struct name).
//!
//! ## Field Attributes
//!
//! - `#[record(field = "Name")]` - External field name (default: the Rust identifier).
//! - `#[record(readonly)]` - No setter; converters leave the field at its default.
//! - `#[record(skip)]` - Not part of the record schema.

mod parse;
mod record;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

/// Derive macro for typed records
///
/// Every field type must implement `rowshape_core::FieldValue`, and the
/// struct must implement `Default`.
///
/// # Generated Code
///
/// For each non-skipped field, the macro generates:
///
/// - A getter method (`fn output_value(&self) -> &i64`)
/// - A setter method (`fn set_output_value(&mut self, value: i64)`) unless `readonly`
/// - Constants for the external field name and its FNV-1a hash
///
/// plus a `TypedRecord` implementation listing the fields in declaration
/// order, so `rowshape_core::convert_typed` can populate the struct.
#[proc_macro_derive(Record, attributes(record))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    record::derive_record(input).into()
}
