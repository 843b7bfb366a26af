//! Attribute parsing for the Record derive macro

use darling::{FromDeriveInput, FromField};
use syn::{DeriveInput, Ident, Type};

/// Parsed #[record(...)] attributes on the struct
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(record), supports(struct_named))]
pub struct RecordArgs {
    /// Struct identifier
    pub ident: Ident,

    /// Struct fields
    pub data: darling::ast::Data<(), RecordFieldArgs>,

    /// Record name used in diagnostics (defaults to the struct name)
    #[darling(default)]
    pub name: Option<String>,
}

impl RecordArgs {
    /// Name reported through `TypedRecord::RECORD_NAME`
    pub fn record_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.ident.to_string())
    }
}

/// Parsed #[record(...)] attributes on a field
#[derive(Debug, FromField)]
#[darling(attributes(record))]
pub struct RecordFieldArgs {
    /// Field identifier
    pub ident: Option<Ident>,

    /// Field type
    pub ty: Type,

    /// External field name (e.g., "InputString")
    /// If not specified, the Rust identifier is used
    #[darling(rename = "field")]
    pub field_name: Option<String>,

    /// Whether this field is read-only (no setter, not populated by converters)
    #[darling(default)]
    pub readonly: bool,

    /// Whether this field is excluded from the record schema
    #[darling(default)]
    pub skip: bool,
}

impl RecordFieldArgs {
    /// Check if this field is part of the record schema
    pub fn is_record_field(&self) -> bool {
        !self.skip && self.ident.is_some()
    }

    /// External name of the field
    pub fn external_name(&self) -> String {
        match (&self.field_name, &self.ident) {
            (Some(name), _) => name.clone(),
            (None, Some(ident)) => ident.to_string(),
            (None, None) => String::new(),
        }
    }
}

/// Parse a DeriveInput into RecordArgs
pub fn parse_record(input: &DeriveInput) -> darling::Result<RecordArgs> {
    RecordArgs::from_derive_input(input)
}
