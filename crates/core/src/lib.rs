//! rowshape - Runtime record shapes
//!
//! Bridges data whose shape is only known at runtime (such as the column set
//! of a query result) with code that wants ordinary field access:
//!
//! - [`schema`] - Field sets and their order-independent signatures
//! - [`shape`] - Shape synthesis (copy and wrapper strategies) and the shape cache
//! - [`convert`] - Cached converters from generic records into shape instances
//! - [`expando`] - The generic, insertion-ordered record
//! - [`value`] - Runtime values and semantic types
//!
//! Typed records known at build time use `#[derive(Record)]` instead of a
//! runtime shape.
//!
//! # Example
//!
//! ```ignore
//! use rowshape_core::{convert_copy, synthesize_copy_shape, ExpandoRecord, Schema};
//!
//! let row: ExpandoRecord = [("InputString", "x")].into_iter().collect();
//! let shape = synthesize_copy_shape(&Schema::infer(&row)?);
//! let record = convert_copy(&shape, &row)?;
//! assert_eq!(record.get::<String>("InputString")?, "x");
//! ```

// Allow the crate to refer to itself as `rowshape_core` for proc macro compatibility
extern crate self as rowshape_core;

pub mod config;
pub mod convert;
pub mod error;
pub mod expando;
pub mod logging;
pub mod schema;
pub mod shape;
pub mod value;

// Re-export commonly used items
pub use convert::{
    convert_copy, convert_typed, convert_wrapper, copy_converter, typed_converter,
    wrapper_converter, ConverterCache, CopyConverter, RecordField, TypedConverter, TypedRecord,
    WrapperConverter,
};
pub use error::{ShapeError, ShapeResult};
pub use expando::{ExpandoRecord, SharedMap};
pub use schema::{signature, FieldSchema, Schema, Signature};
pub use shape::{
    synthesize_copy_shape, synthesize_wrapper_shape, CopyRecord, FieldFlags, Shape, ShapeCache,
    ShapeId, Strategy, WrapperRecord,
};
pub use value::{ExternalValue, FieldValue, SemanticType, Value};

// Re-export config types
pub use config::{ConfigError, ConfigResult, ConversionOptions, EngineConfig};

// Re-export macros
pub use rowshape_macros::Record;

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use chrono::{NaiveDate, NaiveDateTime};

    use super::*;

    fn input_date() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 11, 5)
            .and_then(|d| d.and_hms_opt(8, 15, 0))
            .unwrap()
    }

    fn row() -> ExpandoRecord {
        [
            ("InputString", Value::from("x")),
            ("InputDate", Value::from(input_date())),
            ("OutputValue", Value::Integer(1)),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_global_copy_round_trip() {
        let row = row();
        let shape = synthesize_copy_shape(&Schema::infer(&row).unwrap());
        let record = convert_copy(&shape, &row).unwrap();

        assert_eq!(record.get::<String>("InputString").unwrap(), "x");
        assert_eq!(record.get::<NaiveDateTime>("InputDate").unwrap(), input_date());
        assert_eq!(record.get::<i64>("OutputValue").unwrap(), 1);
        assert_eq!(record.to_expando(), row);
    }

    #[test]
    fn test_global_shape_identity() {
        let a = Schema::from_pairs([
            ("GlobalA", SemanticType::Integer),
            ("GlobalB", SemanticType::Text),
        ])
        .unwrap();
        let b = Schema::from_pairs([
            ("GlobalB", SemanticType::Text),
            ("GlobalA", SemanticType::Integer),
        ])
        .unwrap();

        assert!(Arc::ptr_eq(
            &synthesize_copy_shape(&a),
            &synthesize_copy_shape(&b)
        ));
        assert!(Arc::ptr_eq(
            &synthesize_wrapper_shape(&a),
            &synthesize_wrapper_shape(&b)
        ));
    }

    #[test]
    fn test_global_concurrent_synthesis() {
        let schema = Schema::from_pairs([
            ("ConcurrentA", SemanticType::Decimal),
            ("ConcurrentB", SemanticType::Bytes),
        ])
        .unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let schema = schema.clone();
                thread::spawn(move || {
                    let shape = synthesize_wrapper_shape(&schema);
                    let converter = wrapper_converter(&shape).unwrap();
                    (shape, converter)
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let (first, _) = &results[0];
        for (shape, converter) in &results {
            assert!(Arc::ptr_eq(shape, first));
            assert!(Arc::ptr_eq(converter.shape(), first));
        }
    }

    #[test]
    fn test_global_wrapper_sharing() {
        let schema = Schema::from_pairs([
            ("A", SemanticType::Integer),
            ("B", SemanticType::Integer),
        ])
        .unwrap();
        let shape = synthesize_wrapper_shape(&schema);

        let mapping = [("A", 5i64)]
            .into_iter()
            .collect::<ExpandoRecord>()
            .into_shared();
        let record = convert_wrapper(&shape, Arc::clone(&mapping)).unwrap();

        mapping.write().insert("A", 9i64);
        assert_eq!(record.get::<i64>("A").unwrap(), Some(9));
        assert_eq!(record.get::<i64>("B").unwrap(), None);
    }

    #[derive(Debug, Default, PartialEq, Record)]
    #[record(name = "Measurement")]
    struct Measurement {
        #[record(field = "InputString")]
        input_string: String,

        #[record(field = "InputDate")]
        input_date: NaiveDateTime,

        #[record(field = "OutputValue")]
        output_value: i64,

        #[record(field = "Comment")]
        comment: Option<String>,

        #[record(field = "Revision", readonly)]
        revision: i64,

        #[record(skip)]
        scratch: Vec<u8>,
    }

    #[test]
    fn test_derive_constants_and_fields() {
        assert_eq!(Measurement::RECORD_NAME, "Measurement");
        assert_eq!(Measurement::INPUT_STRING_FIELD, "InputString");
        assert_eq!(Measurement::OUTPUT_VALUE_HASH, schema::fnv1a_32(b"OutputValue"));

        let fields = Measurement::fields();
        assert_eq!(fields.len(), 5);
        assert_eq!(fields[3].ty, SemanticType::Text);
        assert!(fields[3].settable);
        assert!(!fields[4].settable);
    }

    #[test]
    fn test_derive_accessors() {
        let mut m = Measurement::default();
        m.set_input_string("y".to_string());
        m.set_comment(Some("c".to_string()));
        assert_eq!(m.input_string(), "y");
        assert_eq!(m.comment().as_deref(), Some("c"));
        assert_eq!(m.revision(), &0);
    }

    #[test]
    fn test_derive_conversion() {
        let mut row = row();
        row.insert("Comment", Value::Null);
        row.insert("Revision", 7i64);

        let m = convert_typed::<Measurement>(&row).unwrap();
        assert_eq!(m.input_string, "x");
        assert_eq!(m.input_date, input_date());
        assert_eq!(m.output_value, 1);
        assert_eq!(m.comment, None);
        // Read-only fields are not populated
        assert_eq!(m.revision, 0);
        assert!(m.scratch.is_empty());

        let back = m.to_expando();
        assert_eq!(
            back.keys().collect::<Vec<_>>(),
            vec!["InputString", "InputDate", "OutputValue", "Comment", "Revision"]
        );
    }

    #[test]
    fn test_derive_missing_field() {
        let mut row = row();
        row.insert("Comment", "c");
        row.remove("OutputValue");

        assert_eq!(
            convert_typed::<Measurement>(&row).unwrap_err(),
            ShapeError::ConversionMismatch {
                field: "OutputValue".into(),
                expected: "integer".into(),
                found: "<missing>".into(),
            }
        );
    }

    #[test]
    fn test_derive_schema_matches_runtime_shape() {
        let schema = Measurement::schema().unwrap();
        let converter = typed_converter::<Measurement>().unwrap();
        assert_eq!(converter.signature(), &schema.signature());

        let shape = synthesize_copy_shape(&schema);
        assert_eq!(shape.signature(), converter.signature());
    }
}
