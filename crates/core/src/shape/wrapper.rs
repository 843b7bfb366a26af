//! Wrapper-strategy shapes and records
//!
//! A [`WrapperRecord`] owns no field data. It holds a [`SharedMap`] handle and
//! every accessor reads or writes that mapping under the field's name.
//!
//! The mapping is shared, not owned: the caller, any number of wrapper
//! records and any other holder keep it alive together, and the mapping lives
//! as long as the longest holder. A write through one holder is visible to
//! all others. This aliasing is the point of the strategy.

use std::sync::Arc;

use super::{Shape, ShapeCache, Strategy};
use crate::error::ShapeResult;
use crate::expando::SharedMap;
use crate::schema::Schema;
use crate::value::{check_assignable, unbox, FieldValue, Value};

/// Get or synthesize the wrapper-strategy shape for a schema
///
/// Uses the process-wide [`ShapeCache`].
pub fn synthesize_wrapper_shape(schema: &Schema) -> Arc<Shape> {
    ShapeCache::global().get_or_synthesize(schema, Strategy::Wrapper)
}

impl Shape {
    /// The single constructor of a wrapper-strategy shape
    ///
    /// Binds the mapping without copying it. The mapping's key set is not
    /// checked here; missing keys read as "no value".
    pub fn bind(self: &Arc<Self>, mapping: SharedMap) -> ShapeResult<WrapperRecord> {
        self.require_strategy(Strategy::Wrapper)?;
        Ok(WrapperRecord {
            shape: Arc::clone(self),
            mapping,
        })
    }
}

/// Instance of a wrapper-strategy shape
///
/// Cloning a record clones the handle, so the clone views the same mapping.
#[derive(Debug, Clone)]
pub struct WrapperRecord {
    shape: Arc<Shape>,
    mapping: SharedMap,
}

impl WrapperRecord {
    pub fn shape(&self) -> &Arc<Shape> {
        &self.shape
    }

    /// The shared backing mapping
    pub fn mapping(&self) -> &SharedMap {
        &self.mapping
    }

    /// Read a field
    ///
    /// Returns `Ok(None)` when the key is absent or holds `Null`. A value whose
    /// runtime type is not the declared type is a `ConversionMismatch`,
    /// reported here at access time.
    pub fn get<T: FieldValue>(&self, name: &str) -> ShapeResult<Option<T>> {
        let field = self.shape.require_field(name)?;
        let mapping = self.mapping.read();
        match mapping.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => {
                check_assignable(name, field.ty(), value, true)?;
                unbox(name, value).map(Some)
            }
        }
    }

    /// Read the raw value of a field, `Null` when absent
    pub fn get_value(&self, name: &str) -> ShapeResult<Value> {
        self.shape.require_field(name)?;
        Ok(self.mapping.read().get(name).cloned().unwrap_or_default())
    }

    /// Whether the mapping currently holds a non-null value for the field
    pub fn has_value(&self, name: &str) -> ShapeResult<bool> {
        self.shape.require_field(name)?;
        Ok(self
            .mapping
            .read()
            .get(name)
            .is_some_and(|value| !value.is_null()))
    }

    /// Write a field into the shared mapping, inserting the key if needed
    ///
    /// `Null` (or `None` through [`set`](Self::set)) stores "no value".
    pub fn set_value(&self, name: &str, value: impl Into<Value>) -> ShapeResult<()> {
        let field = self.shape.require_field(name)?;
        let value = value.into();
        check_assignable(name, field.ty(), &value, field.is_nullable())?;
        self.mapping.write().insert(name, value);
        Ok(())
    }

    /// Write a typed value; pass an `Option` to store "no value"
    pub fn set<T: FieldValue>(&self, name: &str, value: T) -> ShapeResult<()> {
        self.set_value(name, value.into_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ShapeError;
    use crate::expando::ExpandoRecord;
    use crate::value::{ExternalValue, SemanticType};
    use rust_decimal::Decimal;

    fn shape(pairs: &[(&str, SemanticType)]) -> Arc<Shape> {
        let schema = Schema::from_pairs(pairs.iter().cloned()).unwrap();
        ShapeCache::new().get_or_synthesize(&schema, Strategy::Wrapper)
    }

    #[test]
    fn test_external_write_visible() {
        let shape = shape(&[("A", SemanticType::Integer)]);
        let mapping: SharedMap = [("A", 5i64)]
            .into_iter()
            .collect::<ExpandoRecord>()
            .into_shared();

        let record = shape.bind(Arc::clone(&mapping)).unwrap();
        assert_eq!(record.get::<i64>("A").unwrap(), Some(5));

        mapping.write().insert("A", 9i64);
        assert_eq!(record.get::<i64>("A").unwrap(), Some(9));
    }

    #[test]
    fn test_record_write_visible() {
        let shape = shape(&[("A", SemanticType::Integer), ("Name", SemanticType::Text)]);
        let mapping = ExpandoRecord::new().into_shared();
        let a = shape.bind(Arc::clone(&mapping)).unwrap();
        let b = shape.bind(Arc::clone(&mapping)).unwrap();

        a.set("A", 3i64).unwrap();
        a.set("Name", "n".to_string()).unwrap();

        assert_eq!(b.get::<i64>("A").unwrap(), Some(3));
        assert_eq!(mapping.read().get("Name"), Some(&Value::from("n")));
    }

    #[test]
    fn test_absent_key_is_no_value() {
        let shape = shape(&[("A", SemanticType::Integer), ("B", SemanticType::Integer)]);
        let mapping = [("A", 1i64)]
            .into_iter()
            .collect::<ExpandoRecord>()
            .into_shared();
        let record = shape.bind(mapping).unwrap();

        assert_eq!(record.get::<i64>("B").unwrap(), None);
        assert!(!record.has_value("B").unwrap());
        assert_eq!(record.get_value("B").unwrap(), Value::Null);
    }

    #[test]
    fn test_set_none_stores_null() {
        let shape = shape(&[("B", SemanticType::Integer)]);
        let record = shape.bind(ExpandoRecord::new().into_shared()).unwrap();

        record.set("B", Some(4i64)).unwrap();
        assert!(record.has_value("B").unwrap());

        record.set::<Option<i64>>("B", None).unwrap();
        assert_eq!(record.get::<i64>("B").unwrap(), None);
        assert!(record.mapping().read().contains_key("B"));
    }

    #[test]
    fn test_type_mismatch_at_access_time() {
        let shape = shape(&[("A", SemanticType::Integer)]);
        let mapping = [("A", "not a number")]
            .into_iter()
            .collect::<ExpandoRecord>()
            .into_shared();

        // Binding succeeds; the bad value only surfaces on read
        let record = shape.bind(mapping).unwrap();
        assert!(matches!(
            record.get::<i64>("A"),
            Err(ShapeError::ConversionMismatch { .. })
        ));
        assert!(matches!(
            record.set_value("A", 1.5),
            Err(ShapeError::ConversionMismatch { .. })
        ));
    }

    #[test]
    fn test_copy_shape_cannot_bind() {
        let schema = Schema::from_pairs([("A", SemanticType::Integer)]).unwrap();
        let copy = ShapeCache::new().get_or_synthesize(&schema, Strategy::Copy);
        assert!(matches!(
            copy.bind(ExpandoRecord::new().into_shared()),
            Err(ShapeError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_decimal_bytes_external_fields() {
        let shape = shape(&[
            ("Amount", SemanticType::Decimal),
            ("Blob", SemanticType::Bytes),
            ("Geo", SemanticType::external("Point")),
        ]);
        let record = shape.bind(ExpandoRecord::new().into_shared()).unwrap();

        // Every wrapper field, value-category or not, reports "no value"
        assert!(shape.fields().iter().all(|f| f.is_nullable()));
        assert_eq!(record.get::<Decimal>("Amount").unwrap(), None);
        record.set_value("Amount", Value::Null).unwrap();
        record.set_value("Blob", Value::Null).unwrap();

        record.set("Amount", Decimal::new(1999, 2)).unwrap();
        record.set("Blob", vec![1u8, 2]).unwrap();
        let point = ExternalValue::new("Point", (3, 4));
        record.set_value("Geo", point.clone()).unwrap();

        assert_eq!(record.get::<Decimal>("Amount").unwrap(), Some(Decimal::new(1999, 2)));
        assert_eq!(record.get::<Vec<u8>>("Blob").unwrap(), Some(vec![1, 2]));
        assert_eq!(record.get_value("Geo").unwrap(), Value::External(point));
    }

    #[test]
    fn test_external_type_name_checked() {
        let shape = shape(&[("Geo", SemanticType::external("Point"))]);
        let mapping = ExpandoRecord::new().into_shared();
        let record = shape.bind(Arc::clone(&mapping)).unwrap();

        assert_eq!(
            record
                .set_value("Geo", ExternalValue::new("Polygon", ()))
                .unwrap_err(),
            ShapeError::ConversionMismatch {
                field: "Geo".into(),
                expected: "external:Point".into(),
                found: "external:Polygon".into(),
            }
        );

        // A foreign write with the wrong external type surfaces on read
        mapping.write().insert("Geo", ExternalValue::new("Polygon", ()));
        assert!(record.has_value("Geo").unwrap());
        assert_eq!(
            record.get::<String>("Geo").unwrap_err(),
            ShapeError::ConversionMismatch {
                field: "Geo".into(),
                expected: "external:Point".into(),
                found: "external:Polygon".into(),
            }
        );
    }

    #[test]
    fn test_out_of_range_i32_read() {
        let shape = shape(&[("A", SemanticType::Integer)]);
        let mapping = [("A", i64::MAX)]
            .into_iter()
            .collect::<ExpandoRecord>()
            .into_shared();
        let record = shape.bind(mapping).unwrap();

        assert_eq!(record.get::<i64>("A").unwrap(), Some(i64::MAX));
        assert_eq!(
            record.get::<i32>("A").unwrap_err(),
            ShapeError::ConversionMismatch {
                field: "A".into(),
                expected: "integer".into(),
                found: format!("integer {} (out of range for i32)", i64::MAX),
            }
        );
    }
}
