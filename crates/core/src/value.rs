//! Runtime values and semantic types
//!
//! A [`Value`] is one cell of a generic record. A [`SemanticType`] is the
//! declared type of a schema field. The [`FieldValue`] trait links the two for
//! Rust types that can sit in a typed field.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

use crate::error::{ShapeError, ShapeResult};

/// Declared type of a schema field
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SemanticType {
    Integer,
    Float,
    Boolean,
    Text,
    DateTime,
    Bytes,
    Decimal,
    /// Opaque placeholder for a type this crate does not interpret
    External(String),
}

impl SemanticType {
    /// Opaque external type with the given name
    pub fn external(name: impl Into<String>) -> Self {
        Self::External(name.into())
    }

    /// Whether the type has no natural "absent" representation
    ///
    /// Copy-strategy shapes reject `Null` for fields of these types.
    pub fn is_value_category(&self) -> bool {
        matches!(
            self,
            Self::Integer | Self::Float | Self::Boolean | Self::DateTime | Self::Decimal
        )
    }

    /// Stable token identifying this type inside a signature
    pub fn token(&self) -> String {
        match self {
            Self::Integer => "integer".to_string(),
            Self::Float => "float".to_string(),
            Self::Boolean => "boolean".to_string(),
            Self::Text => "text".to_string(),
            Self::DateTime => "datetime".to_string(),
            Self::Bytes => "bytes".to_string(),
            Self::Decimal => "decimal".to_string(),
            Self::External(name) => format!("external:{}", name),
        }
    }

    /// Value a freshly constructed copy-strategy slot holds
    pub fn default_value(&self) -> Value {
        match self {
            Self::Integer => Value::Integer(0),
            Self::Float => Value::Float(0.0),
            Self::Boolean => Value::Boolean(false),
            Self::Text => Value::Text(String::new()),
            Self::DateTime => Value::DateTime(NaiveDateTime::default()),
            Self::Bytes => Value::Bytes(Vec::new()),
            Self::Decimal => Value::Decimal(Decimal::ZERO),
            Self::External(_) => Value::Null,
        }
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token())
    }
}

/// Payload of an external-typed value
///
/// Equality is identity of the shared payload, not structural.
#[derive(Clone)]
pub struct ExternalValue {
    type_name: Arc<str>,
    payload: Arc<dyn Any + Send + Sync>,
}

impl ExternalValue {
    pub fn new<T: Any + Send + Sync>(type_name: &str, payload: T) -> Self {
        Self {
            type_name: Arc::from(type_name),
            payload: Arc::new(payload),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Borrow the payload as a concrete type
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }
}

impl PartialEq for ExternalValue {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name
            && std::ptr::eq(
                Arc::as_ptr(&self.payload) as *const (),
                Arc::as_ptr(&other.payload) as *const (),
            )
    }
}

impl fmt::Debug for ExternalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExternalValue")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// A single dynamically typed cell
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Text(String),
    DateTime(NaiveDateTime),
    Bytes(Vec<u8>),
    Decimal(Decimal),
    External(ExternalValue),
}

impl Value {
    /// Runtime type of the value, `None` for `Null`
    pub fn semantic_type(&self) -> Option<SemanticType> {
        match self {
            Self::Null => None,
            Self::Integer(_) => Some(SemanticType::Integer),
            Self::Float(_) => Some(SemanticType::Float),
            Self::Boolean(_) => Some(SemanticType::Boolean),
            Self::Text(_) => Some(SemanticType::Text),
            Self::DateTime(_) => Some(SemanticType::DateTime),
            Self::Bytes(_) => Some(SemanticType::Bytes),
            Self::Decimal(_) => Some(SemanticType::Decimal),
            Self::External(ext) => Some(SemanticType::External(ext.type_name().to_string())),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Type label for diagnostics
    pub fn type_label(&self) -> String {
        self.semantic_type()
            .map(|ty| ty.token())
            .unwrap_or_else(|| "null".to_string())
    }
}

/// Check that `value` may be stored in a field declared as `ty`
///
/// `Null` passes only when `accepts_null` is set. No widening: an integer is
/// never stored in a float field.
pub(crate) fn check_assignable(
    field: &str,
    ty: &SemanticType,
    value: &Value,
    accepts_null: bool,
) -> ShapeResult<()> {
    match value.semantic_type() {
        None if accepts_null => Ok(()),
        Some(ref found) if found == ty => Ok(()),
        _ => Err(ShapeError::mismatch(field, ty, value.type_label())),
    }
}

/// Unbox `value` as `T`, reporting a mismatch against `T`'s declared type
///
/// A value of the right type that `T` still rejects (an integer too wide for
/// `i32`) is reported with the offending value.
pub(crate) fn unbox<T: FieldValue>(field: &str, value: &Value) -> ShapeResult<T> {
    T::from_value(value).ok_or_else(|| {
        let expected = T::semantic_type();
        let found = match value {
            Value::Integer(v) if expected == SemanticType::Integer => {
                format!("integer {} (out of range for {})", v, std::any::type_name::<T>())
            }
            _ => value.type_label(),
        };
        ShapeError::mismatch(field, expected, found)
    })
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Integer(v) => serializer.serialize_i64(*v),
            Self::Float(v) => serializer.serialize_f64(*v),
            Self::Boolean(v) => serializer.serialize_bool(*v),
            Self::Text(v) => serializer.serialize_str(v),
            Self::DateTime(v) => {
                serializer.serialize_str(&v.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
            }
            Self::Bytes(v) => serializer.serialize_bytes(v),
            Self::Decimal(v) => serializer.serialize_str(&v.to_string()),
            Self::External(ext) => {
                serializer.serialize_str(&format!("<external:{}>", ext.type_name()))
            }
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Self::DateTime(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Self::Decimal(v)
    }
}

impl From<ExternalValue> for Value {
    fn from(v: ExternalValue) -> Self {
        Self::External(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Rust types that can be stored in a typed record field
///
/// `from_value` is a strict unbox: it succeeds only when the runtime value
/// already has the matching type.
pub trait FieldValue: Sized {
    /// Declared type this Rust type maps to
    fn semantic_type() -> SemanticType;

    /// Unbox from a runtime value
    fn from_value(value: &Value) -> Option<Self>;

    /// Box into a runtime value
    fn into_value(self) -> Value;
}

macro_rules! scalar_field_value {
    ($ty:ty, $variant:ident) => {
        impl FieldValue for $ty {
            fn semantic_type() -> SemanticType {
                SemanticType::$variant
            }

            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::$variant(v) => Some(v.clone()),
                    _ => None,
                }
            }

            fn into_value(self) -> Value {
                Value::$variant(self)
            }
        }
    };
}

scalar_field_value!(i64, Integer);
scalar_field_value!(f64, Float);
scalar_field_value!(bool, Boolean);
scalar_field_value!(String, Text);
scalar_field_value!(NaiveDateTime, DateTime);
scalar_field_value!(Vec<u8>, Bytes);
scalar_field_value!(Decimal, Decimal);

impl FieldValue for i32 {
    fn semantic_type() -> SemanticType {
        SemanticType::Integer
    }

    /// Succeeds only when the integer fits without truncation
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Integer(v) => i32::try_from(*v).ok(),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::Integer(i64::from(self))
    }
}

impl<T: FieldValue> FieldValue for Option<T> {
    fn semantic_type() -> SemanticType {
        T::semantic_type()
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(None),
            other => T::from_value(other).map(Some),
        }
    }

    fn into_value(self) -> Value {
        self.map(T::into_value).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_category() {
        assert!(SemanticType::Integer.is_value_category());
        assert!(SemanticType::DateTime.is_value_category());
        assert!(!SemanticType::Text.is_value_category());
        assert!(!SemanticType::external("Geometry").is_value_category());
    }

    #[test]
    fn test_type_tokens_unique() {
        let tokens: std::collections::HashSet<String> = [
            SemanticType::Integer,
            SemanticType::Float,
            SemanticType::Boolean,
            SemanticType::Text,
            SemanticType::DateTime,
            SemanticType::Bytes,
            SemanticType::Decimal,
            SemanticType::external("integer"),
        ]
        .iter()
        .map(SemanticType::token)
        .collect();
        assert_eq!(tokens.len(), 8);
    }

    #[test]
    fn test_strict_unbox() {
        assert_eq!(i64::from_value(&Value::Integer(7)), Some(7));
        assert_eq!(i64::from_value(&Value::Float(7.0)), None);
        assert_eq!(f64::from_value(&Value::Integer(7)), None);
        assert_eq!(String::from_value(&Value::Null), None);
        assert_eq!(i32::from_value(&Value::Integer(7)), Some(7));
        assert_eq!(i32::from_value(&Value::Integer(i64::MAX)), None);
    }

    #[test]
    fn test_option_unbox() {
        assert_eq!(Option::<i64>::from_value(&Value::Null), Some(None));
        assert_eq!(Option::<i64>::from_value(&Value::Integer(3)), Some(Some(3)));
        assert_eq!(Option::<i64>::from_value(&Value::Text("3".into())), None);
        assert_eq!(Option::<bool>::None.into_value(), Value::Null);
    }

    #[test]
    fn test_check_assignable() {
        assert!(check_assignable("a", &SemanticType::Text, &Value::from("x"), false).is_ok());
        assert!(check_assignable("a", &SemanticType::Text, &Value::Null, true).is_ok());
        assert!(check_assignable("a", &SemanticType::Integer, &Value::Null, false).is_err());

        let err =
            check_assignable("a", &SemanticType::Float, &Value::Integer(1), true).unwrap_err();
        assert_eq!(
            err,
            ShapeError::ConversionMismatch {
                field: "a".into(),
                expected: "float".into(),
                found: "integer".into(),
            }
        );
    }

    #[test]
    fn test_external_identity() {
        let a = ExternalValue::new("Point", (1, 2));
        let b = a.clone();
        let c = ExternalValue::new("Point", (1, 2));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.downcast_ref::<(i32, i32)>(), Some(&(1, 2)));
        assert_eq!(
            Value::from(a).semantic_type(),
            Some(SemanticType::external("Point"))
        );
    }

    #[test]
    fn test_serialize_json() {
        let json = serde_json::to_string(&Value::Integer(5)).unwrap();
        assert_eq!(json, "5");
        let json = serde_json::to_string(&Value::Null).unwrap();
        assert_eq!(json, "null");
        let json = serde_json::to_string(&Value::Decimal(Decimal::new(150, 2))).unwrap();
        assert_eq!(json, "\"1.50\"");
    }
}
