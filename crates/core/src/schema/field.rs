//! Field and schema definitions
//!
//! A [`Schema`] is the validated set of named, typed fields a shape is
//! synthesized from. Presentation order is kept for display but never
//! affects the schema's [`Signature`](super::Signature).

use std::collections::HashSet;

use tracing::trace;

use crate::error::{ShapeError, ShapeResult};
use crate::expando::ExpandoRecord;
use crate::value::SemanticType;

use super::signature::Signature;

/// One named, typed field
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldSchema {
    name: String,
    ty: SemanticType,
}

impl FieldSchema {
    /// Create a field description
    ///
    /// # Arguments
    /// * `name` - Externally visible field name, also the key in wrapper mappings
    /// * `ty` - Declared semantic type
    pub fn new(name: impl Into<String>, ty: SemanticType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &SemanticType {
        &self.ty
    }
}

/// Validated collection of uniquely named fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<FieldSchema>,
}

impl Schema {
    /// Build a schema, rejecting empty, unnamed and duplicate fields
    ///
    /// Names are compared exactly (case-sensitive).
    pub fn new(fields: impl IntoIterator<Item = FieldSchema>) -> ShapeResult<Self> {
        let fields: Vec<FieldSchema> = fields.into_iter().collect();
        if fields.is_empty() {
            return Err(ShapeError::InvalidArgument(
                "schema must declare at least one field".to_string(),
            ));
        }

        let mut seen = HashSet::with_capacity(fields.len());
        for field in &fields {
            if field.name.is_empty() {
                return Err(ShapeError::InvalidArgument(
                    "field name must not be empty".to_string(),
                ));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(ShapeError::NameCollision(field.name.clone()));
            }
        }

        Ok(Self { fields })
    }

    /// Build a schema from `(name, type)` pairs
    pub fn from_pairs<N: Into<String>>(
        pairs: impl IntoIterator<Item = (N, SemanticType)>,
    ) -> ShapeResult<Self> {
        Self::new(
            pairs
                .into_iter()
                .map(|(name, ty)| FieldSchema::new(name, ty)),
        )
    }

    /// Discover a schema from a sample record
    ///
    /// Each field takes the runtime type of its value. A `Null` value carries
    /// no type and is rejected.
    pub fn infer(record: &ExpandoRecord) -> ShapeResult<Self> {
        let fields = record
            .iter()
            .map(|(name, value)| {
                value
                    .semantic_type()
                    .map(|ty| FieldSchema::new(name, ty))
                    .ok_or_else(|| {
                        ShapeError::InvalidArgument(format!(
                            "cannot infer the type of null field {}",
                            name
                        ))
                    })
            })
            .collect::<ShapeResult<Vec<_>>>()?;

        trace!("Inferred schema with {} fields", fields.len());
        Self::new(fields)
    }

    /// Fields in presentation order
    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Always false; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Canonical, order-independent identity of this schema
    pub fn signature(&self) -> Signature {
        Signature::compute(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn test_duplicate_name_rejected() {
        let err = Schema::from_pairs([
            ("Id", SemanticType::Integer),
            ("Id", SemanticType::Text),
        ])
        .unwrap_err();
        assert_eq!(err, ShapeError::NameCollision("Id".into()));
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let schema = Schema::from_pairs([
            ("Id", SemanticType::Integer),
            ("id", SemanticType::Integer),
        ])
        .unwrap();
        assert_eq!(schema.len(), 2);
    }

    #[test]
    fn test_empty_schema_rejected() {
        let err = Schema::new(Vec::new()).unwrap_err();
        assert!(matches!(err, ShapeError::InvalidArgument(_)));

        let err = Schema::from_pairs([("", SemanticType::Text)]).unwrap_err();
        assert!(matches!(err, ShapeError::InvalidArgument(_)));
    }

    #[test]
    fn test_infer_from_record() {
        let record: ExpandoRecord = [
            ("InputString", Value::from("x")),
            ("OutputValue", Value::Integer(1)),
        ]
        .into_iter()
        .collect();

        let schema = Schema::infer(&record).unwrap();
        assert_eq!(schema.field("InputString").unwrap().ty(), &SemanticType::Text);
        assert_eq!(schema.field("OutputValue").unwrap().ty(), &SemanticType::Integer);
    }

    #[test]
    fn test_infer_rejects_null() {
        let record: ExpandoRecord = [("Missing", Value::Null)].into_iter().collect();
        assert!(matches!(
            Schema::infer(&record),
            Err(ShapeError::InvalidArgument(_))
        ));
    }
}
