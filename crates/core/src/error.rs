//! Error types for shape synthesis and record conversion

/// Error type for schema, shape and conversion operations
///
/// Every variant is a caller contract violation. Nothing here is retried or
/// recovered internally; the error is returned to the immediate caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShapeError {
    /// A required argument was absent or unusable for the operation
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Two fields in one schema share a name
    #[error("Duplicate field name in schema: {0}")]
    NameCollision(String),

    /// A field value is missing or its runtime type does not match the declared type
    #[error("Conversion mismatch on field {field}: expected {expected}, found {found}")]
    ConversionMismatch {
        field: String,
        expected: String,
        found: String,
    },

    /// The shape has no field with this name
    #[error("Unknown field: {0}")]
    UnknownField(String),
}

impl ShapeError {
    /// Mismatch for a field that is absent from the source record
    pub(crate) fn missing(field: &str, expected: impl ToString) -> Self {
        Self::ConversionMismatch {
            field: field.to_string(),
            expected: expected.to_string(),
            found: "<missing>".to_string(),
        }
    }

    /// Mismatch for a field whose value has the wrong runtime type
    pub(crate) fn mismatch(field: &str, expected: impl ToString, found: impl ToString) -> Self {
        Self::ConversionMismatch {
            field: field.to_string(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }
}

/// Result type for shape operations
pub type ShapeResult<T> = Result<T, ShapeError>;
