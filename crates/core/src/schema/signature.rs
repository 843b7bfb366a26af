//! Canonical schema signatures
//!
//! Each field contributes the token `<len>:<name>=<len>:<type>;`. Length
//! prefixes on both halves keep the encoding injective even when names or
//! external type names contain the separator characters, so two different
//! field sets never share a canonical string. Fields are sorted by name
//! before encoding, which makes the result independent of presentation order.

use std::fmt;
use std::sync::Arc;

use super::field::{FieldSchema, Schema};
use super::hash::fnv1a_64;

/// Order-independent identity of a schema
///
/// Equality and hashing use the full canonical text. The 64-bit hash is only
/// used to derive [`identifier`](Self::identifier).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    canonical: Arc<str>,
    hash: u64,
}

impl Signature {
    /// Compute the signature of a schema
    pub fn compute(schema: &Schema) -> Self {
        let mut fields: Vec<&FieldSchema> = schema.fields().iter().collect();
        fields.sort_by(|a, b| a.name().cmp(b.name()));

        let canonical: String = fields
            .into_iter()
            .map(|field| {
                let token = field.ty().token();
                format!(
                    "{}:{}={}:{};",
                    field.name().len(),
                    field.name(),
                    token.len(),
                    token
                )
            })
            .collect();

        let hash = fnv1a_64(canonical.as_bytes());
        Self {
            canonical: Arc::from(canonical),
            hash,
        }
    }

    /// Full canonical encoding
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    /// FNV-1a 64-bit hash of the canonical encoding
    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// Fixed-length name usable as a shape identifier
    pub fn identifier(&self) -> String {
        format!("shape_{:016x}", self.hash)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shape_{:016x}", self.hash)
    }
}

/// Compute the signature of a schema
pub fn signature(schema: &Schema) -> Signature {
    Signature::compute(schema)
}
