//! Shapes - synthesized record definitions
//!
//! A [`Shape`] is built once per `(signature, strategy)` and then shared by
//! every caller for the rest of the process. It carries the field list plus a
//! name-to-slot lookup table that record accessors and converters dispatch
//! through.
//!
//! # Strategies
//!
//! ```text
//! ┌──────────────────────────────┐   ┌──────────────────────────────┐
//! │ Strategy::Copy               │   │ Strategy::Wrapper            │
//! │   CopyRecord                 │   │   WrapperRecord              │
//! │   - owns one slot per field  │   │   - owns no field data       │
//! │   - Shape::new_instance()    │   │   - Shape::bind(SharedMap)   │
//! │     default-initializes      │   │   - reads/writes go to the   │
//! │     every slot               │   │     shared mapping by name   │
//! └──────────────────────────────┘   └──────────────────────────────┘
//! ```
//!
//! Both strategies are requested through the process-wide [`ShapeCache`],
//! which guarantees a single published shape per key.

pub mod cache;
pub mod copy;
pub mod wrapper;

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use bitflags::bitflags;

use crate::error::{ShapeError, ShapeResult};
use crate::schema::{Schema, Signature};
use crate::value::SemanticType;

pub use cache::ShapeCache;
pub use copy::{synthesize_copy_shape, CopyRecord};
pub use wrapper::{synthesize_wrapper_shape, WrapperRecord};

bitflags! {
    /// Accessor capabilities of a shape field
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FieldFlags: u8 {
        /// Field has a set accessor and is populated by converters
        const SETTABLE = 0x01;
        /// Field can report "no value"
        const NULLABLE = 0x02;
    }
}

/// Backing strategy of a shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Instances own private storage for every field
    Copy,
    /// Instances are views over a shared external mapping
    Wrapper,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Copy => f.write_str("copy"),
            Self::Wrapper => f.write_str("wrapper"),
        }
    }
}

/// Process-unique identity of a synthesized shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeId(u64);

impl ShapeId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// One accessor of a shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    name: String,
    ty: SemanticType,
    flags: FieldFlags,
    slot: usize,
}

impl FieldDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type of the field
    pub fn ty(&self) -> &SemanticType {
        &self.ty
    }

    pub fn flags(&self) -> FieldFlags {
        self.flags
    }

    pub fn is_settable(&self) -> bool {
        self.flags.contains(FieldFlags::SETTABLE)
    }

    pub fn is_nullable(&self) -> bool {
        self.flags.contains(FieldFlags::NULLABLE)
    }

    /// Storage slot index (copy strategy)
    pub fn slot(&self) -> usize {
        self.slot
    }
}

/// A synthesized record definition
#[derive(Debug)]
pub struct Shape {
    id: ShapeId,
    signature: Signature,
    strategy: Strategy,
    fields: Vec<FieldDescriptor>,
    index: HashMap<String, usize>,
}

impl Shape {
    /// Build a new shape (uncached)
    ///
    /// Field order follows the schema's presentation order.
    pub(crate) fn synthesize(schema: &Schema, signature: Signature, strategy: Strategy) -> Self {
        let fields: Vec<FieldDescriptor> = schema
            .fields()
            .iter()
            .enumerate()
            .map(|(slot, field)| {
                let mut flags = FieldFlags::SETTABLE;
                // Value-category fields only become nullable under the wrapper strategy
                if strategy == Strategy::Wrapper || !field.ty().is_value_category() {
                    flags |= FieldFlags::NULLABLE;
                }
                FieldDescriptor {
                    name: field.name().to_string(),
                    ty: field.ty().clone(),
                    flags,
                    slot,
                }
            })
            .collect();

        let index = fields
            .iter()
            .map(|f| (f.name.clone(), f.slot))
            .collect();

        Self {
            id: ShapeId::next(),
            signature,
            strategy,
            fields,
            index,
        }
    }

    pub fn id(&self) -> ShapeId {
        self.id
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Synthesized identifier, derived from the signature hash
    pub fn name(&self) -> String {
        match self.strategy {
            Strategy::Copy => self.signature.identifier(),
            Strategy::Wrapper => format!("{}_wrapper", self.signature.identifier()),
        }
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Fields in declaration order
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.index.get(name).map(|&slot| &self.fields[slot])
    }

    /// The schema this shape exposes
    pub fn schema(&self) -> ShapeResult<Schema> {
        Schema::from_pairs(self.fields.iter().map(|f| (f.name.clone(), f.ty.clone())))
    }

    pub(crate) fn require_field(&self, name: &str) -> ShapeResult<&FieldDescriptor> {
        self.field(name)
            .ok_or_else(|| ShapeError::UnknownField(name.to_string()))
    }

    pub(crate) fn require_strategy(&self, expected: Strategy) -> ShapeResult<()> {
        if self.strategy == expected {
            Ok(())
        } else {
            Err(ShapeError::InvalidArgument(format!(
                "shape {} uses the {} strategy, expected {}",
                self.name(),
                self.strategy,
                expected
            )))
        }
    }
}

/// Shapes compare by identity
impl PartialEq for Shape {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Shape {}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Schema {
        Schema::from_pairs([
            ("Name", SemanticType::Text),
            ("Count", SemanticType::Integer),
        ])
        .unwrap()
    }

    #[test]
    fn test_copy_field_flags() {
        let s = schema();
        let shape = Shape::synthesize(&s, s.signature(), Strategy::Copy);
        let name = shape.field("Name").unwrap();
        let count = shape.field("Count").unwrap();

        assert!(name.is_settable() && name.is_nullable());
        assert!(count.is_settable() && !count.is_nullable());
        assert_eq!(count.slot(), 1);
    }

    #[test]
    fn test_wrapper_value_fields_nullable() {
        let s = schema();
        let shape = Shape::synthesize(&s, s.signature(), Strategy::Wrapper);
        assert!(shape.fields().iter().all(FieldDescriptor::is_nullable));
        assert!(shape.name().ends_with("_wrapper"));
    }

    #[test]
    fn test_ids_are_unique() {
        let s = schema();
        let a = Shape::synthesize(&s, s.signature(), Strategy::Copy);
        let b = Shape::synthesize(&s, s.signature(), Strategy::Copy);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_unknown_field() {
        let s = schema();
        let shape = Shape::synthesize(&s, s.signature(), Strategy::Copy);
        assert_eq!(
            shape.require_field("name").unwrap_err(),
            ShapeError::UnknownField("name".into())
        );
        assert!(shape.require_strategy(Strategy::Wrapper).is_err());
        assert_eq!(shape.schema().unwrap(), s);
    }
}
