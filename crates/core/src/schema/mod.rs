//! Schemas and signatures
//!
//! A schema is the named, typed field set discovered from external data
//! (for example the column metadata of a query result). Its [`Signature`] is
//! the canonical identity used to key the shape cache: two schemas with the
//! same `(name, type)` pairs in any order share one signature, and any change
//! to a name or type produces a different one.
//!
//! # Usage
//!
//! ```ignore
//! use rowshape_core::schema::{signature, Schema};
//! use rowshape_core::value::SemanticType;
//!
//! let schema = Schema::from_pairs([
//!     ("InputString", SemanticType::Text),
//!     ("OutputValue", SemanticType::Integer),
//! ])?;
//!
//! println!("{}", signature(&schema).identifier());
//! ```

pub mod field;
pub mod hash;
pub mod signature;

pub use field::{FieldSchema, Schema};
pub use hash::{fnv1a_32, fnv1a_64};
pub use signature::{signature, Signature};
