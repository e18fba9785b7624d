//! Provides "plain old data" representations of array structures.
//!
//! "Plain old data" is used to describe types in C++ programming which
//! have no constructors, destructors, or virtual member functions.
//! Values of these types can be duplicated by copying bits.
//!
//! The structures defined in this crate are descriptions of array
//! schemas which expose their attributes as public fields. They carry
//! no storage handles; query planning consumes them as values.
//!
//! ## Features
//!
//! * `proptest-strategies`: Provides `proptest::arbitrary::Arbitrary`
//!   implementations for many of the structures defined in this crate
//!   for use with property-based testing.
//! * `serde`: Provides `serde::Deserialize` and `serde::Serialize`
//!   implementations for many of the structures defined in this crate.

pub mod array;

pub use array::{
    AttributeData, DimensionData, DomainData, FieldData, LookupKey,
    SchemaData,
};
