pub mod logical;
pub mod physical;

pub use logical::*;
pub use physical::{PhysicalType, PhysicalValue};

use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum Error {
    #[error("Physical type mismatch: expected {actual_type}, found {requested_type}")]
    PhysicalTypeMismatch {
        requested_type: &'static str,
        actual_type: &'static str,
    },
    #[error("Physical type '{physical_type}' is not compatible with logical type '{logical_type}'")]
    PhysicalTypeIncompatible {
        physical_type: &'static str,
        logical_type: Datatype,
    },
    #[error(
        "Logical type mismatch: expected {actual_type}, found {requested_type}"
    )]
    LogicalTypeMismatch {
        requested_type: Datatype,
        actual_type: Datatype,
    },
}

impl Error {
    pub fn physical_type_mismatch<T, U>() -> Self {
        Self::PhysicalTypeMismatch {
            requested_type: std::any::type_name::<T>(),
            actual_type: std::any::type_name::<U>(),
        }
    }

    pub fn physical_type_incompatible<T>(logical_type: Datatype) -> Self {
        Self::PhysicalTypeIncompatible {
            physical_type: std::any::type_name::<T>(),
            logical_type,
        }
    }
}

/// The closed set of cell datatypes.
///
/// Each tag induces an ordering, a canonical byte layout, a domain,
/// and a "next representable value" function
/// (see [physical::NextValue]).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub enum Datatype {
    /// An 8-bit signed integer
    Int8,
    /// A 16-bit signed integer
    Int16,
    /// A 32-bit signed integer
    Int32,
    /// A 64-bit signed integer
    Int64,
    /// An 8-bit unsigned integer
    UInt8,
    /// A 16-bit unsigned integer
    UInt16,
    /// A 32-bit unsigned integer
    UInt32,
    /// A 64-bit unsigned integer
    UInt64,
    /// A 32-bit floating point value
    Float32,
    /// A 64-bit floating point value
    Float64,
    /// A variable-length ASCII string
    StringAscii,
    /// A variable-length UTF-8 string
    StringUtf8,
}

const DATATYPES: [Datatype; 12] = [
    Datatype::Int8,
    Datatype::Int16,
    Datatype::Int32,
    Datatype::Int64,
    Datatype::UInt8,
    Datatype::UInt16,
    Datatype::UInt32,
    Datatype::UInt64,
    Datatype::Float32,
    Datatype::Float64,
    Datatype::StringAscii,
    Datatype::StringUtf8,
];

impl Datatype {
    /// Returns the size in bytes of one value of this datatype.
    /// For string types this is the size of one character.
    pub fn size(&self) -> usize {
        crate::physical_type_go!(self, DT, std::mem::size_of::<DT>())
    }

    pub fn is_compatible_type<T: 'static>(&self) -> bool {
        use std::any::TypeId;

        let tid = TypeId::of::<T>();
        if tid == TypeId::of::<f32>() {
            matches!(*self, Datatype::Float32)
        } else if tid == TypeId::of::<f64>() {
            matches!(*self, Datatype::Float64)
        } else if tid == TypeId::of::<i8>() {
            matches!(*self, Datatype::Int8)
        } else if tid == TypeId::of::<u8>() {
            matches!(
                *self,
                Datatype::UInt8 | Datatype::StringAscii | Datatype::StringUtf8
            )
        } else if tid == TypeId::of::<i16>() {
            matches!(*self, Datatype::Int16)
        } else if tid == TypeId::of::<u16>() {
            matches!(*self, Datatype::UInt16)
        } else if tid == TypeId::of::<i32>() {
            matches!(*self, Datatype::Int32)
        } else if tid == TypeId::of::<u32>() {
            matches!(*self, Datatype::UInt32)
        } else if tid == TypeId::of::<i64>() {
            matches!(*self, Datatype::Int64)
        } else if tid == TypeId::of::<u64>() {
            matches!(*self, Datatype::UInt64)
        } else {
            false
        }
    }

    /// Returns whether this type is an integral type (i.e. integer)
    pub fn is_integral_type(&self) -> bool {
        matches!(
            *self,
            Datatype::Int8
                | Datatype::Int16
                | Datatype::Int32
                | Datatype::Int64
                | Datatype::UInt8
                | Datatype::UInt16
                | Datatype::UInt32
                | Datatype::UInt64
        )
    }

    /// Returns whether this type is a real number (i.e. floating point)
    pub fn is_real_type(&self) -> bool {
        matches!(*self, Datatype::Float32 | Datatype::Float64)
    }

    /// Returns whether this type is a variable-length string type
    pub fn is_string_type(&self) -> bool {
        matches!(*self, Datatype::StringAscii | Datatype::StringUtf8)
    }

    /// Returns whether this type can be used as a dimension type
    /// of a sparse array
    pub fn is_allowed_dimension_type_sparse(&self) -> bool {
        self.is_integral_type()
            || self.is_real_type()
            || matches!(*self, Datatype::StringAscii)
    }

    /// Returns whether this type can be used as a dimension type
    /// of a dense array
    pub fn is_allowed_dimension_type_dense(&self) -> bool {
        self.is_integral_type()
    }

    pub fn same_physical_type(&self, other: &Datatype) -> bool {
        crate::physical_type_go!(self, MyPhysicalType, {
            crate::physical_type_go!(other, TheirPhysicalType, {
                std::any::TypeId::of::<MyPhysicalType>()
                    == std::any::TypeId::of::<TheirPhysicalType>()
            })
        })
    }

    /// Returns an `Iterator` which yields each variant of `Datatype`
    /// exactly once in an unspecified order.
    pub fn iter() -> impl Iterator<Item = Datatype> {
        DATATYPES.iter().copied()
    }
}

impl Display for Datatype {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        Debug::fmt(self, f)
    }
}

impl FromStr for Datatype {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.to_ascii_lowercase();
        match s.as_ref() {
            "int8" => Ok(Datatype::Int8),
            "int16" => Ok(Datatype::Int16),
            "int32" => Ok(Datatype::Int32),
            "int64" => Ok(Datatype::Int64),
            "uint8" => Ok(Datatype::UInt8),
            "uint16" => Ok(Datatype::UInt16),
            "uint32" => Ok(Datatype::UInt32),
            "uint64" => Ok(Datatype::UInt64),
            "float32" => Ok(Datatype::Float32),
            "float64" => Ok(Datatype::Float64),
            "stringascii" => Ok(Datatype::StringAscii),
            "stringutf8" => Ok(Datatype::StringUtf8),
            _ => Err(s),
        }
    }
}

/// Apply a generic expression `$then` with a static type binding in the
/// identifier `$typename` for a logical type corresponding to the dynamic
/// `$datatype`.
#[macro_export]
macro_rules! logical_type_go {
    ($datatype:expr, $typename:ident, $then:expr) => {{
        type Datatype = $crate::datatype::Datatype;
        match $datatype {
            Datatype::Int8 => {
                type $typename = $crate::datatype::logical::Int8Type;
                $then
            }
            Datatype::Int16 => {
                type $typename = $crate::datatype::logical::Int16Type;
                $then
            }
            Datatype::Int32 => {
                type $typename = $crate::datatype::logical::Int32Type;
                $then
            }
            Datatype::Int64 => {
                type $typename = $crate::datatype::logical::Int64Type;
                $then
            }
            Datatype::UInt8 => {
                type $typename = $crate::datatype::logical::UInt8Type;
                $then
            }
            Datatype::UInt16 => {
                type $typename = $crate::datatype::logical::UInt16Type;
                $then
            }
            Datatype::UInt32 => {
                type $typename = $crate::datatype::logical::UInt32Type;
                $then
            }
            Datatype::UInt64 => {
                type $typename = $crate::datatype::logical::UInt64Type;
                $then
            }
            Datatype::Float32 => {
                type $typename = $crate::datatype::logical::Float32Type;
                $then
            }
            Datatype::Float64 => {
                type $typename = $crate::datatype::logical::Float64Type;
                $then
            }
            Datatype::StringAscii => {
                type $typename = $crate::datatype::logical::StringAsciiType;
                $then
            }
            Datatype::StringUtf8 => {
                type $typename = $crate::datatype::logical::StringUtf8Type;
                $then
            }
        }
    }};
}

/// Apply a generic expression `$then` with a static type binding in the
/// identifier `$typename` for the physical type corresponding to the
/// dynamic `$datatype`.
#[macro_export]
macro_rules! physical_type_go {
    ($datatype:expr, $typename:ident, $then:expr) => {{
        $crate::logical_type_go!($datatype, PhysicalTypeGoLogicalType, {
            type $typename = <PhysicalTypeGoLogicalType as $crate::datatype::LogicalType>::PhysicalType;
            $then
        })
    }};
}

#[cfg(any(test, feature = "proptest-strategies"))]
pub mod strategy {
    use proptest::prelude::*;

    use super::*;

    impl Arbitrary for Datatype {
        type Parameters = ();
        type Strategy = BoxedStrategy<Datatype>;

        fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
            proptest::strategy::Union::new(
                DATATYPES.iter().copied().map(Just),
            )
            .boxed()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn datatype_sizes() {
        assert_eq!(1, Datatype::Int8.size());
        assert_eq!(1, Datatype::UInt8.size());
        assert_eq!(1, Datatype::StringAscii.size());
        assert_eq!(2, Datatype::Int16.size());
        assert_eq!(4, Datatype::Int32.size());
        assert_eq!(4, Datatype::Float32.size());
        assert_eq!(8, Datatype::Int64.size());
        assert_eq!(8, Datatype::UInt64.size());
        assert_eq!(8, Datatype::Float64.size());
    }

    #[test]
    fn datatype_string_roundtrip() {
        for dt in Datatype::iter() {
            let s = dt.to_string();
            assert_eq!(Ok(dt), Datatype::from_str(&s));
        }
    }

    #[test]
    fn datatype_iter_distinct() {
        let mut seen = HashSet::new();
        for dt in Datatype::iter() {
            assert!(seen.insert(dt.to_string()));
        }
        assert_eq!(DATATYPES.len(), seen.len());
    }

    #[test]
    fn datatype_predicates_partition() {
        for dt in Datatype::iter() {
            let classes = [
                dt.is_integral_type(),
                dt.is_real_type(),
                dt.is_string_type(),
            ];
            assert_eq!(
                1,
                classes.iter().filter(|c| **c).count(),
                "{} must belong to exactly one class",
                dt
            );
        }
    }

    #[test]
    fn dimension_admissibility() {
        assert!(Datatype::Int32.is_allowed_dimension_type_dense());
        assert!(!Datatype::Float64.is_allowed_dimension_type_dense());
        assert!(Datatype::Float64.is_allowed_dimension_type_sparse());
        assert!(Datatype::StringAscii.is_allowed_dimension_type_sparse());
        assert!(!Datatype::StringAscii.is_allowed_dimension_type_dense());
        assert!(!Datatype::StringUtf8.is_allowed_dimension_type_sparse());
    }

    #[test]
    fn compatible_types() {
        assert!(Datatype::UInt8.is_compatible_type::<u8>());
        assert!(Datatype::StringAscii.is_compatible_type::<u8>());
        assert!(!Datatype::Int8.is_compatible_type::<u8>());
        assert!(Datatype::Float64.is_compatible_type::<f64>());
        assert!(!Datatype::Float64.is_compatible_type::<f32>());
    }
}
