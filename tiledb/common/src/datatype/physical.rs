use std::cmp::Ordering;
use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::hash::{Hash, Hasher};

use crate::datatype::Error;
use crate::private::sealed;

/// Trait for comparisons based on value bits.
/// This exists to work around float `NaN` which is not equal to itself,
/// preventing float types from being `Eq` for generic operations.
pub trait BitsEq {
    /// Test if two values have the same bits.
    ///
    /// This is often the same as `PartialEq::eq`, but is not in the case
    /// of floats where `NaN != NaN`.
    fn bits_eq(&self, other: &Self) -> bool;

    fn bits_ne(&self, other: &Self) -> bool {
        !self.bits_eq(other)
    }
}

impl<T> BitsEq for &T
where
    T: BitsEq,
{
    fn bits_eq(&self, other: &Self) -> bool {
        (**self).bits_eq(*other)
    }
}

impl<T> BitsEq for [T]
where
    T: BitsEq,
{
    fn bits_eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self.iter().zip(other.iter()).all(|(l, r)| l.bits_eq(r))
    }
}

impl<T> BitsEq for Vec<T>
where
    T: BitsEq,
{
    fn bits_eq(&self, other: &Self) -> bool {
        self.as_slice().bits_eq(other.as_slice())
    }
}

/// Trait for ordering based on value bits.
/// This exists to work around float `NaN` which prevents float from being
/// a total order for use with generic operations.
pub trait BitsOrd {
    /// Return the ordering between `self` and `other`.
    /// This function defines a total order for all values of `Self`.
    fn bits_cmp(&self, other: &Self) -> Ordering;

    /// Returns `true` if `self` is less than `other` by `self.bits_cmp`.
    fn bits_lt(&self, other: &Self) -> bool {
        matches!(self.bits_cmp(other), Ordering::Less)
    }

    /// Returns `true` if `self` is less than or equal to `other` by `self.bits_cmp`.
    fn bits_le(&self, other: &Self) -> bool {
        matches!(self.bits_cmp(other), Ordering::Less | Ordering::Equal)
    }

    /// Returns `true` if `self` is greater than or equal to `other` by `self.bits_cmp`.
    fn bits_ge(&self, other: &Self) -> bool {
        matches!(self.bits_cmp(other), Ordering::Equal | Ordering::Greater)
    }

    /// Returns `true` if `self` is greater than `other` by `self.bits_cmp`.
    fn bits_gt(&self, other: &Self) -> bool {
        matches!(self.bits_cmp(other), Ordering::Greater)
    }
}

impl<T> BitsOrd for &T
where
    T: BitsOrd,
{
    fn bits_cmp(&self, other: &Self) -> Ordering {
        (**self).bits_cmp(*other)
    }
}

/// Implements lexicographic comparison of slices using the `BitsOrd` trait
/// of the element.
impl<T> BitsOrd for [T]
where
    T: BitsOrd,
{
    fn bits_cmp(&self, other: &Self) -> Ordering {
        for (l, r) in self.iter().zip(other.iter()) {
            match l.bits_cmp(r) {
                Ordering::Less => return Ordering::Less,
                Ordering::Greater => return Ordering::Greater,
                Ordering::Equal => continue,
            }
        }

        self.len().cmp(&other.len())
    }
}

/// Implements lexicographic comparison of vectors using the `BitsOrd` trait
/// of the element.
impl<T> BitsOrd for Vec<T>
where
    T: BitsOrd,
{
    fn bits_cmp(&self, other: &Self) -> Ordering {
        self.as_slice().bits_cmp(other.as_slice())
    }
}

/// Trait for hashing based on value bits.
/// This exists to work around float types, which do not implement `Hash`.
pub trait BitsHash {
    fn bits_hash<H>(&self, state: &mut H)
    where
        H: Hasher;
}

impl<T> BitsHash for &T
where
    T: BitsHash,
{
    fn bits_hash<H>(&self, state: &mut H)
    where
        H: Hasher,
    {
        (**self).bits_hash(state)
    }
}

impl<T> BitsHash for [T]
where
    T: BitsHash,
{
    fn bits_hash<H>(&self, state: &mut H)
    where
        H: Hasher,
    {
        let adapted = self.iter().map(BitsKeyAdapter).collect::<Vec<_>>();
        adapted.hash(state)
    }
}

impl<T> BitsHash for Vec<T>
where
    T: BitsHash,
{
    fn bits_hash<H>(&self, state: &mut H)
    where
        H: Hasher,
    {
        self.as_slice().bits_hash(state)
    }
}

/// Trait for the successor of a value in the `BitsOrd` total order.
///
/// This is the "next representable value" used to construct the right-hand
/// side of a range split: integers step by one, floats step to the next
/// representable value toward positive infinity (`nextafter`).
pub trait NextValue: Sized {
    /// Returns the smallest value strictly greater than `self`,
    /// or `None` if `self` is the greatest value of its type.
    fn next_value(self) -> Option<Self>;
}

macro_rules! integral_next_value {
    ($($T:ty),+) => {
        $(
            impl NextValue for $T {
                fn next_value(self) -> Option<Self> {
                    self.checked_add(1)
                }
            }
        )+
    }
}

integral_next_value!(u8, u16, u32, u64, i8, i16, i32, i64);

impl NextValue for f32 {
    fn next_value(self) -> Option<Self> {
        if self.is_nan() || self == f32::INFINITY {
            return None;
        }
        // Stepping the bit pattern is monotone in the total order
        // except across the sign boundary.
        let next = if self == 0f32 {
            f32::from_bits(1)
        } else if self.is_sign_negative() {
            f32::from_bits(self.to_bits() - 1)
        } else {
            f32::from_bits(self.to_bits() + 1)
        };
        Some(next)
    }
}

impl NextValue for f64 {
    fn next_value(self) -> Option<Self> {
        if self.is_nan() || self == f64::INFINITY {
            return None;
        }
        let next = if self == 0f64 {
            f64::from_bits(1)
        } else if self.is_sign_negative() {
            f64::from_bits(self.to_bits() - 1)
        } else {
            f64::from_bits(self.to_bits() + 1)
        };
        Some(next)
    }
}

/// Trait for generic operations on primitive data types.
///
/// Types which implement this trait have a fixed bit layout which matches
/// the canonical byte layout of one or more logical datatypes.
pub trait PhysicalType:
    BitsEq
    + BitsHash
    + BitsOrd
    + NextValue
    + Copy
    + Debug
    + Default
    + PartialEq
    + PartialOrd
    + Send
    + Sync
    + crate::private::Sealed
    + 'static
{
}

macro_rules! integral_type_impls {
    ($($T:ty),+) => {
        sealed!($($T),+);

        $(
            impl BitsEq for $T {
                fn bits_eq(&self, other: &Self) -> bool {
                    <Self as PartialEq>::eq(self, other)
                }
            }

            impl BitsOrd for $T {
                fn bits_cmp(&self, other: &Self) -> Ordering {
                    <Self as Ord>::cmp(self, other)
                }
            }

            impl BitsHash for $T {
                fn bits_hash<H>(&self, state: &mut H) where H: Hasher {
                    <Self as Hash>::hash(self, state)
                }
            }

            impl PhysicalType for $T {}
        )+
    }
}

integral_type_impls!(u8, u16, u32, u64);
integral_type_impls!(i8, i16, i32, i64);

impl crate::private::Sealed for f32 {}
impl crate::private::Sealed for f64 {}

/// Defines an equivalence relation for `f32`.
///
/// The difference from the `PartialEq` implementation for `f32` is that of
/// reflexivity. Specifically, if the bits match, then `self` and `other` are
/// equal in this relation, whereas this is not true of floating-point
/// equality for `NaN` values.
///
/// Zero and negative zero are considered equal under this relation.
impl BitsEq for f32 {
    fn bits_eq(&self, other: &Self) -> bool {
        self.to_bits() == other.to_bits() ||
            // catch negative zero
            (*self == 0f32 && *other == 0f32)
    }
}

/// Defines a total order for `f32`.
///
/// This ordering intends to be a bridge between
/// `<f32 as PartialOrd>` (which is not a total order due to `NaN`)
/// and `f32::total_cmp` (which does not consider 0 and -0 to be equal).
impl BitsOrd for f32 {
    fn bits_cmp(&self, other: &Self) -> Ordering {
        if *self == 0f32 && *other == 0f32 {
            Ordering::Equal
        } else {
            self.total_cmp(other)
        }
    }
}

impl BitsHash for f32 {
    fn bits_hash<H>(&self, state: &mut H)
    where
        H: Hasher,
    {
        if self.to_bits() == (-0f32).to_bits() {
            0f32.bits_hash(state)
        } else {
            self.to_bits().bits_hash(state)
        }
    }
}

impl PhysicalType for f32 {}

/// Defines an equivalence relation for `f64`.
/// See the `f32` implementation; the same reasoning applies.
impl BitsEq for f64 {
    fn bits_eq(&self, other: &Self) -> bool {
        self.to_bits() == other.to_bits() ||
            // catch negative zero
            (*self == 0f64 && *other == 0f64)
    }
}

/// Defines a total order for `f64`.
/// See the `f32` implementation; the same reasoning applies.
impl BitsOrd for f64 {
    fn bits_cmp(&self, other: &Self) -> Ordering {
        if *self == 0f64 && *other == 0f64 {
            Ordering::Equal
        } else {
            self.total_cmp(other)
        }
    }
}

impl BitsHash for f64 {
    fn bits_hash<H>(&self, state: &mut H)
    where
        H: Hasher,
    {
        if self.to_bits() == (-0f64).to_bits() {
            0f64.bits_hash(state)
        } else {
            self.to_bits().bits_hash(state)
        }
    }
}

impl PhysicalType for f64 {}

/// Adapts a generic type to use as a key in `std` collections via
/// the `BitsEq`, `BitsOrd`, or `BitsHash` traits.
#[derive(Clone, Copy)]
pub struct BitsKeyAdapter<T>(pub T);

impl<T> Debug for BitsKeyAdapter<T>
where
    T: Debug,
{
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        self.0.fmt(f)
    }
}

impl<T> PartialEq for BitsKeyAdapter<T>
where
    T: BitsEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.0.bits_eq(&other.0)
    }
}

impl<T> Eq for BitsKeyAdapter<T> where T: BitsEq {}

impl<T> Hash for BitsKeyAdapter<T>
where
    T: BitsHash,
{
    fn hash<H>(&self, state: &mut H)
    where
        H: Hasher,
    {
        self.0.bits_hash(state)
    }
}

impl<T> PartialOrd for BitsKeyAdapter<T>
where
    T: BitsEq + BitsOrd,
{
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(Ord::cmp(self, other))
    }
}

impl<T> Ord for BitsKeyAdapter<T>
where
    T: BitsEq + BitsOrd,
{
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.bits_cmp(&other.0)
    }
}

/// Represents a dynamically typed single physical value.
///
/// [PhysicalValue] holds the bits which correspond to a single value of a
/// logical data type. For a given logical data type, [PhysicalValue] will
/// always be constructed with the primitive numerical type of the same bit
/// width, signed-ness, and precision.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum PhysicalValue {
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
}

#[macro_export]
macro_rules! physical_value_go {
    ($physical_value:expr, $DT:ident, $value:pat, $then:expr) => {{
        use $crate::datatype::physical::PhysicalValue;
        match $physical_value {
            PhysicalValue::UInt8($value) => {
                type $DT = u8;
                $then
            }
            PhysicalValue::UInt16($value) => {
                type $DT = u16;
                $then
            }
            PhysicalValue::UInt32($value) => {
                type $DT = u32;
                $then
            }
            PhysicalValue::UInt64($value) => {
                type $DT = u64;
                $then
            }
            PhysicalValue::Int8($value) => {
                type $DT = i8;
                $then
            }
            PhysicalValue::Int16($value) => {
                type $DT = i16;
                $then
            }
            PhysicalValue::Int32($value) => {
                type $DT = i32;
                $then
            }
            PhysicalValue::Int64($value) => {
                type $DT = i64;
                $then
            }
            PhysicalValue::Float32($value) => {
                type $DT = f32;
                $then
            }
            PhysicalValue::Float64($value) => {
                type $DT = f64;
                $then
            }
        }
    }};
}

macro_rules! physical_value_traits {
    ($($ty:ty: $variant:ident),+) => {
        $(
            impl From<$ty> for PhysicalValue {
                fn from(val: $ty) -> Self {
                    PhysicalValue::$variant(val)
                }
            }

            impl TryFrom<PhysicalValue> for $ty {
                type Error = Error;

                fn try_from(value: PhysicalValue) -> Result<Self, Self::Error> {
                    if let PhysicalValue::$variant(val) = value {
                        Ok(val)
                    } else {
                        physical_value_go!(
                            value,
                            DT,
                            _,
                            Err(Error::physical_type_mismatch::<$ty, DT>())
                        )
                    }
                }
            }
        )+
    };
}

physical_value_traits!(u8: UInt8, u16: UInt16, u32: UInt32, u64: UInt64);
physical_value_traits!(i8: Int8, i16: Int16, i32: Int32, i64: Int64);
physical_value_traits!(f32: Float32, f64: Float64);

impl Display for PhysicalValue {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        physical_value_go!(self, _DT, value, Display::fmt(value, f))
    }
}

#[cfg(test)]
mod tests {
    use std::hash::DefaultHasher;

    use proptest::prelude::*;

    use super::*;

    fn default_hash<T>(value: T) -> u64
    where
        T: BitsHash,
    {
        let mut hasher = DefaultHasher::new();
        value.bits_hash(&mut hasher);
        hasher.finish()
    }

    /// Returns a strategy which produces truly any possible f64 bits.
    ///
    /// This is in contrast with [Arbitrary] which does not produce `NaN`
    /// or infinities.
    fn any_f64() -> impl Strategy<Value = f64> {
        any::<[u8; 8]>().prop_map(f64::from_le_bytes)
    }

    proptest! {
        #[test]
        fn bits_cmp_f64_total_order(f1 in any_f64(), f2 in any_f64()) {
            let lt = matches!(f1.bits_cmp(&f2), Ordering::Less);
            let eq = matches!(f1.bits_cmp(&f2), Ordering::Equal);
            let gt = matches!(f1.bits_cmp(&f2), Ordering::Greater);

            // exactly one of `<`, `==`, and `>` must be true for a total order
            if lt {
                assert!(!eq);
                assert!(!gt);
            } else if eq {
                assert!(!gt);
            } else {
                assert!(gt);
            }
        }

        #[test]
        fn bits_hash_f64(f1 in any_f64(), f2 in any_f64()) {
            if f1.bits_eq(&f2) {
                assert_eq!(default_hash(f1), default_hash(f2));
            }
        }

        #[test]
        fn next_value_f64_is_successor(f in any_f64()) {
            prop_assume!(!f.is_nan());
            if let Some(next) = f.next_value() {
                assert!(f.bits_lt(&next));
                // nothing representable lies strictly between
                assert!(
                    next.to_bits() == f.to_bits() + 1
                        || f == 0f64
                        || f.is_sign_negative()
                );
            }
        }

        #[test]
        fn next_value_integral(v in any::<i32>()) {
            match v.next_value() {
                Some(next) => assert_eq!(next, v + 1),
                None => assert_eq!(v, i32::MAX),
            }
        }
    }

    #[test]
    fn bits_cmp_f64_zeroes() {
        assert!(matches!(0f64.bits_cmp(&(-0f64)), Ordering::Equal));
        assert!(matches!((-0f64).bits_cmp(&0f64), Ordering::Equal));
    }

    #[test]
    fn next_value_float_edges() {
        assert_eq!(Some(f64::INFINITY), f64::MAX.next_value());
        assert_eq!(None, f64::INFINITY.next_value());
        // negative zero and zero are identified; the successor is subnormal
        assert!((-0f64).next_value().unwrap() > 0f64);
    }
}
