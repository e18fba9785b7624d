use std::hash::{Hash, Hasher};
use std::num::NonZeroU32;
use std::ops::{Deref, RangeInclusive};

use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::array::CellValNum;
use crate::datatype::physical::{
    BitsEq, BitsHash, BitsOrd, NextValue, PhysicalValue,
};
use crate::datatype::{Datatype, Error as DatatypeError};

#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum DimensionCompatibilityError {
    #[error("{:?} is invalid for dimensions", CellValNum::Fixed(*.0))]
    CellValNumFixed(NonZeroU32),
    #[error("Dimension of type {} cannot have {:?}", Datatype::StringAscii, CellValNum::Fixed(*.0))]
    FixedStringAsciiDimension(NonZeroU32),
    #[error("Dimension of type {0} cannot have variable-length range")]
    VarRangeForNonStringDimension(Datatype),
    #[error("Dimension of type {} cannot have a fixed-length range", Datatype::StringAscii)]
    FixedRangeForStringDimension,
    #[error("Dimension of type {0} cannot have {:?}", CellValNum::Var)]
    CellValNumVar(Datatype),
    #[error("Datatype error: {0}")]
    Datatype(#[from] DatatypeError),
}

/// Reasons a range cannot be subdivided at a requested point.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum SplitError {
    #[error("Range is unary and cannot be split")]
    Unary,
    #[error("No representable value separates the range bounds")]
    Precision,
    #[error("Splitting point does not lie within the range interior")]
    OutOfBounds,
    #[error("Splitting point type does not match the range: {0}")]
    PointDatatype(#[from] DatatypeError),
    #[error("Byte-string split applied to a fixed-size range")]
    NotVarRange,
}

macro_rules! check_datatype_inner {
    ($ty:ty, $dtype:expr) => {{
        let datatype = $dtype;
        if !datatype.is_compatible_type::<$ty>() {
            return Err(DatatypeError::physical_type_incompatible::<$ty>(
                datatype,
            ));
        }
    }};
}

macro_rules! check_datatype {
    ($self:expr, $datatype:expr) => {
        match $self {
            Self::UInt8(_, _) => check_datatype_inner!(u8, $datatype),
            Self::UInt16(_, _) => check_datatype_inner!(u16, $datatype),
            Self::UInt32(_, _) => check_datatype_inner!(u32, $datatype),
            Self::UInt64(_, _) => check_datatype_inner!(u64, $datatype),
            Self::Int8(_, _) => check_datatype_inner!(i8, $datatype),
            Self::Int16(_, _) => check_datatype_inner!(i16, $datatype),
            Self::Int32(_, _) => check_datatype_inner!(i32, $datatype),
            Self::Int64(_, _) => check_datatype_inner!(i64, $datatype),
            Self::Float32(_, _) => check_datatype_inner!(f32, $datatype),
            Self::Float64(_, _) => check_datatype_inner!(f64, $datatype),
        }
    };
}

fn intersection<'a, B>(
    left_lower: &'a B,
    left_upper: &'a B,
    right_lower: &'a B,
    right_upper: &'a B,
) -> Option<(&'a B, &'a B)>
where
    B: BitsOrd + ?Sized,
{
    // input integrity check
    assert!(left_lower.bits_le(left_upper));
    assert!(right_lower.bits_le(right_upper));

    if left_upper.bits_lt(right_lower) || right_upper.bits_lt(left_lower) {
        return None;
    }

    let lower = if left_lower.bits_lt(right_lower) {
        right_lower
    } else {
        left_lower
    };

    let upper = if left_upper.bits_gt(right_upper) {
        right_upper
    } else {
        left_upper
    };

    // output integrity check
    assert!(lower.bits_le(upper));

    Some((lower, upper))
}

/// A closed interval over a single value of one physical type.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub enum SingleValueRange {
    UInt8(u8, u8),
    UInt16(u16, u16),
    UInt32(u32, u32),
    UInt64(u64, u64),
    Int8(i8, i8),
    Int16(i16, i16),
    Int32(i32, i32),
    Int64(i64, i64),
    Float32(f32, f32),
    Float64(f64, f64),
}

impl SingleValueRange {
    /// Returns the number of cells spanned by this range if it is a
    /// range over a discrete domain.
    pub fn num_cells(&self) -> Option<u128> {
        let (low, high) = self.integral_bounds()?;
        Some(1 + (high - low) as u128)
    }

    /// Returns a `CellValNum` description of values in this range,
    /// i.e. `CellValNum::single()`.
    pub fn cell_val_num(&self) -> CellValNum {
        CellValNum::single()
    }

    pub fn is_integral(&self) -> bool {
        matches!(
            self,
            Self::UInt8(_, _)
                | Self::UInt16(_, _)
                | Self::UInt32(_, _)
                | Self::UInt64(_, _)
                | Self::Int8(_, _)
                | Self::Int16(_, _)
                | Self::Int32(_, _)
                | Self::Int64(_, _)
        )
    }

    /// Returns the bounds widened to `i128` if this is an integral range.
    pub fn integral_bounds(&self) -> Option<(i128, i128)> {
        crate::single_value_range_go!(self, _DT : Integral, start, end,
            Some((i128::from(*start), i128::from(*end))),
            None
        )
    }

    /// Returns the bounds widened to `f64` if this is a real range.
    pub fn real_bounds(&self) -> Option<(f64, f64)> {
        match self {
            Self::Float32(start, end) => {
                Some((f64::from(*start), f64::from(*end)))
            }
            Self::Float64(start, end) => Some((*start, *end)),
            _ => None,
        }
    }

    pub fn check_datatype(
        &self,
        datatype: Datatype,
    ) -> Result<(), DatatypeError> {
        check_datatype!(self, datatype);
        Ok(())
    }

    /// Returns whether this range covers a single value.
    pub fn is_unary(&self) -> bool {
        crate::single_value_range_go!(self, _DT, start, end, {
            start.bits_eq(end)
        })
    }

    /// Returns whether `other` lies entirely within `self`.
    /// Ranges of different physical datatypes do not contain one another.
    pub fn contains(&self, other: &Self) -> bool {
        crate::single_value_range_cmp!(
            self,
            other,
            _DT,
            lstart,
            lend,
            rstart,
            rend,
            lstart.bits_le(rstart) && rend.bits_le(lend),
            false
        )
    }

    /// Returns whether `self` and `other` share any value.
    /// Ranges of different physical datatypes do not intersect.
    pub fn intersects(&self, other: &Self) -> bool {
        crate::single_value_range_cmp!(
            self,
            other,
            _DT,
            lstart,
            lend,
            rstart,
            rend,
            !(lend.bits_lt(rstart) || rend.bits_lt(lstart)),
            false
        )
    }

    /// Returns whether `other` begins exactly one step after `self` ends.
    ///
    /// Only integral ranges of the same physical datatype can be adjacent;
    /// this is the merge condition for range coalescing.
    pub fn is_adjacent(&self, other: &Self) -> bool {
        if std::mem::discriminant(self) != std::mem::discriminant(other) {
            return false;
        }
        let Some((_, self_end)) = self.integral_bounds() else {
            return false;
        };
        let Some((other_start, _)) = other.integral_bounds() else {
            return false;
        };
        self_end + 1 == other_start
    }

    /// Splits this range at `point` into `(left, right)` with
    /// `left = [lo, point]` and `right = [next(point), hi]`.
    ///
    /// The union of the two halves is the input range and their
    /// intersection is empty. Fails unless `lo <= point < hi`.
    pub fn split_at(
        &self,
        point: PhysicalValue,
    ) -> Result<(Self, Self), SplitError> {
        crate::single_value_range_go!(self, DT, start, end, {
            let point = DT::try_from(point)?;
            if start.bits_gt(&point) || point.bits_ge(end) {
                return Err(SplitError::OutOfBounds);
            }
            let right_start =
                point.next_value().ok_or(SplitError::Precision)?;
            Ok((
                SingleValueRange::from(&[*start, point]),
                SingleValueRange::from(&[right_start, *end]),
            ))
        })
    }

    /// Returns the fraction of `self` which is covered by `other`,
    /// in `[0, 1]`.
    ///
    /// Integral ranges compare cell counts; real ranges compare lengths
    /// (a unary real range is either fully covered or disjoint). Ranges
    /// of different physical datatypes do not overlap.
    pub fn overlap_ratio(&self, other: &Self) -> f64 {
        if std::mem::discriminant(self) != std::mem::discriminant(other) {
            return 0.0;
        }
        if let (Some((s_lo, s_hi)), Some((o_lo, o_hi))) =
            (self.integral_bounds(), other.integral_bounds())
        {
            let lo = std::cmp::max(s_lo, o_lo);
            let hi = std::cmp::min(s_hi, o_hi);
            if lo > hi {
                return 0.0;
            }
            return (hi - lo + 1) as f64 / (s_hi - s_lo + 1) as f64;
        }
        if let (Some((s_lo, s_hi)), Some((o_lo, o_hi))) =
            (self.real_bounds(), other.real_bounds())
        {
            let lo = s_lo.max(o_lo);
            let hi = s_hi.min(o_hi);
            if lo > hi {
                return 0.0;
            }
            if s_lo == s_hi {
                return 1.0;
            }
            return ((hi - lo) / (s_hi - s_lo)).clamp(0.0, 1.0);
        }
        0.0
    }

    /// Returns the range covered by the union of `self` and `other`.
    ///
    /// # Panics
    ///
    /// Panics if `self` and `other` do not have the same physical datatype.
    pub fn union(&self, other: &Self) -> Self {
        crate::single_value_range_cmp!(
            self,
            other,
            DT,
            lstart,
            lend,
            rstart,
            rend,
            {
                let cmp = |l: &DT, r: &DT| l.bits_cmp(r);
                let min = std::cmp::min_by(*lstart, *rstart, cmp);
                let max = std::cmp::max_by(*lend, *rend, cmp);
                SingleValueRange::from(&[min, max])
            },
            {
                panic!(
                    "`SingleValueRange::union` on non-matching datatypes: `self` = {:?}, `other` = {:?}",
                    self, other
                )
            }
        )
    }

    /// Returns the range covered by the intersection of `self` and `other`,
    /// or `None` if `self` and `other` do not overlap.
    ///
    /// # Panics
    ///
    /// Panics if `self` and `other` do not have the same physical datatype.
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        crate::single_value_range_cmp!(
            self,
            other,
            DT,
            lstart,
            lend,
            rstart,
            rend,
            {
                let (lower, upper) =
                    intersection::<DT>(lstart, lend, rstart, rend)?;
                Some(SingleValueRange::from(&[*lower, *upper]))
            },
            {
                panic!(
                    "`SingleValueRange::intersection` on non-matching datatypes: `self` = {:?}, `other` = {:?}",
                    self, other
                )
            }
        )
    }
}

impl PartialEq for SingleValueRange {
    fn eq(&self, other: &Self) -> bool {
        crate::single_value_range_cmp!(
            self,
            other,
            _DT,
            lstart,
            lend,
            rstart,
            rend,
            lstart.bits_eq(rstart) && lend.bits_eq(rend),
            false
        )
    }
}

/// The [PartialEq] implementation of [SingleValueRange] compares the
/// floating-point variants using [BitsEq],
/// and as such is an equivalence relation.
impl Eq for SingleValueRange {}

/// Uses the [BitsHash] implementation of the wrapped values.
impl Hash for SingleValueRange {
    fn hash<H>(&self, state: &mut H)
    where
        H: Hasher,
    {
        crate::single_value_range_go!(self, _DT, start, end, {
            start.bits_hash(state);
            end.bits_hash(state);
        })
    }
}

macro_rules! single_value_range_from {
    ($($V:ident : $U:ty),+) => {
        $(
            impl From<&[$U; 2]> for SingleValueRange {
                fn from(value: &[$U; 2]) -> SingleValueRange {
                    SingleValueRange::$V(value[0], value[1])
                }
            }

            impl From<RangeInclusive<$U>> for SingleValueRange {
                fn from(value: RangeInclusive<$U>) -> SingleValueRange {
                    SingleValueRange::$V(*value.start(), *value.end())
                }
            }
        )+
    }
}

single_value_range_from!(UInt8: u8, UInt16: u16, UInt32: u32, UInt64: u64);
single_value_range_from!(Int8: i8, Int16: i16, Int32: i32, Int64: i64);
single_value_range_from!(Float32: f32, Float64: f64);

#[macro_export]
macro_rules! single_value_range_go {
    ($expr:expr, $DT:ident, $start:pat, $end:pat, $then:expr) => {{
        use $crate::range::SingleValueRange;
        match $expr {
            SingleValueRange::UInt8($start, $end) => {
                type $DT = u8;
                $then
            }
            SingleValueRange::UInt16($start, $end) => {
                type $DT = u16;
                $then
            }
            SingleValueRange::UInt32($start, $end) => {
                type $DT = u32;
                $then
            }
            SingleValueRange::UInt64($start, $end) => {
                type $DT = u64;
                $then
            }
            SingleValueRange::Int8($start, $end) => {
                type $DT = i8;
                $then
            }
            SingleValueRange::Int16($start, $end) => {
                type $DT = i16;
                $then
            }
            SingleValueRange::Int32($start, $end) => {
                type $DT = i32;
                $then
            }
            SingleValueRange::Int64($start, $end) => {
                type $DT = i64;
                $then
            }
            SingleValueRange::Float32($start, $end) => {
                type $DT = f32;
                $then
            }
            SingleValueRange::Float64($start, $end) => {
                type $DT = f64;
                $then
            }
        }
    }};
    ($expr:expr, $DT:ident : Integral, $start:pat, $end:pat, $then:expr, $else:expr) => {{
        use $crate::range::SingleValueRange;
        match $expr {
            SingleValueRange::UInt8($start, $end) => {
                type $DT = u8;
                $then
            }
            SingleValueRange::UInt16($start, $end) => {
                type $DT = u16;
                $then
            }
            SingleValueRange::UInt32($start, $end) => {
                type $DT = u32;
                $then
            }
            SingleValueRange::UInt64($start, $end) => {
                type $DT = u64;
                $then
            }
            SingleValueRange::Int8($start, $end) => {
                type $DT = i8;
                $then
            }
            SingleValueRange::Int16($start, $end) => {
                type $DT = i16;
                $then
            }
            SingleValueRange::Int32($start, $end) => {
                type $DT = i32;
                $then
            }
            SingleValueRange::Int64($start, $end) => {
                type $DT = i64;
                $then
            }
            SingleValueRange::Float32($start, $end) => {
                type $DT = f32;
                $else
            }
            SingleValueRange::Float64($start, $end) => {
                type $DT = f64;
                $else
            }
        }
    }};
}

#[macro_export]
macro_rules! single_value_range_cmp {
    ($lexpr:expr, $rexpr:expr, $DT:ident, $lstart:pat, $lend:pat, $rstart:pat, $rend:pat, $then:expr, $else:expr) => {{
        use $crate::range::SingleValueRange;
        match ($lexpr, $rexpr) {
            (
                SingleValueRange::UInt8($lstart, $lend),
                SingleValueRange::UInt8($rstart, $rend),
            ) => {
                type $DT = u8;
                $then
            }
            (
                SingleValueRange::UInt16($lstart, $lend),
                SingleValueRange::UInt16($rstart, $rend),
            ) => {
                type $DT = u16;
                $then
            }
            (
                SingleValueRange::UInt32($lstart, $lend),
                SingleValueRange::UInt32($rstart, $rend),
            ) => {
                type $DT = u32;
                $then
            }
            (
                SingleValueRange::UInt64($lstart, $lend),
                SingleValueRange::UInt64($rstart, $rend),
            ) => {
                type $DT = u64;
                $then
            }
            (
                SingleValueRange::Int8($lstart, $lend),
                SingleValueRange::Int8($rstart, $rend),
            ) => {
                type $DT = i8;
                $then
            }
            (
                SingleValueRange::Int16($lstart, $lend),
                SingleValueRange::Int16($rstart, $rend),
            ) => {
                type $DT = i16;
                $then
            }
            (
                SingleValueRange::Int32($lstart, $lend),
                SingleValueRange::Int32($rstart, $rend),
            ) => {
                type $DT = i32;
                $then
            }
            (
                SingleValueRange::Int64($lstart, $lend),
                SingleValueRange::Int64($rstart, $rend),
            ) => {
                type $DT = i64;
                $then
            }
            (
                SingleValueRange::Float32($lstart, $lend),
                SingleValueRange::Float32($rstart, $rend),
            ) => {
                type $DT = f32;
                $then
            }
            (
                SingleValueRange::Float64($lstart, $lend),
                SingleValueRange::Float64($rstart, $rend),
            ) => {
                type $DT = f64;
                $then
            }
            _ => $else,
        }
    }};
}

/// A closed interval over variable-length cell values of one physical type.
///
/// String dimension ranges are the `UInt8` variant; the bounds are byte
/// buffers compared lexicographically.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub enum VarValueRange {
    UInt8(Box<[u8]>, Box<[u8]>),
    UInt16(Box<[u16]>, Box<[u16]>),
    UInt32(Box<[u32]>, Box<[u32]>),
    UInt64(Box<[u64]>, Box<[u64]>),
    Int8(Box<[i8]>, Box<[i8]>),
    Int16(Box<[i16]>, Box<[i16]>),
    Int32(Box<[i32]>, Box<[i32]>),
    Int64(Box<[i64]>, Box<[i64]>),
    Float32(Box<[f32]>, Box<[f32]>),
    Float64(Box<[f64]>, Box<[f64]>),
}

impl VarValueRange {
    /// Returns a `CellValNum` which matches the values in this range,
    /// i.e. `CellValNum::Var`.
    pub fn cell_val_num(&self) -> CellValNum {
        CellValNum::Var
    }

    pub fn check_datatype(
        &self,
        datatype: Datatype,
    ) -> Result<(), DatatypeError> {
        check_datatype!(self, datatype);
        Ok(())
    }

    /// Returns whether this range covers a single value.
    pub fn is_unary(&self) -> bool {
        crate::var_value_range_go!(self, _DT, start, end, {
            start.bits_eq(end)
        })
    }

    /// Returns the byte-string bounds if this is a string range.
    pub fn string_bounds(&self) -> Option<(&[u8], &[u8])> {
        if let VarValueRange::UInt8(start, end) = self {
            Some((start, end))
        } else {
            None
        }
    }

    /// Returns whether `other` lies entirely within `self`.
    pub fn contains(&self, other: &Self) -> bool {
        crate::var_value_range_cmp!(
            self,
            other,
            _DT,
            lstart,
            lend,
            rstart,
            rend,
            lstart.bits_le(rstart) && rend.bits_le(lend),
            false
        )
    }

    /// Returns whether `self` and `other` share any value.
    pub fn intersects(&self, other: &Self) -> bool {
        crate::var_value_range_cmp!(
            self,
            other,
            _DT,
            lstart,
            lend,
            rstart,
            rend,
            !(lend.bits_lt(rstart) || rend.bits_lt(lstart)),
            false
        )
    }

    /// Splits a string range into `([lo, left_end], [right_start, hi])`.
    ///
    /// The caller chooses the inner bounds; they must satisfy
    /// `lo <= left_end < right_start <= hi`. Byte strings strictly
    /// between `left_end` and `right_start` belong to neither half.
    pub fn split_at(
        &self,
        left_end: &[u8],
        right_start: &[u8],
    ) -> Result<(Self, Self), SplitError> {
        let VarValueRange::UInt8(start, end) = self else {
            return Err(SplitError::NotVarRange);
        };
        if left_end < &**start
            || right_start <= left_end
            || &**end < right_start
        {
            return Err(SplitError::OutOfBounds);
        }
        Ok((
            VarValueRange::UInt8(start.clone(), left_end.into()),
            VarValueRange::UInt8(right_start.into(), end.clone()),
        ))
    }

    /// Returns the range covered by the union of `self` and `other`.
    ///
    /// # Panics
    ///
    /// Panics if `self` and `other` do not have the same physical datatype.
    pub fn union(&self, other: &Self) -> Self {
        crate::var_value_range_cmp!(
            self,
            other,
            _DT,
            lstart,
            lend,
            rstart,
            rend,
            {
                let min = if lstart.bits_lt(rstart) {
                    lstart.clone()
                } else {
                    rstart.clone()
                };

                let max = if lend.bits_gt(rend) {
                    lend.clone()
                } else {
                    rend.clone()
                };

                VarValueRange::from((min, max))
            },
            panic!(
                "`VarValueRange::union` on non-matching datatypes: `self` = {:?}, `other` = {:?}",
                self, other
            )
        )
    }

    /// Returns the range covered by the intersection of `self` and `other`,
    /// or `None` if `self` and `other` do not overlap.
    ///
    /// # Panics
    ///
    /// Panics if `self` and `other` do not have the same physical datatype.
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        crate::var_value_range_cmp!(
            self,
            other,
            DT,
            lstart,
            lend,
            rstart,
            rend,
            {
                let (lower, upper) = intersection::<[DT]>(
                    &**lstart, &**lend, &**rstart, &**rend,
                )?;
                Some(VarValueRange::from((
                    lower.to_vec().into_boxed_slice(),
                    upper.to_vec().into_boxed_slice(),
                )))
            },
            panic!(
                "`VarValueRange::intersection` on non-matching datatypes: `self` = {:?}, `other` = {:?}",
                self, other
            )
        )
    }
}

impl PartialEq for VarValueRange {
    fn eq(&self, other: &Self) -> bool {
        crate::var_value_range_cmp!(
            self,
            other,
            _DT,
            lstart,
            lend,
            rstart,
            rend,
            lstart.bits_eq(rstart) && lend.bits_eq(rend),
            false
        )
    }
}

/// The [PartialEq] implementation of [VarValueRange] compares the
/// floating-point variants using [BitsEq],
/// and as such is an equivalence relation.
impl Eq for VarValueRange {}

/// Uses the [BitsHash] implementation of the wrapped values.
impl Hash for VarValueRange {
    fn hash<H>(&self, state: &mut H)
    where
        H: Hasher,
    {
        crate::var_value_range_go!(self, _DT, start, end, {
            start.bits_hash(state);
            end.bits_hash(state);
        })
    }
}

macro_rules! var_value_range_from {
    ($($V:ident : $U:ty),+) => {
        $(
            impl From<(Box<[$U]>, Box<[$U]>)> for VarValueRange {
                fn from(value: (Box<[$U]>, Box<[$U]>)) -> VarValueRange {
                    VarValueRange::$V(value.0, value.1)
                }
            }
        )+
    }
}

var_value_range_from!(UInt8: u8, UInt16: u16, UInt32: u32, UInt64: u64);
var_value_range_from!(Int8: i8, Int16: i16, Int32: i32, Int64: i64);
var_value_range_from!(Float32: f32, Float64: f64);

impl From<(&str, &str)> for VarValueRange {
    fn from(value: (&str, &str)) -> VarValueRange {
        let start = value.0.as_bytes().to_vec().into_boxed_slice();
        let end = value.1.as_bytes().to_vec().into_boxed_slice();
        VarValueRange::UInt8(start, end)
    }
}

impl From<(&[u8], &[u8])> for VarValueRange {
    fn from(value: (&[u8], &[u8])) -> VarValueRange {
        let start = value.0.to_vec().into_boxed_slice();
        let end = value.1.to_vec().into_boxed_slice();
        VarValueRange::UInt8(start, end)
    }
}

impl From<(String, String)> for VarValueRange {
    fn from(value: (String, String)) -> VarValueRange {
        let start = value.0.into_bytes().into_boxed_slice();
        let end = value.1.into_bytes().into_boxed_slice();
        VarValueRange::UInt8(start, end)
    }
}

#[macro_export]
macro_rules! var_value_range_go {
    ($expr:expr, $DT:ident, $start:pat, $end:pat, $then:expr) => {{
        use $crate::range::VarValueRange;
        match $expr {
            VarValueRange::UInt8($start, $end) => {
                type $DT = u8;
                $then
            }
            VarValueRange::UInt16($start, $end) => {
                type $DT = u16;
                $then
            }
            VarValueRange::UInt32($start, $end) => {
                type $DT = u32;
                $then
            }
            VarValueRange::UInt64($start, $end) => {
                type $DT = u64;
                $then
            }
            VarValueRange::Int8($start, $end) => {
                type $DT = i8;
                $then
            }
            VarValueRange::Int16($start, $end) => {
                type $DT = i16;
                $then
            }
            VarValueRange::Int32($start, $end) => {
                type $DT = i32;
                $then
            }
            VarValueRange::Int64($start, $end) => {
                type $DT = i64;
                $then
            }
            VarValueRange::Float32($start, $end) => {
                type $DT = f32;
                $then
            }
            VarValueRange::Float64($start, $end) => {
                type $DT = f64;
                $then
            }
        }
    }};
}

#[macro_export]
macro_rules! var_value_range_cmp {
    ($lexpr:expr, $rexpr:expr, $DT:ident, $lstart:pat, $lend:pat, $rstart:pat, $rend:pat, $cmp:expr, $else:expr) => {{
        use $crate::range::VarValueRange::*;
        match ($lexpr, $rexpr) {
            (UInt8($lstart, $lend), UInt8($rstart, $rend)) => {
                type $DT = u8;
                $cmp
            }
            (UInt16($lstart, $lend), UInt16($rstart, $rend)) => {
                type $DT = u16;
                $cmp
            }
            (UInt32($lstart, $lend), UInt32($rstart, $rend)) => {
                type $DT = u32;
                $cmp
            }
            (UInt64($lstart, $lend), UInt64($rstart, $rend)) => {
                type $DT = u64;
                $cmp
            }
            (Int8($lstart, $lend), Int8($rstart, $rend)) => {
                type $DT = i8;
                $cmp
            }
            (Int16($lstart, $lend), Int16($rstart, $rend)) => {
                type $DT = i16;
                $cmp
            }
            (Int32($lstart, $lend), Int32($rstart, $rend)) => {
                type $DT = i32;
                $cmp
            }
            (Int64($lstart, $lend), Int64($rstart, $rend)) => {
                type $DT = i64;
                $cmp
            }
            (Float32($lstart, $lend), Float32($rstart, $rend)) => {
                type $DT = f32;
                $cmp
            }
            (Float64($lstart, $lend), Float64($rstart, $rend)) => {
                type $DT = f64;
                $cmp
            }
            _ => $else,
        }
    }};
}

/// A closed interval over one dimension's datatype.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub enum Range {
    Single(SingleValueRange),
    Var(VarValueRange),
}

impl Range {
    pub fn cell_val_num(&self) -> CellValNum {
        match self {
            Self::Single(r) => r.cell_val_num(),
            Self::Var(r) => r.cell_val_num(),
        }
    }

    /// Returns the number of cells spanned by this range if it is a
    /// discrete range. `Range::Var` variants are not discrete ranges and
    /// will return `None`.
    pub fn num_cells(&self) -> Option<u128> {
        match self {
            Self::Single(r) => r.num_cells(),
            Self::Var(_) => None,
        }
    }

    pub fn is_unary(&self) -> bool {
        match self {
            Self::Single(r) => r.is_unary(),
            Self::Var(r) => r.is_unary(),
        }
    }

    /// Returns whether `other` lies entirely within `self`.
    /// Ranges of different variants do not contain one another.
    pub fn contains(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Single(l), Self::Single(r)) => l.contains(r),
            (Self::Var(l), Self::Var(r)) => l.contains(r),
            _ => false,
        }
    }

    /// Returns whether `self` and `other` share any value.
    /// Ranges of different variants do not intersect.
    pub fn intersects(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Single(l), Self::Single(r)) => l.intersects(r),
            (Self::Var(l), Self::Var(r)) => l.intersects(r),
            _ => false,
        }
    }

    /// Returns whether `other` begins one step after `self` ends;
    /// see [SingleValueRange::is_adjacent].
    pub fn is_adjacent(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Single(l), Self::Single(r)) => l.is_adjacent(r),
            _ => false,
        }
    }

    /// Returns the fraction of `self` covered by `other`, in `[0, 1]`.
    /// Var ranges have no length; they report full coverage when the
    /// ranges intersect.
    pub fn overlap_ratio(&self, other: &Self) -> f64 {
        match (self, other) {
            (Self::Single(l), Self::Single(r)) => l.overlap_ratio(r),
            (Self::Var(l), Self::Var(r)) => {
                if l.intersects(r) {
                    1.0
                } else {
                    0.0
                }
            }
            _ => 0.0,
        }
    }

    // N.B. This is not a generic field compatibility check because
    // dimensions have restrictions on their cell_val_num that don't apply
    // to attributes.
    pub fn check_dimension_compatibility(
        &self,
        datatype: Datatype,
        cell_val_num: CellValNum,
    ) -> Result<(), DimensionCompatibilityError> {
        match self {
            Self::Single(svr) => svr.check_datatype(datatype)?,
            Self::Var(vvr) => vvr.check_datatype(datatype)?,
        }

        match cell_val_num {
            CellValNum::Fixed(cvn) => {
                if cvn.get() > 1 {
                    return Err(DimensionCompatibilityError::CellValNumFixed(
                        cvn,
                    ));
                }
                if datatype == Datatype::StringAscii {
                    return Err(
                        DimensionCompatibilityError::FixedStringAsciiDimension(
                            cvn,
                        ),
                    );
                }
                if !matches!(self, Self::Single(_)) {
                    return Err(DimensionCompatibilityError::VarRangeForNonStringDimension(datatype));
                }
            }
            CellValNum::Var => {
                if datatype != Datatype::StringAscii {
                    return Err(DimensionCompatibilityError::CellValNumVar(
                        datatype,
                    ));
                }
                if !matches!(self, Range::Var(VarValueRange::UInt8(_, _))) {
                    return Err(DimensionCompatibilityError::FixedRangeForStringDimension);
                }
            }
        }

        Ok(())
    }

    /// Returns the range covered by the union of `self` and `other`.
    ///
    /// # Panics
    ///
    /// Panics if `self` and `other` are not the same variant, or if
    /// `self` and `other` do not have the same physical datatype.
    pub fn union(&self, other: &Self) -> Self {
        match (self, other) {
            (Self::Single(l), Self::Single(r)) => Self::Single(l.union(r)),
            (Self::Var(l), Self::Var(r)) => Self::Var(l.union(r)),
            _ => panic!(
                "`Range::union` on non-matching range variants: `self` = {:?}, `other` = {:?}",
                self, other
            ),
        }
    }

    /// Returns the range covered by the intersection of `self` and `other`,
    /// or `None` if `self` and `other` do not overlap.
    ///
    /// # Panics
    ///
    /// Panics if `self` and `other` are not the same variant, or if
    /// `self` and `other` do not have the same physical datatype.
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        match (self, other) {
            (Self::Single(l), Self::Single(r)) => {
                Some(Self::Single(l.intersection(r)?))
            }
            (Self::Var(l), Self::Var(r)) => Some(Self::Var(l.intersection(r)?)),
            _ => panic!(
                "`Range::intersection` on non-matching range variants: `self` = {:?}, `other` = {:?}",
                self, other
            ),
        }
    }
}

macro_rules! range_from_impl {
    ($($V:ident : $U:ty),+) => {
        $(
            impl From<&[$U; 2]> for Range {
                fn from(value: &[$U; 2]) -> Range {
                    Range::Single(SingleValueRange::from(value))
                }
            }

            impl From<(Box<[$U]>, Box<[$U]>)> for Range {
                fn from(value: (Box<[$U]>, Box<[$U]>)) -> Range {
                    Range::Var(VarValueRange::from(value))
                }
            }
        )+
    }
}

range_from_impl!(UInt8: u8, UInt16: u16, UInt32: u32, UInt64: u64);
range_from_impl!(Int8: i8, Int16: i16, Int32: i32, Int64: i64);
range_from_impl!(Float32: f32, Float64: f64);

impl From<(&str, &str)> for Range {
    fn from(value: (&str, &str)) -> Range {
        Range::Var(VarValueRange::from(value))
    }
}

impl From<(String, String)> for Range {
    fn from(value: (String, String)) -> Range {
        Range::Var(VarValueRange::from(value))
    }
}

impl From<SingleValueRange> for Range {
    fn from(value: SingleValueRange) -> Self {
        Range::Single(value)
    }
}

impl From<VarValueRange> for Range {
    fn from(value: VarValueRange) -> Self {
        Range::Var(value)
    }
}

/// A range with its logical datatype attached.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct TypedRange {
    pub datatype: Datatype,
    pub range: Range,
}

impl TypedRange {
    pub fn new(datatype: Datatype, range: Range) -> Self {
        Self { datatype, range }
    }

    pub fn cell_val_num(&self) -> CellValNum {
        self.range.cell_val_num()
    }
}

/// The minimum bounding rectangle of a set of cells: one range per
/// dimension.
#[derive(Clone, Debug, PartialEq)]
pub struct NonEmptyDomain(Vec<Range>);

impl NonEmptyDomain {
    /// Returns the non-empty domain covered by the union of `self`
    /// and `other`.
    ///
    /// # Panics
    ///
    /// Panics if any of the physical datatypes of the dimensions do not
    /// match, or if `self` and `other` do not have the same number of
    /// dimensions.
    pub fn union(&self, other: &Self) -> Self {
        assert_eq!(self.len(), other.len());

        self.iter()
            .zip(other.iter())
            .map(|(l, r)| l.union(r))
            .collect::<Self>()
    }

    /// Returns whether `self` and the ND range `other` share any cell.
    pub fn intersects(&self, other: &[Range]) -> bool {
        assert_eq!(self.len(), other.len());

        self.iter().zip(other.iter()).all(|(l, r)| l.intersects(r))
    }

    /// Returns whether the ND range `other` covers every cell of `self`.
    pub fn contained_in(&self, other: &[Range]) -> bool {
        assert_eq!(self.len(), other.len());

        self.iter().zip(other.iter()).all(|(l, r)| r.contains(l))
    }
}

impl Deref for NonEmptyDomain {
    type Target = Vec<Range>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<F> From<F> for NonEmptyDomain
where
    Vec<Range>: From<F>,
{
    fn from(value: F) -> Self {
        NonEmptyDomain(value.into())
    }
}

impl FromIterator<Range> for NonEmptyDomain {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = Range>,
    {
        NonEmptyDomain(Vec::<Range>::from_iter(iter))
    }
}

#[cfg(any(test, feature = "proptest-strategies"))]
pub mod strategy {
    use proptest::prelude::*;

    use super::*;
    use crate::physical_type_go;

    impl Arbitrary for SingleValueRange {
        type Parameters = Option<Datatype>;
        type Strategy = BoxedStrategy<Self>;

        fn arbitrary_with(params: Self::Parameters) -> Self::Strategy {
            let strat_type = params
                .map(|dt| Just(dt).boxed())
                .unwrap_or(any::<Datatype>().boxed());
            strat_type
                .prop_flat_map(|dt| {
                    physical_type_go!(dt, DT, {
                        any::<DT>()
                            .prop_flat_map(move |low| {
                                (Just(low), low..=DT::MAX)
                            })
                            .prop_map(move |(low, high)| {
                                SingleValueRange::from(&[low, high])
                            })
                            .boxed()
                    })
                })
                .boxed()
        }
    }

    impl Arbitrary for VarValueRange {
        type Parameters = Option<Datatype>;
        type Strategy = BoxedStrategy<Self>;

        fn arbitrary_with(params: Self::Parameters) -> Self::Strategy {
            let strat_type = params
                .map(|dt| Just(dt).boxed())
                .unwrap_or(any::<Datatype>().boxed());

            const VAR_RANGE_MIN_VALUES: usize = 0;
            const VAR_RANGE_MAX_VALUES: usize = 64;

            strat_type
                .prop_flat_map(|dt| {
                    physical_type_go!(dt, DT, {
                        (
                            proptest::collection::vec(
                                any::<DT>(),
                                VAR_RANGE_MIN_VALUES..=VAR_RANGE_MAX_VALUES,
                            ),
                            proptest::collection::vec(
                                any::<DT>(),
                                VAR_RANGE_MIN_VALUES..=VAR_RANGE_MAX_VALUES,
                            ),
                        )
                            .prop_map(move |(left, right)| {
                                let (min, max) = if left.bits_lt(&right) {
                                    (left, right)
                                } else {
                                    (right, left)
                                };
                                VarValueRange::from((
                                    min.into_boxed_slice(),
                                    max.into_boxed_slice(),
                                ))
                            })
                            .boxed()
                    })
                })
                .boxed()
        }
    }
}

#[cfg(test)]
mod tests {
    use paste::paste;
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn split_at_integral() {
        let r = SingleValueRange::from(&[2i32, 5]);
        let (left, right) = r.split_at(PhysicalValue::Int32(3)).unwrap();
        assert_eq!(SingleValueRange::from(&[2i32, 3]), left);
        assert_eq!(SingleValueRange::from(&[4i32, 5]), right);

        // the point must lie in the interior
        assert_eq!(
            Err(SplitError::OutOfBounds),
            r.split_at(PhysicalValue::Int32(5)).map(|_| ())
        );
        assert_eq!(
            Err(SplitError::OutOfBounds),
            r.split_at(PhysicalValue::Int32(1)).map(|_| ())
        );
        assert!(matches!(
            r.split_at(PhysicalValue::Int64(3)),
            Err(SplitError::PointDatatype(_))
        ));
    }

    #[test]
    fn split_at_float() {
        let r = SingleValueRange::from(&[2.0f64, 18.0]);
        let (left, right) = r.split_at(PhysicalValue::Float64(10.0)).unwrap();
        assert_eq!(SingleValueRange::from(&[2.0f64, 10.0]), left);
        let SingleValueRange::Float64(rlo, rhi) = right else {
            unreachable!()
        };
        assert_eq!(18.0, rhi);
        assert_eq!(10.0f64.next_value().unwrap(), rlo);
        assert!(rlo > 10.0);
    }

    #[test]
    fn split_at_string() {
        let r = VarValueRange::from(("ca", "cz"));
        let (left, right) = r.split_at(b"cm\x7f", b"cn").unwrap();
        assert_eq!(VarValueRange::from(("ca", "cm\x7f")), left);
        assert_eq!(VarValueRange::from(("cn", "cz")), right);

        assert_eq!(
            Err(SplitError::OutOfBounds),
            r.split_at(b"c", b"cn").map(|_| ())
        );
        assert_eq!(
            Err(SplitError::OutOfBounds),
            r.split_at(b"cn", b"cm").map(|_| ())
        );
    }

    #[test]
    fn adjacency() {
        let a = Range::from(&[1i32, 3]);
        let b = Range::from(&[4i32, 6]);
        let c = Range::from(&[6i32, 9]);
        assert!(a.is_adjacent(&b));
        assert!(!b.is_adjacent(&a));
        assert!(!a.is_adjacent(&c));
        // floats are never adjacent
        assert!(
            !Range::from(&[1.0f32, 2.0]).is_adjacent(&Range::from(&[2.0f32, 3.0]))
        );
        // different widths are never adjacent
        assert!(!a.is_adjacent(&Range::from(&[4i64, 6])));
    }

    #[test]
    fn overlap_ratio_integral() {
        let tile = SingleValueRange::from(&[1i32, 2]);
        assert_eq!(0.5, tile.overlap_ratio(&SingleValueRange::from(&[2i32, 5])));
        assert_eq!(1.0, tile.overlap_ratio(&SingleValueRange::from(&[1i32, 2])));
        assert_eq!(0.0, tile.overlap_ratio(&SingleValueRange::from(&[3i32, 5])));
    }

    #[test]
    fn overlap_ratio_real() {
        let tile = SingleValueRange::from(&[0.0f64, 10.0]);
        assert_eq!(0.5, tile.overlap_ratio(&SingleValueRange::from(&[5.0f64, 20.0])));
        assert_eq!(1.0, tile.overlap_ratio(&SingleValueRange::from(&[0.0f64, 10.0])));
        assert_eq!(0.0, tile.overlap_ratio(&SingleValueRange::from(&[11.0f64, 20.0])));
    }

    // the split arithmetic is identical across the integral widths;
    // exercise each instantiation
    macro_rules! split_midpoint_per_type {
        ($($U:ty),+) => {
            paste! {
                $(
                    #[test]
                    fn [< split_midpoint_ $U >]() {
                        let r = SingleValueRange::from(&[1 as $U, 6 as $U]);
                        let (left, right) =
                            r.split_at(PhysicalValue::from(3 as $U)).unwrap();
                        assert_eq!(SingleValueRange::from(&[1 as $U, 3 as $U]), left);
                        assert_eq!(SingleValueRange::from(&[4 as $U, 6 as $U]), right);
                    }
                )+
            }
        }
    }
    split_midpoint_per_type!(u8, u16, u32, u64, i8, i16, i32, i64);

    #[cfg(feature = "serde")]
    mod serialization {
        use super::*;

        fn test_serialization_roundtrip(range: &Range) {
            let data = serde_json::to_string(range).unwrap();
            let other: Range = serde_json::from_str(&data).unwrap();
            assert_eq!(*range, other);
        }

        proptest! {
            #[test]
            fn range_serialization_roundtrip(
                single in any::<SingleValueRange>(),
                var in any::<VarValueRange>())
            {
                test_serialization_roundtrip(&Range::Single(single));
                test_serialization_roundtrip(&Range::Var(var));
            }
        }
    }

    fn do_split_at(
        range: SingleValueRange,
        point: i64,
    ) -> anyhow::Result<()> {
        let (left, right) = range.split_at(PhysicalValue::Int64(point))?;

        // the two halves partition the input
        assert_eq!(
            range.num_cells().unwrap(),
            left.num_cells().unwrap() + right.num_cells().unwrap()
        );
        assert!(!left.intersects(&right));
        assert_eq!(range, left.union(&right));
        Ok(())
    }

    proptest! {
        #[test]
        fn split_at_props((range, point) in any_with::<SingleValueRange>(Some(Datatype::Int64))
            .prop_filter("unary", |r| !r.is_unary())
            .prop_flat_map(|r| {
                let &SingleValueRange::Int64(lo, hi) = &r else {
                    unreachable!()
                };
                (Just(r), lo..hi)
            }))
        {
            do_split_at(range, point).unwrap()
        }

        #[test]
        fn contains_intersection(
            r1 in any_with::<SingleValueRange>(Some(Datatype::UInt16)),
            r2 in any_with::<SingleValueRange>(Some(Datatype::UInt16)))
        {
            match r1.intersection(&r2) {
                Some(overlap) => {
                    assert!(r1.intersects(&r2));
                    assert!(r1.contains(&overlap));
                    assert!(r2.contains(&overlap));
                    assert!(r1.overlap_ratio(&r2) > 0.0);
                }
                None => {
                    assert!(!r1.intersects(&r2));
                    assert_eq!(0.0, r1.overlap_ratio(&r2));
                }
            }
        }
    }
}
