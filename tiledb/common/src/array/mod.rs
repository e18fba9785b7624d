pub mod dimension;

use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::num::NonZeroU32;
use std::str::FromStr;

use thiserror::Error;

#[cfg(feature = "proptest-strategies")]
use proptest::prelude::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub enum ArrayType {
    #[default]
    Dense,
    Sparse,
}

impl Display for ArrayType {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        Debug::fmt(self, f)
    }
}

#[cfg(feature = "proptest-strategies")]
impl Arbitrary for ArrayType {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        prop_oneof![Just(ArrayType::Dense), Just(ArrayType::Sparse)].boxed()
    }
}

/// The order of tiles relative to one another in the canonical
/// on-disk layout.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub enum TileOrder {
    RowMajor,
    ColumnMajor,
}

impl Display for TileOrder {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        Debug::fmt(self, f)
    }
}

#[cfg(feature = "proptest-strategies")]
impl Arbitrary for TileOrder {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        prop_oneof![Just(TileOrder::RowMajor), Just(TileOrder::ColumnMajor)]
            .boxed()
    }
}

/// The order of cells relative to one another within a tile.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub enum CellOrder {
    Unordered,
    RowMajor,
    ColumnMajor,
    Global,
    Hilbert,
}

impl Display for CellOrder {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        Debug::fmt(self, f)
    }
}

#[cfg(feature = "proptest-strategies")]
impl Arbitrary for CellOrder {
    type Strategy = BoxedStrategy<CellOrder>;
    type Parameters = Option<ArrayType>;

    fn arbitrary_with(args: Self::Parameters) -> Self::Strategy {
        match args {
            None => prop_oneof![
                Just(CellOrder::Unordered),
                Just(CellOrder::RowMajor),
                Just(CellOrder::ColumnMajor),
                Just(CellOrder::Hilbert),
            ]
            .boxed(),
            Some(ArrayType::Sparse) => prop_oneof![
                Just(CellOrder::RowMajor),
                Just(CellOrder::ColumnMajor),
                Just(CellOrder::Hilbert),
            ]
            .boxed(),
            Some(ArrayType::Dense) => prop_oneof![
                Just(CellOrder::RowMajor),
                Just(CellOrder::ColumnMajor),
            ]
            .boxed(),
        }
    }
}

/// The order in which a query traverses the cells it selects.
///
/// This is the layout of a subarray: the flattened order of its
/// ND ranges, and the order in which results are produced.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub enum Layout {
    /// No guaranteed order; ranges are labelled as if row-major.
    Unordered,
    RowMajor,
    ColumnMajor,
    /// The canonical on-disk order: tile order across tiles,
    /// then cell order within each tile.
    GlobalOrder,
}

impl Layout {
    pub fn is_ordered(&self) -> bool {
        matches!(self, Layout::RowMajor | Layout::ColumnMajor)
    }
}

impl Display for Layout {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Layout::Unordered => write!(f, "unordered"),
            Layout::RowMajor => write!(f, "row-major"),
            Layout::ColumnMajor => write!(f, "col-major"),
            Layout::GlobalOrder => write!(f, "global-order"),
        }
    }
}

#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum LayoutError {
    #[error("Invalid layout name: {0}")]
    InvalidName(String),
}

impl FromStr for Layout {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unordered" => Ok(Layout::Unordered),
            "row-major" => Ok(Layout::RowMajor),
            "col-major" => Ok(Layout::ColumnMajor),
            "global-order" => Ok(Layout::GlobalOrder),
            _ => Err(LayoutError::InvalidName(s.to_owned())),
        }
    }
}

#[cfg(feature = "proptest-strategies")]
impl Arbitrary for Layout {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        prop_oneof![
            Just(Layout::Unordered),
            Just(Layout::RowMajor),
            Just(Layout::ColumnMajor),
            Just(Layout::GlobalOrder),
        ]
        .boxed()
    }
}

/// Represents the number of values carried within a single cell of an
/// attribute or dimension.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub enum CellValNum {
    /// The number of values per cell is a specific fixed number.
    Fixed(std::num::NonZeroU32),
    /// The number of values per cell varies.
    /// When this option is used for a dimension or attribute, queries must
    /// allocate additional space to hold structural information about each
    /// cell. The values will be concatenated together in a single buffer,
    /// and the structural data buffer contains the offset of each record
    /// into the values buffer.
    Var,
}

impl CellValNum {
    pub fn single() -> Self {
        CellValNum::Fixed(NonZeroU32::new(1).unwrap())
    }

    pub fn is_var_sized(&self) -> bool {
        matches!(self, CellValNum::Var)
    }

    pub fn is_single_valued(&self) -> bool {
        matches!(self, CellValNum::Fixed(nz) if nz.get() == 1)
    }

    /// Return the fixed number of values per cell, if not variable.
    pub fn fixed(&self) -> Option<NonZeroU32> {
        if let CellValNum::Fixed(nz) = self {
            Some(*nz)
        } else {
            None
        }
    }
}

#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum CellValNumError {
    #[error("{} cannot be zero", std::any::type_name::<CellValNum>())]
    CannotBeZero,
}

impl Default for CellValNum {
    fn default() -> Self {
        Self::single()
    }
}

impl Display for CellValNum {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        Debug::fmt(self, f)
    }
}

impl TryFrom<u32> for CellValNum {
    type Error = CellValNumError;
    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Err(CellValNumError::CannotBeZero),
            u32::MAX => Ok(CellValNum::Var),
            v => Ok(CellValNum::Fixed(NonZeroU32::new(v).unwrap())),
        }
    }
}

impl From<CellValNum> for u32 {
    fn from(value: CellValNum) -> Self {
        match value {
            CellValNum::Fixed(nz) => nz.get(),
            CellValNum::Var => u32::MAX,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn layout_name_roundtrip() {
        for layout in [
            Layout::Unordered,
            Layout::RowMajor,
            Layout::ColumnMajor,
            Layout::GlobalOrder,
        ] {
            assert_eq!(Ok(layout), Layout::from_str(&layout.to_string()));
        }
        assert!(Layout::from_str("hilbert").is_err());
    }

    #[test]
    fn cell_val_num() {
        assert_eq!(CellValNum::default(), CellValNum::single());
        assert!(CellValNum::Var.is_var_sized());
        assert!(CellValNum::single().is_single_valued());
        assert_eq!(Ok(CellValNum::Var), CellValNum::try_from(u32::MAX));
        assert!(CellValNum::try_from(0).is_err());
        assert_eq!(u32::from(CellValNum::try_from(4).unwrap()), 4);
    }
}
