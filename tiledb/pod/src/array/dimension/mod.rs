#[cfg(any(test, feature = "proptest-strategies"))]
pub mod strategy;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use tiledb_common::array::CellValNum;
use tiledb_common::array::dimension::DimensionConstraints;
use tiledb_common::datatype::Datatype;

/// Encapsulation of data needed to describe a dimension.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct DimensionData {
    pub name: String,
    pub datatype: Datatype,
    pub constraints: DimensionConstraints,
}

impl DimensionData {
    pub fn cell_val_num(&self) -> CellValNum {
        self.constraints.cell_val_num()
    }

    /// Returns whether this dimension imposes tile geometry.
    pub fn has_tile_extent(&self) -> bool {
        self.constraints.num_cells_per_tile().is_some()
    }
}
