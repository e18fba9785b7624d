#[cfg(any(test, feature = "proptest-strategies"))]
pub mod strategy;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use tiledb_common::array::CellValNum;
use tiledb_common::datatype::Datatype;

/// Encapsulation of data needed to describe an attribute.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct AttributeData {
    pub name: String,
    pub datatype: Datatype,
    pub nullability: Option<bool>,
    pub cell_val_num: Option<CellValNum>,
}

impl AttributeData {
    /// Returns whether cells of this attribute are variable-length.
    pub fn is_var_sized(&self) -> bool {
        match self.cell_val_num {
            Some(cvn) => cvn.is_var_sized(),
            None => self.datatype.is_string_type(),
        }
    }

    /// Returns whether cells of this attribute may be null.
    pub fn is_nullable(&self) -> bool {
        self.nullability.unwrap_or(false)
    }
}
