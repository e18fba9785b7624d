use thiserror::Error;

use tiledb_common::range::{DimensionCompatibilityError, SplitError};

use crate::config::ConfigError;
use crate::metadata::MetadataError;

pub type Result<T> = std::result::Result<T, Error>;

/// The error type of subarray construction and partitioning.
///
/// Note that an unsplittable partition is *not* an error; it is
/// reported by the boolean result of
/// [SubarrayPartitioner::next](crate::SubarrayPartitioner::next).
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid range: {0}")]
    InvalidRange(#[from] InvalidRangeError),
    #[error("Invalid layout: {0}")]
    InvalidLayout(#[from] InvalidLayoutError),
    #[error("Invalid config: {0}")]
    Config(#[from] ConfigError),
    #[error("Result budget not set for field '{0}'")]
    BudgetNotSet(String),
    #[error("Invalid budget: {0}")]
    InvalidBudget(#[from] BudgetError),
    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),
    #[error("Internal invariant violation: {0}")]
    Internal(String),
}

#[derive(Debug, Error)]
pub enum InvalidRangeError {
    #[error("No dimension {0} in a domain of {1} dimensions")]
    UnknownDimension(usize, usize),
    #[error("Range incompatible with dimension '{name}': {source}")]
    DimensionCompatibility {
        name: String,
        #[source]
        source: DimensionCompatibilityError,
    },
    #[error("Range lower bound exceeds upper bound")]
    ReversedBounds,
    #[error("Range does not intersect the domain of dimension '{0}'")]
    OutOfDomain(String),
    #[error("Global-order subarrays admit a single range per dimension")]
    MultiRangeGlobalOrder,
    #[error("Range split error: {0}")]
    Split(#[from] SplitError),
}

#[derive(Debug, Error)]
pub enum InvalidLayoutError {
    #[error(
        "Global order requires tile extents on every dimension; dimension '{0}' has none"
    )]
    GlobalOrderWithoutTileExtents(String),
}

#[derive(Debug, Error)]
pub enum BudgetError {
    #[error("No field '{0}' in the array schema")]
    UnknownField(String),
    #[error("Field '{0}' is fixed-sized; use the fixed-size budget API")]
    ExpectedFixedSize(String),
    #[error("Field '{0}' is var-sized; use the var-size budget API")]
    ExpectedVarSize(String),
    #[error("Field '{0}' is nullable; use the nullable budget API")]
    ExpectedNonNullable(String),
    #[error("Field '{0}' is not nullable")]
    ExpectedNullable(String),
}
