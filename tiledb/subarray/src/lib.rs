//! Query planning for multi-dimensional array reads.
//!
//! A [Subarray] describes a multi-range selection over an array domain
//! under a traversal [Layout](tiledb_common::array::Layout). A
//! [SubarrayPartitioner] iterates over partitions of a subarray such
//! that the results produced if each partition were submitted for a
//! read query can (approximately) fit caller-declared result size and
//! memory budgets.
//!
//! The partitioner reaches on-disk state only through the
//! [metadata::ArrayMetadata] facade, so it can be driven entirely
//! in memory for testing.

pub mod config;
pub mod error;
pub mod estimator;
pub mod hilbert;
pub mod metadata;
pub mod partitioner;
pub mod split;
pub mod subarray;

pub use config::Config;
pub use error::{Error, Result};
pub use partitioner::SubarrayPartitioner;
pub use subarray::Subarray;
