//! Result-size and memory-size estimation from fragment metadata.
//!
//! Estimates are computed per ND range from the tiles the metadata
//! oracle reports as overlapping, without reading any cell data.
//! Partial tile overlap is weighted by the fraction of the tile's
//! minimum bounding rectangle the range covers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rayon::prelude::*;

use tiledb_common::range::Range;

use crate::error::Result;
use crate::metadata::{ArrayMetadata, CoverageKind};
use crate::subarray::Subarray;

/// Estimated result sizes of one field, in bytes.
///
/// Sizes are fractional because partially covered tiles contribute
/// proportionally; callers compare ceilings against budgets.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ResultSize {
    pub size_fixed: f64,
    pub size_var: f64,
    pub size_validity: f64,
}

impl ResultSize {
    fn accumulate(&mut self, other: &ResultSize) {
        self.size_fixed += other.size_fixed;
        self.size_var += other.size_var;
        self.size_validity += other.size_validity;
    }
}

/// Upper bound of the resident working set of one field, in bytes:
/// the total size of every tile with any overlap, which a reader
/// would hold resident while producing the result.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct MemorySize {
    pub size_fixed: u64,
    pub size_var: u64,
    pub size_validity: u64,
}

impl MemorySize {
    fn accumulate(&mut self, other: &MemorySize) {
        self.size_fixed += other.size_fixed;
        self.size_var += other.size_var;
        self.size_validity += other.size_validity;
    }
}

/// Estimates of one field over some set of ND ranges.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FieldEstimate {
    pub result: ResultSize,
    pub memory: MemorySize,
}

impl FieldEstimate {
    fn accumulate(&mut self, other: &FieldEstimate) {
        self.result.accumulate(&other.result);
        self.memory.accumulate(&other.memory);
    }
}

/// Estimates for every field of the schema.
pub type EstimateSet = HashMap<String, FieldEstimate>;

type RangeEstimate = Arc<EstimateSet>;

/// Estimates result and memory sizes of subarrays against one array
/// snapshot.
///
/// Per-ND-range estimates of the partitioner's original subarray are
/// memoized by flat range index; the original is immutable while a
/// partitioner iterates, so the cache never invalidates mid-flight.
/// Derived subarrays (carves and splits) are estimated afresh.
pub struct SizeEstimator {
    metadata: Arc<dyn ArrayMetadata>,
    pool: Arc<rayon::ThreadPool>,
    cache: Mutex<HashMap<u64, RangeEstimate>>,
}

impl SizeEstimator {
    pub fn new(
        metadata: Arc<dyn ArrayMetadata>,
        pool: Arc<rayon::ThreadPool>,
    ) -> Self {
        SizeEstimator {
            metadata,
            pool,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn metadata(&self) -> &Arc<dyn ArrayMetadata> {
        &self.metadata
    }

    /// Sums the estimates of the flat ND range interval
    /// `[start, end]` of `origin`, memoizing per-range results.
    pub fn interval_estimate(
        &self,
        origin: &Subarray,
        start: u64,
        end: u64,
    ) -> Result<EstimateSet> {
        let missing = {
            let cache = self.cache.lock().unwrap();
            (start..=end)
                .filter(|flat| !cache.contains_key(flat))
                .collect::<Vec<_>>()
        };

        if !missing.is_empty() {
            let computed = self.pool.install(|| {
                missing
                    .par_iter()
                    .map(|&flat| {
                        Ok((flat, self.range_estimate(origin, flat)?))
                    })
                    .collect::<Result<Vec<_>>>()
            })?;
            let mut cache = self.cache.lock().unwrap();
            for (flat, estimate) in computed {
                cache.insert(flat, Arc::new(estimate));
            }
        }

        let cache = self.cache.lock().unwrap();
        let mut sums = self.empty_estimates();
        for flat in start..=end {
            let estimate = cache
                .get(&flat)
                .expect("estimate computed above");
            for (name, field) in estimate.iter() {
                sums.get_mut(name)
                    .expect("schema fields are stable")
                    .accumulate(field);
            }
        }
        Ok(sums)
    }

    /// Sums the estimates over every ND range of `subarray`, without
    /// caching. Used for candidate partitions.
    pub fn subarray_estimate(
        &self,
        subarray: &Subarray,
    ) -> Result<EstimateSet> {
        let range_num = subarray.range_num();
        let per_range = self.pool.install(|| {
            (0..range_num)
                .into_par_iter()
                .map(|flat| self.range_estimate(subarray, flat))
                .collect::<Result<Vec<_>>>()
        })?;

        let mut sums = self.empty_estimates();
        for estimate in per_range {
            for (name, field) in estimate.iter() {
                sums.get_mut(name)
                    .expect("schema fields are stable")
                    .accumulate(field);
            }
        }
        Ok(sums)
    }

    fn empty_estimates(&self) -> EstimateSet {
        self.metadata
            .schema()
            .fields()
            .map(|f| (f.name().to_owned(), FieldEstimate::default()))
            .collect()
    }

    /// Estimates one ND range of `subarray`.
    fn range_estimate(
        &self,
        subarray: &Subarray,
        flat: u64,
    ) -> Result<EstimateSet> {
        let nd_range = subarray.nd_range(flat)?;
        let overlap = self.metadata.rtree_overlap(&nd_range)?;

        let mut estimates = self.empty_estimates();
        let schema = self.metadata.schema();
        for (tile, kind) in overlap.tiles.iter() {
            let coverage = match kind {
                CoverageKind::Full => 1.0,
                CoverageKind::Partial => {
                    coverage_ratio(self.metadata.mbr(*tile), &nd_range)
                }
            };
            for field in schema.fields() {
                let estimate = estimates
                    .get_mut(field.name())
                    .expect("schema fields are stable");

                let fixed = self.metadata.tile_size(*tile, field.name());
                estimate.result.size_fixed += fixed as f64 * coverage;
                estimate.memory.size_fixed += fixed;

                if field.is_var_sized() {
                    let var =
                        self.metadata.tile_var_size(*tile, field.name());
                    estimate.result.size_var += var as f64 * coverage;
                    estimate.memory.size_var += var;
                }

                if field.is_nullable() {
                    let validity = self
                        .metadata
                        .tile_validity_size(*tile, field.name());
                    estimate.result.size_validity +=
                        validity as f64 * coverage;
                    estimate.memory.size_validity += validity;
                }
            }
        }
        Ok(estimates)
    }
}

/// The fraction of a tile's minimum bounding rectangle covered by an
/// ND range: the product of the per-dimension overlap ratios.
fn coverage_ratio(
    mbr: &tiledb_common::range::NonEmptyDomain,
    nd_range: &[Range],
) -> f64 {
    mbr.iter()
        .zip(nd_range.iter())
        .map(|(tile_range, query_range)| {
            tile_range.overlap_ratio(query_range)
        })
        .product()
}
