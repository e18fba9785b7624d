//! Splitting-point selection for partitioning.
//!
//! Given a subarray which exceeds the partitioning budget, these
//! routines choose a dimension and a value (or a range index) at
//! which to subdivide it. Layout decides the strategy: ordered and
//! unordered layouts split on the value midpoint of the first
//! splittable dimension in tile order; global order splits along tile
//! boundaries, or through Hilbert coordinate space when the cell
//! order is Hilbert.

use tiledb_common::array::{CellOrder, Layout};
use tiledb_common::array::dimension::DimensionConstraints;
use tiledb_common::datatype::physical::{
    BitsOrd, NextValue, PhysicalValue,
};
use tiledb_common::range::Range;
use tiledb_common::{dimension_constraints_go, single_value_range_go};

use crate::hilbert::Hilbert;
use crate::subarray::Subarray;

/// The value at which a single range is split.
#[derive(Clone, Debug, PartialEq)]
pub enum SplittingValue {
    /// Fixed-size dimensions split after a point:
    /// `[lo, v]` and `[next(v), hi]`.
    Fixed(PhysicalValue),
    /// String dimensions carry both inner bounds explicitly:
    /// `[lo, left_end]` and `[right_start, hi]`.
    Str {
        left_end: Box<[u8]>,
        right_start: Box<[u8]>,
    },
}

/// Where to split a single-range subarray.
#[derive(Clone, Debug, PartialEq)]
pub struct SplittingPoint {
    pub dim: usize,
    pub value: SplittingValue,
    /// `true` iff the left half precedes the right half in the
    /// subarray's layout. Hilbert cell order may reverse the
    /// geometric order.
    pub normal_order: bool,
}

/// Where to split a multi-range slab.
#[derive(Clone, Debug, PartialEq)]
pub enum MultiRangeSplit {
    /// Split the range list of `dim` after range index `idx`.
    Ranges { dim: usize, idx: u64 },
    /// The slab holds a single ND range; split it by value.
    Value(SplittingPoint),
}

/// Chooses the splitting dimension and value for a subarray with one
/// range per dimension, or `None` when no further subdivision is
/// representable.
pub fn single_range_splitting_point(s: &Subarray) -> Option<SplittingPoint> {
    if s.layout() == Layout::GlobalOrder {
        if s.schema().cell_order() == CellOrder::Hilbert {
            return hilbert_splitting_point(s);
        }
        return tile_splitting_point(s);
    }

    // first dimension in tile order with a splittable range
    for d in s.tile_dim_order() {
        let r = s.get_range(d, 0)?;
        if !r.is_unary() {
            return midpoint_value(&r).map(|value| SplittingPoint {
                dim: d,
                value,
                normal_order: true,
            });
        }
    }
    None
}

/// Chooses where to split a multi-range slab: the median range index
/// of the first dimension in layout order carrying more than one
/// range, falling back to value splitting for a single ND range.
pub fn multi_range_splitting_point(s: &Subarray) -> Option<MultiRangeSplit> {
    if s.range_num() == 1 {
        return single_range_splitting_point(s).map(MultiRangeSplit::Value);
    }
    for d in s.layout_dim_order() {
        let rn = s.effective_range_num(d);
        if rn > 1 {
            return Some(MultiRangeSplit::Ranges {
                dim: d,
                idx: (rn - 1) / 2,
            });
        }
    }
    None
}

/// The midpoint splitting value of one range, or `None` when the
/// range cannot be subdivided within its representable precision.
fn midpoint_value(r: &Range) -> Option<SplittingValue> {
    match r {
        Range::Single(svr) => {
            single_value_range_go!(svr, DT : Integral, start, end,
                {
                    if start.bits_ge(end) {
                        return None;
                    }
                    let lo = i128::from(*start);
                    let hi = i128::from(*end);
                    let mid = DT::try_from(lo + (hi - lo) / 2).ok()?;
                    Some(SplittingValue::Fixed(PhysicalValue::from(mid)))
                },
                {
                    if start.bits_ge(end) {
                        return None;
                    }
                    // two adjacent representable values cannot be split
                    let succ = start.next_value()?;
                    if succ.bits_ge(end) {
                        return None;
                    }
                    let mut mid = *start + (*end - *start) / 2.0;
                    if !mid.is_finite() {
                        mid = *start / 2.0 + *end / 2.0;
                    }
                    if mid.bits_ge(end) || mid.bits_lt(start) {
                        mid = *start;
                    }
                    Some(SplittingValue::Fixed(PhysicalValue::from(mid)))
                }
            )
        }
        Range::Var(vvr) => {
            let (lo, hi) = vvr.string_bounds()?;
            let (left_end, right_start) = string_splitting_bounds(lo, hi)?;
            Some(SplittingValue::Str {
                left_end,
                right_start,
            })
        }
    }
}

/// Computes the inner bounds of a string range split.
///
/// With `P` the longest common prefix of the bounds, the split byte is
/// the midpoint of the first differing bytes; the left half is closed
/// with a trailing `0x7F` and the right half opens at the next prefix.
/// No split exists when `lo` is itself a prefix of `hi` (no separator
/// of length `|P| + 1` lies strictly between the bounds), or when the
/// `0x7F` suffix would fall below `lo`.
fn string_splitting_bounds(
    lo: &[u8],
    hi: &[u8],
) -> Option<(Box<[u8]>, Box<[u8]>)> {
    let p = lo
        .iter()
        .zip(hi.iter())
        .take_while(|(a, b)| a == b)
        .count();
    if p == lo.len() || p == hi.len() {
        return None;
    }
    let c1 = lo[p];
    let c2 = hi[p];
    debug_assert!(c1 < c2);
    let mid = c1 + (c2 - c1) / 2;

    let mut left_end = lo[..p].to_vec();
    left_end.push(mid);
    left_end.push(0x7f);
    if left_end.as_slice() < lo {
        return None;
    }

    let mut right_start = lo[..p].to_vec();
    right_start.push(mid + 1);

    Some((
        left_end.into_boxed_slice(),
        right_start.into_boxed_slice(),
    ))
}

/// Global order over a non-Hilbert cell order: split along the first
/// dimension in tile order whose range crosses a tile boundary, at
/// the end of the middle tile. A range lying within one tile on every
/// dimension is unsplittable for this path.
fn tile_splitting_point(s: &Subarray) -> Option<SplittingPoint> {
    let schema = s.schema();
    for d in s.tile_dim_order() {
        let constraints = &schema.domain.dimension[d].constraints;
        let Some(Range::Single(svr)) = s.get_range(d, 0) else {
            continue;
        };
        let Some(tiles) = constraints.tile_num(&svr) else {
            continue;
        };
        if tiles > 1 {
            let tiles_apart = tiles - 1;
            let k = std::cmp::max(1, tiles_apart / 2) - 1;
            let value = constraints.ceil_to_tile(&svr, k)?;
            return Some(SplittingPoint {
                dim: d,
                value: SplittingValue::Fixed(value),
                normal_order: true,
            });
        }
    }
    None
}

/// Global order with Hilbert cell order: map the ND range into Hilbert
/// coordinate space, split the dimension with the largest mapped
/// extent at its mapped midpoint, and order the halves by the Hilbert
/// index of their centers.
fn hilbert_splitting_point(s: &Subarray) -> Option<SplittingPoint> {
    let curve = Hilbert::new(s.dim_num());
    let mapped = compute_range_uint64(s, &curve)?;

    if mapped.iter().all(|[lo, hi]| lo == hi) {
        return None;
    }

    let (dim, [mlo, mhi]) = mapped
        .iter()
        .enumerate()
        .max_by_key(|(_, [lo, hi])| hi - lo)
        .map(|(d, m)| (d, *m))?;
    let mmid = mlo + (mhi - mlo) / 2;

    let value = unmap_splitting_value(s, dim, &curve, mmid)?;

    let mut left_center = mapped
        .iter()
        .map(|[lo, hi]| lo + (hi - lo) / 2)
        .collect::<Vec<_>>();
    let mut right_center = left_center.clone();
    left_center[dim] = mlo + (mmid - mlo) / 2;
    right_center[dim] = (mmid + 1) + (mhi - (mmid + 1)) / 2;
    let normal_order =
        curve.index(&left_center) <= curve.index(&right_center);

    Some(SplittingPoint {
        dim,
        value,
        normal_order,
    })
}

/// The number of Hilbert coordinate bits of one dimension: enough for
/// the domain, capped by the curve's per-axis width.
fn dim_bits(constraints: &DimensionConstraints, curve_bits: u32) -> u32 {
    let bits = match constraints.num_cells() {
        Some(cells) => std::cmp::min(ceil_log2(cells), curve_bits),
        None => curve_bits,
    };
    std::cmp::max(1, bits)
}

fn ceil_log2(n: u128) -> u32 {
    if n <= 1 {
        1
    } else {
        128 - (n - 1).leading_zeros()
    }
}

/// Maps the single range of each dimension into Hilbert coordinate
/// space as `[lo, hi]` bucket pairs.
fn compute_range_uint64(
    s: &Subarray,
    curve: &Hilbert,
) -> Option<Vec<[u64; 2]>> {
    let mut out = Vec::with_capacity(s.dim_num());
    for d in 0..s.dim_num() {
        let constraints = &s.schema().domain.dimension[d].constraints;
        let bits = dim_bits(constraints, curve.bits_per_dim());
        let buckets = (1u128 << bits) - 1;
        let range = s.get_range(d, 0)?;
        let mapped = dimension_constraints_go!(
            constraints,
            _DT,
            [low, high],
            _extent,
            {
                let Range::Single(svr) = &range else {
                    return None;
                };
                let (r_lo, r_hi) = svr.integral_bounds()?;
                let low = i128::from(*low);
                let high = i128::from(*high);
                let cells = (high - low + 1) as u128;
                let map = |v: i128| -> u64 {
                    if cells <= 1 {
                        0
                    } else {
                        ((v - low) as u128 * buckets / (cells - 1)) as u64
                    }
                };
                [map(r_lo), map(r_hi)]
            },
            {
                let Range::Single(svr) = &range else {
                    return None;
                };
                let (r_lo, r_hi) = svr.real_bounds()?;
                let low = f64::from(*low);
                let high = f64::from(*high);
                let len = high - low;
                let map = |v: f64| -> u64 {
                    if len <= 0.0 {
                        0
                    } else {
                        (((v - low) / len).clamp(0.0, 1.0)
                            * buckets as f64) as u64
                    }
                };
                [map(r_lo), map(r_hi)]
            },
            {
                let Range::Var(vvr) = &range else {
                    return None;
                };
                let (lo, hi) = vvr.string_bounds()?;
                [map_string(lo, bits), map_string(hi, bits)]
            }
        );
        out.push(mapped);
    }
    Some(out)
}

fn map_string(bytes: &[u8], bits: u32) -> u64 {
    let mut v = 0u64;
    for i in 0..8 {
        v = (v << 8) | u64::from(*bytes.get(i).unwrap_or(&0));
    }
    v >> (64 - bits)
}

fn unmap_string(m: u64, bits: u32) -> Vec<u8> {
    let raw = (m << (64 - bits)).to_be_bytes();
    let len = raw.iter().rposition(|b| *b != 0).map(|p| p + 1).unwrap_or(0);
    raw[..len].to_vec()
}

/// Maps a Hilbert-space midpoint back into the dimension domain as a
/// splitting value, clamped into the interior of the dimension's
/// range. Falls back to the midpoint split when rounding leaves the
/// interior empty.
fn unmap_splitting_value(
    s: &Subarray,
    dim: usize,
    curve: &Hilbert,
    m: u64,
) -> Option<SplittingValue> {
    let constraints = &s.schema().domain.dimension[dim].constraints;
    let bits = dim_bits(constraints, curve.bits_per_dim());
    let buckets = (1u128 << bits) - 1;
    let range = s.get_range(dim, 0)?;
    dimension_constraints_go!(
        constraints,
        DT,
        [low, high],
        _extent,
        {
            let Range::Single(svr) = &range else {
                return None;
            };
            let (r_lo, r_hi) = svr.integral_bounds()?;
            let low = i128::from(*low);
            let high = i128::from(*high);
            let cells = (high - low + 1) as u128;
            let mut v = if cells <= 1 {
                low
            } else {
                low + (m as u128 * (cells - 1) / buckets) as i128
            };
            if v >= r_hi {
                v = r_hi - 1;
            }
            if v < r_lo {
                v = r_lo;
            }
            if v >= r_hi {
                return None;
            }
            let v = DT::try_from(v).ok()?;
            Some(SplittingValue::Fixed(PhysicalValue::from(v)))
        },
        {
            let Range::Single(svr) = &range else {
                return None;
            };
            let (r_lo, r_hi) = svr.real_bounds()?;
            let low = f64::from(*low);
            let high = f64::from(*high);
            let mut v = low + (m as f64 / buckets as f64) * (high - low);
            if !v.is_finite() || v < r_lo {
                v = r_lo;
            }
            let v = num_traits::cast::<f64, DT>(v)?;
            if f64::from(v) >= r_hi {
                return midpoint_value(&range);
            }
            Some(SplittingValue::Fixed(PhysicalValue::from(v)))
        },
        {
            let Range::Var(vvr) = &range else {
                return None;
            };
            let (lo, hi) = vvr.string_bounds()?;
            let mut sv = unmap_string(m, bits);
            if sv.as_slice() < lo {
                sv = lo.to_vec();
            }
            if sv.as_slice() >= hi {
                return midpoint_value(&range);
            }
            let mut right_start = sv.clone();
            right_start.push(0x00);
            Some(SplittingValue::Str {
                left_end: sv.into_boxed_slice(),
                right_start: right_start.into_boxed_slice(),
            })
        }
    )
}
