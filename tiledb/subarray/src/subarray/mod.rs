mod tile_coords;

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::OnceLock;

use tiledb_common::array::{ArrayType, Layout};
use tiledb_common::range::{Range, VarValueRange};
use tiledb_common::single_value_range_go;
use tiledb_pod::array::schema::SchemaData;

use crate::error::{
    Error, InvalidLayoutError, InvalidRangeError, Result,
};
use crate::split::SplittingValue;

/// Upper sentinel for the implicit whole-domain range of a string
/// dimension. `0x7F` is the greatest ASCII character; repeating it
/// bounds every string an ASCII dimension stores in practice.
const STRING_DOMAIN_UPPER: [u8; 8] = [0x7f; 8];

/// A multi-range selection over an array domain under a traversal
/// layout.
///
/// Each dimension holds an ordered sequence of ranges; the cross
/// product of the per-dimension sequences yields the ND ranges of the
/// subarray, indexed in the flattened order chosen by the layout. A
/// dimension with no explicit range stands for its whole domain.
///
/// Mutating the range list invalidates the precomputed range offsets;
/// they are recomputed on demand.
#[derive(Clone, Debug)]
pub struct Subarray {
    schema: Arc<SchemaData>,
    layout: Layout,
    coalesce_ranges: bool,
    dim_ranges: Vec<Vec<Range>>,
    attr_ranges: HashMap<String, Vec<Range>>,
    range_offsets: OnceLock<Vec<u64>>,
}

impl Subarray {
    /// Creates a subarray selecting the whole domain of `schema`,
    /// traversed in `layout` order, with range coalescing enabled.
    pub fn new(schema: Arc<SchemaData>, layout: Layout) -> Result<Self> {
        Self::with_coalesce(schema, layout, true)
    }

    /// Creates a subarray with an explicit range-coalescing policy.
    pub fn with_coalesce(
        schema: Arc<SchemaData>,
        layout: Layout,
        coalesce_ranges: bool,
    ) -> Result<Self> {
        if layout == Layout::GlobalOrder
            && schema.array_type == ArrayType::Sparse
        {
            // global order interleaves tiles; every dimension must
            // impose tile geometry
            for d in schema.domain.dimension.iter() {
                if !d.has_tile_extent() {
                    return Err(Error::InvalidLayout(
                        InvalidLayoutError::GlobalOrderWithoutTileExtents(
                            d.name.clone(),
                        ),
                    ));
                }
            }
        }
        let dim_num = schema.domain.dimension.len();
        Ok(Subarray {
            schema,
            layout,
            coalesce_ranges,
            dim_ranges: vec![Vec::new(); dim_num],
            attr_ranges: HashMap::new(),
            range_offsets: OnceLock::new(),
        })
    }

    pub fn schema(&self) -> &Arc<SchemaData> {
        &self.schema
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn coalesce_ranges(&self) -> bool {
        self.coalesce_ranges
    }

    pub fn dim_num(&self) -> usize {
        self.schema.domain.dimension.len()
    }

    /// Adds a range on a dimension using the subarray's coalescing
    /// policy as the hint.
    pub fn add_range(&mut self, dim: usize, range: Range) -> Result<()> {
        self.add_range_with_coalesce(dim, range, self.coalesce_ranges)
    }

    /// Adds a range on a dimension.
    ///
    /// The range is validated against the dimension datatype, checked
    /// for ordered bounds, and clamped to the dimension domain. When
    /// `coalesce_hint` is set and the range is adjacent to the previous
    /// range on the dimension, the two are merged; coalescing is
    /// suppressed for non-integral dimensions where adjacency is not
    /// representable.
    pub fn add_range_with_coalesce(
        &mut self,
        dim: usize,
        range: Range,
        coalesce_hint: bool,
    ) -> Result<()> {
        let dim_num = self.dim_num();
        let Some(dimension) = self.schema.domain.dimension.get(dim) else {
            return Err(Error::InvalidRange(
                InvalidRangeError::UnknownDimension(dim, dim_num),
            ));
        };

        range
            .check_dimension_compatibility(
                dimension.datatype,
                dimension.cell_val_num(),
            )
            .map_err(|source| {
                Error::InvalidRange(
                    InvalidRangeError::DimensionCompatibility {
                        name: dimension.name.clone(),
                        source,
                    },
                )
            })?;

        if !range_bounds_ordered(&range) {
            return Err(Error::InvalidRange(InvalidRangeError::ReversedBounds));
        }

        if self.layout == Layout::GlobalOrder
            && !self.dim_ranges[dim].is_empty()
        {
            return Err(Error::InvalidRange(
                InvalidRangeError::MultiRangeGlobalOrder,
            ));
        }

        // clamp into the dimension domain
        let range = match (&range, dimension.constraints.domain()) {
            (Range::Single(svr), Some(domain)) => {
                match svr.intersection(&domain) {
                    Some(clamped) => Range::Single(clamped),
                    None => {
                        return Err(Error::InvalidRange(
                            InvalidRangeError::OutOfDomain(
                                dimension.name.clone(),
                            ),
                        ));
                    }
                }
            }
            _ => range,
        };

        let coalesce = coalesce_hint
            && dimension.datatype.is_integral_type()
            && matches!(
                (self.dim_ranges[dim].last(), &range),
                (Some(prev), r) if prev.is_adjacent(r)
            );
        if coalesce {
            let prev = self.dim_ranges[dim].pop().unwrap();
            self.dim_ranges[dim].push(prev.union(&range));
        } else {
            self.dim_ranges[dim].push(range);
        }

        self.invalidate();
        Ok(())
    }

    /// Appends a range which is already validated and clamped,
    /// without coalescing. Used when carving and splitting.
    fn push_range_unchecked(&mut self, dim: usize, range: Range) {
        self.dim_ranges[dim].push(range);
        self.invalidate();
    }

    fn invalidate(&mut self) {
        self.range_offsets = OnceLock::new();
    }

    /// Attaches ranges on a non-dimension field, stored opaquely for
    /// downstream condition pushdown.
    pub fn set_attribute_ranges(
        &mut self,
        name: impl Into<String>,
        ranges: Vec<Range>,
    ) {
        self.attr_ranges.insert(name.into(), ranges);
    }

    pub fn attribute_ranges(&self, name: &str) -> Option<&[Range]> {
        self.attr_ranges.get(name).map(|r| r.as_slice())
    }

    /// The number of ranges explicitly added on a dimension. A count
    /// of zero means the dimension defaults to its whole domain.
    pub fn range_num_per_dim(&self, dim: usize) -> usize {
        self.dim_ranges.get(dim).map(|r| r.len()).unwrap_or(0)
    }

    /// The number of ranges a dimension contributes to the cross
    /// product: the explicit count, or one for the implicit whole
    /// domain.
    pub fn effective_range_num(&self, dim: usize) -> u64 {
        std::cmp::max(1, self.range_num_per_dim(dim) as u64)
    }

    /// The total number of ND ranges in the cross product.
    pub fn range_num(&self) -> u64 {
        (0..self.dim_num())
            .map(|d| self.effective_range_num(d))
            .product()
    }

    /// Returns the `idx`-th range of a dimension, materializing the
    /// whole-domain range for a defaulted dimension.
    pub fn get_range(&self, dim: usize, idx: u64) -> Option<Range> {
        let ranges = self.dim_ranges.get(dim)?;
        if ranges.is_empty() {
            if idx == 0 {
                Some(self.default_range(dim))
            } else {
                None
            }
        } else {
            ranges.get(idx as usize).cloned()
        }
    }

    /// Returns the ranges of a dimension, materializing the implicit
    /// whole-domain range for a defaulted dimension.
    pub fn ranges_for_dim(&self, dim: usize) -> Vec<Range> {
        if self.dim_ranges[dim].is_empty() {
            vec![self.default_range(dim)]
        } else {
            self.dim_ranges[dim].clone()
        }
    }

    fn default_range(&self, dim: usize) -> Range {
        match self.schema.domain.dimension[dim].constraints.domain() {
            Some(domain) => Range::Single(domain),
            None => Range::Var(VarValueRange::from((
                &b""[..],
                &STRING_DOMAIN_UPPER[..],
            ))),
        }
    }

    /// Returns whether every dimension holds exactly one range of a
    /// single value.
    pub fn is_unary(&self) -> bool {
        (0..self.dim_num()).all(|d| {
            self.effective_range_num(d) == 1
                && self
                    .get_range(d, 0)
                    .map(|r| r.is_unary())
                    .unwrap_or(false)
        })
    }

    /// The total number of cells selected, or `None` over real or
    /// string dimensions where cells are not countable.
    pub fn cell_num(&self) -> Option<u128> {
        let mut total = 1u128;
        for d in 0..self.dim_num() {
            let per_dim = self
                .ranges_for_dim(d)
                .iter()
                .map(|r| r.num_cells())
                .sum::<Option<u128>>()?;
            total = total.checked_mul(per_dim)?;
        }
        Some(total)
    }

    /// The strides which map per-dimension range indices to the flat
    /// ND range index under the subarray's layout, computed on first
    /// use and cached until the range list changes.
    pub fn range_offsets(&self) -> &[u64] {
        self.range_offsets.get_or_init(|| {
            let n = self.dim_num();
            let counts = (0..n)
                .map(|d| self.effective_range_num(d))
                .collect::<Vec<_>>();
            let mut offsets = vec![1u64; n];
            match self.layout {
                // unordered and global order use row-major labelling
                Layout::RowMajor
                | Layout::Unordered
                | Layout::GlobalOrder => {
                    for k in (0..n.saturating_sub(1)).rev() {
                        offsets[k] = offsets[k + 1] * counts[k + 1];
                    }
                }
                Layout::ColumnMajor => {
                    for k in 1..n {
                        offsets[k] = offsets[k - 1] * counts[k - 1];
                    }
                }
            }
            offsets
        })
    }

    /// Decodes a flat ND range index into per-dimension range indices.
    pub fn range_coords(&self, flat: u64) -> Result<Vec<u64>> {
        if flat >= self.range_num() {
            return Err(Error::Internal(format!(
                "range index {} out of bounds for {} ranges",
                flat,
                self.range_num()
            )));
        }
        let offsets = self.range_offsets();
        Ok((0..self.dim_num())
            .map(|d| (flat / offsets[d]) % self.effective_range_num(d))
            .collect())
    }

    /// Encodes per-dimension range indices into the flat ND range
    /// index; the inverse of [Subarray::range_coords].
    pub fn range_idx(&self, coords: &[u64]) -> Result<u64> {
        if coords.len() != self.dim_num() {
            return Err(Error::Internal(format!(
                "range coordinates of {} dimensions against a domain of {}",
                coords.len(),
                self.dim_num()
            )));
        }
        let offsets = self.range_offsets();
        let mut flat = 0u64;
        for (d, &c) in coords.iter().enumerate() {
            if c >= self.effective_range_num(d) {
                return Err(Error::Internal(format!(
                    "range coordinate {} out of bounds on dimension {}",
                    c, d
                )));
            }
            flat += c * offsets[d];
        }
        Ok(flat)
    }

    /// The dimension indices ordered from slowest-varying to
    /// fastest-varying under the subarray's layout.
    pub(crate) fn layout_dim_order(&self) -> Vec<usize> {
        match self.layout {
            Layout::ColumnMajor => (0..self.dim_num()).rev().collect(),
            _ => (0..self.dim_num()).collect(),
        }
    }

    /// Widens the flat index interval `[start, end]` to the minimum ND
    /// box which contains every range whose flat index lies within it.
    ///
    /// The result is idempotent: expanding the expanded coordinates
    /// returns them unchanged.
    pub fn get_expanded_coordinates(
        &self,
        start: u64,
        end: u64,
    ) -> Result<(Vec<u64>, Vec<u64>)> {
        if start > end {
            return Err(Error::Internal(format!(
                "reversed range interval [{}, {}]",
                start, end
            )));
        }
        let mut start_coords = self.range_coords(start)?;
        let mut end_coords = self.range_coords(end)?;

        // Every dimension which varies faster than the first dimension
        // on which the endpoints differ spans its full extent within
        // the interval.
        let mut differed = false;
        for d in self.layout_dim_order() {
            if differed {
                start_coords[d] = 0;
                end_coords[d] = self.effective_range_num(d) - 1;
            } else if start_coords[d] != end_coords[d] {
                differed = true;
            }
        }

        Ok((start_coords, end_coords))
    }

    /// Materializes the ND range at a flat index as one range per
    /// dimension.
    pub(crate) fn nd_range(&self, flat: u64) -> Result<Vec<Range>> {
        let coords = self.range_coords(flat)?;
        Ok(coords
            .iter()
            .enumerate()
            .map(|(d, &c)| {
                self.get_range(d, c).expect("range coordinate in bounds")
            })
            .collect())
    }

    /// Carves the subarray covering the flat index interval
    /// `[start, end]` of this subarray's cross product.
    ///
    /// The interval must form an ND box under the current layout
    /// (see [Subarray::get_expanded_coordinates]); partition
    /// calibration guarantees this for the intervals the partitioner
    /// carves.
    pub fn get_subarray(&self, start: u64, end: u64) -> Result<Subarray> {
        let (start_coords, end_coords) =
            self.get_expanded_coordinates(start, end)?;

        let volume = start_coords
            .iter()
            .zip(end_coords.iter())
            .map(|(s, e)| e - s + 1)
            .product::<u64>();
        if volume != end - start + 1 {
            return Err(Error::Internal(format!(
                "interval [{}, {}] is not an ND box under layout {}",
                start, end, self.layout
            )));
        }

        let mut ret = self.carve_target();
        for d in 0..self.dim_num() {
            for r in start_coords[d]..=end_coords[d] {
                let range = self
                    .get_range(d, r)
                    .expect("range coordinate in bounds");
                ret.push_range_unchecked(d, range);
            }
        }
        Ok(ret)
    }

    /// An empty subarray sharing this subarray's schema, layout, and
    /// attribute ranges, ready to receive carved ranges.
    fn carve_target(&self) -> Subarray {
        Subarray {
            schema: Arc::clone(&self.schema),
            layout: self.layout,
            coalesce_ranges: self.coalesce_ranges,
            dim_ranges: vec![Vec::new(); self.dim_num()],
            attr_ranges: self.attr_ranges.clone(),
            range_offsets: OnceLock::new(),
        }
    }

    fn with_dim_ranges(&self, dim: usize, ranges: Vec<Range>) -> Subarray {
        let mut ret = self.clone();
        ret.dim_ranges[dim] = ranges;
        ret.invalidate();
        ret
    }

    /// Splits a subarray with a single range on `dim` at a splitting
    /// value, producing the two halves.
    pub fn split_single(
        &self,
        dim: usize,
        value: &SplittingValue,
    ) -> Result<(Subarray, Subarray)> {
        let dim_num = self.dim_num();
        if dim >= dim_num {
            return Err(Error::InvalidRange(
                InvalidRangeError::UnknownDimension(dim, dim_num),
            ));
        }
        if self.effective_range_num(dim) != 1 {
            return Err(Error::Internal(format!(
                "single-range split on dimension {} with {} ranges",
                dim,
                self.effective_range_num(dim)
            )));
        }

        let range = self.get_range(dim, 0).expect("single range");
        let (left, right) = match (&range, value) {
            (Range::Single(svr), SplittingValue::Fixed(point)) => {
                let (l, r) = svr
                    .split_at(*point)
                    .map_err(InvalidRangeError::Split)?;
                (Range::Single(l), Range::Single(r))
            }
            (
                Range::Var(vvr),
                SplittingValue::Str {
                    left_end,
                    right_start,
                },
            ) => {
                let (l, r) = vvr
                    .split_at(left_end, right_start)
                    .map_err(InvalidRangeError::Split)?;
                (Range::Var(l), Range::Var(r))
            }
            _ => {
                return Err(Error::InvalidRange(InvalidRangeError::Split(
                    tiledb_common::range::SplitError::NotVarRange,
                )));
            }
        };

        Ok((
            self.with_dim_ranges(dim, vec![left]),
            self.with_dim_ranges(dim, vec![right]),
        ))
    }

    /// Splits a multi-range subarray after range index `idx` on `dim`,
    /// producing the two slabs.
    pub fn split_multi(
        &self,
        dim: usize,
        idx: u64,
    ) -> Result<(Subarray, Subarray)> {
        let ranges = self.ranges_for_dim(dim);
        if idx as usize + 1 >= ranges.len() {
            return Err(Error::Internal(format!(
                "multi-range split after index {} of {} ranges",
                idx,
                ranges.len()
            )));
        }
        let (left, right) = ranges.split_at(idx as usize + 1);
        Ok((
            self.with_dim_ranges(dim, left.to_vec()),
            self.with_dim_ranges(dim, right.to_vec()),
        ))
    }
}

fn range_bounds_ordered(range: &Range) -> bool {
    match range {
        Range::Single(svr) => {
            single_value_range_go!(svr, _DT, start, end, {
                use tiledb_common::datatype::physical::BitsOrd;
                start.bits_le(end)
            })
        }
        Range::Var(vvr) => match vvr.string_bounds() {
            Some((start, end)) => start <= end,
            None => true,
        },
    }
}

#[cfg(test)]
mod tests {
    use tiledb_common::array::dimension::DimensionConstraints;
    use tiledb_common::datatype::Datatype;
    use tiledb_pod::array::attribute::AttributeData;
    use tiledb_pod::array::dimension::DimensionData;
    use tiledb_pod::array::domain::DomainData;

    use super::*;

    fn schema_2d() -> Arc<SchemaData> {
        Arc::new(SchemaData {
            array_type: ArrayType::Dense,
            domain: DomainData {
                dimension: vec![
                    DimensionData {
                        name: "d1".to_owned(),
                        datatype: Datatype::Int32,
                        constraints: DimensionConstraints::from((
                            [1i32, 100],
                            10,
                        )),
                    },
                    DimensionData {
                        name: "d2".to_owned(),
                        datatype: Datatype::Int32,
                        constraints: DimensionConstraints::from((
                            [1i32, 100],
                            10,
                        )),
                    },
                ],
            },
            capacity: None,
            cell_order: None,
            tile_order: None,
            allow_duplicates: None,
            attributes: vec![AttributeData {
                name: "a".to_owned(),
                datatype: Datatype::Int32,
                nullability: None,
                cell_val_num: None,
            }],
        })
    }

    fn ranges_2x3(layout: Layout) -> Subarray {
        let mut s = Subarray::new(schema_2d(), layout).unwrap();
        s.add_range(0, Range::from(&[1i32, 2])).unwrap();
        s.add_range(0, Range::from(&[5i32, 6])).unwrap();
        s.add_range(1, Range::from(&[1i32, 1])).unwrap();
        s.add_range(1, Range::from(&[3i32, 4])).unwrap();
        s.add_range(1, Range::from(&[7i32, 8])).unwrap();
        s
    }

    #[test]
    fn empty_subarray_is_whole_domain() {
        let s = Subarray::new(schema_2d(), Layout::RowMajor).unwrap();
        assert_eq!(0, s.range_num_per_dim(0));
        assert_eq!(1, s.range_num());
        assert_eq!(
            Some(Range::from(&[1i32, 100])),
            s.get_range(0, 0)
        );
        assert_eq!(Some(100 * 100), s.cell_num());
    }

    #[test]
    fn add_range_validation() {
        let mut s = Subarray::new(schema_2d(), Layout::RowMajor).unwrap();
        assert!(matches!(
            s.add_range(2, Range::from(&[1i32, 2])),
            Err(Error::InvalidRange(InvalidRangeError::UnknownDimension(
                2, 2
            )))
        ));
        assert!(matches!(
            s.add_range(0, Range::from(&[1i64, 2])),
            Err(Error::InvalidRange(
                InvalidRangeError::DimensionCompatibility { .. }
            ))
        ));
        assert!(matches!(
            s.add_range(0, Range::from(&[5i32, 2])),
            Err(Error::InvalidRange(InvalidRangeError::ReversedBounds))
        ));
        assert!(matches!(
            s.add_range(0, Range::from(&[200i32, 300])),
            Err(Error::InvalidRange(InvalidRangeError::OutOfDomain(_)))
        ));
        // clamped to the domain
        s.add_range(0, Range::from(&[90i32, 300])).unwrap();
        assert_eq!(Some(Range::from(&[90i32, 100])), s.get_range(0, 0));
    }

    #[test]
    fn add_range_coalesce() {
        let mut s = Subarray::new(schema_2d(), Layout::RowMajor).unwrap();
        s.add_range(0, Range::from(&[1i32, 2])).unwrap();
        s.add_range(0, Range::from(&[3i32, 5])).unwrap();
        assert_eq!(1, s.range_num_per_dim(0));
        assert_eq!(Some(Range::from(&[1i32, 5])), s.get_range(0, 0));

        // not adjacent: no merge
        s.add_range(0, Range::from(&[7i32, 9])).unwrap();
        assert_eq!(2, s.range_num_per_dim(0));

        // coalescing suppressed
        let mut s =
            Subarray::with_coalesce(schema_2d(), Layout::RowMajor, false)
                .unwrap();
        s.add_range(0, Range::from(&[1i32, 2])).unwrap();
        s.add_range(0, Range::from(&[3i32, 5])).unwrap();
        assert_eq!(2, s.range_num_per_dim(0));
    }

    #[test]
    fn global_order_single_range_per_dim() {
        let mut s =
            Subarray::new(schema_2d(), Layout::GlobalOrder).unwrap();
        s.add_range(0, Range::from(&[1i32, 2])).unwrap();
        assert!(matches!(
            s.add_range(0, Range::from(&[5i32, 6])),
            Err(Error::InvalidRange(
                InvalidRangeError::MultiRangeGlobalOrder
            ))
        ));
    }

    #[test]
    fn range_offsets_row_major() {
        let s = ranges_2x3(Layout::RowMajor);
        assert_eq!(6, s.range_num());
        assert_eq!(&[3, 1], s.range_offsets());
        assert_eq!(vec![1, 2], s.range_coords(5).unwrap());
        assert_eq!(5, s.range_idx(&[1, 2]).unwrap());
    }

    #[test]
    fn range_offsets_col_major() {
        let s = ranges_2x3(Layout::ColumnMajor);
        assert_eq!(&[1, 2], s.range_offsets());
        assert_eq!(vec![1, 2], s.range_coords(5).unwrap());
        assert_eq!(5, s.range_idx(&[1, 2]).unwrap());
    }

    #[test]
    fn flat_index_roundtrip() {
        for layout in [
            Layout::RowMajor,
            Layout::ColumnMajor,
            Layout::Unordered,
        ] {
            let s = ranges_2x3(layout);
            for flat in 0..s.range_num() {
                let coords = s.range_coords(flat).unwrap();
                assert_eq!(flat, s.range_idx(&coords).unwrap());
            }
        }
    }

    #[test]
    fn expanded_coordinates() {
        let s = ranges_2x3(Layout::RowMajor);
        // within one row: no expansion
        assert_eq!(
            (vec![0, 1], vec![0, 2]),
            s.get_expanded_coordinates(1, 2).unwrap()
        );
        // crossing a row boundary expands the faster dimension
        assert_eq!(
            (vec![0, 0], vec![1, 2]),
            s.get_expanded_coordinates(1, 4).unwrap()
        );
        // idempotent
        let (lo, hi) = s.get_expanded_coordinates(1, 4).unwrap();
        let lo_flat = s.range_idx(&lo).unwrap();
        let hi_flat = s.range_idx(&hi).unwrap();
        assert_eq!(
            (lo, hi),
            s.get_expanded_coordinates(lo_flat, hi_flat).unwrap()
        );
    }

    #[test]
    fn carve_full_rows() {
        let s = ranges_2x3(Layout::RowMajor);
        let p = s.get_subarray(0, 2).unwrap();
        assert_eq!(3, p.range_num());
        assert_eq!(1, p.range_num_per_dim(0));
        assert_eq!(3, p.range_num_per_dim(1));
        assert_eq!(Some(Range::from(&[1i32, 2])), p.get_range(0, 0));

        // a non-box interval is rejected
        assert!(s.get_subarray(1, 4).is_err());

        // single range
        let p = s.get_subarray(4, 4).unwrap();
        assert_eq!(1, p.range_num());
        assert_eq!(Some(Range::from(&[5i32, 6])), p.get_range(0, 0));
        assert_eq!(Some(Range::from(&[3i32, 4])), p.get_range(1, 0));
    }

    #[test]
    fn split_multi_ranges() {
        let s = ranges_2x3(Layout::RowMajor);
        let (left, right) = s.split_multi(1, 0).unwrap();
        assert_eq!(2, left.range_num());
        assert_eq!(4, right.range_num());
        assert_eq!(Some(Range::from(&[1i32, 1])), left.get_range(1, 0));
        assert_eq!(Some(Range::from(&[3i32, 4])), right.get_range(1, 0));
    }

    #[test]
    fn attribute_ranges_roundtrip() {
        let mut s = Subarray::new(schema_2d(), Layout::RowMajor).unwrap();
        assert!(s.attribute_ranges("a").is_none());
        let ranges = vec![Range::from(&[1i32, 3]), Range::from(&[9i32, 9])];
        s.set_attribute_ranges("a", ranges.clone());
        assert_eq!(Some(ranges.as_slice()), s.attribute_ranges("a"));

        // carves inherit attribute ranges
        let p = s.get_subarray(0, 0).unwrap();
        assert_eq!(Some(ranges.as_slice()), p.attribute_ranges("a"));
    }
}
