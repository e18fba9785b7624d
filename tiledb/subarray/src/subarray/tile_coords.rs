use std::collections::BTreeSet;

use itertools::Itertools;

use tiledb_common::array::{Layout, TileOrder};
use tiledb_common::array::dimension::DimensionConstraints;
use tiledb_common::datatype::physical::PhysicalValue;
use tiledb_common::physical_value_go;
use tiledb_common::range::Range;

use super::Subarray;

impl Subarray {
    /// Computes the coordinates of the tiles which overlap the
    /// subarray, as one tile index per dimension, sorted canonically
    /// in the schema's tile order.
    ///
    /// Returns `None` unless every dimension imposes tile geometry
    /// (i.e. for dense arrays).
    pub fn tile_coords(&self) -> Option<Vec<Vec<u64>>> {
        let per_dim = (0..self.dim_num())
            .map(|d| self.dim_tile_indices(d))
            .collect::<Option<Vec<_>>>()?;

        // iterate the cross product with the slowest dimension first,
        // then restore schema dimension order in each coordinate
        let order = self.tile_dim_order();
        let coords = order
            .iter()
            .map(|&d| per_dim[d].iter().copied().collect::<Vec<_>>())
            .multi_cartesian_product()
            .map(|tile| {
                let mut coord = vec![0u64; self.dim_num()];
                for (pos, &d) in order.iter().enumerate() {
                    coord[d] = tile[pos];
                }
                coord
            })
            .collect::<Vec<_>>();
        Some(coords)
    }

    /// Returns the coordinates of the overlapping tile which contains
    /// the logical point, or `None` when the point lies outside every
    /// tile overlapping the subarray.
    pub fn tile_coords_containing(
        &self,
        point: &[PhysicalValue],
    ) -> Option<Vec<u64>> {
        if point.len() != self.dim_num() {
            return None;
        }
        let mut coord = Vec::with_capacity(self.dim_num());
        for (d, value) in point.iter().enumerate() {
            let constraints =
                &self.schema.domain.dimension[d].constraints;
            let tile = tile_index(constraints, value)?;
            if !self.dim_tile_indices(d)?.contains(&tile) {
                return None;
            }
            coord.push(tile);
        }
        Some(coord)
    }

    /// Clips the subarray to the ND box of the tile at `tile`,
    /// preserving per-dimension range structure, with the result
    /// traversed in `layout` order.
    ///
    /// Returns `None` when the tile does not overlap the subarray.
    pub fn crop_to_tile(
        &self,
        tile: &[u64],
        layout: Layout,
    ) -> Option<Subarray> {
        assert_eq!(tile.len(), self.dim_num());

        let mut ret = self.carve_target();
        ret.layout = layout;
        for d in 0..self.dim_num() {
            let constraints =
                &self.schema.domain.dimension[d].constraints;
            let tile_range =
                Range::Single(constraints.tile_range(tile[d])?);
            let mut any = false;
            for r in self.ranges_for_dim(d) {
                if let Some(clipped) = clip(&r, &tile_range) {
                    ret.push_range_unchecked(d, clipped);
                    any = true;
                }
            }
            if !any {
                return None;
            }
        }
        Some(ret)
    }

    /// The number of cells of the tile at `tile` which the subarray
    /// selects. Zero when the tile does not overlap the subarray.
    pub fn tile_cell_num(&self, tile: &[u64]) -> u128 {
        match self.crop_to_tile(tile, self.layout) {
            Some(cropped) => cropped.cell_num().unwrap_or(0),
            None => 0,
        }
    }

    /// The tile indices on one dimension covered by any of the
    /// dimension's ranges.
    fn dim_tile_indices(&self, dim: usize) -> Option<BTreeSet<u64>> {
        let constraints = &self.schema.domain.dimension[dim].constraints;
        let mut tiles = BTreeSet::new();
        for r in self.ranges_for_dim(dim) {
            let Range::Single(svr) = r else {
                return None;
            };
            let num = constraints.tile_num(&svr)?;
            let first = first_tile_index(constraints, &svr)?;
            tiles.extend(first..first + num);
        }
        Some(tiles)
    }

    /// The dimension indices ordered from slowest-varying to
    /// fastest-varying under the schema's tile order.
    pub(crate) fn tile_dim_order(&self) -> Vec<usize> {
        match self.schema.tile_order() {
            TileOrder::RowMajor => (0..self.dim_num()).collect(),
            TileOrder::ColumnMajor => (0..self.dim_num()).rev().collect(),
        }
    }
}

fn clip(range: &Range, tile_range: &Range) -> Option<Range> {
    if range.intersects(tile_range) {
        range.intersection(tile_range)
    } else {
        None
    }
}

fn first_tile_index(
    constraints: &DimensionConstraints,
    range: &tiledb_common::range::SingleValueRange,
) -> Option<u64> {
    tiledb_common::dimension_constraints_go!(
        constraints,
        _DT,
        [low, _high],
        extent,
        {
            let extent = i128::from((*extent)?);
            let low = i128::from(*low);
            let (start, _) = range.integral_bounds()?;
            Some(((start - low) / extent) as u64)
        },
        {
            let extent = f64::from(*extent.as_ref()?);
            let low = f64::from(*low);
            let (start, _) = range.real_bounds()?;
            Some(((start - low) / extent).floor() as u64)
        },
        None
    )
}

fn tile_index(
    constraints: &DimensionConstraints,
    value: &PhysicalValue,
) -> Option<u64> {
    tiledb_common::dimension_constraints_go!(
        constraints,
        _DT,
        [low, high],
        extent,
        {
            let extent = i128::from((*extent)?);
            let low = i128::from(*low);
            let high = i128::from(*high);
            let v = physical_value_go!(value, _VT, v, { *v as i128 });
            if v < low || v > high {
                return None;
            }
            Some(((v - low) / extent) as u64)
        },
        {
            let extent = f64::from(*extent.as_ref()?);
            let low = f64::from(*low);
            let high = f64::from(*high);
            let v = physical_value_go!(value, _VT, v, { *v as f64 });
            if v < low || v > high {
                return None;
            }
            Some(((v - low) / extent).floor() as u64)
        },
        None
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tiledb_common::array::ArrayType;
    use tiledb_common::datatype::Datatype;
    use tiledb_pod::array::attribute::AttributeData;
    use tiledb_pod::array::dimension::DimensionData;
    use tiledb_pod::array::domain::DomainData;
    use tiledb_pod::array::schema::SchemaData;

    use super::*;

    fn schema_2d(tile_order: Option<TileOrder>) -> Arc<SchemaData> {
        Arc::new(SchemaData {
            array_type: ArrayType::Dense,
            domain: DomainData {
                dimension: vec![
                    DimensionData {
                        name: "d1".to_owned(),
                        datatype: Datatype::Int32,
                        constraints: DimensionConstraints::from((
                            [1i32, 8],
                            2,
                        )),
                    },
                    DimensionData {
                        name: "d2".to_owned(),
                        datatype: Datatype::Int32,
                        constraints: DimensionConstraints::from((
                            [1i32, 8],
                            4,
                        )),
                    },
                ],
            },
            capacity: None,
            cell_order: None,
            tile_order,
            allow_duplicates: None,
            attributes: vec![AttributeData {
                name: "a".to_owned(),
                datatype: Datatype::Int32,
                nullability: None,
                cell_val_num: None,
            }],
        })
    }

    fn subarray_3x5(
        tile_order: Option<TileOrder>,
    ) -> Subarray {
        let mut s =
            Subarray::new(schema_2d(tile_order), Layout::RowMajor).unwrap();
        // d1 in [2, 4] covers tiles 0 and 1; d2 in [3, 7] covers 0 and 1
        s.add_range(0, Range::from(&[2i32, 4])).unwrap();
        s.add_range(1, Range::from(&[3i32, 7])).unwrap();
        s
    }

    #[test]
    fn tile_coords_row_major() {
        let s = subarray_3x5(None);
        let coords = s.tile_coords().unwrap();
        assert_eq!(
            vec![vec![0, 0], vec![0, 1], vec![1, 0], vec![1, 1]],
            coords
        );
    }

    #[test]
    fn tile_coords_col_major() {
        let s = subarray_3x5(Some(TileOrder::ColumnMajor));
        let coords = s.tile_coords().unwrap();
        assert_eq!(
            vec![vec![0, 0], vec![1, 0], vec![0, 1], vec![1, 1]],
            coords
        );
    }

    #[test]
    fn tile_coords_containing() {
        let s = subarray_3x5(None);
        assert_eq!(
            Some(vec![0, 0]),
            s.tile_coords_containing(&[
                PhysicalValue::Int32(2),
                PhysicalValue::Int32(4)
            ])
        );
        assert_eq!(
            Some(vec![1, 1]),
            s.tile_coords_containing(&[
                PhysicalValue::Int32(4),
                PhysicalValue::Int32(7)
            ])
        );
        // outside every overlapping tile
        assert_eq!(
            None,
            s.tile_coords_containing(&[
                PhysicalValue::Int32(7),
                PhysicalValue::Int32(4)
            ])
        );
        // outside the domain entirely
        assert_eq!(
            None,
            s.tile_coords_containing(&[
                PhysicalValue::Int32(0),
                PhysicalValue::Int32(4)
            ])
        );
    }

    #[test]
    fn crop_and_cell_num() {
        let s = subarray_3x5(None);
        // tile (0, 0) covers [1,2] x [1,4]; selection is [2,4] x [3,7]
        let cropped = s.crop_to_tile(&[0, 0], Layout::RowMajor).unwrap();
        assert_eq!(Some(Range::from(&[2i32, 2])), cropped.get_range(0, 0));
        assert_eq!(Some(Range::from(&[3i32, 4])), cropped.get_range(1, 0));
        assert_eq!(Some(2), cropped.cell_num());
        assert_eq!(2, s.tile_cell_num(&[0, 0]));

        // tile (1, 1) covers [3,4] x [5,8]; intersection is [3,4] x [5,7]
        assert_eq!(6, s.tile_cell_num(&[1, 1]));

        // non-overlapping tile
        assert!(s.crop_to_tile(&[3, 1], Layout::RowMajor).is_none());
        assert_eq!(0, s.tile_cell_num(&[3, 1]));
    }
}
