//! Subarray construction, validation, and carving through the public
//! API.

mod support;

use tiledb_common::array::{ArrayType, Layout};
use tiledb_common::datatype::physical::PhysicalValue;
use tiledb_common::range::Range;
use tiledb_subarray::Subarray;
use tiledb_subarray::error::{Error, InvalidRangeError};

use support::{int_attribute, int_dimension, schema};

/// 2D dense domain `[1, 20] x [1, 20]` with 2-wide tiles.
fn subarray(layout: Layout) -> Subarray {
    let schema = schema(
        ArrayType::Dense,
        None,
        vec![
            int_dimension("d1", [1, 20], Some(2)),
            int_dimension("d2", [1, 20], Some(2)),
        ],
        vec![int_attribute("a")],
    );
    Subarray::new(schema, layout).unwrap()
}

/// Two ranges on `d1` and three on `d2`, none adjacent.
fn subarray_2x3(layout: Layout) -> Subarray {
    let mut s = subarray(layout);
    for lo in [1i32, 7] {
        s.add_range(0, Range::from(&[lo, lo + 1])).unwrap();
    }
    for lo in [2i32, 8, 14] {
        s.add_range(1, Range::from(&[lo, lo + 1])).unwrap();
    }
    s
}

#[test]
fn whole_domain_by_default() {
    let s = subarray(Layout::RowMajor);
    assert_eq!(0, s.range_num_per_dim(0));
    assert_eq!(0, s.range_num_per_dim(1));
    // flattened iteration still sees one ND range over the domain
    assert_eq!(1, s.range_num());
    assert_eq!(Some(Range::from(&[1i32, 20])), s.get_range(0, 0));
    assert_eq!(Some(Range::from(&[1i32, 20])), s.get_range(1, 0));
    assert_eq!(Some(400), s.cell_num());
    assert!(!s.is_unary());
}

#[test]
fn add_range_validates() {
    let mut s = subarray(Layout::RowMajor);
    assert!(matches!(
        s.add_range(5, Range::from(&[1i32, 2])),
        Err(Error::InvalidRange(InvalidRangeError::UnknownDimension(
            5, 2
        )))
    ));
    assert!(matches!(
        s.add_range(0, Range::from(&[1u32, 2])),
        Err(Error::InvalidRange(
            InvalidRangeError::DimensionCompatibility { .. }
        ))
    ));
    assert!(matches!(
        s.add_range(0, Range::from(&[9i32, 3])),
        Err(Error::InvalidRange(InvalidRangeError::ReversedBounds))
    ));
    assert!(matches!(
        s.add_range(0, Range::from(&[30i32, 40])),
        Err(Error::InvalidRange(InvalidRangeError::OutOfDomain(_)))
    ));
    // partially out of the domain: clamped, not rejected
    s.add_range(0, Range::from(&[18i32, 25])).unwrap();
    assert_eq!(Some(Range::from(&[18i32, 20])), s.get_range(0, 0));
}

#[test]
fn adjacent_ranges_coalesce() {
    let mut s = subarray(Layout::RowMajor);
    s.add_range(0, Range::from(&[1i32, 4])).unwrap();
    s.add_range(0, Range::from(&[5i32, 9])).unwrap();
    assert_eq!(1, s.range_num_per_dim(0));
    assert_eq!(Some(Range::from(&[1i32, 9])), s.get_range(0, 0));

    // a gap suppresses the merge
    s.add_range(0, Range::from(&[12i32, 14])).unwrap();
    assert_eq!(2, s.range_num_per_dim(0));

    // the caller may suppress coalescing entirely
    let mut s = subarray(Layout::RowMajor);
    s.add_range_with_coalesce(0, Range::from(&[1i32, 4]), false)
        .unwrap();
    s.add_range_with_coalesce(0, Range::from(&[5i32, 9]), false)
        .unwrap();
    assert_eq!(2, s.range_num_per_dim(0));
}

#[test]
fn global_order_admits_one_range_per_dimension() {
    let mut s = subarray(Layout::GlobalOrder);
    s.add_range(0, Range::from(&[1i32, 4])).unwrap();
    assert!(matches!(
        s.add_range(0, Range::from(&[9i32, 12])),
        Err(Error::InvalidRange(
            InvalidRangeError::MultiRangeGlobalOrder
        ))
    ));
    // the other dimension still accepts its first range
    s.add_range(1, Range::from(&[1i32, 4])).unwrap();
    assert_eq!(1, s.range_num());
}

#[test]
fn flat_indices_follow_the_layout() {
    let row = subarray_2x3(Layout::RowMajor);
    assert_eq!(6, row.range_num());
    assert_eq!(&[3, 1], row.range_offsets());

    let col = subarray_2x3(Layout::ColumnMajor);
    assert_eq!(&[1, 2], col.range_offsets());

    // unordered ranges are labelled as if row-major
    let unordered = subarray_2x3(Layout::Unordered);
    assert_eq!(&[3, 1], unordered.range_offsets());

    for s in [row, col, unordered] {
        for flat in 0..s.range_num() {
            let coords = s.range_coords(flat).unwrap();
            assert_eq!(flat, s.range_idx(&coords).unwrap());
        }
    }
}

#[test]
fn expanded_coordinates_calibrate_intervals() {
    let s = subarray_2x3(Layout::RowMajor);

    // within one row of the fastest dimension: unchanged
    assert_eq!(
        (vec![0, 0], vec![0, 2]),
        s.get_expanded_coordinates(0, 2).unwrap()
    );
    // crossing a row boundary widens the faster dimension
    assert_eq!(
        (vec![0, 0], vec![1, 2]),
        s.get_expanded_coordinates(2, 3).unwrap()
    );

    // idempotent
    let (lo, hi) = s.get_expanded_coordinates(2, 3).unwrap();
    let lo_flat = s.range_idx(&lo).unwrap();
    let hi_flat = s.range_idx(&hi).unwrap();
    assert_eq!(
        (lo, hi),
        s.get_expanded_coordinates(lo_flat, hi_flat).unwrap()
    );
}

#[test]
fn carve_produces_cross_products() {
    let s = subarray_2x3(Layout::RowMajor);

    // one full row of the fastest dimension
    let p = s.get_subarray(3, 5).unwrap();
    assert_eq!(3, p.range_num());
    assert_eq!(Some(Range::from(&[7i32, 8])), p.get_range(0, 0));
    assert_eq!(Some(Range::from(&[2i32, 3])), p.get_range(1, 0));
    assert_eq!(Some(Range::from(&[14i32, 15])), p.get_range(1, 2));

    // a single ND range
    let p = s.get_subarray(4, 4).unwrap();
    assert_eq!(1, p.range_num());
    assert_eq!(Some(Range::from(&[7i32, 8])), p.get_range(0, 0));
    assert_eq!(Some(Range::from(&[8i32, 9])), p.get_range(1, 0));

    // an interval which is not an ND box is rejected
    assert!(s.get_subarray(2, 3).is_err());
}

#[test]
fn splits_preserve_the_other_dimensions() {
    let s = subarray_2x3(Layout::RowMajor);
    let (left, right) = s.split_multi(1, 0).unwrap();
    assert_eq!(2, left.range_num());
    assert_eq!(4, right.range_num());
    assert_eq!(2, left.range_num_per_dim(0));
    assert_eq!(Some(Range::from(&[2i32, 3])), left.get_range(1, 0));
    assert_eq!(Some(Range::from(&[8i32, 9])), right.get_range(1, 0));

    // value splitting of a carved single range
    let single = s.get_subarray(4, 4).unwrap();
    let (left, right) = single
        .split_single(
            1,
            &tiledb_subarray::split::SplittingValue::Fixed(
                PhysicalValue::Int32(8),
            ),
        )
        .unwrap();
    assert_eq!(Some(Range::from(&[8i32, 8])), left.get_range(1, 0));
    assert_eq!(Some(Range::from(&[9i32, 9])), right.get_range(1, 0));
    // the split dimension narrows; the other dimension is untouched
    assert_eq!(left.get_range(0, 0), right.get_range(0, 0));
    assert!(left.get_range(1, 0).unwrap().is_unary());
}

#[test]
fn attribute_ranges_roundtrip_through_carves() {
    let mut s = subarray_2x3(Layout::RowMajor);
    assert!(s.attribute_ranges("a").is_none());

    let ranges = vec![Range::from(&[5i32, 6]), Range::from(&[9i32, 9])];
    s.set_attribute_ranges("a", ranges.clone());
    assert_eq!(Some(ranges.as_slice()), s.attribute_ranges("a"));

    let p = s.get_subarray(0, 2).unwrap();
    assert_eq!(Some(ranges.as_slice()), p.attribute_ranges("a"));
}

#[test]
fn dense_tile_helpers() {
    let mut s = subarray(Layout::RowMajor);
    // d1 in [2, 5] covers tiles 0..=2; d2 in [3, 4] covers tile 1
    s.add_range(0, Range::from(&[2i32, 5])).unwrap();
    s.add_range(1, Range::from(&[3i32, 4])).unwrap();

    let coords = s.tile_coords().unwrap();
    assert_eq!(vec![vec![0, 1], vec![1, 1], vec![2, 1]], coords);

    assert_eq!(
        Some(vec![1, 1]),
        s.tile_coords_containing(&[
            PhysicalValue::Int32(3),
            PhysicalValue::Int32(4),
        ])
    );
    assert_eq!(
        None,
        s.tile_coords_containing(&[
            PhysicalValue::Int32(3),
            PhysicalValue::Int32(7),
        ])
    );

    // tile (0, 1) covers [1,2] x [3,4]; the selection clips it to one
    // column of two cells
    let cropped = s.crop_to_tile(&[0, 1], Layout::RowMajor).unwrap();
    assert_eq!(Some(Range::from(&[2i32, 2])), cropped.get_range(0, 0));
    assert_eq!(Some(Range::from(&[3i32, 4])), cropped.get_range(1, 0));
    assert_eq!(Some(2), cropped.cell_num());
    assert_eq!(2, s.tile_cell_num(&[0, 1]));

    // a tile outside the selection
    assert!(s.crop_to_tile(&[9, 9], Layout::RowMajor).is_none());
    assert_eq!(0, s.tile_cell_num(&[9, 9]));
}
