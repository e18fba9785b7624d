//! In-memory `ArrayMetadata` for driving the partitioner without an
//! array on disk.

// not every test binary uses every helper
#![allow(dead_code)]

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tiledb_common::array::dimension::DimensionConstraints;
use tiledb_common::array::{ArrayType, CellOrder, TileOrder};
use tiledb_common::datatype::Datatype;
use tiledb_common::range::{NonEmptyDomain, Range};
use tiledb_pod::array::attribute::AttributeData;
use tiledb_pod::array::dimension::DimensionData;
use tiledb_pod::array::domain::DomainData;
use tiledb_pod::array::schema::SchemaData;
use tiledb_subarray::Subarray;
use tiledb_subarray::metadata::{
    ArrayMetadata, CoverageKind, MetadataError, TileId, TileOverlap,
};

#[derive(Clone, Copy, Debug, Default)]
pub struct TileSizes {
    pub fixed: u64,
    pub var: u64,
    pub validity: u64,
}

#[derive(Clone, Debug)]
pub struct TestTile {
    pub mbr: NonEmptyDomain,
    pub cell_num: u64,
    pub sizes: HashMap<String, TileSizes>,
}

/// An array snapshot backed by explicit tile descriptions.
pub struct TestArray {
    schema: Arc<SchemaData>,
    tiles: Vec<TestTile>,
}

impl TestArray {
    pub fn new(schema: Arc<SchemaData>) -> Self {
        TestArray {
            schema,
            tiles: Vec::new(),
        }
    }

    pub fn schema_arc(&self) -> &Arc<SchemaData> {
        &self.schema
    }

    pub fn add_tile(
        &mut self,
        mbr: NonEmptyDomain,
        cell_num: u64,
        sizes: impl IntoIterator<Item = (&'static str, TileSizes)>,
    ) {
        self.tiles.push(TestTile {
            mbr,
            cell_num,
            sizes: sizes
                .into_iter()
                .map(|(name, s)| (name.to_owned(), s))
                .collect(),
        });
    }

    /// Populates tiles covering the whole dense domain, one per tile
    /// extent box, sizing every field at `datatype.size()` bytes per
    /// cell (with equal var and validity sizes for var-sized and
    /// nullable fields).
    pub fn fill_dense(&mut self) {
        let schema = Arc::clone(&self.schema);
        let per_dim_tiles = schema
            .domain
            .dimension
            .iter()
            .map(|d| {
                let domain = d.constraints.domain().expect("dense domain");
                d.constraints
                    .tile_num(&domain)
                    .expect("dense tile extents") as usize
            })
            .collect::<Vec<_>>();

        let mut coords = vec![0usize; per_dim_tiles.len()];
        loop {
            let mut mbr = Vec::new();
            let mut cell_num = 1u64;
            for (d, dim) in schema.domain.dimension.iter().enumerate() {
                let tile_range = dim
                    .constraints
                    .tile_range(coords[d] as u64)
                    .expect("tile in domain");
                cell_num *=
                    tile_range.num_cells().expect("integral domain") as u64;
                mbr.push(Range::Single(tile_range));
            }

            let sizes = schema
                .fields()
                .map(|f| {
                    let per_cell = f.datatype().size() as u64;
                    (
                        f.name().to_owned(),
                        TileSizes {
                            fixed: cell_num * per_cell,
                            var: if f.is_var_sized() {
                                cell_num * per_cell
                            } else {
                                0
                            },
                            validity: if f.is_nullable() {
                                cell_num
                            } else {
                                0
                            },
                        },
                    )
                })
                .collect::<HashMap<_, _>>();

            self.tiles.push(TestTile {
                mbr: NonEmptyDomain::from(mbr),
                cell_num,
                sizes,
            });

            // odometer over tile coordinates
            let mut d = 0;
            loop {
                coords[d] += 1;
                if coords[d] < per_dim_tiles[d] {
                    break;
                }
                coords[d] = 0;
                d += 1;
                if d == coords.len() {
                    return;
                }
            }
        }
    }
}

impl ArrayMetadata for TestArray {
    fn schema(&self) -> &SchemaData {
        &self.schema
    }

    fn rtree_overlap(
        &self,
        nd_range: &[Range],
    ) -> Result<TileOverlap, MetadataError> {
        let tiles = self
            .tiles
            .iter()
            .enumerate()
            .filter(|(_, t)| t.mbr.intersects(nd_range))
            .map(|(i, t)| {
                let kind = if t.mbr.contained_in(nd_range) {
                    CoverageKind::Full
                } else {
                    CoverageKind::Partial
                };
                (i as TileId, kind)
            })
            .collect();
        Ok(TileOverlap { tiles })
    }

    fn tile_cell_num(&self, tile: TileId) -> u64 {
        self.tiles[tile as usize].cell_num
    }

    fn tile_size(&self, tile: TileId, field: &str) -> u64 {
        self.tiles[tile as usize]
            .sizes
            .get(field)
            .map(|s| s.fixed)
            .unwrap_or(0)
    }

    fn tile_var_size(&self, tile: TileId, field: &str) -> u64 {
        self.tiles[tile as usize]
            .sizes
            .get(field)
            .map(|s| s.var)
            .unwrap_or(0)
    }

    fn tile_validity_size(&self, tile: TileId, field: &str) -> u64 {
        self.tiles[tile as usize]
            .sizes
            .get(field)
            .map(|s| s.validity)
            .unwrap_or(0)
    }

    fn mbr(&self, tile: TileId) -> &NonEmptyDomain {
        &self.tiles[tile as usize].mbr
    }
}

pub fn compute_pool() -> Arc<rayon::ThreadPool> {
    Arc::new(
        rayon::ThreadPoolBuilder::new()
            .num_threads(2)
            .build()
            .expect("Error creating thread pool"),
    )
}

pub fn int_dimension(
    name: &str,
    domain: [i32; 2],
    extent: Option<i32>,
) -> DimensionData {
    DimensionData {
        name: name.to_owned(),
        datatype: Datatype::Int32,
        constraints: DimensionConstraints::from((domain, extent)),
    }
}

pub fn int_attribute(name: &str) -> AttributeData {
    AttributeData {
        name: name.to_owned(),
        datatype: Datatype::Int32,
        nullability: None,
        cell_val_num: None,
    }
}

pub fn schema(
    array_type: ArrayType,
    cell_order: Option<CellOrder>,
    dimensions: Vec<DimensionData>,
    attributes: Vec<AttributeData>,
) -> Arc<SchemaData> {
    Arc::new(SchemaData {
        array_type,
        domain: DomainData {
            dimension: dimensions,
        },
        capacity: None,
        cell_order,
        tile_order: Some(TileOrder::RowMajor),
        allow_duplicates: None,
        attributes,
    })
}

/// Every integer cell a subarray selects, for coverage and overlap
/// checking. Panics over non-integral dimensions.
pub fn cells_of(s: &Subarray) -> BTreeSet<Vec<i128>> {
    let per_dim = (0..s.dim_num())
        .map(|d| {
            s.ranges_for_dim(d)
                .iter()
                .flat_map(|r| {
                    let Range::Single(svr) = r else {
                        panic!("integral dimension expected");
                    };
                    let (lo, hi) =
                        svr.integral_bounds().expect("integral range");
                    lo..=hi
                })
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();

    let mut out = BTreeSet::new();
    let mut idx = vec![0usize; per_dim.len()];
    loop {
        out.insert(
            idx.iter()
                .enumerate()
                .map(|(d, &i)| per_dim[d][i])
                .collect::<Vec<_>>(),
        );
        let mut d = 0;
        loop {
            idx[d] += 1;
            if idx[d] < per_dim[d].len() {
                break;
            }
            idx[d] = 0;
            d += 1;
            if d == idx.len() {
                return out;
            }
        }
    }
}
