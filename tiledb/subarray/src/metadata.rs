use thiserror::Error;

use tiledb_common::array::{ArrayType, CellOrder, TileOrder};
use tiledb_common::range::{NonEmptyDomain, Range};
use tiledb_pod::array::schema::SchemaData;

/// Identifies one tile of the array snapshot an [ArrayMetadata]
/// instance describes.
pub type TileId = u64;

/// How much of a tile lies inside a queried ND range.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CoverageKind {
    /// Every cell of the tile is selected.
    Full,
    /// Some cells of the tile are selected; the fraction is computed
    /// from the tile's minimum bounding rectangle.
    Partial,
}

/// The tiles which intersect one ND range.
#[derive(Clone, Debug, Default)]
pub struct TileOverlap {
    pub tiles: Vec<(TileId, CoverageKind)>,
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum MetadataError {
    #[error("Error reading fragment metadata: {0}")]
    Io(String),
    #[error("No field '{0}' in fragment metadata")]
    UnknownField(String),
    #[error("No tile {0} in fragment metadata")]
    UnknownTile(TileId),
}

/// Read-only facade over the fragment metadata of one array snapshot.
///
/// This is the single point through which query planning depends on
/// on-disk state. Implementations must be cheap to query repeatedly;
/// per-tile lookups run once per `(ND range, tile)` pair during size
/// estimation.
pub trait ArrayMetadata: Send + Sync {
    /// The schema of the array snapshot.
    fn schema(&self) -> &SchemaData;

    /// Returns the tiles whose minimum bounding rectangles intersect
    /// `nd_range`, each labelled with its coverage kind.
    fn rtree_overlap(
        &self,
        nd_range: &[Range],
    ) -> Result<TileOverlap, MetadataError>;

    /// The number of cells stored in a tile.
    fn tile_cell_num(&self, tile: TileId) -> u64;

    /// The size in bytes of a tile of fixed-sized data for `field`.
    /// For var-sized fields this is the size of the offsets.
    fn tile_size(&self, tile: TileId, field: &str) -> u64;

    /// The size in bytes of a tile of var-sized data for `field`.
    fn tile_var_size(&self, tile: TileId, field: &str) -> u64;

    /// The size in bytes of a tile of validity data for `field`.
    fn tile_validity_size(&self, tile: TileId, field: &str) -> u64;

    /// The minimum bounding rectangle of a tile.
    fn mbr(&self, tile: TileId) -> &NonEmptyDomain;

    fn array_type(&self) -> ArrayType {
        self.schema().array_type
    }

    fn cell_order(&self) -> CellOrder {
        self.schema().cell_order()
    }

    fn tile_order(&self) -> TileOrder {
        self.schema().tile_order()
    }

    fn allows_dups(&self) -> bool {
        self.schema().allows_duplicates()
    }

    fn capacity(&self) -> u64 {
        self.schema().capacity()
    }
}
