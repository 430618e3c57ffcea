//! Terrain Grid Configuration
//!
//! Fixed block geometry plus the configurable grid bound and cell size,
//! and the conversions between world space and block/tile/sample indices.
//!
//! ## Axes
//! - world x = sample column (east)
//! - world y = sample row (south)
//! - world z = elevation
//!
//! ## Block layout
//! One block covers 64×64 cells = 65×65 height samples. Neighbouring blocks
//! share their border samples: column 64 of block (x, y) is column 0 of
//! block (x + 1, y).

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::TerrainError;

/// Tiles per block along one axis (16×16 tiles per block)
pub const TILES_PER_BLOCK: usize = 16;
/// Sub-quads per tile along one axis (4×4 quads per tile)
pub const QUADS_PER_TILE: usize = 4;
/// Vertices per tile along one axis (5×5 vertex stamp)
pub const VERTICES_PER_TILE_SIDE: usize = QUADS_PER_TILE + 1;
/// Vertices per tile
pub const VERTICES_PER_TILE: usize = VERTICES_PER_TILE_SIDE * VERTICES_PER_TILE_SIDE;
/// Tiles per block
pub const TILE_COUNT: usize = TILES_PER_BLOCK * TILES_PER_BLOCK;
/// Vertices per block (6400)
pub const VERTICES_PER_BLOCK: usize = TILE_COUNT * VERTICES_PER_TILE;
/// Cells per block along one axis
pub const CELLS_PER_BLOCK: usize = TILES_PER_BLOCK * QUADS_PER_TILE;
/// Height samples per block along one axis (65)
pub const SAMPLES_PER_BLOCK: usize = CELLS_PER_BLOCK + 1;
/// Default number of block slots per grid axis
pub const DEFAULT_GRID_BOUND: usize = 100;

/// Index of a block slot in the terrain grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockCoord {
    pub x: i32,
    pub y: i32,
}

impl BlockCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The block offset by (dx, dy) slots.
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x.saturating_add(dx), self.y.saturating_add(dy))
    }
}

/// Tile position inside a block (0..16 per axis).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: usize,
    pub y: usize,
}

impl TileCoord {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Row-major index into a block's tile arrays.
    pub fn index(self) -> usize {
        self.y * TILES_PER_BLOCK + self.x
    }
}

/// A height sample addressed across the whole map (not block-local).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SampleCoord {
    pub col: i32,
    pub row: i32,
}

impl SampleCoord {
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    pub fn offset(self, dcol: i32, drow: i32) -> Self {
        Self::new(self.col.saturating_add(dcol), self.row.saturating_add(drow))
    }
}

/// Grid bound and world scale of the terrain.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Block slots per axis (the grid is `grid_bound × grid_bound`)
    pub grid_bound: usize,
    /// World units per cell (distance between adjacent samples)
    pub cell_size: f32,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            grid_bound: DEFAULT_GRID_BOUND,
            cell_size: 1.0,
        }
    }
}

impl TerrainConfig {
    /// Reject a cell size or grid bound the grid cannot be built from.
    pub fn validate(&self) -> Result<(), TerrainError> {
        if !self.cell_size.is_finite() || self.cell_size <= 0.0 {
            return Err(TerrainError::InvalidConfig(format!(
                "cell_size must be a positive finite number, got {}",
                self.cell_size
            )));
        }
        let fits = self.grid_bound > 0
            && i32::try_from(self.grid_bound).is_ok()
            && self.grid_bound.checked_mul(self.grid_bound).is_some();
        if !fits {
            return Err(TerrainError::InvalidConfig(format!(
                "grid_bound {} does not give a usable block grid",
                self.grid_bound
            )));
        }
        Ok(())
    }

    /// World units covered by one block along an axis.
    pub fn block_span(&self) -> f32 {
        CELLS_PER_BLOCK as f32 * self.cell_size
    }

    /// World units covered by one tile along an axis.
    pub fn tile_span(&self) -> f32 {
        QUADS_PER_TILE as f32 * self.cell_size
    }

    /// True when the block coordinate addresses a slot inside the grid.
    pub fn contains_block(&self, coord: BlockCoord) -> bool {
        let bound = self.grid_bound as i32;
        coord.x >= 0 && coord.y >= 0 && coord.x < bound && coord.y < bound
    }

    /// World (x, y) of a block's first sample.
    pub fn block_origin(&self, coord: BlockCoord) -> Vec2 {
        Vec2::new(
            coord.x as f32 * self.block_span(),
            coord.y as f32 * self.block_span(),
        )
    }

    /// Block slot containing a world point (integer division by the block span).
    pub fn world_to_block(&self, x: f32, y: f32) -> BlockCoord {
        let span = self.block_span();
        BlockCoord::new((x / span).floor() as i32, (y / span).floor() as i32)
    }

    /// Block and tile containing a world point.
    pub fn world_to_tile(&self, x: f32, y: f32) -> (BlockCoord, TileCoord) {
        let block = self.world_to_block(x, y);
        let origin = self.block_origin(block);
        let tile_span = self.tile_span();
        let tx = (((x - origin.x) / tile_span).floor() as i32).clamp(0, TILES_PER_BLOCK as i32 - 1);
        let ty = (((y - origin.y) / tile_span).floor() as i32).clamp(0, TILES_PER_BLOCK as i32 - 1);
        (block, TileCoord::new(tx as usize, ty as usize))
    }

    /// Nearest map-wide sample to a world point.
    pub fn world_to_sample(&self, x: f32, y: f32) -> SampleCoord {
        SampleCoord::new(
            (x / self.cell_size).round() as i32,
            (y / self.cell_size).round() as i32,
        )
    }

    /// World (x, y) of a map-wide sample.
    pub fn sample_to_world(&self, sample: SampleCoord) -> Vec2 {
        Vec2::new(
            sample.col as f32 * self.cell_size,
            sample.row as f32 * self.cell_size,
        )
    }

    /// Owning block of a sample and its local (col, row) in `0..64`.
    ///
    /// A local index of 0 means the sample is also the last column/row of
    /// the block to the left/top.
    pub fn split_sample(&self, sample: SampleCoord) -> (BlockCoord, usize, usize) {
        let cells = CELLS_PER_BLOCK as i32;
        let block = BlockCoord::new(sample.col.div_euclid(cells), sample.row.div_euclid(cells));
        (
            block,
            sample.col.rem_euclid(cells) as usize,
            sample.row.rem_euclid(cells) as usize,
        )
    }

    /// Every (block, local col, local row) storing this sample: the owner and
    /// the left/top/top-left blocks that share it along their border.
    pub fn sample_slots(&self, sample: SampleCoord) -> Vec<(BlockCoord, usize, usize)> {
        let (owner, col, row) = self.split_sample(sample);
        let last = CELLS_PER_BLOCK;
        let mut slots = vec![(owner, col, row)];
        if col == 0 {
            slots.push((owner.offset(-1, 0), last, row));
        }
        if row == 0 {
            slots.push((owner.offset(0, -1), col, last));
        }
        if col == 0 && row == 0 {
            slots.push((owner.offset(-1, -1), last, last));
        }
        slots.retain(|(coord, _, _)| self.contains_block(*coord));
        slots
    }
}
