//! World Module
//!
//! World-space configuration for the terrain grid: block geometry constants,
//! grid bound, and coordinate conversions.

pub mod grid;

pub use grid::{
    BlockCoord, CELLS_PER_BLOCK, DEFAULT_GRID_BOUND, QUADS_PER_TILE, SAMPLES_PER_BLOCK,
    SampleCoord, TILE_COUNT, TILES_PER_BLOCK, TerrainConfig, TileCoord, VERTICES_PER_BLOCK,
    VERTICES_PER_TILE, VERTICES_PER_TILE_SIDE,
};
