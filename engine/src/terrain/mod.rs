//! Terrain Module
//!
//! Block data (height samples, tile assignments), the geometry derived from
//! it, the sparse grid of loaded blocks, the global lookup tables, and the
//! block file format.

pub mod block_file;
pub mod height_field;
pub mod heightmap_block;
pub mod tables;
pub mod terrain_grid;
pub mod texture_cache;
pub mod tile_block;

pub use height_field::{HeightField, SAMPLE_COUNT};
pub use heightmap_block::{HeightmapBlock, TerrainVertex, TileBounds, TilePick};
pub use tables::{
    BrushSet, BrushTable, FULL_TILE_INDEX, NO_CHAIN, NO_TILESET, TileDefinition,
    TileDefinitionTable, TileRotation,
};
pub use terrain_grid::TerrainGrid;
pub use texture_cache::{CachedTexture, TextureCache};
pub use tile_block::{TileBlock, TileCell};
