//! Tile Terrain Engine Library
//!
//! Terrain-authoring core for a tile-based map editor: a sparse grid of
//! heightmap blocks, the geometry derived from them, ray picking, brush
//! autotiling and height sculpting.
//!
//! # Modules
//!
//! - [`world`] - Block geometry constants, grid bound, coordinate conversions
//! - [`camera`] - Camera matrices and cursor → ray unprojection
//! - [`picking`] - Bounding boxes, frustum, ray/box and ray/triangle tests
//! - [`terrain`] - Height fields, tile blocks, block geometry, the grid, tables, files
//! - [`autotile`] - Brush painting with blended edge and corner tiles
//! - [`sculpt`] - Raise, lower, flatten and smooth brushes
//! - [`undo`] - Terrain commands and the bounded undo stack
//! - [`editor`] - The façade editor tools call
//! - [`config`] - JSON editor configuration
//!
//! # Example
//!
//! ```ignore
//! use tile_terrain_engine::config::EditorConfig;
//! use tile_terrain_engine::editor::TerrainEditor;
//! use tile_terrain_engine::terrain::block_file::list_blocks;
//!
//! let config = EditorConfig::load("editor.json")?;
//! let mut editor = TerrainEditor::from_config(&config)?;
//! editor.load_map(map_dir, list_blocks(map_dir)?)?;
//!
//! if let Some(pick) = editor.pick_tile(&camera, &viewport, cursor) {
//!     editor.paint_brush(pick.block, pick.tile, brush);
//! }
//! ```

pub mod autotile;
pub mod camera;
pub mod config;
pub mod editor;
pub mod error;
pub mod picking;
pub mod sculpt;
pub mod terrain;
pub mod undo;
pub mod world;

// Re-export the types most callers need
pub use config::EditorConfig;
pub use editor::TerrainEditor;
pub use error::TerrainError;
pub use world::{BlockCoord, SampleCoord, TerrainConfig, TileCoord};
