//! Terrain Editor
//!
//! The entry point editor tools call each frame: owns the grid, the brush
//! resolver, the sculptor and the undo history, and turns cursor input into
//! picks, sculpt ticks and brush paints.
//!
//! # Usage
//!
//! ```ignore
//! let mut editor = TerrainEditor::from_config(&config)?;
//! editor.load_map(map_dir, list_blocks(map_dir)?)?;
//!
//! // mouse down
//! editor.begin_stroke();
//! if let Some(point) = editor.pick_position(&camera, &viewport, cursor) {
//!     editor.sculpt_tick(point, true);
//! }
//! // mouse up
//! editor.end_stroke();
//! ```

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use glam::{Vec2, Vec3};
use log::info;

use crate::autotile::AutotileResolver;
use crate::camera::{Camera, Viewport, cursor_ray};
use crate::config::EditorConfig;
use crate::error::TerrainError;
use crate::sculpt::HeightSculptor;
use crate::terrain::{BrushTable, TerrainGrid, TextureCache, TileDefinitionTable, TilePick};
use crate::undo::{TerrainCommand, UndoStack};
use crate::world::{BlockCoord, TileCoord};

/// Terrain grid plus the tools that edit it.
#[derive(Debug)]
pub struct TerrainEditor {
    grid: TerrainGrid,
    resolver: AutotileResolver,
    sculptor: HeightSculptor,
    history: UndoStack,
}

impl TerrainEditor {
    pub fn new(config: &EditorConfig, tile_defs: Arc<TileDefinitionTable>, brushes: Arc<BrushTable>) -> Self {
        Self {
            grid: TerrainGrid::new(config.terrain, tile_defs, TextureCache::new(&config.texture_root)),
            resolver: AutotileResolver::new(brushes),
            sculptor: HeightSculptor::new(config.sculpt),
            history: UndoStack::with_limit(config.undo_limit),
        }
    }

    /// Load both global tables named by the config and build an editor.
    pub fn from_config(config: &EditorConfig) -> Result<Self, TerrainError> {
        config.validate()?;
        let tile_defs = TileDefinitionTable::load(&config.tile_table_path)?;
        let brushes = BrushTable::load(&config.brush_table_path)?;
        info!(
            "Loaded {} tile definitions and {} brush tilesets",
            tile_defs.tiles.len(),
            brushes.sets.len()
        );
        Ok(Self::new(config, Arc::new(tile_defs), Arc::new(brushes)))
    }

    pub fn grid(&self) -> &TerrainGrid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut TerrainGrid {
        &mut self.grid
    }

    pub fn sculptor(&self) -> &HeightSculptor {
        &self.sculptor
    }

    pub fn sculptor_mut(&mut self) -> &mut HeightSculptor {
        &mut self.sculptor
    }

    pub fn resolver(&self) -> &AutotileResolver {
        &self.resolver
    }

    pub fn history(&self) -> &UndoStack {
        &self.history
    }

    // ========================================================================
    // MAP
    // ========================================================================

    /// Replace the current map with the listed blocks from `dir`.
    ///
    /// Blocks without files stay empty. Returns how many were loaded.
    pub fn load_map(&mut self, dir: &Path, coords: impl IntoIterator<Item = BlockCoord>) -> Result<usize, TerrainError> {
        self.clear();
        let mut loaded = 0;
        for coord in coords {
            if self.grid.load_block(dir, coord)? {
                loaded += 1;
            }
        }
        info!("Loaded {loaded} terrain blocks from {}", dir.display());
        Ok(loaded)
    }

    /// Write every loaded block to `dir`.
    pub fn save_map(&self, dir: &Path) -> Result<usize, TerrainError> {
        let coords: Vec<BlockCoord> = self.grid.blocks().map(|block| block.coord()).collect();
        for &coord in &coords {
            self.grid.save_block(dir, coord)?;
        }
        info!("Saved {} terrain blocks to {}", coords.len(), dir.display());
        Ok(coords.len())
    }

    /// Unload every block and forget history and any open stroke.
    pub fn clear(&mut self) {
        self.grid.clear();
        self.history.clear();
        self.sculptor.cancel_stroke();
    }

    // ========================================================================
    // PICKING
    // ========================================================================

    /// Terrain point under the cursor.
    pub fn pick_position(&self, camera: &Camera, viewport: &Viewport, cursor: Vec2) -> Option<Vec3> {
        let ray = cursor_ray(camera, viewport, cursor)?;
        self.grid.pick_position(camera.position, &camera.frustum(), &ray)
    }

    /// Tile under the cursor.
    pub fn pick_tile(&self, camera: &Camera, viewport: &Viewport, cursor: Vec2) -> Option<TilePick> {
        let ray = cursor_ray(camera, viewport, cursor)?;
        self.grid.pick_tile(camera.position, &camera.frustum(), &ray)
    }

    // ========================================================================
    // EDITING
    // ========================================================================

    pub fn begin_stroke(&mut self) {
        self.sculptor.begin_stroke();
    }

    /// One sculpt tick at a picked point; returns the rebuilt blocks.
    pub fn sculpt_tick(&mut self, point: Vec3, first_tick: bool) -> BTreeSet<BlockCoord> {
        self.sculptor.apply_tick(&mut self.grid, point, first_tick)
    }

    /// Close the stroke and record it. False when it changed nothing.
    pub fn end_stroke(&mut self) -> bool {
        match self.sculptor.end_stroke(&self.grid) {
            Some(command) => {
                self.history.push(command);
                true
            }
            None => false,
        }
    }

    /// Paint a brush and record the changed cells as one command.
    /// Returns the number of cells changed.
    pub fn paint_brush(&mut self, block: BlockCoord, tile: TileCoord, brush: u8) -> usize {
        let changes = self.resolver.paint(&mut self.grid, block, tile, brush);
        let count = changes.len();
        if count > 0 {
            self.history.push(TerrainCommand::TilePaint { changes });
        }
        count
    }

    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(command) => {
                command.undo(&mut self.grid);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(command) => {
                command.redo(&mut self.grid);
                true
            }
            None => false,
        }
    }
}
