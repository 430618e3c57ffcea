//! Terrain Grid
//!
//! Sparse `grid_bound × grid_bound` array of optional [`HeightmapBlock`]s.
//! Empty slots mean "no terrain here" and every operation skips them.
//!
//! Height writes go through [`TerrainGrid::set_height`], which mirrors
//! border samples into the neighbouring blocks that share them so seams
//! stay bit-identical.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use glam::Vec3;
use log::{debug, info};

use crate::error::TerrainError;
use crate::picking::{Frustum, PickRay, closest_in_plan, plan_distance_squared};
use crate::terrain::block_file::{height_path, read_height_file, read_tile_file, tile_path, write_height_file, write_tile_file};
use crate::terrain::height_field::HeightField;
use crate::terrain::heightmap_block::{HeightmapBlock, TilePick};
use crate::terrain::tables::TileDefinitionTable;
use crate::terrain::texture_cache::TextureCache;
use crate::terrain::tile_block::{TileBlock, TileCell};
use crate::world::{BlockCoord, SampleCoord, TerrainConfig, TileCoord};

/// All loaded terrain blocks plus the shared tile table and texture cache.
#[derive(Debug)]
pub struct TerrainGrid {
    config: TerrainConfig,
    tile_defs: Arc<TileDefinitionTable>,
    textures: TextureCache,
    slots: Vec<Option<HeightmapBlock>>,
}

impl TerrainGrid {
    pub fn new(config: TerrainConfig, tile_defs: Arc<TileDefinitionTable>, textures: TextureCache) -> Self {
        let bound = config.grid_bound;
        Self {
            config,
            tile_defs,
            textures,
            slots: (0..bound * bound).map(|_| None).collect(),
        }
    }

    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    pub fn tile_defs(&self) -> &Arc<TileDefinitionTable> {
        &self.tile_defs
    }

    pub fn textures(&self) -> &TextureCache {
        &self.textures
    }

    fn slot_index(&self, coord: BlockCoord) -> Option<usize> {
        self.config
            .contains_block(coord)
            .then(|| coord.y as usize * self.config.grid_bound + coord.x as usize)
    }

    // ========================================================================
    // SLOTS
    // ========================================================================

    /// Install a freshly built block, replacing any previous occupant.
    pub fn add(&mut self, coord: BlockCoord, heights: HeightField, tiles: TileBlock) -> Result<(), TerrainError> {
        let index = self
            .slot_index(coord)
            .ok_or(TerrainError::OutOfBounds { x: coord.x, y: coord.y })?;
        let block = HeightmapBlock::new(coord, &self.config, heights, tiles, Arc::clone(&self.tile_defs));
        block.load_textures(&mut self.textures);
        self.slots[index] = Some(block);
        debug!("Block ({}, {}) added", coord.x, coord.y);
        Ok(())
    }

    /// Empty a slot, returning its block.
    pub fn remove(&mut self, coord: BlockCoord) -> Option<HeightmapBlock> {
        let index = self.slot_index(coord)?;
        let removed = self.slots[index].take();
        if removed.is_some() {
            debug!("Block ({}, {}) removed", coord.x, coord.y);
        }
        removed
    }

    /// Release every slot and drop cached textures.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
        self.textures.clear();
        info!("Terrain grid cleared");
    }

    pub fn get(&self, coord: BlockCoord) -> Option<&HeightmapBlock> {
        self.slot_index(coord).and_then(|i| self.slots[i].as_ref())
    }

    pub fn get_mut(&mut self, coord: BlockCoord) -> Option<&mut HeightmapBlock> {
        self.slot_index(coord).and_then(|i| self.slots[i].as_mut())
    }

    pub fn contains(&self, coord: BlockCoord) -> bool {
        self.get(coord).is_some()
    }

    /// Loaded blocks in row-major slot order.
    pub fn blocks(&self) -> impl Iterator<Item = &HeightmapBlock> {
        self.slots.iter().flatten()
    }

    pub fn block_count(&self) -> usize {
        self.blocks().count()
    }

    // ========================================================================
    // PICKING
    // ========================================================================

    /// Terrain point under the ray, chosen among every block's hits by the
    /// smallest plan-view (x, y) distance to `camera_position`.
    pub fn pick_position(&self, camera_position: Vec3, frustum: &Frustum, ray: &PickRay) -> Option<Vec3> {
        let hits = self.blocks().flat_map(|block| block.pick_position(frustum, ray));
        closest_in_plan(hits, camera_position)
    }

    /// Tile under the ray. Each block contributes its first hit tile; the
    /// winner is the one whose box entry point is closest in plan view.
    pub fn pick_tile(&self, camera_position: Vec3, frustum: &Frustum, ray: &PickRay) -> Option<TilePick> {
        let mut best: Option<(f32, TilePick)> = None;
        for pick in self.blocks().filter_map(|block| block.pick_tile(frustum, ray)) {
            let distance = plan_distance_squared(pick.entry, camera_position);
            if best.is_none_or(|(d, _)| distance < d) {
                best = Some((distance, pick));
            }
        }
        best.map(|(_, pick)| pick)
    }

    // ========================================================================
    // HEIGHTS
    // ========================================================================

    /// Height of a map-wide sample, read from the first loaded block holding it.
    pub fn get_height(&self, sample: SampleCoord) -> Option<f32> {
        self.config
            .sample_slots(sample)
            .into_iter()
            .find_map(|(coord, col, row)| self.get(coord).map(|block| block.heights().get(col, row)))
    }

    /// Write a sample into every loaded block sharing it and record those
    /// blocks in `dirty`. Returns false when no loaded block holds the sample.
    ///
    /// Geometry is not rebuilt here; call [`Self::rebuild_blocks`] once the
    /// whole edit is done.
    pub fn set_height(&mut self, sample: SampleCoord, height: f32, dirty: &mut BTreeSet<BlockCoord>) -> bool {
        let mut written = false;
        for (coord, col, row) in self.config.sample_slots(sample) {
            if let Some(block) = self.get_mut(coord) {
                block.set_height(col, row, height);
                dirty.insert(coord);
                written = true;
            }
        }
        written
    }

    /// Rebuild geometry and boxes of each listed block once.
    pub fn rebuild_blocks<'a>(&mut self, coords: impl IntoIterator<Item = &'a BlockCoord>) {
        for coord in coords {
            if let Some(block) = self.get_mut(*coord) {
                block.rebuild_geometry();
            }
        }
    }

    /// Swap in a whole height field (undo/redo).
    pub fn replace_heights(&mut self, coord: BlockCoord, heights: HeightField) -> bool {
        match self.get_mut(coord) {
            Some(block) => {
                block.replace_heights(heights);
                true
            }
            None => false,
        }
    }

    // ========================================================================
    // TILES
    // ========================================================================

    pub fn tile(&self, coord: BlockCoord, tile: TileCoord) -> Option<TileCell> {
        self.get(coord).map(|block| block.tile(tile))
    }

    /// Assign a tile through [`HeightmapBlock::change_tile`]. False for an empty slot.
    pub fn change_tile(&mut self, coord: BlockCoord, tile: TileCoord, cell: TileCell) -> bool {
        let Some(index) = self.slot_index(coord) else {
            return false;
        };
        match self.slots[index].as_mut() {
            Some(block) => {
                block.change_tile(tile, cell, &mut self.textures);
                true
            }
            None => false,
        }
    }

    // ========================================================================
    // FILES
    // ========================================================================

    /// Load `<dir>/<bx>_<by>.height` and `.tile` into a slot.
    ///
    /// Returns `Ok(false)` and leaves the slot empty when either file is missing.
    pub fn load_block(&mut self, dir: &Path, coord: BlockCoord) -> Result<bool, TerrainError> {
        if !self.config.contains_block(coord) {
            return Err(TerrainError::OutOfBounds { x: coord.x, y: coord.y });
        }
        let heights_file = height_path(dir, coord);
        let tiles_file = tile_path(dir, coord);
        if !heights_file.exists() || !tiles_file.exists() {
            debug!("Block ({}, {}) has no files in {}", coord.x, coord.y, dir.display());
            return Ok(false);
        }

        let heights = read_height_file(&heights_file)?;
        let tiles = read_tile_file(&tiles_file)?;
        self.add(coord, heights, tiles)?;
        Ok(true)
    }

    /// Write a loaded block's height and tile files back wholesale.
    pub fn save_block(&self, dir: &Path, coord: BlockCoord) -> Result<(), TerrainError> {
        let block = self
            .get(coord)
            .ok_or(TerrainError::OutOfBounds { x: coord.x, y: coord.y })?;
        write_height_file(&height_path(dir, coord), block.heights())?;
        write_tile_file(&tile_path(dir, coord), block.tiles())?;
        debug!("Block ({}, {}) saved to {}", coord.x, coord.y, dir.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(bound: usize) -> TerrainGrid {
        let config = TerrainConfig {
            grid_bound: bound,
            cell_size: 1.0,
        };
        TerrainGrid::new(
            config,
            Arc::new(TileDefinitionTable::default()),
            TextureCache::new(std::env::temp_dir().join("tile_terrain_grid_tests")),
        )
    }

    #[test]
    fn test_add_and_clear() {
        let mut grid = grid(4);
        grid.add(BlockCoord::new(1, 2), HeightField::flat(0.0), TileBlock::default()).unwrap();
        assert!(grid.contains(BlockCoord::new(1, 2)));
        assert_eq!(grid.block_count(), 1);

        assert!(matches!(
            grid.add(BlockCoord::new(4, 0), HeightField::flat(0.0), TileBlock::default()),
            Err(TerrainError::OutOfBounds { x: 4, y: 0 })
        ));

        grid.clear();
        assert_eq!(grid.block_count(), 0);
        assert!(grid.get(BlockCoord::new(1, 2)).is_none());
    }

    #[test]
    fn test_set_height_mirrors_border_samples() {
        let mut grid = grid(2);
        for y in 0..2 {
            for x in 0..2 {
                grid.add(BlockCoord::new(x, y), HeightField::flat(0.0), TileBlock::default()).unwrap();
            }
        }

        let mut dirty = BTreeSet::new();
        assert!(grid.set_height(SampleCoord::new(64, 64), 5.0, &mut dirty));
        assert_eq!(dirty.len(), 4);

        assert_eq!(grid.get(BlockCoord::new(0, 0)).unwrap().heights().get(64, 64), 5.0);
        assert_eq!(grid.get(BlockCoord::new(1, 0)).unwrap().heights().get(0, 64), 5.0);
        assert_eq!(grid.get(BlockCoord::new(0, 1)).unwrap().heights().get(64, 0), 5.0);
        assert_eq!(grid.get(BlockCoord::new(1, 1)).unwrap().heights().get(0, 0), 5.0);
        assert_eq!(grid.get_height(SampleCoord::new(64, 64)), Some(5.0));
    }

    #[test]
    fn test_set_height_skips_empty_slots() {
        let mut grid = grid(2);
        grid.add(BlockCoord::new(0, 0), HeightField::flat(0.0), TileBlock::default()).unwrap();

        let mut dirty = BTreeSet::new();
        assert!(grid.set_height(SampleCoord::new(64, 10), 2.0, &mut dirty));
        assert_eq!(dirty.into_iter().collect::<Vec<_>>(), vec![BlockCoord::new(0, 0)]);

        let mut dirty = BTreeSet::new();
        assert!(!grid.set_height(SampleCoord::new(100, 10), 2.0, &mut dirty));
        assert!(dirty.is_empty());
        assert_eq!(grid.get_height(SampleCoord::new(100, 10)), None);
    }

    #[test]
    fn test_pick_prefers_plan_closest_hit() {
        let mut grid = grid(2);
        grid.add(BlockCoord::new(0, 0), HeightField::flat(0.0), TileBlock::default()).unwrap();
        grid.add(BlockCoord::new(1, 0), HeightField::flat(0.0), TileBlock::default()).unwrap();

        let ray = PickRay::from_segment(Vec3::new(70.0, 5.0, 50.0), Vec3::new(70.0, 5.0, -50.0)).unwrap();
        let hit = grid.pick_position(Vec3::new(70.0, 5.0, 50.0), &Frustum::unbounded(), &ray).unwrap();
        assert!((hit - Vec3::new(70.0, 5.0, 0.0)).length() < 1e-4);

        let pick = grid.pick_tile(Vec3::new(70.0, 5.0, 50.0), &Frustum::unbounded(), &ray).unwrap();
        assert_eq!(pick.block, BlockCoord::new(1, 0));
        assert_eq!(pick.tile, TileCoord::new(1, 1));
    }

    #[test]
    fn test_pick_empty_grid() {
        let grid = grid(2);
        let ray = PickRay::from_segment(Vec3::new(5.0, 5.0, 50.0), Vec3::new(5.0, 5.0, -50.0)).unwrap();
        assert!(grid.pick_position(Vec3::ZERO, &Frustum::unbounded(), &ray).is_none());
        assert!(grid.pick_tile(Vec3::ZERO, &Frustum::unbounded(), &ray).is_none());
    }

    #[test]
    fn test_save_and_load_block() {
        let dir = std::env::temp_dir().join("tile_terrain_grid_tests").join("save_load");
        let _ = std::fs::remove_dir_all(&dir);

        let mut grid = grid(2);
        let mut heights = HeightField::flat(1.0);
        heights.set(10, 20, 4.0);
        let tiles = TileBlock::filled(TileCell::new(1, 0, 15, 3));
        grid.add(BlockCoord::new(1, 1), heights.clone(), tiles.clone()).unwrap();
        grid.save_block(&dir, BlockCoord::new(1, 1)).unwrap();

        let mut fresh = self::grid(2);
        assert!(fresh.load_block(&dir, BlockCoord::new(1, 1)).unwrap());
        assert!(!fresh.load_block(&dir, BlockCoord::new(0, 0)).unwrap());
        assert!(fresh.get(BlockCoord::new(0, 0)).is_none());

        let loaded = fresh.get(BlockCoord::new(1, 1)).unwrap();
        assert_eq!(loaded.heights(), &heights);
        assert_eq!(loaded.tiles(), &tiles);
    }
}
