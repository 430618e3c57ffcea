//! Heightmap Block
//!
//! One terrain block: its height field and tile assignments, the vertex
//! array derived from them (5×5 vertices per tile, 6400 per block), and a
//! two-level box hierarchy (per tile, per sub-quad) for picking.
//!
//! ## Vertex order
//! `vertex[(tile.y * 16 + tile.x) * 25 + j * 5 + i]` is sub-vertex (i, j) of
//! the tile, sampling height column `tile.x * 4 + i`, row `tile.y * 4 + j`.
//! Neighbouring tiles repeat their shared border samples.

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use log::warn;

use crate::picking::{Aabb, Frustum, PickRay, ray_triangle_intersect};
use crate::terrain::height_field::HeightField;
use crate::terrain::tables::{TileDefinition, TileDefinitionTable};
use crate::terrain::texture_cache::TextureCache;
use crate::terrain::tile_block::{TileBlock, TileCell};
use crate::world::{
    BlockCoord, CELLS_PER_BLOCK, QUADS_PER_TILE, TILE_COUNT, TILES_PER_BLOCK, TerrainConfig,
    TileCoord, VERTICES_PER_BLOCK, VERTICES_PER_TILE, VERTICES_PER_TILE_SIDE,
};

/// Quads per tile (4×4)
pub const QUADS_PER_TILE_TOTAL: usize = QUADS_PER_TILE * QUADS_PER_TILE;

/// GPU-ready terrain vertex.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct TerrainVertex {
    /// World position (z = elevation)
    pub position: [f32; 3],
    /// Tile-space UV of the bottom texture layer
    pub bottom_uv: [f32; 2],
    /// Tile-space UV of the top layer after the tile's rotation
    pub top_uv: [f32; 2],
    /// Block-space UV of the shadow/light map
    pub shadow_uv: [f32; 2],
}

static_assertions::assert_eq_size!(TerrainVertex, [u8; 36]);

/// Bounding boxes of one tile: the whole tile and its 4×4 sub-quads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileBounds {
    pub aabb: Aabb,
    /// Row-major sub-quad boxes (`qj * 4 + qi`)
    pub quads: [Aabb; QUADS_PER_TILE_TOTAL],
}

impl Default for TileBounds {
    fn default() -> Self {
        Self {
            aabb: Aabb::EMPTY,
            quads: [Aabb::EMPTY; QUADS_PER_TILE_TOTAL],
        }
    }
}

/// A tile hit by the picking ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TilePick {
    pub block: BlockCoord,
    pub tile: TileCoord,
    /// Where the ray enters the tile's bounding box
    pub entry: Vec3,
}

/// Terrain block geometry and picking.
#[derive(Debug, Clone)]
pub struct HeightmapBlock {
    coord: BlockCoord,
    origin: Vec2,
    cell_size: f32,
    heights: HeightField,
    tiles: TileBlock,
    tile_defs: Arc<TileDefinitionTable>,
    /// Texture indices (bottom, top) per tile
    tile_textures: Vec<[u16; 2]>,
    vertices: Vec<TerrainVertex>,
    tile_bounds: Vec<TileBounds>,
    bounds: Aabb,
}

impl HeightmapBlock {
    /// Build a block and derive its geometry.
    pub fn new(
        coord: BlockCoord,
        config: &TerrainConfig,
        heights: HeightField,
        tiles: TileBlock,
        tile_defs: Arc<TileDefinitionTable>,
    ) -> Self {
        let mut block = Self {
            coord,
            origin: config.block_origin(coord),
            cell_size: config.cell_size,
            heights,
            tiles,
            tile_defs,
            tile_textures: vec![[0; 2]; TILE_COUNT],
            vertices: vec![TerrainVertex::default(); VERTICES_PER_BLOCK],
            tile_bounds: vec![TileBounds::default(); TILE_COUNT],
            bounds: Aabb::EMPTY,
        };

        let mut unknown = 0;
        for index in 0..TILE_COUNT {
            let tile_id = block.tiles.cells()[index].tile_id;
            if block.tile_defs.get(tile_id).is_none() {
                unknown += 1;
            }
            let def = block.definition(tile_id);
            block.tile_textures[index] = [def.texture_index1, def.texture_index2];
        }
        if unknown > 0 {
            warn!(
                "Block ({}, {}): {unknown} tiles reference ids outside the tile table",
                coord.x, coord.y
            );
        }

        block.build_vertices();
        block.build_bounding_boxes();
        block
    }

    pub fn coord(&self) -> BlockCoord {
        self.coord
    }

    pub fn heights(&self) -> &HeightField {
        &self.heights
    }

    pub fn tiles(&self) -> &TileBlock {
        &self.tiles
    }

    pub fn tile(&self, tile: TileCoord) -> TileCell {
        self.tiles.get(tile)
    }

    pub fn vertices(&self) -> &[TerrainVertex] {
        &self.vertices
    }

    /// Vertices of one tile (25, row-major).
    pub fn tile_vertices(&self, tile: TileCoord) -> &[TerrainVertex] {
        let start = tile.index() * VERTICES_PER_TILE;
        &self.vertices[start..start + VERTICES_PER_TILE]
    }

    pub fn tile_bounds(&self, tile: TileCoord) -> &TileBounds {
        &self.tile_bounds[tile.index()]
    }

    /// Union of every tile box.
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Texture indices (bottom, top) currently bound to a tile.
    pub fn tile_textures(&self, tile: TileCoord) -> [u16; 2] {
        self.tile_textures[tile.index()]
    }

    /// Write one height sample. Geometry is stale until [`Self::rebuild_geometry`].
    pub fn set_height(&mut self, col: usize, row: usize, height: f32) {
        self.heights.set(col, row, height);
    }

    /// Swap in a whole height field (undo/redo) and rebuild.
    pub fn replace_heights(&mut self, heights: HeightField) {
        self.heights = heights;
        self.rebuild_geometry();
    }

    /// Re-derive vertices and bounding boxes after height edits.
    pub fn rebuild_geometry(&mut self) {
        self.build_vertices();
        self.build_bounding_boxes();
    }

    fn definition(&self, tile_id: i32) -> TileDefinition {
        self.tile_defs.get(tile_id).copied().unwrap_or_default()
    }

    // ========================================================================
    // GEOMETRY
    // ========================================================================

    /// Sample every tile's 5×5 vertex stamp out of the height field.
    pub fn build_vertices(&mut self) {
        let span = CELLS_PER_BLOCK as f32;
        for ty in 0..TILES_PER_BLOCK {
            for tx in 0..TILES_PER_BLOCK {
                let tile = TileCoord::new(tx, ty);
                let base = tile.index() * VERTICES_PER_TILE;
                for j in 0..VERTICES_PER_TILE_SIDE {
                    for i in 0..VERTICES_PER_TILE_SIDE {
                        let col = tx * QUADS_PER_TILE + i;
                        let row = ty * QUADS_PER_TILE + j;
                        let vertex = &mut self.vertices[base + j * VERTICES_PER_TILE_SIDE + i];
                        vertex.position = [
                            self.origin.x + col as f32 * self.cell_size,
                            self.origin.y + row as f32 * self.cell_size,
                            self.heights.get(col, row),
                        ];
                        vertex.shadow_uv = [col as f32 / span, row as f32 / span];
                    }
                }
                self.build_tile_uvs(tile);
            }
        }
    }

    /// Bottom/top UVs of one tile; the top layer follows the tile's rotation.
    fn build_tile_uvs(&mut self, tile: TileCoord) {
        let rotation = self.definition(self.tiles.get(tile).tile_id).rotation;
        let base = tile.index() * VERTICES_PER_TILE;
        let step = QUADS_PER_TILE as f32;
        for j in 0..VERTICES_PER_TILE_SIDE {
            for i in 0..VERTICES_PER_TILE_SIDE {
                let uv = Vec2::new(i as f32 / step, j as f32 / step);
                let vertex = &mut self.vertices[base + j * VERTICES_PER_TILE_SIDE + i];
                vertex.bottom_uv = uv.to_array();
                vertex.top_uv = rotation.apply(uv).to_array();
            }
        }
    }

    /// Per-tile boxes, per-sub-quad boxes, and the block box.
    pub fn build_bounding_boxes(&mut self) {
        let mut block_bounds = Aabb::EMPTY;
        for index in 0..TILE_COUNT {
            let tile = TileCoord::new(index % TILES_PER_BLOCK, index / TILES_PER_BLOCK);
            let verts = self.tile_vertices(tile);
            let aabb = Aabb::from_points(verts.iter().map(|v| Vec3::from_array(v.position)));

            let mut quads = [Aabb::EMPTY; QUADS_PER_TILE_TOTAL];
            for qj in 0..QUADS_PER_TILE {
                for qi in 0..QUADS_PER_TILE {
                    quads[qj * QUADS_PER_TILE + qi] = Aabb::from_points(self.quad_corners(tile, qi, qj));
                }
            }

            block_bounds = block_bounds.union(&aabb);
            self.tile_bounds[index] = TileBounds { aabb, quads };
        }
        self.bounds = block_bounds;
    }

    /// Corners v00, v10, v01, v11 of sub-quad (qi, qj).
    fn quad_corners(&self, tile: TileCoord, qi: usize, qj: usize) -> [Vec3; 4] {
        let verts = self.tile_vertices(tile);
        let at = |i: usize, j: usize| Vec3::from_array(verts[j * VERTICES_PER_TILE_SIDE + i].position);
        [at(qi, qj), at(qi + 1, qj), at(qi, qj + 1), at(qi + 1, qj + 1)]
    }

    /// The two triangles of a sub-quad, split along the v00-v11 diagonal.
    pub fn quad_triangles(&self, tile: TileCoord, qi: usize, qj: usize) -> [[Vec3; 3]; 2] {
        let [v00, v10, v01, v11] = self.quad_corners(tile, qi, qj);
        [[v00, v10, v11], [v00, v11, v01]]
    }

    // ========================================================================
    // TILES
    // ========================================================================

    /// Assign a tile, refresh its UVs and textures, and make sure both
    /// textures are resident.
    pub fn change_tile(&mut self, tile: TileCoord, cell: TileCell, textures: &mut TextureCache) {
        self.tiles.set(tile, cell);

        if self.tile_defs.get(cell.tile_id).is_none() {
            warn!(
                "Block ({}, {}) tile ({}, {}): tile id {} is not in the tile table",
                self.coord.x, self.coord.y, tile.x, tile.y, cell.tile_id
            );
        }
        let def = self.definition(cell.tile_id);
        self.tile_textures[tile.index()] = [def.texture_index1, def.texture_index2];
        self.build_tile_uvs(tile);

        for texture_index in [def.texture_index1, def.texture_index2] {
            if let Some(path) = self.tile_defs.texture_path(texture_index) {
                textures.get_or_load(path);
            }
        }
    }

    /// Make every texture referenced by this block resident.
    pub fn load_textures(&self, textures: &mut TextureCache) {
        for pair in &self.tile_textures {
            for &texture_index in pair {
                if let Some(path) = self.tile_defs.texture_path(texture_index) {
                    textures.get_or_load(path);
                }
            }
        }
    }

    // ========================================================================
    // PICKING
    // ========================================================================

    /// Every triangle hit of `ray` on this block.
    ///
    /// Broad phase: block box + frustum. Narrow phase: tile box → sub-quad
    /// box → the quad's two triangles, tested against the ray's near/far points.
    pub fn pick_position(&self, frustum: &Frustum, ray: &PickRay) -> Vec<Vec3> {
        let mut hits = Vec::new();
        if ray.hits_aabb(&self.bounds).is_none() || !frustum.intersects_aabb(&self.bounds) {
            return hits;
        }

        for index in 0..TILE_COUNT {
            let bounds = &self.tile_bounds[index];
            if ray.hits_aabb(&bounds.aabb).is_none() {
                continue;
            }
            let tile = TileCoord::new(index % TILES_PER_BLOCK, index / TILES_PER_BLOCK);
            for (q, quad) in bounds.quads.iter().enumerate() {
                if ray.hits_aabb(quad).is_none() {
                    continue;
                }
                let (qi, qj) = (q % QUADS_PER_TILE, q / QUADS_PER_TILE);
                for triangle in self.quad_triangles(tile, qi, qj) {
                    if let Some(hit) = ray_triangle_intersect(ray.near, ray.far, triangle) {
                        hits.push(hit);
                    }
                }
            }
        }
        hits
    }

    /// First tile (row-major) whose box the ray hits; no triangle refinement.
    pub fn pick_tile(&self, frustum: &Frustum, ray: &PickRay) -> Option<TilePick> {
        if ray.hits_aabb(&self.bounds).is_none() || !frustum.intersects_aabb(&self.bounds) {
            return None;
        }
        self.tile_bounds.iter().enumerate().find_map(|(index, bounds)| {
            ray.hits_aabb(&bounds.aabb).map(|t| TilePick {
                block: self.coord,
                tile: TileCoord::new(index % TILES_PER_BLOCK, index / TILES_PER_BLOCK),
                entry: ray.point_at(t),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::tables::TileRotation;

    fn tile_defs() -> Arc<TileDefinitionTable> {
        Arc::new(TileDefinitionTable {
            tiles: vec![
                TileDefinition::default(),
                TileDefinition {
                    texture_index1: 0,
                    texture_index2: 1,
                    rotation: TileRotation::FlipX,
                },
            ],
            textures: vec!["a.png".into(), "b.png".into()],
        })
    }

    fn sloped_block() -> HeightmapBlock {
        let mut heights = HeightField::flat(0.0);
        for row in 0..65 {
            for col in 0..65 {
                heights.set(col, row, col as f32 * 0.5);
            }
        }
        HeightmapBlock::new(
            BlockCoord::new(1, 0),
            &TerrainConfig::default(),
            heights,
            TileBlock::default(),
            tile_defs(),
        )
    }

    #[test]
    fn test_vertex_positions_share_borders() {
        let block = sloped_block();
        assert_eq!(block.vertices().len(), 6400);

        // Last column of tile (0,0) equals first column of tile (1,0)
        let left = block.tile_vertices(TileCoord::new(0, 0));
        let right = block.tile_vertices(TileCoord::new(1, 0));
        for j in 0..5 {
            assert_eq!(left[j * 5 + 4].position, right[j * 5].position);
        }

        // Block (1,0) starts at x = 64
        assert_eq!(left[0].position, [64.0, 0.0, 0.0]);
        assert_eq!(left[4].position, [68.0, 0.0, 2.0]);
    }

    #[test]
    fn test_uv_layers() {
        let block = sloped_block();
        let verts = block.tile_vertices(TileCoord::new(15, 15));
        let last = verts[24];
        assert_eq!(last.bottom_uv, [1.0, 1.0]);
        assert_eq!(last.top_uv, [1.0, 1.0]);
        assert_eq!(last.shadow_uv, [1.0, 1.0]);
        assert_eq!(verts[0].shadow_uv, [60.0 / 64.0, 60.0 / 64.0]);
    }

    #[test]
    fn test_bounding_boxes() {
        let block = sloped_block();
        let tile = block.tile_bounds(TileCoord::new(2, 3));
        assert_eq!(tile.aabb.min, Vec3::new(72.0, 12.0, 4.0));
        assert_eq!(tile.aabb.max, Vec3::new(76.0, 16.0, 6.0));

        let quad = tile.quads[1];
        assert_eq!(quad.min, Vec3::new(73.0, 12.0, 4.5));
        assert_eq!(quad.max, Vec3::new(74.0, 13.0, 5.0));

        assert_eq!(block.bounds().min, Vec3::new(64.0, 0.0, 0.0));
        assert_eq!(block.bounds().max, Vec3::new(128.0, 64.0, 32.0));
    }

    #[test]
    fn test_change_tile_updates_uvs_and_round_trips() {
        let mut block = sloped_block();
        let mut cache = TextureCache::new(std::env::temp_dir().join("tile_terrain_block_tests"));
        let tile = TileCoord::new(4, 4);
        let original_cell = block.tile(tile);
        let original_verts = block.tile_vertices(tile).to_vec();

        block.change_tile(tile, TileCell::new(2, 1, 3, 1), &mut cache);
        assert_eq!(block.tile_textures(tile), [0, 1]);
        assert_eq!(block.tile_vertices(tile)[0].top_uv, [1.0, 0.0]);
        assert!(cache.is_resident("b.png"));

        block.change_tile(tile, original_cell, &mut cache);
        assert_eq!(block.tile(tile), original_cell);
        assert_eq!(block.tile_vertices(tile), original_verts.as_slice());
    }

    #[test]
    fn test_pick_position_on_slope() {
        let block = sloped_block();
        // Straight down through (70.5, 10.25): height = 6.5 * 0.5
        let ray = PickRay::from_segment(Vec3::new(70.5, 10.25, 100.0), Vec3::new(70.5, 10.25, -100.0)).unwrap();
        let hits = block.pick_position(&Frustum::unbounded(), &ray);
        assert!(!hits.is_empty());
        for hit in hits {
            assert!((hit - Vec3::new(70.5, 10.25, 3.25)).length() < 1e-3);
            assert!(block.bounds().contains(hit, 1e-3));
        }
    }

    #[test]
    fn test_pick_position_misses_other_block() {
        let block = sloped_block();
        let ray = PickRay::from_segment(Vec3::new(10.0, 10.0, 100.0), Vec3::new(10.0, 10.0, -100.0)).unwrap();
        assert!(block.pick_position(&Frustum::unbounded(), &ray).is_empty());
        assert!(block.pick_tile(&Frustum::unbounded(), &ray).is_none());
    }

    #[test]
    fn test_pick_tile() {
        let block = sloped_block();
        let ray = PickRay::from_segment(Vec3::new(70.5, 10.25, 100.0), Vec3::new(70.5, 10.25, -100.0)).unwrap();
        let pick = block.pick_tile(&Frustum::unbounded(), &ray).unwrap();
        assert_eq!(pick.block, BlockCoord::new(1, 0));
        assert_eq!(pick.tile, TileCoord::new(1, 2));
    }

    #[test]
    fn test_replace_heights_rebuilds() {
        let mut block = sloped_block();
        block.replace_heights(HeightField::flat(3.0));
        assert_eq!(block.bounds().min.z, 3.0);
        assert_eq!(block.bounds().max.z, 3.0);
        assert_eq!(block.vertices()[100].position[2], 3.0);
    }
}
