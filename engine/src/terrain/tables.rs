//! Global Terrain Tables
//!
//! Read-only lookup data shared by every block: the tile-definition table
//! (tile id → textures + rotation) and the brush/tileset table with its
//! chain matrix. Both load once from JSON and are handed out behind `Arc`.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::TerrainError;

/// `chains` entry meaning "these two brushes never blend".
pub const NO_CHAIN: u8 = 99;
/// Tileset number meaning "no valid compound tile".
pub const NO_TILESET: u8 = 200;
/// Tile index of a fully covered (interior) tile.
pub const FULL_TILE_INDEX: u8 = 15;

// ============================================================================
// TILE DEFINITIONS
// ============================================================================

/// How the top texture layer is oriented on a tile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileRotation {
    #[default]
    Identity,
    FlipX,
    FlipY,
    FlipBoth,
    /// Swap then flip
    Rotate90Cw,
    /// Swap only
    Rotate90Ccw,
}

impl TileRotation {
    /// Transform a tile-space UV (0..1) for the top layer.
    pub fn apply(self, uv: Vec2) -> Vec2 {
        match self {
            TileRotation::Identity => uv,
            TileRotation::FlipX => Vec2::new(1.0 - uv.x, uv.y),
            TileRotation::FlipY => Vec2::new(uv.x, 1.0 - uv.y),
            TileRotation::FlipBoth => Vec2::new(1.0 - uv.x, 1.0 - uv.y),
            TileRotation::Rotate90Cw => Vec2::new(uv.y, 1.0 - uv.x),
            TileRotation::Rotate90Ccw => Vec2::new(uv.y, uv.x),
        }
    }
}

/// One entry of the global tile-definition table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileDefinition {
    /// Bottom-layer texture (index into `TileDefinitionTable::textures`)
    pub texture_index1: u16,
    /// Top-layer (blend) texture
    pub texture_index2: u16,
    #[serde(default)]
    pub rotation: TileRotation,
}

/// Maps tile ids to texture pairs, plus the texture path list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TileDefinitionTable {
    pub tiles: Vec<TileDefinition>,
    /// Texture file paths, relative to the texture root
    pub textures: Vec<String>,
}

impl TileDefinitionTable {
    /// Load and validate a table from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TerrainError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self, TerrainError> {
        let table: Self = serde_json::from_str(json)?;
        table.validate()?;
        Ok(table)
    }

    /// Every definition must reference an existing texture.
    pub fn validate(&self) -> Result<(), TerrainError> {
        let texture_count = self.textures.len();
        for (id, def) in self.tiles.iter().enumerate() {
            let worst = def.texture_index1.max(def.texture_index2) as usize;
            if worst >= texture_count {
                return Err(TerrainError::InvalidTable(format!(
                    "tile {id} references texture {worst}, only {texture_count} textures listed"
                )));
            }
        }
        Ok(())
    }

    /// Definition of `tile_id`, if the id is inside the table.
    pub fn get(&self, tile_id: i32) -> Option<&TileDefinition> {
        usize::try_from(tile_id).ok().and_then(|id| self.tiles.get(id))
    }

    pub fn texture_path(&self, texture_index: u16) -> Option<&str> {
        self.textures.get(texture_index as usize).map(String::as_str)
    }
}

// ============================================================================
// BRUSH TABLE
// ============================================================================

/// One brush-transition definition (a tileset blending two brushes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrushSet {
    /// Brush shown on uncovered corners (tile index 0)
    pub minimum_brush: u8,
    /// Brush shown on covered corners (tile index 15)
    pub maximum_brush: u8,
    /// First tile id of the transition run
    pub tile_number: i32,
    /// Tile id of the full-fill tile
    pub tile_number_f: i32,
    /// Tile ids per index step
    pub tile_count: i32,
    /// +1: index counts up from `tile_number`, -1: counts down from index 15
    pub direction: i8,
}

impl BrushSet {
    /// Tile id of `tile_index` inside this set.
    pub fn tile_id(&self, tile_index: u8) -> i32 {
        if tile_index == FULL_TILE_INDEX {
            return self.tile_number_f;
        }
        let index = tile_index as i32;
        let offset = if self.direction > 0 {
            index * self.tile_count
        } else {
            (FULL_TILE_INDEX as i32 - index) * self.tile_count
        };
        self.tile_number + offset
    }

    /// True when the set blends `a` and `b` in either order.
    pub fn pairs(&self, a: u8, b: u8) -> bool {
        (self.minimum_brush == a && self.maximum_brush == b)
            || (self.minimum_brush == b && self.maximum_brush == a)
    }
}

/// Brush tilesets plus the brush compatibility matrix.
///
/// `chains[a][b]` names the brush that `a` blends into on its way to `b`:
/// `b` itself for a direct blend, another brush for a compound blend
/// through that intermediate, or [`NO_CHAIN`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BrushTable {
    pub sets: Vec<BrushSet>,
    pub chains: Vec<Vec<u8>>,
}

impl BrushTable {
    /// Load and validate a table from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TerrainError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self, TerrainError> {
        let table: Self = serde_json::from_str(json)?;
        table.validate()?;
        Ok(table)
    }

    /// Check the chain matrix shape and the set definitions.
    pub fn validate(&self) -> Result<(), TerrainError> {
        let n = self.chains.len();
        if n > NO_CHAIN as usize {
            return Err(TerrainError::InvalidTable(format!(
                "{n} brushes exceed the chain sentinel {NO_CHAIN}"
            )));
        }
        if self.sets.len() >= NO_TILESET as usize {
            return Err(TerrainError::InvalidTable(format!(
                "{} tilesets collide with the tileset sentinel {NO_TILESET}",
                self.sets.len()
            )));
        }
        for (a, row) in self.chains.iter().enumerate() {
            if row.len() != n {
                return Err(TerrainError::InvalidTable(format!(
                    "chain row {a} has {} entries, expected {n}",
                    row.len()
                )));
            }
            if let Some(&bad) = row.iter().find(|&&c| c != NO_CHAIN && c as usize >= n) {
                return Err(TerrainError::InvalidTable(format!(
                    "chain row {a} names unknown brush {bad}"
                )));
            }
        }
        for (i, set) in self.sets.iter().enumerate() {
            if set.direction != 1 && set.direction != -1 {
                return Err(TerrainError::InvalidTable(format!(
                    "tileset {i} has direction {}, expected +1 or -1",
                    set.direction
                )));
            }
            if set.minimum_brush as usize >= n || set.maximum_brush as usize >= n {
                return Err(TerrainError::InvalidTable(format!(
                    "tileset {i} references a brush outside the {n}×{n} chain matrix"
                )));
            }
        }
        Ok(())
    }

    pub fn brush_count(&self) -> usize {
        self.chains.len()
    }

    pub fn set(&self, tile_set: u8) -> Option<&BrushSet> {
        self.sets.get(tile_set as usize)
    }

    /// `chains[a][b]`, or `None` for the sentinel / unknown brushes.
    pub fn chain(&self, a: u8, b: u8) -> Option<u8> {
        self.chains
            .get(a as usize)
            .and_then(|row| row.get(b as usize))
            .copied()
            .filter(|&c| c != NO_CHAIN)
    }

    /// First tileset blending `a` and `b` in either order.
    pub fn find_pair(&self, a: u8, b: u8) -> Option<u8> {
        self.sets
            .iter()
            .position(|set| set.pairs(a, b))
            .map(|i| i as u8)
    }

    /// Brush bridging `a` and `b` when no set blends them directly: the
    /// other brush of the first set containing `a` that itself pairs with `b`.
    pub fn find_compound(&self, a: u8, b: u8) -> Option<u8> {
        self.sets.iter().find_map(|set| {
            let via = if set.minimum_brush == a {
                set.maximum_brush
            } else if set.maximum_brush == a {
                set.minimum_brush
            } else {
                return None;
            };
            (via != a && via != b && self.find_pair(via, b).is_some()).then_some(via)
        })
    }

    /// Tileset and index of a tile fully covered by `brush`.
    ///
    /// Prefers a set where the brush is the maximum (full-fill tile), then
    /// one where it is the minimum (index 0).
    pub fn full_fill(&self, brush: u8) -> Option<(u8, u8)> {
        if let Some(i) = self.sets.iter().position(|s| s.maximum_brush == brush) {
            return Some((i as u8, FULL_TILE_INDEX));
        }
        self.sets
            .iter()
            .position(|s| s.minimum_brush == brush)
            .map(|i| (i as u8, 0))
    }

    /// Tile id of `(tile_set, tile_index)`, `None` for an unknown set.
    pub fn tile_id(&self, tile_set: u8, tile_index: u8) -> Option<i32> {
        self.set(tile_set).map(|set| set.tile_id(tile_index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(min: u8, max: u8, direction: i8) -> BrushSet {
        BrushSet {
            minimum_brush: min,
            maximum_brush: max,
            tile_number: 100,
            tile_number_f: 7,
            tile_count: 2,
            direction,
        }
    }

    #[test]
    fn test_rotation_cases() {
        let uv = Vec2::new(0.25, 0.75);
        assert_eq!(TileRotation::Identity.apply(uv), uv);
        assert_eq!(TileRotation::FlipX.apply(uv), Vec2::new(0.75, 0.75));
        assert_eq!(TileRotation::FlipY.apply(uv), Vec2::new(0.25, 0.25));
        assert_eq!(TileRotation::FlipBoth.apply(uv), Vec2::new(0.75, 0.25));
        assert_eq!(TileRotation::Rotate90Cw.apply(uv), Vec2::new(0.75, 0.75));
        assert_eq!(TileRotation::Rotate90Ccw.apply(uv), Vec2::new(0.75, 0.25));
    }

    #[test]
    fn test_tile_id_formula() {
        let up = set(0, 1, 1);
        assert_eq!(up.tile_id(15), 7);
        assert_eq!(up.tile_id(0), 100);
        assert_eq!(up.tile_id(3), 106);

        let down = set(0, 1, -1);
        assert_eq!(down.tile_id(15), 7);
        assert_eq!(down.tile_id(0), 130);
        assert_eq!(down.tile_id(3), 124);
    }

    #[test]
    fn test_chain_lookup_and_sentinel() {
        let table = BrushTable {
            sets: vec![set(0, 1, 1)],
            chains: vec![vec![NO_CHAIN, 1], vec![0, NO_CHAIN]],
        };
        table.validate().unwrap();
        assert_eq!(table.chain(0, 1), Some(1));
        assert_eq!(table.chain(0, 0), None);
        assert_eq!(table.chain(5, 0), None);
        assert_eq!(table.find_pair(1, 0), Some(0));
        assert_eq!(table.find_pair(1, 1), None);
    }

    #[test]
    fn test_full_fill_prefers_maximum() {
        let table = BrushTable {
            sets: vec![set(0, 1, 1), set(1, 2, 1)],
            chains: vec![vec![NO_CHAIN; 3]; 3],
        };
        assert_eq!(table.full_fill(1), Some((0, 15)));
        assert_eq!(table.full_fill(0), Some((0, 0)));
        assert_eq!(table.full_fill(2), Some((1, 15)));
    }

    #[test]
    fn test_validate_rejects_ragged_chains() {
        let table = BrushTable {
            sets: vec![],
            chains: vec![vec![NO_CHAIN, 1], vec![0]],
        };
        assert!(matches!(table.validate(), Err(TerrainError::InvalidTable(_))));
    }

    #[test]
    fn test_find_compound_bridges_through_shared_brush() {
        // 0 blends with 1, 2 blends with 1, nothing blends 0 with 2
        let table = BrushTable {
            sets: vec![set(0, 1, 1), set(2, 1, 1)],
            chains: vec![vec![NO_CHAIN; 3]; 3],
        };
        assert_eq!(table.find_pair(2, 0), None);
        assert_eq!(table.find_compound(2, 0), Some(1));
        assert_eq!(table.find_compound(0, 2), Some(1));
        assert_eq!(table.find_compound(1, 0), None);
    }

    #[test]
    fn test_validate_rejects_unknown_chain_brush() {
        let table = BrushTable {
            sets: vec![],
            chains: vec![vec![NO_CHAIN, 7], vec![0, NO_CHAIN]],
        };
        assert!(table.validate().is_err());
    }

    #[test]
    fn test_tile_table_json() {
        let json = r#"{
            "tiles": [
                { "texture_index1": 0, "texture_index2": 1, "rotation": "FlipX" },
                { "texture_index1": 1, "texture_index2": 1 }
            ],
            "textures": ["grass.png", "sand.png"]
        }"#;
        let table = TileDefinitionTable::from_json(json).unwrap();
        assert_eq!(table.get(0).unwrap().rotation, TileRotation::FlipX);
        assert_eq!(table.get(1).unwrap().rotation, TileRotation::Identity);
        assert!(table.get(2).is_none());
        assert!(table.get(-1).is_none());
        assert_eq!(table.texture_path(1), Some("sand.png"));
    }

    #[test]
    fn test_tile_table_rejects_missing_texture() {
        let json = r#"{ "tiles": [{ "texture_index1": 0, "texture_index2": 3 }], "textures": ["a.png"] }"#;
        assert!(TileDefinitionTable::from_json(json).is_err());
    }
}
