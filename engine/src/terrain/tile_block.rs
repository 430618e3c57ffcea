//! Tile Block
//!
//! 16×16 tile assignments for one terrain block.

use serde::{Deserialize, Serialize};

use crate::error::TerrainError;
use crate::world::{TILE_COUNT, TileCoord};

/// Texture assignment of one tile.
///
/// `tile_id` is derived from `(tile_set, tile_index)` through the brush table;
/// it is only taken verbatim when a block is loaded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCell {
    /// Brush painted on this tile
    pub brush_id: u8,
    /// Brush tileset (transition definition) the tile belongs to
    pub tile_set: u8,
    /// 4-bit corner mask inside the tileset (15 = full fill)
    pub tile_index: u8,
    /// Index into the global tile-definition table
    pub tile_id: i32,
}

impl TileCell {
    pub fn new(brush_id: u8, tile_set: u8, tile_index: u8, tile_id: i32) -> Self {
        Self {
            brush_id,
            tile_set,
            tile_index,
            tile_id,
        }
    }
}

/// Row-major 16×16 grid of tile cells.
#[derive(Clone, Debug, PartialEq)]
pub struct TileBlock {
    cells: Vec<TileCell>,
}

impl Default for TileBlock {
    fn default() -> Self {
        Self::filled(TileCell::default())
    }
}

impl TileBlock {
    /// Every tile set to `cell`.
    pub fn filled(cell: TileCell) -> Self {
        Self {
            cells: vec![cell; TILE_COUNT],
        }
    }

    /// Wrap a row-major vector of exactly 256 cells.
    pub fn from_cells(cells: Vec<TileCell>) -> Result<Self, TerrainError> {
        if cells.len() != TILE_COUNT {
            return Err(TerrainError::DimensionMismatch {
                expected: TILE_COUNT,
                actual: cells.len(),
            });
        }
        Ok(Self { cells })
    }

    #[inline]
    pub fn get(&self, tile: TileCoord) -> TileCell {
        self.cells[tile.index()]
    }

    #[inline]
    pub fn set(&mut self, tile: TileCoord, cell: TileCell) {
        self.cells[tile.index()] = cell;
    }

    pub fn cells(&self) -> &[TileCell] {
        &self.cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut block = TileBlock::default();
        let cell = TileCell::new(3, 1, 5, 42);
        block.set(TileCoord::new(15, 2), cell);
        assert_eq!(block.get(TileCoord::new(15, 2)), cell);
        assert_eq!(block.cells()[2 * 16 + 15], cell);
        assert_eq!(block.get(TileCoord::new(0, 0)), TileCell::default());
    }

    #[test]
    fn test_from_cells_requires_256() {
        assert!(TileBlock::from_cells(vec![TileCell::default(); 256]).is_ok());
        assert!(TileBlock::from_cells(vec![TileCell::default(); 255]).is_err());
    }
}
