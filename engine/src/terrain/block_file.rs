//! Block Files
//!
//! On-disk layout of one terrain block, two files per block under a map
//! directory:
//!
//! ```text
//! <bx>_<by>.height   [HeightHeader 8 bytes][65×65 f32 samples, row-major]
//! <bx>_<by>.tile     [256 × TileRecord 7 bytes, row-major]
//! ```
//!
//! All multi-byte values are little-endian.

use std::io::Write;
use std::path::{Path, PathBuf};

use bytemuck::{Pod, Zeroable};
use log::warn;

use crate::error::TerrainError;
use crate::terrain::height_field::{HeightField, SAMPLE_COUNT};
use crate::terrain::tile_block::{TileBlock, TileCell};
use crate::world::{BlockCoord, CELLS_PER_BLOCK, TILE_COUNT};

/// Header of a `.height` file.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct HeightHeader {
    pub grid_count: u32,
    pub grid_size: f32,
}

/// One tile record of a `.tile` file.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct TileRecord {
    pub brush_id: u8,
    pub tile_set: u8,
    pub tile_index: u8,
    pub tile_id: [u8; 4],
}

static_assertions::assert_eq_size!(HeightHeader, [u8; 8]);
static_assertions::assert_eq_size!(TileRecord, [u8; 7]);

pub const HEIGHT_HEADER_SIZE: usize = std::mem::size_of::<HeightHeader>();
/// Total `.height` file size
pub const HEIGHT_FILE_SIZE: usize = HEIGHT_HEADER_SIZE + SAMPLE_COUNT * 4;
/// Total `.tile` file size
pub const TILE_FILE_SIZE: usize = TILE_COUNT * std::mem::size_of::<TileRecord>();

impl From<TileCell> for TileRecord {
    fn from(cell: TileCell) -> Self {
        Self {
            brush_id: cell.brush_id,
            tile_set: cell.tile_set,
            tile_index: cell.tile_index,
            tile_id: cell.tile_id.to_le_bytes(),
        }
    }
}

impl From<TileRecord> for TileCell {
    fn from(record: TileRecord) -> Self {
        TileCell::new(
            record.brush_id,
            record.tile_set,
            record.tile_index,
            i32::from_le_bytes(record.tile_id),
        )
    }
}

/// `<dir>/<bx>_<by>.height`
pub fn height_path(dir: &Path, coord: BlockCoord) -> PathBuf {
    dir.join(format!("{}_{}.height", coord.x, coord.y))
}

/// `<dir>/<bx>_<by>.tile`
pub fn tile_path(dir: &Path, coord: BlockCoord) -> PathBuf {
    dir.join(format!("{}_{}.tile", coord.x, coord.y))
}

/// Block coordinates of every `<bx>_<by>.height` file in `dir`, sorted.
pub fn list_blocks(dir: &Path) -> Result<Vec<BlockCoord>, TerrainError> {
    let mut coords = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("height") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        match parse_block_stem(stem) {
            Some(coord) => coords.push(coord),
            None => warn!("Skipping {}: not a <bx>_<by> block file", path.display()),
        }
    }
    coords.sort();
    Ok(coords)
}

fn parse_block_stem(stem: &str) -> Option<BlockCoord> {
    let (x, y) = stem.split_once('_')?;
    Some(BlockCoord::new(x.parse().ok()?, y.parse().ok()?))
}

// ============================================================================
// HEIGHT
// ============================================================================

/// Read a `.height` file.
///
/// A header disagreeing with the fixed block size is logged and ignored;
/// the sample payload always has the fixed 65×65 layout.
pub fn read_height_file(path: &Path) -> Result<HeightField, TerrainError> {
    let data = std::fs::read(path)?;
    if data.len() < HEIGHT_FILE_SIZE {
        return Err(TerrainError::FileTooShort {
            path: path.to_path_buf(),
            expected: HEIGHT_FILE_SIZE,
            actual: data.len(),
        });
    }

    let header: HeightHeader = bytemuck::pod_read_unaligned(&data[..HEIGHT_HEADER_SIZE]);
    let grid_count = u32::from_le(header.grid_count);
    let grid_size = f32::from_bits(u32::from_le(header.grid_size.to_bits()));
    if grid_count as usize != CELLS_PER_BLOCK {
        warn!(
            "{}: header grid count {grid_count} differs from {CELLS_PER_BLOCK}",
            path.display()
        );
    }

    let samples: Vec<f32> = data[HEIGHT_HEADER_SIZE..HEIGHT_FILE_SIZE]
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();

    HeightField::from_samples(grid_count, grid_size, samples)
}

/// Write a `.height` file, creating parent directories.
pub fn write_height_file(path: &Path, heights: &HeightField) -> Result<(), TerrainError> {
    let header = HeightHeader {
        grid_count: heights.grid_count.to_le(),
        grid_size: f32::from_bits(heights.grid_size.to_bits().to_le()),
    };
    let samples: Vec<u32> = heights.samples().iter().map(|h| h.to_bits().to_le()).collect();

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::File::create(path)?;
    file.write_all(bytemuck::bytes_of(&header))?;
    file.write_all(bytemuck::cast_slice(&samples))?;
    Ok(())
}

// ============================================================================
// TILES
// ============================================================================

/// Read a `.tile` file.
pub fn read_tile_file(path: &Path) -> Result<TileBlock, TerrainError> {
    let data = std::fs::read(path)?;
    if data.len() < TILE_FILE_SIZE {
        return Err(TerrainError::FileTooShort {
            path: path.to_path_buf(),
            expected: TILE_FILE_SIZE,
            actual: data.len(),
        });
    }

    // TileRecord has alignment 1, so the cast never fails on alignment.
    let records: &[TileRecord] = bytemuck::cast_slice(&data[..TILE_FILE_SIZE]);
    TileBlock::from_cells(records.iter().copied().map(TileCell::from).collect())
}

/// Write a `.tile` file, creating parent directories.
pub fn write_tile_file(path: &Path, tiles: &TileBlock) -> Result<(), TerrainError> {
    let records: Vec<TileRecord> = tiles.cells().iter().copied().map(TileRecord::from).collect();

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::File::create(path)?;
    file.write_all(bytemuck::cast_slice(&records))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("tile_terrain_block_file_tests").join(name);
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_height_file_layout() {
        let dir = temp_dir("height_layout");
        let mut heights = HeightField::flat(0.0);
        heights.set(3, 2, 1.5);
        heights.set(64, 64, -2.0);

        let path = height_path(&dir, BlockCoord::new(2, 7));
        assert!(path.ends_with("2_7.height"));
        write_height_file(&path, &heights).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), HEIGHT_FILE_SIZE);
        assert_eq!(&bytes[0..4], &64u32.to_le_bytes());
        let offset = HEIGHT_HEADER_SIZE + (2 * 65 + 3) * 4;
        assert_eq!(&bytes[offset..offset + 4], &1.5f32.to_le_bytes());

        let loaded = read_height_file(&path).unwrap();
        assert_eq!(loaded, heights);
    }

    #[test]
    fn test_tile_file_layout() {
        let dir = temp_dir("tile_layout");
        let mut tiles = TileBlock::default();
        tiles.set(crate::world::TileCoord::new(1, 0), TileCell::new(2, 3, 4, -7));

        let path = tile_path(&dir, BlockCoord::new(0, 0));
        write_tile_file(&path, &tiles).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), TILE_FILE_SIZE);
        assert_eq!(&bytes[7..14], &[2, 3, 4, 0xF9, 0xFF, 0xFF, 0xFF]);

        assert_eq!(read_tile_file(&path).unwrap(), tiles);
    }

    #[test]
    fn test_list_blocks() {
        let dir = temp_dir("list");
        std::fs::create_dir_all(&dir).unwrap();
        for name in ["1_0.height", "0_2.height", "0_0.tile", "notes.height", "readme.txt"] {
            std::fs::write(dir.join(name), b"").unwrap();
        }
        assert_eq!(list_blocks(&dir).unwrap(), vec![BlockCoord::new(0, 2), BlockCoord::new(1, 0)]);
    }

    #[test]
    fn test_short_file_rejected() {
        let dir = temp_dir("short");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("0_0.tile");
        std::fs::write(&path, [0u8; 10]).unwrap();

        match read_tile_file(&path) {
            Err(TerrainError::FileTooShort { expected, actual, .. }) => {
                assert_eq!(expected, TILE_FILE_SIZE);
                assert_eq!(actual, 10);
            }
            other => panic!("expected FileTooShort, got {other:?}"),
        }
    }
}
