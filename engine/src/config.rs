//! Editor Configuration
//!
//! Everything the terrain editor reads at startup, loaded from one JSON file.
//! Every field has a default, so a partial or missing file still works.

use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::TerrainError;
use crate::sculpt::SculptSettings;
use crate::undo::DEFAULT_UNDO_LIMIT;
use crate::world::TerrainConfig;

/// Central configuration for the terrain editor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Grid bound and cell size
    pub terrain: TerrainConfig,
    /// Brush settings at startup
    pub sculpt: SculptSettings,
    /// Commands kept in the undo history
    pub undo_limit: usize,
    /// Directory tile texture paths are relative to
    pub texture_root: PathBuf,
    /// JSON tile-definition table
    pub tile_table_path: PathBuf,
    /// JSON brush/tileset table
    pub brush_table_path: PathBuf,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            terrain: TerrainConfig::default(),
            sculpt: SculptSettings::default(),
            undo_limit: DEFAULT_UNDO_LIMIT,
            texture_root: PathBuf::from("assets/textures"),
            tile_table_path: PathBuf::from("assets/tiles.json"),
            brush_table_path: PathBuf::from("assets/brushes.json"),
        }
    }
}

impl EditorConfig {
    /// Read a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TerrainError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        info!("Loaded editor config from {}", path.display());
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self, TerrainError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the values the terrain grid is built from.
    pub fn validate(&self) -> Result<(), TerrainError> {
        self.terrain.validate()
    }

    /// Resolve the table and texture paths against `base` (usually the
    /// directory holding the config file). Absolute paths are kept.
    pub fn resolve_paths(&mut self, base: &Path) {
        for path in [&mut self.texture_root, &mut self.tile_table_path, &mut self.brush_table_path] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}
