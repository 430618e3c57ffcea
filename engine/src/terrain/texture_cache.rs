//! Tile Texture Cache
//!
//! Lazily loads tile textures by path the first time a tile references them.
//! An unreadable file is replaced by a mid-gray texture so a broken asset
//! never stops a map from loading.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{Rgba, RgbaImage};
use log::{debug, warn};

use crate::error::TerrainError;

/// Color of the substitute texture.
pub const FALLBACK_GRAY: Rgba<u8> = Rgba([128, 128, 128, 255]);
/// Edge length of the substitute texture in pixels.
const FALLBACK_SIZE: u32 = 4;

/// A resident texture.
#[derive(Debug, Clone)]
pub struct CachedTexture {
    pub image: Arc<RgbaImage>,
    /// True when the file could not be read and the gray fallback was used
    pub is_fallback: bool,
}

/// Textures keyed by resolved path.
#[derive(Debug, Default)]
pub struct TextureCache {
    root: PathBuf,
    textures: HashMap<PathBuf, CachedTexture>,
}

impl TextureCache {
    /// Cache resolving relative texture paths against `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            textures: HashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Return the texture at `relative`, loading it on first use.
    pub fn get_or_load(&mut self, relative: &str) -> CachedTexture {
        let path = self.root.join(relative);
        if let Some(texture) = self.textures.get(&path) {
            return texture.clone();
        }

        let texture = match read_texture(&path) {
            Ok(image) => {
                debug!("Loaded texture {}", path.display());
                CachedTexture {
                    image: Arc::new(image),
                    is_fallback: false,
                }
            }
            Err(e) => {
                warn!("Texture {} unavailable ({e}), using gray fallback", path.display());
                CachedTexture {
                    image: Arc::new(fallback_texture()),
                    is_fallback: true,
                }
            }
        };
        self.textures.insert(path, texture.clone());
        texture
    }

    pub fn is_resident(&self, relative: &str) -> bool {
        self.textures.contains_key(&self.root.join(relative))
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    pub fn clear(&mut self) {
        self.textures.clear();
    }
}

fn read_texture(path: &Path) -> Result<RgbaImage, TerrainError> {
    Ok(image::open(path)?.to_rgba8())
}

/// Uniform mid-gray texture used in place of unreadable files.
pub fn fallback_texture() -> RgbaImage {
    RgbaImage::from_pixel(FALLBACK_SIZE, FALLBACK_SIZE, FALLBACK_GRAY)
}
