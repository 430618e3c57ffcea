//! Terrain Error Type
//!
//! One error enum for every fallible terrain operation (file I/O, table
//! loading, configuration). Recoverable editor situations such as a missing
//! texture or an unresolvable brush adjacency are logged, not returned.

use std::path::PathBuf;

/// Errors produced while loading, saving or validating terrain data.
#[derive(Debug)]
pub enum TerrainError {
    /// Standard I/O error.
    Io(std::io::Error),
    /// JSON serialization/deserialization error (config and tables).
    Json(serde_json::Error),
    /// Image decoding error.
    Image(image::ImageError),
    /// A block file is shorter than its fixed layout requires.
    FileTooShort {
        path: PathBuf,
        expected: usize,
        actual: usize,
    },
    /// A height or tile payload does not have the fixed block dimensions.
    DimensionMismatch { expected: usize, actual: usize },
    /// A global lookup table failed validation.
    InvalidTable(String),
    /// A configuration value is outside its usable range.
    InvalidConfig(String),
    /// A block coordinate lies outside the grid bound.
    OutOfBounds { x: i32, y: i32 },
}

impl std::fmt::Display for TerrainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TerrainError::Io(e) => write!(f, "IO error: {e}"),
            TerrainError::Json(e) => write!(f, "JSON error: {e}"),
            TerrainError::Image(e) => write!(f, "image error: {e}"),
            TerrainError::FileTooShort {
                path,
                expected,
                actual,
            } => write!(
                f,
                "{} is too short: expected {expected} bytes, found {actual}",
                path.display()
            ),
            TerrainError::DimensionMismatch { expected, actual } => {
                write!(f, "expected {expected} elements, found {actual}")
            }
            TerrainError::InvalidTable(msg) => write!(f, "invalid table: {msg}"),
            TerrainError::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            TerrainError::OutOfBounds { x, y } => {
                write!(f, "block ({x}, {y}) is outside the terrain grid")
            }
        }
    }
}

impl std::error::Error for TerrainError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TerrainError::Io(e) => Some(e),
            TerrainError::Json(e) => Some(e),
            TerrainError::Image(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for TerrainError {
    fn from(e: std::io::Error) -> Self {
        TerrainError::Io(e)
    }
}

impl From<serde_json::Error> for TerrainError {
    fn from(e: serde_json::Error) -> Self {
        TerrainError::Json(e)
    }
}

impl From<image::ImageError> for TerrainError {
    fn from(e: image::ImageError) -> Self {
        TerrainError::Image(e)
    }
}
