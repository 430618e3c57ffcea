//! Height Field
//!
//! 65×65 elevation samples for one terrain block, row-major.

use crate::error::TerrainError;
use crate::world::{CELLS_PER_BLOCK, SAMPLES_PER_BLOCK};

/// Number of samples in one block's height field.
pub const SAMPLE_COUNT: usize = SAMPLES_PER_BLOCK * SAMPLES_PER_BLOCK;

/// Elevation samples of one block plus the subdivision header stored with them.
#[derive(Clone, Debug, PartialEq)]
pub struct HeightField {
    /// Cells per side described by the samples (always 64)
    pub grid_count: u32,
    /// World size of one cell as recorded in the height file
    pub grid_size: f32,
    samples: Vec<f32>,
}

impl Default for HeightField {
    fn default() -> Self {
        Self::flat(0.0)
    }
}

impl HeightField {
    /// A field with every sample at `height`.
    pub fn flat(height: f32) -> Self {
        Self {
            grid_count: CELLS_PER_BLOCK as u32,
            grid_size: 1.0,
            samples: vec![height; SAMPLE_COUNT],
        }
    }

    /// Wrap a row-major sample vector; it must hold exactly 65×65 values.
    pub fn from_samples(grid_count: u32, grid_size: f32, samples: Vec<f32>) -> Result<Self, TerrainError> {
        if samples.len() != SAMPLE_COUNT {
            return Err(TerrainError::DimensionMismatch {
                expected: SAMPLE_COUNT,
                actual: samples.len(),
            });
        }
        Ok(Self {
            grid_count,
            grid_size,
            samples,
        })
    }

    #[inline]
    fn index(col: usize, row: usize) -> usize {
        debug_assert!(col < SAMPLES_PER_BLOCK && row < SAMPLES_PER_BLOCK);
        row * SAMPLES_PER_BLOCK + col
    }

    #[inline]
    pub fn get(&self, col: usize, row: usize) -> f32 {
        self.samples[Self::index(col, row)]
    }

    #[inline]
    pub fn set(&mut self, col: usize, row: usize, height: f32) {
        self.samples[Self::index(col, row)] = height;
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Lowest and highest sample.
    pub fn range(&self) -> (f32, f32) {
        self.samples
            .iter()
            .fold((f32::MAX, f32::MIN), |(lo, hi), &h| (lo.min(h), hi.max(h)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_field() {
        let field = HeightField::flat(2.5);
        assert_eq!(field.samples().len(), 65 * 65);
        assert_eq!(field.get(64, 64), 2.5);
        assert_eq!(field.range(), (2.5, 2.5));
    }

    #[test]
    fn test_set_get_row_major() {
        let mut field = HeightField::default();
        field.set(3, 1, 7.0);
        assert_eq!(field.get(3, 1), 7.0);
        assert_eq!(field.samples()[65 + 3], 7.0);
        assert_eq!(field.range(), (0.0, 7.0));
    }

    #[test]
    fn test_from_samples_rejects_wrong_size() {
        let result = HeightField::from_samples(64, 1.0, vec![0.0; 10]);
        assert!(matches!(
            result,
            Err(TerrainError::DimensionMismatch { expected: 4225, actual: 10 })
        ));
    }
}
