//! Height Sculpting
//!
//! Raise, lower, flatten and smooth the height samples around a picked
//! point, over a square or circular brush with an optional inner radius of
//! full intensity.
//!
//! ## Strokes
//! A stroke runs from [`HeightSculptor::begin_stroke`] to
//! [`HeightSculptor::end_stroke`]. Each block is snapshotted right before
//! its first modification in the stroke, so the whole drag undoes as one
//! [`TerrainCommand::HeightStroke`].

use std::collections::{BTreeMap, BTreeSet};

use glam::Vec3;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::terrain::{HeightField, TerrainGrid};
use crate::undo::{HeightSnapshot, TerrainCommand};
use crate::world::{BlockCoord, SampleCoord};

// ============================================================================
// SETTINGS
// ============================================================================

/// What a tick does to the samples under the brush.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SculptOperation {
    #[default]
    Raise,
    Lower,
    /// Move toward the height captured at the center on the first tick
    Flatten,
    /// Average each sample with its loaded neighbours
    Smooth,
}

impl SculptOperation {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Raise => "Raise",
            Self::Lower => "Lower",
            Self::Flatten => "Flatten",
            Self::Smooth => "Smooth",
        }
    }

    pub fn all() -> [SculptOperation; 4] {
        [Self::Raise, Self::Lower, Self::Flatten, Self::Smooth]
    }
}

/// Brush footprint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BrushShape {
    /// Chebyshev distance in cells
    #[default]
    Square,
    /// Euclidean distance in cells
    Circle,
}

/// Sculpt brush parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SculptSettings {
    pub operation: SculptOperation,
    pub shape: BrushShape,
    /// Cells from the center still affected
    pub outer_radius: u32,
    /// Cells from the center at full intensity (0 = whole brush)
    pub inner_radius: u32,
    /// Strength; each tick moves heights by `power / 10`
    pub power: f32,
}

impl Default for SculptSettings {
    fn default() -> Self {
        Self {
            operation: SculptOperation::Raise,
            shape: BrushShape::Square,
            outer_radius: 3,
            inner_radius: 0,
            power: 10.0,
        }
    }
}

impl SculptSettings {
    /// Height change per tick at full intensity.
    pub fn step(&self) -> f32 {
        self.power / 10.0
    }

    /// Intensity factor for a sample (dx, dy) cells from the center, or
    /// `None` outside the brush.
    pub fn falloff(&self, dx: i32, dy: i32) -> Option<f32> {
        let outer = self.outer_radius as f32;
        let inner = self.inner_radius as f32;
        match self.shape {
            BrushShape::Square => {
                let d = dx.unsigned_abs().max(dy.unsigned_abs());
                if d > self.outer_radius {
                    None
                } else if self.inner_radius == 0 || d <= self.inner_radius {
                    Some(1.0)
                } else {
                    Some(1.0 / (d - self.inner_radius) as f32)
                }
            }
            BrushShape::Circle => {
                let dist = ((dx * dx + dy * dy) as f32).sqrt();
                if dist > outer {
                    None
                } else if self.inner_radius == 0 || dist <= inner {
                    Some(1.0)
                } else {
                    let delta = outer - inner;
                    let past = dist - inner;
                    Some((delta * delta - past * past).max(0.0).sqrt() / delta)
                }
            }
        }
    }
}

// ============================================================================
// SCULPTOR
// ============================================================================

/// Height-field brush with stroke recording.
#[derive(Debug, Default)]
pub struct HeightSculptor {
    settings: SculptSettings,
    flatten_target: Option<f32>,
    /// Pre-stroke height fields of touched blocks, present while stroking
    stroke: Option<BTreeMap<BlockCoord, HeightField>>,
}

impl HeightSculptor {
    pub fn new(settings: SculptSettings) -> Self {
        Self {
            settings,
            flatten_target: None,
            stroke: None,
        }
    }

    pub fn settings(&self) -> &SculptSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut SculptSettings {
        &mut self.settings
    }

    /// Height Flatten is steering toward in the current stroke.
    pub fn flatten_target(&self) -> Option<f32> {
        self.flatten_target
    }

    pub fn is_stroking(&self) -> bool {
        self.stroke.is_some()
    }

    /// Start recording a stroke. An unfinished stroke is discarded.
    pub fn begin_stroke(&mut self) {
        self.stroke = Some(BTreeMap::new());
        self.flatten_target = None;
        debug!("Sculpt stroke started ({})", self.settings.operation.label());
    }

    /// Finish the stroke; `None` when it touched nothing.
    pub fn end_stroke(&mut self, grid: &TerrainGrid) -> Option<TerrainCommand> {
        let before = self.stroke.take()?;
        self.flatten_target = None;

        let blocks: Vec<HeightSnapshot> = before
            .into_iter()
            .filter_map(|(coord, before)| {
                grid.get(coord).map(|block| HeightSnapshot {
                    coord,
                    before,
                    after: block.heights().clone(),
                })
            })
            .collect();
        debug!("Sculpt stroke ended: {} blocks touched", blocks.len());

        if blocks.is_empty() {
            None
        } else {
            Some(TerrainCommand::HeightStroke { blocks })
        }
    }

    /// Drop the open stroke without recording it.
    pub fn cancel_stroke(&mut self) {
        if self.stroke.take().is_some() {
            debug!("Sculpt stroke cancelled");
        }
        self.flatten_target = None;
    }

    /// Apply one tick centered on the sample nearest to `point`.
    ///
    /// `first_tick` marks the first tick of a drag; Flatten captures its
    /// target then. Returns the blocks whose geometry was rebuilt.
    pub fn apply_tick(&mut self, grid: &mut TerrainGrid, point: Vec3, first_tick: bool) -> BTreeSet<BlockCoord> {
        let center = grid.config().world_to_sample(point.x, point.y);
        let settings = self.settings;

        if settings.operation == SculptOperation::Flatten && (first_tick || self.flatten_target.is_none()) {
            let target = grid.get_height(center).unwrap_or(point.z);
            self.flatten_target = Some(target);
            debug!("Flatten target captured: {target}");
        }

        let edits = self.compute_edits(grid, center);

        let mut dirty = BTreeSet::new();
        for &(sample, height) in &edits {
            self.record_before(grid, sample);
            grid.set_height(sample, height, &mut dirty);
        }
        grid.rebuild_blocks(&dirty);
        dirty
    }

    /// New heights for every loaded sample under the brush, all computed
    /// from the pre-tick state.
    fn compute_edits(&self, grid: &TerrainGrid, center: SampleCoord) -> Vec<(SampleCoord, f32)> {
        let settings = &self.settings;
        let step = settings.step();
        let radius = settings.outer_radius as i32;
        let mut edits = Vec::new();

        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let Some(factor) = settings.falloff(dx, dy) else {
                    continue;
                };
                let sample = center.offset(dx, dy);
                let Some(height) = grid.get_height(sample) else {
                    continue;
                };

                let new_height = match settings.operation {
                    SculptOperation::Raise => height + step * factor,
                    SculptOperation::Lower => height - step * factor,
                    SculptOperation::Flatten => match self.flatten_target {
                        Some(target) => approach(height, target, step * factor),
                        None => height,
                    },
                    SculptOperation::Smooth => neighbourhood_mean(grid, sample, height),
                };
                if new_height != height {
                    edits.push((sample, new_height));
                }
            }
        }
        edits
    }

    /// Snapshot every loaded block holding `sample` before its first write.
    fn record_before(&mut self, grid: &TerrainGrid, sample: SampleCoord) {
        let Some(stroke) = self.stroke.as_mut() else {
            return;
        };
        for (coord, _, _) in grid.config().sample_slots(sample) {
            if stroke.contains_key(&coord) {
                continue;
            }
            if let Some(block) = grid.get(coord) {
                stroke.insert(coord, block.heights().clone());
            }
        }
    }
}

/// Move `height` toward `target` by at most `max_step`, never past it.
fn approach(height: f32, target: f32, max_step: f32) -> f32 {
    let diff = target - height;
    if diff.abs() <= max_step {
        target
    } else {
        height + max_step.copysign(diff)
    }
}

/// Mean of a sample and its loaded 8-neighbours.
fn neighbourhood_mean(grid: &TerrainGrid, sample: SampleCoord, height: f32) -> f32 {
    let mut sum = height;
    let mut count = 1.0;
    for dy in -1..=1 {
        for dx in -1..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }
            if let Some(h) = grid.get_height(sample.offset(dx, dy)) {
                sum += h;
                count += 1.0;
            }
        }
    }
    sum / count
}
