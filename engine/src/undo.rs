//! Undo/Redo for Terrain Edits
//!
//! Sculpt strokes and brush paints produce a [`TerrainCommand`] holding
//! enough before/after state to reverse or re-apply themselves. The editor
//! decides whether to record them on an [`UndoStack`].
//!
//! # Usage
//!
//! ```ignore
//! use tile_terrain_engine::undo::{UndoStack, TerrainCommand};
//!
//! let mut stack = UndoStack::new();
//! stack.push(command);
//!
//! if let Some(cmd) = stack.undo() {
//!     cmd.undo(&mut grid);
//! }
//! ```

use std::collections::BTreeSet;

use crate::terrain::{HeightField, TerrainGrid, TileCell};
use crate::world::{BlockCoord, TileCoord};

// ============================================================================
// TYPES
// ============================================================================

/// A whole block height field before and after a stroke.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightSnapshot {
    pub coord: BlockCoord,
    pub before: HeightField,
    pub after: HeightField,
}

/// One tile cell rewritten by a paint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileChange {
    pub block: BlockCoord,
    pub tile: TileCoord,
    pub old: TileCell,
    pub new: TileCell,
}

/// An undoable terrain edit.
#[derive(Debug, Clone, PartialEq)]
pub enum TerrainCommand {
    /// One sculpt stroke: every touched block, snapshotted wholesale.
    HeightStroke { blocks: Vec<HeightSnapshot> },
    /// One brush paint: only the cells whose assignment changed.
    TilePaint { changes: Vec<TileChange> },
}

impl TerrainCommand {
    /// Restore the pre-edit state. Blocks no longer loaded are skipped.
    pub fn undo(&self, grid: &mut TerrainGrid) {
        match self {
            TerrainCommand::HeightStroke { blocks } => {
                for snapshot in blocks {
                    grid.replace_heights(snapshot.coord, snapshot.before.clone());
                }
            }
            TerrainCommand::TilePaint { changes } => {
                for change in changes.iter().rev() {
                    grid.change_tile(change.block, change.tile, change.old);
                }
            }
        }
    }

    /// Re-apply the edit.
    pub fn redo(&self, grid: &mut TerrainGrid) {
        match self {
            TerrainCommand::HeightStroke { blocks } => {
                for snapshot in blocks {
                    grid.replace_heights(snapshot.coord, snapshot.after.clone());
                }
            }
            TerrainCommand::TilePaint { changes } => {
                for change in changes {
                    grid.change_tile(change.block, change.tile, change.new);
                }
            }
        }
    }

    /// Blocks the command touches, each listed once.
    pub fn blocks(&self) -> Vec<BlockCoord> {
        let mut seen = BTreeSet::new();
        match self {
            TerrainCommand::HeightStroke { blocks } => {
                for snapshot in blocks {
                    seen.insert(snapshot.coord);
                }
            }
            TerrainCommand::TilePaint { changes } => {
                for change in changes {
                    seen.insert(change.block);
                }
            }
        }
        seen.into_iter().collect()
    }
}

// ============================================================================
// UNDO STACK
// ============================================================================

/// Default number of commands kept in the history.
pub const DEFAULT_UNDO_LIMIT: usize = 50;

/// A bounded undo/redo stack.
///
/// Linear history with a cursor: `[0..cursor]` is undoable, `[cursor..len]`
/// redoable. Pushing after an undo discards the redo history; exceeding the
/// limit drops the oldest command.
#[derive(Debug)]
pub struct UndoStack {
    commands: Vec<TerrainCommand>,
    cursor: usize,
    max_size: usize,
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new()
    }
}

impl UndoStack {
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_UNDO_LIMIT)
    }

    /// Stack keeping at most `limit` commands (at least one).
    pub fn with_limit(limit: usize) -> Self {
        Self {
            commands: Vec::new(),
            cursor: 0,
            max_size: limit.max(1),
        }
    }

    pub fn push(&mut self, command: TerrainCommand) {
        self.commands.truncate(self.cursor);
        self.commands.push(command);
        self.cursor = self.commands.len();

        if self.commands.len() > self.max_size {
            let excess = self.commands.len() - self.max_size;
            self.commands.drain(0..excess);
            self.cursor = self.commands.len();
        }
    }

    /// Step back; returns the command to reverse.
    pub fn undo(&mut self) -> Option<&TerrainCommand> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        Some(&self.commands[self.cursor])
    }

    /// Step forward; returns the command to re-apply.
    pub fn redo(&mut self) -> Option<&TerrainCommand> {
        if self.cursor >= self.commands.len() {
            return None;
        }
        let cmd = &self.commands[self.cursor];
        self.cursor += 1;
        Some(cmd)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.commands.len()
    }

    pub fn undo_count(&self) -> usize {
        self.cursor
    }

    pub fn redo_count(&self) -> usize {
        self.commands.len() - self.cursor
    }

    /// Most recent undoable command.
    pub fn last(&self) -> Option<&TerrainCommand> {
        self.cursor.checked_sub(1).map(|i| &self.commands[i])
    }

    pub fn clear(&mut self) {
        self.commands.clear();
        self.cursor = 0;
    }
}

// ============================================================================
// TESTS
// ============================================================================
