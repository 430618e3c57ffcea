//! Brush Autotiling
//!
//! Painting a brush on a tile also re-blends its 8 neighbours so edges and
//! corners between ground types line up.
//!
//! ## Tile index
//! A tile's `tile_index` is a 4-bit mask of the corners covered by its
//! tileset's `maximum_brush`; the other corners show `minimum_brush`:
//!
//! ```text
//!   NW(8) ---- NE(4)
//!     |          |
//!   SW(2) ---- SE(1)
//! ```
//!
//! ## Resolution
//! Neighbours are resolved in a fixed order (NW, N, NE, W, E, SW, S, SE),
//! then the painted tile gets the full tile of its brush. For a neighbour
//! whose tileset has minimum brush `Q`, painting brush `P`:
//!
//! 1. `chains[P][Q]` names a brush (or `P` belongs to the set): the tileset
//!    stays and the shared corners are OR-ed into the index. When `P`
//!    meets the set from its minimum side the index is complemented around
//!    the OR.
//! 2. No chain: a tileset blending `P` and `Q` directly takes over.
//! 3. Neither: a compound blend. The cells on that side of the painted tile
//!    are re-resolved with the brush bridging `P` and `Q`, then the
//!    neighbour is retried once.
//!
//! Jobs run from a bounded worklist. A neighbour nothing can blend keeps its
//! tile.

use std::collections::{BTreeSet, VecDeque};
use std::sync::Arc;

use log::{debug, warn};

use crate::terrain::{BrushSet, BrushTable, FULL_TILE_INDEX, TerrainGrid, TileCell};
use crate::undo::TileChange;
use crate::world::{BlockCoord, TILES_PER_BLOCK, TileCoord};

pub const CORNER_SE: u8 = 1;
pub const CORNER_SW: u8 = 2;
pub const CORNER_NE: u8 = 4;
pub const CORNER_NW: u8 = 8;
pub const CORNER_ALL: u8 = CORNER_SE | CORNER_SW | CORNER_NE | CORNER_NW;

/// Neighbour offsets (dx, dy) and the corners each shares with the painted
/// cell, in resolution order. The painted cell itself is resolved last.
pub const NEIGHBOURS: [(i32, i32, u8); 8] = [
    (-1, -1, CORNER_SE),
    (0, -1, CORNER_SE | CORNER_SW),
    (1, -1, CORNER_SW),
    (-1, 0, CORNER_SE | CORNER_NE),
    (1, 0, CORNER_SW | CORNER_NW),
    (-1, 1, CORNER_NE),
    (0, 1, CORNER_NE | CORNER_NW),
    (1, 1, CORNER_NW),
];

/// Worklist jobs allowed for one paint.
pub const MAX_RESOLVE_STEPS: usize = 64;

/// Corners the cell at (dx, dy) shares with the painted cell.
pub fn shared_corners(dx: i32, dy: i32) -> u8 {
    NEIGHBOURS
        .iter()
        .find(|&&(x, y, _)| x == dx && y == dy)
        .map_or(CORNER_ALL, |&(_, _, mask)| mask)
}

/// Outcome of resolving one cell against the brush table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// New assignment for the cell
    Tile(TileCell),
    /// No tileset blends the two brushes; `via` bridges them
    Compound { via: u8 },
    /// Unsupported adjacency
    Unresolved,
}

/// One (cell, brush) entry of the paint worklist, relative to the painted cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Job {
    dx: i32,
    dy: i32,
    brush: u8,
    retry: bool,
}

impl Job {
    fn new(dx: i32, dy: i32, brush: u8) -> Self {
        Self {
            dx,
            dy,
            brush,
            retry: false,
        }
    }

    fn is_center(&self) -> bool {
        self.dx == 0 && self.dy == 0
    }
}

/// Resolves painted brushes into blended tiles.
#[derive(Debug, Clone)]
pub struct AutotileResolver {
    brushes: Arc<BrushTable>,
}

impl AutotileResolver {
    pub fn new(brushes: Arc<BrushTable>) -> Self {
        Self { brushes }
    }

    pub fn brushes(&self) -> &Arc<BrushTable> {
        &self.brushes
    }

    /// Paint `brush` on one tile and re-blend its 8 neighbours.
    ///
    /// Cells in empty slots are skipped. Returns every cell whose tile id
    /// changed, in application order.
    pub fn paint(&self, grid: &mut TerrainGrid, block: BlockCoord, tile: TileCoord, brush: u8) -> Vec<TileChange> {
        if brush as usize >= self.brushes.brush_count() {
            warn!("Brush {brush} is not in the brush table ({} brushes)", self.brushes.brush_count());
            return Vec::new();
        }

        let mut worklist: VecDeque<Job> = NEIGHBOURS
            .iter()
            .map(|&(dx, dy, _)| Job::new(dx, dy, brush))
            .chain(std::iter::once(Job::new(0, 0, brush)))
            .collect();
        let mut expanded = BTreeSet::new();
        let mut changes = Vec::new();
        let mut steps = 0;

        while let Some(job) = worklist.pop_front() {
            steps += 1;
            if steps > MAX_RESOLVE_STEPS {
                warn!(
                    "Painting brush {brush} exceeded {MAX_RESOLVE_STEPS} resolve steps; {} jobs dropped",
                    worklist.len() + 1
                );
                break;
            }

            let Some((coord, target)) = neighbour_tile(block, tile, job.dx, job.dy) else {
                continue;
            };
            let Some(old) = grid.tile(coord, target) else {
                continue;
            };

            let resolution = if job.is_center() {
                self.fill_cell(job.brush)
            } else {
                self.resolve_cell(old, shared_corners(job.dx, job.dy), job.brush)
            };

            match resolution {
                Resolution::Tile(new) => {
                    if new.tile_id != old.tile_id {
                        grid.change_tile(coord, target, new);
                        changes.push(TileChange {
                            block: coord,
                            tile: target,
                            old,
                            new,
                        });
                    }
                }
                Resolution::Compound { via } => {
                    if job.retry {
                        debug!(
                            "Block ({}, {}) tile ({}, {}) keeps its blend through brush {via}",
                            coord.x, coord.y, target.x, target.y
                        );
                    } else if expanded.insert((job.dx, job.dy, job.brush)) {
                        // Side cells first, then the neighbour again
                        worklist.push_front(Job { retry: true, ..job });
                        for (dx, dy) in side_cells(job.dx, job.dy).into_iter().rev() {
                            worklist.push_front(Job::new(dx, dy, via));
                        }
                    } else {
                        warn_unresolved(job.brush, coord, target);
                    }
                }
                Resolution::Unresolved => warn_unresolved(job.brush, coord, target),
            }
        }

        debug!(
            "Painted brush {brush} at block ({}, {}) tile ({}, {}): {} cells changed",
            block.x,
            block.y,
            tile.x,
            tile.y,
            changes.len()
        );
        changes
    }

    /// Full tile of `brush` for the painted cell.
    pub fn fill_cell(&self, brush: u8) -> Resolution {
        match self.brushes.full_fill(brush) {
            Some((tile_set, tile_index)) => match self.brushes.tile_id(tile_set, tile_index) {
                Some(tile_id) => Resolution::Tile(TileCell::new(brush, tile_set, tile_index, tile_id)),
                None => Resolution::Unresolved,
            },
            None => Resolution::Unresolved,
        }
    }

    /// Resolve a neighbour after `brush` covers the corners in `mask`.
    pub fn resolve_cell(&self, cell: TileCell, mask: u8, brush: u8) -> Resolution {
        let set = self.brushes.set(cell.tile_set);
        let minimum = set.map_or(cell.brush_id, |s| s.minimum_brush);
        let partial = cell.tile_index & CORNER_ALL;

        match set {
            Some(set) => {
                let member = set.minimum_brush == brush || set.maximum_brush == brush;
                if member || self.brushes.chain(brush, minimum).is_some() {
                    let tile_index = if self.meets_minimum_side(set, brush) {
                        FULL_TILE_INDEX - ((FULL_TILE_INDEX - partial) | mask)
                    } else {
                        partial | mask
                    };
                    return Resolution::Tile(TileCell::new(
                        cell.brush_id,
                        cell.tile_set,
                        tile_index,
                        set.tile_id(tile_index),
                    ));
                }
            }
            // Unknown set: the cell shows its own brush everywhere
            None if cell.brush_id == brush => return Resolution::Tile(cell),
            None => {}
        }

        if let Some(tile_set) = self.brushes.find_pair(brush, minimum) {
            if let Some(pair) = self.brushes.set(tile_set) {
                let tile_index = if pair.maximum_brush == brush {
                    mask
                } else {
                    FULL_TILE_INDEX - mask
                };
                return Resolution::Tile(TileCell::new(cell.brush_id, tile_set, tile_index, pair.tile_id(tile_index)));
            }
        }

        match self.brushes.find_compound(brush, minimum) {
            Some(via) => Resolution::Compound { via },
            None => Resolution::Unresolved,
        }
    }

    /// True when `brush` reaches `set` from its minimum side: it is the
    /// minimum itself, or the set blending it into its chain brush tops out
    /// at that minimum.
    fn meets_minimum_side(&self, set: &BrushSet, brush: u8) -> bool {
        if brush == set.maximum_brush {
            return false;
        }
        if brush == set.minimum_brush {
            return true;
        }
        self.brushes
            .chain(brush, set.minimum_brush)
            .and_then(|via| self.brushes.find_pair(brush, via))
            .and_then(|matched| self.brushes.set(matched))
            .is_some_and(|matched| matched.maximum_brush == set.minimum_brush)
    }
}

fn warn_unresolved(brush: u8, coord: BlockCoord, tile: TileCoord) {
    warn!(
        "No tileset blends brush {brush} into block ({}, {}) tile ({}, {}); tile left unchanged",
        coord.x, coord.y, tile.x, tile.y
    );
}

/// Cells on the side of the painted cell facing (dx, dy): the two
/// edge-sharing cells and the corner itself.
fn side_cells(dx: i32, dy: i32) -> Vec<(i32, i32)> {
    let mut cells = Vec::with_capacity(3);
    for cell in [(dx, 0), (0, dy), (dx, dy)] {
        if cell != (0, 0) && !cells.contains(&cell) {
            cells.push(cell);
        }
    }
    cells
}

/// Block and tile at (dx, dy) tiles from `tile`, crossing block borders.
pub fn neighbour_tile(block: BlockCoord, tile: TileCoord, dx: i32, dy: i32) -> Option<(BlockCoord, TileCoord)> {
    let per_block = TILES_PER_BLOCK as i32;
    let gx = block.x.checked_mul(per_block)? + tile.x as i32 + dx;
    let gy = block.y.checked_mul(per_block)? + tile.y as i32 + dy;
    Some((
        BlockCoord::new(gx.div_euclid(per_block), gy.div_euclid(per_block)),
        TileCoord::new(gx.rem_euclid(per_block) as usize, gy.rem_euclid(per_block) as usize),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::NO_CHAIN;

    const A: u8 = 0;
    const B: u8 = 1;
    const C: u8 = 2;

    fn set(min: u8, max: u8, tile_number: i32, tile_number_f: i32) -> BrushSet {
        BrushSet {
            minimum_brush: min,
            maximum_brush: max,
            tile_number,
            tile_number_f,
            tile_count: 1,
            direction: 1,
        }
    }

    /// Set 0 blends A (min) with B (max); B and A chain directly.
    fn direct_table() -> BrushTable {
        BrushTable {
            sets: vec![set(A, B, 100, 1)],
            chains: vec![vec![NO_CHAIN, B], vec![A, NO_CHAIN]],
        }
    }

    fn resolver(table: BrushTable) -> AutotileResolver {
        AutotileResolver::new(Arc::new(table))
    }

    fn a_cell() -> TileCell {
        TileCell::new(A, 0, 0, 100)
    }

    #[test]
    fn test_shared_corners() {
        assert_eq!(shared_corners(-1, -1), CORNER_SE);
        assert_eq!(shared_corners(1, 0), CORNER_SW | CORNER_NW);
        assert_eq!(shared_corners(0, 0), CORNER_ALL);
    }

    #[test]
    fn test_side_cells() {
        assert_eq!(side_cells(-1, -1), vec![(-1, 0), (0, -1), (-1, -1)]);
        assert_eq!(side_cells(0, 1), vec![(0, 1)]);
    }

    #[test]
    fn test_center_gets_full_fill() {
        let resolver = resolver(direct_table());
        assert_eq!(resolver.fill_cell(B), Resolution::Tile(TileCell::new(B, 0, 15, 1)));
        assert_eq!(resolver.fill_cell(A), Resolution::Tile(TileCell::new(A, 0, 0, 100)));
    }

    #[test]
    fn test_edge_neighbour_direct_chain() {
        let resolver = resolver(direct_table());
        // Neighbour to the north shares its two southern corners
        let cell = resolver.resolve_cell(a_cell(), CORNER_SE | CORNER_SW, B);
        assert_eq!(cell, Resolution::Tile(TileCell::new(A, 0, 3, 103)));
    }

    #[test]
    fn test_chain_keeps_existing_corners() {
        let resolver = resolver(direct_table());
        let partial = TileCell::new(A, 0, CORNER_NW, 108);
        let cell = resolver.resolve_cell(partial, CORNER_SE, B);
        assert_eq!(cell, Resolution::Tile(TileCell::new(A, 0, 9, 109)));
    }

    #[test]
    fn test_painting_set_minimum_complements_index() {
        // Same blend, but the set lists B as the minimum brush
        let table = BrushTable {
            sets: vec![set(B, A, 100, 1)],
            chains: vec![vec![NO_CHAIN, B], vec![A, NO_CHAIN]],
        };
        let resolver = resolver(table);
        let a_cell = TileCell::new(A, 0, 15, 1);
        let cell = resolver.resolve_cell(a_cell, CORNER_SE | CORNER_SW, B);
        assert_eq!(cell, Resolution::Tile(TileCell::new(A, 0, 15 - 3, 112)));
    }

    #[test]
    fn test_chain_through_other_set_keeps_tileset() {
        // chains[B][A] = C: the A/C neighbour stays in its own set
        let table = BrushTable {
            sets: vec![set(C, B, 100, 1), set(A, C, 200, 2)],
            chains: vec![
                vec![NO_CHAIN, C, C],
                vec![C, NO_CHAIN, C],
                vec![A, B, NO_CHAIN],
            ],
        };
        let resolver = resolver(table);
        let cell = resolver.resolve_cell(TileCell::new(A, 1, 0, 200), CORNER_SE, B);
        assert_eq!(cell, Resolution::Tile(TileCell::new(A, 1, 1, 201)));
    }

    #[test]
    fn test_chain_from_minimum_side_uncovers_corners() {
        // C sits below A: the C/A set tops out at the A/B set's minimum
        let table = BrushTable {
            sets: vec![set(A, B, 100, 1), set(C, A, 200, 2)],
            chains: vec![
                vec![NO_CHAIN, B, C],
                vec![A, NO_CHAIN, A],
                vec![A, A, NO_CHAIN],
            ],
        };
        let resolver = resolver(table);
        let b_cell = TileCell::new(B, 0, 15, 1);
        let cell = resolver.resolve_cell(b_cell, CORNER_SE | CORNER_SW, C);
        assert_eq!(cell, Resolution::Tile(TileCell::new(B, 0, 12, 112)));
    }

    #[test]
    fn test_direct_pair_without_chain_switches_tileset() {
        let table = BrushTable {
            sets: vec![set(A, B, 100, 1), set(C, A, 300, 3)],
            chains: vec![vec![NO_CHAIN; 3]; 3],
        };
        let resolver = resolver(table);
        let cell = resolver.resolve_cell(a_cell(), CORNER_SE, C);
        // Corners still showing A are the C/A set's covered corners
        assert_eq!(cell, Resolution::Tile(TileCell::new(A, 1, 14, 314)));
    }

    #[test]
    fn test_missing_pair_reports_compound_brush() {
        // C and A only meet through B
        let table = BrushTable {
            sets: vec![set(A, B, 100, 1), set(C, B, 300, 3)],
            chains: vec![vec![NO_CHAIN; 3]; 3],
        };
        let resolver = resolver(table);
        assert_eq!(resolver.resolve_cell(a_cell(), CORNER_SE, C), Resolution::Compound { via: B });
    }

    #[test]
    fn test_unsupported_adjacency_is_unresolved() {
        let table = BrushTable {
            sets: vec![set(A, B, 100, 1), set(C, C, 300, 3)],
            chains: vec![vec![NO_CHAIN; 3]; 3],
        };
        let resolver = resolver(table);
        assert_eq!(resolver.resolve_cell(a_cell(), CORNER_SE, C), Resolution::Unresolved);
    }

    #[test]
    fn test_unknown_set_with_same_brush_is_kept() {
        let resolver = resolver(direct_table());
        let cell = TileCell::new(B, 42, 5, 0);
        assert_eq!(resolver.resolve_cell(cell, CORNER_SE, B), Resolution::Tile(cell));
    }

    #[test]
    fn test_neighbour_tile_crosses_blocks() {
        assert_eq!(
            neighbour_tile(BlockCoord::new(1, 1), TileCoord::new(0, 15), -1, 1),
            Some((BlockCoord::new(0, 2), TileCoord::new(15, 0)))
        );
        assert_eq!(
            neighbour_tile(BlockCoord::new(0, 0), TileCoord::new(3, 4), 1, -1),
            Some((BlockCoord::new(0, 0), TileCoord::new(4, 3)))
        );
    }
}
