//! Row injection - the only pressure mechanism and the only way to lose
//!
//! Injection refuses to run when the danger zone (row 0) holds a tile and
//! reports game over instead, leaving the grid untouched. Otherwise every row
//! moves up one (row i takes row i+1) and the bottom row is refilled with
//! fresh tiles.

use crate::grid::Grid;
use crate::rng::TileSource;
use crate::types::{GRID_HEIGHT, GRID_WIDTH};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectOutcome {
    /// Rows shifted up and a new bottom row was added.
    Injected,
    /// Row 0 was occupied; the grid is unchanged.
    GameOver,
}

/// Push a fresh row in from the bottom.
///
/// Tiles from earlier injections lose their `is_new` flag so only the newest
/// row is marked.
pub fn inject(grid: &mut Grid, tiles: &mut TileSource) -> InjectOutcome {
    if !grid.is_row_empty(0) {
        return InjectOutcome::GameOver;
    }

    let cells = grid.cells_mut();
    for cell in cells.iter_mut().flatten() {
        cell.is_new = false;
    }
    // Row 0 is empty, so dropping it loses nothing.
    cells.copy_within(GRID_WIDTH as usize.., 0);

    if let Err(e) = grid.set_row(GRID_HEIGHT - 1, tiles.next_row()) {
        log::error!("inject: {}", e);
        debug_assert!(false, "inject: {}", e);
    }

    InjectOutcome::Injected
}
