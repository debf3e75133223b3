//! Gravity module - per-column compaction after a clear
//!
//! Each column is packed downward independently with a two-pointer scan from
//! the bottom: tiles keep their relative order, never change column, and every
//! slot above the packed stack becomes empty. Compacting a compact grid is a no-op.

use crate::grid::Grid;
use crate::types::{GRID_HEIGHT, GRID_WIDTH};

/// Compact every column of `grid` in place.
///
/// Returns true if any tile moved.
pub fn compact(grid: &mut Grid) -> bool {
    let width = GRID_WIDTH as usize;
    let height = GRID_HEIGHT as usize;
    let cells = grid.cells_mut();
    let mut moved = false;

    for col in 0..width {
        let mut write_row = height;

        for read_row in (0..height).rev() {
            let read = read_row * width + col;
            if cells[read].is_none() {
                continue;
            }
            write_row -= 1;
            if write_row != read_row {
                let tile = cells[read].take();
                cells[write_row * width + col] = tile;
                moved = true;
            }
        }
    }

    moved
}

/// True if no column has an empty cell below a tile.
pub fn is_compact(grid: &Grid) -> bool {
    let width = GRID_WIDTH as usize;
    let cells = grid.cells();
    (0..width).all(|col| {
        let mut seen_tile = false;
        for row in 0..GRID_HEIGHT as usize {
            match cells[row * width + col] {
                Some(_) => seen_tile = true,
                None if seen_tile => return false,
                None => {}
            }
        }
        true
    })
}
