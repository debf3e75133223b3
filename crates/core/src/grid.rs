//! Grid module - the 6x6 tile field
//!
//! The grid is a flat, row-major array of cells, each empty or holding a tile.
//! Coordinates are `(row, col)`: row 0 is the top (danger zone), row 5 the bottom.
//! Outside this crate the grid changes only through `remove_at` and `set_row`.
//! Compaction and injection also shift cells in place via `cells_mut`.

use thiserror::Error;

use crate::types::{Cell, Coord, Tile, GRID_HEIGHT, GRID_SIZE, GRID_WIDTH, NUMBER_MAX, NUMBER_MIN};

/// Grid precondition violations. These indicate a bug in the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("invalid coordinate ({row}, {col}): out of bounds or already empty")]
    InvalidCoordinate { row: u8, col: u8 },
    #[error("invalid row index {0}")]
    InvalidRow(u8),
}

/// The tile field - 6 columns x 6 rows using flat array storage
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Grid {
    /// Row-major cells (row * WIDTH + col)
    cells: [Cell; GRID_SIZE],
}

impl Grid {
    /// Create a new empty grid
    pub fn new() -> Self {
        Self {
            cells: [None; GRID_SIZE],
        }
    }

    pub fn width(&self) -> u8 {
        GRID_WIDTH
    }

    pub fn height(&self) -> u8 {
        GRID_HEIGHT
    }

    /// Get the cell at a coordinate, `None` when out of bounds
    pub fn get(&self, at: Coord) -> Option<Cell> {
        at.in_bounds().then(|| self.cells[at.index()])
    }

    /// Tile at a coordinate, `None` when empty or out of bounds
    pub fn tile(&self, at: Coord) -> Option<Tile> {
        self.get(at).flatten()
    }

    pub fn is_occupied(&self, at: Coord) -> bool {
        matches!(self.get(at), Some(Some(_)))
    }

    /// Empty every listed coordinate.
    ///
    /// All coordinates are validated first; on error nothing is removed.
    /// A coordinate listed twice counts as already empty the second time.
    pub fn remove_at(&mut self, coords: &[Coord]) -> Result<(), GridError> {
        for (i, &at) in coords.iter().enumerate() {
            let duplicate = coords[..i].contains(&at);
            if duplicate || !self.is_occupied(at) {
                return Err(GridError::InvalidCoordinate {
                    row: at.row,
                    col: at.col,
                });
            }
        }

        for at in coords {
            self.cells[at.index()] = None;
        }
        Ok(())
    }

    /// Replace a whole row.
    pub fn set_row(&mut self, row: u8, tiles: [Cell; GRID_WIDTH as usize]) -> Result<(), GridError> {
        if row >= GRID_HEIGHT {
            return Err(GridError::InvalidRow(row));
        }
        let start = row as usize * GRID_WIDTH as usize;
        self.cells[start..start + GRID_WIDTH as usize].copy_from_slice(&tiles);
        Ok(())
    }

    /// Borrow one row, `None` when out of range
    pub fn row(&self, row: u8) -> Option<&[Cell]> {
        if row >= GRID_HEIGHT {
            return None;
        }
        let start = row as usize * GRID_WIDTH as usize;
        Some(&self.cells[start..start + GRID_WIDTH as usize])
    }

    pub fn is_row_empty(&self, row: u8) -> bool {
        self.row(row)
            .map(|cells| cells.iter().all(|c| c.is_none()))
            .unwrap_or(true)
    }

    /// Number of tiles on the grid
    pub fn tile_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|c| c.is_none())
    }

    /// Check the value invariant: every tile is within `[NUMBER_MIN, NUMBER_MAX]`.
    pub fn values_in_range(&self) -> bool {
        self.cells
            .iter()
            .flatten()
            .all(|t| (NUMBER_MIN..=NUMBER_MAX).contains(&t.value))
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [Cell; GRID_SIZE] {
        &mut self.cells
    }

    /// Empty the whole grid
    pub fn clear(&mut self) {
        self.cells.fill(None);
    }

    /// Write tile values into a `u8` grid (0 = empty).
    pub fn write_values(&self, out: &mut [[u8; GRID_WIDTH as usize]; GRID_HEIGHT as usize]) {
        let width = GRID_WIDTH as usize;
        for (i, cell) in self.cells.iter().enumerate() {
            out[i / width][i % width] = cell.map(|t| t.value).unwrap_or(0);
        }
    }

    /// Build a grid from a value table (0 = empty). Tile ids are assigned
    /// row-major starting at 1; no tile is marked new.
    ///
    /// Intended for fixtures and tooling.
    pub fn from_values(values: [[u8; GRID_WIDTH as usize]; GRID_HEIGHT as usize]) -> Self {
        let mut grid = Self::new();
        let mut next_id = 1u32;
        for (r, row) in values.iter().enumerate() {
            for (c, &v) in row.iter().enumerate() {
                if v != 0 {
                    grid.cells[r * GRID_WIDTH as usize + c] = Some(Tile {
                        id: next_id,
                        value: v,
                        is_new: false,
                    });
                    next_id += 1;
                }
            }
        }
        grid
    }

    /// Inverse of `from_values`.
    pub fn to_values(&self) -> [[u8; GRID_WIDTH as usize]; GRID_HEIGHT as usize] {
        let mut out = [[0u8; GRID_WIDTH as usize]; GRID_HEIGHT as usize];
        self.write_values(&mut out);
        out
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::new()
    }
}
