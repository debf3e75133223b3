//! Selection and sum evaluation
//!
//! A selection is an insertion-ordered set of distinct coordinates. Order only
//! matters to presentation; evaluation compares the sum of the selected values
//! against the target.

use arrayvec::ArrayVec;

use crate::grid::Grid;
use crate::types::{Coord, GRID_SIZE};

/// Result of comparing a selection's sum with the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluation {
    /// Sum is below the target; keep selecting.
    Pending,
    /// Sum equals the target; clear the selection.
    Match,
    /// Sum is above the target; reject the selection.
    Overshoot,
}

/// Selected coordinates, at most one entry per grid cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Selection {
    coords: ArrayVec<Coord, GRID_SIZE>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, at: Coord) -> bool {
        self.coords.contains(&at)
    }

    /// Add `at`, or remove it when already selected.
    ///
    /// Returns true if `at` is selected afterwards.
    pub fn toggle(&mut self, at: Coord) -> bool {
        if let Some(pos) = self.coords.iter().position(|c| *c == at) {
            self.coords.remove(pos);
            return false;
        }
        // Capacity equals the cell count and entries are distinct, so this only
        // fails for out-of-range coordinates, which callers filter first.
        self.coords.try_push(at).is_ok()
    }

    pub fn clear(&mut self) {
        self.coords.clear();
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    pub fn as_slice(&self) -> &[Coord] {
        &self.coords
    }

    pub fn iter(&self) -> impl Iterator<Item = &Coord> {
        self.coords.iter()
    }

    /// Move every entry one row up, following an injection. Entries already on
    /// the top row are dropped.
    pub fn shift_up(&mut self) {
        self.coords.retain(|c| c.row > 0);
        for c in self.coords.iter_mut() {
            c.row -= 1;
        }
    }

    /// Drop entries whose cell is no longer occupied.
    pub fn retain_occupied(&mut self, grid: &Grid) {
        self.coords.retain(|c| grid.is_occupied(*c));
    }
}

/// Sum of the selected tile values. Empty cells contribute nothing.
pub fn selection_sum(selection: &Selection, grid: &Grid) -> u32 {
    selection
        .iter()
        .filter_map(|&at| grid.tile(at))
        .map(|t| t.value as u32)
        .sum()
}

/// Compare the selection against `target`.
pub fn evaluate(selection: &Selection, grid: &Grid, target: u32) -> (u32, Evaluation) {
    let sum = selection_sum(selection, grid);
    let eval = match sum.cmp(&target) {
        std::cmp::Ordering::Less => Evaluation::Pending,
        std::cmp::Ordering::Equal => Evaluation::Match,
        std::cmp::Ordering::Greater => Evaluation::Overshoot,
    };
    (sum, eval)
}
