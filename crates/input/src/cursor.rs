//! Keyboard cursor over the grid.

use crate::map::{Direction, InputAction};
use crate::types::{Command, Coord, GRID_HEIGHT, GRID_WIDTH};

/// Highlighted cell for keyboard play. Starts on the bottom-left cell, where
/// tiles first appear, and is clamped to the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    at: Coord,
}

impl Cursor {
    pub fn new() -> Self {
        Self {
            at: Coord::new(GRID_HEIGHT - 1, 0),
        }
    }

    pub fn coord(&self) -> Coord {
        self.at
    }

    /// Jump to `at` (e.g. after a mouse click). Off-grid targets are ignored.
    pub fn set(&mut self, at: Coord) {
        if at.in_bounds() {
            self.at = at;
        }
    }

    pub fn step(&mut self, dir: Direction) {
        let Coord { row, col } = self.at;
        self.at = match dir {
            Direction::Up => Coord::new(row.saturating_sub(1), col),
            Direction::Down => Coord::new((row + 1).min(GRID_HEIGHT - 1), col),
            Direction::Left => Coord::new(row, col.saturating_sub(1)),
            Direction::Right => Coord::new(row, (col + 1).min(GRID_WIDTH - 1)),
        };
    }

    /// Resolve an input action against the cursor. Movement is consumed here;
    /// everything else becomes a command.
    pub fn apply(&mut self, action: InputAction) -> Option<Command> {
        match action {
            InputAction::MoveCursor(dir) => {
                self.step(dir);
                None
            }
            InputAction::ToggleCell => Some(Command::ToggleCell(self.at)),
            InputAction::StartGame(mode) => Some(Command::StartGame(mode)),
            InputAction::Pause => Some(Command::TogglePause),
            InputAction::Restart => Some(Command::Restart),
            InputAction::ExitToMenu => Some(Command::ExitToMenu),
        }
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Self::new()
    }
}
