//! Core types module - shared data structures and constants
//!
//! This module defines the fundamental types used throughout the application.
//! All types are pure data structures with no external dependencies, making them
//! usable in any context (core logic, terminal rendering, adapter protocol).
//!
//! # Grid Dimensions
//!
//! - **Width**: 6 columns (indexed 0-5, left to right)
//! - **Height**: 6 rows (indexed 0-5, top to bottom)
//! - **Danger zone**: row 0. A tile there when a row is injected ends the game.
//!
//! # Gameplay Constants
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `NUMBER_MIN..=NUMBER_MAX` | 1..=9 | Tile values |
//! | `TARGET_MIN..=TARGET_MAX` | 10..=25 | Target sums |
//! | `POINTS_PER_TILE` | 10 | Score per cleared tile |
//! | `TIME_LIMIT_MS` | 15000 | Timed-mode injection period |
//! | `REJECT_FEEDBACK_MS` | 400 | Overshoot feedback window |
//! | `TICK_MS` | 16 | Game loop tick (~60 FPS) |
//!
//! # Examples
//!
//! ```
//! use sumtiles_types::{Coord, Mode, GameStatus, GRID_WIDTH, GRID_HEIGHT};
//!
//! assert_eq!(Mode::from_str("timed"), Some(Mode::Timed));
//! assert_eq!(Mode::Classic.as_str(), "classic");
//! assert_eq!(GameStatus::Over.as_str(), "over");
//!
//! let c = Coord::new(5, 0);
//! assert!(c.in_bounds());
//! assert_eq!(c.index(), 30);
//!
//! assert_eq!(GRID_WIDTH, 6);
//! assert_eq!(GRID_HEIGHT, 6);
//! ```

/// Grid width in cells (6 columns)
pub const GRID_WIDTH: u8 = 6;

/// Grid height in cells (6 rows)
pub const GRID_HEIGHT: u8 = 6;

/// Total number of cells on the grid
pub const GRID_SIZE: usize = (GRID_WIDTH as usize) * (GRID_HEIGHT as usize);

/// Smallest tile value
pub const NUMBER_MIN: u8 = 1;

/// Largest tile value
pub const NUMBER_MAX: u8 = 9;

/// Smallest target sum
pub const TARGET_MIN: u32 = 10;

/// Largest target sum
pub const TARGET_MAX: u32 = 25;

/// Points awarded per cleared tile
pub const POINTS_PER_TILE: u32 = 10;

/// Timed mode: a row is injected every 15 seconds without a clear
pub const TIME_LIMIT_MS: u32 = 15_000;

/// How long an overshooting selection stays visible before it is dropped
pub const REJECT_FEEDBACK_MS: u32 = 400;

/// Rows injected when a session starts
pub const INITIAL_ROWS: u8 = 3;

/// Fixed game loop interval in milliseconds (16ms ≈ 60 FPS)
pub const TICK_MS: u32 = 16;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gameplay_defaults() {
        assert_eq!(GRID_SIZE, 36);
        assert!(NUMBER_MIN < NUMBER_MAX);
        assert!(TARGET_MIN < TARGET_MAX);
        assert_eq!(POINTS_PER_TILE, 10);
        assert_eq!(TIME_LIMIT_MS, 15_000);
        assert_eq!(REJECT_FEEDBACK_MS, 400);
        // Starting rows must leave the danger zone empty.
        assert!(INITIAL_ROWS < GRID_HEIGHT);
    }

    #[test]
    fn coord_index_and_bounds() {
        assert_eq!(Coord::new(0, 0).index(), 0);
        assert_eq!(Coord::new(0, 5).index(), 5);
        assert_eq!(Coord::new(1, 0).index(), 6);
        assert!(!Coord::new(6, 0).in_bounds());
        assert!(!Coord::new(0, 6).in_bounds());
        assert_eq!(Coord::checked(-1, 0), None);
        assert_eq!(Coord::checked(2, 3), Some(Coord::new(2, 3)));
        assert_eq!(Coord::checked(2, 6), None);
    }
}

/// A single numbered tile.
///
/// `id` only exists so that presentation can follow a tile across compaction
/// and injection; game rules never look at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tile {
    pub id: u32,
    pub value: u8,
    pub is_new: bool,
}

impl Tile {
    pub fn new(id: u32, value: u8) -> Self {
        Self {
            id,
            value,
            is_new: true,
        }
    }
}

/// A cell on the grid
///
/// - `None`: Empty cell
/// - `Some(Tile)`: Cell holding a tile
pub type Cell = Option<Tile>;

/// Grid coordinate. Row 0 is the top (danger zone).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coord {
    pub row: u8,
    pub col: u8,
}

impl Coord {
    pub const fn new(row: u8, col: u8) -> Self {
        Self { row, col }
    }

    /// Build a coordinate from untrusted signed input, rejecting anything off-grid.
    pub fn checked(row: i64, col: i64) -> Option<Self> {
        if row < 0 || col < 0 || row >= GRID_HEIGHT as i64 || col >= GRID_WIDTH as i64 {
            return None;
        }
        Some(Self::new(row as u8, col as u8))
    }

    #[inline(always)]
    pub fn in_bounds(&self) -> bool {
        self.row < GRID_HEIGHT && self.col < GRID_WIDTH
    }

    /// Row-major flat index (`row * GRID_WIDTH + col`). Only meaningful when in bounds.
    #[inline(always)]
    pub fn index(&self) -> usize {
        (self.row as usize) * (GRID_WIDTH as usize) + (self.col as usize)
    }
}

/// Game mode, chosen when a session starts and fixed for its lifetime.
///
/// - **Classic**: a row is injected after every successful clear
/// - **Timed**: a row is injected whenever the timer runs out; clears reset the timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Classic,
    Timed,
}

impl Mode {
    /// Parse mode from string (case-insensitive)
    ///
    /// # Examples
    ///
    /// ```
    /// use sumtiles_types::Mode;
    ///
    /// assert_eq!(Mode::from_str("Classic"), Some(Mode::Classic));
    /// assert_eq!(Mode::from_str("TIMED"), Some(Mode::Timed));
    /// assert_eq!(Mode::from_str("zen"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "classic" => Some(Mode::Classic),
            "timed" => Some(Mode::Timed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Classic => "classic",
            Mode::Timed => "timed",
        }
    }
}

/// Session status. `Over` is terminal for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameStatus {
    Active,
    Paused,
    Over,
}

impl GameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::Active => "active",
            GameStatus::Paused => "paused",
            GameStatus::Over => "over",
        }
    }
}

/// Commands that drive the engine
///
/// These are produced by both human input and the adapter protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Discard any session and start a new one in the given mode
    StartGame(Mode),
    /// Select or deselect the tile at a coordinate
    ToggleCell(Coord),
    /// Pause or resume the current session
    TogglePause,
    /// Start a new session in the current mode
    Restart,
    /// Discard the session and return to mode selection
    ExitToMenu,
}

impl Command {
    /// Protocol name of the command (camelCase)
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::StartGame(_) => "startGame",
            Command::ToggleCell(_) => "toggleCell",
            Command::TogglePause => "togglePause",
            Command::Restart => "restart",
            Command::ExitToMenu => "exitToMenu",
        }
    }
}

/// Core-side event emitted by the most recent transition.
///
/// Consumed by observers (terminal flash, adapter `last_event`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoreEvent {
    /// A matching selection was removed.
    Cleared { tiles: u32, points: u32 },
    /// A selection overshot the target.
    Rejected { sum: u32 },
    /// A new bottom row was pushed in.
    RowInjected,
    /// Injection found the danger zone occupied.
    GameOver,
}

impl CoreEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoreEvent::Cleared { .. } => "cleared",
            CoreEvent::Rejected { .. } => "rejected",
            CoreEvent::RowInjected => "rowInjected",
            CoreEvent::GameOver => "gameOver",
        }
    }
}
