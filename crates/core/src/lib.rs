//! Core game logic - pure, deterministic, and testable
//!
//! This crate holds the rules of the sum-matching tile puzzle: the grid, the
//! selection and its evaluation, column compaction, row injection, scoring and
//! the per-mode injection schedule. It has no dependencies on terminal,
//! networking or file I/O, so the same engine drives the terminal UI, the
//! adapter and headless tests.
//!
//! # Module Structure
//!
//! - [`grid`]: 6x6 tile field with validated removal and row replacement
//! - [`selection`]: ordered selection and sum evaluation against the target
//! - [`gravity`]: column compaction after a clear
//! - [`inject`]: bottom-row injection and the game-over check
//! - [`scheduler`]: Classic/Timed injection policy and the row timer
//! - [`session`]: one play-through, tying the pieces together
//! - [`game`]: menu, sessions and the high score
//! - [`rng`]: seeded tile and target generation
//! - [`scoring`]: clear points and high score
//! - [`snapshot`]: heap-free observation for views and clients
//! - [`config`]: tunables with environment overrides
//!
//! # Time
//!
//! Nothing in this crate reads the clock. Every transition that can depend on
//! time takes `now: Instant`, and timers store deadlines, so tests drive time
//! explicitly and the caller's tick rate never changes game behavior.
//!
//! # Example
//!
//! ```
//! use std::time::Instant;
//! use sumtiles_core::{Game, GameConfig};
//! use sumtiles_types::{Command, Coord, GameStatus, Mode};
//!
//! let now = Instant::now();
//! let mut game = Game::new(GameConfig::default().with_seed(12345));
//! game.apply(Command::StartGame(Mode::Classic), now);
//!
//! let snap = game.snapshot(now);
//! assert_eq!(snap.status, Some(GameStatus::Active));
//! assert!(snap.value_at(Coord::new(5, 0)).is_some());
//! assert!(snap.value_at(Coord::new(0, 0)).is_none());
//! ```

pub mod config;
pub mod game;
pub mod gravity;
pub mod grid;
pub mod inject;
pub mod rng;
pub mod scheduler;
pub mod scoring;
pub mod selection;
pub mod session;
pub mod snapshot;

pub use sumtiles_types as types;

// Re-export commonly used types for convenience
pub use config::GameConfig;
pub use game::Game;
pub use gravity::compact;
pub use grid::{Grid, GridError};
pub use inject::{inject, InjectOutcome};
pub use rng::{SimpleRng, TileSource};
pub use scheduler::{ModeScheduler, RowTimer};
pub use scoring::{clear_score, HighScore};
pub use selection::{evaluate, selection_sum, Evaluation, Selection};
pub use session::{Session, ToggleOutcome};
pub use snapshot::{Fnv1aHasher, GameSnapshot};
