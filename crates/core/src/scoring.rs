//! Scoring module - clear points and the process-wide high score
//!
//! A clear is worth `POINTS_PER_TILE` per removed tile, independent of the
//! values or the target. The high score lives outside any session and only
//! ever goes up.

use crate::types::POINTS_PER_TILE;

/// Points for clearing `tiles` tiles in one match.
pub fn clear_score(tiles: usize) -> u32 {
    (tiles as u32).saturating_mul(POINTS_PER_TILE)
}

/// Best score seen since the process started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HighScore {
    best: u32,
}

impl HighScore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> u32 {
        self.best
    }

    /// Offer a session score. Returns true when it sets a new record.
    pub fn record(&mut self, score: u32) -> bool {
        if score > self.best {
            self.best = score;
            true
        } else {
            false
        }
    }
}
