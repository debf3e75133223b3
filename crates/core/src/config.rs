//! Gameplay configuration
//!
//! Defaults come from `types`; each knob can be overridden through an
//! environment variable. Missing or unparsable values fall back to the default.
//!
//! - `SUMTILES_TIME_LIMIT_MS`: Timed-mode injection period
//! - `SUMTILES_REJECT_MS`: overshoot feedback window
//! - `SUMTILES_INITIAL_ROWS`: rows present when a session starts
//! - `SUMTILES_SEED`: RNG seed (default: derived from the wall clock)

use std::env;
use std::time::Duration;

use crate::types::{GRID_HEIGHT, INITIAL_ROWS, REJECT_FEEDBACK_MS, TIME_LIMIT_MS};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    pub time_limit: Duration,
    pub reject_feedback: Duration,
    pub initial_rows: u8,
    pub seed: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            time_limit: Duration::from_millis(TIME_LIMIT_MS as u64),
            reject_feedback: Duration::from_millis(REJECT_FEEDBACK_MS as u64),
            initial_rows: INITIAL_ROWS,
            seed: 1,
        }
    }
}

impl GameConfig {
    /// Read the configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let time_limit = env_u64("SUMTILES_TIME_LIMIT_MS")
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .unwrap_or(defaults.time_limit);

        let reject_feedback = env_u64("SUMTILES_REJECT_MS")
            .map(Duration::from_millis)
            .unwrap_or(defaults.reject_feedback);

        let initial_rows = env_u64("SUMTILES_INITIAL_ROWS")
            .map(|v| v.min(GRID_HEIGHT as u64 - 1) as u8)
            .unwrap_or(defaults.initial_rows);

        let seed = env_u64("SUMTILES_SEED")
            .map(|v| v as u32)
            .unwrap_or_else(clock_seed);

        Self {
            time_limit,
            reject_feedback,
            initial_rows,
            seed,
        }
    }

    pub fn with_seed(mut self, seed: u32) -> Self {
        self.seed = seed;
        self
    }

    /// Set the Timed-mode period. Clamped to at least 1 ms.
    pub fn with_time_limit(mut self, time_limit: Duration) -> Self {
        self.time_limit = time_limit.max(Duration::from_millis(1));
        self
    }

    pub fn with_initial_rows(mut self, rows: u8) -> Self {
        self.initial_rows = rows.min(GRID_HEIGHT - 1);
        self
    }
}

fn env_u64(key: &str) -> Option<u64> {
    env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

fn clock_seed() -> u32 {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();
    nanos.max(1)
}
