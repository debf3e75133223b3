//! Game controller - menu, sessions and the process-wide high score
//!
//! `Game` is the single entry point for both human input and the adapter. It
//! owns at most one `Session`; when none exists the player is on the mode
//! selection menu. Starting a game discards any current session, so two
//! sessions can never run at once and a stale session's timer can never reach
//! the grid.

use std::time::Instant;

use crate::config::GameConfig;
use crate::scoring::HighScore;
use crate::session::{Session, ToggleOutcome};
use crate::snapshot::GameSnapshot;
use crate::types::{Command, Coord, GameStatus, Mode};

#[derive(Debug, Clone)]
pub struct Game {
    config: GameConfig,
    high_score: HighScore,
    session: Option<Session>,
    /// Seed for the next session; carries RNG state across restarts.
    next_seed: u32,
    episode_id: u32,
}

impl Game {
    pub fn new(config: GameConfig) -> Self {
        let next_seed = config.seed;
        Self {
            config,
            high_score: HighScore::new(),
            session: None,
            next_seed,
            episode_id: 0,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Mutable access for fixtures and tooling.
    pub fn session_mut(&mut self) -> Option<&mut Session> {
        self.session.as_mut()
    }

    pub fn in_menu(&self) -> bool {
        self.session.is_none()
    }

    pub fn high_score(&self) -> u32 {
        self.high_score.get()
    }

    pub fn episode_id(&self) -> u32 {
        self.episode_id
    }

    pub fn status(&self) -> Option<GameStatus> {
        self.session.as_ref().map(|s| s.status())
    }

    pub fn mode(&self) -> Option<Mode> {
        self.session.as_ref().map(|s| s.mode())
    }

    /// Discard any session and begin a new one.
    pub fn start_game(&mut self, mode: Mode, now: Instant) {
        if let Some(mut old) = self.session.take() {
            self.next_seed = old.seed();
            old.end();
        }
        self.episode_id = self.episode_id.wrapping_add(1);
        self.session = Some(Session::new(mode, &self.config, self.next_seed, now));
    }

    pub fn toggle_cell(&mut self, at: Coord, now: Instant) -> ToggleOutcome {
        let Some(session) = self.session.as_mut() else {
            return ToggleOutcome::Ignored;
        };
        let outcome = session.toggle_cell(at, now);
        if let ToggleOutcome::Cleared { .. } = outcome {
            self.record_score();
        }
        outcome
    }

    pub fn toggle_pause(&mut self, now: Instant) -> bool {
        self.session
            .as_mut()
            .map(|s| s.toggle_pause(now))
            .unwrap_or(false)
    }

    /// New session in the current mode. Does nothing from the menu.
    pub fn restart(&mut self, now: Instant) -> bool {
        match self.mode() {
            Some(mode) => {
                self.start_game(mode, now);
                true
            }
            None => false,
        }
    }

    pub fn exit_to_menu(&mut self) -> bool {
        match self.session.take() {
            Some(mut session) => {
                self.next_seed = session.seed();
                session.end();
                log::info!("returned to menu");
                true
            }
            None => false,
        }
    }

    pub fn tick(&mut self, now: Instant) -> bool {
        let changed = self
            .session
            .as_mut()
            .map(|s| s.tick(now))
            .unwrap_or(false);
        if changed {
            self.record_score();
        }
        changed
    }

    /// Apply a command. Returns true if anything observable changed.
    pub fn apply(&mut self, command: Command, now: Instant) -> bool {
        let changed = match command {
            Command::StartGame(mode) => {
                self.start_game(mode, now);
                true
            }
            Command::ToggleCell(at) => {
                // Settle timers first so a due row counts as a change.
                let ticked = self.tick(now);
                self.toggle_cell(at, now).changed() || ticked
            }
            Command::TogglePause => {
                let ticked = self.tick(now);
                self.toggle_pause(now) || ticked
            }
            Command::Restart => self.restart(now),
            Command::ExitToMenu => self.exit_to_menu(),
        };
        log::trace!("command {} changed={}", command.as_str(), changed);
        changed
    }

    pub fn snapshot(&self, now: Instant) -> GameSnapshot {
        let mut out = GameSnapshot::default();
        self.snapshot_into(now, &mut out);
        out
    }

    pub fn snapshot_into(&self, now: Instant, out: &mut GameSnapshot) {
        out.clear();
        if let Some(session) = self.session.as_ref() {
            session.snapshot_into(now, out);
        }
        out.high_score = self.high_score.get();
        out.episode_id = self.episode_id;
    }

    fn record_score(&mut self) {
        if let Some(session) = self.session.as_ref() {
            if self.high_score.record(session.score()) {
                log::debug!("new high score {}", session.score());
            }
        }
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new(GameConfig::default())
    }
}
