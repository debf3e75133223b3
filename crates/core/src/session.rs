//! Session module - one play-through from start to game over or exit
//!
//! A session owns the grid, the selection, target, score, tile source and the
//! mode scheduler. Every transition takes an explicit `now`, so a session is a
//! deterministic function of its seed and the timed sequence of events.
//!
//! Control flow for a toggle:
//! selection changes → sum evaluated → on match the cells are removed, columns
//! compacted, a new target drawn and the scheduler consulted (Classic injects
//! immediately, Timed restarts its countdown) → injection may end the game.

use std::time::{Duration, Instant};

use crate::config::GameConfig;
use crate::gravity::compact;
use crate::grid::Grid;
use crate::inject::{inject, InjectOutcome};
use crate::rng::TileSource;
use crate::scheduler::ModeScheduler;
use crate::scoring::clear_score;
use crate::selection::{evaluate, Evaluation, Selection};
use crate::types::{Coord, CoreEvent, GameStatus, Mode};

/// What a toggle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Not Active, feedback window running, or no tile at the coordinate.
    Ignored,
    Selected { sum: u32 },
    Deselected { sum: u32 },
    Cleared { tiles: u32, points: u32 },
    Rejected { sum: u32 },
}

impl ToggleOutcome {
    pub fn changed(&self) -> bool {
        !matches!(self, ToggleOutcome::Ignored)
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    mode: Mode,
    status: GameStatus,
    grid: Grid,
    selection: Selection,
    target: u32,
    score: u32,
    tiles: TileSource,
    scheduler: ModeScheduler,
    reject_feedback: Duration,
    /// Set while an overshooting selection is on display.
    reject_until: Option<Instant>,
    last_event: Option<CoreEvent>,
    clears: u32,
    injections: u32,
}

impl Session {
    /// Start a session: fresh grid with `config.initial_rows` injected rows,
    /// fresh target, zero score, Active.
    pub fn new(mode: Mode, config: &GameConfig, seed: u32, now: Instant) -> Self {
        let mut tiles = TileSource::new(seed);
        let mut grid = Grid::new();
        for _ in 0..config.initial_rows {
            let outcome = inject(&mut grid, &mut tiles);
            debug_assert_eq!(outcome, InjectOutcome::Injected);
        }
        let target = tiles.next_target();

        let mut scheduler = ModeScheduler::new(mode, config.time_limit);
        scheduler.start(now);

        log::info!(
            "session started: mode={} seed={} target={}",
            mode.as_str(),
            seed,
            target
        );

        Self {
            mode,
            status: GameStatus::Active,
            grid,
            selection: Selection::new(),
            target,
            score: 0,
            tiles,
            scheduler,
            reject_feedback: config.reject_feedback,
            reject_until: None,
            last_event: None,
            clears: 0,
            injections: 0,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn target(&self) -> u32 {
        self.target
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn clears(&self) -> u32 {
        self.clears
    }

    pub fn injections(&self) -> u32 {
        self.injections
    }

    pub fn seed(&self) -> u32 {
        self.tiles.seed()
    }

    pub fn is_rejecting(&self) -> bool {
        self.reject_until.is_some()
    }

    pub fn last_event(&self) -> Option<CoreEvent> {
        self.last_event
    }

    /// Take and clear the last event.
    pub fn take_last_event(&mut self) -> Option<CoreEvent> {
        self.last_event.take()
    }

    /// Time left before the next Timed-mode injection.
    pub fn time_remaining(&self, now: Instant) -> Option<Duration> {
        self.scheduler.remaining(now)
    }

    pub fn time_limit(&self) -> Option<Duration> {
        self.scheduler.period()
    }

    pub fn selection_sum(&self) -> u32 {
        crate::selection::selection_sum(&self.selection, &self.grid)
    }

    /// Select or deselect the tile at `at` and evaluate the selection.
    pub fn toggle_cell(&mut self, at: Coord, now: Instant) -> ToggleOutcome {
        self.settle_rejection(now);
        // A row that fell due before this toggle lands first.
        self.fire_due_row(now);

        if self.status != GameStatus::Active
            || self.reject_until.is_some()
            || !self.grid.is_occupied(at)
        {
            return ToggleOutcome::Ignored;
        }

        let selected = self.selection.toggle(at);
        let (sum, eval) = evaluate(&self.selection, &self.grid, self.target);

        match eval {
            Evaluation::Pending if selected => ToggleOutcome::Selected { sum },
            Evaluation::Pending => ToggleOutcome::Deselected { sum },
            Evaluation::Match => self.clear_selection(now),
            Evaluation::Overshoot => {
                self.reject_until = Some(now + self.reject_feedback);
                self.last_event = Some(CoreEvent::Rejected { sum });
                log::debug!("selection rejected: sum={} target={}", sum, self.target);
                ToggleOutcome::Rejected { sum }
            }
        }
    }

    /// Pause an Active session or resume a Paused one.
    ///
    /// A row that fell due first still lands, so pausing can end the game.
    /// Returns false when nothing changed.
    pub fn toggle_pause(&mut self, now: Instant) -> bool {
        let fired = self.fire_due_row(now);
        match self.status {
            GameStatus::Active => {
                self.status = GameStatus::Paused;
                self.scheduler.pause(now);
            }
            GameStatus::Paused => {
                self.status = GameStatus::Active;
                self.scheduler.resume(now);
            }
            GameStatus::Over => return fired,
        }
        true
    }

    /// Advance time: drop an expired rejection and let the timer fire.
    ///
    /// Returns true if anything observable changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let settled = self.settle_rejection(now);
        let fired = self.fire_due_row(now);
        settled || fired
    }

    /// Cancel any pending timer; the session is being discarded.
    pub fn end(&mut self) {
        self.scheduler.stop();
    }

    /// Inject if the row timer has expired. Returns true if it fired.
    fn fire_due_row(&mut self, now: Instant) -> bool {
        if self.status != GameStatus::Active || !self.scheduler.poll(now) {
            return false;
        }
        log::debug!("row timer expired");
        self.inject_row();
        true
    }

    fn settle_rejection(&mut self, now: Instant) -> bool {
        match self.reject_until {
            Some(until) if now >= until => {
                self.reject_until = None;
                self.selection.clear();
                true
            }
            _ => false,
        }
    }

    fn clear_selection(&mut self, now: Instant) -> ToggleOutcome {
        if let Err(err) = self.grid.remove_at(self.selection.as_slice()) {
            log::error!("matched selection could not be cleared: {}", err);
            debug_assert!(false, "selection referenced an invalid cell: {}", err);
            self.selection.clear();
            return ToggleOutcome::Ignored;
        }

        let tiles = self.selection.len();
        self.selection.clear();
        compact(&mut self.grid);

        let points = clear_score(tiles);
        self.score = self.score.saturating_add(points);
        self.clears += 1;
        self.target = self.tiles.next_target();
        log::debug!(
            "cleared {} tiles for {} points, next target {}",
            tiles,
            points,
            self.target
        );

        let event = CoreEvent::Cleared {
            tiles: tiles as u32,
            points,
        };
        self.last_event = Some(event);

        if self.scheduler.on_clear(now) && self.inject_row() == InjectOutcome::Injected {
            // The clear is the headline event, not the follow-up row.
            self.last_event = Some(event);
        }

        ToggleOutcome::Cleared {
            tiles: tiles as u32,
            points,
        }
    }

    fn inject_row(&mut self) -> InjectOutcome {
        let outcome = inject(&mut self.grid, &mut self.tiles);
        match outcome {
            InjectOutcome::Injected => {
                self.injections += 1;
                // Selected tiles moved up with their rows.
                self.selection.shift_up();
                self.last_event = Some(CoreEvent::RowInjected);
            }
            InjectOutcome::GameOver => {
                self.status = GameStatus::Over;
                self.scheduler.stop();
                self.selection.clear();
                self.reject_until = None;
                self.last_event = Some(CoreEvent::GameOver);
                log::info!(
                    "game over: mode={} score={} clears={}",
                    self.mode.as_str(),
                    self.score,
                    self.clears
                );
            }
        }
        outcome
    }

    /// Write an observation of this session into `out`.
    pub fn snapshot_into(&self, now: Instant, out: &mut crate::snapshot::GameSnapshot) {
        let width = self.grid.width() as usize;
        for (i, cell) in self.grid.cells().iter().enumerate() {
            let (r, c) = (i / width, i % width);
            out.grid[r][c] = cell.map(|t| t.value).unwrap_or(0);
            out.tile_ids[r][c] = cell.map(|t| t.id).unwrap_or(0);
            out.fresh[r][c] = cell.map(|t| t.is_new).unwrap_or(false);
            out.selected[r][c] = false;
        }
        for at in self.selection.iter() {
            out.selected[at.row as usize][at.col as usize] = true;
        }

        out.status = Some(self.status);
        out.mode = Some(self.mode);
        out.selection_len = self.selection.len() as u8;
        out.selection_sum = self.selection_sum();
        out.rejecting = self.is_rejecting();
        out.target = self.target;
        out.score = self.score;
        out.time_remaining_ms = self
            .time_remaining(now)
            .map(|d| d.as_millis().min(u32::MAX as u128) as u32);
        out.time_limit_ms = self
            .time_limit()
            .map(|d| d.as_millis().min(u32::MAX as u128) as u32);
        out.seed = self.seed();
        out.clears = self.clears;
        out.injections = self.injections;
        out.last_event = self.last_event;
    }

    /// Test and tooling hook: replace the grid wholesale.
    pub fn set_grid(&mut self, grid: Grid) {
        self.grid = grid;
        self.selection.retain_occupied(&self.grid);
    }

    /// Test and tooling hook: force the current target.
    pub fn set_target(&mut self, target: u32) {
        self.target = target;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GameConfig {
        GameConfig::default().with_seed(42)
    }

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn new_session_has_initial_rows() {
        let s = Session::new(Mode::Classic, &config(), 42, Instant::now());
        assert_eq!(s.status(), GameStatus::Active);
        assert_eq!(s.score(), 0);
        assert_eq!(s.grid().tile_count(), 18);
        assert!(s.grid().is_row_empty(0));
        assert!(s.grid().is_row_empty(2));
        assert!(!s.grid().is_row_empty(3));
    }

    #[test]
    fn toggle_while_paused_is_ignored() {
        let t0 = Instant::now();
        let mut s = Session::new(Mode::Classic, &config(), 42, t0);
        assert!(s.toggle_pause(t0));
        assert_eq!(s.toggle_cell(Coord::new(5, 0), t0), ToggleOutcome::Ignored);
        assert!(s.selection().is_empty());
    }

    #[test]
    fn toggle_empty_cell_is_ignored() {
        let t0 = Instant::now();
        let mut s = Session::new(Mode::Classic, &config(), 42, t0);
        assert_eq!(s.toggle_cell(Coord::new(0, 0), t0), ToggleOutcome::Ignored);
        assert_eq!(s.toggle_cell(Coord::new(9, 9), t0), ToggleOutcome::Ignored);
    }

    #[test]
    fn selection_follows_tiles_on_timed_injection() {
        let t0 = Instant::now();
        let mut s = Session::new(Mode::Timed, &config(), 42, t0);
        s.set_target(25);
        let at = Coord::new(5, 2);
        let id = s.grid().tile(at).unwrap().id;
        assert!(matches!(s.toggle_cell(at, t0), ToggleOutcome::Selected { .. }));

        assert!(s.tick(t0 + ms(15_000)));
        let moved = Coord::new(4, 2);
        assert!(s.selection().contains(moved));
        assert_eq!(s.grid().tile(moved).unwrap().id, id);
    }

    #[test]
    fn game_over_cancels_timer() {
        let t0 = Instant::now();
        let mut s = Session::new(Mode::Timed, &config().with_initial_rows(5), 42, t0);
        assert!(s.tick(t0 + ms(15_000)));
        assert_eq!(s.status(), GameStatus::Active);
        assert_eq!(s.grid().tile_count(), 36);

        assert!(s.tick(t0 + ms(30_000)));
        assert_eq!(s.status(), GameStatus::Over);
        assert_eq!(s.last_event(), Some(CoreEvent::GameOver));
        assert_eq!(s.time_remaining(t0 + ms(30_000)), None);
        assert!(!s.tick(t0 + ms(60_000)));
        assert!(!s.toggle_pause(t0 + ms(60_000)));
    }
}
