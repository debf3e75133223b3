//! End-to-end session behaviour through the `Game` facade.

use std::time::{Duration, Instant};

use proptest::prelude::*;

use sumtiles::core::{Game, GameConfig, Grid, ToggleOutcome};
use sumtiles::types::{
    Command, CoreEvent, Coord, GameStatus, Mode, GRID_HEIGHT, GRID_WIDTH, TARGET_MAX, TARGET_MIN,
};

const EMPTY: [u8; 6] = [0; 6];

fn config() -> GameConfig {
    GameConfig::default()
        .with_seed(7)
        .with_time_limit(Duration::from_secs(15))
}

fn game_with(mode: Mode, values: [[u8; 6]; 6], target: u32, now: Instant) -> Game {
    let mut game = Game::new(config());
    game.start_game(mode, now);
    let session = game.session_mut().unwrap();
    session.set_grid(Grid::from_values(values));
    session.set_target(target);
    game
}

fn at(row: u8, col: u8) -> Coord {
    Coord::new(row, col)
}

#[test]
fn match_across_rows_and_columns_clears_and_scores() {
    let t0 = Instant::now();
    let mut game = game_with(
        Mode::Timed,
        [EMPTY, EMPTY, EMPTY, EMPTY, [5, 0, 0, 0, 0, 0], [4, 6, 1, 1, 1, 1]],
        15,
        t0,
    );

    assert_eq!(game.toggle_cell(at(4, 0), t0), ToggleOutcome::Selected { sum: 5 });
    assert_eq!(game.toggle_cell(at(5, 1), t0), ToggleOutcome::Selected { sum: 11 });
    assert_eq!(
        game.toggle_cell(at(5, 0), t0),
        ToggleOutcome::Cleared { tiles: 3, points: 30 }
    );

    let session = game.session().unwrap();
    assert_eq!(session.score(), 30);
    assert!(session.selection().is_empty());
    assert_eq!(
        session.grid().to_values(),
        [EMPTY, EMPTY, EMPTY, EMPTY, EMPTY, [0, 0, 1, 1, 1, 1]]
    );
    assert_eq!(session.last_event(), Some(CoreEvent::Cleared { tiles: 3, points: 30 }));
    assert!((TARGET_MIN..=TARGET_MAX).contains(&session.target()));
    assert_eq!(game.high_score(), 30);
}

#[test]
fn classic_clear_compacts_then_injects() {
    let t0 = Instant::now();
    let mut game = game_with(
        Mode::Classic,
        [EMPTY, EMPTY, EMPTY, EMPTY, [5, 0, 0, 0, 0, 0], [4, 6, 1, 1, 1, 1]],
        15,
        t0,
    );

    for c in [at(4, 0), at(5, 1), at(5, 0)] {
        game.toggle_cell(c, t0);
    }

    let session = game.session().unwrap();
    let values = session.grid().to_values();
    assert_eq!(values[4], [0, 0, 1, 1, 1, 1]);
    assert!(values[5].iter().all(|&v| (1..=9).contains(&v)));
    assert_eq!(session.injections(), 1);
    // The clear stays the headline event.
    assert!(matches!(session.last_event(), Some(CoreEvent::Cleared { .. })));
}

#[test]
fn classic_injects_even_when_clear_empties_grid() {
    let t0 = Instant::now();
    let mut game = game_with(
        Mode::Classic,
        [EMPTY, EMPTY, EMPTY, EMPTY, EMPTY, [4, 6, 0, 0, 0, 0]],
        10,
        t0,
    );
    game.toggle_cell(at(5, 0), t0);
    game.toggle_cell(at(5, 1), t0);
    assert_eq!(
        game.session().unwrap().grid().tile_count(),
        GRID_WIDTH as usize
    );
}

#[test]
fn overshoot_rejects_then_clears_selection_after_feedback() {
    let t0 = Instant::now();
    let values = [EMPTY, EMPTY, EMPTY, EMPTY, EMPTY, [6, 7, 1, 1, 1, 1]];
    let mut game = game_with(Mode::Classic, values, 10, t0);

    game.toggle_cell(at(5, 0), t0);
    assert_eq!(game.toggle_cell(at(5, 1), t0), ToggleOutcome::Rejected { sum: 13 });

    {
        let session = game.session().unwrap();
        assert!(session.is_rejecting());
        assert_eq!(session.selection().len(), 2);
        assert_eq!(session.score(), 0);
        assert_eq!(session.grid().to_values(), values);
    }

    // Input is frozen while the rejection is shown.
    assert_eq!(game.toggle_cell(at(5, 2), t0), ToggleOutcome::Ignored);

    let reject = config().reject_feedback;
    assert!(!game.tick(t0 + reject / 2));
    assert!(game.tick(t0 + reject));

    let session = game.session().unwrap();
    assert!(!session.is_rejecting());
    assert!(session.selection().is_empty());
    assert_eq!(session.grid().to_values(), values);
    assert_eq!(session.target(), 10);
}

#[test]
fn deselect_and_empty_cells() {
    let t0 = Instant::now();
    let mut game = game_with(
        Mode::Classic,
        [EMPTY, EMPTY, EMPTY, EMPTY, EMPTY, [2, 3, 0, 0, 0, 0]],
        20,
        t0,
    );
    assert_eq!(game.toggle_cell(at(0, 0), t0), ToggleOutcome::Ignored);
    assert_eq!(game.toggle_cell(at(5, 3), t0), ToggleOutcome::Ignored);
    assert_eq!(game.toggle_cell(at(9, 9), t0), ToggleOutcome::Ignored);

    assert_eq!(game.toggle_cell(at(5, 0), t0), ToggleOutcome::Selected { sum: 2 });
    assert_eq!(game.toggle_cell(at(5, 1), t0), ToggleOutcome::Selected { sum: 5 });
    assert_eq!(game.toggle_cell(at(5, 0), t0), ToggleOutcome::Deselected { sum: 3 });
}

#[test]
fn timed_period_without_clears_injects_once() {
    let t0 = Instant::now();
    let mut game = Game::new(config().with_initial_rows(0));
    game.start_game(Mode::Timed, t0);

    let remaining = |g: &Game, now| g.snapshot(now).time_remaining_ms.unwrap();
    assert_eq!(remaining(&game, t0), 15_000);
    assert!(remaining(&game, t0 + Duration::from_secs(5)) < 15_000);
    assert!(remaining(&game, t0 + Duration::from_secs(10)) < remaining(&game, t0 + Duration::from_secs(5)));

    assert!(!game.tick(t0 + Duration::from_millis(14_999)));
    assert!(game.session().unwrap().grid().is_empty());

    let fire = t0 + Duration::from_secs(15);
    assert!(game.tick(fire));
    let session = game.session().unwrap();
    assert_eq!(session.injections(), 1);
    assert_eq!(session.grid().tile_count(), GRID_WIDTH as usize);
    assert_eq!(session.last_event(), Some(CoreEvent::RowInjected));
    assert_eq!(remaining(&game, fire), 15_000);
}

#[test]
fn timed_pause_preserves_remaining_time() {
    let t0 = Instant::now();
    let mut game = Game::new(config().with_initial_rows(0));
    game.start_game(Mode::Timed, t0);

    let paused_at = t0 + Duration::from_secs(5);
    assert!(game.toggle_pause(paused_at));
    assert_eq!(game.status(), Some(GameStatus::Paused));

    let much_later = t0 + Duration::from_secs(100);
    assert!(!game.tick(much_later));
    assert_eq!(game.snapshot(much_later).time_remaining_ms, Some(10_000));

    // Toggles are ignored while paused.
    assert_eq!(game.toggle_cell(at(5, 0), much_later), ToggleOutcome::Ignored);

    assert!(game.toggle_pause(much_later));
    assert_eq!(game.status(), Some(GameStatus::Active));
    assert_eq!(game.snapshot(much_later).time_remaining_ms, Some(10_000));

    assert!(!game.tick(much_later + Duration::from_millis(9_999)));
    assert!(game.tick(much_later + Duration::from_secs(10)));
    assert_eq!(game.session().unwrap().injections(), 1);
}

#[test]
fn timed_clear_resets_the_countdown() {
    let t0 = Instant::now();
    let mut game = game_with(
        Mode::Timed,
        [EMPTY, EMPTY, EMPTY, EMPTY, EMPTY, [4, 6, 0, 0, 0, 0]],
        10,
        t0,
    );
    let t1 = t0 + Duration::from_secs(10);
    game.toggle_cell(at(5, 0), t1);
    game.toggle_cell(at(5, 1), t1);

    assert_eq!(game.snapshot(t1).time_remaining_ms, Some(15_000));
    assert!(!game.tick(t0 + Duration::from_secs(15)));
    assert_eq!(game.session().unwrap().injections(), 0);
}

#[test]
fn late_toggle_lands_the_due_row_first() {
    let t0 = Instant::now();
    let mut game = game_with(
        Mode::Timed,
        [EMPTY, EMPTY, EMPTY, EMPTY, EMPTY, [4, 6, 0, 0, 0, 0]],
        10,
        t0,
    );
    let late = t0 + Duration::from_millis(15_010);

    // The due row pushes the fixture up one row before the toggle applies.
    assert_eq!(game.toggle_cell(at(4, 0), late), ToggleOutcome::Selected { sum: 4 });
    assert_eq!(game.session().unwrap().injections(), 1);
    assert_eq!(game.snapshot(late).time_remaining_ms, Some(15_000));

    assert_eq!(
        game.toggle_cell(at(4, 1), late),
        ToggleOutcome::Cleared { tiles: 2, points: 20 }
    );
    let session = game.session().unwrap();
    assert_eq!(session.injections(), 1);
    assert_eq!(session.score(), 20);
    assert_eq!(session.grid().tile_count(), GRID_WIDTH as usize);

    // The timer already fired for that period.
    assert!(!game.tick(late));
}

#[test]
fn late_command_on_empty_cell_still_reports_the_row() {
    let t0 = Instant::now();
    let mut game = Game::new(config().with_initial_rows(0));
    game.start_game(Mode::Timed, t0);

    let late = t0 + Duration::from_millis(15_010);
    assert!(game.apply(Command::ToggleCell(at(0, 0)), late));
    let session = game.session().unwrap();
    assert_eq!(session.injections(), 1);
    assert_eq!(session.last_event(), Some(CoreEvent::RowInjected));
}

#[test]
fn late_pause_lands_the_due_row_then_pauses() {
    let t0 = Instant::now();
    let mut game = Game::new(config().with_initial_rows(0));
    game.start_game(Mode::Timed, t0);

    let late = t0 + Duration::from_millis(15_010);
    assert!(game.toggle_pause(late));
    assert_eq!(game.status(), Some(GameStatus::Paused));
    assert_eq!(game.session().unwrap().injections(), 1);
    assert_eq!(game.snapshot(late).time_remaining_ms, Some(15_000));
}

#[test]
fn late_toggle_can_lose_to_the_due_row() {
    let t0 = Instant::now();
    let mut game = game_with(
        Mode::Timed,
        [[1; 6], [1; 6], [1; 6], [1; 6], [1; 6], [4, 6, 1, 1, 1, 1]],
        10,
        t0,
    );
    let late = t0 + Duration::from_secs(16);

    assert_eq!(game.toggle_cell(at(5, 0), late), ToggleOutcome::Ignored);
    let session = game.session().unwrap();
    assert_eq!(session.status(), GameStatus::Over);
    assert_eq!(session.last_event(), Some(CoreEvent::GameOver));
    assert_eq!(session.score(), 0);
}

#[test]
fn full_danger_zone_ends_the_game() {
    let t0 = Instant::now();
    let mut game = game_with(
        Mode::Classic,
        [[1, 1, 1, 1, 1, 1], [1; 6], [1; 6], [1; 6], [1; 6], [4, 6, 1, 1, 1, 1]],
        10,
        t0,
    );
    game.toggle_cell(at(5, 0), t0);
    game.toggle_cell(at(5, 1), t0);

    assert_eq!(game.status(), Some(GameStatus::Over));
    assert_eq!(game.session().unwrap().last_event(), Some(CoreEvent::GameOver));
    assert_eq!(game.snapshot(t0).time_remaining_ms, None);

    // Only restart or the menu get out of Over.
    assert!(!game.toggle_pause(t0));
    assert_eq!(game.toggle_cell(at(5, 2), t0), ToggleOutcome::Ignored);
    assert!(game.apply(Command::Restart, t0));
    assert_eq!(game.status(), Some(GameStatus::Active));
    assert_eq!(game.mode(), Some(Mode::Classic));
}

#[test]
fn menu_and_restart_flow() {
    let t0 = Instant::now();
    let mut game = Game::new(config());
    assert!(game.in_menu());
    assert!(!game.apply(Command::Restart, t0));
    assert!(!game.apply(Command::TogglePause, t0));
    assert!(!game.apply(Command::ToggleCell(at(5, 0)), t0));

    assert!(game.apply(Command::StartGame(Mode::Timed), t0));
    let first = game.episode_id();
    let first_grid = game.session().unwrap().grid().to_values();
    assert_eq!(game.session().unwrap().grid().tile_count(), 3 * GRID_WIDTH as usize);

    assert!(game.apply(Command::Restart, t0));
    assert_eq!(game.episode_id(), first + 1);
    assert_eq!(game.mode(), Some(Mode::Timed));
    // The RNG carries forward, so the new board differs.
    assert_ne!(game.session().unwrap().grid().to_values(), first_grid);
    assert_eq!(game.session().unwrap().score(), 0);

    assert!(game.apply(Command::ExitToMenu, t0));
    assert!(game.in_menu());
    assert!(game.snapshot(t0).in_menu());
    assert!(!game.apply(Command::ExitToMenu, t0));
}

type Values = [[u8; 6]; 6];

fn arb_full_values() -> impl Strategy<Value = Values> {
    proptest::array::uniform6(proptest::array::uniform6(1u8..=9))
}

fn arb_picks() -> impl Strategy<Value = Vec<Coord>> {
    let all: Vec<Coord> = (0..GRID_HEIGHT)
        .flat_map(|r| (0..GRID_WIDTH).map(move |c| Coord::new(r, c)))
        .collect();
    proptest::sample::subsequence(all, 1..=6).prop_shuffle()
}

fn ids_of(grid: &Grid) -> Vec<u32> {
    let mut ids: Vec<u32> = grid.cells().iter().flatten().map(|t| t.id).collect();
    ids.sort_unstable();
    ids
}

proptest! {
    #[test]
    fn prop_match_removes_exactly_the_selection(values in arb_full_values(), picks in arb_picks()) {
        let t0 = Instant::now();
        let sum: u32 = picks.iter().map(|c| values[c.row as usize][c.col as usize] as u32).sum();
        // Timed mode, so no row follows the clear.
        let mut game = game_with(Mode::Timed, values, sum, t0);

        let before = game.session().unwrap().grid().clone();
        let picked: Vec<u32> = picks.iter().map(|&c| before.tile(c).unwrap().id).collect();

        let mut last = ToggleOutcome::Ignored;
        for &c in &picks {
            last = game.toggle_cell(c, t0);
        }
        let points = 10 * picks.len() as u32;
        prop_assert_eq!(last, ToggleOutcome::Cleared { tiles: picks.len() as u32, points });

        let session = game.session().unwrap();
        let expected: Vec<u32> = ids_of(&before).into_iter().filter(|id| !picked.contains(id)).collect();
        prop_assert_eq!(ids_of(session.grid()), expected);
        prop_assert_eq!(session.score(), points);
        prop_assert!(session.selection().is_empty());
        prop_assert!((TARGET_MIN..=TARGET_MAX).contains(&session.target()));
    }

    #[test]
    fn prop_overshoot_leaves_grid_and_score(values in arb_full_values(), picks in arb_picks()) {
        let t0 = Instant::now();
        let sum: u32 = picks.iter().map(|c| values[c.row as usize][c.col as usize] as u32).sum();
        let last_value = {
            let c = picks[picks.len() - 1];
            values[c.row as usize][c.col as usize] as u32
        };
        // Every prefix stays below the target; the full pick goes over it.
        let target = sum - 1;
        prop_assume!(last_value > 1);
        let mut game = game_with(Mode::Classic, values, target, t0);

        let mut last = ToggleOutcome::Ignored;
        for &c in &picks {
            last = game.toggle_cell(c, t0);
        }
        prop_assert_eq!(last, ToggleOutcome::Rejected { sum });

        game.tick(t0 + config().reject_feedback);
        let session = game.session().unwrap();
        prop_assert_eq!(session.grid().to_values(), values);
        prop_assert_eq!(session.score(), 0);
        prop_assert_eq!(session.target(), target);
        prop_assert!(session.selection().is_empty());
    }
}
