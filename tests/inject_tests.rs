//! Row injection: the pressure mechanism and the only way to lose.

use proptest::prelude::*;

use sumtiles::core::{compact, inject, Grid, InjectOutcome, TileSource};
use sumtiles::types::{Coord, GRID_HEIGHT, GRID_WIDTH, NUMBER_MAX, NUMBER_MIN};

fn bottom_row_is_fresh(grid: &Grid) -> bool {
    (0..GRID_WIDTH).all(|col| {
        grid.tile(Coord::new(GRID_HEIGHT - 1, col))
            .map(|t| t.is_new && (NUMBER_MIN..=NUMBER_MAX).contains(&t.value))
            .unwrap_or(false)
    })
}

#[test]
fn empty_grid_gets_one_full_bottom_row() {
    let mut grid = Grid::new();
    let mut tiles = TileSource::new(42);

    assert_eq!(inject(&mut grid, &mut tiles), InjectOutcome::Injected);

    assert_eq!(grid.tile_count(), GRID_WIDTH as usize);
    assert!(bottom_row_is_fresh(&grid));
    for row in 0..GRID_HEIGHT - 1 {
        assert!(grid.is_row_empty(row));
    }
    assert_eq!(tiles.tiles_issued(), GRID_WIDTH as u32);
}

#[test]
fn occupied_danger_zone_is_game_over_and_grid_untouched() {
    let mut grid = Grid::from_values([[1, 2, 3, 4, 5, 6]; 6]);
    let before = grid.clone();
    let mut tiles = TileSource::new(42);

    assert_eq!(inject(&mut grid, &mut tiles), InjectOutcome::GameOver);
    assert_eq!(grid, before);
    assert_eq!(tiles.tiles_issued(), 0);
}

#[test]
fn single_tile_in_row_zero_is_enough_to_lose() {
    let mut grid = Grid::from_values([
        [0, 0, 0, 9, 0, 0],
        [0, 0, 0, 1, 0, 0],
        [0, 0, 0, 1, 0, 0],
        [0, 0, 0, 1, 0, 0],
        [0, 0, 0, 1, 0, 0],
        [0, 0, 0, 1, 0, 0],
    ]);
    let mut tiles = TileSource::new(3);
    assert_eq!(inject(&mut grid, &mut tiles), InjectOutcome::GameOver);
}

#[test]
fn six_injections_fill_the_grid_then_seventh_loses() {
    let mut grid = Grid::new();
    let mut tiles = TileSource::new(9);
    for _ in 0..GRID_HEIGHT {
        assert_eq!(inject(&mut grid, &mut tiles), InjectOutcome::Injected);
    }
    assert_eq!(grid.tile_count(), (GRID_WIDTH * GRID_HEIGHT) as usize);
    assert_eq!(inject(&mut grid, &mut tiles), InjectOutcome::GameOver);
}

#[test]
fn tile_ids_never_repeat() {
    let mut grid = Grid::new();
    let mut tiles = TileSource::new(11);
    for _ in 0..4 {
        inject(&mut grid, &mut tiles);
    }
    let mut ids: Vec<u32> = grid.cells().iter().flatten().map(|t| t.id).collect();
    let n = ids.len();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), n);
}

fn arb_compact_grid() -> impl Strategy<Value = Grid> {
    // Row 0 stays empty so injection always succeeds.
    proptest::array::uniform6(0usize..GRID_HEIGHT as usize).prop_flat_map(|heights| {
        proptest::array::uniform6(proptest::array::uniform6(1u8..=9)).prop_map(move |raw| {
            let mut values = [[0u8; 6]; 6];
            for (col, &h) in heights.iter().enumerate() {
                for row in (GRID_HEIGHT as usize - h)..GRID_HEIGHT as usize {
                    values[row][col] = raw[row][col];
                }
            }
            let mut grid = Grid::from_values(values);
            compact(&mut grid);
            grid
        })
    })
}

proptest! {
    #[test]
    fn prop_inject_shifts_every_row_up(grid in arb_compact_grid(), seed in any::<u32>()) {
        let before = grid.to_values();
        let mut after = grid.clone();
        let mut tiles = TileSource::new(seed);

        prop_assert_eq!(inject(&mut after, &mut tiles), InjectOutcome::Injected);

        let shifted = after.to_values();
        for row in 0..GRID_HEIGHT as usize - 1 {
            prop_assert_eq!(shifted[row], before[row + 1]);
        }
        prop_assert!(bottom_row_is_fresh(&after));
        prop_assert_eq!(after.tile_count(), grid.tile_count() + GRID_WIDTH as usize);
    }

    #[test]
    fn prop_only_newest_row_is_marked(grid in arb_compact_grid(), seed in any::<u32>()) {
        let mut grid = grid;
        let mut tiles = TileSource::new(seed);
        inject(&mut grid, &mut tiles);
        for row in 0..GRID_HEIGHT - 1 {
            for col in 0..GRID_WIDTH {
                if let Some(tile) = grid.tile(Coord::new(row, col)) {
                    prop_assert!(!tile.is_new);
                }
            }
        }
    }
}
