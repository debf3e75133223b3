//! RNG module - seeded tile values and targets
//!
//! A small LCG keeps every session reproducible from its seed (handy for tests
//! and adapter replays). `TileSource` layers game-specific draws on top of it:
//! tile values in `[NUMBER_MIN, NUMBER_MAX]`, targets in `[TARGET_MIN, TARGET_MAX]`,
//! and the monotonic tile-id counter.

use crate::types::{Cell, Tile, GRID_WIDTH, NUMBER_MAX, NUMBER_MIN, TARGET_MAX, TARGET_MIN};

/// Simple LCG (Linear Congruential Generator) RNG
/// Uses constants from Numerical Recipes
#[derive(Debug, Clone)]
pub struct SimpleRng {
    state: u32,
}

impl SimpleRng {
    /// Create a new RNG with the given seed
    pub fn new(seed: u32) -> Self {
        // Avoid 0 seed which would produce all zeros
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Generate next random u32
    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(1664525).wrapping_add(1013904223);
        self.state
    }

    /// Uniform value in `[lo, hi]` (inclusive).
    ///
    /// Uses the high bits; the low bits of an LCG cycle with short periods.
    pub fn next_inclusive(&mut self, lo: u32, hi: u32) -> u32 {
        debug_assert!(lo <= hi);
        let span = (hi - lo) as u64 + 1;
        lo + ((self.next_u32() as u64 * span) >> 32) as u32
    }

    pub fn state(&self) -> u32 {
        self.state
    }
}

/// Draws new tiles and targets for one session.
#[derive(Debug, Clone)]
pub struct TileSource {
    rng: SimpleRng,
    next_id: u32,
}

impl TileSource {
    pub fn new(seed: u32) -> Self {
        Self {
            rng: SimpleRng::new(seed),
            next_id: 1,
        }
    }

    /// A fresh tile with a never-before-used id.
    pub fn next_tile(&mut self) -> Tile {
        let value = self.rng.next_inclusive(NUMBER_MIN as u32, NUMBER_MAX as u32) as u8;
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        Tile::new(id, value)
    }

    /// A full bottom row of fresh tiles.
    pub fn next_row(&mut self) -> [Cell; GRID_WIDTH as usize] {
        std::array::from_fn(|_| Some(self.next_tile()))
    }

    pub fn next_target(&mut self) -> u32 {
        self.rng.next_inclusive(TARGET_MIN, TARGET_MAX)
    }

    /// Current RNG state; seeding a new source with it continues the sequence.
    pub fn seed(&self) -> u32 {
        self.rng.state()
    }

    /// Number of tiles handed out so far.
    pub fn tiles_issued(&self) -> u32 {
        self.next_id.wrapping_sub(1)
    }
}

impl Default for TileSource {
    fn default() -> Self {
        Self::new(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rng_deterministic() {
        let mut rng1 = SimpleRng::new(12345);
        let mut rng2 = SimpleRng::new(12345);

        for _ in 0..100 {
            assert_eq!(rng1.next_u32(), rng2.next_u32());
        }
    }

    #[test]
    fn test_rng_zero_seed_is_remapped() {
        let mut a = SimpleRng::new(0);
        let mut b = SimpleRng::new(1);
        assert_eq!(a.next_u32(), b.next_u32());
    }

    #[test]
    fn test_inclusive_range_hits_both_ends() {
        let mut rng = SimpleRng::new(7);
        let mut seen = [false; 10];
        for _ in 0..2000 {
            let v = rng.next_inclusive(1, 9);
            assert!((1..=9).contains(&v));
            seen[v as usize] = true;
        }
        assert!(seen[1..=9].iter().all(|s| *s), "every value 1..=9 should appear");
    }

    #[test]
    fn test_targets_in_range() {
        let mut src = TileSource::new(99);
        for _ in 0..500 {
            let t = src.next_target();
            assert!((TARGET_MIN..=TARGET_MAX).contains(&t));
        }
    }

    #[test]
    fn test_tile_ids_are_unique_and_monotonic() {
        let mut src = TileSource::new(3);
        let row = src.next_row();
        let ids: Vec<u32> = row.iter().map(|c| c.unwrap().id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(src.next_tile().id, 7);
        assert_eq!(src.tiles_issued(), 7);
        assert!(row.iter().all(|c| c.unwrap().is_new));
    }
}
