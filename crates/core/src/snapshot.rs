use std::hash::{Hash, Hasher};

use crate::types::{Coord, CoreEvent, GameStatus, Mode, GRID_HEIGHT, GRID_WIDTH};

const W: usize = GRID_WIDTH as usize;
const H: usize = GRID_HEIGHT as usize;

/// Stable 64-bit FNV-1a hasher.
///
/// `DefaultHasher` output is not guaranteed stable across Rust versions, and
/// the state hash is sent to external clients.
#[derive(Debug, Clone)]
pub struct Fnv1aHasher {
    state: u64,
}

impl Fnv1aHasher {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;

    pub fn new() -> Self {
        Self {
            state: Self::OFFSET_BASIS,
        }
    }
}

impl Default for Fnv1aHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher for Fnv1aHasher {
    fn finish(&self) -> u64 {
        self.state
    }

    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.state ^= b as u64;
            self.state = self.state.wrapping_mul(Self::PRIME);
        }
    }
}

/// Plain-data copy of everything a view or client needs, free of heap data.
///
/// `status == None` means no session exists (mode selection menu).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GameSnapshot {
    pub status: Option<GameStatus>,
    pub mode: Option<Mode>,
    /// Tile values, 0 = empty.
    pub grid: [[u8; W]; H],
    pub tile_ids: [[u32; W]; H],
    /// Tiles from the most recent injection.
    pub fresh: [[bool; W]; H],
    pub selected: [[bool; W]; H],
    pub selection_len: u8,
    pub selection_sum: u32,
    /// An overshooting selection is on display.
    pub rejecting: bool,
    pub target: u32,
    pub score: u32,
    pub high_score: u32,
    pub time_remaining_ms: Option<u32>,
    pub time_limit_ms: Option<u32>,
    pub episode_id: u32,
    pub seed: u32,
    pub clears: u32,
    pub injections: u32,
    pub last_event: Option<CoreEvent>,
}

impl GameSnapshot {
    pub fn clear(&mut self) {
        self.status = None;
        self.mode = None;
        self.grid = [[0u8; W]; H];
        self.tile_ids = [[0u32; W]; H];
        self.fresh = [[false; W]; H];
        self.selected = [[false; W]; H];
        self.selection_len = 0;
        self.selection_sum = 0;
        self.rejecting = false;
        self.target = 0;
        self.score = 0;
        self.time_remaining_ms = None;
        self.time_limit_ms = None;
        self.seed = 0;
        self.clears = 0;
        self.injections = 0;
        self.last_event = None;
    }

    pub fn in_menu(&self) -> bool {
        self.status.is_none()
    }

    pub fn playable(&self) -> bool {
        self.status == Some(GameStatus::Active)
    }

    pub fn is_paused(&self) -> bool {
        self.status == Some(GameStatus::Paused)
    }

    pub fn is_over(&self) -> bool {
        self.status == Some(GameStatus::Over)
    }

    pub fn value_at(&self, at: Coord) -> Option<u8> {
        if !at.in_bounds() {
            return None;
        }
        let v = self.grid[at.row as usize][at.col as usize];
        (v != 0).then_some(v)
    }

    /// Selected coordinates in row-major order.
    pub fn selected_coords(&self) -> impl Iterator<Item = Coord> + '_ {
        self.selected.iter().enumerate().flat_map(|(r, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, &on)| on)
                .map(move |(c, _)| Coord::new(r as u8, c as u8))
        })
    }

    /// Deterministic hash of the whole snapshot.
    pub fn state_hash(&self) -> u64 {
        let mut hasher = Fnv1aHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }

    /// Hash of what the screen shows. The countdown is folded to tenths of a
    /// second so a running clock changes the fingerprint at a bounded rate.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = Fnv1aHasher::new();
        self.status.hash(&mut hasher);
        self.mode.hash(&mut hasher);
        self.grid.hash(&mut hasher);
        self.fresh.hash(&mut hasher);
        self.selected.hash(&mut hasher);
        self.rejecting.hash(&mut hasher);
        self.target.hash(&mut hasher);
        self.score.hash(&mut hasher);
        self.high_score.hash(&mut hasher);
        self.time_remaining_ms.map(|ms| ms / 100).hash(&mut hasher);
        hasher.finish()
    }
}

impl Default for GameSnapshot {
    fn default() -> Self {
        Self {
            status: None,
            mode: None,
            grid: [[0u8; W]; H],
            tile_ids: [[0u32; W]; H],
            fresh: [[false; W]; H],
            selected: [[false; W]; H],
            selection_len: 0,
            selection_sum: 0,
            rejecting: false,
            target: 0,
            score: 0,
            high_score: 0,
            time_remaining_ms: None,
            time_limit_ms: None,
            episode_id: 0,
            seed: 0,
            clears: 0,
            injections: 0,
            last_event: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fnv_is_stable() {
        let mut h = Fnv1aHasher::new();
        h.write(b"a");
        assert_eq!(h.finish(), 0xaf63dc4c8601ec8c);
    }

    #[test]
    fn fingerprint_ignores_sub_tenth_countdown() {
        let mut a = GameSnapshot::default();
        a.status = Some(GameStatus::Active);
        a.time_remaining_ms = Some(14_950);
        let mut b = a;
        b.time_remaining_ms = Some(14_901);
        assert_eq!(a.fingerprint(), b.fingerprint());
        b.time_remaining_ms = Some(14_899);
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn selected_coords_row_major() {
        let mut s = GameSnapshot::default();
        s.selected[5][3] = true;
        s.selected[2][1] = true;
        let coords: Vec<_> = s.selected_coords().collect();
        assert_eq!(coords, vec![Coord::new(2, 1), Coord::new(5, 3)]);
    }
}
