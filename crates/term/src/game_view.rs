//! GameView: maps a `GameSnapshot` into a terminal framebuffer.
//!
//! This module is pure (no I/O). It can be unit-tested, and the same layout
//! math serves both drawing and mouse hit testing.

use crate::core::GameSnapshot;
use crate::fb::{CellStyle, FrameBuffer, Rgb};
use crate::types::{Coord, CoreEvent, Mode, GRID_HEIGHT, GRID_WIDTH};

/// Terminal viewport dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
}

impl Viewport {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdapterStatusView {
    pub client_count: u16,
    pub controller_id: Option<usize>,
}

/// Presentation-only inputs that are not part of the game state.
#[derive(Debug, Clone, Copy, Default)]
pub struct ViewExtras<'a> {
    pub cursor: Option<Coord>,
    pub adapter: Option<AdapterStatusView>,
    /// Menu cover art, one entry per line.
    pub cover: &'a [String],
}

const PANEL_W: u16 = 22;
const PANEL_GAP: u16 = 3;

const BG: Rgb = Rgb::new(0, 0, 0);
const FIELD: Rgb = Rgb::new(30, 30, 40);
const DANGER: Rgb = Rgb::new(60, 28, 34);
const TILE: Rgb = Rgb::new(60, 72, 120);
const TILE_FRESH: Rgb = Rgb::new(48, 112, 92);
const TILE_SELECTED: Rgb = Rgb::new(232, 190, 64);
const TILE_REJECTED: Rgb = Rgb::new(205, 60, 60);
const WHITE: Rgb = Rgb::new(240, 240, 240);
const TEXT: Rgb = Rgb::new(200, 200, 200);
const ACCENT: Rgb = Rgb::new(240, 200, 90);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Layout {
    frame_x: u16,
    frame_y: u16,
    frame_w: u16,
    frame_h: u16,
    panel_x: u16,
}

/// Terminal renderer for the tile grid, side panel and menu.
pub struct GameView {
    /// Grid cell width in terminal columns.
    cell_w: u16,
    /// Grid cell height in terminal rows.
    cell_h: u16,
}

impl Default for GameView {
    fn default() -> Self {
        // 4x2 keeps cells roughly square and leaves room for a centered digit.
        Self {
            cell_w: 4,
            cell_h: 2,
        }
    }
}

impl GameView {
    pub fn new(cell_w: u16, cell_h: u16) -> Self {
        Self {
            cell_w: cell_w.max(1),
            cell_h: cell_h.max(1),
        }
    }

    fn layout(&self, viewport: Viewport) -> Layout {
        let frame_w = GRID_WIDTH as u16 * self.cell_w + 2;
        let frame_h = GRID_HEIGHT as u16 * self.cell_h + 2;
        let total_w = frame_w + PANEL_GAP + PANEL_W;
        let frame_x = viewport.width.saturating_sub(total_w) / 2;
        let frame_y = viewport.height.saturating_sub(frame_h) / 2;
        Layout {
            frame_x,
            frame_y,
            frame_w,
            frame_h,
            panel_x: frame_x + frame_w + PANEL_GAP,
        }
    }

    /// Map a terminal position to the grid cell under it.
    pub fn hit_test(&self, viewport: Viewport, x: u16, y: u16) -> Option<Coord> {
        let l = self.layout(viewport);
        let inner_x = x.checked_sub(l.frame_x + 1)?;
        let inner_y = y.checked_sub(l.frame_y + 1)?;
        let col = inner_x / self.cell_w;
        let row = inner_y / self.cell_h;
        if col >= GRID_WIDTH as u16 || row >= GRID_HEIGHT as u16 {
            return None;
        }
        Some(Coord::new(row as u8, col as u8))
    }

    /// Render into an existing framebuffer.
    ///
    /// This is the allocation-free hot path. Callers can reuse a framebuffer
    /// across frames and only resize when the terminal size changes.
    pub fn render_into(
        &self,
        snap: &GameSnapshot,
        extras: &ViewExtras<'_>,
        viewport: Viewport,
        fb: &mut FrameBuffer,
    ) {
        fb.resize(viewport.width, viewport.height);
        fb.clear(CellStyle::new(TEXT, BG).cell(' '));

        if snap.in_menu() {
            self.draw_menu(fb, snap, extras, viewport);
            return;
        }

        let l = self.layout(viewport);
        fb.draw_box(
            l.frame_x,
            l.frame_y,
            l.frame_w,
            l.frame_h,
            CellStyle::new(TEXT, BG),
        );

        for row in 0..GRID_HEIGHT {
            for col in 0..GRID_WIDTH {
                self.draw_cell(fb, &l, snap, Coord::new(row, col));
            }
        }

        if let Some(at) = extras.cursor.filter(|_| snap.playable()) {
            self.draw_cursor(fb, &l, at);
        }

        self.draw_side_panel(fb, snap, extras, viewport, &l);

        if snap.is_paused() {
            self.draw_overlay(fb, &l, &["PAUSED", "p to resume"]);
        } else if snap.is_over() {
            self.draw_overlay(fb, &l, &["GAME OVER", "r restart", "m menu"]);
        }
    }

    /// Convenience helper that allocates a new framebuffer.
    pub fn render(&self, snap: &GameSnapshot, extras: &ViewExtras<'_>, viewport: Viewport) -> FrameBuffer {
        let mut fb = FrameBuffer::new(viewport.width, viewport.height);
        self.render_into(snap, extras, viewport, &mut fb);
        fb
    }

    fn cell_origin(&self, l: &Layout, at: Coord) -> (u16, u16) {
        (
            l.frame_x + 1 + at.col as u16 * self.cell_w,
            l.frame_y + 1 + at.row as u16 * self.cell_h,
        )
    }

    fn draw_cell(&self, fb: &mut FrameBuffer, l: &Layout, snap: &GameSnapshot, at: Coord) {
        let (px, py) = self.cell_origin(l, at);
        let (r, c) = (at.row as usize, at.col as usize);
        let mid_x = px + (self.cell_w - 1) / 2;
        let mid_y = py + (self.cell_h - 1) / 2;

        let Some(value) = snap.value_at(at) else {
            let bg = if at.row == 0 { DANGER } else { FIELD };
            fb.fill_rect(px, py, self.cell_w, self.cell_h, ' ', CellStyle::new(TEXT, bg));
            fb.put_char(mid_x, mid_y, '·', CellStyle::new(Rgb::new(90, 90, 100), bg).dim());
            return;
        };

        let style = if snap.selected[r][c] && snap.rejecting {
            CellStyle::new(WHITE, TILE_REJECTED)
        } else if snap.selected[r][c] {
            CellStyle::new(BG, TILE_SELECTED)
        } else if snap.fresh[r][c] {
            CellStyle::new(WHITE, TILE_FRESH)
        } else {
            CellStyle::new(WHITE, TILE)
        };
        fb.fill_rect(px, py, self.cell_w, self.cell_h, ' ', style);
        fb.put_char(mid_x, mid_y, (b'0' + value) as char, style.bold());
    }

    fn draw_cursor(&self, fb: &mut FrameBuffer, l: &Layout, at: Coord) {
        if self.cell_w < 3 {
            return;
        }
        let (px, py) = self.cell_origin(l, at);
        let mid_y = py + (self.cell_h - 1) / 2;
        for (x, ch) in [(px, '['), (px + self.cell_w - 1, ']')] {
            let bg = fb.get(x, mid_y).map(|c| c.style.bg).unwrap_or(BG);
            fb.put_char(x, mid_y, ch, CellStyle::new(ACCENT, bg).bold());
        }
    }

    fn draw_side_panel(
        &self,
        fb: &mut FrameBuffer,
        snap: &GameSnapshot,
        extras: &ViewExtras<'_>,
        viewport: Viewport,
        l: &Layout,
    ) {
        let x = l.panel_x;
        if x.saturating_add(12) > viewport.width {
            return;
        }

        let label = CellStyle::new(TEXT, BG).bold();
        let value = CellStyle::new(TEXT, BG);
        let mut y = l.frame_y;

        fb.put_str(x, y, "TARGET", label);
        fb.put_u32(x + 8, y, snap.target, CellStyle::new(ACCENT, BG).bold());
        y += 1;

        let sum_style = if snap.rejecting {
            CellStyle::new(TILE_REJECTED, BG).bold()
        } else if snap.selection_len > 0 {
            CellStyle::new(TILE_SELECTED, BG)
        } else {
            value
        };
        fb.put_str(x, y, "SUM", label);
        fb.put_u32(x + 8, y, snap.selection_sum, sum_style);
        y += 2;

        fb.put_str(x, y, "SCORE", label);
        fb.put_u32(x + 8, y, snap.score, value);
        y += 1;
        fb.put_str(x, y, "HIGH", label);
        fb.put_u32(x + 8, y, snap.high_score, value);
        y += 2;

        fb.put_str(x, y, "MODE", label);
        fb.put_str(x + 8, y, snap.mode.map(|m| m.as_str()).unwrap_or("-"), value);
        y += 1;

        if let (Some(left), Some(limit)) = (snap.time_remaining_ms, snap.time_limit_ms) {
            fb.put_str(x, y, "TIME", label);
            let urgent = left < 5_000;
            let style = if urgent {
                CellStyle::new(TILE_REJECTED, BG).bold()
            } else {
                value
            };
            let end = fb.put_u32(x + 8, y, left / 1000, style);
            fb.put_char(end, y, '.', style);
            let end = fb.put_u32(end + 1, y, (left % 1000) / 100, style);
            fb.put_char(end, y, 's', style);
            y += 1;
            draw_bar(fb, x, y, PANEL_W - 2, left, limit, style);
            y += 1;
        }
        y += 1;

        if let Some(ev) = snap.last_event {
            draw_event(fb, x, y, ev);
        }
        y += 2;

        fb.put_str(x, y, "AI", label);
        match extras.adapter {
            Some(st) => {
                let end = fb.put_str(x + 8, y, "clients ", value);
                fb.put_u32(end, y, st.client_count as u32, value);
                y += 1;
                fb.put_str(x + 8, y, "ctrl ", value);
                match st.controller_id {
                    Some(id) => fb.put_u32(x + 13, y, id as u32, value),
                    None => fb.put_str(x + 13, y, "-", value),
                };
            }
            None => {
                fb.put_str(x + 8, y, "off", value.dim());
            }
        }
        y += 2;

        let help = CellStyle::new(Rgb::new(130, 130, 140), BG);
        for line in [
            "arrows  move",
            "space   select",
            "click   select",
            "p pause  r restart",
            "m menu   q quit",
        ] {
            if y >= viewport.height {
                break;
            }
            fb.put_str(x, y, line, help);
            y += 1;
        }
    }

    fn draw_overlay(&self, fb: &mut FrameBuffer, l: &Layout, lines: &[&str]) {
        let style = CellStyle::new(WHITE, BG).bold();
        let top = l.frame_y + l.frame_h / 2 - (lines.len() as u16) / 2;
        for (i, line) in lines.iter().enumerate() {
            let y = top + i as u16;
            let len = line.chars().count() as u16 + 2;
            let x = l.frame_x + l.frame_w.saturating_sub(len) / 2;
            fb.fill_rect(x, y, len, 1, ' ', style);
            fb.put_str(x + 1, y, line, style);
        }
    }

    fn draw_menu(&self, fb: &mut FrameBuffer, snap: &GameSnapshot, extras: &ViewExtras<'_>, viewport: Viewport) {
        let w = viewport.width;
        let content_h = extras.cover.len() as u16 + 9;
        let mut y = viewport.height.saturating_sub(content_h) / 2;

        let art = CellStyle::new(ACCENT, BG);
        for line in extras.cover {
            fb.put_str_centered(0, y, w, line, art);
            y += 1;
        }
        y += 1;

        fb.put_str_centered(0, y, w, "S U M T I L E S", CellStyle::new(WHITE, BG).bold());
        y += 2;

        let hs_label = "HIGH SCORE ";
        let digits = count_digits(snap.high_score);
        let x = w.saturating_sub(hs_label.len() as u16 + digits) / 2;
        let end = fb.put_str(x, y, hs_label, CellStyle::new(TEXT, BG));
        fb.put_u32(end, y, snap.high_score, CellStyle::new(ACCENT, BG).bold());
        y += 2;

        let item = CellStyle::new(TEXT, BG);
        for (key, mode, blurb) in [
            ("[1]", Mode::Classic, "a new row after every clear"),
            ("[2]", Mode::Timed, "a new row when the clock runs out"),
        ] {
            let x = w.saturating_sub(44) / 2;
            let end = fb.put_str(x, y, key, CellStyle::new(ACCENT, BG).bold());
            let end = fb.put_str(end + 1, y, mode.as_str(), item.bold());
            fb.put_str(end.max(x + 13), y, blurb, item);
            y += 1;
        }
        y += 1;
        fb.put_str_centered(0, y, w, "[q] quit", item.dim());
    }
}

fn draw_bar(fb: &mut FrameBuffer, x: u16, y: u16, width: u16, value: u32, max: u32, style: CellStyle) {
    let filled = if max == 0 {
        0
    } else {
        ((value as u64 * width as u64 + max as u64 - 1) / max as u64).min(width as u64) as u16
    };
    fb.fill_rect(x, y, filled, 1, '█', style);
    fb.fill_rect(x + filled, y, width - filled, 1, '░', style.dim());
}

fn draw_event(fb: &mut FrameBuffer, x: u16, y: u16, ev: CoreEvent) {
    match ev {
        CoreEvent::Cleared { points, .. } => {
            let style = CellStyle::new(TILE_FRESH, BG).bold();
            fb.put_char(x, y, '+', style);
            fb.put_u32(x + 1, y, points, style);
        }
        CoreEvent::Rejected { .. } => {
            fb.put_str(x, y, "too high!", CellStyle::new(TILE_REJECTED, BG).bold());
        }
        CoreEvent::RowInjected => {
            fb.put_str(x, y, "new row", CellStyle::new(TEXT, BG).dim());
        }
        CoreEvent::GameOver => {
            fb.put_str(x, y, "board full", CellStyle::new(TILE_REJECTED, BG));
        }
    }
}

fn count_digits(mut v: u32) -> u16 {
    let mut n = 1;
    while v >= 10 {
        v /= 10;
        n += 1;
    }
    n
}
