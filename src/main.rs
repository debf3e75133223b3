//! Terminal SumTiles runner (default binary).
//!
//! Owns the terminal: crossterm for keyboard and mouse input, the
//! framebuffer renderer for output. An optional TCP adapter lets external
//! agents drive the same game.

use std::fs::OpenOptions;
use std::hash::Hasher;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind, MouseButton, MouseEventKind};

use sumtiles::adapter::Adapter;
use sumtiles::core::{Fnv1aHasher, Game, GameConfig, GameSnapshot};
use sumtiles::cover::{self, CoverArt, CoverFetch};
use sumtiles::input::{handle_key_event, should_quit, Cursor};
use sumtiles::term::{
    AdapterStatusView, FrameBuffer, GameView, RenderThrottle, TerminalRenderer, ViewExtras,
    Viewport,
};
use sumtiles::types::{Command, TICK_MS};

/// Idle redraw interval; changed frames are drawn immediately.
const RENDER_INTERVAL_MS: u64 = 250;

fn main() -> Result<()> {
    init_logging();

    let mut game = Game::new(GameConfig::from_env());

    // The game is playable without the adapter, so a bind failure is not fatal.
    let mut adapter = match Adapter::start_from_env() {
        Ok(adapter) => adapter,
        Err(e) => {
            log::warn!("adapter unavailable: {:#}", e);
            None
        }
    };
    if let Some(adapter) = &adapter {
        log::info!("adapter listening on {}", adapter.local_addr());
    }

    let fetch = cover::fetch_cover_image(cover::path_from_env(), cover::DEFAULT_TIMEOUT);

    let mut term = TerminalRenderer::new();
    term.enter()?;

    let result = run(&mut term, &mut game, adapter.as_mut(), fetch);

    // Always try to restore terminal state.
    let _ = term.exit();
    log::info!("exiting with high score {}", game.high_score());
    result
}

/// Log to `SUMTILES_LOG_PATH` when set; the terminal itself belongs to the game.
fn init_logging() {
    let Some(path) = std::env::var_os("SUMTILES_LOG_PATH").filter(|p| !p.is_empty()) else {
        return;
    };
    let file = match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("sumtiles: cannot open log file {:?}: {}", path, e);
            return;
        }
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
}

fn run(
    term: &mut TerminalRenderer,
    game: &mut Game,
    mut adapter: Option<&mut Adapter>,
    mut fetch: CoverFetch,
) -> Result<()> {
    let view = GameView::default();
    let mut cursor = Cursor::new();
    let mut cover = CoverArt::placeholder();

    let mut fb = FrameBuffer::new(0, 0);
    let mut snap = GameSnapshot::default();
    let mut throttle = RenderThrottle::new(RENDER_INTERVAL_MS);
    let mut viewport = current_viewport();

    let started = Instant::now();
    let tick_duration = Duration::from_millis(TICK_MS as u64);
    let mut last_tick = Instant::now();

    // Streaming clients get the initial menu state too.
    let mut changed = true;

    loop {
        let now = Instant::now();

        if let Some(art) = fetch.try_take() {
            cover = art;
            throttle.invalidate();
        }

        if let Some(adapter) = adapter.as_deref_mut() {
            changed |= adapter.pump(game, now);
        }

        game.snapshot_into(now, &mut snap);

        if changed {
            if let Some(adapter) = adapter.as_deref_mut() {
                adapter.broadcast(&snap);
            }
            changed = false;
        }

        // Render.
        let next_viewport = current_viewport();
        if next_viewport != viewport {
            viewport = next_viewport;
            term.invalidate();
            throttle.invalidate();
        }
        let extras = ViewExtras {
            cursor: Some(cursor.coord()),
            adapter: adapter.as_deref().map(|a| AdapterStatusView {
                client_count: a.client_count().min(u16::MAX as usize) as u16,
                controller_id: a.controller_id(),
            }),
            cover: cover.lines(),
        };
        let now_ms = started.elapsed().as_millis() as u64;
        if throttle.should_render(now_ms, frame_fingerprint(&snap, &extras)) {
            view.render_into(&snap, &extras, viewport, &mut fb);
            term.draw_swap(&mut fb)?;
        }

        // Input with timeout until next tick.
        let timeout = tick_duration
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);

        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if should_quit(key) {
                        return Ok(());
                    }
                    if let Some(command) =
                        handle_key_event(key, game.in_menu()).and_then(|a| cursor.apply(a))
                    {
                        changed |= apply_command(game, &mut cursor, command);
                    }
                }
                Event::Mouse(mouse) if mouse.kind == MouseEventKind::Down(MouseButton::Left) => {
                    if let Some(at) = view.hit_test(viewport, mouse.column, mouse.row) {
                        cursor.set(at);
                        changed |= apply_command(game, &mut cursor, Command::ToggleCell(at));
                    }
                }
                Event::Resize(..) => {
                    term.invalidate();
                    throttle.invalidate();
                }
                _ => {}
            }
        }

        // Tick.
        if last_tick.elapsed() >= tick_duration {
            last_tick = Instant::now();
            changed |= game.tick(last_tick);
        }
    }
}

fn apply_command(game: &mut Game, cursor: &mut Cursor, command: Command) -> bool {
    if matches!(command, Command::StartGame(_) | Command::Restart) {
        *cursor = Cursor::new();
    }
    game.apply(command, Instant::now())
}

fn current_viewport() -> Viewport {
    let (w, h) = crossterm::terminal::size().unwrap_or((80, 24));
    Viewport::new(w, h)
}

/// Everything on screen: the game plus cursor, adapter status and cover.
fn frame_fingerprint(snap: &GameSnapshot, extras: &ViewExtras<'_>) -> u64 {
    let mut h = Fnv1aHasher::new();
    h.write_u64(snap.fingerprint());
    if let Some(at) = extras.cursor {
        h.write_u8(at.row);
        h.write_u8(at.col);
    }
    if let Some(status) = extras.adapter {
        h.write_u16(status.client_count);
        h.write_usize(status.controller_id.map_or(usize::MAX, |id| id));
    }
    h.write_usize(extras.cover.len());
    h.finish()
}
