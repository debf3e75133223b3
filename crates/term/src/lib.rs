//! Terminal game renderer.
//!
//! A small, game-oriented rendering layer: the view draws a `GameSnapshot`
//! into a plain framebuffer, and the renderer diffs framebuffers onto the real
//! terminal. No widget toolkit is involved.
//!
//! - `GameView` is pure and unit-tested, including mouse hit testing
//! - `TerminalRenderer` owns all terminal I/O
//! - `RenderThrottle` keeps idle screens from repainting every tick

pub mod fb;
pub mod game_view;
pub mod render_throttle;
pub mod renderer;

pub use sumtiles_core as core;
pub use sumtiles_types as types;

pub use fb::{Cell, CellStyle, FrameBuffer, Rgb};
pub use game_view::{AdapterStatusView, GameView, ViewExtras, Viewport};
pub use render_throttle::RenderThrottle;
pub use renderer::{encode_diff_into, encode_full_into, TerminalRenderer};
