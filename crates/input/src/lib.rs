//! Terminal input module (engine-facing).
//!
//! Maps `crossterm` key events to [`InputAction`]s and resolves them against a
//! keyboard [`Cursor`] into [`crate::types::Command`]s. Mouse clicks are hit
//! tested by the view and fed in through [`Cursor::set`].

pub mod cursor;
pub mod map;

pub use sumtiles_types as types;

pub use cursor::Cursor;
pub use map::{handle_key_event, should_quit, Direction, InputAction};
