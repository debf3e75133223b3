//! Adapter module - external control via TCP socket with JSON protocol
//!
//! Lets an external agent (a bot, a test harness, a replay tool) drive the
//! game through the same commands a human player issues.
//!
//! # Protocol Overview
//!
//! The adapter speaks a **line-delimited JSON protocol** over TCP:
//!
//! 1. **Connection**: client connects (default: 127.0.0.1:7878)
//! 2. **Handshake**: client sends `hello`, server answers `welcome`
//! 3. **Controller assignment**: the first client to say hello controls the
//!    game; later clients observe. When the controller leaves, the lowest
//!    remaining client id takes over
//! 4. **Commanding**: the controller sends `command` messages; each one is
//!    acked after the game loop has applied it
//! 5. **Observation streaming**: clients that asked for it receive a full
//!    `observation` after every change
//!
//! # Commands
//!
//! | action | fields | effect |
//! |--------|--------|--------|
//! | `startGame` | `mode`: `classic` / `timed` | new session |
//! | `toggleCell` | `row`, `col` | select / deselect a tile |
//! | `togglePause` | | pause / resume |
//! | `restart` | | new session, same mode |
//! | `exitToMenu` | | discard the session |
//!
//! # Environment Variables
//!
//! - `SUMTILES_AI_HOST`: bind address (default "127.0.0.1")
//! - `SUMTILES_AI_PORT`: port (default 7878)
//! - `SUMTILES_AI_MAX_PENDING`: command queue bound (default 10)
//! - `SUMTILES_AI_DISABLED`: "1" or "true" disables the adapter
//!
//! # Example Protocol Flow
//!
//! ```text
//! C: {"type":"hello","seq":1,"ts":0,"client":{"name":"bot","version":"0.1"},"protocol_version":"1.0.0","requested":{"stream_observations":true}}
//! S: {"type":"welcome","seq":1,"ts":...,"protocol_version":"1.0.0","client_id":1,"role":"controller",...}
//! S: {"type":"observation","seq":1,"status":"menu",...}
//! C: {"type":"command","seq":2,"ts":0,"action":"startGame","mode":"classic"}
//! S: {"type":"ack","seq":2,"ts":...,"status":"ok"}
//! S: {"type":"observation","seq":2,"status":"active","grid":{...},"target":17,...}
//! ```

pub mod protocol;
pub mod runtime;
pub mod server;

pub use sumtiles_core as core;
pub use sumtiles_types as types;

pub use protocol::*;
pub use runtime::{Adapter, InboundCommand, InboundPayload, OutboundMessage};
pub use server::{build_observation, is_disabled, map_command, run_server, LinkStatus, ServerConfig};
