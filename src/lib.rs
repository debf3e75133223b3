//! SumTiles (workspace facade crate).
//!
//! Re-exports the member crates under one name so the binary, the
//! integration tests and the benches can write `sumtiles::core::Game`
//! instead of depending on each crate separately.

pub use sumtiles_adapter as adapter;
pub use sumtiles_core as core;
pub use sumtiles_cover as cover;
pub use sumtiles_input as input;
pub use sumtiles_term as term;
pub use sumtiles_types as types;
