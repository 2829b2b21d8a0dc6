//! Networked Tetris (workspace facade crate).
//!
//! Re-exports the `net_tetris::{core,engine,adapter,types}` public API; the
//! implementation lives in dedicated crates under `crates/`.

pub use net_tetris_adapter as adapter;
pub use net_tetris_core as core;
pub use net_tetris_engine as engine;
pub use net_tetris_types as types;
