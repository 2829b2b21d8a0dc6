//! Adapter module - WebSocket front end for players and observers
//!
//! Two kinds of client connect over WebSocket:
//!
//! - **Players** (`/ws`): each connection starts its own game and controls it
//!   with the tokens `cw`, `ccw`, `left`, `right`, `down` and `drop`.
//! - **Observers** (`/snoop`): read-only. `?` lists the games in progress and
//!   a game id switches the observer onto that game.
//!
//! Every state change of a game is sent as one JSON text frame to its player
//! and to everyone watching it. The frame that ends a game carries
//! `"event":"gameover"`.
//!
//! # Environment Variables
//!
//! - `TETRIS_HOST`: Bind address (default: "0.0.0.0")
//! - `TETRIS_PORT`: Port number (default: 8080)
//! - `TETRIS_GRAVITY_MS`: Gravity period in milliseconds (default: 500)
//!
//! # Example Protocol Flow
//!
//! ```text
//! Player   -> /ws     : (connects)
//! Server   -> Player  : {"live":[3,0,4,1,18],"next":6,"board":[0,0,...,0]}
//! Player   -> Server  : left
//! Server   -> Player  : {"live":[3,0,3,1,18],"next":6,"board":[0,0,...,0]}
//! Observer -> /snoop  : ?
//! Server   -> Observer: {"alive":[1]}
//! Observer -> Server  : 1
//! Server   -> Observer: {"live":[3,0,3,2,17],"next":6,"board":[0,0,...,0]}
//! ```

pub mod protocol;
pub mod server;

pub use net_tetris_core as core;
pub use net_tetris_engine as engine;
pub use net_tetris_types as types;

pub use protocol::{AliveMessage, GameEvent, StateMessage};
pub use server::{router, run_server, shutdown_signal, AppState, ServerConfig};
