//! Session runtime - per-game locking, gravity and state fan-out
//!
//! This crate turns the pure [`net_tetris_core::GameState`] into live games:
//!
//! - [`sink`]: the outbound half of a connection (`send` + `is_closed`)
//! - [`registry`]: process-wide [`SessionRegistry`] mapping games to players and watchers
//! - [`session`]: [`GameSession`] (lock + emit), the gravity task, and the
//!   connection-scoped [`PlayerSession`] / [`ObserverSession`] guards
//!
//! Emission never fails from the caller's point of view: a closed sink is
//! skipped and every other sink still receives the message.

pub mod registry;
pub mod session;
pub mod sink;

pub use net_tetris_core as core;
pub use net_tetris_types as types;

pub use registry::SessionRegistry;
pub use session::{spawn_gravity, GameSession, ObserverSession, PlayerSession};
pub use sink::{Outbound, Sink, SinkId};
