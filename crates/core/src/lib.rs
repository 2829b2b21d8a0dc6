//! Core game logic module - pure, deterministic, and testable
//!
//! This module contains all the game rules and simulation logic for one game.
//! It has **zero dependencies** on networking, timers, or I/O, making it:
//!
//! - **Deterministic**: Same seed produces identical piece sequences
//! - **Testable**: Unit tests for every geometry and lifecycle rule
//! - **Portable**: The session runtime wraps it; nothing here knows about sockets
//!
//! # Module Structure
//!
//! - [`board`]: 10x20 game board with collision detection, row clearing and row packing
//! - [`game_state`]: Live and preview pieces, command handling and the game-over transition
//! - [`pieces`]: Tetromino shape table, spawn geometry, fall distance and wall-kicked rotation
//! - [`rng`]: Seeded uniform piece generation
//! - [`snapshot`]: Copyable view of a game for broadcasting
//!
//! # Example
//!
//! ```
//! use net_tetris_core::{GameState, Outcome};
//! use net_tetris_types::Command;
//!
//! let mut game = GameState::new(12345);
//!
//! assert_eq!(game.apply(Command::Down), Outcome::Moved);
//! assert!(game.apply(Command::Drop).emits());
//! assert!(game.running());
//! ```

pub mod board;
pub mod game_state;
pub mod pieces;
pub mod rng;
pub mod snapshot;

pub use net_tetris_types as types;

// Re-export commonly used types for convenience
pub use board::{decode_row, Board, EncodedBoard};
pub use game_state::{GameState, Outcome, Tetromino};
pub use pieces::{absolute_blocks, get_shape, initial_position, max_fall_distance, try_rotate};
pub use rng::{PieceGenerator, SimpleRng};
pub use snapshot::{ActiveSnapshot, GameSnapshot};
