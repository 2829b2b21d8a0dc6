//! Core types module - shared data structures and constants
//!
//! This module defines the fundamental types used throughout the server.
//! All types are pure data structures with no external dependencies, making them
//! usable in any context (core logic, session runtime, wire protocol).
//!
//! # Board Dimensions
//!
//! - **Width**: 10 columns (indexed 0-9)
//! - **Height**: 20 rows (indexed 0-19, row 0 at the top)
//! - **Spawn column**: 4 (pieces spawn with their topmost block on row 0)
//!
//! # Timing
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `GRAVITY_MS` | 500 | Interval between autonomous gravity ticks |
//!
//! # Examples
//!
//! ```
//! use net_tetris_types::{Command, PieceKind, RotateDirection, BOARD_HEIGHT, BOARD_WIDTH};
//!
//! // Wire ids are 1-based, 0 is reserved for an empty cell
//! assert_eq!(PieceKind::I.id(), 1);
//! assert_eq!(PieceKind::from_id(7), Some(PieceKind::L));
//! assert_eq!(PieceKind::from_id(0), None);
//!
//! // Player tokens
//! assert_eq!(Command::from_token("cw"), Some(Command::Rotate(RotateDirection::Cw)));
//! assert_eq!(Command::from_token("jump"), None);
//!
//! assert_eq!(BOARD_WIDTH, 10);
//! assert_eq!(BOARD_HEIGHT, 20);
//! ```

/// Board width in cells (10 columns)
pub const BOARD_WIDTH: u8 = 10;

/// Board height in cells (20 rows)
pub const BOARD_HEIGHT: u8 = 20;

/// Column of the reference point for every freshly spawned piece
pub const SPAWN_X: i8 = 4;

/// Gravity interval in milliseconds (one row every half second)
pub const GRAVITY_MS: u64 = 500;

/// Bits used per cell in the packed row encoding (values 0..=7)
pub const CELL_BITS: u32 = 3;

/// Identifier of a game. A game is identified by its player's connection id.
pub type GameId = u64;

/// The seven tetromino piece kinds
///
/// The discriminant order matches the wire ids: I=1, O=2, T=3, S=4, Z=5, J=6, L=7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    I,
    O,
    T,
    S,
    Z,
    J,
    L,
}

impl PieceKind {
    /// All kinds in wire-id order
    pub const ALL: [PieceKind; 7] = [
        PieceKind::I,
        PieceKind::O,
        PieceKind::T,
        PieceKind::S,
        PieceKind::Z,
        PieceKind::J,
        PieceKind::L,
    ];

    /// Wire id of this kind (1..=7)
    pub fn id(self) -> u8 {
        match self {
            PieceKind::I => 1,
            PieceKind::O => 2,
            PieceKind::T => 3,
            PieceKind::S => 4,
            PieceKind::Z => 5,
            PieceKind::J => 6,
            PieceKind::L => 7,
        }
    }

    /// Parse a wire id. Returns None for 0 (empty) and anything above 7.
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1..=7 => Some(Self::ALL[(id - 1) as usize]),
            _ => None,
        }
    }

    /// Convert to lowercase string
    pub fn as_str(&self) -> &'static str {
        match self {
            PieceKind::I => "i",
            PieceKind::O => "o",
            PieceKind::T => "t",
            PieceKind::S => "s",
            PieceKind::Z => "z",
            PieceKind::J => "j",
            PieceKind::L => "l",
        }
    }
}

/// Cell on the board (None = empty, Some = filled with piece kind)
pub type Cell = Option<PieceKind>;

/// Rotation direction for a rotate command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RotateDirection {
    Cw,
    Ccw,
}

impl RotateDirection {
    /// Orientation index after rotating from `current` in a shape with `count` orientations
    pub fn apply(self, current: u8, count: u8) -> u8 {
        match self {
            RotateDirection::Cw => (current + 1) % count,
            RotateDirection::Ccw => (current + count - 1) % count,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RotateDirection::Cw => "cw",
            RotateDirection::Ccw => "ccw",
        }
    }
}

/// Player commands accepted on a play connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Rotate(RotateDirection),
    Left,
    Right,
    Down,
    Drop,
}

impl Command {
    /// Parse a plain-text player token. Unknown tokens yield None.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "cw" => Some(Command::Rotate(RotateDirection::Cw)),
            "ccw" => Some(Command::Rotate(RotateDirection::Ccw)),
            "left" => Some(Command::Left),
            "right" => Some(Command::Right),
            "down" => Some(Command::Down),
            "drop" => Some(Command::Drop),
            _ => None,
        }
    }

    /// Wire token for this command
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Rotate(dir) => dir.as_str(),
            Command::Left => "left",
            Command::Right => "right",
            Command::Down => "down",
            Command::Drop => "drop",
        }
    }
}

/// Requests accepted on an observer connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObserverRequest {
    /// `?`: list the games that can be watched
    ListGames,
    /// An integer token: watch that game
    Subscribe(GameId),
}

impl ObserverRequest {
    /// Parse a plain-text observer token. Anything else yields None.
    pub fn parse(token: &str) -> Option<Self> {
        if token == "?" {
            return Some(ObserverRequest::ListGames);
        }
        token.parse::<GameId>().ok().map(ObserverRequest::Subscribe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn piece_ids_roundtrip_and_fit_cell_bits() {
        for kind in PieceKind::ALL {
            assert_eq!(PieceKind::from_id(kind.id()), Some(kind));
            assert!(u32::from(kind.id()) < (1 << CELL_BITS));
        }
        assert_eq!(PieceKind::from_id(8), None);
    }

    #[test]
    fn rotate_direction_wraps() {
        assert_eq!(RotateDirection::Cw.apply(3, 4), 0);
        assert_eq!(RotateDirection::Ccw.apply(0, 4), 3);
        assert_eq!(RotateDirection::Cw.apply(0, 1), 0);
        assert_eq!(RotateDirection::Ccw.apply(1, 2), 0);
    }

    #[test]
    fn command_tokens() {
        for token in ["cw", "ccw", "left", "right", "down", "drop"] {
            let cmd = Command::from_token(token).unwrap();
            assert_eq!(cmd.as_str(), token);
        }
        assert_eq!(Command::from_token("CW"), None);
        assert_eq!(Command::from_token(""), None);
    }

    #[test]
    fn observer_requests() {
        assert_eq!(ObserverRequest::parse("?"), Some(ObserverRequest::ListGames));
        assert_eq!(ObserverRequest::parse("42"), Some(ObserverRequest::Subscribe(42)));
        assert_eq!(ObserverRequest::parse("-1"), None);
        assert_eq!(ObserverRequest::parse("game"), None);
        assert_eq!(ObserverRequest::parse("??"), None);
    }
}
