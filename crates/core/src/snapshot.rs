use crate::board::EncodedBoard;
use crate::game_state::Tetromino;
use crate::types::PieceKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActiveSnapshot {
    pub kind: PieceKind,
    pub orientation: u8,
    pub x: i8,
    pub y: i8,
    pub max_fall: u8,
}

impl From<Tetromino> for ActiveSnapshot {
    fn from(value: Tetromino) -> Self {
        Self {
            kind: value.kind,
            orientation: value.orientation,
            x: value.x,
            y: value.y,
            max_fall: value.max_fall,
        }
    }
}

/// Everything a player or watcher needs to redraw one game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GameSnapshot {
    pub live: ActiveSnapshot,
    pub next: PieceKind,
    pub board: EncodedBoard,
    pub game_over: bool,
}
