//! Pieces module - Tetromino shape table, spawn geometry and rotation with wall kicks
//!
//! Offsets are relative to a pivot, x grows to the right and y grows downward.
//! Orientation `k + 1` is the clockwise rotation of orientation `k`. Symmetric
//! shapes carry fewer orientations: O has one, I/S/Z have two, T/J/L have four.
//! No orientation-0 offset has a positive dy, so a piece spawned at
//! `initial_position` always has its topmost block on row 0.

use crate::board::Board;
use crate::types::{PieceKind, RotateDirection, BOARD_HEIGHT, SPAWN_X};

/// Offset of a single mino relative to piece origin
pub type MinoOffset = (i8, i8);

/// Shape of a piece - 4 mino offsets from piece origin
pub type PieceShape = [MinoOffset; 4];

const I_SHAPES: [PieceShape; 2] = [
    [(-1, 0), (0, 0), (1, 0), (2, 0)],
    [(0, -1), (0, 0), (0, 1), (0, 2)],
];

const O_SHAPES: [PieceShape; 1] = [[(0, 0), (1, 0), (0, 1), (1, 1)]];

const T_SHAPES: [PieceShape; 4] = [
    [(0, -1), (-1, 0), (0, 0), (1, 0)],
    [(0, -1), (0, 0), (1, 0), (0, 1)],
    [(-1, 0), (0, 0), (1, 0), (0, 1)],
    [(0, -1), (-1, 0), (0, 0), (0, 1)],
];

const S_SHAPES: [PieceShape; 2] = [
    [(0, -1), (1, -1), (-1, 0), (0, 0)],
    [(0, -1), (0, 0), (1, 0), (1, 1)],
];

const Z_SHAPES: [PieceShape; 2] = [
    [(-1, -1), (0, -1), (0, 0), (1, 0)],
    [(1, -1), (0, 0), (1, 0), (0, 1)],
];

const J_SHAPES: [PieceShape; 4] = [
    [(-1, -1), (-1, 0), (0, 0), (1, 0)],
    [(0, -1), (1, -1), (0, 0), (0, 1)],
    [(-1, 0), (0, 0), (1, 0), (1, 1)],
    [(0, -1), (0, 0), (-1, 1), (0, 1)],
];

const L_SHAPES: [PieceShape; 4] = [
    [(1, -1), (-1, 0), (0, 0), (1, 0)],
    [(0, -1), (0, 0), (0, 1), (1, 1)],
    [(-1, 0), (0, 0), (1, 0), (-1, 1)],
    [(-1, -1), (0, -1), (0, 0), (0, 1)],
];

/// Horizontal offsets tried, in order, when an in-place rotation collides
pub const WALL_KICKS: [i8; 4] = [-1, 1, -2, 2];

/// All orientations of a piece kind
pub fn orientations(kind: PieceKind) -> &'static [PieceShape] {
    match kind {
        PieceKind::I => &I_SHAPES,
        PieceKind::O => &O_SHAPES,
        PieceKind::T => &T_SHAPES,
        PieceKind::S => &S_SHAPES,
        PieceKind::Z => &Z_SHAPES,
        PieceKind::J => &J_SHAPES,
        PieceKind::L => &L_SHAPES,
    }
}

/// Number of distinct orientations (1, 2 or 4)
pub fn orientation_count(kind: PieceKind) -> u8 {
    orientations(kind).len() as u8
}

/// Get the shape (mino offsets) for a piece kind and orientation index.
/// The index wraps, so every `u8` names a valid orientation.
pub fn get_shape(kind: PieceKind, orientation: u8) -> PieceShape {
    let shapes = orientations(kind);
    shapes[orientation as usize % shapes.len()]
}

/// Shape offsets translated to board coordinates
pub fn absolute_blocks(kind: PieceKind, orientation: u8, x: i8, y: i8) -> PieceShape {
    get_shape(kind, orientation).map(|(dx, dy)| (x + dx, y + dy))
}

/// Spawn reference point: fixed column, row chosen so the topmost block sits on row 0
pub fn initial_position(kind: PieceKind) -> (i8, i8) {
    let min_dy = get_shape(kind, 0)
        .iter()
        .map(|&(_, dy)| dy)
        .min()
        .unwrap_or(0);
    (SPAWN_X, min_dy.abs())
}

/// Number of further rows the piece can fall before the next step would collide.
///
/// Probes distances `1, 2, ..` and stops at the first colliding one. A pose that
/// never collides within the board height reports `BOARD_HEIGHT - 1`.
pub fn max_fall_distance(board: &Board, kind: PieceKind, orientation: u8, x: i8, y: i8) -> u8 {
    let shape = get_shape(kind, orientation);
    for distance in 1..BOARD_HEIGHT as i8 {
        let probe = shape.map(|(dx, dy)| (x + dx, y + dy + distance));
        if board.collides(&probe) {
            return (distance - 1) as u8;
        }
    }
    BOARD_HEIGHT - 1
}

/// Try to rotate a piece, nudging it below the top edge and then wall-kicking.
///
/// Returns `Some((orientation, x, y))` for the accepted pose, or None if every
/// candidate collides and the rotation must be abandoned.
pub fn try_rotate(
    kind: PieceKind,
    orientation: u8,
    x: i8,
    y: i8,
    direction: RotateDirection,
    collides: impl Fn(&PieceShape) -> bool,
) -> Option<(u8, i8, i8)> {
    let new_orientation = direction.apply(orientation, orientation_count(kind));

    let mut new_y = y;
    let candidate = absolute_blocks(kind, new_orientation, x, new_y);
    let min_y = candidate.iter().map(|&(_, by)| by).min().unwrap_or(0);
    if min_y < 0 {
        new_y -= min_y;
    }

    if !collides(&absolute_blocks(kind, new_orientation, x, new_y)) {
        return Some((new_orientation, x, new_y));
    }

    WALL_KICKS.iter().find_map(|&dx| {
        let kicked_x = x + dx;
        if collides(&absolute_blocks(kind, new_orientation, kicked_x, new_y)) {
            None
        } else {
            Some((new_orientation, kicked_x, new_y))
        }
    })
}
