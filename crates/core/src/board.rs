//! Board module - manages the game grid
//!
//! The board is a 10x20 grid where each cell can be empty or filled with a piece kind.
//! Uses a flat array for better cache locality and zero-allocation.
//! Coordinates: (x, y) where x ranges 0..9 (left to right), y ranges 0..19 (top to bottom)
//!
//! Rows travel over the wire packed as base-8 integers: each cell is the settled
//! piece's wire id (0 when empty) in 3 bits, leftmost column most significant.

use arrayvec::ArrayVec;

use crate::pieces::MinoOffset;
use crate::types::{Cell, PieceKind, BOARD_HEIGHT, BOARD_WIDTH, CELL_BITS};

/// Total number of cells on the board
const BOARD_SIZE: usize = (BOARD_WIDTH as usize) * (BOARD_HEIGHT as usize);

/// Row indices removed by a single clear, top to bottom
pub type ClearedRows = ArrayVec<usize, { BOARD_HEIGHT as usize }>;

/// One packed row per board row, top row first
pub type EncodedBoard = [u64; BOARD_HEIGHT as usize];

/// The game board - 10 columns x 20 rows using flat array storage
#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    /// Flat array of cells, row-major order (y * WIDTH + x)
    cells: [Cell; BOARD_SIZE],
}

impl Board {
    /// Create a new empty board
    pub fn new() -> Self {
        Self {
            cells: [None; BOARD_SIZE],
        }
    }

    /// Calculate flat index from (x, y) coordinates
    #[inline(always)]
    fn index(x: i8, y: i8) -> Option<usize> {
        if Self::is_out_of_bounds(x, y) {
            return None;
        }
        Some((y as usize) * (BOARD_WIDTH as usize) + (x as usize))
    }

    pub fn width(&self) -> u8 {
        BOARD_WIDTH
    }

    pub fn height(&self) -> u8 {
        BOARD_HEIGHT
    }

    /// Get cell at position (x, y)
    /// Returns None if out of bounds
    pub fn get(&self, x: i8, y: i8) -> Option<Cell> {
        Self::index(x, y).map(|idx| self.cells[idx])
    }

    /// Set cell at position (x, y)
    /// Returns false if out of bounds
    pub fn set(&mut self, x: i8, y: i8, cell: Cell) -> bool {
        match Self::index(x, y) {
            Some(idx) => {
                self.cells[idx] = cell;
                true
            }
            None => false,
        }
    }

    /// Check if position is within bounds and empty
    pub fn is_valid(&self, x: i8, y: i8) -> bool {
        matches!(self.get(x, y), Some(None))
    }

    #[inline(always)]
    pub fn is_out_of_bounds(x: i8, y: i8) -> bool {
        x < 0 || x >= BOARD_WIDTH as i8 || y < 0 || y >= BOARD_HEIGHT as i8
    }

    /// True iff any block lies off the board or on a filled cell
    pub fn collides(&self, blocks: &[MinoOffset]) -> bool {
        blocks.iter().any(|&(x, y)| !self.is_valid(x, y))
    }

    /// Write `kind` into every given cell.
    ///
    /// Callers guarantee the blocks do not collide; out-of-bounds blocks are skipped.
    pub fn settle(&mut self, blocks: &[MinoOffset], kind: PieceKind) {
        for &(x, y) in blocks {
            self.set(x, y, Some(kind));
        }
    }

    fn row(&self, y: usize) -> &[Cell] {
        let start = y * BOARD_WIDTH as usize;
        &self.cells[start..start + BOARD_WIDTH as usize]
    }

    /// Check if a row is completely filled
    pub fn is_row_full(&self, y: usize) -> bool {
        if y >= BOARD_HEIGHT as usize {
            return false;
        }
        self.row(y).iter().all(|cell| cell.is_some())
    }

    /// Remove every full row; surviving rows keep their order and empty rows fill the top.
    /// Returns the cleared row indices (top to bottom, pre-clear coordinates).
    pub fn clear_full_rows(&mut self) -> ClearedRows {
        let mut cleared_rows = ClearedRows::new();
        let width = BOARD_WIDTH as usize;
        let mut write_y = BOARD_HEIGHT as usize;

        // Scan from bottom to top, compacting survivors downward
        for read_y in (0..BOARD_HEIGHT as usize).rev() {
            if self.is_row_full(read_y) {
                cleared_rows.push(read_y);
            } else {
                write_y -= 1;
                if write_y != read_y {
                    let src_start = read_y * width;
                    self.cells
                        .copy_within(src_start..src_start + width, write_y * width);
                }
            }
        }

        for cell in &mut self.cells[..write_y * width] {
            *cell = None;
        }

        cleared_rows.reverse();
        cleared_rows
    }

    /// Pack row `y` into a base-8 integer, leftmost cell most significant
    pub fn encode_row(&self, y: usize) -> u64 {
        encode_cells(self.row(y))
    }

    /// Packed rows, top row first
    pub fn encode(&self) -> EncodedBoard {
        std::array::from_fn(|y| self.encode_row(y))
    }

    /// Rebuild a board from its packed rows.
    /// Cell values that are not valid piece ids decode as empty.
    pub fn from_encoded(rows: &EncodedBoard) -> Self {
        let mut board = Self::new();
        for (y, &value) in rows.iter().enumerate() {
            let start = y * BOARD_WIDTH as usize;
            board.cells[start..start + BOARD_WIDTH as usize].copy_from_slice(&decode_row(value));
        }
        board
    }

    /// Get a reference to the internal cells array
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Build a board from text rows (top first): `.` is empty, a piece letter fills the cell.
    /// Missing rows at the top are empty. Intended for tests and fixtures.
    pub fn from_ascii(rows: &[&str]) -> Self {
        let mut board = Self::new();
        let offset = (BOARD_HEIGHT as usize).saturating_sub(rows.len());
        for (i, row) in rows.iter().take(BOARD_HEIGHT as usize).enumerate() {
            for (x, ch) in row.chars().take(BOARD_WIDTH as usize).enumerate() {
                let cell = PieceKind::ALL
                    .into_iter()
                    .find(|k| k.as_str().starts_with(ch.to_ascii_lowercase()));
                board.set(x as i8, (offset + i) as i8, cell);
            }
        }
        board
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

/// Pack a row of cells into a base-8 integer
pub fn encode_cells(row: &[Cell]) -> u64 {
    row.iter().fold(0u64, |acc, cell| {
        (acc << CELL_BITS) | u64::from(cell.map(PieceKind::id).unwrap_or(0))
    })
}

/// Unpack a base-8 row value produced by [`encode_cells`]
pub fn decode_row(value: u64) -> [Cell; BOARD_WIDTH as usize] {
    let mask = (1u64 << CELL_BITS) - 1;
    std::array::from_fn(|x| {
        let shift = CELL_BITS * (BOARD_WIDTH as u32 - 1 - x as u32);
        PieceKind::from_id(((value >> shift) & mask) as u8)
    })
}
