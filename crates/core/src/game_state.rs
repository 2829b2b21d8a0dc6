//! Game state module - one game's board, falling piece and preview piece
//!
//! Every command returns an [`Outcome`]. Anything other than [`Outcome::Ignored`]
//! changed the observable state and must be followed by a state emission;
//! [`Outcome::GameOver`] asks for the terminal message instead.
//!
//! Lifecycle: `running` starts true and flips to false exactly once, when the
//! promoted preview piece collides at its spawn pose. After that every command
//! is a no-op.

use crate::board::Board;
use crate::pieces::{absolute_blocks, initial_position, max_fall_distance, try_rotate, PieceShape};
use crate::rng::PieceGenerator;
use crate::snapshot::GameSnapshot;
use crate::types::{Command, PieceKind, RotateDirection};

/// A piece with a pose on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tetromino {
    pub kind: PieceKind,
    pub orientation: u8,
    pub x: i8,
    pub y: i8,
    /// Rows the piece can still fall before the next step would collide
    pub max_fall: u8,
}

impl Tetromino {
    /// Create a new tetromino at its spawn pose (fall distance not yet computed)
    pub fn spawn(kind: PieceKind) -> Self {
        let (x, y) = initial_position(kind);
        Self {
            kind,
            orientation: 0,
            x,
            y,
            max_fall: 0,
        }
    }

    /// Absolute board coordinates of the four minos
    pub fn blocks(&self) -> PieceShape {
        absolute_blocks(self.kind, self.orientation, self.x, self.y)
    }

    pub fn collides(&self, board: &Board) -> bool {
        board.collides(&self.blocks())
    }

    /// Recompute `max_fall` for the current pose and board occupancy
    pub fn refresh_max_fall(&mut self, board: &Board) {
        self.max_fall = max_fall_distance(board, self.kind, self.orientation, self.x, self.y);
    }
}

/// Result of applying one command or gravity tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing changed: rejected translation, or the game is already over
    Ignored,
    /// The live piece moved or rotated (or a rotation was attempted)
    Moved,
    /// The live piece settled and the preview piece took its place
    Locked { lines_cleared: u8 },
    /// The promoted piece collided at spawn; the game has ended
    GameOver,
}

impl Outcome {
    /// Whether this outcome must be followed by a state message
    pub fn emits(&self) -> bool {
        !matches!(self, Outcome::Ignored)
    }

    pub fn is_game_over(&self) -> bool {
        matches!(self, Outcome::GameOver)
    }
}

/// Complete state of one game
#[derive(Debug, Clone)]
pub struct GameState {
    board: Board,
    live: Tetromino,
    next: Tetromino,
    generator: PieceGenerator,
    running: bool,
}

impl GameState {
    /// Create a new game on an empty board with the given RNG seed
    pub fn new(seed: u32) -> Self {
        let mut generator = PieceGenerator::new(seed);
        let live = generator.draw();
        let next = generator.draw();
        Self::assemble(Board::new(), live, next, generator)
    }

    /// Create a game over a prepared board with chosen live and preview kinds.
    /// Later pieces come from `seed`.
    pub fn from_parts(board: Board, live: PieceKind, next: PieceKind, seed: u32) -> Self {
        Self::assemble(board, live, next, PieceGenerator::new(seed))
    }

    fn assemble(board: Board, live: PieceKind, next: PieceKind, generator: PieceGenerator) -> Self {
        let mut live = Tetromino::spawn(live);
        live.refresh_max_fall(&board);
        let running = !live.collides(&board);
        Self {
            board,
            live,
            next: Tetromino::spawn(next),
            generator,
            running,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn live(&self) -> Tetromino {
        self.live
    }

    pub fn next(&self) -> Tetromino {
        self.next
    }

    pub fn running(&self) -> bool {
        self.running
    }

    pub fn game_over(&self) -> bool {
        !self.running
    }

    pub fn seed(&self) -> u32 {
        self.generator.seed()
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            live: self.live.into(),
            next: self.next.kind,
            board: self.board.encode(),
            game_over: !self.running,
        }
    }

    /// Dispatch a player command
    pub fn apply(&mut self, command: Command) -> Outcome {
        match command {
            Command::Rotate(direction) => self.rotate(direction),
            Command::Left => self.move_left(),
            Command::Right => self.move_right(),
            Command::Down => self.move_down(),
            Command::Drop => self.drop(),
        }
    }

    /// One gravity step, identical to an explicit `down`
    pub fn tick(&mut self) -> Outcome {
        self.move_down()
    }

    pub fn move_left(&mut self) -> Outcome {
        self.shift(-1)
    }

    pub fn move_right(&mut self) -> Outcome {
        self.shift(1)
    }

    fn shift(&mut self, dx: i8) -> Outcome {
        if !self.running {
            return Outcome::Ignored;
        }

        let mut moved = self.live;
        moved.x += dx;
        if moved.collides(&self.board) {
            return Outcome::Ignored;
        }

        moved.refresh_max_fall(&self.board);
        self.live = moved;
        Outcome::Moved
    }

    /// Fall one row, or settle and promote the preview when resting
    pub fn move_down(&mut self) -> Outcome {
        if !self.running {
            return Outcome::Ignored;
        }

        if self.live.max_fall > 0 {
            self.live.y += 1;
            self.live.max_fall -= 1;
            return Outcome::Moved;
        }

        self.lock_and_promote()
    }

    /// Rotate with top-edge nudge and wall kicks. Always emits while running,
    /// even when every candidate collides and the pose is left unchanged.
    pub fn rotate(&mut self, direction: RotateDirection) -> Outcome {
        if !self.running {
            return Outcome::Ignored;
        }

        let live = self.live;
        let board = &self.board;
        if let Some((orientation, x, y)) =
            try_rotate(live.kind, live.orientation, live.x, live.y, direction, |blocks| {
                board.collides(blocks)
            })
        {
            self.live.orientation = orientation;
            self.live.x = x;
            self.live.y = y;
        }

        self.live.refresh_max_fall(&self.board);
        Outcome::Moved
    }

    /// Fall the full distance in one step, then settle and promote
    pub fn drop(&mut self) -> Outcome {
        if !self.running {
            return Outcome::Ignored;
        }

        self.live.y += self.live.max_fall as i8;
        self.live.max_fall = 0;
        self.lock_and_promote()
    }

    fn lock_and_promote(&mut self) -> Outcome {
        self.board.settle(&self.live.blocks(), self.live.kind);
        let lines_cleared = self.board.clear_full_rows().len() as u8;

        let mut promoted = self.next;
        promoted.refresh_max_fall(&self.board);
        self.live = promoted;

        if self.live.collides(&self.board) {
            self.running = false;
            return Outcome::GameOver;
        }

        self.next = Tetromino::spawn(self.generator.draw());
        Outcome::Locked { lines_cleared }
    }
}
