//! Puzzles, difficulty presets and the puzzle-source seam.

use crate::board::{Board, BoardError};
use async_trait::async_trait;
use hyperrobot_proto::Move;
use serde::Serialize;

/// Named difficulty presets selecting grid size and wall count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Difficulty {
    Baby,
    Super,
    Hyper,
}

impl Difficulty {
    /// Parses the chat name of a preset.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ベイビー" => Some(Difficulty::Baby),
            "スーパー" => Some(Difficulty::Super),
            "ハイパー" => Some(Difficulty::Hyper),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Difficulty::Baby => "ベイビー",
            Difficulty::Super => "スーパー",
            Difficulty::Hyper => "ハイパー",
        }
    }

    /// Grid size as `(height, width)`.
    pub fn size(self) -> (usize, usize) {
        match self {
            Difficulty::Baby => (3, 5),
            Difficulty::Super => (5, 7),
            Difficulty::Hyper => (7, 9),
        }
    }

    pub fn walls(self) -> usize {
        match self {
            Difficulty::Baby => 3,
            Difficulty::Super => 10,
            Difficulty::Hyper => 15,
        }
    }

    /// Builds the generator request for this preset.
    pub fn spec(self, depth: u32) -> PuzzleSpec {
        let (height, width) = self.size();
        PuzzleSpec {
            depth,
            height,
            width,
            walls: self.walls(),
        }
    }
}

/// Parameters passed to the puzzle generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PuzzleSpec {
    /// Search depth bound for the minimal solution.
    pub depth: u32,
    pub height: usize,
    pub width: usize,
    pub walls: usize,
}

/// A board together with the generator's minimal solution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Puzzle {
    pub board: Board,
    pub answer: Vec<Move>,
}

/// Outcome of trying a move sequence on a clone of the puzzle board.
#[derive(Debug, Clone)]
pub struct Trial {
    pub board: Board,
    pub cleared: bool,
}

impl Puzzle {
    /// Creates a puzzle, checking that the answer only moves robots on the board.
    pub fn new(board: Board, answer: Vec<Move>) -> Result<Self, BoardError> {
        let puzzle = Self { board, answer };
        puzzle.solved_board()?;
        Ok(puzzle)
    }

    /// Length of the known minimal solution.
    pub fn answer_len(&self) -> usize {
        self.answer.len()
    }

    /// Runs moves on a clone of the board; the puzzle itself is never touched.
    pub fn trial(&self, moves: &[Move]) -> Result<Trial, BoardError> {
        let mut board = self.board.clone();
        board.apply(moves)?;
        let cleared = board.is_cleared();
        Ok(Trial { board, cleared })
    }

    /// The board after playing the reference solution.
    pub fn solved_board(&self) -> Result<Board, BoardError> {
        self.trial(&self.answer).map(|trial| trial.board)
    }
}

/// Source of fresh puzzles.
///
/// Callers must not issue a second request while one is outstanding.
#[async_trait]
pub trait PuzzleSource: Send + Sync {
    async fn generate(&self, spec: PuzzleSpec) -> hyperrobot_proto::Result<Puzzle>;
}
