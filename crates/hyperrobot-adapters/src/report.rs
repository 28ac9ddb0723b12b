//! Decoding of the generator's text report.
//!
//! The generator may print progress lines first. Only the last four non-empty
//! lines matter, in this order:
//!
//! ```text
//! Board { w: 9, h: 7, walls: [WallPos { y: 1, x: 2, d: 0 }, ..], walldist: [..], robots: [Pos { y: 0, x: 1 }, ..] }
//! 2
//! Pos { y: 3, x: 4 }
//! [Move { c: 1, d: 2 }, Move { c: 2, d: 3 }]
//! ```

use crate::debug_text::{DebugTextError, parse_debug_text};
use hyperrobot_core::{Board, BoardError, BoardLayout, Goal, Puzzle};
use hyperrobot_proto::{Colour, Direction, Move, Position};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fmt;

/// The four meaningful lines of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportLine {
    Board,
    GoalColour,
    GoalPosition,
    Answer,
}

impl fmt::Display for ReportLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReportLine::Board => "board",
            ReportLine::GoalColour => "goal colour",
            ReportLine::GoalPosition => "goal position",
            ReportLine::Answer => "answer",
        };
        f.write_str(name)
    }
}

/// Errors raised when a report breaks the four-line contract.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("expected 4 report lines, found {found}")]
    MissingTail { found: usize },

    #[error("{line} line is not debug text: {source}")]
    Syntax {
        line: ReportLine,
        #[source]
        source: DebugTextError,
    },

    #[error("{line} line has the wrong shape: {source}")]
    Shape {
        line: ReportLine,
        #[source]
        source: serde_json::Error,
    },

    #[error("goal colour {0} is not a robot index")]
    InvalidColour(u64),

    #[error("answer move {index} has colour {c} and direction {d}")]
    InvalidMove { index: usize, c: usize, d: usize },

    #[error("invalid board: {0}")]
    Board(#[from] BoardError),
}

#[derive(Debug, Deserialize)]
struct RawMove {
    c: usize,
    d: usize,
}

/// Decodes a full generator report into a puzzle.
pub fn decode_report(text: &str) -> Result<Puzzle, ProtocolError> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    let [board_line, colour_line, goal_line, answer_line] = &lines[lines.len().saturating_sub(4)..]
    else {
        return Err(ProtocolError::MissingTail { found: lines.len() });
    };

    let layout: BoardLayout = decode_line(ReportLine::Board, board_line)?;
    let colour_index: u64 = decode_line(ReportLine::GoalColour, colour_line)?;
    let position: Position = decode_line(ReportLine::GoalPosition, goal_line)?;
    let raw_moves: Vec<RawMove> = decode_line(ReportLine::Answer, answer_line)?;

    let colour = usize::try_from(colour_index)
        .ok()
        .and_then(Colour::from_index)
        .ok_or(ProtocolError::InvalidColour(colour_index))?;

    let answer = raw_moves
        .iter()
        .enumerate()
        .map(|(index, raw)| {
            match (Colour::from_index(raw.c), Direction::from_index(raw.d)) {
                (Some(colour), Some(direction)) => Ok(Move::new(colour, direction)),
                _ => Err(ProtocolError::InvalidMove {
                    index,
                    c: raw.c,
                    d: raw.d,
                }),
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    let board = Board::load(layout, Goal { position, colour })?;
    Ok(Puzzle::new(board, answer)?)
}

fn decode_line<T: DeserializeOwned>(line: ReportLine, text: &str) -> Result<T, ProtocolError> {
    let value = parse_debug_text(text).map_err(|source| ProtocolError::Syntax { line, source })?;
    serde_json::from_value(value).map_err(|source| ProtocolError::Shape { line, source })
}
