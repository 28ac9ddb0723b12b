//! Move command grammar.
//!
//! A command is one or more groups of a colour token followed by one or more
//! direction tokens, optionally ending with the until-marker `まで`:
//!
//! ```text
//! 赤右上青左まで   ->  red right, red up, blue left (non-minimal allowed)
//! rdw              ->  red right, red up
//! ```
//!
//! Text that does not match is ordinary chat and yields `None`.

use hyperrobot_proto::{Colour, Direction, Move};
use std::fmt;

/// Trailing marker accepting solutions longer than the known minimum.
pub const UNTIL_MARKER: &str = "まで";

/// A parsed move command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub moves: Vec<Move>,
    /// False when the command ended with the until-marker.
    pub exact: bool,
}

impl Command {
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}

/// Parses chat text into a command.
pub fn parse_command(text: &str) -> Option<Command> {
    let text = text.trim();
    let (body, exact) = match text.strip_suffix(UNTIL_MARKER) {
        Some(body) => (body, false),
        None => (text, true),
    };

    let mut moves = Vec::new();
    let mut tokens = body.chars().peekable();
    while let Some(token) = tokens.next() {
        let colour = Colour::from_token(token)?;
        let group_start = moves.len();
        while let Some(direction) = tokens.peek().and_then(|&t| Direction::from_token(t)) {
            moves.push(Move::new(colour, direction));
            tokens.next();
        }
        if moves.len() == group_start {
            return None;
        }
    }

    if moves.is_empty() {
        return None;
    }
    Some(Command { moves, exact })
}

/// Compact command notation that parses back to the same moves.
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut previous = None;
        for mv in &self.moves {
            if previous != Some(mv.colour) {
                write!(f, "{}", mv.colour)?;
                previous = Some(mv.colour);
            }
            write!(f, "{}", mv.direction)?;
        }
        if !self.exact {
            f.write_str(UNTIL_MARKER)?;
        }
        Ok(())
    }
}

/// Lists moves for display, e.g. `赤右,赤上,青左`.
pub fn format_moves(moves: &[Move]) -> String {
    moves
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
