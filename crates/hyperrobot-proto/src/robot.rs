//! Robots, directions and grid coordinates.
//!
//! Indices follow the generator's numbering: colours 0..=4 are
//! red, green, blue, yellow and the black blocker; directions 0..=3 are
//! down, right, up and left. `y` grows downwards.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Robot colour. `Black` is the blocker robot and is never the goal colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Colour {
    Red,
    Green,
    Blue,
    Yellow,
    Black,
}

impl Colour {
    /// All colours in generator index order.
    pub const ALL: [Colour; 5] = [
        Colour::Red,
        Colour::Green,
        Colour::Blue,
        Colour::Yellow,
        Colour::Black,
    ];

    /// Returns the colour for a generator index.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Returns the generator index of this colour.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Kanji name used in chat commands and solution listings.
    pub fn kanji(self) -> char {
        match self {
            Colour::Red => '赤',
            Colour::Green => '緑',
            Colour::Blue => '青',
            Colour::Yellow => '黄',
            Colour::Black => '黒',
        }
    }

    /// Parses a single colour token: a kanji name or a romaji alias.
    ///
    /// Only the four movable goal colours have romaji aliases.
    pub fn from_token(token: char) -> Option<Self> {
        match token {
            '赤' | 'r' => Some(Colour::Red),
            '緑' | 'g' => Some(Colour::Green),
            '青' | 'b' => Some(Colour::Blue),
            '黄' | 'y' => Some(Colour::Yellow),
            '黒' => Some(Colour::Black),
            _ => None,
        }
    }
}

impl fmt::Display for Colour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kanji())
    }
}

/// Slide direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Down,
    Right,
    Up,
    Left,
}

impl Direction {
    /// All directions in generator index order.
    pub const ALL: [Direction; 4] = [
        Direction::Down,
        Direction::Right,
        Direction::Up,
        Direction::Left,
    ];

    /// Returns the direction for a generator index.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Returns the generator index of this direction.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Unit step `(dx, dy)` for one cell of travel.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Down => (0, 1),
            Direction::Right => (1, 0),
            Direction::Up => (0, -1),
            Direction::Left => (-1, 0),
        }
    }

    /// Kanji name used in chat commands and solution listings.
    pub fn kanji(self) -> char {
        match self {
            Direction::Down => '下',
            Direction::Right => '右',
            Direction::Up => '上',
            Direction::Left => '左',
        }
    }

    /// Parses a single direction token: kanji, WASD or vi keys.
    pub fn from_token(token: char) -> Option<Self> {
        match token {
            '下' | 's' | 'j' => Some(Direction::Down),
            '右' | 'd' | 'l' => Some(Direction::Right),
            '上' | 'w' | 'k' => Some(Direction::Up),
            '左' | 'a' | 'h' => Some(Direction::Left),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kanji())
    }
}

/// A single slide of one robot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub colour: Colour,
    pub direction: Direction,
}

impl Move {
    pub fn new(colour: Colour, direction: Direction) -> Self {
        Self { colour, direction }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.colour, self.direction)
    }
}

/// A cell coordinate on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The neighbouring cell one step in `direction`.
    pub fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// A wall record as emitted by the generator.
///
/// `d == 0` is a wall between `(x, y - 1)` and `(x, y)`; `d == 1` is a wall
/// between `(x - 1, y)` and `(x, y)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WallPosition {
    pub x: i32,
    pub y: i32,
    pub d: u8,
}
