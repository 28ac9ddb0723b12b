//! Board engine: walled grid, robot positions and slide physics.
//!
//! A [`Board`] is a plain value. Cloning it yields a fully independent copy,
//! so speculative move sequences run on a clone and never touch the
//! canonical puzzle board.

use hyperrobot_proto::{Colour, Direction, Move, Position, WallPosition};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Number of robots on boards without the blocker.
pub const MIN_ROBOTS: usize = 4;

/// Number of robots including the black blocker.
pub const MAX_ROBOTS: usize = 5;

/// Raw board description as produced by the puzzle generator.
///
/// Unknown generator fields (such as its wall distance cache) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardLayout {
    pub h: usize,
    pub w: usize,
    #[serde(default)]
    pub walls: Vec<WallPosition>,
    pub robots: Vec<Position>,
}

/// The goal cell and the robot that must reach it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub position: Position,
    pub colour: Colour,
}

/// One executed slide, kept in the board's move log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlideRecord {
    pub colour: Colour,
    pub direction: Direction,
    pub from: Position,
    pub to: Position,
}

/// Errors raised while loading a board or applying moves.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error("board must be at least 1x1, got {h}x{w}")]
    Empty { h: usize, w: usize },

    #[error("wall {wall:?} lies outside a {h}x{w} board")]
    WallOutOfRange { wall: WallPosition, h: usize, w: usize },

    #[error("expected 4 or 5 robots, got {0}")]
    RobotCount(usize),

    #[error("robot {colour} at {position:?} is off the board")]
    RobotOutOfRange { colour: Colour, position: Position },

    #[error("robots {first} and {second} share cell {position:?}")]
    RobotsOverlap {
        first: Colour,
        second: Colour,
        position: Position,
    },

    #[error("goal {0:?} is off the board")]
    GoalOutOfRange(Position),

    #[error("goal colour {0} has no robot on this board")]
    InvalidGoalColour(Colour),

    #[error("no {0} robot on this board")]
    UnknownRobot(Colour),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Cell {
    /// Wall flags indexed by [`Direction::index`].
    walls: [bool; 4],
}

/// A loaded puzzle board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    height: usize,
    width: usize,
    walls: Vec<WallPosition>,
    robots: Vec<Position>,
    goal: Goal,
    /// Row-major `height * width` cells.
    cells: Vec<Cell>,
    log: Vec<SlideRecord>,
}

impl Board {
    /// Builds a board from a generator layout and goal.
    ///
    /// Each wall record sets the flag on both adjoining cells, then the four
    /// arena borders are closed.
    pub fn load(layout: BoardLayout, goal: Goal) -> Result<Self, BoardError> {
        let BoardLayout { h, w, walls, robots } = layout;
        if h == 0 || w == 0 {
            return Err(BoardError::Empty { h, w });
        }

        let mut board = Self {
            height: h,
            width: w,
            walls: Vec::with_capacity(walls.len()),
            robots: Vec::new(),
            goal,
            cells: vec![Cell::default(); h * w],
            log: Vec::new(),
        };

        for wall in walls {
            board.add_wall(wall)?;
        }

        for y in 0..h as i32 {
            board.set_wall(Position::new(0, y), Direction::Left);
            board.set_wall(Position::new(w as i32 - 1, y), Direction::Right);
        }
        for x in 0..w as i32 {
            board.set_wall(Position::new(x, 0), Direction::Up);
            board.set_wall(Position::new(x, h as i32 - 1), Direction::Down);
        }

        if !(MIN_ROBOTS..=MAX_ROBOTS).contains(&robots.len()) {
            return Err(BoardError::RobotCount(robots.len()));
        }
        for (i, &position) in robots.iter().enumerate() {
            let colour = Colour::ALL[i];
            if !board.is_inside(position) {
                return Err(BoardError::RobotOutOfRange { colour, position });
            }
            if let Some(j) = robots[..i].iter().position(|&p| p == position) {
                return Err(BoardError::RobotsOverlap {
                    first: Colour::ALL[j],
                    second: colour,
                    position,
                });
            }
        }
        board.robots = robots;

        if !board.is_inside(goal.position) {
            return Err(BoardError::GoalOutOfRange(goal.position));
        }
        if goal.colour == Colour::Black || goal.colour.index() >= board.robots.len() {
            return Err(BoardError::InvalidGoalColour(goal.colour));
        }

        Ok(board)
    }

    fn add_wall(&mut self, wall: WallPosition) -> Result<(), BoardError> {
        let (h, w) = (self.height as i32, self.width as i32);
        let out_of_range = BoardError::WallOutOfRange {
            wall,
            h: self.height,
            w: self.width,
        };
        let here = Position::new(wall.x, wall.y);
        match wall.d {
            0 if (1..h).contains(&wall.y) && (0..w).contains(&wall.x) => {
                self.set_wall(here.step(Direction::Up), Direction::Down);
                self.set_wall(here, Direction::Up);
            }
            1 if (0..h).contains(&wall.y) && (1..w).contains(&wall.x) => {
                self.set_wall(here.step(Direction::Left), Direction::Right);
                self.set_wall(here, Direction::Left);
            }
            _ => return Err(out_of_range),
        }
        self.walls.push(wall);
        Ok(())
    }

    fn index(&self, p: Position) -> usize {
        p.y as usize * self.width + p.x as usize
    }

    fn set_wall(&mut self, p: Position, direction: Direction) {
        let i = self.index(p);
        self.cells[i].walls[direction.index()] = true;
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Wall records as loaded, without the arena border.
    pub fn walls(&self) -> &[WallPosition] {
        &self.walls
    }

    /// Robot positions in colour index order.
    pub fn robots(&self) -> &[Position] {
        &self.robots
    }

    pub fn goal(&self) -> Goal {
        self.goal
    }

    /// Slides executed on this board, oldest first.
    pub fn log(&self) -> &[SlideRecord] {
        &self.log
    }

    pub fn is_inside(&self, p: Position) -> bool {
        (0..self.height as i32).contains(&p.y) && (0..self.width as i32).contains(&p.x)
    }

    /// Returns true if the cell has a wall on the given side.
    ///
    /// Cells outside the board report walls on every side.
    pub fn has_wall(&self, p: Position, direction: Direction) -> bool {
        !self.is_inside(p) || self.cells[self.index(p)].walls[direction.index()]
    }

    pub fn robot(&self, colour: Colour) -> Option<Position> {
        self.robots.get(colour.index()).copied()
    }

    /// Returns the colour of the robot standing on `p`, if any.
    pub fn robot_at(&self, p: Position) -> Option<Colour> {
        self.robots
            .iter()
            .position(|&q| q == p)
            .map(|i| Colour::ALL[i])
    }

    /// Slides a robot until a wall or another robot stops it.
    ///
    /// A zero-length slide is valid and is logged like any other.
    pub fn slide(&mut self, colour: Colour, direction: Direction) -> Result<SlideRecord, BoardError> {
        let from = self.robot(colour).ok_or(BoardError::UnknownRobot(colour))?;
        let mut p = from;
        loop {
            let next = p.step(direction);
            if self.has_wall(p, direction) || self.robots.contains(&next) {
                break;
            }
            p = next;
        }

        self.robots[colour.index()] = p;
        let record = SlideRecord {
            colour,
            direction,
            from,
            to: p,
        };
        trace!(%colour, %direction, ?from, to = ?p, "Robot slid");
        self.log.push(record);
        Ok(record)
    }

    /// Applies moves in order, each starting from the positions the previous
    /// one left behind.
    ///
    /// All colours are checked before any robot moves, so an error leaves the
    /// board untouched.
    pub fn apply(&mut self, moves: &[Move]) -> Result<(), BoardError> {
        if let Some(mv) = moves.iter().find(|mv| self.robot(mv.colour).is_none()) {
            return Err(BoardError::UnknownRobot(mv.colour));
        }
        for mv in moves {
            self.slide(mv.colour, mv.direction)?;
        }
        Ok(())
    }

    /// Returns true when the goal-colour robot stands on the goal cell.
    pub fn is_cleared(&self) -> bool {
        self.robot(self.goal.colour) == Some(self.goal.position)
    }
}
