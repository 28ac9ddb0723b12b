//! # hyperrobot-proto
//!
//! Shared types and error definitions for the Hyperrobot crates.
//!
//! This crate provides the vocabulary used across all Hyperrobot crates:
//! - Robot colours, slide directions and moves
//! - Grid positions and wall records as emitted by the puzzle generator
//! - Achievement identifiers signalled to the score tracker
//! - The common error type crossing the puzzle-source and outbox seams

mod achievement;
mod error;
mod robot;

pub use achievement::Achievement;
pub use error::{Error, Result};
pub use robot::{Colour, Direction, Move, Position, WallPosition};
