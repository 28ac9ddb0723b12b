//! # hyperrobot-adapters
//!
//! Boundary to the external puzzle generator.
//!
//! This crate provides:
//! - [`GeneratorSource`], a [`PuzzleSource`](hyperrobot_core::PuzzleSource)
//!   that runs the generator process
//! - A parser for the generator's `Debug`-formatted output
//! - The four-line report decoder turning that output into a puzzle

mod debug_text;
mod generator;
mod report;

pub use debug_text::{DebugTextError, parse_debug_text};
pub use generator::{GeneratorError, GeneratorSource};
pub use report::{ProtocolError, ReportLine, decode_report};
