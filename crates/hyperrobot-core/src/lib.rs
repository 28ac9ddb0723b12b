//! # hyperrobot-core
//!
//! Game logic for the Hyperrobot ricochet-robots bot.
//!
//! This crate provides:
//! - The board engine: walled grid, slide physics and goal check
//! - The move command grammar and the puzzle request and bid grammars
//! - Single-player and battle session state machines
//! - The dispatch shell serialising messages and timers against one session
//! - Configuration loading and validation

mod battle;
mod board;
mod command;
mod config;
mod dispatch;
mod outbound;
mod puzzle;
mod request;
mod rewards;
mod single_play;
pub mod testing;

pub use battle::{BattleSession, Bid, BidOutcome, TurnChange};
pub use board::{Board, BoardError, BoardLayout, Goal, MAX_ROBOTS, MIN_ROBOTS, SlideRecord};
pub use command::{Command, UNTIL_MARKER, format_moves, parse_command};
pub use config::{
    BattleConfig, BotConfig, ConfigError, ConfigWarning, GeneratorConfig, HyperrobotConfig,
};
pub use dispatch::{DispatchSettings, Dispatcher, IncomingMessage, TimerKind, TimerToken};
pub use outbound::{ClearReport, ClearVerdict, Judgement, Outbound, Outbox, Rejection, UserId};
pub use puzzle::{Difficulty, Puzzle, PuzzleSource, PuzzleSpec, Trial};
pub use request::{GameMode, PuzzleRequest, SENTINEL_BID, parse_bid, parse_request};
pub use rewards::{clear_achievements, time_tier_achievements};
pub use single_play::SinglePlaySession;
