//! Outbound events handed to the messaging collaborator.
//!
//! Sessions describe what happened; formatting, image rendering and delivery
//! belong to whoever implements [`Outbox`].

use crate::board::Board;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hyperrobot_proto::{Achievement, Colour, Move};
use std::time::Duration;

/// Chat user identifier.
pub type UserId = String;

/// Something the bot wants to say.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// A puzzle is on the table. `moves` is `None` in battles, where the
    /// minimal move count stays hidden.
    PuzzlePresented { board: Board, moves: Option<usize> },

    /// A command arrived while no puzzle is active.
    NoPuzzle,

    /// A command broke a rule and was not consumed.
    Rejected(Rejection),

    /// A command was played but the goal was not reached.
    NotSolved { user: UserId, board: Board },

    /// A command reached the goal.
    Cleared(ClearReport),

    /// The bot's own reference solution.
    Solution {
        answer: Vec<Move>,
        board: Board,
        /// True when the player needed more moves than the reference.
        shorter_exists: bool,
    },

    /// Lightweight acknowledgement of a bid message.
    BidAccepted { message_ts: String },

    /// The first bid started the bidding timer.
    BiddingDeadline { deadline: DateTime<Utc> },

    /// A battle participant's answer window opened.
    TurnStarted {
        user: UserId,
        declared: u32,
        deadline: DateTime<Utc>,
    },

    /// A battle participant let their answer window lapse.
    TurnMissed { user: UserId },

    /// Nobody in the bid queue solved the puzzle.
    Exhausted { answer: Vec<Move>, board: Board },

    /// A request failed inside the bot.
    InternalError { detail: String },

    /// Signal for the external achievement tracker.
    Unlock {
        user: UserId,
        achievement: Achievement,
    },
}

/// Why a command was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Single-player command longer than the minimum without the until-marker.
    ExceedsMinimum { minimum: usize, used: usize },
    /// Battle command longer than the player's own bid.
    ExceedsBid {
        user: UserId,
        declared: u32,
        used: usize,
    },
    /// Battle command from someone other than the active player.
    NotYourTurn { active: UserId },
    /// Battle command while bids are still being collected.
    BiddingOpen,
    /// Command names a robot that is not on the board.
    UnknownRobot(Colour),
}

/// How a clearing command compares to the reference solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearVerdict {
    /// Same length as the reference.
    Shortest,
    /// Longer than the reference.
    Longer,
    /// Shorter than the proven minimum. Points at a generator or engine defect.
    Anomaly,
}

impl ClearVerdict {
    pub fn classify(moves: usize, answer_len: usize) -> Self {
        match moves.cmp(&answer_len) {
            std::cmp::Ordering::Less => ClearVerdict::Anomaly,
            std::cmp::Ordering::Equal => ClearVerdict::Shortest,
            std::cmp::Ordering::Greater => ClearVerdict::Longer,
        }
    }
}

/// Details of a successful clear.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearReport {
    pub user: UserId,
    pub moves: usize,
    pub verdict: ClearVerdict,
    pub board: Board,
    /// Time since the puzzle was presented; single-player only.
    pub elapsed: Option<Duration>,
}

/// Delivery seam towards the chat platform.
#[async_trait]
pub trait Outbox: Send + Sync {
    async fn deliver(&self, event: Outbound) -> hyperrobot_proto::Result<()>;
}

/// Result of judging one command against a session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Judgement {
    pub events: Vec<Outbound>,
    /// True when the command ended the session.
    pub finished: bool,
}

impl Judgement {
    /// The session carries on unchanged.
    pub fn pending(events: Vec<Outbound>) -> Self {
        Self {
            events,
            finished: false,
        }
    }

    pub fn rejected(rejection: Rejection) -> Self {
        Self::pending(vec![Outbound::Rejected(rejection)])
    }

    /// The session is over and must be destroyed.
    pub fn finished(events: Vec<Outbound>) -> Self {
        Self {
            events,
            finished: true,
        }
    }
}
