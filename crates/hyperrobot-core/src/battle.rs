//! Battle session: a bidding auction followed by timed answer turns.
//!
//! Players declare how many moves they need. When bidding closes the bids are
//! ordered by declared moves, then by bid time, then by arrival, and each
//! player in turn gets one answer window. Timers live in the dispatcher; this
//! module only exposes the transitions they trigger.

use crate::board::BoardError;
use crate::command::Command;
use crate::outbound::{ClearReport, ClearVerdict, Judgement, Outbound, Rejection, UserId};
use crate::puzzle::Puzzle;
use crate::rewards::clear_achievements;
use crate::single_play::reference_solution;
use chrono::{DateTime, Utc};
use hyperrobot_proto::Achievement;
use std::collections::{HashMap, VecDeque};
use tracing::{debug, info};

/// A declared move count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bid {
    pub user: UserId,
    pub declared: u32,
    pub placed_at: DateTime<Utc>,
    /// Arrival order; breaks ties between identical timestamps.
    seq: u64,
}

/// What happened to a submitted bid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BidOutcome {
    /// Recorded. `first` is true for the bid that opens the bidding clock.
    Recorded { first: bool },
    /// Older than the bid already held for this user.
    Stale,
    /// Bidding has closed.
    Closed,
}

/// Turn change produced when bidding closes or an answer window lapses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnChange {
    /// Player whose window lapsed, if any.
    pub missed: Option<UserId>,
    /// Player whose window opens now; `None` means the queue is exhausted.
    pub next: Option<Bid>,
}

#[derive(Debug, Clone)]
pub struct BattleSession {
    puzzle: Puzzle,
    bids: HashMap<UserId, Bid>,
    ordered: VecDeque<Bid>,
    bidding_open: bool,
    bidding_started: bool,
    first_turn: bool,
    next_seq: u64,
}

impl BattleSession {
    pub fn new(puzzle: Puzzle) -> Self {
        Self {
            puzzle,
            bids: HashMap::new(),
            ordered: VecDeque::new(),
            bidding_open: true,
            bidding_started: false,
            first_turn: true,
            next_seq: 0,
        }
    }

    pub fn bidding_started(&self) -> bool {
        self.bidding_started
    }

    /// Player whose answer window is open.
    pub fn active(&self) -> Option<&Bid> {
        if self.bidding_open {
            None
        } else {
            self.ordered.front()
        }
    }

    /// Remaining turn order, active player first.
    pub fn queue(&self) -> impl Iterator<Item = &Bid> {
        self.ordered.iter()
    }

    /// The presentation event; the minimal move count stays hidden.
    pub fn presentation(&self) -> Outbound {
        Outbound::PuzzlePresented {
            board: self.puzzle.board.clone(),
            moves: None,
        }
    }

    /// Records a bid, keeping only the latest one per user.
    pub fn place_bid(&mut self, user: &str, declared: u32, placed_at: DateTime<Utc>) -> BidOutcome {
        if !self.bidding_open {
            return BidOutcome::Closed;
        }
        if let Some(existing) = self.bids.get(user) {
            if existing.placed_at >= placed_at {
                debug!(user, declared, "Ignoring bid older than the one on record");
                return BidOutcome::Stale;
            }
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.bids.insert(
            user.to_string(),
            Bid {
                user: user.to_string(),
                declared,
                placed_at,
                seq,
            },
        );

        let first = !self.bidding_started;
        self.bidding_started = true;
        debug!(user, declared, first, "Bid recorded");
        BidOutcome::Recorded { first }
    }

    /// Freezes the bids into turn order.
    pub fn close_bidding(&mut self) {
        let mut bids: Vec<Bid> = self.bids.drain().map(|(_, bid)| bid).collect();
        bids.sort_by(|a, b| {
            a.declared
                .cmp(&b.declared)
                .then(a.placed_at.cmp(&b.placed_at))
                .then(a.seq.cmp(&b.seq))
        });
        self.ordered = bids.into();
        self.bidding_open = false;
        info!(bidders = self.ordered.len(), "Bidding closed");
    }

    /// Moves to the next turn.
    ///
    /// The first call after bidding closes only opens the head's window;
    /// later calls drop the head as having missed their turn.
    pub fn advance_turn(&mut self) -> TurnChange {
        let missed = if self.first_turn {
            self.first_turn = false;
            None
        } else {
            self.ordered.pop_front().map(|bid| bid.user)
        };
        if let Some(user) = &missed {
            info!(user = %user, "Answer window lapsed");
        }
        TurnChange {
            missed,
            next: self.ordered.front().cloned(),
        }
    }

    /// Judges a command from `user`.
    pub fn submit(&self, user: &str, command: &Command) -> Judgement {
        if self.bidding_open {
            return Judgement::rejected(Rejection::BiddingOpen);
        }
        let Some(active) = self.active() else {
            return Judgement::default();
        };
        if active.user != user {
            return Judgement::rejected(Rejection::NotYourTurn {
                active: active.user.clone(),
            });
        }
        if command.len() > active.declared as usize {
            return Judgement::rejected(Rejection::ExceedsBid {
                user: user.to_string(),
                declared: active.declared,
                used: command.len(),
            });
        }

        let trial = match self.puzzle.trial(&command.moves) {
            Ok(trial) => trial,
            Err(BoardError::UnknownRobot(colour)) => {
                return Judgement::rejected(Rejection::UnknownRobot(colour));
            }
            Err(err) => {
                return Judgement::pending(vec![Outbound::InternalError {
                    detail: err.to_string(),
                }]);
            }
        };
        if !trial.cleared {
            return Judgement::pending(vec![Outbound::NotSolved {
                user: user.to_string(),
                board: trial.board,
            }]);
        }

        let minimum = self.puzzle.answer_len();
        let verdict = ClearVerdict::classify(command.len(), minimum);
        info!(user, moves = command.len(), minimum, ?verdict, "Battle won");

        let mut events = vec![
            Outbound::Cleared(ClearReport {
                user: user.to_string(),
                moves: command.len(),
                verdict,
                board: trial.board,
                elapsed: None,
            }),
            reference_solution(&self.puzzle, verdict == ClearVerdict::Longer),
        ];
        let mut achievements = clear_achievements(verdict, minimum);
        if verdict != ClearVerdict::Anomaly {
            achievements.push(Achievement::BattleWin);
        }
        events.extend(achievements.into_iter().map(|achievement| Outbound::Unlock {
            user: user.to_string(),
            achievement,
        }));
        Judgement::finished(events)
    }

    /// Reveals the reference solution once nobody is left to answer.
    pub fn exhausted(&self) -> Outbound {
        match reference_solution(&self.puzzle, false) {
            Outbound::Solution { answer, board, .. } => Outbound::Exhausted { answer, board },
            other => other,
        }
    }
}
