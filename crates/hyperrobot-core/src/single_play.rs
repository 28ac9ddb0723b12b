//! Single-player session: one puzzle, first clear wins.

use crate::board::BoardError;
use crate::command::Command;
use crate::outbound::{ClearReport, ClearVerdict, Judgement, Outbound, Rejection};
use crate::puzzle::Puzzle;
use crate::rewards::{clear_achievements, time_tier_achievements};
use chrono::{DateTime, Utc};
use hyperrobot_proto::Achievement;
use tracing::{debug, info};

/// A presented single-player puzzle.
#[derive(Debug, Clone)]
pub struct SinglePlaySession {
    puzzle: Puzzle,
    started_at: DateTime<Utc>,
    /// Timestamp of the request message; commands are also accepted in its thread.
    thread_ts: String,
}

impl SinglePlaySession {
    pub fn new(puzzle: Puzzle, started_at: DateTime<Utc>, thread_ts: impl Into<String>) -> Self {
        Self {
            puzzle,
            started_at,
            thread_ts: thread_ts.into(),
        }
    }

    pub fn puzzle(&self) -> &Puzzle {
        &self.puzzle
    }

    pub fn thread_ts(&self) -> &str {
        &self.thread_ts
    }

    /// The presentation event, showing the minimal move count.
    pub fn presentation(&self) -> Outbound {
        Outbound::PuzzlePresented {
            board: self.puzzle.board.clone(),
            moves: Some(self.puzzle.answer_len()),
        }
    }

    /// Judges a command posted at `now`.
    ///
    /// Rejections and unsolved attempts leave the session untouched. A clear
    /// finishes the session.
    pub fn judge(&self, user: &str, command: &Command, now: DateTime<Utc>) -> Judgement {
        let minimum = self.puzzle.answer_len();
        if command.exact && command.len() > minimum {
            debug!(user, used = command.len(), minimum, "Command exceeds minimum");
            return Judgement::rejected(Rejection::ExceedsMinimum {
                minimum,
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

        let verdict = ClearVerdict::classify(command.len(), minimum);
        let elapsed = (now - self.started_at).to_std().unwrap_or_default();
        info!(
            user,
            moves = command.len(),
            minimum,
            ?verdict,
            elapsed_ms = elapsed.as_millis() as u64,
            "Single-player puzzle cleared"
        );

        let mut events = vec![
            Outbound::Cleared(ClearReport {
                user: user.to_string(),
                moves: command.len(),
                verdict,
                board: trial.board,
                elapsed: Some(elapsed),
            }),
            reference_solution(&self.puzzle, verdict == ClearVerdict::Longer),
        ];

        let achievements = if verdict == ClearVerdict::Anomaly {
            clear_achievements(verdict, minimum)
        } else {
            let mut unlocked = vec![Achievement::Clear];
            unlocked.extend(clear_achievements(verdict, minimum));
            unlocked.extend(time_tier_achievements(verdict, minimum, elapsed));
            unlocked
        };
        events.extend(achievements.into_iter().map(|achievement| Outbound::Unlock {
            user: user.to_string(),
            achievement,
        }));

        Judgement::finished(events)
    }
}

/// The bot's reference solution together with the board it leads to.
pub(crate) fn reference_solution(puzzle: &Puzzle, shorter_exists: bool) -> Outbound {
    match puzzle.solved_board() {
        Ok(board) => Outbound::Solution {
            answer: puzzle.answer.clone(),
            board,
            shorter_exists,
        },
        Err(err) => Outbound::InternalError {
            detail: err.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::tests::sample_board;
    use crate::command::parse_command;
    use chrono::TimeDelta;
    use hyperrobot_proto::{Colour, Direction, Move};

    fn session() -> SinglePlaySession {
        let answer = vec![
            Move::new(Colour::Red, Direction::Up),
            Move::new(Colour::Red, Direction::Right),
            Move::new(Colour::Red, Direction::Up),
        ];
        let puzzle = Puzzle::new(sample_board(), answer).unwrap();
        SinglePlaySession::new(puzzle, DateTime::UNIX_EPOCH, "1700000000.000100")
    }

    fn unlocks(judgement: &Judgement) -> Vec<Achievement> {
        judgement
            .events
            .iter()
            .filter_map(|event| match event {
                Outbound::Unlock { achievement, .. } => Some(*achievement),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_longer_command_without_until_is_rejected() {
        let session = session();
        let command = parse_command("赤上右上下").unwrap();
        let judgement = session.judge("alice", &command, Utc::now());
        assert!(!judgement.finished);
        assert_eq!(
            judgement.events,
            vec![Outbound::Rejected(Rejection::ExceedsMinimum {
                minimum: 3,
                used: 5
            })]
        );
    }

    #[test]
    fn test_until_marker_accepts_longer_clear() {
        let session = session();
        // Red wanders down first (already at the bottom), then takes the short path.
        let command = parse_command("赤下上右上まで").unwrap();
        let judgement = session.judge("alice", &command, DateTime::UNIX_EPOCH);
        assert!(judgement.finished);
        match &judgement.events[0] {
            Outbound::Cleared(report) => {
                assert_eq!(report.moves, 4);
                assert_eq!(report.verdict, ClearVerdict::Longer);
            }
            other => panic!("expected clear, got {other:?}"),
        }
        assert!(matches!(
            judgement.events[1],
            Outbound::Solution {
                shorter_exists: true,
                ..
            }
        ));
        assert_eq!(unlocks(&judgement), vec![Achievement::Clear]);
    }

    #[test]
    fn test_unsolved_command_keeps_session() {
        let session = session();
        let command = parse_command("赤右").unwrap();
        let judgement = session.judge("alice", &command, Utc::now());
        assert!(!judgement.finished);
        assert!(matches!(judgement.events[..], [Outbound::NotSolved { .. }]));
        assert_eq!(session.puzzle().board, sample_board());
    }

    #[test]
    fn test_absent_robot_is_rejected() {
        let session = session();
        let command = parse_command("黒上").unwrap();
        let judgement = session.judge("alice", &command, Utc::now());
        assert_eq!(
            judgement.events,
            vec![Outbound::Rejected(Rejection::UnknownRobot(Colour::Black))]
        );
    }

    #[test]
    fn test_shortest_clear_reports_elapsed_time() {
        let session = session();
        let command = parse_command("赤上右上").unwrap();
        let now = DateTime::UNIX_EPOCH + TimeDelta::seconds(12);
        let judgement = session.judge("alice", &command, now);
        assert!(judgement.finished);
        match &judgement.events[0] {
            Outbound::Cleared(report) => {
                assert_eq!(report.verdict, ClearVerdict::Shortest);
                assert_eq!(report.elapsed, Some(std::time::Duration::from_secs(12)));
            }
            other => panic!("expected clear, got {other:?}"),
        }
        // Three-move answers are too short for time tiers.
        assert_eq!(
            unlocks(&judgement),
            vec![Achievement::Clear, Achievement::ClearShortest]
        );
    }
}
