//! Achievement rules for clears.

use crate::outbound::ClearVerdict;
use hyperrobot_proto::Achievement;
use std::time::Duration;

/// Answers shorter than this never earn time tiers.
const TIMED_MIN_ANSWER: usize = 8;

/// Per-move time budgets, in milliseconds, for the time tiers.
const TIME_TIERS: [(u64, Achievement); 3] = [
    (10_000, Achievement::ClearIn10SecPerMove),
    (5_000, Achievement::ClearIn5SecPerMove),
    (1_000, Achievement::ClearIn1SecPerMove),
];

/// Achievements for reaching the goal with the given verdict.
///
/// An anomaly earns only the diagnostic achievement.
pub fn clear_achievements(verdict: ClearVerdict, answer_len: usize) -> Vec<Achievement> {
    match verdict {
        ClearVerdict::Anomaly => vec![Achievement::Debugger],
        ClearVerdict::Longer => Vec::new(),
        ClearVerdict::Shortest => {
            let mut unlocked = vec![Achievement::ClearShortest];
            for (threshold, achievement) in [
                (10, Achievement::ClearShortestOver10),
                (15, Achievement::ClearShortestOver15),
                (20, Achievement::ClearShortestOver20),
            ] {
                if answer_len >= threshold {
                    unlocked.push(achievement);
                }
            }
            unlocked
        }
    }
}

/// Time tiers for a shortest single-player clear, normalised per answer move.
pub fn time_tier_achievements(
    verdict: ClearVerdict,
    answer_len: usize,
    elapsed: Duration,
) -> Vec<Achievement> {
    if verdict != ClearVerdict::Shortest || answer_len < TIMED_MIN_ANSWER {
        return Vec::new();
    }
    let elapsed_ms = elapsed.as_millis();
    TIME_TIERS
        .iter()
        .filter(|(per_move_ms, _)| elapsed_ms <= u128::from(*per_move_ms) * answer_len as u128)
        .map(|(_, achievement)| *achievement)
        .collect()
}
