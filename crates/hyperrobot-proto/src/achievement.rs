//! Achievement identifiers signalled to the external score tracker.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An achievement unlocked by a player action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Achievement {
    /// Requested a single-player puzzle.
    Play,
    /// Requested a battle puzzle.
    BattlePlay,
    /// Won a battle round.
    BattleWin,
    /// Cleared a single-player puzzle.
    Clear,
    /// Cleared with no more moves than the reference solution.
    ClearShortest,
    ClearShortestOver10,
    ClearShortestOver15,
    ClearShortestOver20,
    /// Shortest single-player clear within 10 seconds per move (answers of 8+ moves).
    ClearIn10SecPerMove,
    ClearIn5SecPerMove,
    ClearIn1SecPerMove,
    /// Found a solution shorter than the proven minimum, or hit an internal error.
    Debugger,
}

impl Achievement {
    /// Stable identifier understood by the score tracker.
    pub fn id(self) -> &'static str {
        match self {
            Achievement::Play => "ricochet-robots-play",
            Achievement::BattlePlay => "ricochet-robots-buttle-play",
            Achievement::BattleWin => "ricochet-robots-buttle-win",
            Achievement::Clear => "ricochet-robots-clear",
            Achievement::ClearShortest => "ricochet-robots-clear-shortest",
            Achievement::ClearShortestOver10 => "ricochet-robots-clear-shortest-over10",
            Achievement::ClearShortestOver15 => "ricochet-robots-clear-shortest-over15",
            Achievement::ClearShortestOver20 => "ricochet-robots-clear-shortest-over20",
            Achievement::ClearIn10SecPerMove => "ricochet-robots-clear-in-10sec-per-move-over8",
            Achievement::ClearIn5SecPerMove => "ricochet-robots-clear-in-5sec-per-move-over8",
            Achievement::ClearIn1SecPerMove => "ricochet-robots-clear-in-1sec-per-move-over8",
            Achievement::Debugger => "ricochet-robots-debugger",
        }
    }
}

impl fmt::Display for Achievement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}
