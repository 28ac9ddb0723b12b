//! Puzzle request and bid grammars.

use crate::puzzle::Difficulty;
use regex::Regex;
use std::sync::LazyLock;

/// Bid used when the digits do not fit a move count.
pub const SENTINEL_BID: u32 = 100;

static SINGLE_REQUEST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(ベイビー|スーパー|ハイパー)ロボット( (\d+)手)?$")
        .expect("single request pattern is valid")
});

static BATTLE_REQUEST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(ベイビー|スーパー|ハイパー)ロボットバトル$")
        .expect("battle request pattern is valid")
});

static BID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)手?$").expect("bid pattern is valid"));

/// Which kind of session a request opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameMode {
    Single,
    Battle,
}

/// A parsed puzzle request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PuzzleRequest {
    pub mode: GameMode,
    pub difficulty: Difficulty,
    /// Search depth, already clamped to `1..=max_depth`.
    pub depth: u32,
}

/// Parses a puzzle request such as `ハイパーロボット 8手` or `ベイビーロボットバトル`.
pub fn parse_request(text: &str, max_depth: u32) -> Option<PuzzleRequest> {
    let text = text.trim();

    if let Some(caps) = BATTLE_REQUEST.captures(text) {
        let difficulty = Difficulty::from_name(caps.get(1)?.as_str())?;
        return Some(PuzzleRequest {
            mode: GameMode::Battle,
            difficulty,
            depth: max_depth,
        });
    }

    let caps = SINGLE_REQUEST.captures(text)?;
    let difficulty = Difficulty::from_name(caps.get(1)?.as_str())?;
    let depth = caps
        .get(3)
        .map_or(max_depth, |m| m.as_str().parse().unwrap_or(max_depth))
        .clamp(1, max_depth.max(1));
    Some(PuzzleRequest {
        mode: GameMode::Single,
        difficulty,
        depth,
    })
}

/// Parses a bid such as `7` or `7手`.
pub fn parse_bid(text: &str) -> Option<u32> {
    let caps = BID.captures(text.trim())?;
    Some(caps.get(1)?.as_str().parse().unwrap_or(SENTINEL_BID))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_requests_default_to_max_depth() {
        assert_eq!(
            parse_request("ハイパーロボット", 1000),
            Some(PuzzleRequest {
                mode: GameMode::Single,
                difficulty: Difficulty::Hyper,
                depth: 1000
            })
        );
    }

    #[test]
    fn test_depth_is_clamped() {
        let depth = |text| parse_request(text, 20).map(|r| r.depth);
        assert_eq!(depth("ベイビーロボット 8手"), Some(8));
        assert_eq!(depth("ベイビーロボット 0手"), Some(1));
        assert_eq!(depth("ベイビーロボット 500手"), Some(20));
        assert_eq!(depth("ベイビーロボット 99999999999999手"), Some(20));
    }

    #[test]
    fn test_battle_requests() {
        assert_eq!(
            parse_request("スーパーロボットバトル", 1000),
            Some(PuzzleRequest {
                mode: GameMode::Battle,
                difficulty: Difficulty::Super,
                depth: 1000
            })
        );
    }

    #[test]
    fn test_near_misses_are_chat() {
        for text in ["ロボット", "ウルトラロボット", "ハイパーロボット8手", "ハイパーロボット バトル"] {
            assert_eq!(parse_request(text, 1000), None, "{text}");
        }
    }

    #[test]
    fn test_bids() {
        assert_eq!(parse_bid("7"), Some(7));
        assert_eq!(parse_bid(" 12手 "), Some(12));
        assert_eq!(parse_bid("99999999999999"), Some(SENTINEL_BID));
        assert_eq!(parse_bid("七手"), None);
        assert_eq!(parse_bid("7 moves"), None);
        assert_eq!(parse_bid("手"), None);
    }

    #[test]
    fn test_patterns_compile() {
        assert_eq!(SINGLE_REQUEST.captures_len(), 4);
        assert_eq!(BATTLE_REQUEST.captures_len(), 2);
        assert_eq!(BID.captures_len(), 2);
    }
}
