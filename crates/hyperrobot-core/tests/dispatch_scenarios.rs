//! End-to-end scenarios through the dispatch shell with scripted puzzles.

use chrono::{DateTime, TimeDelta, Utc};
use hyperrobot_core::testing::{RecordingOutbox, ScriptedSource};
use hyperrobot_core::{
    Board, BoardLayout, ClearVerdict, DispatchSettings, Dispatcher, GameMode, Goal,
    IncomingMessage, Outbound, Puzzle, PuzzleSpec, Rejection, TimerKind,
};
use hyperrobot_proto::{Achievement, Colour, Direction, Move, Position};
use std::sync::Arc;
use std::time::Duration;

const CHANNEL: &str = "sandbox";

struct Harness {
    dispatcher: Dispatcher,
    outbox: Arc<RecordingOutbox>,
    source: Arc<ScriptedSource>,
}

fn harness_with(source: ScriptedSource, outbox: RecordingOutbox) -> Harness {
    let settings = DispatchSettings {
        channel: CHANNEL.to_string(),
        bidding_window: Duration::from_secs(60),
        answer_window: Duration::from_secs(60),
        max_depth: 1000,
    };
    let source = Arc::new(source);
    let outbox = Arc::new(outbox);
    let dispatcher = Dispatcher::new(settings, source.clone(), outbox.clone());
    Harness {
        dispatcher,
        outbox,
        source,
    }
}

fn harness(source: ScriptedSource) -> Harness {
    harness_with(source, RecordingOutbox::new())
}

fn epoch() -> DateTime<Utc> {
    DateTime::UNIX_EPOCH + TimeDelta::seconds(1_700_000_000)
}

fn message(user: &str, text: &str, at_ms: i64) -> IncomingMessage {
    IncomingMessage {
        channel: CHANNEL.to_string(),
        user: user.to_string(),
        text: text.to_string(),
        ts: format!("1700000000.{at_ms:06}"),
        posted_at: epoch() + TimeDelta::milliseconds(at_ms),
        thread_ts: None,
    }
}

fn in_thread(mut msg: IncomingMessage, root: &str) -> IncomingMessage {
    msg.thread_ts = Some(root.to_string());
    msg
}

/// 5x5 board where red reaches the goal with right, up.
fn open_board() -> Board {
    let layout = BoardLayout {
        h: 5,
        w: 5,
        walls: vec![],
        robots: vec![
            Position::new(0, 4),
            Position::new(0, 0),
            Position::new(2, 2),
            Position::new(1, 1),
        ],
    };
    let goal = Goal {
        position: Position::new(4, 0),
        colour: Colour::Red,
    };
    Board::load(layout, goal).unwrap()
}

fn red(direction: Direction) -> Move {
    Move::new(Colour::Red, direction)
}

fn puzzle_with_answer(answer: Vec<Move>) -> Puzzle {
    Puzzle::new(open_board(), answer).unwrap()
}

fn short_puzzle() -> Puzzle {
    puzzle_with_answer(vec![red(Direction::Right), red(Direction::Up)])
}

fn six_move_puzzle() -> Puzzle {
    puzzle_with_answer(vec![
        Move::new(Colour::Green, Direction::Right),
        Move::new(Colour::Green, Direction::Down),
        Move::new(Colour::Blue, Direction::Up),
        Move::new(Colour::Yellow, Direction::Left),
        red(Direction::Right),
        red(Direction::Up),
    ])
}

fn unlocks(events: &[Outbound]) -> Vec<Achievement> {
    events
        .iter()
        .filter_map(|event| match event {
            Outbound::Unlock { achievement, .. } => Some(*achievement),
            _ => None,
        })
        .collect()
}

fn turn_starts(events: &[Outbound]) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| match event {
            Outbound::TurnStarted { user, .. } => Some(user.clone()),
            _ => None,
        })
        .collect()
}

fn missed(events: &[Outbound]) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| match event {
            Outbound::TurnMissed { user } => Some(user.clone()),
            _ => None,
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_battle_turn_timeout_hands_over_with_fresh_window() {
    let h = harness(ScriptedSource::new().with_puzzle(short_puzzle()));
    h.dispatcher.handle(message("host", "ハイパーロボットバトル", 0)).await;
    h.dispatcher.handle(message("p1", "4", 1_000)).await;
    h.dispatcher.handle(message("p2", "6手", 2_000)).await;

    let opening = h.outbox.take();
    assert!(matches!(opening[0], Outbound::PuzzlePresented { moves: None, .. }));
    assert_eq!(unlocks(&opening), vec![Achievement::BattlePlay]);
    let deadlines = opening
        .iter()
        .filter(|event| matches!(event, Outbound::BiddingDeadline { .. }))
        .count();
    assert_eq!(deadlines, 1);
    let acks = opening
        .iter()
        .filter(|event| matches!(event, Outbound::BidAccepted { .. }))
        .count();
    assert_eq!(acks, 2);

    tokio::time::sleep(Duration::from_secs(61)).await;
    let events = h.outbox.take();
    assert!(missed(&events).is_empty());
    assert_eq!(turn_starts(&events), vec!["p1"]);

    tokio::time::sleep(Duration::from_secs(60)).await;
    let events = h.outbox.take();
    assert_eq!(missed(&events), vec!["p1"]);
    assert_eq!(turn_starts(&events), vec!["p2"]);
    assert_eq!(
        h.dispatcher.pending_timer().await.map(|token| token.kind),
        Some(TimerKind::AnswerWindow)
    );

    // p2 answers well inside their own window even though p1's has long gone.
    tokio::time::sleep(Duration::from_secs(50)).await;
    h.dispatcher.handle(message("p2", "赤右", 200_000)).await;
    let events = h.outbox.take();
    assert!(matches!(events[..], [Outbound::NotSolved { .. }]));

    tokio::time::sleep(Duration::from_secs(11)).await;
    let events = h.outbox.take();
    assert_eq!(missed(&events), vec!["p2"]);
    assert!(matches!(events.last(), Some(Outbound::Exhausted { .. })));
    assert_eq!(h.dispatcher.active_session().await, None);
}

#[tokio::test(start_paused = true)]
async fn test_battle_without_bids_never_closes() {
    let h = harness(ScriptedSource::new().with_puzzle(short_puzzle()));
    h.dispatcher.handle(message("host", "ベイビーロボットバトル", 0)).await;

    tokio::time::sleep(Duration::from_secs(600)).await;
    assert_eq!(h.dispatcher.pending_timer().await, None);
    assert!(matches!(
        h.dispatcher.active_session().await,
        Some((_, GameMode::Battle))
    ));
    assert_eq!(h.outbox.events().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_bids_resolve_by_moves_then_time() {
    let h = harness(ScriptedSource::new().with_puzzle(short_puzzle()));
    h.dispatcher.handle(message("host", "スーパーロボットバトル", 0)).await;
    h.dispatcher.handle(message("A", "5", 1_000)).await;
    h.dispatcher.handle(message("B", "3", 2_000)).await;
    h.dispatcher.handle(message("C", "3", 1_000)).await;

    let mut order = Vec::new();
    for _ in 0..4 {
        tokio::time::sleep(Duration::from_secs(61)).await;
        order.extend(turn_starts(&h.outbox.take()));
    }
    assert_eq!(order, vec!["C", "B", "A"]);
    assert_eq!(h.dispatcher.active_session().await, None);
}

#[tokio::test(start_paused = true)]
async fn test_battle_rules_and_win_cancel_the_timer() {
    let h = harness(
        ScriptedSource::new()
            .with_puzzle(short_puzzle())
            .with_puzzle(short_puzzle()),
    );
    h.dispatcher.handle(message("host", "ハイパーロボットバトル", 0)).await;
    h.dispatcher.handle(message("p1", "3", 1_000)).await;
    h.dispatcher.handle(message("p2", "2", 1_500)).await;
    // A later, larger bid replaces p2's first one.
    h.dispatcher.handle(message("p2", "5", 1_800)).await;
    h.outbox.take();

    h.dispatcher.handle(message("p1", "赤右上", 2_000)).await;
    assert_eq!(
        h.outbox.take(),
        vec![Outbound::Rejected(Rejection::BiddingOpen)]
    );

    tokio::time::sleep(Duration::from_secs(61)).await;
    assert_eq!(turn_starts(&h.outbox.take()), vec!["p1"]);
    let token = h.dispatcher.pending_timer().await.unwrap();

    h.dispatcher.handle(message("p2", "赤右上", 70_000)).await;
    assert_eq!(
        h.outbox.take(),
        vec![Outbound::Rejected(Rejection::NotYourTurn {
            active: "p1".to_string()
        })]
    );

    h.dispatcher
        .handle(in_thread(message("p1", "赤右上", 71_000), "1700000000.000000"))
        .await;
    assert!(h.outbox.take().is_empty());

    h.dispatcher.handle(message("p1", "赤左右下上", 72_000)).await;
    assert_eq!(
        h.outbox.take(),
        vec![Outbound::Rejected(Rejection::ExceedsBid {
            user: "p1".to_string(),
            declared: 3,
            used: 4
        })]
    );

    h.dispatcher.handle(message("p1", "赤右上", 73_000)).await;
    let events = h.outbox.take();
    match &events[0] {
        Outbound::Cleared(report) => {
            assert_eq!(report.user, "p1");
            assert_eq!(report.verdict, ClearVerdict::Shortest);
            assert_eq!(report.elapsed, None);
        }
        other => panic!("expected clear, got {other:?}"),
    }
    assert!(matches!(
        events[1],
        Outbound::Solution {
            shorter_exists: false,
            ..
        }
    ));
    assert_eq!(
        unlocks(&events),
        vec![Achievement::ClearShortest, Achievement::BattleWin]
    );
    assert_eq!(h.dispatcher.active_session().await, None);
    assert_eq!(h.dispatcher.pending_timer().await, None);

    // The cancelled window is a no-op, also against a later session.
    h.dispatcher.fire(token).await;
    assert!(h.outbox.take().is_empty());
    h.dispatcher.handle(message("host", "ハイパーロボットバトル", 80_000)).await;
    h.outbox.take();
    h.dispatcher.fire(token).await;
    assert!(h.outbox.take().is_empty());
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert!(h.outbox.take().is_empty());
}

#[tokio::test]
async fn test_clearing_below_the_minimum_is_an_anomaly() {
    let h = harness(ScriptedSource::new().with_puzzle(six_move_puzzle()));
    h.dispatcher.handle(message("host", "スーパーロボット 6手", 0)).await;
    assert_eq!(h.source.requests()[0].depth, 6);
    let presented = h.outbox.take();
    assert!(matches!(
        presented[0],
        Outbound::PuzzlePresented { moves: Some(6), .. }
    ));
    assert_eq!(unlocks(&presented), vec![Achievement::Play]);

    h.dispatcher.handle(message("alice", "赤右赤上", 5_000)).await;
    let events = h.outbox.take();
    match &events[0] {
        Outbound::Cleared(report) => assert_eq!(report.verdict, ClearVerdict::Anomaly),
        other => panic!("expected clear, got {other:?}"),
    }
    assert_eq!(unlocks(&events), vec![Achievement::Debugger]);
    assert_eq!(h.dispatcher.active_session().await, None);
}

#[tokio::test(start_paused = true)]
async fn test_battle_clear_below_the_minimum_is_an_anomaly() {
    let h = harness(ScriptedSource::new().with_puzzle(six_move_puzzle()));
    h.dispatcher.handle(message("host", "ハイパーロボットバトル", 0)).await;
    h.dispatcher.handle(message("p1", "2", 1_000)).await;
    tokio::time::sleep(Duration::from_secs(61)).await;
    assert_eq!(turn_starts(&h.outbox.take()), vec!["p1"]);

    h.dispatcher.handle(message("p1", "赤右上", 70_000)).await;
    let events = h.outbox.take();
    match &events[0] {
        Outbound::Cleared(report) => {
            assert_eq!(report.verdict, ClearVerdict::Anomaly);
            assert_eq!(report.moves, 2);
        }
        other => panic!("expected clear, got {other:?}"),
    }
    assert_eq!(unlocks(&events), vec![Achievement::Debugger]);
    assert_eq!(h.dispatcher.active_session().await, None);
    assert_eq!(h.dispatcher.pending_timer().await, None);

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert!(h.outbox.take().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_stale_bid_is_acknowledged_but_not_recorded() {
    let h = harness(ScriptedSource::new().with_puzzle(short_puzzle()));
    h.dispatcher.handle(message("host", "ハイパーロボットバトル", 0)).await;
    h.outbox.take();

    h.dispatcher.handle(message("p1", "3", 2_000)).await;
    h.dispatcher.handle(message("p1", "2", 1_000)).await;
    let events = h.outbox.take();
    let acks: Vec<&str> = events
        .iter()
        .filter_map(|event| match event {
            Outbound::BidAccepted { message_ts } => Some(message_ts.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(acks, vec!["1700000000.002000", "1700000000.001000"]);

    tokio::time::sleep(Duration::from_secs(61)).await;
    let events = h.outbox.take();
    assert!(matches!(
        events[..],
        [Outbound::TurnStarted { declared: 3, .. }]
    ));
}

#[tokio::test(start_paused = true)]
async fn test_elapsed_time_starts_when_the_puzzle_is_presented() {
    let h = harness(
        ScriptedSource::new()
            .with_puzzle(short_puzzle())
            .with_delay(Duration::from_secs(40)),
    );
    h.dispatcher.handle(message("host", "ハイパーロボット", 0)).await;
    assert!(matches!(
        h.outbox.take()[0],
        Outbound::PuzzlePresented { moves: Some(2), .. }
    ));

    h.dispatcher.handle(message("alice", "赤右上", 45_000)).await;
    match &h.outbox.take()[0] {
        Outbound::Cleared(report) => {
            assert_eq!(report.elapsed, Some(Duration::from_secs(5)));
        }
        other => panic!("expected clear, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_time_tiers_use_elapsed_time_per_answer_move() {
    // Right and left along the bottom row, then up to the goal.
    let mut answer: Vec<Move> = (0..9)
        .map(|i| red(if i % 2 == 0 { Direction::Right } else { Direction::Left }))
        .collect();
    answer.push(red(Direction::Up));
    let h = harness(ScriptedSource::new().with_puzzle(puzzle_with_answer(answer)));

    h.dispatcher.handle(message("host", "ハイパーロボット", 0)).await;
    h.outbox.take();
    h.dispatcher
        .handle(message("alice", "赤右左右左右左右左右上", 10 * 5000 - 1))
        .await;
    let events = h.outbox.take();
    match &events[0] {
        Outbound::Cleared(report) => {
            assert_eq!(report.verdict, ClearVerdict::Shortest);
            assert_eq!(report.elapsed, Some(Duration::from_millis(49_999)));
        }
        other => panic!("expected clear, got {other:?}"),
    }
    assert_eq!(
        unlocks(&events),
        vec![
            Achievement::Clear,
            Achievement::ClearShortest,
            Achievement::ClearShortestOver10,
            Achievement::ClearIn10SecPerMove,
            Achievement::ClearIn5SecPerMove,
        ]
    );
}

#[tokio::test]
async fn test_request_while_active_presents_the_same_puzzle() {
    let h = harness(ScriptedSource::new().with_puzzle(short_puzzle()));
    h.dispatcher.handle(message("host", "ベイビーロボット", 0)).await;
    let first = h.outbox.take();
    h.dispatcher.handle(message("guest", "ハイパーロボットバトル", 1_000)).await;
    let second = h.outbox.take();

    assert_eq!(h.source.requests().len(), 1);
    assert_eq!(second, vec![first[0].clone()]);
    assert_eq!(
        h.source.requests()[0],
        PuzzleSpec {
            depth: 1000,
            height: 3,
            width: 5,
            walls: 3
        }
    );
}

#[tokio::test]
async fn test_single_player_rules_and_threads() {
    let h = harness(ScriptedSource::new().with_puzzle(short_puzzle()));
    h.dispatcher.handle(message("host", "ハイパーロボット", 0)).await;
    let root = "1700000000.000000";
    h.outbox.take();

    h.dispatcher.handle(message("alice", "赤下右上", 1_000)).await;
    assert_eq!(
        h.outbox.take(),
        vec![Outbound::Rejected(Rejection::ExceedsMinimum {
            minimum: 2,
            used: 3
        })]
    );

    h.dispatcher
        .handle(in_thread(message("alice", "赤右上", 2_000), "1700000000.999999"))
        .await;
    assert!(h.outbox.take().is_empty());

    h.dispatcher
        .handle(in_thread(message("alice", "黒上", 2_500), root))
        .await;
    assert_eq!(
        h.outbox.take(),
        vec![Outbound::Rejected(Rejection::UnknownRobot(Colour::Black))]
    );

    h.dispatcher
        .handle(in_thread(message("alice", "赤下右上まで", 3_000), root))
        .await;
    let events = h.outbox.take();
    assert!(matches!(events[0], Outbound::Cleared(_)));
    assert!(matches!(
        events[1],
        Outbound::Solution {
            shorter_exists: true,
            ..
        }
    ));
    assert_eq!(unlocks(&events), vec![Achievement::Clear]);
    assert_eq!(h.dispatcher.active_session().await, None);
}

#[tokio::test]
async fn test_commands_without_a_puzzle() {
    let h = harness(ScriptedSource::new());
    h.dispatcher.handle(message("alice", "赤右", 0)).await;
    h.dispatcher
        .handle(in_thread(message("alice", "赤右", 1), "1700000000.000000"))
        .await;
    h.dispatcher.handle(message("alice", "7手", 2)).await;
    h.dispatcher.handle(message("alice", "おはよう", 3)).await;
    let mut other = message("alice", "赤右", 4);
    other.channel = "random".to_string();
    h.dispatcher.handle(other).await;

    assert_eq!(h.outbox.events(), vec![Outbound::NoPuzzle]);
    assert!(h.source.requests().is_empty());
}

#[tokio::test]
async fn test_generator_failure_is_reported_and_recoverable() {
    let h = harness(
        ScriptedSource::new()
            .with_failure("generator exited without output")
            .with_puzzle(short_puzzle()),
    );
    h.dispatcher.handle(message("host", "ハイパーロボット", 0)).await;
    let events = h.outbox.take();
    assert!(matches!(events[0], Outbound::InternalError { .. }));
    assert_eq!(unlocks(&events), vec![Achievement::Debugger]);
    assert_eq!(h.dispatcher.active_session().await, None);

    h.dispatcher.handle(message("host", "ハイパーロボット", 1_000)).await;
    assert!(matches!(
        h.dispatcher.active_session().await,
        Some((_, GameMode::Single))
    ));
}

#[tokio::test]
async fn test_failed_delivery_is_followed_by_an_error_notice() {
    let h = harness_with(
        ScriptedSource::new().with_puzzle(short_puzzle()),
        RecordingOutbox::new().failing_first(1),
    );
    h.dispatcher.handle(message("host", "ハイパーロボット", 0)).await;
    let events = h.outbox.events();
    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], Outbound::InternalError { .. }));
    assert_eq!(unlocks(&events), vec![Achievement::Play]);
    // The session itself was still created.
    assert!(h.dispatcher.active_session().await.is_some());
}
