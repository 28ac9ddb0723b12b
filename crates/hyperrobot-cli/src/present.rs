//! Chat text for outbound events.

use chrono::{DateTime, FixedOffset, Utc};
use hyperrobot_core::{Board, ClearVerdict, Outbound, Rejection, format_moves};
use hyperrobot_proto::{Colour, Direction, Position};
use std::fmt::Write;

/// Deadlines are shown in Japan time.
const JST_OFFSET_SECONDS: i32 = 9 * 3600;

fn mention(user: &str) -> String {
    format!("<@{user}>")
}

fn clock(deadline: DateTime<Utc>) -> String {
    match FixedOffset::east_opt(JST_OFFSET_SECONDS) {
        Some(jst) => deadline.with_timezone(&jst).format("%H:%M:%S").to_string(),
        None => deadline.format("%H:%M:%S UTC").to_string(),
    }
}

fn robot_letter(colour: Colour) -> char {
    match colour {
        Colour::Red => 'R',
        Colour::Green => 'G',
        Colour::Blue => 'B',
        Colour::Yellow => 'Y',
        Colour::Black => 'K',
    }
}

/// Draws the board as text. Robots are upper-case letters; the goal is the
/// lower-case letter of its colour.
pub fn render_board(board: &Board) -> String {
    let width = board.width() as i32;
    let height = board.height() as i32;
    let goal = board.goal();

    let mut out = String::from("+");
    for _ in 0..width {
        out.push_str("---+");
    }
    out.push('\n');

    for y in 0..height {
        let mut cells = String::from("|");
        let mut floor = String::from("+");
        for x in 0..width {
            let p = Position::new(x, y);
            let mark = match board.robot_at(p) {
                Some(colour) => robot_letter(colour),
                None if p == goal.position => robot_letter(goal.colour).to_ascii_lowercase(),
                None => ' ',
            };
            let _ = write!(cells, " {mark} ");
            cells.push(if board.has_wall(p, Direction::Right) {
                '|'
            } else {
                ' '
            });
            floor.push_str(if board.has_wall(p, Direction::Down) {
                "---"
            } else {
                "   "
            });
            floor.push('+');
        }
        out.push_str(&cells);
        out.push('\n');
        out.push_str(&floor);
        out.push('\n');
    }
    out
}

fn rejection_text(rejection: &Rejection) -> String {
    match rejection {
        Rejection::ExceedsMinimum { minimum, used } => format!(
            "この問題は{minimum}手詰めだよ。{used}手の解答を出すなら最後に「まで」をつけてね:pleading_face:"
        ),
        Rejection::ExceedsBid {
            user,
            declared,
            used,
        } => format!(
            "{}さんの宣言手数は{declared}手だよ。{used}手は多すぎるよ:angry:",
            mention(user)
        ),
        Rejection::NotYourTurn { active } => {
            format!("今は{}さんの解答時間だよ:angry:", mention(active))
        }
        Rejection::BiddingOpen => "今は宣言中だよ:angry:".to_string(),
        Rejection::UnknownRobot(colour) => format!("{colour}のロボットはいないよ:thinking_face:"),
    }
}

/// Formats one outbound event as a chat message.
pub fn format_event(event: &Outbound) -> String {
    match event {
        Outbound::PuzzlePresented { board, moves } => {
            let moves = moves.map_or_else(|| "?".to_string(), |n| n.to_string());
            format!("{moves}手詰めです\n{}", render_board(board))
        }
        Outbound::NoPuzzle => {
            "まだ出題していませんよ:thinking_face:\nもしかして:「ハイパーロボット」".to_string()
        }
        Outbound::Rejected(rejection) => rejection_text(rejection),
        Outbound::NotSolved { user, board } => {
            format!("{} 解けてませんね:thinking_face:\n{}", mention(user), render_board(board))
        }
        Outbound::Cleared(report) => {
            let mut text = format!("{} 正解です!:tada:", mention(&report.user));
            match report.verdict {
                ClearVerdict::Shortest => text.push_str("\nさらに最短勝利です!:waiwai:"),
                ClearVerdict::Anomaly => text.push_str("\nというか:bug:ってますね"),
                ClearVerdict::Longer => {}
            }
            if let Some(elapsed) = report.elapsed {
                let _ = write!(text, "\n経過時間: {:.3} 秒", elapsed.as_secs_f64());
            }
            text.push('\n');
            text.push_str(&render_board(&report.board));
            text
        }
        Outbound::Solution {
            answer,
            board,
            shorter_exists,
        } => {
            let mut text = String::new();
            if *shorter_exists {
                let _ = writeln!(text, "実は{}手でたどり着けるんです。", answer.len());
            }
            let _ = write!(
                text,
                "僕の見つけた手順です\n{}\n{}",
                format_moves(answer),
                render_board(board)
            );
            text
        }
        Outbound::BidAccepted { message_ts } => format!(":ok_hand: ({message_ts})"),
        Outbound::BiddingDeadline { deadline } => {
            format!("宣言終了予定時刻: {}", clock(*deadline))
        }
        Outbound::TurnStarted {
            user,
            declared,
            deadline,
        } => format!(
            "{}さんは{declared}手以内で解答してください。\n解答終了予定時刻: {}",
            mention(user),
            clock(*deadline)
        ),
        Outbound::TurnMissed { user } => {
            format!("{}さんは間に合わなかったみたいだね:cry:", mention(user))
        }
        Outbound::Exhausted { answer, board } => format!(
            "だれも正解できなかったよ:cry:\n正解は{}でした。\n{}",
            format_moves(answer),
            render_board(board)
        ),
        Outbound::InternalError { detail } => format!("内部errorです:cry:\n{detail}"),
        Outbound::Unlock { user, achievement } => {
            format!(":trophy: {} {achievement}", mention(user))
        }
    }
}
