//! Line-based console transport.
//!
//! Each stdin line is one chat message in the configured channel:
//!
//! ```text
//! alice: ハイパーロボット 8手
//! bob@1: 赤右緑上
//! 赤右まで
//! ```
//!
//! `user@N` replies in the thread of message `N` (messages are numbered from
//! 1 in input order). Lines without a `name: ` prefix come from the default
//! user. Outbound events are printed to stdout under the bot's icon and name.

use crate::present::format_event;
use async_trait::async_trait;
use chrono::Utc;
use hyperrobot_core::{BotConfig, Dispatcher, IncomingMessage, Outbound, Outbox};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// How often the console checks for outstanding battle timers after EOF.
const TIMER_POLL: Duration = Duration::from_millis(200);

/// Prints outbound events under the bot's icon and name.
pub struct ConsoleOutbox {
    speaker: String,
    stdout: Mutex<tokio::io::Stdout>,
}

impl ConsoleOutbox {
    pub fn new(bot: &BotConfig) -> Self {
        Self {
            speaker: speaker(bot),
            stdout: Mutex::new(tokio::io::stdout()),
        }
    }
}

fn speaker(bot: &BotConfig) -> String {
    if bot.icon_emoji.is_empty() {
        bot.username.clone()
    } else {
        format!("{} {}", bot.icon_emoji, bot.username)
    }
}

#[async_trait]
impl Outbox for ConsoleOutbox {
    async fn deliver(&self, event: Outbound) -> hyperrobot_proto::Result<()> {
        let text = format!("{}: {}\n", self.speaker, format_event(&event));
        let mut stdout = self.stdout.lock().await;
        stdout.write_all(text.as_bytes()).await?;
        stdout.flush().await?;
        Ok(())
    }
}

/// One parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleLine {
    pub user: String,
    pub thread: Option<String>,
    pub text: String,
}

/// Splits `user[@thread]: text`; anything else is spoken by `default_user`.
pub fn parse_line(line: &str, default_user: &str) -> ConsoleLine {
    let fallback = || ConsoleLine {
        user: default_user.to_string(),
        thread: None,
        text: line.trim().to_string(),
    };

    let Some((head, text)) = line.split_once(": ") else {
        return fallback();
    };
    let (user, thread) = match head.split_once('@') {
        Some((user, thread)) => (user, Some(thread)),
        None => (head, None),
    };
    if user.is_empty() || user.chars().any(char::is_whitespace) {
        return fallback();
    }

    ConsoleLine {
        user: user.to_string(),
        thread: thread.map(message_ts),
        text: text.trim().to_string(),
    }
}

fn message_ts(number: impl std::fmt::Display) -> String {
    format!("{number}.000000")
}

/// Feeds stdin to the dispatcher until EOF, then waits for battle timers.
pub async fn run_console(dispatcher: Dispatcher, default_user: &str) -> std::io::Result<()> {
    let channel = dispatcher.settings().channel.clone();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut count: u64 = 0;

    info!(channel = %channel, "Reading chat messages from stdin");
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        count += 1;
        let parsed = parse_line(&line, default_user);
        dispatcher
            .handle(IncomingMessage {
                channel: channel.clone(),
                user: parsed.user,
                text: parsed.text,
                ts: message_ts(count),
                posted_at: Utc::now(),
                thread_ts: parsed.thread,
            })
            .await;
    }

    debug!(messages = count, "Input closed");
    while dispatcher.pending_timer().await.is_some() {
        tokio::time::sleep(TIMER_POLL).await;
    }
    Ok(())
}
