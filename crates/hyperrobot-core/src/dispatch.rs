//! Dispatch shell: the single critical section around session state.
//!
//! Every incoming message and every timer expiry takes the same mutex, runs
//! the pure session transition, and delivers the resulting events before the
//! lock is released. Timers carry a [`TimerToken`]; a token that no longer
//! matches the pending timer is a no-op.

use crate::battle::{BattleSession, BidOutcome};
use crate::command::{Command, parse_command};
use crate::config::HyperrobotConfig;
use crate::outbound::{Outbound, Outbox, UserId};
use crate::puzzle::PuzzleSource;
use crate::request::{GameMode, PuzzleRequest, parse_bid, parse_request};
use crate::single_play::SinglePlaySession;
use chrono::{DateTime, TimeDelta, Utc};
use hyperrobot_proto::Achievement;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// A chat message as seen by the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub channel: String,
    pub user: UserId,
    pub text: String,
    /// Platform message id; also the thread root id for replies.
    pub ts: String,
    pub posted_at: DateTime<Utc>,
    /// Set when the message is a reply inside a thread.
    pub thread_ts: Option<String>,
}

/// Runtime settings for the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchSettings {
    pub channel: String,
    pub bidding_window: Duration,
    pub answer_window: Duration,
    pub max_depth: u32,
}

impl From<&HyperrobotConfig> for DispatchSettings {
    fn from(config: &HyperrobotConfig) -> Self {
        Self {
            channel: config.channel.clone(),
            bidding_window: config.battle.bidding_window(),
            answer_window: config.battle.answer_window(),
            max_depth: config.max_depth,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    BiddingClose,
    AnswerWindow,
}

/// Identifies one scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerToken {
    pub session: u64,
    /// Increases with every timer scheduled by this dispatcher.
    pub generation: u64,
    pub kind: TimerKind,
}

#[derive(Debug)]
enum Game {
    Single(SinglePlaySession),
    Battle(BattleSession),
}

impl Game {
    fn presentation(&self) -> Outbound {
        match self {
            Game::Single(session) => session.presentation(),
            Game::Battle(session) => session.presentation(),
        }
    }

    fn mode(&self) -> GameMode {
        match self {
            Game::Single(_) => GameMode::Single,
            Game::Battle(_) => GameMode::Battle,
        }
    }
}

#[derive(Debug)]
struct ActiveSession {
    id: u64,
    game: Game,
}

#[derive(Debug)]
struct PendingTimer {
    token: TimerToken,
    handle: JoinHandle<()>,
}

#[derive(Debug, Default)]
struct Shell {
    current: Option<ActiveSession>,
    next_session: u64,
    next_generation: u64,
    timer: Option<PendingTimer>,
}

struct Inner {
    settings: DispatchSettings,
    source: Arc<dyn PuzzleSource>,
    outbox: Arc<dyn Outbox>,
    shell: Mutex<Shell>,
}

/// Serialises messages and timer expiries against the current session.
///
/// Cheap to clone; clones share the same session state.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

impl Dispatcher {
    pub fn new(
        settings: DispatchSettings,
        source: Arc<dyn PuzzleSource>,
        outbox: Arc<dyn Outbox>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                settings,
                source,
                outbox,
                shell: Mutex::new(Shell::default()),
            }),
        }
    }

    pub fn settings(&self) -> &DispatchSettings {
        &self.inner.settings
    }

    /// Mode and id of the active session, if any.
    pub async fn active_session(&self) -> Option<(u64, GameMode)> {
        let shell = self.inner.shell.lock().await;
        shell
            .current
            .as_ref()
            .map(|active| (active.id, active.game.mode()))
    }

    /// Token of the timer that is currently pending, if any.
    pub async fn pending_timer(&self) -> Option<TimerToken> {
        let shell = self.inner.shell.lock().await;
        shell.timer.as_ref().map(|pending| pending.token)
    }

    /// Handles one incoming chat message.
    pub async fn handle(&self, msg: IncomingMessage) {
        if msg.channel != self.inner.settings.channel {
            debug!(channel = %msg.channel, "Ignoring message from another channel");
            return;
        }

        let mut shell = self.inner.shell.lock().await;
        let events = if let Some(request) = parse_request(&msg.text, self.inner.settings.max_depth) {
            self.on_request(&mut shell, &msg, request).await
        } else if let Some(command) = parse_command(&msg.text) {
            self.on_command(&mut shell, &msg, &command)
        } else if let Some(declared) = parse_bid(&msg.text) {
            self.on_bid(&mut shell, &msg, declared)
        } else {
            debug!(user = %msg.user, "Ignoring chat");
            Vec::new()
        };
        self.deliver_all(events).await;
    }

    /// Runs the transition for an expired timer.
    ///
    /// Tokens that do not match the pending timer are ignored.
    pub async fn fire(&self, token: TimerToken) {
        let mut shell = self.inner.shell.lock().await;
        match &shell.timer {
            Some(pending) if pending.token == token => {}
            _ => {
                debug!(?token, "Ignoring stale timer");
                return;
            }
        }
        // The handle belongs to the task running this call; drop it without aborting.
        shell.timer = None;

        let events = self.advance_battle(&mut shell, token);
        self.deliver_all(events).await;
    }

    async fn on_request(
        &self,
        shell: &mut Shell,
        msg: &IncomingMessage,
        request: PuzzleRequest,
    ) -> Vec<Outbound> {
        if let Some(active) = &shell.current {
            info!(session = active.id, user = %msg.user, "Puzzle already active, presenting it again");
            return vec![active.game.presentation()];
        }

        let spec = request.difficulty.spec(request.depth);
        info!(
            user = %msg.user,
            difficulty = request.difficulty.name(),
            depth = request.depth,
            mode = ?request.mode,
            "Generating puzzle"
        );
        let generation_started = Instant::now();
        let puzzle = match self.inner.source.generate(spec).await {
            Ok(puzzle) => puzzle,
            Err(err) => {
                error!(error = %err, "Puzzle generation failed");
                return vec![
                    Outbound::InternalError {
                        detail: err.to_string(),
                    },
                    Outbound::Unlock {
                        user: msg.user.clone(),
                        achievement: Achievement::Debugger,
                    },
                ];
            }
        };

        // Player time starts when the puzzle is shown, not when it was requested.
        let generation = generation_started.elapsed();
        let presented_at =
            msg.posted_at + TimeDelta::from_std(generation).unwrap_or(TimeDelta::zero());
        debug!(generation_ms = generation.as_millis() as u64, "Puzzle ready");

        let id = shell.next_session;
        shell.next_session += 1;
        let (game, achievement) = match request.mode {
            GameMode::Single => (
                Game::Single(SinglePlaySession::new(puzzle, presented_at, msg.ts.clone())),
                Achievement::Play,
            ),
            GameMode::Battle => (Game::Battle(BattleSession::new(puzzle)), Achievement::BattlePlay),
        };
        let presentation = game.presentation();
        shell.current = Some(ActiveSession { id, game });
        info!(session = id, mode = ?request.mode, "Session created");

        vec![
            presentation,
            Outbound::Unlock {
                user: msg.user.clone(),
                achievement,
            },
        ]
    }

    fn on_command(&self, shell: &mut Shell, msg: &IncomingMessage, command: &Command) -> Vec<Outbound> {
        let Some(active) = shell.current.as_ref() else {
            if msg.thread_ts.is_some() {
                debug!(user = %msg.user, "Ignoring command in a thread with no puzzle");
                return Vec::new();
            }
            return vec![Outbound::NoPuzzle];
        };

        let judgement = match &active.game {
            Game::Single(session) => {
                if msg.thread_ts.as_deref().is_some_and(|ts| ts != session.thread_ts()) {
                    debug!(user = %msg.user, "Ignoring command in an unrelated thread");
                    return Vec::new();
                }
                session.judge(&msg.user, command, msg.posted_at)
            }
            Game::Battle(session) => {
                if msg.thread_ts.is_some() {
                    debug!(user = %msg.user, "Ignoring battle command posted in a thread");
                    return Vec::new();
                }
                session.submit(&msg.user, command)
            }
        };

        if judgement.finished {
            let id = active.id;
            self.end_session(shell);
            info!(session = id, user = %msg.user, "Session finished");
        }
        judgement.events
    }

    fn on_bid(&self, shell: &mut Shell, msg: &IncomingMessage, declared: u32) -> Vec<Outbound> {
        if msg.thread_ts.is_some() {
            return Vec::new();
        }
        let Some(ActiveSession {
            id,
            game: Game::Battle(session),
        }) = shell.current.as_mut()
        else {
            debug!(user = %msg.user, "Number posted outside a battle");
            return Vec::new();
        };
        let id = *id;

        match session.place_bid(&msg.user, declared, msg.posted_at) {
            BidOutcome::Recorded { first } => {
                let mut events = vec![Outbound::BidAccepted {
                    message_ts: msg.ts.clone(),
                }];
                if first {
                    let window = self.inner.settings.bidding_window;
                    self.schedule(shell, id, TimerKind::BiddingClose, window);
                    info!(session = id, user = %msg.user, "Bidding clock started");
                    events.push(Outbound::BiddingDeadline {
                        deadline: deadline_after(window),
                    });
                }
                events
            }
            // The older bid stays on record but the message is still acknowledged.
            BidOutcome::Stale => vec![Outbound::BidAccepted {
                message_ts: msg.ts.clone(),
            }],
            BidOutcome::Closed => Vec::new(),
        }
    }

    /// Closes bidding or moves past a lapsed answer window.
    fn advance_battle(&self, shell: &mut Shell, token: TimerToken) -> Vec<Outbound> {
        let Some(ActiveSession {
            id,
            game: Game::Battle(session),
        }) = shell.current.as_mut()
        else {
            debug!(?token, "Timer fired without a battle");
            return Vec::new();
        };
        if *id != token.session {
            debug!(?token, "Timer fired for a finished session");
            return Vec::new();
        }
        let id = *id;

        if token.kind == TimerKind::BiddingClose {
            session.close_bidding();
        }
        let change = session.advance_turn();

        let mut events = Vec::new();
        if let Some(user) = change.missed {
            events.push(Outbound::TurnMissed { user });
        }
        match change.next {
            Some(bid) => {
                let window = self.inner.settings.answer_window;
                info!(session = id, user = %bid.user, declared = bid.declared, "Answer window opened");
                events.push(Outbound::TurnStarted {
                    user: bid.user,
                    declared: bid.declared,
                    deadline: deadline_after(window),
                });
                self.schedule(shell, id, TimerKind::AnswerWindow, window);
            }
            None => {
                events.push(session.exhausted());
                info!(session = id, "Nobody solved the battle");
                self.end_session(shell);
            }
        }
        events
    }

    /// Starts a timer, replacing any pending one.
    fn schedule(&self, shell: &mut Shell, session: u64, kind: TimerKind, after: Duration) {
        shell.next_generation += 1;
        let token = TimerToken {
            session,
            generation: shell.next_generation,
            kind,
        };
        if let Some(previous) = shell.timer.take() {
            previous.handle.abort();
        }

        let dispatcher = self.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            dispatcher.fire(token).await;
        });
        debug!(?token, after_secs = after.as_secs(), "Timer scheduled");
        shell.timer = Some(PendingTimer { token, handle });
    }

    /// Destroys the current session and cancels its timer.
    fn end_session(&self, shell: &mut Shell) {
        shell.current = None;
        if let Some(pending) = shell.timer.take() {
            pending.handle.abort();
            debug!(token = ?pending.token, "Cancelled pending timer");
        }
    }

    async fn deliver_all(&self, events: Vec<Outbound>) {
        for event in events {
            let is_error_notice = matches!(event, Outbound::InternalError { .. });
            let Err(err) = self.inner.outbox.deliver(event).await else {
                continue;
            };
            warn!(error = %err, "Failed to deliver outbound event");
            if is_error_notice {
                continue;
            }
            let notice = Outbound::InternalError {
                detail: err.to_string(),
            };
            if let Err(err) = self.inner.outbox.deliver(notice).await {
                warn!(error = %err, "Failed to deliver internal error notice");
            }
        }
    }
}

fn deadline_after(window: Duration) -> DateTime<Utc> {
    Utc::now() + TimeDelta::from_std(window).unwrap_or(TimeDelta::zero())
}
