//! Deterministic fakes for the puzzle-source and outbox seams.

use crate::outbound::{Outbound, Outbox};
use crate::puzzle::{Puzzle, PuzzleSource, PuzzleSpec};
use async_trait::async_trait;
use hyperrobot_proto::Error;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Puzzle source that replays a fixed script of results.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    script: Mutex<VecDeque<Result<Puzzle, String>>>,
    requests: Mutex<Vec<PuzzleSpec>>,
    delay: Duration,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a puzzle for the next request.
    #[must_use]
    pub fn with_puzzle(self, puzzle: Puzzle) -> Self {
        lock(&self.script).push_back(Ok(puzzle));
        self
    }

    /// Queues a generator failure for the next request.
    #[must_use]
    pub fn with_failure(self, message: impl Into<String>) -> Self {
        lock(&self.script).push_back(Err(message.into()));
        self
    }

    /// Makes every request take `delay` on the tokio clock.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Specs received so far, oldest first.
    pub fn requests(&self) -> Vec<PuzzleSpec> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl PuzzleSource for ScriptedSource {
    async fn generate(&self, spec: PuzzleSpec) -> hyperrobot_proto::Result<Puzzle> {
        lock(&self.requests).push(spec);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match lock(&self.script).pop_front() {
            Some(Ok(puzzle)) => Ok(puzzle),
            Some(Err(message)) => Err(Error::puzzle(message)),
            None => Err(Error::puzzle("script exhausted")),
        }
    }
}

/// Outbox that records every delivered event.
#[derive(Debug, Default)]
pub struct RecordingOutbox {
    events: Mutex<Vec<Outbound>>,
    failures_left: Mutex<usize>,
}

impl RecordingOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` deliveries fail without being recorded.
    #[must_use]
    pub fn failing_first(self, count: usize) -> Self {
        *lock(&self.failures_left) = count;
        self
    }

    /// Everything delivered so far.
    pub fn events(&self) -> Vec<Outbound> {
        lock(&self.events).clone()
    }

    /// Drains the recorded events.
    pub fn take(&self) -> Vec<Outbound> {
        std::mem::take(&mut *lock(&self.events))
    }
}

#[async_trait]
impl Outbox for RecordingOutbox {
    async fn deliver(&self, event: Outbound) -> hyperrobot_proto::Result<()> {
        {
            let mut failures_left = lock(&self.failures_left);
            if *failures_left > 0 {
                *failures_left -= 1;
                return Err(Error::Delivery("recording outbox told to fail".to_string()));
            }
        }
        lock(&self.events).push(event);
        Ok(())
    }
}
