// src/ticker.rs
use std::time::{Duration, Instant};

use crate::drivers::ViewerError;

/// Periodic deadline polled from the UI loop.
///
/// Nothing fires until `start`; `stop` disarms it for good unless restarted.
/// Missed periods are not replayed: after a slow tick the next deadline is
/// measured from the moment the ticker noticed it was due.
#[derive(Debug)]
pub struct Ticker {
    period: Duration,
    next_due: Option<Instant>,
}

impl Ticker {
    pub fn new(period: Duration) -> Self {
        Self { period, next_due: None }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        self.next_due.is_some()
    }

    /// Arms the ticker; the first tick is due one period after `now`.
    pub fn start(&mut self, now: Instant) {
        self.next_due = Some(now + self.period);
    }

    pub fn stop(&mut self) {
        self.next_due = None;
    }

    /// True once per elapsed period.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.next_due {
            Some(due) if now >= due => {
                let next = due + self.period;
                self.next_due = Some(if next > now { next } else { now + self.period });
                true
            }
            _ => false,
        }
    }

    /// Time left until the next deadline, `None` when stopped.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.next_due.map(|due| due.saturating_duration_since(now))
    }
}

/// What the UI should do with the result of one update.
#[derive(Debug, PartialEq)]
pub enum TickOutcome<T> {
    Published(T),
    /// Updates halted; the last published frame stays on screen.
    Stopped(String),
    /// The viewer must close and exit with a failure status.
    Fatal(String),
}

/// Routes an update result. Any error disarms the ticker.
pub fn settle<T>(ticker: &mut Ticker, result: Result<T, ViewerError>) -> TickOutcome<T> {
    match result {
        Ok(value) => TickOutcome::Published(value),
        Err(err) if err.is_fatal() => {
            log::error!("{err}");
            ticker.stop();
            TickOutcome::Fatal(err.to_string())
        }
        Err(err) => {
            log::error!("update stopped: {err}");
            ticker.stop();
            TickOutcome::Stopped(err.to_string())
        }
    }
}
