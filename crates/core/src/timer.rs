//! One-second countdowns for the exam clock and the per-question clock.

use std::time::Duration;

use tokio::{
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tracing::debug;

use crate::error::{MockviewError, Result};

/// Exam clock choices, in seconds.
pub const EXAM_PRESETS: [u32; 3] = [15 * 60, 30 * 60, 60 * 60];
pub const DEFAULT_EXAM_SECS: u32 = 30 * 60;

pub fn exam_preset(minutes: u32) -> Result<u32> {
    let secs = minutes.saturating_mul(60);
    if EXAM_PRESETS.contains(&secs) {
        Ok(secs)
    } else {
        Err(MockviewError::validation(
            "Choose a test duration of 15, 30 or 60 minutes.",
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Remaining(u32),
    /// Reached zero on this tick. Returned exactly once.
    Expired,
    /// Already expired; nothing left to count.
    Idle,
}

#[derive(Debug, Clone)]
pub struct Countdown {
    total: u32,
    remaining: u32,
    expired: bool,
}

impl Countdown {
    pub fn new(total: u32) -> Self {
        Self {
            total,
            remaining: total,
            expired: false,
        }
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }

    pub fn tick(&mut self) -> Tick {
        if self.expired {
            return Tick::Idle;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.expired = true;
            Tick::Expired
        } else {
            Tick::Remaining(self.remaining)
        }
    }
}

/// Owns at most one running countdown. Starting again replaces the previous
/// one, and dropping the timer cancels it.
#[derive(Debug, Default)]
pub struct Timer {
    task: Option<JoinHandle<()>>,
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count down from `duration_secs`, calling `on_tick` with the remaining
    /// seconds once per second. At zero, `on_tick(0)` then `on_expire` run and
    /// the countdown stops; it is not re-armed.
    pub fn start<T, E>(&mut self, duration_secs: u32, mut on_tick: T, on_expire: E)
    where
        T: FnMut(u32) + Send + 'static,
        E: FnOnce() + Send + 'static,
    {
        self.cancel();
        debug!(duration_secs, "countdown started");

        let mut countdown = Countdown::new(duration_secs);
        self.task = Some(tokio::spawn(async move {
            let period = Duration::from_secs(1);
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                match countdown.tick() {
                    Tick::Remaining(secs) => on_tick(secs),
                    Tick::Expired => {
                        on_tick(0);
                        on_expire();
                        debug!(duration_secs, "countdown expired");
                        break;
                    }
                    Tick::Idle => break,
                }
            }
        }));
    }

    /// Stop the running countdown, if any. Returns whether one was running.
    pub fn cancel(&mut self) -> bool {
        match self.task.take() {
            Some(task) => {
                let was_running = !task.is_finished();
                task.abort();
                was_running
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.cancel();
    }
}
