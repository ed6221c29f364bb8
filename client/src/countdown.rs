//! A client-side election countdown.
//!
//! The admin page reads the remaining election time once per fetch and then counts down
//! locally, once per second, without asking the ledger again.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

const TICK: Duration = Duration::from_secs(1);

/// A running one-second countdown.
///
/// The countdown owns a background task. The task stops on its own at zero and is
/// aborted when the `Countdown` is dropped, whichever comes first.
#[derive(Debug)]
pub struct Countdown {
    remaining: watch::Receiver<u64>,
    task: JoinHandle<()>,
}

impl Countdown {
    /// Starts counting down from `seconds`. Must be called within a tokio runtime.
    pub fn start(seconds: u64) -> Self {
        let (sender, remaining) = watch::channel(seconds);
        let task = tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + TICK, TICK);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut left = seconds;
            while left > 0 {
                ticker.tick().await;
                left = tick(left);
                if sender.send(left).is_err() {
                    break;
                }
            }
        });
        Self { remaining, task }
    }

    /// Seconds left.
    pub fn remaining(&self) -> u64 {
        *self.remaining.borrow()
    }

    /// A receiver that observes every tick.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.remaining.clone()
    }

    /// Whether the countdown reached zero or was cancelled.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stops the countdown. Equivalent to dropping it.
    pub fn cancel(self) {}
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// One step of the countdown. Never goes below zero.
pub fn tick(seconds: u64) -> u64 {
    seconds.saturating_sub(1)
}

/// Formats remaining seconds the way the admin dashboard shows them.
pub fn format_time(seconds: u64) -> String {
    if seconds == 0 {
        return "Election ended".to_string();
    }
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{hours}h {minutes}m {secs}s")
}
