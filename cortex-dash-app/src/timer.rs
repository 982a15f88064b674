//! The one-second countdown timer commanded by the mode reconciler.

use cortex_dash_core::TimerCommand;
use std::time::Duration;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// At most one running interval. Restarting replaces it; cancelling drops it.
pub struct CountdownTimer {
    interval: Option<Interval>,
    period: Duration,
}

impl CountdownTimer {
    pub fn new(period: Duration) -> Self {
        Self {
            interval: None,
            period,
        }
    }

    pub fn is_active(&self) -> bool {
        self.interval.is_some()
    }

    pub fn restart(&mut self) {
        let mut interval = interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.interval = Some(interval);
    }

    pub fn cancel(&mut self) {
        self.interval = None;
    }

    pub fn apply(&mut self, command: TimerCommand) {
        match command {
            TimerCommand::Restart => self.restart(),
            TimerCommand::Cancel => self.cancel(),
        }
    }

    /// Resolves on the next tick; never resolves while cancelled. Cancel safe.
    pub async fn tick(&mut self) {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }
}

impl Default for CountdownTimer {
    fn default() -> Self {
        Self::new(TICK_PERIOD)
    }
}
