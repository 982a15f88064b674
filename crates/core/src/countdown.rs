//! Local autonomy countdown.
//!
//! The countdown is the only thing that ever decrements the remaining time.
//! Server pushes can restart it (see [`Countdown::needs_resync`]) but never
//! step it.

/// Outcome of a single one-second tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// No countdown is running.
    Idle,
    /// Decremented; carries the new remaining value.
    Remaining(u32),
    /// Reached zero on a previous tick and has now stopped.
    Expired,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Countdown {
    remaining: u32,
    running: bool,
}

impl Countdown {
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Start (or restart) from `seconds`.
    pub fn start(&mut self, seconds: u32) {
        self.remaining = seconds;
        self.running = true;
    }

    /// Stop and discard. Returns whether a countdown was running.
    pub fn stop(&mut self) -> bool {
        let was_running = self.running;
        self.running = false;
        self.remaining = 0;
        was_running
    }

    pub fn tick(&mut self) -> Tick {
        if !self.running {
            return Tick::Idle;
        }
        if self.remaining > 0 {
            self.remaining -= 1;
            Tick::Remaining(self.remaining)
        } else {
            self.running = false;
            Tick::Expired
        }
    }

    /// Whether an authoritative value should replace the local one.
    pub fn needs_resync(&self, authoritative: u32, tolerance_secs: u32) -> bool {
        !self.running || self.remaining.abs_diff(authoritative) > tolerance_secs
    }
}
