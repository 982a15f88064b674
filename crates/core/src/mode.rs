//! Mode reconciliation.
//!
//! The agent reports its mode as a free-text label ("vision", "GAMER 🎮",
//! "AUTO 45s") and sometimes adds explicit boolean hints. Vision, autonomy
//! and gamer are independent facets that are re-derived from both sources on
//! every update. A hint can switch a facet on; it never switches one off.

use crate::countdown::{Countdown, Tick};
use crate::protocol::{Command, DEFAULT_AUTONOMY_SECS};

pub const DEFAULT_RESYNC_TOLERANCE_SECS: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcilerConfig {
    /// Drift allowed between the local countdown and a pushed value before resyncing.
    pub resync_tolerance_secs: u32,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            resync_tolerance_secs: DEFAULT_RESYNC_TOLERANCE_SECS,
        }
    }
}

/// A mode-bearing update from the agent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModeUpdate {
    pub label: String,
    pub vision: Option<bool>,
    pub autonomy: Option<bool>,
    pub gamer: Option<bool>,
    pub action_count: Option<u64>,
    pub last_action: Option<String>,
}

impl ModeUpdate {
    pub fn from_label(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }
}

/// Instruction for whoever owns the one-second timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    /// Drop any running timer and start a fresh one.
    Restart,
    Cancel,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Facets {
    pub vision: bool,
    pub autonomy: bool,
    pub gamer: bool,
}

impl Facets {
    pub fn derive(update: &ModeUpdate) -> Self {
        let label = update.label.to_lowercase();
        let hinted = |hint: Option<bool>| hint.unwrap_or(false);

        Self {
            vision: label.contains("vision")
                || label.contains("gamer")
                || label.contains("auto")
                || hinted(update.vision),
            autonomy: hinted(update.autonomy) || label.contains("auto"),
            gamer: hinted(update.gamer) || label.contains("gamer"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeState {
    /// Display label, upper-cased.
    pub label: String,
    pub vision_active: bool,
    pub autonomy_active: bool,
    pub gamer_active: bool,
    pub countdown: Countdown,
    pub overlay_visible: bool,
    pub overlay_manually_closed: bool,
    pub action_count: Option<u64>,
    pub last_action: Option<String>,
}

impl Default for ModeState {
    fn default() -> Self {
        Self {
            label: "CHAT".to_string(),
            vision_active: false,
            autonomy_active: false,
            gamer_active: false,
            countdown: Countdown::default(),
            overlay_visible: false,
            overlay_manually_closed: false,
            action_count: None,
            last_action: None,
        }
    }
}

impl ModeState {
    pub fn remaining_seconds(&self) -> u32 {
        self.countdown.remaining()
    }

    pub fn facets(&self) -> Facets {
        Facets {
            vision: self.vision_active,
            autonomy: self.autonomy_active,
            gamer: self.gamer_active,
        }
    }
}

/// Extract `N` from a label of the form `AUTO <N>S` (case-insensitive).
pub fn parse_countdown(label: &str) -> Option<u32> {
    let lower = label.to_lowercase();
    let start = lower.find("auto")? + "auto".len();
    let rest = lower[start..].trim_start();
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Reconcile `state` with one update, returning the next state and any timer work.
pub fn reconcile(
    state: &ModeState,
    update: &ModeUpdate,
    config: &ReconcilerConfig,
) -> (ModeState, Vec<TimerCommand>) {
    let mut next = state.clone();
    let mut timer = Vec::new();
    let facets = Facets::derive(update);

    next.label = update.label.to_uppercase();
    next.vision_active = facets.vision;
    next.autonomy_active = facets.autonomy;
    next.gamer_active = facets.gamer;

    if facets.autonomy {
        if !next.overlay_manually_closed {
            next.overlay_visible = true;
        }
        if let Some(count) = update.action_count {
            next.action_count = Some(count);
        }
        if let Some(action) = &update.last_action {
            next.last_action = Some(action.clone());
        }
        if let Some(authoritative) = parse_countdown(&update.label) {
            if next
                .countdown
                .needs_resync(authoritative, config.resync_tolerance_secs)
            {
                tracing::debug!(
                    local = next.countdown.remaining(),
                    authoritative,
                    "Resynchronizing autonomy countdown"
                );
                next.countdown.start(authoritative);
                timer.push(TimerCommand::Restart);
            }
        }
    } else {
        next.overlay_visible = false;
        next.overlay_manually_closed = false;
        next.action_count = None;
        next.last_action = None;
        if next.countdown.stop() {
            timer.push(TimerCommand::Cancel);
        }
    }

    (next, timer)
}

/// Owns the mode state and applies every mutation to it.
#[derive(Debug, Clone, Default)]
pub struct ModeReconciler {
    state: ModeState,
    config: ReconcilerConfig,
}

impl ModeReconciler {
    pub fn new(config: ReconcilerConfig) -> Self {
        Self {
            state: ModeState::default(),
            config,
        }
    }

    pub fn state(&self) -> &ModeState {
        &self.state
    }

    pub fn apply(&mut self, update: &ModeUpdate) -> Vec<TimerCommand> {
        let (next, timer) = reconcile(&self.state, update, &self.config);
        self.state = next;
        timer
    }

    /// Advance the countdown by one second.
    pub fn tick(&mut self) -> Option<TimerCommand> {
        match self.state.countdown.tick() {
            Tick::Idle => None,
            Tick::Remaining(remaining) => {
                if self.state.autonomy_active {
                    self.state.label = format!("AUTO {}S", remaining);
                }
                None
            }
            Tick::Expired => Some(TimerCommand::Cancel),
        }
    }

    /// User closed the overlay; keep it hidden until autonomy restarts.
    pub fn dismiss_overlay(&mut self) {
        self.state.overlay_visible = false;
        self.state.overlay_manually_closed = true;
    }

    /// Clear every facet locally without waiting for the agent.
    pub fn emergency_stop(&mut self) -> Option<TimerCommand> {
        self.state.vision_active = false;
        self.state.autonomy_active = false;
        self.state.gamer_active = false;
        self.state.overlay_visible = false;
        self.state.overlay_manually_closed = false;
        self.state.action_count = None;
        self.state.last_action = None;
        self.state
            .countdown
            .stop()
            .then_some(TimerCommand::Cancel)
    }

    pub fn vision_toggle(&self) -> Command {
        if self.state.vision_active {
            Command::ModeChat
        } else {
            Command::ModeVision
        }
    }

    pub fn autonomy_toggle(&self) -> Command {
        if self.state.autonomy_active {
            Command::StopAutonomy
        } else {
            Command::StartAutonomy(DEFAULT_AUTONOMY_SECS)
        }
    }

    pub fn gamer_toggle(&self) -> Command {
        Command::ToggleGamer
    }
}
