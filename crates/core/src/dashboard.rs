//! The dashboard state object and frame dispatcher.

use crate::gauge::{Gauge, GaugeThresholds};
use crate::log::{ChatEntry, DisplayLog, LogEntry, DEFAULT_MAX_ENTRIES};
use crate::mode::{ModeReconciler, ModeState, ModeUpdate, ReconcilerConfig, TimerCommand};
use crate::protocol::{
    Command, Frame, HistoryPayload, MonitorPayload, NucleusPayload, ProtocolError, THINK_SENTINEL,
};
use crate::vision::{Pointer, VisionImage};
use chrono::NaiveTime;

pub const USER_ROLE: &str = "USER";
pub const SYSTEM_ROLE: &str = "SYSTEM";
pub const CONSULTATION_ROLE: &str = "HITL";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DashboardConfig {
    pub reconciler: ReconcilerConfig,
    pub max_log_entries: usize,
    pub equity: GaugeThresholds,
    pub prosperity: GaugeThresholds,
    pub load: GaugeThresholds,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            reconciler: ReconcilerConfig::default(),
            max_log_entries: DEFAULT_MAX_ENTRIES,
            equity: GaugeThresholds::higher_is_better(),
            prosperity: GaugeThresholds::higher_is_better(),
            load: GaugeThresholds::lower_is_better(),
        }
    }
}

/// What a single mutation touched, for renderers that redraw incrementally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    ChatAppended,
    VisualAppended,
    ThoughtAppended,
    HistoryReplaced,
    Telemetry,
    Nucleus,
    Mode,
    Timer(TimerCommand),
    VisionFrame,
    VisionCrop,
    Pointer,
    ReasoningStream,
    Consultation,
}

#[derive(Debug, Clone)]
pub struct Telemetry {
    pub equity: Gauge,
    pub prosperity: Gauge,
    pub load: Gauge,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Nucleus {
    pub sync: Option<String>,
    pub trace: Option<String>,
}

/// Everything the dashboard shows, owned in one place.
#[derive(Debug, Clone)]
pub struct Dashboard {
    chat: DisplayLog<ChatEntry>,
    visual: DisplayLog<LogEntry>,
    thought: DisplayLog<LogEntry>,
    telemetry: Telemetry,
    nucleus: Nucleus,
    mode: ModeReconciler,
    vision_frame: Option<VisionImage>,
    vision_crop: Option<VisionImage>,
    pointer: Option<Pointer>,
    reasoning: String,
    consultation: Option<String>,
    thinking: bool,
}

impl Dashboard {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            chat: DisplayLog::new(config.max_log_entries),
            visual: DisplayLog::new(config.max_log_entries),
            thought: DisplayLog::new(config.max_log_entries),
            telemetry: Telemetry {
                equity: Gauge::new("equity", config.equity),
                prosperity: Gauge::new("prosperity", config.prosperity),
                load: Gauge::new("load", config.load),
            },
            nucleus: Nucleus::default(),
            mode: ModeReconciler::new(config.reconciler),
            vision_frame: None,
            vision_crop: None,
            pointer: None,
            reasoning: String::new(),
            consultation: None,
            thinking: false,
        }
    }

    /// Decode and apply one text message.
    pub fn apply_text(&mut self, text: &str, at: NaiveTime) -> Result<Vec<Change>, ProtocolError> {
        let frame = Frame::decode(text)?;
        Ok(self.apply(frame, at))
    }

    /// Apply one decoded frame. `at` stamps any entry appended by this frame.
    pub fn apply(&mut self, frame: Frame, at: NaiveTime) -> Vec<Change> {
        match frame {
            Frame::History(history) => self.apply_history(history, at),
            Frame::ChatResponse(chat) => {
                self.thinking = false;
                self.chat.push(ChatEntry::new(at, chat.role, chat.content));
                vec![Change::ChatAppended]
            }
            Frame::System(message) => {
                self.thinking = false;
                self.chat.push(ChatEntry::new(at, SYSTEM_ROLE, message.msg));
                vec![Change::ChatAppended]
            }
            Frame::MonitorUpdate(update) => self.apply_monitor(update),
            Frame::VisualLog(message) => {
                self.visual.push(LogEntry::new(at, message.msg));
                vec![Change::VisualAppended]
            }
            Frame::ThoughtLog(message) => {
                self.thought.push(LogEntry::new(at, message.msg));
                vec![Change::ThoughtAppended]
            }
            Frame::VisionFrame(image) => {
                self.vision_frame = Some(image);
                vec![Change::VisionFrame]
            }
            Frame::VisionCrop(image) => {
                self.vision_crop = Some(image);
                vec![Change::VisionCrop]
            }
            Frame::MouseMove(position) => {
                self.pointer = Some(Pointer {
                    x: position.x,
                    y: position.y,
                });
                vec![Change::Pointer]
            }
            Frame::NucleusUpdate(update) => self.apply_nucleus(update),
            Frame::ThoughtStream(stream) => {
                if stream.token == THINK_SENTINEL {
                    self.reasoning.clear();
                } else {
                    self.reasoning.push_str(&stream.token);
                }
                vec![Change::ReasoningStream]
            }
            Frame::HitlConsultation(message) => {
                self.chat
                    .push(ChatEntry::new(at, CONSULTATION_ROLE, message.msg.clone()));
                self.consultation = Some(message.msg);
                vec![Change::Consultation, Change::ChatAppended]
            }
            Frame::Unknown(kind) => {
                tracing::debug!(kind = %kind, "Ignoring unknown frame kind");
                Vec::new()
            }
        }
    }

    fn apply_history(&mut self, history: HistoryPayload, at: NaiveTime) -> Vec<Change> {
        if let Some(chat) = history.chat {
            self.chat.replace(
                chat.into_iter()
                    .map(|line| ChatEntry::new(at, line.role, line.content)),
            );
        }
        if let Some(visual) = history.visual {
            self.visual
                .replace(visual.iter().map(|line| LogEntry::from_history_line(line, at)));
        }
        if let Some(thought) = history.thought {
            self.thought
                .replace(thought.iter().map(|line| LogEntry::from_history_line(line, at)));
        }

        let mut changes = vec![Change::HistoryReplaced];
        if let Some(label) = history.mode.filter(|m| !m.is_empty()) {
            let update = ModeUpdate {
                label,
                autonomy: history.autonomy,
                ..ModeUpdate::default()
            };
            changes.extend(self.apply_mode(&update));
        }
        changes
    }

    fn apply_monitor(&mut self, update: MonitorPayload) -> Vec<Change> {
        let mut changes = Vec::new();
        let mut touched = false;
        if let Some(equity) = update.equity {
            touched |= self.telemetry.equity.set(equity);
        }
        if let Some(prosperity) = update.prosperity {
            touched |= self.telemetry.prosperity.set(prosperity);
        }
        if let Some(load) = update.load {
            touched |= self.telemetry.load.set(load);
        }
        if touched {
            changes.push(Change::Telemetry);
        }

        if let Some(label) = update.mode.filter(|m| !m.is_empty()) {
            let mode_update = ModeUpdate {
                label,
                vision: update.vision,
                autonomy: update.autonomy,
                gamer: update.gamer,
                action_count: update.action_count,
                last_action: update.last_action,
            };
            changes.extend(self.apply_mode(&mode_update));
        }
        changes
    }

    fn apply_nucleus(&mut self, update: NucleusPayload) -> Vec<Change> {
        let mut changes = Vec::new();
        if let Some(load) = update.load {
            if self.telemetry.load.set(load) {
                changes.push(Change::Telemetry);
            }
        }
        if update.sync.is_some() || update.trace.is_some() {
            if let Some(sync) = update.sync {
                self.nucleus.sync = Some(sync);
            }
            if let Some(trace) = update.trace {
                self.nucleus.trace = Some(trace);
            }
            changes.push(Change::Nucleus);
        }
        changes
    }

    fn apply_mode(&mut self, update: &ModeUpdate) -> Vec<Change> {
        let mut changes = vec![Change::Mode];
        changes.extend(self.mode.apply(update).into_iter().map(Change::Timer));
        changes
    }

    /// Record a message the user sent and show the thinking indicator.
    pub fn record_user_message(&mut self, text: &str, at: NaiveTime) -> Change {
        self.chat.push(ChatEntry::new(at, USER_ROLE, text));
        self.thinking = true;
        Change::ChatAppended
    }

    /// Record a client-side notice in the chat transcript.
    pub fn record_notice(&mut self, text: &str, at: NaiveTime) -> Change {
        self.chat.push(ChatEntry::new(at, SYSTEM_ROLE, text));
        Change::ChatAppended
    }

    /// One second elapsed on the countdown timer.
    pub fn tick(&mut self) -> Vec<Change> {
        let before = self.mode.state().remaining_seconds();
        let running = self.mode.state().countdown.is_running();
        let timer = self.mode.tick();

        let mut changes = Vec::new();
        if running && (before != self.mode.state().remaining_seconds() || timer.is_some()) {
            changes.push(Change::Mode);
        }
        changes.extend(timer.map(Change::Timer));
        changes
    }

    pub fn dismiss_overlay(&mut self) -> Vec<Change> {
        self.mode.dismiss_overlay();
        vec![Change::Mode]
    }

    /// Optimistically clear every mode facet.
    pub fn emergency_stop(&mut self) -> Vec<Change> {
        let mut changes = vec![Change::Mode];
        changes.extend(self.mode.emergency_stop().map(Change::Timer));
        changes
    }

    pub fn vision_toggle(&self) -> Command {
        self.mode.vision_toggle()
    }

    pub fn autonomy_toggle(&self) -> Command {
        self.mode.autonomy_toggle()
    }

    pub fn gamer_toggle(&self) -> Command {
        self.mode.gamer_toggle()
    }

    pub fn mode(&self) -> &ModeState {
        self.mode.state()
    }

    pub fn chat(&self) -> &DisplayLog<ChatEntry> {
        &self.chat
    }

    pub fn visual(&self) -> &DisplayLog<LogEntry> {
        &self.visual
    }

    pub fn thought(&self) -> &DisplayLog<LogEntry> {
        &self.thought
    }

    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    pub fn nucleus(&self) -> &Nucleus {
        &self.nucleus
    }

    pub fn vision_frame(&self) -> Option<&VisionImage> {
        self.vision_frame.as_ref()
    }

    pub fn vision_crop(&self) -> Option<&VisionImage> {
        self.vision_crop.as_ref()
    }

    pub fn pointer(&self) -> Option<Pointer> {
        self.pointer
    }

    pub fn reasoning(&self) -> &str {
        &self.reasoning
    }

    pub fn consultation(&self) -> Option<&str> {
        self.consultation.as_deref()
    }

    pub fn is_thinking(&self) -> bool {
        self.thinking
    }
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new(DashboardConfig::default())
    }
}
