//! Plain-text rendering of dashboard changes for the terminal.

use crate::metrics::MetricsSnapshot;
use cortex_dash_core::{Change, ChatEntry, Dashboard, Gauge, LogEntry, ModeState, VisionImage};
use cortex_dash_transport::ConnectionState;

/// Reasoning tail shown by `:status`.
const REASONING_TAIL_CHARS: usize = 200;

/// Visual and thought lines echoed when history is replaced.
const HISTORY_TAIL_ENTRIES: usize = 5;

/// Text for one change, or `None` for changes that only show up in `:status`.
pub fn render_change(dashboard: &Dashboard, change: Change) -> Option<String> {
    match change {
        Change::ChatAppended => dashboard.chat().last().map(chat_line),
        Change::VisualAppended => dashboard.visual().last().map(|e| log_line("👁 ", e)),
        Change::ThoughtAppended => dashboard.thought().last().map(|e| log_line("🧠", e)),
        Change::HistoryReplaced => Some(history(dashboard)),
        Change::Telemetry => Some(telemetry_line(dashboard)),
        Change::Nucleus => Some(nucleus_line(dashboard)),
        Change::Mode => Some(mode_line(dashboard.mode())),
        Change::VisionFrame => dashboard.vision_frame().map(|i| image_line("📷 Frame", i)),
        Change::VisionCrop => dashboard.vision_crop().map(|i| image_line("🔍 Focus", i)),
        Change::Consultation => dashboard
            .consultation()
            .map(|msg| format!("🙋 Cortex asks for guidance: {}", msg)),
        Change::Timer(_) | Change::Pointer | Change::ReasoningStream => None,
    }
}

pub fn chat_line(entry: &ChatEntry) -> String {
    format!("[{}] {}: {}", entry.stamp, entry.role, entry.content)
}

fn log_line(prefix: &str, entry: &LogEntry) -> String {
    format!("{} [{}] {}", prefix, entry.stamp, entry.text)
}

fn history(dashboard: &Dashboard) -> String {
    let mut lines = vec![format!(
        "── History: {} chat, {} visual, {} thought ──",
        dashboard.chat().len(),
        dashboard.visual().len(),
        dashboard.thought().len()
    )];
    lines.extend(dashboard.chat().iter().map(chat_line));
    let visual = dashboard.visual();
    lines.extend(
        visual
            .iter()
            .skip(visual.len().saturating_sub(HISTORY_TAIL_ENTRIES))
            .map(|e| log_line("👁 ", e)),
    );
    let thought = dashboard.thought();
    lines.extend(
        thought
            .iter()
            .skip(thought.len().saturating_sub(HISTORY_TAIL_ENTRIES))
            .map(|e| log_line("🧠", e)),
    );
    lines.push(mode_line(dashboard.mode()));
    lines.join("\n")
}

fn gauge_part(gauge: &Gauge) -> String {
    match gauge.band() {
        Some(band) => format!("{} {} ({})", gauge.name(), gauge.display(), band.as_str()),
        None => format!("{} {}", gauge.name(), gauge.display()),
    }
}

pub fn telemetry_line(dashboard: &Dashboard) -> String {
    let telemetry = dashboard.telemetry();
    format!(
        "📊 {} | {} | {}",
        gauge_part(&telemetry.equity),
        gauge_part(&telemetry.prosperity),
        gauge_part(&telemetry.load)
    )
}

fn nucleus_line(dashboard: &Dashboard) -> String {
    let nucleus = dashboard.nucleus();
    format!(
        "🧬 Nucleus {} | sync {} | trace {}",
        gauge_part(&dashboard.telemetry().load),
        nucleus.sync.as_deref().unwrap_or("--"),
        nucleus.trace.as_deref().unwrap_or("--")
    )
}

fn on_off(active: bool) -> &'static str {
    if active {
        "on"
    } else {
        "off"
    }
}

pub fn mode_line(mode: &ModeState) -> String {
    let mut line = format!(
        "🎛  Mode {} | vision {} | auto {} | gamer {}",
        mode.label,
        on_off(mode.vision_active),
        on_off(mode.autonomy_active),
        on_off(mode.gamer_active)
    );

    if mode.overlay_visible {
        line.push_str(&format!(" | ⏱ {}s", mode.remaining_seconds()));
        if let Some(count) = mode.action_count {
            line.push_str(&format!(" | actions {}", count));
        }
        if let Some(last) = &mode.last_action {
            line.push_str(&format!(" | last: {}", last));
        }
    }
    line
}

fn image_line(prefix: &str, image: &VisionImage) -> String {
    format!(
        "{} {} bytes ({})",
        prefix,
        image.len(),
        image.format().as_str()
    )
}

fn reasoning_tail(reasoning: &str) -> &str {
    let count = reasoning.chars().count();
    if count <= REASONING_TAIL_CHARS {
        return reasoning;
    }
    let skip = count - REASONING_TAIL_CHARS;
    match reasoning.char_indices().nth(skip) {
        Some((index, _)) => &reasoning[index..],
        None => reasoning,
    }
}

/// Multi-line snapshot for `:status`.
pub fn status_report(
    dashboard: &Dashboard,
    connection: ConnectionState,
    metrics: &MetricsSnapshot,
) -> String {
    let mut lines = vec![
        format!("🔗 Connection {}", connection.as_str()),
        mode_line(dashboard.mode()),
        telemetry_line(dashboard),
        nucleus_line(dashboard),
    ];

    if let Some(pointer) = dashboard.pointer() {
        lines.push(format!("🖱  Pointer {:.0}, {:.0}", pointer.x, pointer.y));
    }
    if let Some(frame) = dashboard.vision_frame() {
        lines.push(image_line("📷 Last frame", frame));
    }
    if dashboard.is_thinking() {
        lines.push("💭 Cortex is thinking...".to_string());
    }
    if !dashboard.reasoning().is_empty() {
        lines.push(format!("💭 {}", reasoning_tail(dashboard.reasoning())));
    }
    lines.push(format!(
        "📈 frames {} | decode failures {} | reconnects {} | rejected sends {}",
        metrics.frames_received,
        metrics.decode_failures,
        metrics.reconnect_attempts,
        metrics.rejected_sends
    ));
    lines.join("\n")
}
