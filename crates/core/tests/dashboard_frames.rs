//! Frame dispatch against a full dashboard.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use chrono::NaiveTime;
use cortex_dash_core::*;
use serde_json::json;

fn at(h: u32, m: u32, s: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, s).unwrap()
}

fn apply(dashboard: &mut Dashboard, frame: serde_json::Value) -> Vec<Change> {
    dashboard
        .apply_text(&frame.to_string(), at(12, 0, 0))
        .unwrap()
}

#[test]
fn test_history_replaces_every_sink() {
    let mut dashboard = Dashboard::default();
    apply(
        &mut dashboard,
        json!({"type": "visual_log", "payload": {"msg": "stale"}}),
    );

    let changes = apply(
        &mut dashboard,
        json!({
            "type": "history",
            "payload": {
                "chat": [
                    {"role": "USER", "content": "hola"},
                    {"role": "ARAFURA", "content": "Hola, humano."}
                ],
                "visual": ["[08:00:00] Conectado a: Steam", "[CORTEX] scanning"],
                "thought": ["[08:00:05] planning"],
                "mode": "vision",
                "autonomy": false
            }
        }),
    );

    assert!(changes.contains(&Change::HistoryReplaced));
    assert!(changes.contains(&Change::Mode));

    let chat: Vec<_> = dashboard.chat().iter().map(|e| e.content.as_str()).collect();
    assert_eq!(chat, vec!["hola", "Hola, humano."]);

    let visual: Vec<_> = dashboard.visual().iter().cloned().collect();
    assert_eq!(visual.len(), 2);
    assert_eq!(visual[0].stamp, "08:00:00");
    assert_eq!(visual[0].text, "Conectado a: Steam");
    assert_eq!(visual[1].stamp, "12:00:00");
    assert_eq!(visual[1].text, "[CORTEX] scanning");

    assert_eq!(dashboard.thought().len(), 1);
    assert!(dashboard.mode().vision_active);
    assert!(!dashboard.mode().autonomy_active);
}

#[test]
fn test_history_without_mode_keeps_mode() {
    let mut dashboard = Dashboard::default();
    apply(
        &mut dashboard,
        json!({"type": "monitor_update", "payload": {"mode": "GAMER 🎮"}}),
    );
    apply(
        &mut dashboard,
        json!({"type": "history", "payload": {"chat": []}}),
    );
    assert!(dashboard.mode().gamer_active);
}

#[test]
fn test_monitor_update_sets_gauges_and_mode() {
    let mut dashboard = Dashboard::default();
    let changes = apply(
        &mut dashboard,
        json!({
            "type": "monitor_update",
            "payload": {"equity": 94.2, "prosperity": 98.7, "mode": "AUTO 45s", "action_count": 0, "last_action": "Buscando objetivos..."}
        }),
    );

    assert_eq!(
        changes,
        vec![
            Change::Telemetry,
            Change::Mode,
            Change::Timer(TimerCommand::Restart)
        ]
    );
    let telemetry = dashboard.telemetry();
    assert_eq!(telemetry.equity.display(), "94.2%");
    assert_eq!(telemetry.equity.band(), Some(GaugeBand::Good));
    assert_eq!(telemetry.prosperity.value(), Some(98.7));

    let mode = dashboard.mode();
    assert!(mode.autonomy_active);
    assert_eq!(mode.remaining_seconds(), 45);
    assert_eq!(mode.action_count, Some(0));
    assert_eq!(mode.last_action.as_deref(), Some("Buscando objetivos..."));
}

#[test]
fn test_monitor_update_without_mode_leaves_mode_alone() {
    let mut dashboard = Dashboard::default();
    apply(
        &mut dashboard,
        json!({"type": "monitor_update", "payload": {"mode": "AUTO 30s"}}),
    );
    let changes = apply(
        &mut dashboard,
        json!({"type": "monitor_update", "payload": {"equity": 91.0, "autonomy": false}}),
    );
    assert_eq!(changes, vec![Change::Telemetry]);
    assert!(dashboard.mode().autonomy_active);
}

#[test]
fn test_nucleus_update_load_is_lower_is_better() {
    let mut dashboard = Dashboard::default();
    let changes = apply(
        &mut dashboard,
        json!({"type": "nucleus_update", "payload": {"load": 92, "sync": "ACTIVE", "trace": "#F0A1"}}),
    );
    assert_eq!(changes, vec![Change::Telemetry, Change::Nucleus]);
    assert_eq!(dashboard.telemetry().load.band(), Some(GaugeBand::Alert));
    assert_eq!(dashboard.nucleus().sync.as_deref(), Some("ACTIVE"));
    assert_eq!(dashboard.nucleus().trace.as_deref(), Some("#F0A1"));
}

#[test]
fn test_chat_response_clears_thinking() {
    let mut dashboard = Dashboard::default();
    dashboard.record_user_message("status?", at(12, 0, 0));
    assert!(dashboard.is_thinking());

    apply(
        &mut dashboard,
        json!({"type": "chat_response", "payload": {"role": "ARAFURA", "content": "All good."}}),
    );
    assert!(!dashboard.is_thinking());
    let last = dashboard.chat().last().unwrap();
    assert_eq!(last.role, "ARAFURA");
    assert_eq!(last.content, "All good.");
}

#[test]
fn test_system_message_clears_thinking() {
    let mut dashboard = Dashboard::default();
    dashboard.record_user_message("/actua 60", at(12, 0, 0));
    apply(
        &mut dashboard,
        json!({"type": "system", "payload": {"msg": "Connected to ARAFURA Core."}}),
    );
    assert!(!dashboard.is_thinking());
    assert_eq!(dashboard.chat().last().unwrap().role, "SYSTEM");
}

#[test]
fn test_incremental_logs_use_local_stamp() {
    let mut dashboard = Dashboard::default();
    dashboard
        .apply_text(
            &json!({"type": "thought_log", "payload": {"msg": "[10:00:00] kept verbatim"}}).to_string(),
            at(15, 30, 0),
        )
        .unwrap();
    let entry = dashboard.thought().last().unwrap();
    assert_eq!(entry.stamp, "15:30:00");
    assert_eq!(entry.text, "[10:00:00] kept verbatim");
}

#[test]
fn test_thought_stream_sentinel_clears_buffer() {
    let mut dashboard = Dashboard::default();
    for token in ["Looking ", "at ", "the ", "screen"] {
        apply(
            &mut dashboard,
            json!({"type": "thought_stream", "payload": {"token": token}}),
        );
    }
    assert_eq!(dashboard.reasoning(), "Looking at the screen");

    apply(
        &mut dashboard,
        json!({"type": "thought_stream", "payload": {"token": "<think>"}}),
    );
    assert_eq!(dashboard.reasoning(), "");
}

#[test]
fn test_hitl_consultation_is_recorded() {
    let mut dashboard = Dashboard::default();
    let changes = apply(
        &mut dashboard,
        json!({"type": "hitl_consultation", "payload": {"msg": "Buy item for 300 gold?"}}),
    );
    assert_eq!(changes, vec![Change::Consultation, Change::ChatAppended]);
    assert_eq!(dashboard.consultation(), Some("Buy item for 300 gold?"));
    assert_eq!(dashboard.chat().last().unwrap().role, "HITL");
}

#[test]
fn test_vision_and_pointer() {
    let mut dashboard = Dashboard::default();
    // "/9j/4A==" decodes to FF D8 FF E0
    apply(
        &mut dashboard,
        json!({"type": "vision_frame", "payload": {"image": "/9j/4A=="}}),
    );
    apply(
        &mut dashboard,
        json!({"type": "mouse_move", "payload": {"x": 640, "y": 360.5}}),
    );
    assert_eq!(dashboard.vision_frame().unwrap().format(), ImageFormat::Jpeg);
    assert!(dashboard.vision_crop().is_none());
    assert_eq!(dashboard.pointer(), Some(Pointer { x: 640.0, y: 360.5 }));
}

#[test]
fn test_unknown_kind_mutates_nothing() {
    let mut dashboard = Dashboard::default();
    apply(
        &mut dashboard,
        json!({"type": "monitor_update", "payload": {"equity": 90.0, "mode": "AUTO 20s"}}),
    );
    let before_mode = dashboard.mode().clone();
    let before_chat = dashboard.chat().len();

    let changes = apply(
        &mut dashboard,
        json!({"type": "bogus_future_kind", "payload": {"mode": "chat"}}),
    );
    assert!(changes.is_empty());
    assert_eq!(dashboard.mode(), &before_mode);
    assert_eq!(dashboard.chat().len(), before_chat);
}

#[test]
fn test_malformed_frame_is_an_error_and_leaves_state() {
    let mut dashboard = Dashboard::default();
    assert!(dashboard.apply_text("{not json", at(12, 0, 0)).is_err());
    assert!(dashboard
        .apply_text(r#"{"type":"mouse_move","payload":{"x":"left"}}"#, at(12, 0, 0))
        .is_err());
    assert!(dashboard.pointer().is_none());
    assert!(dashboard.chat().is_empty());
}

#[test]
fn test_countdown_ticks_through_dashboard() {
    let mut dashboard = Dashboard::default();
    apply(
        &mut dashboard,
        json!({"type": "monitor_update", "payload": {"mode": "AUTO 2s"}}),
    );
    assert_eq!(dashboard.tick(), vec![Change::Mode]);
    assert_eq!(dashboard.mode().label, "AUTO 1S");
    assert_eq!(dashboard.tick(), vec![Change::Mode]);
    assert_eq!(
        dashboard.tick(),
        vec![Change::Mode, Change::Timer(TimerCommand::Cancel)]
    );
    assert!(dashboard.tick().is_empty());
    assert_eq!(dashboard.mode().remaining_seconds(), 0);
}

#[test]
fn test_emergency_stop_is_local_and_immediate() {
    let mut dashboard = Dashboard::default();
    apply(
        &mut dashboard,
        json!({"type": "monitor_update", "payload": {"mode": "AUTO 40s", "gamer": true}}),
    );

    let changes = dashboard.emergency_stop();
    assert_eq!(
        changes,
        vec![Change::Mode, Change::Timer(TimerCommand::Cancel)]
    );
    let mode = dashboard.mode();
    assert!(!mode.vision_active && !mode.autonomy_active && !mode.gamer_active);
    assert!(!mode.overlay_visible);
    assert_eq!(dashboard.autonomy_toggle(), Command::StartAutonomy(60));
}

#[test]
fn test_log_retention_applies_to_history() {
    let mut dashboard = Dashboard::new(DashboardConfig {
        max_log_entries: 2,
        ..DashboardConfig::default()
    });
    apply(
        &mut dashboard,
        json!({"type": "history", "payload": {"visual": ["a", "b", "c"]}}),
    );
    let texts: Vec<_> = dashboard.visual().iter().map(|e| e.text.clone()).collect();
    assert_eq!(texts, vec!["b", "c"]);
}
