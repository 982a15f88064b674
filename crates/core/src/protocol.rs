//! Wire protocol spoken with the Cortex agent.
//!
//! Inbound traffic is one JSON object per message, `{"type": kind, "payload": {...}}`.
//! Outbound traffic is either bare text (chat and slash commands) or a tagged
//! control object such as `{"type": "set_power", "payload": {"level": 4.0}}`.

use crate::vision::VisionImage;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Seconds requested when autonomy is toggled on from the dashboard.
pub const DEFAULT_AUTONOMY_SECS: u32 = 60;

/// Inclusive bounds accepted for `set_power`.
pub const POWER_LEVEL_MIN: f64 = 0.0;
pub const POWER_LEVEL_MAX: f64 = 10.0;

/// Token that resets the streamed reasoning buffer.
pub const THINK_SENTINEL: &str = "<think>";

/// Protocol errors.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Malformed frame: {0}")]
    MalformedFrame(#[from] serde_json::Error),

    #[error("Invalid payload for '{kind}': {source}")]
    InvalidPayload {
        kind: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid image data: {0}")]
    InvalidImage(#[from] base64::DecodeError),

    #[error("Empty image payload")]
    EmptyImage,

    #[error("Power level out of range: {0} (expected 0.0-10.0)")]
    PowerLevelOutOfRange(f64),
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default = "empty_payload")]
    payload: Value,
}

fn empty_payload() -> Value {
    Value::Object(serde_json::Map::new())
}

/// One line of chat history as the agent stores it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatLine {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HistoryPayload {
    pub chat: Option<Vec<ChatLine>>,
    pub visual: Option<Vec<String>>,
    pub thought: Option<Vec<String>>,
    pub mode: Option<String>,
    pub autonomy: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatPayload {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MessagePayload {
    pub msg: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MonitorPayload {
    pub equity: Option<f64>,
    pub prosperity: Option<f64>,
    pub load: Option<f64>,
    pub mode: Option<String>,
    pub autonomy: Option<bool>,
    pub gamer: Option<bool>,
    pub vision: Option<bool>,
    pub action_count: Option<u64>,
    pub last_action: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ImagePayload {
    image: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PointerPayload {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NucleusPayload {
    pub load: Option<f64>,
    pub sync: Option<String>,
    pub trace: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TokenPayload {
    pub token: String,
}

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    History(HistoryPayload),
    ChatResponse(ChatPayload),
    System(MessagePayload),
    MonitorUpdate(MonitorPayload),
    VisualLog(MessagePayload),
    ThoughtLog(MessagePayload),
    VisionFrame(VisionImage),
    VisionCrop(VisionImage),
    MouseMove(PointerPayload),
    NucleusUpdate(NucleusPayload),
    ThoughtStream(TokenPayload),
    HitlConsultation(MessagePayload),
    /// A kind this client does not know. Newer agents may add kinds at any time.
    Unknown(String),
}

impl Frame {
    /// Decode a single text message.
    ///
    /// # Errors
    /// Returns an error if the envelope is not JSON, or if a known kind carries
    /// a payload of the wrong shape. Unknown kinds are never an error.
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        let envelope: Envelope = serde_json::from_str(text)?;
        let Envelope { kind, payload } = envelope;

        let frame = match kind.as_str() {
            "history" => Frame::History(parse_payload(&kind, payload)?),
            "chat_response" => Frame::ChatResponse(parse_payload(&kind, payload)?),
            "system" => Frame::System(parse_payload(&kind, payload)?),
            "monitor_update" => Frame::MonitorUpdate(parse_payload(&kind, payload)?),
            "visual_log" => Frame::VisualLog(parse_payload(&kind, payload)?),
            "thought_log" => Frame::ThoughtLog(parse_payload(&kind, payload)?),
            "vision_frame" => {
                let image: ImagePayload = parse_payload(&kind, payload)?;
                Frame::VisionFrame(VisionImage::from_base64(&image.image)?)
            }
            "vision_crop" => {
                let image: ImagePayload = parse_payload(&kind, payload)?;
                Frame::VisionCrop(VisionImage::from_base64(&image.image)?)
            }
            "mouse_move" => Frame::MouseMove(parse_payload(&kind, payload)?),
            "nucleus_update" => Frame::NucleusUpdate(parse_payload(&kind, payload)?),
            "thought_stream" => Frame::ThoughtStream(parse_payload(&kind, payload)?),
            "hitl_consultation" => Frame::HitlConsultation(parse_payload(&kind, payload)?),
            _ => Frame::Unknown(kind),
        };

        Ok(frame)
    }

    /// Wire name of this frame's kind.
    pub fn kind(&self) -> &str {
        match self {
            Frame::History(_) => "history",
            Frame::ChatResponse(_) => "chat_response",
            Frame::System(_) => "system",
            Frame::MonitorUpdate(_) => "monitor_update",
            Frame::VisualLog(_) => "visual_log",
            Frame::ThoughtLog(_) => "thought_log",
            Frame::VisionFrame(_) => "vision_frame",
            Frame::VisionCrop(_) => "vision_crop",
            Frame::MouseMove(_) => "mouse_move",
            Frame::NucleusUpdate(_) => "nucleus_update",
            Frame::ThoughtStream(_) => "thought_stream",
            Frame::HitlConsultation(_) => "hitl_consultation",
            Frame::Unknown(kind) => kind,
        }
    }
}

fn parse_payload<T: DeserializeOwned>(kind: &str, payload: Value) -> Result<T, ProtocolError> {
    serde_json::from_value(payload).map_err(|source| ProtocolError::InvalidPayload {
        kind: kind.to_string(),
        source,
    })
}

/// Slash commands understood by the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ModeVision,
    ModeChat,
    StartAutonomy(u32),
    StopAutonomy,
    ToggleGamer,
}

impl Command {
    pub fn to_text(self) -> String {
        match self {
            Command::ModeVision => "/mode vision".to_string(),
            Command::ModeChat => "/mode chat".to_string(),
            Command::StartAutonomy(secs) => format!("/actua {}", secs),
            Command::StopAutonomy => "/actua stop".to_string(),
            Command::ToggleGamer => "/gamer".to_string(),
        }
    }
}

/// Structured control messages.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ControlMessage {
    SetPower { level: f64 },
}

/// A message bound for the agent.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    /// Sent verbatim as a bare text message.
    Text(String),
    Control(ControlMessage),
}

impl Outbound {
    pub fn chat(text: impl Into<String>) -> Self {
        Outbound::Text(text.into())
    }

    /// Build a `set_power` control message.
    ///
    /// # Errors
    /// Returns [`ProtocolError::PowerLevelOutOfRange`] for levels outside 0.0-10.0.
    pub fn set_power(level: f64) -> Result<Self, ProtocolError> {
        if !level.is_finite() || !(POWER_LEVEL_MIN..=POWER_LEVEL_MAX).contains(&level) {
            return Err(ProtocolError::PowerLevelOutOfRange(level));
        }
        Ok(Outbound::Control(ControlMessage::SetPower { level }))
    }

    /// Text representation put on the wire.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        match self {
            Outbound::Text(text) => Ok(text.clone()),
            Outbound::Control(control) => Ok(serde_json::to_string(control)?),
        }
    }

    /// Short human-readable description used in transcripts and logs.
    pub fn describe(&self) -> String {
        match self {
            Outbound::Text(text) => text.clone(),
            Outbound::Control(ControlMessage::SetPower { level }) => {
                format!("set_power {:.1}", level)
            }
        }
    }
}

impl From<Command> for Outbound {
    fn from(command: Command) -> Self {
        Outbound::Text(command.to_text())
    }
}
