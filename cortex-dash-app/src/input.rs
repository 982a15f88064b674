//! Terminal input lines: chat text or `:`-prefixed local actions.

#[derive(Debug, Clone, PartialEq)]
pub enum UserInput {
    Chat(String),
    ToggleVision,
    ToggleAutonomy,
    ToggleGamer,
    EmergencyStop,
    DismissOverlay,
    SetPower(f64),
    Status,
    Help,
    Quit,
    Invalid(String),
}

pub const HELP: &str = "\
Type a message and press Enter to chat with Cortex.
Local actions:
  :vision        toggle vision mode
  :auto          toggle autonomy (60s)
  :gamer         toggle gamer mode
  :stop          emergency stop
  :close         dismiss the countdown overlay
  :power <0-10>  set the power level
  :status        show connection, mode and gauges
  :help          show this help
  :quit          exit";

/// Parse one input line. Blank lines yield `None`.
pub fn parse_input(line: &str) -> Option<UserInput> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let Some(action) = line.strip_prefix(':') else {
        return Some(UserInput::Chat(line.to_string()));
    };

    let mut parts = action.split_whitespace();
    let name = parts.next().unwrap_or_default().to_lowercase();
    let argument = parts.next();

    let parsed = match name.as_str() {
        "vision" => UserInput::ToggleVision,
        "auto" => UserInput::ToggleAutonomy,
        "gamer" => UserInput::ToggleGamer,
        "stop" => UserInput::EmergencyStop,
        "close" => UserInput::DismissOverlay,
        "power" => match argument.map(str::parse::<f64>) {
            Some(Ok(level)) => UserInput::SetPower(level),
            _ => UserInput::Invalid("Usage: :power <0-10>".to_string()),
        },
        "status" => UserInput::Status,
        "help" | "h" | "?" => UserInput::Help,
        "quit" | "exit" | "q" => UserInput::Quit,
        other => UserInput::Invalid(format!("Unknown action ':{}'. Type :help", other)),
    };
    Some(parsed)
}
