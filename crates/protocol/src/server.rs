//! Server → Client messages

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::client::HookEvent;
use crate::types::*;

/// Response of `GET /status`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub mode: Mode,
    pub pid: u32,
    pub phase: Phase,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_payload: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_action: Option<String>,
}

/// Response of `POST /mode/toggle`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleResponse {
    pub mode: Mode,
    pub pid: u32,
}

/// Response of `POST /decision`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionAck {
    pub success: bool,
    /// Whether a parked request actually received the decision
    pub delivered: bool,
}

/// Response of `POST /mode/commands`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeCommandsResponse {
    pub success: bool,
    pub slacking_command: Option<String>,
    pub spying_command: Option<String>,
}

/// Response of `POST /phase`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseResponse {
    pub success: bool,
    pub phase: Phase,
}

/// Response of the `/terminal/*` actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalActionResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response of `GET /terminal/state`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalStateResponse {
    pub pid: u32,
    pub state: WindowState,
}

/// Notifications pushed to the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UiNotification {
    /// A hook event the UI should render
    Hook { event: HookEvent },
    /// A notification suppressed during confirmation, shown after the timeout
    DisplayReplay { event: HookEvent },
    ModeChanged { mode: Mode },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_omits_pending_fields_when_absent() {
        let status = StatusResponse {
            mode: Mode::Spying,
            pid: 42,
            phase: Phase::Working,
            message: "Working...".to_string(),
            display_payload: None,
            pending_kind: None,
            pending_action: None,
        };
        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(
            value,
            json!({"mode": "spying", "pid": 42, "phase": "working", "message": "Working..."})
        );
    }

    #[test]
    fn notification_is_tagged() {
        let value = serde_json::to_value(UiNotification::ModeChanged { mode: Mode::Slacking })
            .unwrap();
        assert_eq!(value, json!({"type": "mode_changed", "mode": "slacking"}));
    }
}
