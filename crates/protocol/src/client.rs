//! Client → Server request bodies

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{DeliveryMode, HookKind, Phase};

/// Default wait for a blocking request, in seconds
pub const DEFAULT_BLOCKING_TIMEOUT_SECS: u64 = 90;

fn default_timeout() -> u64 {
    DEFAULT_BLOCKING_TIMEOUT_SECS
}

/// One inbound hook notification.
///
/// Immutable once decoded. `kind` falls back to `action` when the hook
/// script only sends the latter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "HookEventWire")]
pub struct HookEvent {
    pub kind: HookKind,
    pub delivery_mode: DeliveryMode,
    pub subject_pid: i64,
    pub action: String,
    pub payload: Map<String, Value>,
    pub timeout_seconds: u64,
}

/// Lenient decoding shape; accepts the field names older hook scripts use.
#[derive(Deserialize)]
struct HookEventWire {
    #[serde(default)]
    kind: Option<HookKind>,
    #[serde(default, alias = "mode")]
    delivery_mode: DeliveryMode,
    #[serde(default, alias = "pid")]
    subject_pid: i64,
    #[serde(default)]
    action: String,
    #[serde(default, alias = "data")]
    payload: Map<String, Value>,
    #[serde(default = "default_timeout", alias = "timeout")]
    timeout_seconds: u64,
}

impl From<HookEventWire> for HookEvent {
    fn from(wire: HookEventWire) -> Self {
        let kind = wire
            .kind
            .unwrap_or_else(|| HookKind::from(wire.action.as_str()));
        Self {
            kind,
            delivery_mode: wire.delivery_mode,
            subject_pid: wire.subject_pid,
            action: wire.action,
            payload: wire.payload,
            timeout_seconds: wire.timeout_seconds,
        }
    }
}

impl HookEvent {
    pub fn new(kind: HookKind, delivery_mode: DeliveryMode) -> Self {
        Self {
            action: kind.as_str().to_string(),
            kind,
            delivery_mode,
            subject_pid: 0,
            payload: Map::new(),
            timeout_seconds: DEFAULT_BLOCKING_TIMEOUT_SECS,
        }
    }

    pub fn with_pid(mut self, pid: i64) -> Self {
        self.subject_pid = pid;
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = action.into();
        self
    }

    pub fn with_payload(mut self, payload: Map<String, Value>) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_seconds = secs;
        self
    }

    pub fn is_blocking(&self) -> bool {
        self.delivery_mode == DeliveryMode::Blocking
    }

    /// Positive subject pid, if the hook script knew it
    pub fn pid(&self) -> Option<u32> {
        u32::try_from(self.subject_pid).ok().filter(|pid| *pid > 0)
    }

    /// Phase carried by an administrative `set_state` event
    pub fn requested_phase(&self) -> Option<Phase> {
        if self.kind != HookKind::SetState {
            return None;
        }
        self.payload
            .get("state")
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
    }
}

/// Body of `POST /mode/commands`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModeCommandsRequest {
    #[serde(default, alias = "spy_command")]
    pub slacking_command: Option<String>,
    #[serde(default, alias = "monitor_command")]
    pub spying_command: Option<String>,
}

/// Body of `POST /phase`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseRequest {
    #[serde(alias = "state")]
    pub phase: String,
}

/// Body of `POST /terminal/topmost`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopmostRequest {
    #[serde(default = "default_topmost")]
    pub topmost: bool,
}

fn default_topmost() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_hook_script_payload() {
        let event: HookEvent = serde_json::from_value(json!({
            "pid": 4242,
            "mode": "blocking",
            "action": "ask_permission",
            "kind": "permission_request",
            "data": {"tool": "Bash", "caption": "rm -rf build"},
            "timeout": 30
        }))
        .unwrap();

        assert_eq!(event.kind, HookKind::PermissionRequest);
        assert!(event.is_blocking());
        assert_eq!(event.pid(), Some(4242));
        assert_eq!(event.action, "ask_permission");
        assert_eq!(event.payload["tool"], "Bash");
        assert_eq!(event.timeout_seconds, 30);
    }

    #[test]
    fn kind_falls_back_to_action() {
        let event: HookEvent = serde_json::from_value(json!({
            "mode": "fire_and_forget",
            "action": "notification_need"
        }))
        .unwrap();
        assert_eq!(event.kind, HookKind::NotificationNeed);
        assert_eq!(event.timeout_seconds, DEFAULT_BLOCKING_TIMEOUT_SECS);
        assert_eq!(event.pid(), None);
    }

    #[test]
    fn set_state_exposes_requested_phase() {
        let event: HookEvent = serde_json::from_value(json!({
            "action": "set_state",
            "data": {"state": "working", "caption": "Thinking..."}
        }))
        .unwrap();
        assert_eq!(event.requested_phase(), Some(Phase::Working));

        let bogus: HookEvent = serde_json::from_value(json!({
            "action": "set_state",
            "data": {"state": "napping"}
        }))
        .unwrap();
        assert_eq!(bogus.requested_phase(), None);
    }

    #[test]
    fn non_object_payload_is_rejected() {
        let result: Result<HookEvent, _> =
            serde_json::from_value(json!({"action": "pre_tool", "data": "oops"}));
        assert!(result.is_err());
    }

    #[test]
    fn negative_pid_is_unknown() {
        let event = HookEvent::new(HookKind::PreTool, DeliveryMode::FireAndForget).with_pid(-7);
        assert_eq!(event.pid(), None);
    }

    #[test]
    fn mode_commands_accept_legacy_names() {
        let req: ModeCommandsRequest =
            serde_json::from_value(json!({"spy_command": "echo hi"})).unwrap();
        assert_eq!(req.slacking_command.as_deref(), Some("echo hi"));
        assert!(req.spying_command.is_none());
    }
}
