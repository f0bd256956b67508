//! Core types shared across the protocol

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Reserved decision value: handled locally, nothing is forwarded to the hook.
pub const IGNORE_CHOICE: &str = "IGNORE";

/// Decision value returned when a blocking request is refused or abandoned.
pub const DENY_CHOICE: &str = "deny";

/// Operating disposition of the coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// The human is at the terminal; blocking requests are answered there.
    Slacking,
    /// The human watches the companion UI; blocking requests wait for it.
    Spying,
}

impl Mode {
    pub fn flipped(self) -> Mode {
        match self {
            Mode::Slacking => Mode::Spying,
            Mode::Spying => Mode::Slacking,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Slacking => "slacking",
            Mode::Spying => "spying",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "slacking" => Ok(Mode::Slacking),
            "spying" => Ok(Mode::Spying),
            _ => Err(format!("unknown mode: {s}")),
        }
    }
}

/// Coarse activity state of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Resting,
    Working,
    Confirming,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Resting => "resting",
            Phase::Working => "working",
            Phase::Confirming => "confirming",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "resting" => Ok(Phase::Resting),
            "working" => Ok(Phase::Working),
            "confirming" => Ok(Phase::Confirming),
            _ => Err(format!("unknown phase: {s}")),
        }
    }
}

/// How the hook script expects the request to be answered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    Blocking,
    #[default]
    FireAndForget,
}

/// Hook type tag.
///
/// Known kinds drive the state machine; anything else is carried verbatim so
/// newer hook scripts keep working against an older coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum HookKind {
    PromptSubmitted,
    PreTool,
    PostTool,
    SessionStopped,
    PermissionRequest,
    NotificationNeed,
    SetState,
    Ignore,
    Pulse,
    Other(String),
}

impl HookKind {
    pub fn as_str(&self) -> &str {
        match self {
            HookKind::PromptSubmitted => "prompt_submitted",
            HookKind::PreTool => "pre_tool",
            HookKind::PostTool => "post_tool",
            HookKind::SessionStopped => "session_stopped",
            HookKind::PermissionRequest => "permission_request",
            HookKind::NotificationNeed => "notification_need",
            HookKind::SetState => "set_state",
            HookKind::Ignore => "ignore",
            HookKind::Pulse => "pulse",
            HookKind::Other(s) => s,
        }
    }

    /// Marker kinds never touch the phase or the display payload.
    pub fn is_marker(&self) -> bool {
        matches!(self, HookKind::Ignore | HookKind::Pulse)
    }
}

impl From<String> for HookKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "prompt_submitted" | "user_prompt_submit" => HookKind::PromptSubmitted,
            "pre_tool" | "pre_tool_use" => HookKind::PreTool,
            "post_tool" | "post_tool_use" => HookKind::PostTool,
            "session_stopped" | "stop" => HookKind::SessionStopped,
            "permission_request" => HookKind::PermissionRequest,
            "notification_need" | "notification_needed" => HookKind::NotificationNeed,
            "set_state" => HookKind::SetState,
            "ignore" => HookKind::Ignore,
            "pulse" => HookKind::Pulse,
            _ => HookKind::Other(s),
        }
    }
}

impl From<&str> for HookKind {
    fn from(s: &str) -> Self {
        HookKind::from(s.to_string())
    }
}

impl From<HookKind> for String {
    fn from(kind: HookKind) -> Self {
        match kind {
            HookKind::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The human response to a blocking event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    #[serde(default)]
    pub choice: Option<String>,
    #[serde(default, alias = "user_input")]
    pub freeform_input: Option<String>,
}

impl Decision {
    /// Answer for fire-and-forget events and swallowed duplicates.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Local no-op: the hook script forwards nothing.
    pub fn ignore() -> Self {
        Self {
            choice: Some(IGNORE_CHOICE.to_string()),
            freeform_input: Some(IGNORE_CHOICE.to_string()),
        }
    }

    pub fn deny() -> Self {
        Self {
            choice: Some(DENY_CHOICE.to_string()),
            freeform_input: None,
        }
    }

    pub fn is_ignore(&self) -> bool {
        self.choice.as_deref() == Some(IGNORE_CHOICE)
    }
}

/// Window state reported by the window-control adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowState {
    Minimized,
    Maximized,
    Normal,
    NotFound,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hook_kind_accepts_hook_script_spellings() {
        assert_eq!(HookKind::from("pre_tool_use"), HookKind::PreTool);
        assert_eq!(HookKind::from("notification_need"), HookKind::NotificationNeed);
        assert_eq!(
            HookKind::from("subagent_stop"),
            HookKind::Other("subagent_stop".to_string())
        );
    }

    #[test]
    fn unknown_kind_serializes_verbatim() {
        let json = serde_json::to_string(&HookKind::from("subagent_stop")).unwrap();
        assert_eq!(json, "\"subagent_stop\"");
        let json = serde_json::to_string(&HookKind::PreTool).unwrap();
        assert_eq!(json, "\"pre_tool\"");
    }

    #[test]
    fn decision_accepts_user_input_alias() {
        let d: Decision =
            serde_json::from_str(r#"{"choice":"allow","user_input":"go ahead"}"#).unwrap();
        assert_eq!(d.choice.as_deref(), Some("allow"));
        assert_eq!(d.freeform_input.as_deref(), Some("go ahead"));
    }

    #[test]
    fn decision_serializes_nulls() {
        let json = serde_json::to_value(Decision::empty()).unwrap();
        assert_eq!(json, serde_json::json!({"choice": null, "freeform_input": null}));
    }

    #[test]
    fn mode_flips_and_parses() {
        assert_eq!(Mode::Slacking.flipped(), Mode::Spying);
        assert_eq!("SPYING".parse::<Mode>().unwrap(), Mode::Spying);
        assert!("idle".parse::<Mode>().is_err());
    }
}
