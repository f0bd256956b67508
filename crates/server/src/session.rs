//! Session state
//!
//! The single session record shared by the hook router, the mode controller
//! and the HTTP handlers. Lives inside `AppState` behind one mutex.

use hookcat_protocol::{
    HookEvent, HookKind, Mode, ModeCommandsRequest, Phase, StatusResponse,
};
use serde_json::{Map, Value};

use crate::rendezvous::RendezvousSlot;

/// A blocking request that is waiting for the human
#[derive(Debug, Clone, PartialEq)]
pub struct PendingConfirmation {
    pub event: HookEvent,
    pub kind: HookKind,
    pub action: String,
}

/// Internal phase. The pending confirmation lives inside `Confirming`, so a
/// confirmation can never exist outside that phase.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionPhase {
    Resting,
    Working,
    Confirming(PendingConfirmation),
}

impl SessionPhase {
    pub fn to_phase(&self) -> Phase {
        match self {
            SessionPhase::Resting => Phase::Resting,
            SessionPhase::Working => Phase::Working,
            SessionPhase::Confirming(_) => Phase::Confirming,
        }
    }
}

/// External commands run when the mode flips
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModeCommands {
    pub slacking: Option<String>,
    pub spying: Option<String>,
}

impl ModeCommands {
    pub fn for_mode(&self, mode: Mode) -> Option<&str> {
        match mode {
            Mode::Slacking => self.slacking.as_deref(),
            Mode::Spying => self.spying.as_deref(),
        }
    }

    /// Absent fields keep their value; an empty string clears the command.
    pub fn apply(&mut self, req: ModeCommandsRequest) {
        if let Some(cmd) = req.slacking_command {
            self.slacking = non_empty(cmd);
        }
        if let Some(cmd) = req.spying_command {
            self.spying = non_empty(cmd);
        }
    }
}

fn non_empty(cmd: String) -> Option<String> {
    if cmd.trim().is_empty() {
        None
    } else {
        Some(cmd)
    }
}

pub struct SessionState {
    pub mode: Mode,
    /// Last positive subject pid seen; 0 until one arrives
    pub current_pid: u32,
    phase: SessionPhase,
    pub active_display_payload: Option<Map<String, Value>>,
    queued_notification: Option<HookEvent>,
    pub mode_commands: ModeCommands,
    pub rendezvous: RendezvousSlot,
}

impl SessionState {
    pub fn new(mode: Mode, mode_commands: ModeCommands) -> Self {
        Self {
            mode,
            current_pid: 0,
            phase: SessionPhase::Resting,
            active_display_payload: None,
            queued_notification: None,
            mode_commands,
            rendezvous: RendezvousSlot::default(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase.to_phase()
    }

    pub fn pending_confirmation(&self) -> Option<&PendingConfirmation> {
        match &self.phase {
            SessionPhase::Confirming(pending) => Some(pending),
            _ => None,
        }
    }

    pub fn queued_notification(&self) -> Option<&HookEvent> {
        self.queued_notification.as_ref()
    }

    /// Sticky pid tracking: only a positive pid overwrites the current one.
    pub fn observe_pid(&mut self, pid: Option<u32>) {
        if let Some(pid) = pid {
            self.current_pid = pid;
        }
    }

    pub fn begin_confirmation(&mut self, event: &HookEvent) {
        self.phase = SessionPhase::Confirming(PendingConfirmation {
            event: event.clone(),
            kind: event.kind.clone(),
            action: event.action.clone(),
        });
        self.active_display_payload = Some(event.payload.clone());
    }

    /// Move to Resting or Working. Confirming can only be entered through
    /// `begin_confirmation`; asking for it here is refused.
    pub fn set_phase(&mut self, phase: Phase) -> bool {
        self.phase = match phase {
            Phase::Resting => SessionPhase::Resting,
            Phase::Working => SessionPhase::Working,
            Phase::Confirming => return false,
        };
        true
    }

    /// Drop any pending confirmation and return to Resting.
    pub fn settle(&mut self) {
        self.phase = SessionPhase::Resting;
    }

    /// The human answered: settle and forget the suppressed notification.
    pub fn resolve_confirmation(&mut self) {
        self.settle();
        self.queued_notification = None;
    }

    pub fn queue_notification(&mut self, event: HookEvent) {
        self.queued_notification = Some(event);
    }

    pub fn take_queued_notification(&mut self) -> Option<HookEvent> {
        self.queued_notification.take()
    }

    pub fn status(&self) -> StatusResponse {
        let pending = self.pending_confirmation();
        StatusResponse {
            mode: self.mode,
            pid: self.current_pid,
            phase: self.phase(),
            message: status_message(self.phase()).to_string(),
            display_payload: self.active_display_payload.clone(),
            pending_kind: pending.map(|p| p.kind.to_string()),
            pending_action: pending.map(|p| p.action.clone()),
        }
    }
}

fn status_message(phase: Phase) -> &'static str {
    match phase {
        Phase::Confirming => "Waiting for confirmation...",
        Phase::Working => "Working...",
        Phase::Resting => "Standing by...",
    }
}
