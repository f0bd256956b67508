//! hookcat Protocol
//!
//! Shared types for communication between the hookcat coordinator, the hook
//! scripts that feed it and the companion UI. Everything is JSON over HTTP
//! (and WebSocket for UI notifications).

pub mod client;
pub mod server;
pub mod types;

pub use client::{
    HookEvent, ModeCommandsRequest, PhaseRequest, TopmostRequest, DEFAULT_BLOCKING_TIMEOUT_SECS,
};
pub use server::{
    DecisionAck, ModeCommandsResponse, PhaseResponse, StatusResponse, TerminalActionResponse,
    TerminalStateResponse, ToggleResponse, UiNotification,
};
pub use types::*;
