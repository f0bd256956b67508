//! Slacking/Spying mode controller.
//!
//! Flipping the mode is a cheap state change answered immediately. The side
//! effects (UI notification, window action, optional mode command) run on a
//! background task and never hold the session lock.

use std::sync::Arc;

use axum::{extract::State, Json};
use hookcat_protocol::{
    Mode, ModeCommandsRequest, ModeCommandsResponse, ToggleResponse, UiNotification,
};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::mode_command::{self, MODE_COMMAND_TIMEOUT};
use crate::state::AppState;

/// HTTP POST handler for `/mode/toggle`.
pub async fn toggle_handler(State(state): State<Arc<AppState>>) -> Json<ToggleResponse> {
    let (response, _effects) = toggle(&state).await;
    Json(response)
}

/// HTTP POST handler for `/mode/commands`.
pub async fn commands_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ModeCommandsRequest>,
) -> Json<ModeCommandsResponse> {
    let (slacking_command, spying_command) = state
        .with_session(|session| {
            session.mode_commands.apply(req);
            (
                session.mode_commands.slacking.clone(),
                session.mode_commands.spying.clone(),
            )
        })
        .await;

    info!(
        component = "mode",
        event = "mode.commands_updated",
        slacking = slacking_command.is_some(),
        spying = spying_command.is_some(),
        "Mode commands updated"
    );

    Json(ModeCommandsResponse {
        success: true,
        slacking_command,
        spying_command,
    })
}

/// Flip the mode and schedule its side effects.
///
/// Returns the new mode and pid together with the handle of the side-effect
/// task, which callers are free to drop.
pub async fn toggle(state: &Arc<AppState>) -> (ToggleResponse, JoinHandle<()>) {
    let (mode, pid, command) = state
        .with_session(|session| {
            session.mode = session.mode.flipped();
            let command = session.mode_commands.for_mode(session.mode).map(str::to_string);
            (session.mode, session.current_pid, command)
        })
        .await;

    info!(
        component = "mode",
        event = "mode.toggled",
        mode = %mode,
        pid,
        "Mode toggled"
    );

    let effects = tokio::spawn(run_side_effects(Arc::clone(state), mode, pid, command));
    (ToggleResponse { mode, pid }, effects)
}

async fn run_side_effects(state: Arc<AppState>, mode: Mode, pid: u32, command: Option<String>) {
    state.notify_ui(UiNotification::ModeChanged { mode });

    if pid == 0 {
        return;
    }

    let windows = Arc::clone(state.windows());
    let window_ok = tokio::task::spawn_blocking(move || match mode {
        Mode::Slacking => windows.activate(pid),
        Mode::Spying => windows.minimize(pid),
    })
    .await
    .unwrap_or(false);
    if !window_ok {
        warn!(
            component = "mode",
            event = "mode.window_action_failed",
            mode = %mode,
            pid,
            "Window action for mode change did not succeed"
        );
    }

    if let Some(command) = command {
        let result = mode_command::run(&command, mode, pid, MODE_COMMAND_TIMEOUT).await;
        if result.success() {
            info!(
                component = "mode",
                event = "mode.command_finished",
                mode = %mode,
                duration_ms = result.duration_ms,
                stdout = %result.stdout.trim(),
                "Mode command finished"
            );
        } else {
            warn!(
                component = "mode",
                event = "mode.command_failed",
                mode = %mode,
                exit_code = ?result.exit_code,
                duration_ms = result.duration_ms,
                stderr = %result.stderr.trim(),
                "Mode command failed"
            );
        }
    }
}
