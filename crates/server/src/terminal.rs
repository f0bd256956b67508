//! Direct terminal-window endpoints used by the UI.

use std::sync::Arc;

use axum::{extract::State, Json};
use hookcat_protocol::{
    TerminalActionResponse, TerminalStateResponse, TopmostRequest, WindowState,
};
use tracing::debug;

use crate::state::AppState;
use crate::window_control::WindowControl;

const NO_PID: &str = "No PID available";

fn current_pid(state: &AppState) -> u32 {
    state.status().pid
}

/// Run a window-control call on the blocking pool.
async fn with_windows<R, F>(state: &AppState, fallback: R, f: F) -> R
where
    R: Send + 'static,
    F: FnOnce(&dyn WindowControl) -> R + Send + 'static,
{
    let windows = Arc::clone(state.windows());
    tokio::task::spawn_blocking(move || f(windows.as_ref()))
        .await
        .unwrap_or(fallback)
}

/// `POST /terminal/activate`
pub async fn activate_handler(State(state): State<Arc<AppState>>) -> Json<TerminalActionResponse> {
    let pid = current_pid(&state);
    if pid == 0 {
        return Json(TerminalActionResponse {
            success: false,
            error: Some(NO_PID.to_string()),
        });
    }

    let success = with_windows(&state, false, move |w| w.activate(pid)).await;
    debug!(component = "terminal", pid, success, "Activate terminal");
    Json(TerminalActionResponse {
        success,
        error: None,
    })
}

/// `POST /terminal/topmost`
pub async fn topmost_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TopmostRequest>,
) -> Json<TerminalActionResponse> {
    let pid = current_pid(&state);
    if pid == 0 {
        return Json(TerminalActionResponse {
            success: false,
            error: Some(NO_PID.to_string()),
        });
    }

    let topmost = req.topmost;
    let success = with_windows(&state, false, move |w| w.set_topmost(pid, topmost)).await;
    debug!(component = "terminal", pid, topmost, success, "Set terminal topmost");
    Json(TerminalActionResponse {
        success,
        error: None,
    })
}

/// `GET /terminal/state`
pub async fn state_handler(State(state): State<Arc<AppState>>) -> Json<TerminalStateResponse> {
    let pid = current_pid(&state);
    let window = if pid == 0 {
        WindowState::NotFound
    } else {
        with_windows(&state, WindowState::NotFound, move |w| w.query_state(pid)).await
    };
    Json(TerminalStateResponse { pid, state: window })
}
