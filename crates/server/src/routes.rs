//! HTTP surface: route table plus the small read/admin handlers.

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use hookcat_protocol::{Phase, PhaseRequest, PhaseResponse, StatusResponse};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::assets::static_handler;
use crate::error::ApiError;
use crate::hook_handler::{decision_handler, hook_handler};
use crate::mode::{commands_handler, toggle_handler};
use crate::state::AppState;
use crate::terminal;
use crate::websocket::ws_handler;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/hook", post(hook_handler))
        .route("/decision", post(decision_handler))
        .route("/mode/toggle", post(toggle_handler))
        .route("/mode/commands", post(commands_handler))
        .route("/phase", post(phase_handler))
        .route("/status", get(status_handler))
        .route("/terminal/activate", post(terminal::activate_handler))
        .route("/terminal/topmost", post(terminal::topmost_handler))
        .route("/terminal/state", get(terminal::state_handler))
        .route("/ws", get(ws_handler))
        .route("/health", get(health_handler))
        .fallback(static_handler)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

async fn health_handler() -> impl IntoResponse {
    "OK"
}

async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(state.status().as_ref().clone())
}

/// Administrative phase override. Confirming is owned by the hook router,
/// so it can neither be requested nor interrupted here.
async fn phase_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PhaseRequest>,
) -> Result<Json<PhaseResponse>, ApiError> {
    let phase = Phase::from_str(&req.phase).map_err(ApiError::BadRequest)?;
    if phase == Phase::Confirming {
        return Err(ApiError::BadRequest(
            "confirming is entered by blocking hooks only".to_string(),
        ));
    }

    state
        .with_session(|session| {
            if session.phase() == Phase::Confirming {
                return Err(ApiError::Conflict(
                    "a confirmation is pending".to_string(),
                ));
            }
            let from = session.phase();
            session.set_phase(phase);
            info!(
                component = "session",
                event = "session.phase_set",
                from = %from,
                to = %phase,
                "Phase set by request"
            );
            Ok(Json(PhaseResponse {
                success: true,
                phase,
            }))
        })
        .await
}
