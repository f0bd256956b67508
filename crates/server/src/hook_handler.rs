//! HTTP hook handler.
//!
//! Hook scripts POST every lifecycle event to `/hook`. Fire-and-forget
//! events are answered at once; blocking events park on the rendezvous
//! until the UI posts to `/decision` or the event's timeout expires.
//!
//! Each hook is routed inside its own spawned task, so a hook script that
//! hangs up mid-wait cannot leave the session stuck in Confirming: the task
//! still runs to its timeout and settles the session.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{extract::State, Json};
use hookcat_protocol::{Decision, DecisionAck, HookEvent, UiNotification, DENY_CHOICE};
use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::rendezvous::{Delivery, Parked};
use crate::state::AppState;
use crate::transition::{transition, Disposition};

/// HTTP POST handler for `/hook`.
pub async fn hook_handler(
    State(state): State<Arc<AppState>>,
    Json(event): Json<HookEvent>,
) -> Result<Json<Decision>, ApiError> {
    if event.is_blocking() && event.timeout_seconds == 0 {
        return Err(ApiError::BadRequest(
            "timeout_seconds must be positive for blocking events".to_string(),
        ));
    }

    let decision = tokio::spawn(async move { route_hook(&state, event).await })
        .await
        .map_err(|e| ApiError::Internal(format!("hook task failed: {e}")))?;
    Ok(Json(decision))
}

/// HTTP POST handler for `/decision`.
pub async fn decision_handler(
    State(state): State<Arc<AppState>>,
    Json(decision): Json<Decision>,
) -> Json<DecisionAck> {
    let delivered = deliver_decision(&state, decision).await;
    Json(DecisionAck {
        success: true,
        delivered,
    })
}

enum Step {
    Reply(Decision),
    Wait(Parked),
}

/// Route one hook event and produce the answer for the hook script.
pub async fn route_hook(state: &AppState, event: HookEvent) -> Decision {
    let step = state
        .with_session(|session| {
            let t = transition(session, &event);
            if t.from != t.to {
                info!(
                    component = "hook",
                    event = "hook.phase_changed",
                    kind = %event.kind,
                    action = %event.action,
                    pid = event.subject_pid,
                    from = %t.from,
                    to = %t.to,
                    "Session phase changed"
                );
            }
            if let Some(shortcut) = t.shortcut {
                debug!(
                    component = "hook",
                    kind = %event.kind,
                    shortcut = ?shortcut,
                    "Hook answered without UI"
                );
            }

            match t.disposition {
                Disposition::Answer(decision) => Step::Reply(decision),
                Disposition::Notify => {
                    state.notify_ui(UiNotification::Hook {
                        event: event.clone(),
                    });
                    Step::Reply(Decision::empty())
                }
                Disposition::Park => {
                    let notification = UiNotification::Hook {
                        event: event.clone(),
                    };
                    match state.presenter().present(notification) {
                        Ok(()) => Step::Wait(session.rendezvous.arm()),
                        Err(e) => {
                            warn!(
                                component = "hook",
                                event = "hook.presenter_unreachable",
                                kind = %event.kind,
                                error = %e,
                                "UI unreachable, denying blocking request"
                            );
                            session.settle();
                            Step::Reply(Decision::deny())
                        }
                    }
                }
            }
        })
        .await;

    match step {
        Step::Reply(decision) => decision,
        Step::Wait(parked) => {
            let timeout = Duration::from_secs(event.timeout_seconds);
            info!(
                component = "hook",
                event = "hook.parked",
                kind = %event.kind,
                action = %event.action,
                timeout_secs = event.timeout_seconds,
                "Waiting for UI decision"
            );
            await_decision(state, parked, timeout).await
        }
    }
}

async fn await_decision(state: &AppState, mut parked: Parked, timeout: Duration) -> Decision {
    let started = Instant::now();

    if let Ok(Some(decision)) = tokio::time::timeout(timeout, parked.recv()).await {
        info!(
            component = "hook",
            event = "hook.decided",
            choice = ?decision.choice,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "UI decision received"
        );
        return decision;
    }

    state
        .with_session(|session| {
            if !session.rendezvous.disarm(parked.ticket()) {
                // deliver() took the slot first and already settled the session.
                return parked.try_take().unwrap_or_else(Decision::deny);
            }

            session.settle();
            if let Some(queued) = session.take_queued_notification() {
                info!(
                    component = "hook",
                    event = "hook.replay_queued",
                    kind = %queued.kind,
                    "Showing notification queued during confirmation"
                );
                session.active_display_payload = Some(queued.payload.clone());
                state.notify_ui(UiNotification::DisplayReplay { event: queued });
            }

            info!(
                component = "hook",
                event = "hook.timed_out",
                timeout_secs = timeout.as_secs(),
                "No UI decision before timeout, denying"
            );
            Decision::deny()
        })
        .await
}

/// Hand a UI decision to the parked request, if any.
///
/// Returns whether a parked request received it. A decision arriving after
/// the request timed out is dropped.
pub async fn deliver_decision(state: &AppState, mut decision: Decision) -> bool {
    if decision.choice.is_none() {
        decision.choice = Some(DENY_CHOICE.to_string());
    }

    state
        .with_session(|session| match session.rendezvous.deliver(decision) {
            Delivery::Accepted => {
                session.resolve_confirmation();
                true
            }
            Delivery::WaiterGone => {
                warn!(
                    component = "hook",
                    event = "hook.waiter_gone",
                    "Parked request vanished before the decision arrived"
                );
                session.resolve_confirmation();
                false
            }
            Delivery::Idle => {
                debug!(
                    component = "hook",
                    event = "hook.decision_dropped",
                    "Decision arrived with no parked request"
                );
                false
            }
        })
        .await
}
