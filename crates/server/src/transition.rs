//! Pure state transition function
//!
//! All phase rules for inbound hooks live here as a synchronous function:
//! `transition(session, event) -> Transition`. No IO, no async, no locking.
//! The caller holds the session lock and carries out the disposition
//! (notify the UI, park on the rendezvous, answer immediately).

use hookcat_protocol::{Decision, HookEvent, HookKind, Mode, Phase};

use crate::session::SessionState;

// ---------------------------------------------------------------------------
// Disposition: what the router must do next
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Disposition {
    /// Reply right away, without notifying the UI
    Answer(Decision),
    /// Notify the UI, reply with an empty decision
    Notify,
    /// Notify the UI and wait for the human
    Park,
}

/// Why an event was answered without reaching the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    /// Visual update swallowed while a confirmation is outstanding
    Suppressed,
    /// Notification kept for replay after the confirmation times out
    Queued,
    /// Second blocking request while one is already outstanding
    DuplicateDenied,
    /// Blocking request answered locally because the human is at the terminal
    Slacking,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub from: Phase,
    pub to: Phase,
    pub shortcut: Option<Shortcut>,
    pub disposition: Disposition,
}

// ---------------------------------------------------------------------------
// transition(): the pure core
// ---------------------------------------------------------------------------

/// Apply one inbound event to the session.
///
/// Rule order:
/// 1. while Confirming, fire-and-forget events are swallowed
///    (`notification_need` is queued) and blocking events are denied;
/// 2. a positive pid becomes the current pid;
/// 3. phase rules: blocking → Confirming, `set_state` → requested phase,
///    `notification_need` → Resting, markers → unchanged, anything else →
///    Working;
/// 4. in Slacking mode a blocking event is answered with IGNORE and the
///    session settles back to Resting.
pub fn transition(session: &mut SessionState, event: &HookEvent) -> Transition {
    let from = session.phase();

    if from == Phase::Confirming {
        let (shortcut, decision) = if event.is_blocking() {
            (Shortcut::DuplicateDenied, Decision::deny())
        } else if event.kind == HookKind::NotificationNeed {
            session.queue_notification(event.clone());
            (Shortcut::Queued, Decision::empty())
        } else {
            (Shortcut::Suppressed, Decision::empty())
        };
        return Transition {
            from,
            to: from,
            shortcut: Some(shortcut),
            disposition: Disposition::Answer(decision),
        };
    }

    session.observe_pid(event.pid());

    apply_phase_rules(session, event);

    if event.is_blocking() && session.mode == Mode::Slacking {
        session.settle();
        return Transition {
            from,
            to: session.phase(),
            shortcut: Some(Shortcut::Slacking),
            disposition: Disposition::Answer(Decision::ignore()),
        };
    }

    let disposition = if event.is_blocking() {
        Disposition::Park
    } else {
        Disposition::Notify
    };

    Transition {
        from,
        to: session.phase(),
        shortcut: None,
        disposition,
    }
}

fn apply_phase_rules(session: &mut SessionState, event: &HookEvent) {
    // A parked request needs Confirming, so blocking delivery outranks
    // an explicit set_state.
    if event.is_blocking() {
        session.begin_confirmation(event);
        return;
    }

    match event.requested_phase() {
        Some(Phase::Working) => {
            session.set_phase(Phase::Working);
            session.active_display_payload = Some(event.payload.clone());
            return;
        }
        Some(Phase::Resting) => {
            session.set_phase(Phase::Resting);
            return;
        }
        // Confirming without a waiter is not a recognized request.
        Some(Phase::Confirming) | None => {}
    }

    if event.kind == HookKind::NotificationNeed {
        session.set_phase(Phase::Resting);
        session.active_display_payload = Some(event.payload.clone());
    } else if !event.kind.is_marker() {
        session.set_phase(Phase::Working);
        session.active_display_payload = Some(event.payload.clone());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendezvous::{Delivery, Parked};
    use crate::session::ModeCommands;
    use hookcat_protocol::DeliveryMode;
    use proptest::prelude::*;
    use serde_json::{json, Map, Value};

    fn payload(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn spying() -> SessionState {
        SessionState::new(Mode::Spying, ModeCommands::default())
    }

    fn fire(kind: &str) -> HookEvent {
        HookEvent::new(HookKind::from(kind), DeliveryMode::FireAndForget)
    }

    fn blocking(action: &str) -> HookEvent {
        HookEvent::new(HookKind::PermissionRequest, DeliveryMode::Blocking).with_action(action)
    }

    #[test]
    fn pre_tool_enters_working_and_stores_payload() {
        let mut session = spying();
        let event = fire("pre_tool")
            .with_pid(42)
            .with_payload(payload(json!({"tool": "Read"})));

        let t = transition(&mut session, &event);

        assert_eq!(t.disposition, Disposition::Notify);
        assert_eq!(t.to, Phase::Working);
        assert_eq!(session.current_pid, 42);
        assert_eq!(session.active_display_payload.unwrap()["tool"], "Read");
    }

    #[test]
    fn blocking_enters_confirming_and_parks() {
        let mut session = spying();
        let t = transition(&mut session, &blocking("ask_permission"));

        assert_eq!(t.disposition, Disposition::Park);
        assert_eq!(t.to, Phase::Confirming);
        let pending = session.pending_confirmation().unwrap();
        assert_eq!(pending.kind, HookKind::PermissionRequest);
        assert_eq!(pending.action, "ask_permission");
    }

    #[test]
    fn slacking_answers_blocking_with_ignore() {
        let mut session = SessionState::new(Mode::Slacking, ModeCommands::default());
        let t = transition(&mut session, &blocking("ask_permission").with_pid(9));

        assert_eq!(t.disposition, Disposition::Answer(Decision::ignore()));
        assert_eq!(t.shortcut, Some(Shortcut::Slacking));
        assert_eq!(session.phase(), Phase::Resting);
        assert!(session.pending_confirmation().is_none());
        assert_eq!(session.current_pid, 9);
    }

    #[test]
    fn slacking_still_notifies_visual_updates() {
        let mut session = SessionState::new(Mode::Slacking, ModeCommands::default());
        let t = transition(&mut session, &fire("post_tool"));
        assert_eq!(t.disposition, Disposition::Notify);
        assert_eq!(session.phase(), Phase::Working);
    }

    #[test]
    fn second_blocking_event_is_denied_without_touching_pending() {
        let mut session = spying();
        transition(&mut session, &blocking("ask_permission").with_pid(1));

        let second = HookEvent::new(HookKind::from("ask_user"), DeliveryMode::Blocking)
            .with_action("ask_user")
            .with_pid(2);
        let t = transition(&mut session, &second);

        assert_eq!(t.disposition, Disposition::Answer(Decision::deny()));
        assert_eq!(t.shortcut, Some(Shortcut::DuplicateDenied));
        let pending = session.pending_confirmation().unwrap();
        assert_eq!(pending.action, "ask_permission");
        assert_eq!(session.current_pid, 1);
    }

    #[test]
    fn notification_need_is_queued_while_confirming() {
        let mut session = spying();
        transition(&mut session, &blocking("ask_permission"));

        let note = fire("notification_need").with_payload(payload(json!({"caption": "hi"})));
        let t = transition(&mut session, &note);

        assert_eq!(t.shortcut, Some(Shortcut::Queued));
        assert_eq!(session.phase(), Phase::Confirming);
        assert_eq!(session.queued_notification(), Some(&note));
    }

    #[test]
    fn other_fire_and_forget_is_suppressed_while_confirming() {
        let mut session = spying();
        transition(&mut session, &blocking("ask_permission"));
        let t = transition(&mut session, &fire("pre_tool").with_pid(77));

        assert_eq!(t.shortcut, Some(Shortcut::Suppressed));
        assert_eq!(t.disposition, Disposition::Answer(Decision::empty()));
        assert!(session.queued_notification().is_none());
        assert_ne!(session.current_pid, 77);
    }

    #[test]
    fn notification_need_rests_with_payload() {
        let mut session = spying();
        session.set_phase(Phase::Working);
        transition(
            &mut session,
            &fire("notification_need").with_payload(payload(json!({"caption": "Done"}))),
        );
        assert_eq!(session.phase(), Phase::Resting);
        assert_eq!(session.active_display_payload.unwrap()["caption"], "Done");
    }

    #[test]
    fn markers_leave_phase_and_payload_alone() {
        let mut session = spying();
        transition(
            &mut session,
            &fire("pre_tool").with_payload(payload(json!({"tool": "Edit"}))),
        );
        transition(&mut session, &fire("pulse"));
        transition(&mut session, &fire("ignore"));

        assert_eq!(session.phase(), Phase::Working);
        assert_eq!(session.active_display_payload.unwrap()["tool"], "Edit");
    }

    #[test]
    fn set_state_wins_over_inferred_phase() {
        let mut session = spying();
        session.set_phase(Phase::Working);
        let event = fire("set_state").with_payload(payload(json!({"state": "resting"})));
        transition(&mut session, &event);
        assert_eq!(session.phase(), Phase::Resting);
        // Entering Resting via set_state keeps the previous display payload.
        assert!(session.active_display_payload.is_none());

        let event = fire("set_state")
            .with_payload(payload(json!({"state": "working", "caption": "Thinking..."})));
        transition(&mut session, &event);
        assert_eq!(session.phase(), Phase::Working);
        assert_eq!(
            session.active_display_payload.unwrap()["caption"],
            "Thinking..."
        );
    }

    #[test]
    fn set_state_confirming_without_blocking_is_not_recognized() {
        let mut session = spying();
        let event = fire("set_state").with_payload(payload(json!({"state": "confirming"})));
        let t = transition(&mut session, &event);

        // Falls through to the generic rule.
        assert_eq!(t.to, Phase::Working);
        assert!(session.pending_confirmation().is_none());
    }

    #[test]
    fn blocking_outranks_set_state() {
        let mut session = spying();
        let event = HookEvent::new(HookKind::SetState, DeliveryMode::Blocking)
            .with_payload(payload(json!({"state": "working"})));
        let t = transition(&mut session, &event);
        assert_eq!(t.to, Phase::Confirming);
        assert_eq!(t.disposition, Disposition::Park);
    }

    // -- Property: pending confirmation ⇔ Confirming ---------------------------

    #[derive(Debug, Clone)]
    enum Op {
        Event {
            kind: &'static str,
            blocking: bool,
            pid: i64,
        },
        Deliver,
        Expire,
        Toggle,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        let kinds = prop::sample::select(vec![
            "prompt_submitted",
            "pre_tool",
            "post_tool",
            "session_stopped",
            "permission_request",
            "notification_need",
            "set_state",
            "ignore",
            "pulse",
            "subagent_stop",
        ]);
        prop_oneof![
            6 => (kinds, any::<bool>(), -2i64..5).prop_map(|(kind, blocking, pid)| Op::Event { kind, blocking, pid }),
            2 => Just(Op::Deliver),
            2 => Just(Op::Expire),
            1 => Just(Op::Toggle),
        ]
    }

    fn state_for(kind: &str, pid: i64) -> Map<String, Value> {
        let state = ["resting", "working", "confirming", "bogus"][pid.rem_euclid(4) as usize];
        payload(json!({"state": state, "kind": kind}))
    }

    proptest! {
        #[test]
        fn pending_confirmation_iff_confirming(ops in prop::collection::vec(op_strategy(), 1..60)) {
            let mut session = spying();
            let mut parked: Option<Parked> = None;

            for op in ops {
                match op {
                    Op::Event { kind, blocking, pid } => {
                        let mode = if blocking { DeliveryMode::Blocking } else { DeliveryMode::FireAndForget };
                        let event = HookEvent::new(HookKind::from(kind), mode)
                            .with_pid(pid)
                            .with_payload(state_for(kind, pid));
                        let armed_before = session.rendezvous.is_armed();
                        let t = transition(&mut session, &event);
                        if t.disposition == Disposition::Park {
                            prop_assert!(!armed_before, "second rendezvous created");
                            parked = Some(session.rendezvous.arm());
                        }
                    }
                    Op::Deliver => {
                        if session.rendezvous.deliver(Decision::deny()) != Delivery::Idle {
                            session.resolve_confirmation();
                            parked = None;
                        }
                    }
                    Op::Expire => {
                        if let Some(p) = parked.take() {
                            if session.rendezvous.disarm(p.ticket()) {
                                session.settle();
                                if let Some(queued) = session.take_queued_notification() {
                                    session.active_display_payload = Some(queued.payload);
                                }
                            }
                        }
                    }
                    Op::Toggle => session.mode = session.mode.flipped(),
                }

                let confirming = session.phase() == Phase::Confirming;
                prop_assert_eq!(session.pending_confirmation().is_some(), confirming);
                prop_assert_eq!(session.rendezvous.is_armed(), confirming);
                if !confirming {
                    prop_assert!(session.queued_notification().is_none());
                }
            }
        }
    }
}
