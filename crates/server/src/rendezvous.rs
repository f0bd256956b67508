//! One-slot rendezvous between a parked blocking hook and the decision that
//! later arrives from the UI.
//!
//! The slot lives inside `SessionState`, so arming, delivering and expiring
//! all happen under the session mutex. Whoever takes the waiter out of the
//! slot first wins: either `deliver` (the decision is sent before the lock is
//! released) or the timed-out waiter via `disarm`.

use hookcat_protocol::Decision;
use tokio::sync::oneshot;

struct Waiter {
    ticket: u64,
    tx: oneshot::Sender<Decision>,
}

#[derive(Default)]
pub struct RendezvousSlot {
    next_ticket: u64,
    waiter: Option<Waiter>,
}

/// Outcome of handing a decision to the slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// A parked request received the decision
    Accepted,
    /// A waiter was registered but its receiving end is gone
    WaiterGone,
    /// Nobody is parked; the decision is dropped
    Idle,
}

impl RendezvousSlot {
    /// Register a new waiter. Callers guarantee the slot is empty (the router
    /// never parks while a confirmation is outstanding).
    pub fn arm(&mut self) -> Parked {
        self.next_ticket += 1;
        let (tx, rx) = oneshot::channel();
        self.waiter = Some(Waiter {
            ticket: self.next_ticket,
            tx,
        });
        Parked {
            ticket: self.next_ticket,
            rx,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.waiter.is_some()
    }

    pub fn deliver(&mut self, decision: Decision) -> Delivery {
        match self.waiter.take() {
            Some(waiter) => match waiter.tx.send(decision) {
                Ok(()) => Delivery::Accepted,
                Err(_) => Delivery::WaiterGone,
            },
            None => Delivery::Idle,
        }
    }

    /// Remove the waiter if it is still the one identified by `ticket`.
    pub fn disarm(&mut self, ticket: u64) -> bool {
        match &self.waiter {
            Some(waiter) if waiter.ticket == ticket => {
                self.waiter = None;
                true
            }
            _ => false,
        }
    }
}

/// Receiving half held by the parked request
pub struct Parked {
    ticket: u64,
    rx: oneshot::Receiver<Decision>,
}

impl Parked {
    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    /// Wait for the decision. `None` if the sender was dropped unused.
    pub async fn recv(&mut self) -> Option<Decision> {
        (&mut self.rx).await.ok()
    }

    /// Non-blocking check, used after a timeout lost the race to `deliver`.
    pub fn try_take(&mut self) -> Option<Decision> {
        self.rx.try_recv().ok()
    }
}
