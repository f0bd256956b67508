//! Presentation-layer dispatch.
//!
//! The coordinator never renders anything itself; it pushes
//! `UiNotification`s to whatever sits behind a `Presenter`. The default
//! presenter fans notifications out over a broadcast channel that `/ws`
//! subscribers read from. UIs that only poll `/status` work too.

use hookcat_protocol::UiNotification;
use thiserror::Error;
use tokio::sync::broadcast;

#[derive(Debug, Error)]
pub enum PresenterError {
    #[error("presentation layer unreachable: no subscriber connected")]
    Unreachable,
}

pub trait Presenter: Send + Sync {
    fn present(&self, notification: UiNotification) -> Result<(), PresenterError>;

    /// Live notification feed, when the presenter offers one
    fn subscribe(&self) -> Option<broadcast::Receiver<UiNotification>> {
        None
    }
}

pub struct BroadcastPresenter {
    tx: broadcast::Sender<UiNotification>,
    require_subscriber: bool,
}

impl BroadcastPresenter {
    /// With `require_subscriber`, having no `/ws` client counts as the UI
    /// being unreachable (blocking hooks are then denied immediately).
    pub fn new(capacity: usize, require_subscriber: bool) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self {
            tx,
            require_subscriber,
        }
    }
}

impl Presenter for BroadcastPresenter {
    fn present(&self, notification: UiNotification) -> Result<(), PresenterError> {
        match self.tx.send(notification) {
            Ok(_) => Ok(()),
            Err(_) if self.require_subscriber => Err(PresenterError::Unreachable),
            // Polling UIs read /status instead.
            Err(_) => Ok(()),
        }
    }

    fn subscribe(&self) -> Option<broadcast::Receiver<UiNotification>> {
        Some(self.tx.subscribe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hookcat_protocol::Mode;

    fn note() -> UiNotification {
        UiNotification::ModeChanged { mode: Mode::Spying }
    }

    #[tokio::test]
    async fn subscribers_receive_notifications() {
        let presenter = BroadcastPresenter::new(8, true);
        let mut rx = presenter.subscribe().unwrap();

        presenter.present(note()).unwrap();
        assert_eq!(rx.recv().await.unwrap(), note());
    }

    #[test]
    fn missing_subscriber_is_only_an_error_when_required() {
        assert!(BroadcastPresenter::new(8, false).present(note()).is_ok());
        assert!(matches!(
            BroadcastPresenter::new(8, true).present(note()),
            Err(PresenterError::Unreachable)
        ));
    }
}
