//! Application state

use std::sync::Arc;

use arc_swap::ArcSwap;
use hookcat_protocol::{StatusResponse, UiNotification};
use tokio::sync::Mutex;
use tracing::debug;

use crate::assets::AssetCache;
use crate::presenter::Presenter;
use crate::session::SessionState;
use crate::window_control::WindowControl;

/// Shared application state, handed to every handler as `Arc<AppState>`.
pub struct AppState {
    /// The one exclusivity domain: session record plus rendezvous slot
    session: Mutex<SessionState>,

    /// Lock-free status snapshot, republished after every mutation
    status: ArcSwap<StatusResponse>,

    presenter: Arc<dyn Presenter>,
    windows: Arc<dyn WindowControl>,
    assets: AssetCache,
}

impl AppState {
    pub fn new(
        session: SessionState,
        presenter: Arc<dyn Presenter>,
        windows: Arc<dyn WindowControl>,
        assets: AssetCache,
    ) -> Self {
        let status = ArcSwap::from_pointee(session.status());
        Self {
            session: Mutex::new(session),
            status,
            presenter,
            windows,
            assets,
        }
    }

    /// Run `f` under the session lock, then publish the new status snapshot.
    ///
    /// `f` is synchronous so the critical section can never await.
    pub async fn with_session<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        let mut session = self.session.lock().await;
        let result = f(&mut session);
        self.status.store(Arc::new(session.status()));
        result
    }

    pub fn status(&self) -> Arc<StatusResponse> {
        self.status.load_full()
    }

    /// Best-effort UI notification; failures are only logged.
    pub fn notify_ui(&self, notification: UiNotification) {
        if let Err(e) = self.presenter.present(notification) {
            debug!(
                component = "presenter",
                event = "presenter.dropped",
                error = %e,
                "UI notification dropped"
            );
        }
    }

    pub fn presenter(&self) -> &Arc<dyn Presenter> {
        &self.presenter
    }

    pub fn windows(&self) -> &Arc<dyn WindowControl> {
        &self.windows
    }

    pub fn assets(&self) -> &AssetCache {
        &self.assets
    }
}
