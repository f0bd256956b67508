//! hookcat
//!
//! Desk-companion coordinator: receives automation hook events over HTTP,
//! tracks the session phase, parks blocking requests until the human decides
//! in the companion UI, and flips the terminal between slacking and spying.

mod assets;
mod cmd_status;
mod config;
mod error;
mod hook_handler;
mod logging;
mod mode;
mod mode_command;
mod paths;
mod presenter;
mod rendezvous;
mod routes;
mod session;
mod state;
mod terminal;
mod transition;
mod websocket;
mod window_control;

use std::sync::Arc;

use clap::Parser;
use hookcat_protocol::ModeCommandsRequest;
use tracing::{info, warn};

use crate::assets::AssetCache;
use crate::config::{Cli, Command, ServeArgs};
use crate::paths::DataPaths;
use crate::presenter::BroadcastPresenter;
use crate::session::{ModeCommands, SessionState};
use crate::state::AppState;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Buffered UI notifications per WebSocket subscriber
const PRESENTER_CAPACITY: usize = 256;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let command = match cli.command {
        Some(command) => command,
        None => Command::Serve(ServeArgs::from_env()?),
    };

    match command {
        Command::Serve(args) => serve(cli.data_dir, args).await,
        Command::Status { bind, json } => cmd_status::run(bind, json).await,
    }
}

async fn serve(data_dir: Option<std::path::PathBuf>, args: ServeArgs) -> anyhow::Result<()> {
    let paths = DataPaths::resolve(data_dir.as_deref(), args.public_dir.as_deref());
    paths.ensure_dirs()?;

    let logging = logging::init_logging(&paths.log_dir(), args.log_stderr)?;
    let _log_guard = logging.guard;

    info!(
        component = "server",
        event = "server.starting",
        version = VERSION,
        run_id = %logging.run_id,
        data_dir = %paths.data_dir().display(),
        public_dir = %paths.public_dir().display(),
        mode = %args.mode,
        "Starting hookcat"
    );

    let windows = window_control::create_window_control(args.window_control);
    let presenter = Arc::new(BroadcastPresenter::new(
        PRESENTER_CAPACITY,
        args.require_presenter,
    ));
    let assets = AssetCache::new(paths.public_dir());

    // Dropping the watcher stops invalidation, so it lives until shutdown.
    let _asset_watcher = match assets.spawn_watcher() {
        Ok(watcher) => Some(watcher),
        Err(e) => {
            warn!(
                component = "assets",
                event = "assets.watch_failed",
                error = %e,
                "Asset watcher unavailable; modification-time checks still apply"
            );
            None
        }
    };

    let mut commands = ModeCommands::default();
    commands.apply(ModeCommandsRequest {
        slacking_command: args.slacking_command.clone(),
        spying_command: args.spying_command.clone(),
    });
    let state = Arc::new(AppState::new(
        SessionState::new(args.mode, commands),
        presenter,
        windows,
        assets,
    ));

    let app = routes::build_router(state);

    let listener = tokio::net::TcpListener::bind(args.bind).await?;
    info!(
        component = "server",
        event = "server.listening",
        addr = %args.bind,
        "Listening on {}",
        args.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!(component = "server", event = "server.stopped", "hookcat stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(
            component = "server",
            event = "server.signal_failed",
            error = %e,
            "Failed to listen for ctrl-c"
        );
        std::future::pending::<()>().await;
    }
    info!(component = "server", event = "server.shutdown", "Shutdown requested");
}
