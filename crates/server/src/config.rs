//! CLI command definitions and subcommands

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use hookcat_protocol::Mode;

use crate::window_control::WindowControlKind;

pub const DEFAULT_BIND: &str = "127.0.0.1:22622";

/// hookcat - desk companion that brokers automation hooks and human decisions
#[derive(Parser, Debug)]
#[command(
    name = "hookcat",
    version = crate::VERSION,
    after_help = "Logs are written to: <data-dir>/logs/server.log"
)]
pub struct Cli {
    /// Data directory (logs, default public dir)
    #[arg(long, global = true, env = "HOOKCAT_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the coordinator in the foreground (default)
    Serve(ServeArgs),

    /// Query a running coordinator and print its status
    Status {
        /// Address of the running server
        #[arg(long, env = "HOOKCAT_BIND", default_value = DEFAULT_BIND)]
        bind: SocketAddr,

        /// Print the raw JSON response
        #[arg(long)]
        json: bool,
    },
}

#[derive(Parser, Debug, Clone)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "HOOKCAT_BIND", default_value = DEFAULT_BIND)]
    pub bind: SocketAddr,

    /// Directory holding the companion UI (default: <data-dir>/public)
    #[arg(long, env = "HOOKCAT_PUBLIC_DIR")]
    pub public_dir: Option<PathBuf>,

    /// Initial mode
    #[arg(long, default_value = "slacking", value_parser = parse_mode)]
    pub mode: Mode,

    /// Command run when entering slacking mode
    #[arg(long, env = "HOOKCAT_SLACKING_COMMAND")]
    pub slacking_command: Option<String>,

    /// Command run when entering spying mode
    #[arg(long, env = "HOOKCAT_SPYING_COMMAND")]
    pub spying_command: Option<String>,

    /// Terminal window control backend
    #[arg(long, value_enum, default_value = "auto")]
    pub window_control: WindowControlKind,

    /// Deny blocking hooks at once while no UI is subscribed to /ws
    #[arg(long)]
    pub require_presenter: bool,

    /// Mirror logs to stderr
    #[arg(long)]
    pub log_stderr: bool,
}

impl ServeArgs {
    /// Serve options when no subcommand was given; env fallbacks still apply.
    pub fn from_env() -> Result<Self, clap::Error> {
        Self::try_parse_from(["hookcat"])
    }
}

fn parse_mode(s: &str) -> Result<Mode, String> {
    s.parse()
}
