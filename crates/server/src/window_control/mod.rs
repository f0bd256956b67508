//! Terminal window control.
//!
//! The coordinator only consumes this interface: every call is best-effort,
//! keyed by the terminal pid, and reports success as a plain bool. Adapters
//! walk the parent-process chain when `pid` owns no window itself.
//! All methods block; callers run them on the blocking pool.

mod xdotool;

use std::sync::Arc;

use hookcat_protocol::WindowState;
use tracing::{debug, info};

pub use xdotool::XdotoolWindowControl;

/// How far up the parent chain adapters look for a window
pub const MAX_PARENT_DEPTH: usize = 10;

pub trait WindowControl: Send + Sync {
    fn name(&self) -> &'static str;

    /// Restore, raise and pin the window on top.
    fn activate(&self, pid: u32) -> bool;
    fn minimize(&self, pid: u32) -> bool;
    fn restore(&self, pid: u32) -> bool;
    fn set_topmost(&self, pid: u32, topmost: bool) -> bool;
    fn query_state(&self, pid: u32) -> WindowState;
}

/// Used where no window system is available; every action fails softly.
pub struct NoopWindowControl;

impl WindowControl for NoopWindowControl {
    fn name(&self) -> &'static str {
        "none"
    }

    fn activate(&self, pid: u32) -> bool {
        debug!(component = "window", pid, "activate skipped: window control disabled");
        false
    }

    fn minimize(&self, pid: u32) -> bool {
        debug!(component = "window", pid, "minimize skipped: window control disabled");
        false
    }

    fn restore(&self, pid: u32) -> bool {
        debug!(component = "window", pid, "restore skipped: window control disabled");
        false
    }

    fn set_topmost(&self, pid: u32, _topmost: bool) -> bool {
        debug!(component = "window", pid, "set_topmost skipped: window control disabled");
        false
    }

    fn query_state(&self, _pid: u32) -> WindowState {
        WindowState::NotFound
    }
}

/// Adapter selection from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum WindowControlKind {
    /// xdotool when an X display is available, otherwise none
    Auto,
    Xdotool,
    None,
}

pub fn create_window_control(kind: WindowControlKind) -> Arc<dyn WindowControl> {
    let control: Arc<dyn WindowControl> = match kind {
        WindowControlKind::Xdotool => Arc::new(XdotoolWindowControl::new()),
        WindowControlKind::None => Arc::new(NoopWindowControl),
        WindowControlKind::Auto if x11_available() => Arc::new(XdotoolWindowControl::new()),
        WindowControlKind::Auto => Arc::new(NoopWindowControl),
    };
    info!(
        component = "window",
        event = "window.adapter_selected",
        adapter = control.name(),
        "Window control adapter selected"
    );
    control
}

fn x11_available() -> bool {
    cfg!(target_os = "linux") && std::env::var_os("DISPLAY").is_some()
}

/// `pid` followed by its ancestors, nearest first, stopping at init.
pub fn process_chain(pid: u32) -> Vec<u32> {
    let mut chain = vec![pid];
    let mut current = pid;
    while chain.len() <= MAX_PARENT_DEPTH {
        match parent_pid(current) {
            Some(parent) if parent > 1 && parent != current => {
                chain.push(parent);
                current = parent;
            }
            _ => break,
        }
    }
    chain
}

fn parent_pid(pid: u32) -> Option<u32> {
    let status = std::fs::read_to_string(format!("/proc/{pid}/status")).ok()?;
    parse_ppid(&status)
}

fn parse_ppid(status: &str) -> Option<u32> {
    status
        .lines()
        .find_map(|line| line.strip_prefix("PPid:"))
        .and_then(|rest| rest.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ppid_from_proc_status() {
        let status = "Name:\tbash\nState:\tS (sleeping)\nTgid:\t4242\nPid:\t4242\nPPid:\t4100\n";
        assert_eq!(parse_ppid(status), Some(4100));
        assert_eq!(parse_ppid("Name:\tinit\n"), None);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn process_chain_starts_with_pid_and_climbs() {
        let me = std::process::id();
        let chain = process_chain(me);
        assert_eq!(chain[0], me);
        assert!(chain.len() <= MAX_PARENT_DEPTH + 1);
        if chain.len() > 1 {
            assert_eq!(Some(chain[1]), parent_pid(me));
        }
    }

    #[test]
    fn noop_adapter_fails_softly() {
        let control = NoopWindowControl;
        assert!(!control.activate(42));
        assert!(!control.set_topmost(42, true));
        assert_eq!(control.query_state(42), WindowState::NotFound);
    }
}
