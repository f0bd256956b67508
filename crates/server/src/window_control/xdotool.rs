//! X11 window control through `xdotool`, `wmctrl` and `xprop`.

use std::process::Command;

use hookcat_protocol::WindowState;
use tracing::{debug, warn};

use super::{process_chain, WindowControl};

pub struct XdotoolWindowControl;

impl XdotoolWindowControl {
    pub fn new() -> Self {
        Self
    }

    /// First visible window owned by `pid` or one of its ancestors.
    fn find_window(&self, pid: u32) -> Option<String> {
        for candidate in process_chain(pid) {
            let pid_arg = candidate.to_string();
            if let Some(out) = run_tool("xdotool", &["search", "--onlyvisible", "--pid", &pid_arg]) {
                if let Some(window) = out.lines().map(str::trim).find(|l| !l.is_empty()) {
                    debug!(
                        component = "window",
                        pid,
                        owner_pid = candidate,
                        window,
                        "Found terminal window"
                    );
                    return Some(window.to_string());
                }
            }
        }
        debug!(component = "window", pid, "No window found in process chain");
        None
    }

    fn with_window(&self, pid: u32, f: impl FnOnce(&str) -> bool) -> bool {
        match self.find_window(pid) {
            Some(window) => f(&window),
            None => false,
        }
    }
}

impl Default for XdotoolWindowControl {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowControl for XdotoolWindowControl {
    fn name(&self) -> &'static str {
        "xdotool"
    }

    fn activate(&self, pid: u32) -> bool {
        self.with_window(pid, |window| {
            let mapped = run_tool("xdotool", &["windowmap", window]).is_some();
            let activated = run_tool("xdotool", &["windowactivate", window]).is_some();
            let pinned = set_above(window, true);
            debug!(component = "window", pid, mapped, activated, pinned, "activate");
            activated
        })
    }

    fn minimize(&self, pid: u32) -> bool {
        self.with_window(pid, |window| {
            // A pinned window would stay in front of everything once restored.
            set_above(window, false);
            run_tool("xdotool", &["windowminimize", window]).is_some()
        })
    }

    fn restore(&self, pid: u32) -> bool {
        self.with_window(pid, |window| {
            run_tool("xdotool", &["windowmap", window]).is_some()
                && run_tool("xdotool", &["windowactivate", window]).is_some()
        })
    }

    fn set_topmost(&self, pid: u32, topmost: bool) -> bool {
        self.with_window(pid, |window| set_above(window, topmost))
    }

    fn query_state(&self, pid: u32) -> WindowState {
        let Some(window) = self.find_window(pid) else {
            return WindowState::NotFound;
        };
        match run_tool("xprop", &["-id", &window, "_NET_WM_STATE"]) {
            Some(out) => parse_wm_state(&out),
            None => WindowState::Normal,
        }
    }
}

fn set_above(window: &str, above: bool) -> bool {
    let action = if above { "add,above" } else { "remove,above" };
    run_tool("wmctrl", &["-i", "-r", window, "-b", action]).is_some()
}

fn parse_wm_state(xprop_output: &str) -> WindowState {
    if xprop_output.contains("_NET_WM_STATE_HIDDEN") {
        WindowState::Minimized
    } else if xprop_output.contains("_NET_WM_STATE_MAXIMIZED_VERT")
        && xprop_output.contains("_NET_WM_STATE_MAXIMIZED_HORZ")
    {
        WindowState::Maximized
    } else {
        WindowState::Normal
    }
}

/// Run a helper tool, returning stdout when it exits successfully.
fn run_tool(program: &str, args: &[&str]) -> Option<String> {
    match Command::new(program).args(args).output() {
        Ok(output) if output.status.success() => {
            Some(String::from_utf8_lossy(&output.stdout).into_owned())
        }
        Ok(output) => {
            debug!(
                component = "window",
                program,
                args = ?args,
                status = ?output.status.code(),
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "Window tool exited unsuccessfully"
            );
            None
        }
        Err(e) => {
            warn!(
                component = "window",
                event = "window.tool_unavailable",
                program,
                error = %e,
                "Failed to run window tool"
            );
            None
        }
    }
}
