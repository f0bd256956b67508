//! Runner for the optional per-mode commands.
//!
//! Spawns `sh -c <command>` with the terminal pid and the new mode in the
//! environment, and captures its output. Runs off the request path.

use std::time::{Duration, Instant};

use hookcat_protocol::Mode;
use tokio::process::Command;

/// Upper bound for a mode command before it is abandoned
pub const MODE_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Result of a mode command execution
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    pub duration_ms: u64,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Execute a mode command with timeout.
pub async fn run(command: &str, mode: Mode, pid: u32, timeout: Duration) -> CommandResult {
    let start = Instant::now();

    let result = tokio::time::timeout(timeout, run_command(command, mode, pid)).await;

    let duration_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(Ok((stdout, stderr, exit_code))) => CommandResult {
            stdout,
            stderr,
            exit_code: Some(exit_code),
            duration_ms,
        },
        Ok(Err(e)) => CommandResult {
            stdout: String::new(),
            stderr: format!("Failed to execute command: {e}"),
            exit_code: None,
            duration_ms,
        },
        Err(_) => CommandResult {
            stdout: String::new(),
            stderr: format!("Command timed out after {}s", timeout.as_secs_f32()),
            exit_code: None,
            duration_ms,
        },
    }
}

async fn run_command(
    command: &str,
    mode: Mode,
    pid: u32,
) -> Result<(String, String, i32), std::io::Error> {
    let output = Command::new("sh")
        .arg("-c")
        .arg(command)
        .env("HOOKCAT_MODE", mode.as_str())
        .env("HOOKCAT_TERMINAL_PID", pid.to_string())
        .kill_on_drop(true)
        .output()
        .await?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    let exit_code = output.status.code().unwrap_or(-1);

    Ok((stdout, stderr, exit_code))
}
