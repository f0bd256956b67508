//! `hookcat status`: query a running coordinator.

use std::net::SocketAddr;
use std::time::Duration;

use hookcat_protocol::StatusResponse;

use crate::VERSION;

pub async fn run(bind: SocketAddr, raw_json: bool) -> anyhow::Result<()> {
    let url = format!("http://{bind}/status");
    let client = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(1))
        .timeout(Duration::from_secs(2))
        .build()?;

    let status = match fetch(&client, &url).await {
        Ok(status) => status,
        Err(e) => {
            println!();
            println!("  hookcat v{}", VERSION);
            println!("  Server: unreachable at {} ({})", url, e);
            println!();
            println!("  Start with: hookcat serve");
            println!();
            return Ok(());
        }
    };

    if raw_json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    print!("{}", render(&status, &url));
    Ok(())
}

async fn fetch(client: &reqwest::Client, url: &str) -> reqwest::Result<StatusResponse> {
    client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .json::<StatusResponse>()
        .await
}

fn render(status: &StatusResponse, url: &str) -> String {
    let mut out = String::new();
    out.push('\n');
    out.push_str(&format!("  hookcat v{}\n", VERSION));
    out.push_str(&format!("  Server: {}\n", url));
    out.push_str(&format!("  Mode: {}\n", status.mode));
    if status.pid > 0 {
        out.push_str(&format!("  Terminal PID: {}\n", status.pid));
    } else {
        out.push_str("  Terminal PID: unknown\n");
    }
    out.push_str(&format!("  Phase: {} ({})\n", status.phase, status.message));
    if let (Some(kind), Some(action)) = (&status.pending_kind, &status.pending_action) {
        out.push_str(&format!("  Pending: {} / {}\n", kind, action));
    }
    out.push('\n');
    out
}
