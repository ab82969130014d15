//! Server upload counters.

use anyhow::Result;
use serde::Deserialize;

use super::http::{endpoint, get_json};

#[derive(Deserialize)]
struct StatusResponse {
    output_dir: String,
    verified: u64,
    mismatched: u64,
    rejected: u64,
}

pub async fn cmd_status(server_url: &str) -> Result<()> {
    let resp: StatusResponse = get_json(&endpoint(server_url, "/status")?).await?;

    println!("═══════════════════════════════════════");
    println!("  intactd Status");
    println!("═══════════════════════════════════════");
    println!("  Output dir : {}", resp.output_dir);
    println!("  Verified   : {}", resp.verified);
    println!("  Mismatched : {}", resp.mismatched);
    println!("  Rejected   : {}", resp.rejected);

    Ok(())
}
