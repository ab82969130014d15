//! Upload a directory and print per-file results.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use intact_core::config::ClientConfig;
use intact_core::TracingTelemetry;
use intact_ctl::{FailureKind, TransferOutcome, Uploader};

/// Returns true if every file verified. `json` prints the raw outcomes
/// instead of the table.
pub async fn cmd_upload(config: &ClientConfig, source_dir: &Path, json: bool) -> Result<bool> {
    let uploader = Uploader::new(config, Arc::new(TracingTelemetry))?;
    let outcomes = uploader.run(source_dir).await?;
    let all_verified = outcomes.iter().all(|o| o.success);

    if json {
        println!("{}", serde_json::to_string_pretty(&outcomes)?);
        return Ok(all_verified);
    }

    if outcomes.is_empty() {
        println!("No files in {}.", source_dir.display());
        return Ok(true);
    }

    let verified = outcomes.iter().filter(|o| o.success).count();

    println!("═══════════════════════════════════════");
    println!("  Upload Results ({}/{} verified)", verified, outcomes.len());
    println!("═══════════════════════════════════════");
    for o in &outcomes {
        print_outcome(o);
    }

    Ok(all_verified)
}

fn print_outcome(o: &TransferOutcome) {
    let (icon, label) = match o.failure_kind() {
        None => ("✓", "verified"),
        Some(FailureKind::Integrity) => ("✗", "checksum mismatch"),
        Some(FailureKind::Rejected) => ("✗", "rejected"),
        Some(FailureKind::Transport) => ("✗", "not delivered"),
    };
    println!("  ┌─ {} {}", icon, o.filename);
    match o.http_status {
        Some(status) => println!("  │  status   : {} ({})", status, label),
        None => println!("  │  status   : {}", label),
    }
    if let Some(detail) = &o.error_detail {
        println!("  │  detail   : {}", detail);
    }
    println!("  └─ checksum : {}", o.server_checksum.as_deref().unwrap_or("-"));
}
