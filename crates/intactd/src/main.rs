//! intactd — integrity-checked upload server.

use std::sync::Arc;

use anyhow::{Context, Result};

use intact_api::{ApiState, OutputDir};
use intact_core::config::IntactConfig;
use intact_core::TracingTelemetry;

fn print_usage() {
    println!("Usage: intactd [--bind <addr>] [--output <dir>]");
    println!();
    println!("Options:");
    println!("  --bind <addr>    Listen address (default: 0.0.0.0:8080)");
    println!("  --output <dir>   Directory uploads are written to (default: ./server_output)");
    println!();
    println!("Settings also come from $INTACT_CONFIG and INTACT_SERVER__* variables.");
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Load config
    if let Err(e) = IntactConfig::write_default_if_missing() {
        tracing::warn!(error = %e, "failed to write default config");
    }
    let mut config = IntactConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        IntactConfig::default()
    });

    // Flags override everything else
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--bind" => {
                i += 1;
                config.server.bind_addr = args.get(i).context("--bind requires a value")?.clone();
            }
            "--output" => {
                i += 1;
                config.server.output_dir = args.get(i).context("--output requires a value")?.into();
            }
            "help" | "--help" | "-h" => {
                print_usage();
                return Ok(());
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let output = OutputDir::create(&config.server.output_dir).with_context(|| {
        format!(
            "failed to create output directory {}",
            config.server.output_dir.display()
        )
    })?;
    tracing::info!(
        bind = %config.server.bind_addr,
        output = %output.path().display(),
        chunk_size = config.server.chunk_size,
        "intactd starting"
    );

    let state = ApiState::new(output, Arc::new(TracingTelemetry), config.server.chunk_size);

    // ── Shutdown ─────────────────────────────────────────────────────────────
    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("shutdown signal received");
    };

    intact_api::serve(state, &config.server.bind_addr, shutdown)
        .await
        .with_context(|| format!("upload server on {} failed", config.server.bind_addr))?;

    tracing::info!("shut down cleanly");
    Ok(())
}
