//! intact-ctl — upload a directory to intactd and inspect the server.

mod cmd;

use std::path::PathBuf;

use anyhow::{Context, Result};

use intact_core::config::IntactConfig;

fn print_usage() {
    println!("Usage: intact-ctl [options] <command>");
    println!();
    println!("Commands:");
    println!("  upload            Upload every file in the source directory (default)");
    println!("  status            Show the server's upload counters");
    println!("  checksum <file>   Print the SHA-256 an upload of <file> would carry");
    println!();
    println!("Options:");
    println!("  --server <url>    Upload endpoint (default: http://127.0.0.1:8080/upload)");
    println!("  --dir <path>      Source directory (default: ./client_files)");
    println!("  --jobs <n>        Files in flight at once (default: 1)");
    println!("  --json            Print upload outcomes as JSON");
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut config = IntactConfig::load().context("failed to load config")?.client;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut json = false;
    let mut remaining: Vec<&str> = Vec::new();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--server" => {
                i += 1;
                config.server_url = args.get(i).context("--server requires a value")?.clone();
            }
            "--dir" => {
                i += 1;
                config.source_dir = PathBuf::from(args.get(i).context("--dir requires a value")?);
            }
            "--jobs" => {
                i += 1;
                config.concurrency = args
                    .get(i)
                    .context("--jobs requires a value")?
                    .parse()
                    .context("--jobs must be a number")?;
            }
            "--json" => json = true,
            other => remaining.push(other),
        }
        i += 1;
    }

    match remaining.as_slice() {
        ["upload"] | [] => {
            let source_dir = config.source_dir.clone();
            if !cmd::upload::cmd_upload(&config, &source_dir, json).await? {
                std::process::exit(2);
            }
            Ok(())
        }
        ["status"] => cmd::status::cmd_status(&config.server_url).await,
        ["checksum", file] => {
            cmd::checksum::cmd_checksum(std::path::Path::new(*file), config.chunk_size).await
        }
        ["help"] | ["--help"] | ["-h"] => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {}", other.join(" "));
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}
