//! Print the checksum an upload of this file would carry.

use std::path::Path;

use anyhow::{Context, Result};

use intact_ctl::prepare::checksum_file;

pub async fn cmd_checksum(path: &Path, chunk_size: usize) -> Result<()> {
    let sum = checksum_file(path, chunk_size)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    println!("{}  {}", sum, path.display());
    Ok(())
}
