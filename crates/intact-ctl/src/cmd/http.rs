//! Shared HTTP request helpers for CLI commands.

use anyhow::{Context, Result};
use serde::Deserialize;

/// URL of `path` on the same host as the upload endpoint.
pub fn endpoint(server_url: &str, path: &str) -> Result<String> {
    let mut url = reqwest::Url::parse(server_url)
        .with_context(|| format!("invalid server url: {}", server_url))?;
    url.set_path(path);
    url.set_query(None);
    Ok(url.to_string())
}

pub async fn get_json<T: for<'de> Deserialize<'de>>(url: &str) -> Result<T> {
    reqwest::get(url)
        .await
        .with_context(|| format!("failed to connect to intactd at {} — is it running?", url))?
        .error_for_status()
        .context("intactd returned an error")?
        .json::<T>()
        .await
        .context("failed to parse response")
}
