use std::path::PathBuf;

/// Errors that abort a whole upload run.
///
/// Per-file failures never show up here; they are recorded in
/// [`TransferOutcome`](crate::TransferOutcome) and the batch moves on.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("source directory not found: {}", .0.display())]
    Configuration(PathBuf),

    #[error("invalid client setting: {0}")]
    InvalidSetting(String),

    #[error("failed to list {}: {1}", .0.display())]
    Io(PathBuf, #[source] std::io::Error),

    #[error("http client: {0}")]
    Transport(#[from] reqwest::Error),
}
