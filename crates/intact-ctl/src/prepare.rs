//! First pass over a file: hash the uncompressed bytes.

use std::io;
use std::path::Path;

use intact_core::digest::checksum_reader;

/// SHA-256 of the file at `path`, read `chunk_size` bytes at a time on the
/// blocking pool.
pub async fn checksum_file(path: &Path, chunk_size: usize) -> io::Result<String> {
    let file = tokio::fs::File::open(path).await?.into_std().await;
    let span = tracing::Span::current();
    tokio::task::spawn_blocking(move || {
        let _entered = span.enter();
        checksum_reader(file, chunk_size)
    })
    .await
    .map_err(io::Error::other)?
}
