//! Streaming gzip request body.
//!
//! A blocking task reads the file and feeds a [`GzipCompressor`] whose sink is
//! one end of an in-memory pipe; the other end becomes the request body. The
//! pipe is bounded, so the compressor stalls until the socket drains and the
//! whole compressed file never sits in memory.

use std::fs::File;

use reqwest::Body;
use tokio::task::JoinHandle;
use tokio_util::io::{ReaderStream, SyncIoBridge};

use intact_core::codec::{compress, CompressStats};
use intact_core::{CodecError, CompressionLevel};

/// Chunks buffered in the pipe before the compressor blocks.
const PIPE_CHUNKS: usize = 4;

/// Build a gzip body for `file`. The handle resolves once compression has
/// finished (or failed); dropping the body makes the compressor fail fast.
///
/// Must be called from within a tokio runtime.
pub fn gzip_body(
    file: File,
    level: CompressionLevel,
    chunk_size: usize,
) -> (Body, JoinHandle<Result<CompressStats, CodecError>>) {
    let chunk_size = chunk_size.max(1);
    let (writer, reader) = tokio::io::duplex(chunk_size * PIPE_CHUNKS);
    let sink = SyncIoBridge::new(writer);
    // The sink is dropped when compress returns, which closes the pipe and
    // ends the body stream.
    let task = tokio::task::spawn_blocking(move || compress(file, sink, level, chunk_size));
    let stream = ReaderStream::with_capacity(reader, chunk_size);
    (Body::wrap_stream(stream), task)
}
