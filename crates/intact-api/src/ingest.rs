//! Streaming ingest — decompress, hash and write one upload body.
//!
//! Runs on a blocking worker. Each decompressed chunk is hashed and written
//! before the next one is read, so memory stays at one chunk no matter how
//! large the file is.

use std::io::{self, Read, Write};
use std::path::PathBuf;

use intact_core::codec::{CodecError, GzipDecompressor};
use intact_core::{IntegrityHasher, SafeFileName};
use thiserror::Error;

use crate::output::OutputDir;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("failed to write upload: {0}")]
    Write(io::Error),
}

/// What one ingest pass produced.
#[derive(Debug, Clone)]
pub struct IngestReport {
    /// SHA-256 of the decompressed bytes, lowercase hex.
    pub checksum: String,
    pub bytes_written: u64,
    pub compressed_bytes: u64,
}

/// Decompress `source` into `dest`, hashing every chunk as it is written.
pub fn ingest<R: Read, W: Write>(
    source: R,
    dest: &mut W,
    chunk_size: usize,
) -> Result<IngestReport, IngestError> {
    let mut decompressor = GzipDecompressor::new(source);
    let mut hasher = IntegrityHasher::new();
    let mut buf = vec![0u8; chunk_size.max(1)];

    loop {
        let n = decompressor.read_chunk(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        dest.write_all(&buf[..n]).map_err(IngestError::Write)?;
    }
    dest.flush().map_err(IngestError::Write)?;

    let bytes_written = hasher.bytes_hashed();
    Ok(IngestReport {
        checksum: hasher.finalize(),
        bytes_written,
        compressed_bytes: decompressor.compressed_bytes(),
    })
}

/// Ingest into a staging file, then move it over `output/name`.
///
/// On any error the staging file is dropped and deleted, so a failed stream
/// never leaves a file under the destination name.
pub fn receive_to_file<R: Read>(
    source: R,
    output: &OutputDir,
    name: &SafeFileName,
    chunk_size: usize,
) -> Result<(PathBuf, IngestReport), IngestError> {
    let mut staged = output.stage().map_err(IngestError::Write)?;
    let report = ingest(source, staged.as_file_mut(), chunk_size)?;

    let dest = output.resolve(name);
    staged
        .persist(&dest)
        .map_err(|e| IngestError::Write(e.error))?;
    Ok((dest, report))
}
