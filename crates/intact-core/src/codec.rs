//! Gzip compression codec.
//!
//! Gzip is a wire requirement, not a tuning choice: the client sends a gzip
//! container and the server refuses anything it cannot decode as one. Both
//! directions work on bounded chunks, so neither side ever holds a whole
//! file (compressed or not) in memory.
//!
//! ```
//! use intact_core::codec::{compress, decompress, CompressionLevel};
//!
//! let data = b"highly compressible payload payload payload";
//! let mut wire = Vec::new();
//! compress(&data[..], &mut wire, CompressionLevel::Default, 4096).unwrap();
//! let mut out = Vec::new();
//! decompress(&wire[..], &mut out, 4096).unwrap();
//! assert_eq!(out, data);
//! ```

use std::io::{self, Read, Write};
use std::num::NonZeroU8;

use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use thiserror::Error;

/// Read granularity used on both sides unless configured otherwise.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum CodecError {
    /// The input is not a gzip container, or it ends early.
    #[error("corrupt gzip stream: {0}")]
    CorruptStream(io::Error),
    /// Reading the source or writing the sink failed.
    #[error("codec i/o failed: {0}")]
    Io(io::Error),
    #[error("compression level {0} is outside the supported range 1-9")]
    InvalidLevel(u32),
}

impl CodecError {
    /// Sort a decoder error into "bad container" versus "plumbing failed".
    fn from_decode(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::InvalidInput
            | io::ErrorKind::InvalidData
            | io::ErrorKind::UnexpectedEof => CodecError::CorruptStream(e),
            _ => CodecError::Io(e),
        }
    }
}

// ── Levels ────────────────────────────────────────────────────────────────────

/// Compression levels accepted by the gzip encoder.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CompressionLevel {
    Fast,
    Default,
    Best,
    /// Explicit level in `1..=9`.
    Precise(NonZeroU8),
}

impl CompressionLevel {
    pub fn from_numeric(level: u32) -> Result<Self, CodecError> {
        match level {
            1..=9 => NonZeroU8::new(level as u8)
                .map(Self::Precise)
                .ok_or(CodecError::InvalidLevel(level)),
            _ => Err(CodecError::InvalidLevel(level)),
        }
    }
}

impl From<CompressionLevel> for Compression {
    fn from(level: CompressionLevel) -> Self {
        match level {
            CompressionLevel::Fast => Compression::fast(),
            CompressionLevel::Default => Compression::default(),
            CompressionLevel::Best => Compression::best(),
            CompressionLevel::Precise(v) => Compression::new(u32::from(v.get())),
        }
    }
}

// ── Byte counting ─────────────────────────────────────────────────────────────

struct CountingWriter<W> {
    inner: W,
    written: u64,
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

struct CountingReader<R> {
    inner: R,
    read: u64,
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.read += n as u64;
        Ok(n)
    }
}

// ── Compression ───────────────────────────────────────────────────────────────

/// Streaming gzip encoder fed one chunk at a time.
pub struct GzipCompressor<W: Write> {
    encoder: GzEncoder<CountingWriter<W>>,
    raw_bytes: u64,
}

/// Totals reported once a compression pass finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressStats {
    pub raw_bytes: u64,
    pub compressed_bytes: u64,
}

impl<W: Write> GzipCompressor<W> {
    pub fn new(writer: W, level: CompressionLevel) -> Self {
        Self {
            encoder: GzEncoder::new(
                CountingWriter {
                    inner: writer,
                    written: 0,
                },
                level.into(),
            ),
            raw_bytes: 0,
        }
    }

    pub fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), CodecError> {
        self.encoder.write_all(chunk).map_err(CodecError::Io)?;
        self.raw_bytes += chunk.len() as u64;
        Ok(())
    }

    /// Write the gzip trailer and hand back the sink.
    pub fn finish(self) -> Result<(W, CompressStats), CodecError> {
        let mut counted = self.encoder.finish().map_err(CodecError::Io)?;
        counted.flush().map_err(CodecError::Io)?;
        let stats = CompressStats {
            raw_bytes: self.raw_bytes,
            compressed_bytes: counted.written,
        };
        Ok((counted.inner, stats))
    }
}

/// Compress everything `reader` yields into `writer`, `chunk_size` bytes at a time.
pub fn compress<R: Read, W: Write>(
    mut reader: R,
    writer: W,
    level: CompressionLevel,
    chunk_size: usize,
) -> Result<CompressStats, CodecError> {
    let mut compressor = GzipCompressor::new(writer, level);
    let mut buf = vec![0u8; chunk_size.max(1)];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(CodecError::Io(e)),
        };
        compressor.write_chunk(&buf[..n])?;
    }
    let (_, stats) = compressor.finish()?;
    Ok(stats)
}

// ── Decompression ─────────────────────────────────────────────────────────────

/// Streaming gzip decoder that hands out decompressed bytes chunk by chunk.
///
/// Concatenated members decode as one stream. An empty input, a bad header
/// (including bytes after the last member that do not start another one), a
/// damaged deflate stream, a CRC mismatch and a missing trailer all surface
/// as [`CodecError::CorruptStream`].
pub struct GzipDecompressor<R: Read> {
    decoder: MultiGzDecoder<CountingReader<R>>,
}

impl<R: Read> GzipDecompressor<R> {
    pub fn new(reader: R) -> Self {
        Self {
            decoder: MultiGzDecoder::new(CountingReader {
                inner: reader,
                read: 0,
            }),
        }
    }

    /// Fill `buf` with the next decompressed bytes. `Ok(0)` means the
    /// container ended cleanly.
    pub fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize, CodecError> {
        loop {
            match self.decoder.read(buf) {
                Ok(0) if self.compressed_bytes() == 0 => {
                    return Err(CodecError::CorruptStream(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "empty gzip stream",
                    )));
                }
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(CodecError::from_decode(e)),
            }
        }
    }

    /// Compressed bytes consumed from the source so far.
    pub fn compressed_bytes(&self) -> u64 {
        self.decoder.get_ref().read
    }
}

/// Decompress `reader` into `writer`. Returns the number of bytes written.
pub fn decompress<R: Read, W: Write>(
    reader: R,
    mut writer: W,
    chunk_size: usize,
) -> Result<u64, CodecError> {
    let mut decompressor = GzipDecompressor::new(reader);
    let mut buf = vec![0u8; chunk_size.max(1)];
    let mut total = 0u64;
    loop {
        let n = decompressor.read_chunk(&mut buf)?;
        if n == 0 {
            break;
        }
        writer.write_all(&buf[..n]).map_err(CodecError::Io)?;
        total += n as u64;
    }
    writer.flush().map_err(CodecError::Io)?;
    Ok(total)
}
