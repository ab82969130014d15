//! Transfer envelope — the metadata that travels as request headers ahead of
//! the compressed body.
//!
//! These header names and values ARE the protocol. Renaming a header or
//! changing the checksum encoding breaks every deployed peer.

use std::fmt;

use thiserror::Error;

// ── Header names ──────────────────────────────────────────────────────────────

pub const FILENAME_HEADER: &str = "x-filename";
pub const CHECKSUM_HEADER: &str = "x-file-checksum";
pub const CONTENT_ENCODING_HEADER: &str = "content-encoding";
/// Response header carrying the digest the server computed.
pub const SERVER_CHECKSUM_HEADER: &str = "x-server-checksum";

/// Upload route on the server.
pub const UPLOAD_PATH: &str = "/upload";

// ── Response bodies ───────────────────────────────────────────────────────────

pub const BODY_VERIFIED: &str = "File uploaded and verified successfully.";
pub const BODY_MISMATCH: &str = "File corrupted during transfer.";
pub const BODY_MISSING_FILENAME: &str = "Filename header missing";
pub const BODY_INVALID_FILENAME: &str = "Invalid filename";
pub const BODY_UNSUPPORTED_ENCODING: &str = "Unsupported content encoding";
pub const BODY_INTERNAL_ERROR: &str = "Internal Server Error";

// ── Errors ────────────────────────────────────────────────────────────────────

/// A request whose envelope cannot be acted on.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("filename header missing")]
    MissingFilename,
    #[error("filename {0:?} has no usable basename")]
    InvalidFilename(String),
    #[error("content encoding missing")]
    MissingEncoding,
    #[error("unsupported content encoding {0:?}")]
    UnsupportedEncoding(String),
}

impl EnvelopeError {
    /// Fixed response body the server sends for this rejection.
    pub fn response_body(&self) -> &'static str {
        match self {
            EnvelopeError::MissingFilename => BODY_MISSING_FILENAME,
            EnvelopeError::InvalidFilename(_) => BODY_INVALID_FILENAME,
            EnvelopeError::MissingEncoding | EnvelopeError::UnsupportedEncoding(_) => {
                BODY_UNSUPPORTED_ENCODING
            }
        }
    }
}

// ── Content encoding ──────────────────────────────────────────────────────────

/// Body encodings the server knows how to reverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentEncoding {
    Gzip,
}

impl ContentEncoding {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentEncoding::Gzip => "gzip",
        }
    }

    pub fn parse(value: &str) -> Result<Self, EnvelopeError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "gzip" | "x-gzip" => Ok(ContentEncoding::Gzip),
            "" => Err(EnvelopeError::MissingEncoding),
            _ => Err(EnvelopeError::UnsupportedEncoding(value.to_string())),
        }
    }
}

impl fmt::Display for ContentEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Filenames ─────────────────────────────────────────────────────────────────

/// A filename reduced to a single safe path component.
///
/// Only [`SafeFileName::sanitize`] builds one, so holding a `SafeFileName`
/// means the name contains no separators, no leading dots and nothing
/// outside `[A-Za-z0-9._-]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SafeFileName(String);

impl SafeFileName {
    /// Strip path components, reject traversal attempts.
    pub fn sanitize(raw: &str) -> Result<Self, EnvelopeError> {
        // Take only the final path component (handles both / and \ separators)
        let base = raw.rsplit(['/', '\\']).next().unwrap_or(raw);

        // No hidden files, no ".." tricks
        let trimmed = base.trim_start_matches('.');

        let clean: String = trimmed
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();

        if clean.is_empty() {
            Err(EnvelopeError::InvalidFilename(raw.to_string()))
        } else {
            Ok(Self(clean))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SafeFileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ── Envelope ──────────────────────────────────────────────────────────────────

/// Metadata for one transfer. Built by the client, read once by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferEnvelope {
    filename: String,
    checksum: String,
    encoding: ContentEncoding,
}

impl TransferEnvelope {
    /// Client-side constructor.
    ///
    /// The filename must be non-empty and free of path separators; the
    /// checksum is carried as given (an empty checksum is legal and simply
    /// never verifies).
    pub fn new(
        filename: impl Into<String>,
        checksum: impl Into<String>,
    ) -> Result<Self, EnvelopeError> {
        let filename = filename.into();
        if filename.is_empty() {
            return Err(EnvelopeError::MissingFilename);
        }
        if filename.contains(['/', '\\']) || filename == "." || filename == ".." {
            return Err(EnvelopeError::InvalidFilename(filename));
        }
        Ok(Self {
            filename,
            checksum: checksum.into(),
            encoding: ContentEncoding::Gzip,
        })
    }

    /// Server-side parse. `header` looks up a request header's raw bytes by
    /// its lowercase name.
    ///
    /// A missing or empty filename rejects the request. Filename bytes that
    /// are not UTF-8 are decoded lossily and left for [`SafeFileName`] to
    /// clean up. A missing or non-UTF-8 checksum is read as `""`. The
    /// encoding marker must be present and recognised.
    pub fn from_headers<'a, F>(header: F) -> Result<Self, EnvelopeError>
    where
        F: Fn(&str) -> Option<&'a [u8]>,
    {
        let filename = header(FILENAME_HEADER)
            .filter(|v| !v.is_empty())
            .map(String::from_utf8_lossy)
            .ok_or(EnvelopeError::MissingFilename)?;
        let checksum = header(CHECKSUM_HEADER)
            .and_then(|v| std::str::from_utf8(v).ok())
            .unwrap_or("")
            .trim();
        let encoding = match header(CONTENT_ENCODING_HEADER) {
            Some(v) => match std::str::from_utf8(v) {
                Ok(v) => ContentEncoding::parse(v)?,
                Err(_) => {
                    return Err(EnvelopeError::UnsupportedEncoding(
                        String::from_utf8_lossy(v).into_owned(),
                    ))
                }
            },
            None => return Err(EnvelopeError::MissingEncoding),
        };
        Ok(Self {
            filename: filename.into_owned(),
            checksum: checksum.to_string(),
            encoding,
        })
    }

    /// Header name/value pairs to attach to the upload request.
    pub fn headers(&self) -> [(&'static str, String); 3] {
        [
            (FILENAME_HEADER, self.filename.clone()),
            (CHECKSUM_HEADER, self.checksum.clone()),
            (CONTENT_ENCODING_HEADER, self.encoding.as_str().to_string()),
        ]
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    pub fn encoding(&self) -> ContentEncoding {
        self.encoding
    }

    /// Filename reduced to something safe to use as a filesystem target.
    pub fn safe_filename(&self) -> Result<SafeFileName, EnvelopeError> {
        SafeFileName::sanitize(&self.filename)
    }

    /// True iff `server_checksum` proves the bytes arrived intact.
    ///
    /// An empty envelope checksum never verifies.
    pub fn verifies(&self, server_checksum: &str) -> bool {
        !self.checksum.is_empty() && self.checksum == server_checksum
    }
}
