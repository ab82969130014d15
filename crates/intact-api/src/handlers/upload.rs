//! /upload handler — receive, decompress, hash, persist, verify.
//!
//! Per request: Receiving → Verifying → {Verified | Mismatch | Rejected}.
//!
//! | Outcome                         | Status | File on disk            |
//! |---------------------------------|--------|-------------------------|
//! | Verified                        | 200    | kept                    |
//! | Mismatch                        | 400    | kept, for inspection    |
//! | Rejected (bad envelope)         | 400    | never created           |
//! | Rejected (corrupt stream / I/O) | 500    | staging file removed    |

use std::io;
use std::path::PathBuf;

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use futures_util::TryStreamExt;
use thiserror::Error;
use tokio_util::io::{StreamReader, SyncIoBridge};
use tracing::Instrument;

use intact_core::codec::CodecError;
use intact_core::envelope::{
    BODY_INTERNAL_ERROR, BODY_MISMATCH, BODY_VERIFIED, SERVER_CHECKSUM_HEADER,
};
use intact_core::telemetry::{ActiveSpan, METRIC_FILES_PROCESSED, SPAN_SAVE_AND_VERIFY};
use intact_core::{EnvelopeError, TransferEnvelope};

use super::status::UploadOutcome;
use super::ApiState;
use crate::ingest::{receive_to_file, IngestError, IngestReport};

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("invalid envelope: {0}")]
    Validation(#[from] EnvelopeError),
    #[error("corrupt upload stream: {0}")]
    CorruptStream(io::Error),
    #[error("upload i/o failed: {0}")]
    Io(io::Error),
    #[error("ingest worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl From<IngestError> for UploadError {
    fn from(e: IngestError) -> Self {
        match e {
            IngestError::Codec(CodecError::CorruptStream(e)) => UploadError::CorruptStream(e),
            IngestError::Codec(CodecError::Io(e)) | IngestError::Write(e) => UploadError::Io(e),
            IngestError::Codec(other) => UploadError::Io(io::Error::other(other)),
        }
    }
}

impl UploadError {
    pub fn status(&self) -> StatusCode {
        match self {
            UploadError::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn body(&self) -> &'static str {
        match self {
            UploadError::Validation(e) => e.response_body(),
            _ => BODY_INTERNAL_ERROR,
        }
    }
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        (self.status(), self.body()).into_response()
    }
}

// ── Verdict ───────────────────────────────────────────────────────────────────

/// Result of a fully received upload.
#[derive(Debug)]
pub struct Verdict {
    pub filename: String,
    pub path: PathBuf,
    pub report: IngestReport,
    pub matched: bool,
}

impl IntoResponse for Verdict {
    fn into_response(self) -> Response {
        let (status, body) = if self.matched {
            (StatusCode::OK, BODY_VERIFIED)
        } else {
            (StatusCode::BAD_REQUEST, BODY_MISMATCH)
        };
        let mut response = (status, body).into_response();
        if let Ok(v) = HeaderValue::from_str(&self.report.checksum) {
            response.headers_mut().insert(SERVER_CHECKSUM_HEADER, v);
        }
        response
    }
}

// ── Handler ───────────────────────────────────────────────────────────────────

pub async fn handle_upload(
    State(state): State<ApiState>,
    headers: HeaderMap,
    body: Body,
) -> Response {
    let raw_name = headers
        .get(intact_core::envelope::FILENAME_HEADER)
        .map(|v| String::from_utf8_lossy(v.as_bytes()))
        .unwrap_or_default();
    let mut span = state.telemetry.start_span(SPAN_SAVE_AND_VERIFY, &raw_name);
    let op_span = span.tracing_span();

    let result = receive(&state, &headers, body, span.as_mut())
        .instrument(op_span.clone())
        .await;
    let _entered = op_span.enter();
    match result {
        Ok(verdict) if verdict.matched => {
            tracing::info!(
                filename = %verdict.filename,
                bytes = verdict.report.bytes_written,
                compressed = verdict.report.compressed_bytes,
                "checksum verified"
            );
            state.stats.record(UploadOutcome::Verified);
            state
                .telemetry
                .increment_counter(METRIC_FILES_PROCESSED, &verdict.filename);
            verdict.into_response()
        }
        Ok(verdict) => {
            tracing::error!(
                filename = %verdict.filename,
                server_checksum = %verdict.report.checksum,
                path = %verdict.path.display(),
                "checksum mismatch"
            );
            state.stats.record(UploadOutcome::Mismatch);
            verdict.into_response()
        }
        Err(e) => {
            match &e {
                UploadError::Validation(_) => {
                    tracing::warn!(error = %e, "upload rejected");
                }
                _ => {
                    tracing::error!(error = %e, filename = %raw_name, "upload failed");
                }
            }
            span.record_error(&e);
            state.stats.record(UploadOutcome::Rejected);
            e.into_response()
        }
    }
}

async fn receive(
    state: &ApiState,
    headers: &HeaderMap,
    body: Body,
    span: &mut dyn ActiveSpan,
) -> Result<Verdict, UploadError> {
    let envelope =
        TransferEnvelope::from_headers(|name| headers.get(name).map(HeaderValue::as_bytes))?;
    let name = envelope.safe_filename()?;
    span.set_attribute("file.name", name.to_string());
    tracing::info!(filename = %name, "receiving file");

    let stream = body.into_data_stream().map_err(io::Error::other);
    let source = SyncIoBridge::new(StreamReader::new(stream));
    let output = state.output.clone();
    let chunk_size = state.chunk_size;
    let target = name.clone();
    let current = tracing::Span::current();

    let (path, report) = tokio::task::spawn_blocking(move || {
        let _entered = current.enter();
        receive_to_file(source, &output, &target, chunk_size)
    })
    .await??;

    let path_str = path.display().to_string();
    span.add_event("file.write.complete", &[("path", path_str.as_str())]);
    tracing::info!(path = %path_str, bytes = report.bytes_written, "file written");

    let matched = envelope.verifies(&report.checksum);
    span.set_attribute("file.checksum.match", matched.to_string());

    Ok(Verdict {
        filename: name.to_string(),
        path,
        report,
        matched,
    })
}
