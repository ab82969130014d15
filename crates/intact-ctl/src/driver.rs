//! Client Transfer Driver.
//!
//! For each regular file in the source directory, in sorted filename order:
//! hash it, stream it gzip-compressed to the upload endpoint with its
//! envelope, and record the server's verdict. A failing file never stops the
//! batch.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::stream::{self, StreamExt};
use tracing::Instrument;

use intact_core::config::ClientConfig;
use intact_core::envelope::SERVER_CHECKSUM_HEADER;
use intact_core::telemetry::{
    ActiveSpan, METRIC_TRANSFER_DURATION, SPAN_PREPARE, SPAN_TRANSFER,
};
use intact_core::{CodecError, CompressionLevel, Telemetry, TransferEnvelope};

use crate::body::gzip_body;
use crate::error::ClientError;
use crate::outcome::TransferOutcome;
use crate::prepare::checksum_file;

pub struct Uploader {
    http: reqwest::Client,
    server_url: String,
    chunk_size: usize,
    level: CompressionLevel,
    concurrency: usize,
    telemetry: Arc<dyn Telemetry>,
}

impl Uploader {
    pub fn new(config: &ClientConfig, telemetry: Arc<dyn Telemetry>) -> Result<Self, ClientError> {
        let level = config
            .compression()
            .map_err(|e| ClientError::InvalidSetting(e.to_string()))?;
        if config.chunk_size == 0 {
            return Err(ClientError::InvalidSetting("chunk_size must be > 0".into()));
        }

        let mut builder = reqwest::Client::builder();
        if config.request_timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.request_timeout_secs));
        }

        Ok(Self {
            http: builder.build()?,
            server_url: config.server_url.clone(),
            chunk_size: config.chunk_size,
            level,
            concurrency: config.concurrency.max(1),
            telemetry,
        })
    }

    /// Upload every regular file in `source_dir`.
    ///
    /// Outcomes come back in sorted filename order, whatever the
    /// concurrency. Only a missing or unreadable directory is an error.
    pub async fn run(&self, source_dir: &Path) -> Result<Vec<TransferOutcome>, ClientError> {
        let files = list_files(source_dir).await?;
        tracing::info!(
            dir = %source_dir.display(),
            files = files.len(),
            concurrency = self.concurrency,
            "starting file transfer"
        );

        let outcomes: Vec<TransferOutcome> = stream::iter(files)
            .map(|path| async move { self.upload_file(&path).await })
            .buffered(self.concurrency)
            .collect()
            .await;

        let verified = outcomes.iter().filter(|o| o.success).count();
        tracing::info!(
            verified,
            failed = outcomes.len() - verified,
            "file transfer complete"
        );
        Ok(outcomes)
    }

    /// Prepare, send and record one file. Never fails; problems land in the
    /// returned outcome.
    pub async fn upload_file(&self, path: &Path) -> TransferOutcome {
        let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
            let shown = path.display().to_string();
            tracing::error!(path = %shown, "upload failed: filename is not valid UTF-8");
            return TransferOutcome::failed(&shown, "filename is not valid UTF-8");
        };

        let envelope = match self.prepare(path, filename).await {
            Ok(envelope) => envelope,
            Err(detail) => {
                tracing::error!(filename, %detail, "upload failed");
                return TransferOutcome::failed(filename, detail);
            }
        };

        let started = Instant::now();
        let outcome = self.send(path, &envelope).await;
        self.telemetry.record_observation(
            METRIC_TRANSFER_DURATION,
            started.elapsed().as_secs_f64(),
            filename,
        );

        if outcome.success {
            tracing::info!(filename, status = ?outcome.http_status, "upload verified");
        } else {
            tracing::error!(
                filename,
                status = ?outcome.http_status,
                detail = outcome.error_detail.as_deref().unwrap_or(""),
                "upload failed"
            );
        }
        outcome
    }

    /// Hash the file and build its envelope, inside the prepare span.
    async fn prepare(&self, path: &Path, filename: &str) -> Result<TransferEnvelope, String> {
        let mut span = self.telemetry.start_span(SPAN_PREPARE, filename);
        let op_span = span.tracing_span();
        let result = async {
            let checksum = checksum_file(path, self.chunk_size)
                .await
                .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
            span.add_event("checksum.calculated", &[("checksum", checksum.as_str())]);
            TransferEnvelope::new(filename, checksum).map_err(|e| e.to_string())
        }
        .instrument(op_span)
        .await;
        if let Err(e) = &result {
            span.record_error(e);
        }
        result
    }

    /// Stream `path` to the server under `envelope`, inside the transfer span.
    ///
    /// Public so callers can send a hand-built envelope (e.g. one whose
    /// checksum is deliberately wrong).
    pub async fn send(&self, path: &Path, envelope: &TransferEnvelope) -> TransferOutcome {
        let mut span = self.telemetry.start_span(SPAN_TRANSFER, envelope.filename());
        let op_span = span.tracing_span();
        self.send_in(path, envelope, span.as_mut())
            .instrument(op_span)
            .await
    }

    async fn send_in(
        &self,
        path: &Path,
        envelope: &TransferEnvelope,
        span: &mut dyn ActiveSpan,
    ) -> TransferOutcome {
        let filename = envelope.filename();
        let file = match tokio::fs::File::open(path).await {
            Ok(f) => f.into_std().await,
            Err(e) => {
                let detail = format!("failed to open {}: {}", path.display(), e);
                span.record_error(&detail);
                return TransferOutcome::failed(filename, detail);
            }
        };
        let (body, compressor) = gzip_body(file, self.level, self.chunk_size);

        let mut request = self.http.post(&self.server_url).body(body);
        for (name, value) in envelope.headers() {
            request = request.header(name, value);
        }

        let outcome = match request.send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                let server_checksum = response
                    .headers()
                    .get(SERVER_CHECKSUM_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                let text = response.text().await.unwrap_or_default();
                TransferOutcome::from_response(filename, status, server_checksum, text)
            }
            Err(e) => TransferOutcome::failed(filename, e),
        };

        // A local read failure truncates the body. Report it rather than
        // whatever the server made of the short stream.
        let outcome = match compressor.await {
            Ok(Ok(stats)) => {
                span.set_attribute("file.size", stats.raw_bytes.to_string());
                span.set_attribute("file.compressed_size", stats.compressed_bytes.to_string());
                outcome
            }
            Ok(Err(e)) if is_local_failure(&e) => TransferOutcome {
                success: false,
                error_detail: Some(format!("compression failed: {}", e)),
                ..outcome
            },
            Ok(Err(_)) => outcome,
            Err(e) => TransferOutcome {
                success: false,
                error_detail: Some(format!("compression task failed: {}", e)),
                ..outcome
            },
        };

        if let Some(status) = outcome.http_status {
            span.set_attribute("http.status_code", status.to_string());
        }
        if let Some(detail) = &outcome.error_detail {
            span.record_error(detail);
        }
        outcome
    }
}

// The pipe breaks whenever the request ends early, which is not a local fault.
fn is_local_failure(e: &CodecError) -> bool {
    !matches!(e, CodecError::Io(io) if io.kind() == std::io::ErrorKind::BrokenPipe)
}

/// Regular files directly under `dir`, sorted by filename.
pub async fn list_files(dir: &Path) -> Result<Vec<PathBuf>, ClientError> {
    if !tokio::fs::metadata(dir).await.map(|m| m.is_dir()).unwrap_or(false) {
        return Err(ClientError::Configuration(dir.to_path_buf()));
    }

    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| ClientError::Io(dir.to_path_buf(), e))?;
    let mut files = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| ClientError::Io(dir.to_path_buf(), e))?
    {
        let path = entry.path();
        // follows symlinks
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => files.push(path),
            Ok(_) => tracing::warn!(path = %path.display(), "skipping non-regular entry"),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping unreadable entry"),
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}
