//! Per-file result of one upload attempt.

use serde::Serialize;

use intact_core::envelope::BODY_MISMATCH;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferOutcome {
    pub filename: String,
    /// True iff the server answered 2xx.
    pub success: bool,
    /// Digest the server computed, when it reported one.
    pub server_checksum: Option<String>,
    /// Absent when the request never got a response.
    pub http_status: Option<u16>,
    pub error_detail: Option<String>,
}

/// Why an upload failed, derived from the outcome fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The server received the bytes but the digests differ.
    Integrity,
    /// The server refused or failed the request.
    Rejected,
    /// No response: local I/O, connection or timeout failure.
    Transport,
}

impl TransferOutcome {
    pub(crate) fn from_response(
        filename: &str,
        status: u16,
        server_checksum: Option<String>,
        body: String,
    ) -> Self {
        let success = (200..300).contains(&status);
        Self {
            filename: filename.to_string(),
            success,
            server_checksum,
            http_status: Some(status),
            error_detail: (!success).then_some(body),
        }
    }

    pub(crate) fn failed(filename: &str, detail: impl ToString) -> Self {
        Self {
            filename: filename.to_string(),
            success: false,
            server_checksum: None,
            http_status: None,
            error_detail: Some(detail.to_string()),
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        if self.success {
            return None;
        }
        Some(match (self.http_status, self.error_detail.as_deref()) {
            (Some(400), Some(BODY_MISMATCH)) => FailureKind::Integrity,
            (Some(_), _) => FailureKind::Rejected,
            (None, _) => FailureKind::Transport,
        })
    }
}
