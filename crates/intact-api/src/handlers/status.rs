//! /status handler.

use std::sync::atomic::{AtomicU64, Ordering};

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use super::ApiState;

/// Terminal states of an upload request, as counted by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    Verified,
    Mismatch,
    Rejected,
}

#[derive(Debug, Default)]
pub struct UploadStats {
    verified: AtomicU64,
    mismatched: AtomicU64,
    rejected: AtomicU64,
}

impl UploadStats {
    pub fn record(&self, outcome: UploadOutcome) {
        let counter = match outcome {
            UploadOutcome::Verified => &self.verified,
            UploadOutcome::Mismatch => &self.mismatched,
            UploadOutcome::Rejected => &self.rejected,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> (u64, u64, u64) {
        (
            self.verified.load(Ordering::Relaxed),
            self.mismatched.load(Ordering::Relaxed),
            self.rejected.load(Ordering::Relaxed),
        )
    }
}

// ── /status ──────────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct StatusResponse {
    pub output_dir: String,
    pub verified: u64,
    pub mismatched: u64,
    pub rejected: u64,
}

pub async fn handle_status(State(state): State<ApiState>) -> Json<StatusResponse> {
    let (verified, mismatched, rejected) = state.stats.snapshot();
    Json(StatusResponse {
        output_dir: state.output.path().display().to_string(),
        verified,
        mismatched,
        rejected,
    })
}
