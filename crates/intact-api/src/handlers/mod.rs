//! HTTP handlers — the upload endpoint and a JSON status view.

pub mod status;
pub mod upload;

use std::sync::Arc;

use intact_core::Telemetry;

use crate::output::OutputDir;
use status::UploadStats;

#[derive(Clone)]
pub struct ApiState {
    /// Directory where received files are written.
    pub output: OutputDir,
    /// Span/metric sink for the save-and-verify boundary.
    pub telemetry: Arc<dyn Telemetry>,
    /// Outcome counters served by /status.
    pub stats: Arc<UploadStats>,
    /// Decompressed bytes read per step.
    pub chunk_size: usize,
}

impl ApiState {
    pub fn new(output: OutputDir, telemetry: Arc<dyn Telemetry>, chunk_size: usize) -> Self {
        Self {
            output,
            telemetry,
            stats: Arc::new(UploadStats::default()),
            chunk_size,
        }
    }
}

// Re-export handler functions for use in router setup.
pub use status::handle_status;
pub use upload::handle_upload;
