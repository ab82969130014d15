//! Telemetry collaborator interface.
//!
//! The transfer core calls out to a [`Telemetry`] object for spans, duration
//! observations and counters. None of these calls affect protocol outcome.
//! Handlers and drivers receive the object explicitly; there is no global
//! tracer or meter.

use std::fmt;

// ── Names ─────────────────────────────────────────────────────────────────────

/// Client span around reading and hashing one file.
pub const SPAN_PREPARE: &str = "file-read-and-prepare";
/// Client span around compressing, sending and awaiting the response.
pub const SPAN_TRANSFER: &str = "file-transfer";
/// Server span around one upload request.
pub const SPAN_SAVE_AND_VERIFY: &str = "file-save-and-verify";

/// Histogram of per-file transfer duration, in seconds.
pub const METRIC_TRANSFER_DURATION: &str = "file.transfer.duration";
/// Counter of uploads whose checksum verified.
pub const METRIC_FILES_PROCESSED: &str = "files.processed";

// ── Interface ─────────────────────────────────────────────────────────────────

/// An open operation boundary. Ends when dropped.
pub trait ActiveSpan: Send {
    fn set_attribute(&mut self, key: &'static str, value: String);
    fn add_event(&mut self, name: &'static str, attributes: &[(&'static str, &str)]);
    fn record_error(&mut self, error: &dyn fmt::Display);

    /// `tracing` span to run the operation's work inside, so log lines
    /// emitted along the way nest under it. Backends without one return
    /// [`tracing::Span::none`].
    fn tracing_span(&self) -> tracing::Span {
        tracing::Span::none()
    }
}

pub trait Telemetry: Send + Sync {
    fn start_span(&self, name: &'static str, file_name: &str) -> Box<dyn ActiveSpan>;
    fn record_observation(&self, name: &'static str, value: f64, file_name: &str);
    fn increment_counter(&self, name: &'static str, file_name: &str);
}

// ── No-op ─────────────────────────────────────────────────────────────────────

/// Discards everything. Used in tests and when no backend is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTelemetry;

struct NoopSpan;

impl ActiveSpan for NoopSpan {
    fn set_attribute(&mut self, _key: &'static str, _value: String) {}
    fn add_event(&mut self, _name: &'static str, _attributes: &[(&'static str, &str)]) {}
    fn record_error(&mut self, _error: &dyn fmt::Display) {}
}

impl Telemetry for NoopTelemetry {
    fn start_span(&self, _name: &'static str, _file_name: &str) -> Box<dyn ActiveSpan> {
        Box::new(NoopSpan)
    }

    fn record_observation(&self, _name: &'static str, _value: f64, _file_name: &str) {}

    fn increment_counter(&self, _name: &'static str, _file_name: &str) {}
}

// ── tracing ───────────────────────────────────────────────────────────────────

/// Emits spans and metric events through `tracing`.
///
/// Metric calls become `debug` events on the `intact::metrics` target so a
/// subscriber can route them to whatever backend is in use.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTelemetry;

struct TracingSpan {
    span: tracing::Span,
    name: &'static str,
}

impl ActiveSpan for TracingSpan {
    fn set_attribute(&mut self, key: &'static str, value: String) {
        self.span.in_scope(|| {
            tracing::debug!(span = self.name, key, value = %value, "span attribute");
        });
    }

    fn add_event(&mut self, name: &'static str, attributes: &[(&'static str, &str)]) {
        self.span.in_scope(|| {
            tracing::debug!(span = self.name, event = name, ?attributes, "span event");
        });
    }

    fn record_error(&mut self, error: &dyn fmt::Display) {
        self.span.in_scope(|| {
            tracing::warn!(span = self.name, error = %error, "span error");
        });
    }

    fn tracing_span(&self) -> tracing::Span {
        self.span.clone()
    }
}

impl Telemetry for TracingTelemetry {
    fn start_span(&self, name: &'static str, file_name: &str) -> Box<dyn ActiveSpan> {
        let span = tracing::info_span!("transfer_op", op = name, file.name = file_name);
        Box::new(TracingSpan { span, name })
    }

    fn record_observation(&self, name: &'static str, value: f64, file_name: &str) {
        tracing::debug!(target: "intact::metrics", metric = name, value, file.name = file_name, "observation");
    }

    fn increment_counter(&self, name: &'static str, file_name: &str) {
        tracing::debug!(target: "intact::metrics", metric = name, delta = 1u64, file.name = file_name, "counter");
    }
}
