//! intact-core — wire contract, integrity hashing, gzip codec and shared
//! configuration. Both the server and the client depend on this crate.

pub mod codec;
pub mod config;
pub mod digest;
pub mod envelope;
pub mod telemetry;

pub use codec::{CodecError, CompressionLevel, DEFAULT_CHUNK_SIZE};
pub use digest::IntegrityHasher;
pub use envelope::{ContentEncoding, EnvelopeError, SafeFileName, TransferEnvelope};
pub use telemetry::{NoopTelemetry, Telemetry, TracingTelemetry};
