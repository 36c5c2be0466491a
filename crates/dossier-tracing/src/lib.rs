//! Tracing bootstrap shared by the dossier gateway binaries.
//!
//! Installs a `tracing` subscriber with stderr fmt output and, when an
//! endpoint is configured, an OpenTelemetry OTLP exporter.

pub mod config;
pub mod otlp;
pub mod spans;

pub use config::{OtlpProtocol, TracingConfig};
pub use otlp::{init_tracing, TracingGuard};
