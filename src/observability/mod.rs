//! OpenTelemetry-based observability with file-based trace export.
//!
//! Spans from `tracing` macros are turned into OpenTelemetry spans and written
//! as OTLP JSON lines to a rotating file next to the store, for offline
//! analysis.
//!
//! ```text
//! tracing → tracing-opentelemetry → TracerProvider → JsonLinesExporter → RotatingFile
//! ```
//!
//! # Features
//!
//! - **File-Based Export**: `<data_dir>/flight-search-otlp.json`
//! - **Automatic Rotation**: Files rotate at 10MB with 3 numbered backups
//! - **OTLP Format**: one `resourceSpans` document per line
//!
//! # Modules
//!
//! - [`init`]: Subscriber setup
//! - [`exporter`]: OTLP JSON span exporter and tracer provider
//! - [`file_writer`]: Rotating file writer

pub mod exporter;
pub mod file_writer;
mod init;

pub use init::{init_tracing, DEFAULT_TRACE_LEVEL};
