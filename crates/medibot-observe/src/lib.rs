//! Observability setup for Medibot: structured logging and optional
//! OpenTelemetry span export.

pub mod tracing_setup;
