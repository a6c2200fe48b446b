//! HTTP layer for Medibot.
//!
//! Axum pages and JSON API behind Google sign-in, with the envelope response
//! format, CORS and request tracing.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod response;
pub mod router;
pub mod session;
