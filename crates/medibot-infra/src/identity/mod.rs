//! Identity provider implementations.

pub mod google;
