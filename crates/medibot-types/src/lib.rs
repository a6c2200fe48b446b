//! Shared domain types for Medibot.
//!
//! This crate contains the core domain types used across the Medibot
//! workspace: users, chat sessions and turns, transcripts, LLM request
//! shapes, retrieval handles, configuration, and their error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
pub mod retrieval;
pub mod user;
