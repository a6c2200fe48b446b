//! Infrastructure layer for Medibot.
//!
//! Contains implementations of the port traits defined in `medibot-core`:
//! SQLite storage, the OpenAI-compatible LLM client, local embeddings and the
//! hosted vector index, the Google identity provider, and the config loader.

pub mod config;
pub mod identity;
pub mod llm;
pub mod retrieval;
pub mod sqlite;
