//! Business logic and port trait definitions for Medibot.
//!
//! This crate defines the "ports" (repository, identity, retrieval and LLM
//! traits) that the infrastructure layer implements, plus the pieces with
//! real logic of their own: the context window builder, the session memory
//! cache and the chat service. It depends only on `medibot-types`, never on
//! `medibot-infra` or any database/IO crate.

pub mod chat;
pub mod generator;
pub mod identity;
pub mod llm;
pub mod repository;
pub mod retrieval;
