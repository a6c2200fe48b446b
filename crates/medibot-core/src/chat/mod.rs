//! Chat sessions, conversational memory, and context windowing.
//!
//! - `repository`: the `ChatRepository` port for sessions and turns
//! - `context`: renders recent transcript messages into a prompt prefix
//! - `memory`: the per-(user, session) transcript cache
//! - `lock`: per-session async locks serializing turns
//! - `service`: `ChatService`, which ties the above to the answer generator

pub mod context;
pub mod lock;
pub mod memory;
pub mod repository;
pub mod service;
