//! Repository trait definitions (ports) for user persistence.
//!
//! Chat persistence lives next to the chat service in `crate::chat::repository`.

pub mod user;
