use thiserror::Error;

use crate::llm::LlmError;

/// Errors from repository operations (used by trait definitions in medibot-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors raised while resolving or verifying a user's identity.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("identity provider is not configured")]
    NotConfigured,

    #[error("state parameter mismatch")]
    StateMismatch,

    #[error("authorization code exchange failed: {0}")]
    CodeExchange(String),

    #[error("failed to fetch user info: {0}")]
    UserInfo(String),

    #[error("identity is missing required field '{0}'")]
    MissingField(&'static str),

    #[error("invalid session token: {0}")]
    InvalidToken(String),

    #[error("unauthenticated")]
    Unauthenticated,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Errors from vector retrieval (embedding or index query).
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("embedding failed: {0}")]
    Embedding(String),

    #[error("index query failed: {0}")]
    Index(String),

    #[error("retrieval is not configured: {0}")]
    NotConfigured(String),
}

/// Errors from the answer generator: either step of the RAG pipeline.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("retrieval failed: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error("llm call failed: {0}")]
    Llm(#[from] LlmError),
}

/// Errors from chat operations.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Message cannot be empty")]
    EmptyMessage,

    #[error("Session not found")]
    SessionNotFound,

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Generation(#[from] GeneratorError),
}
