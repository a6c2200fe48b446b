//! Retrieval corpus handle and retrieved document types.

use serde::{Deserialize, Serialize};

/// Identifies which corpus the answer generator should search and how much
/// to pull back from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusHandle {
    /// Vector index name (e.g., "medical-chatbot").
    pub index: String,
    /// Optional namespace inside the index.
    pub namespace: Option<String>,
    /// Number of nearest documents to retrieve.
    pub top_k: usize,
}

/// A document chunk returned by a similarity search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedDocument {
    pub id: String,
    pub content: String,
    pub score: f32,
}
