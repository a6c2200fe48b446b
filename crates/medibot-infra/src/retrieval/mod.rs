//! Retrieval infrastructure: local query embeddings and the hosted vector index.
//!
//! Query text is embedded with fastembed's all-MiniLM-L6-v2 model (384
//! dimensions, the same model the corpus was indexed with) and searched
//! against a Pinecone index over its REST data-plane API.

pub mod fastembed;
pub mod pinecone;

use medibot_core::retrieval::index::VectorIndex;
use medibot_types::error::RetrievalError;
use medibot_types::retrieval::{CorpusHandle, RetrievedDocument};

/// Stand-in index used when no vector index is configured.
///
/// The server still starts; every query fails with the configuration problem.
#[derive(Debug, Clone)]
pub struct UnavailableIndex {
    reason: String,
}

impl UnavailableIndex {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl VectorIndex for UnavailableIndex {
    async fn query(
        &self,
        _vector: &[f32],
        _corpus: &CorpusHandle,
    ) -> Result<Vec<RetrievedDocument>, RetrievalError> {
        Err(RetrievalError::NotConfigured(self.reason.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unavailable_index_reports_reason() {
        let index = UnavailableIndex::new("PINECONE_INDEX_HOST is not set");
        let corpus = CorpusHandle {
            index: "medical-chatbot".to_string(),
            namespace: None,
            top_k: 3,
        };
        let err = index.query(&[0.0; 4], &corpus).await.unwrap_err();
        assert!(err.to_string().contains("PINECONE_INDEX_HOST"));
    }
}
