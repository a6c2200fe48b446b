//! VectorIndex trait for similarity search over a hosted document corpus.

use medibot_types::error::RetrievalError;
use medibot_types::retrieval::{CorpusHandle, RetrievedDocument};

/// Trait for nearest-neighbour search over an externally hosted index.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
/// Implementations live in medibot-infra (e.g., `PineconeIndex`).
pub trait VectorIndex: Send + Sync {
    /// Return up to `corpus.top_k` documents nearest to `vector`, best first.
    fn query(
        &self,
        vector: &[f32],
        corpus: &CorpusHandle,
    ) -> impl std::future::Future<Output = Result<Vec<RetrievedDocument>, RetrievalError>> + Send;
}
