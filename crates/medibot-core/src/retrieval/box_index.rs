//! BoxVectorIndex -- object-safe dynamic dispatch wrapper for VectorIndex.

use std::future::Future;
use std::pin::Pin;

use medibot_types::error::RetrievalError;
use medibot_types::retrieval::{CorpusHandle, RetrievedDocument};

use super::index::VectorIndex;

/// Object-safe version of [`VectorIndex`] with boxed futures.
pub trait VectorIndexDyn: Send + Sync {
    fn query_boxed<'a>(
        &'a self,
        vector: &'a [f32],
        corpus: &'a CorpusHandle,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<RetrievedDocument>, RetrievalError>> + Send + 'a>>;
}

impl<T: VectorIndex> VectorIndexDyn for T {
    fn query_boxed<'a>(
        &'a self,
        vector: &'a [f32],
        corpus: &'a CorpusHandle,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<RetrievedDocument>, RetrievalError>> + Send + 'a>>
    {
        Box::pin(self.query(vector, corpus))
    }
}

/// Type-erased vector index.
pub struct BoxVectorIndex {
    inner: Box<dyn VectorIndexDyn + Send + Sync>,
}

impl BoxVectorIndex {
    pub fn new<T: VectorIndex + 'static>(index: T) -> Self {
        Self {
            inner: Box::new(index),
        }
    }

    pub async fn query(
        &self,
        vector: &[f32],
        corpus: &CorpusHandle,
    ) -> Result<Vec<RetrievedDocument>, RetrievalError> {
        self.inner.query_boxed(vector, corpus).await
    }
}
