//! FastEmbed-based local embedding generator.
//!
//! Implements the `Embedder` trait from `medibot-core` using fastembed's
//! AllMiniLML6V2 model (384 dimensions) with ONNX runtime inference.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tokio::sync::OnceCell;

use medibot_core::retrieval::embedder::Embedder;
use medibot_types::error::RetrievalError;

/// HuggingFace name of the model the corpus was embedded with.
pub const MODEL_NAME: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Output dimensionality of [`MODEL_NAME`].
pub const DIMENSION: usize = 384;

type SharedModel = Arc<Mutex<TextEmbedding>>;

/// Local embedder backed by a fastembed ONNX model.
///
/// The model is loaded on first use (downloading into `cache_dir` if needed).
/// `TextEmbedding::embed` takes `&mut self` and is CPU-bound, so the model
/// sits behind a std mutex and inference runs on the blocking pool.
#[derive(Clone)]
pub struct FastEmbedEmbedder {
    cache_dir: PathBuf,
    model: Arc<OnceCell<SharedModel>>,
}

impl FastEmbedEmbedder {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            model: Arc::new(OnceCell::new()),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.model.initialized()
    }

    /// Load the model if it is not loaded yet.
    pub async fn load(&self) -> Result<(), RetrievalError> {
        self.model().await.map(|_| ())
    }

    async fn model(&self) -> Result<SharedModel, RetrievalError> {
        self.model
            .get_or_try_init(|| {
                let cache_dir = self.cache_dir.clone();
                async move {
                    tokio::task::spawn_blocking(move || load_model(cache_dir))
                        .await
                        .map_err(|e| {
                            RetrievalError::Embedding(format!("embedding loader failed: {e}"))
                        })?
                }
            })
            .await
            .cloned()
    }
}

fn load_model(cache_dir: PathBuf) -> Result<SharedModel, RetrievalError> {
    let options = InitOptions::new(EmbeddingModel::AllMiniLML6V2)
        .with_cache_dir(cache_dir)
        .with_show_download_progress(false);

    let model = TextEmbedding::try_new(options)
        .map_err(|e| RetrievalError::Embedding(format!("failed to load {MODEL_NAME}: {e}")))?;

    tracing::info!(model = MODEL_NAME, "embedding model loaded");
    Ok(Arc::new(Mutex::new(model)))
}

impl Embedder for FastEmbedEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RetrievalError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let model = self.model().await?;
        let texts = texts.to_vec();

        tokio::task::spawn_blocking(move || {
            let mut model = model
                .lock()
                .map_err(|_| RetrievalError::Embedding("embedding model lock poisoned".into()))?;
            model
                .embed(texts, None)
                .map_err(|e| RetrievalError::Embedding(e.to_string()))
        })
        .await
        .map_err(|e| RetrievalError::Embedding(format!("embedding task failed: {e}")))?
    }

    fn model_name(&self) -> &str {
        MODEL_NAME
    }

    fn dimension(&self) -> usize {
        DIMENSION
    }
}
